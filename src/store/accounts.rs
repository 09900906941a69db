/// Account persistence.
///
/// The three lifecycle mutations with invariants (verify-email,
/// reset-password, refresh rotation) are each one conditional UPDATE:
/// the WHERE clause carries the precondition, so the row either moves
/// atomically to the new state or nothing happens. Refresh rotation in
/// particular is the de facto concurrency control: two racing refreshes
/// with the same stale token hash can never both match.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, DatabaseError};

/// Platform role set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Mentor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Mentor => "mentor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "mentor" => Ok(Role::Mentor),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// An account row as read by the auth core.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub account_id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub token_version: i32,
    pub bio: Option<String>,
    pub region: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Account {
    /// Role column parsed into the fixed set.
    /// The column carries a CHECK constraint, so failure here means the
    /// database was altered out from under the application.
    pub fn role(&self) -> Result<Role, AppError> {
        self.role
            .parse::<Role>()
            .map_err(|_| AppError::Internal(format!("unknown role in store: {}", self.role)))
    }
}

const ACCOUNT_COLUMNS: &str = "account_id, email, name, password_hash, role, is_active, \
     email_verified, token_version, bio, region, created_at, last_login";

/// Create a new account. Fails with a Conflict if the email is taken
/// (surfaced through the unique index on `email`).
pub async fn create_account(
    pool: &PgPool,
    email: &str,
    name: &str,
    password_hash: &str,
    role: Role,
) -> Result<i64, AppError> {
    let account_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO accounts (email, name, password_hash, role, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING account_id
        "#,
    )
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(account_id)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>, AppError> {
    let account = sqlx::query_as::<_, Account>(&format!(
        "SELECT {} FROM accounts WHERE email = $1",
        ACCOUNT_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

pub async fn find_by_id(pool: &PgPool, account_id: i64) -> Result<Option<Account>, AppError> {
    let account = sqlx::query_as::<_, Account>(&format!(
        "SELECT {} FROM accounts WHERE account_id = $1",
        ACCOUNT_COLUMNS
    ))
    .bind(account_id)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Attach a fresh email-verification token to an account.
pub async fn set_verification_token(
    pool: &PgPool,
    account_id: i64,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET verification_token = $2, verification_expires = $3
        WHERE account_id = $1
        "#,
    )
    .bind(account_id)
    .bind(token)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Consume a verification token: sets `email_verified` and clears the
/// token pair in one statement. Returns false when no row matched
/// (unknown or expired token).
pub async fn verify_email_with_token(pool: &PgPool, token: &str) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET email_verified = TRUE, verification_token = NULL, verification_expires = NULL
        WHERE verification_token = $1 AND verification_expires > NOW()
        "#,
    )
    .bind(token)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Attach a fresh password-reset token to an account.
pub async fn set_reset_token(
    pool: &PgPool,
    account_id: i64,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET reset_token = $2, reset_expires = $3
        WHERE account_id = $1
        "#,
    )
    .bind(account_id)
    .bind(token)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Consume a reset token: installs the new password hash, clears the token
/// pair, bumps `token_version` (killing outstanding access tokens at the
/// gate), and drops the stored refresh session, all in one statement.
/// Returns false when no row matched.
pub async fn reset_password_with_token(
    pool: &PgPool,
    token: &str,
    new_password_hash: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET password_hash = $2,
            reset_token = NULL,
            reset_expires = NULL,
            token_version = token_version + 1,
            refresh_token_hash = NULL,
            refresh_expires = NULL
        WHERE reset_token = $1 AND reset_expires > NOW()
        "#,
    )
    .bind(token)
    .bind(new_password_hash)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Store a refresh-token hash, replacing any previous session.
pub async fn store_refresh_token(
    pool: &PgPool,
    account_id: i64,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET refresh_token_hash = $2, refresh_expires = $3
        WHERE account_id = $1
        "#,
    )
    .bind(account_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Rotate a refresh session: the old hash must still be the stored one and
/// unexpired, and the new hash is written in the same statement. Returns
/// the owning account on success, None when the presented token lost the
/// race, expired, or never existed.
pub async fn rotate_refresh_token(
    pool: &PgPool,
    old_token_hash: &str,
    new_token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<Option<Account>, AppError> {
    let account = sqlx::query_as::<_, Account>(&format!(
        r#"
        UPDATE accounts
        SET refresh_token_hash = $2, refresh_expires = $3
        WHERE refresh_token_hash = $1 AND refresh_expires > NOW()
        RETURNING {}
        "#,
        ACCOUNT_COLUMNS
    ))
    .bind(old_token_hash)
    .bind(new_token_hash)
    .bind(expires_at)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

pub async fn record_last_login(pool: &PgPool, account_id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE accounts SET last_login = $2 WHERE account_id = $1")
        .bind(account_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(())
}

/// Current token version and active flag, for the access gate's recheck.
pub async fn current_token_version(
    pool: &PgPool,
    account_id: i64,
) -> Result<Option<(i32, bool)>, AppError> {
    let row = sqlx::query_as::<_, (i32, bool)>(
        "SELECT token_version, is_active FROM accounts WHERE account_id = $1",
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Update profile fields, leaving absent ones untouched.
pub async fn update_profile(
    pool: &PgPool,
    account_id: i64,
    name: Option<&str>,
    bio: Option<&str>,
    region: Option<&str>,
) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET name = COALESCE($2, name),
            bio = COALESCE($3, bio),
            region = COALESCE($4, region)
        WHERE account_id = $1
        "#,
    )
    .bind(account_id)
    .bind(name)
    .bind(bio)
    .bind(region)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Database(DatabaseError::NotFound(
            "account not found".to_string(),
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::Student, Role::Mentor, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let parsed: Role = serde_json::from_str("\"mentor\"").unwrap();
        assert_eq!(parsed, Role::Mentor);
    }

    #[test]
    fn account_role_accessor_rejects_unknown_values() {
        let account = Account {
            account_id: 1,
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            password_hash: String::new(),
            role: "superuser".to_string(),
            is_active: true,
            email_verified: false,
            token_version: 0,
            bio: None,
            region: None,
            created_at: Utc::now(),
            last_login: None,
        };
        assert!(account.role().is_err());
    }
}
