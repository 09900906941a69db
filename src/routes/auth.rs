/// Authentication lifecycle routes.
///
/// register, verify-email, login, forgot-password, reset-password, and
/// refresh-token: each handler is one transition of the account's auth
/// state. Email dispatch is enqueued, never awaited to completion, and a
/// dispatch or token-attachment failure never fails the request that
/// triggered it.

use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{
    generate_refresh_token, hash_password, hash_refresh_token, issue_access_token,
    verify_password, Claims,
};
use crate::configuration::JwtSettings;
use crate::dispatch::{Dispatcher, Job};
use crate::error::{AppError, AuthError, ErrorContext, ValidationError};
use crate::lifecycle_token::LifecycleToken;
use crate::store;
use crate::validators::{is_valid_email, is_valid_name, parse_role};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub token: Option<String>,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Token pair returned by login and refresh
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct AccountSummary {
    pub account_id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenResponse,
    pub account: AccountSummary,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(ValidationError::EmptyField(field.to_string())))
}

/// POST /auth/register
///
/// Create an account in the Registered-Unverified state, then attach a
/// 48-hour verification token and enqueue the verification email.
///
/// # Errors
/// - 400: missing/invalid email, password, name, or role
/// - 409: email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Dispatcher>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("register");

    let email = is_valid_email(required(&form.email, "email")?)?;
    let name = is_valid_name(required(&form.name, "name")?)?;
    let role = parse_role(form.role.as_deref())?;
    let password_hash = hash_password(required(&form.password, "password")?)?;

    let account_id = store::create_account(pool.get_ref(), &email, &name, &password_hash, role).await?;

    // verification is best-effort: the account exists either way, and the
    // token can be re-issued later
    let token = LifecycleToken::verification();
    match store::set_verification_token(pool.get_ref(), account_id, token.token(), token.expires_at())
        .await
    {
        Ok(()) => dispatcher.enqueue(Job::Email {
            to: email.clone(),
            subject: "Verify your email".to_string(),
            body: format!("Use this token to verify your email: {}", token.token()),
        }),
        Err(e) => {
            tracing::error!(account_id, error = %e, "failed to attach verification token");
        }
    }

    tracing::info!(
        request_id = %context.request_id,
        account_id,
        "account registered"
    );

    Ok(HttpResponse::Created().json(serde_json::json!({
        "account_id": account_id,
        "message": "registered"
    })))
}

/// POST /auth/login
///
/// Verify credentials and issue a 15-minute access token plus a 30-day
/// rotating refresh token.
///
/// # Security Notes
/// Unknown email and wrong password produce the identical Unauthorized
/// outcome, so the endpoint cannot be used to enumerate accounts.
///
/// # Errors
/// - 401: bad credentials
/// - 403: account deactivated
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("login");

    let email = required(&form.email, "email")?;
    let password = required(&form.password, "password")?;

    let account = store::find_by_email(pool.get_ref(), email)
        .await?
        .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

    if !account.is_active {
        return Err(AppError::Auth(AuthError::AccountInactive));
    }

    if !verify_password(password, &account.password_hash)? {
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let role = account.role()?;
    let access_token =
        issue_access_token(account.account_id, role, account.token_version, jwt_config.get_ref())?;

    let refresh_token = generate_refresh_token();
    let refresh_expires = Utc::now() + Duration::seconds(jwt_config.refresh_token_expiry);
    store::store_refresh_token(
        pool.get_ref(),
        account.account_id,
        &hash_refresh_token(&refresh_token),
        refresh_expires,
    )
    .await?;

    store::record_last_login(pool.get_ref(), account.account_id).await?;

    tracing::info!(
        request_id = %context.request_id,
        account_id = account.account_id,
        "login succeeded"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        tokens: TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
        },
        account: AccountSummary {
            account_id: account.account_id,
            email: account.email,
            name: account.name,
            role: account.role,
        },
    }))
}

const FORGOT_PASSWORD_MESSAGE: &str = "if the email exists, a reset link was sent";

/// POST /auth/forgot-password
///
/// Attach a 2-hour reset token and enqueue the reset email, answering
/// identically whether or not the account exists. Internal failures on the
/// account-exists path are swallowed for the same reason.
pub async fn forgot_password(
    form: web::Json<ForgotPasswordRequest>,
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Dispatcher>,
) -> Result<HttpResponse, AppError> {
    let email = required(&form.email, "email")?;

    if let Some(account) = store::find_by_email(pool.get_ref(), email).await? {
        let token = LifecycleToken::reset();
        match store::set_reset_token(pool.get_ref(), account.account_id, token.token(), token.expires_at())
            .await
        {
            Ok(()) => dispatcher.enqueue(Job::Email {
                to: account.email.clone(),
                subject: "Password reset".to_string(),
                body: format!("Use this token to reset your password: {}", token.token()),
            }),
            Err(e) => {
                tracing::error!(
                    account_id = account.account_id,
                    error = %e,
                    "failed to attach reset token"
                );
            }
        }
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": FORGOT_PASSWORD_MESSAGE })))
}

/// POST /auth/reset-password
///
/// Consume a reset token: install the new password hash, clear the token,
/// and bump the token version so every outstanding session dies with the
/// old password.
///
/// # Errors
/// - 400: missing fields, password policy, or invalid/expired token
pub async fn reset_password(
    form: web::Json<ResetPasswordRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let token = required(&form.token, "token")?;
    let password_hash = hash_password(required(&form.password, "password")?)?;

    if !store::reset_password_with_token(pool.get_ref(), token, &password_hash).await? {
        return Err(AppError::Validation(ValidationError::InvalidToken(
            "reset".to_string(),
        )));
    }

    tracing::info!("password reset completed");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "password updated" })))
}

/// POST /auth/verify-email
///
/// Consume a verification token, flipping the account to Verified.
///
/// # Errors
/// - 400: missing or invalid/expired token
pub async fn verify_email(
    form: web::Json<VerifyEmailRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let token = required(&form.token, "token")?;

    if !store::verify_email_with_token(pool.get_ref(), token).await? {
        return Err(AppError::Validation(ValidationError::InvalidToken(
            "verification".to_string(),
        )));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "email verified" })))
}

/// POST /auth/refresh-token
///
/// Rotate a refresh session: the presented token must match the stored
/// hash and be unexpired; it is replaced in the same statement, so each
/// value works exactly once. Of two concurrent refreshes with the same
/// token, one wins and the other gets the generic Unauthorized outcome.
///
/// # Errors
/// - 400: missing field
/// - 401: unknown, expired, or already-rotated token
/// - 403: account deactivated
pub async fn refresh_token(
    form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("refresh_token");

    let presented = required(&form.refresh_token, "refresh_token")?;

    let new_refresh = generate_refresh_token();
    let refresh_expires = Utc::now() + Duration::seconds(jwt_config.refresh_token_expiry);

    let account = store::rotate_refresh_token(
        pool.get_ref(),
        &hash_refresh_token(presented),
        &hash_refresh_token(&new_refresh),
        refresh_expires,
    )
    .await?
    .ok_or(AppError::Auth(AuthError::TokenInvalid))?;

    if !account.is_active {
        return Err(AppError::Auth(AuthError::AccountInactive));
    }

    let role = account.role()?;
    let access_token =
        issue_access_token(account.account_id, role, account.token_version, jwt_config.get_ref())?;

    tracing::info!(
        request_id = %context.request_id,
        account_id = account.account_id,
        "refresh token rotated"
    );

    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token,
        refresh_token: new_refresh,
        token_type: "Bearer".to_string(),
        expires_in: jwt_config.access_token_expiry,
    }))
}

/// GET /auth/me
///
/// Current authenticated account, from the claims the gate injected.
///
/// # Errors
/// - 401/403: handled by the gate
/// - 404: subject row has disappeared
pub async fn get_current_account(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let account_id = claims.account_id()?;

    let account = store::find_by_id(pool.get_ref(), account_id)
        .await?
        .ok_or_else(|| {
            AppError::Database(crate::error::DatabaseError::NotFound(
                "account not found".to_string(),
            ))
        })?;

    Ok(HttpResponse::Ok().json(AccountSummary {
        account_id: account.account_id,
        email: account.email,
        name: account.name,
        role: account.role,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_none_and_empty() {
        assert!(required(&None, "email").is_err());
        assert!(required(&Some(String::new()), "email").is_err());
        assert_eq!(required(&Some("x".to_string()), "email").unwrap(), "x");
    }

    #[test]
    fn login_response_flattens_token_pair() {
        let response = LoginResponse {
            tokens: TokenResponse {
                access_token: "a".to_string(),
                refresh_token: "r".to_string(),
                token_type: "Bearer".to_string(),
                expires_in: 900,
            },
            account: AccountSummary {
                account_id: 1,
                email: "a@example.com".to_string(),
                name: "A".to_string(),
                role: "student".to_string(),
            },
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["access_token"], "a");
        assert_eq!(value["expires_in"], 900);
        assert_eq!(value["account"]["role"], "student");
    }
}
