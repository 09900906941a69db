/// JWT claim set for access tokens.
///
/// Besides the standard RFC 7519 fields this carries the account role and
/// the token-version counter (`tv`) current at issue time; the access gate
/// rejects tokens whose `tv` has fallen behind the stored counter.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AuthError};
use crate::store::Role;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account id, as a string per JWT convention)
    pub sub: String,
    /// Account role at issue time
    pub role: String,
    /// Token version at issue time
    pub tv: i32,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    pub fn new(
        account_id: i64,
        role: Role,
        token_version: i32,
        expiry_seconds: i64,
        issuer: String,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: account_id.to_string(),
            role: role.as_str().to_string(),
            tv: token_version,
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    /// Account id from the subject claim.
    pub fn account_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }

    /// Role claim parsed into the fixed set.
    pub fn role(&self) -> Result<Role, AppError> {
        self.role
            .parse::<Role>()
            .map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }

    pub fn is_expired(&self) -> bool {
        self.exp < chrono::Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_carry_subject_role_and_version() {
        let claims = Claims::new(7, Role::Mentor, 3, 900, "mentorhub".to_string());

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.account_id().unwrap(), 7);
        assert_eq!(claims.role().unwrap(), Role::Mentor);
        assert_eq!(claims.tv, 3);
        assert_eq!(claims.iss, "mentorhub");
        assert!(!claims.is_expired());
    }

    #[test]
    fn expiry_is_relative_to_issue_time() {
        let claims = Claims::new(1, Role::Student, 0, 900, "mentorhub".to_string());
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn malformed_subject_is_rejected() {
        let mut claims = Claims::new(1, Role::Student, 0, 900, "mentorhub".to_string());
        claims.sub = "not-a-number".to_string();
        assert!(claims.account_id().is_err());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let mut claims = Claims::new(1, Role::Student, 0, 900, "mentorhub".to_string());
        claims.role = "root".to_string();
        assert!(claims.role().is_err());
    }
}
