/// Access-token mint and verify.
///
/// Tokens are HS256-signed and short-lived. Every verification failure
/// collapses to the same generic Unauthorized outcome; the distinction
/// between expired, malformed, and wrong-signature stays in the logs.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::store::Role;

/// Mint a signed access token for an account.
pub fn issue_access_token(
    account_id: i64,
    role: Role,
    token_version: i32,
    config: &JwtSettings,
) -> Result<String, AppError> {
    let claims = Claims::new(
        account_id,
        role,
        token_version,
        config.access_token_expiry,
        config.issuer.clone(),
    );

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Verify signature, expiry, and issuer; return the embedded claims.
///
/// # Errors
/// Any failure maps to the generic Unauthorized outcome.
pub fn verify_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("access token rejected: {}", e);
        AppError::Auth(AuthError::TokenInvalid)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 2_592_000,
            issuer: "mentorhub-test".to_string(),
        }
    }

    #[test]
    fn issue_then_verify_round_trips() {
        let config = test_config();

        let token = issue_access_token(42, Role::Admin, 5, &config).expect("failed to issue");
        let claims = verify_access_token(&token, &config).expect("failed to verify");

        assert_eq!(claims.account_id().unwrap(), 42);
        assert_eq!(claims.role().unwrap(), Role::Admin);
        assert_eq!(claims.tv, 5);
        assert_eq!(claims.iss, "mentorhub-test");
    }

    #[test]
    fn garbage_token_is_rejected() {
        let config = test_config();
        assert!(verify_access_token("not.a.token", &config).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = test_config();
        let token = issue_access_token(1, Role::Student, 0, &config).unwrap();

        let tampered = format!("{}X", token);
        assert!(verify_access_token(&tampered, &config).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let token = issue_access_token(1, Role::Student, 0, &config).unwrap();

        let mut other = test_config();
        other.secret = "a-completely-different-signing-secret!!".to_string();
        assert!(verify_access_token(&token, &other).is_err());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let config = test_config();
        let token = issue_access_token(1, Role::Student, 0, &config).unwrap();

        let mut other = test_config();
        other.issuer = "someone-else".to_string();
        assert!(verify_access_token(&token, &other).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut config = test_config();
        // far enough in the past to clear the default leeway
        config.access_token_expiry = -3600;
        let token = issue_access_token(1, Role::Student, 0, &config).unwrap();

        let err = verify_access_token(&token, &test_config()).unwrap_err();
        match err {
            AppError::Auth(AuthError::TokenInvalid) => (),
            other => panic!("expected generic auth error, got {:?}", other),
        }
    }
}
