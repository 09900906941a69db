/// Password hashing and verification with bcrypt.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
// bcrypt truncates input beyond 72 bytes; reject instead of silently losing entropy
const MAX_PASSWORD_LENGTH: usize = 72;

/// Hash a password with a per-hash random salt.
///
/// # Errors
/// Fails on length-policy violations or a bcrypt failure.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        )));
    }

    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its stored hash.
pub fn verify_password(password: &str, hashed: &str) -> Result<bool, AppError> {
    verify(password, hashed)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_irreversible() {
        let password = "pw123456";
        let first = hash_password(password).expect("failed to hash");
        let second = hash_password(password).expect("failed to hash");

        assert_ne!(password, first);
        assert!(first.starts_with("$2"));
        // per-hash random salt: same input, different digests
        assert_ne!(first, second);
    }

    #[test]
    fn correct_password_verifies() {
        let hashed = hash_password("pw123456").unwrap();
        assert!(verify_password("pw123456", &hashed).unwrap());
    }

    #[test]
    fn wrong_password_fails_verification() {
        let hashed = hash_password("pw123456").unwrap();
        assert!(!verify_password("different1", &hashed).unwrap());
    }

    #[test]
    fn too_short_password_is_rejected() {
        assert!(hash_password("short").is_err());
    }

    #[test]
    fn over_bcrypt_limit_is_rejected() {
        assert!(hash_password(&"a".repeat(73)).is_err());
    }

    #[test]
    fn simple_passwords_within_policy_are_accepted() {
        // no composition rules: length is the only requirement
        assert!(hash_password("pw123456").is_ok());
        assert!(hash_password("alllowercase").is_ok());
    }
}
