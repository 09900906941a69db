/// Input validation for account-facing fields.
///
/// Length limits bound the work done on hostile input; format checks use a
/// simplified RFC 5322 regex for email and a control-character scan for
/// display names. Role strings parse into the fixed platform role set.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;
use crate::store::Role;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 128;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates an email address, returning the trimmed value.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort(
            "email".to_string(),
            MIN_EMAIL_LENGTH,
        ));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong(
            "email".to_string(),
            MAX_EMAIL_LENGTH,
        ));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    // local part above 64 octets exceeds RFC 5321 and is a phishing indicator
    if let Some(at_pos) = trimmed.find('@') {
        if trimmed[..at_pos].len() > 64 {
            return Err(ValidationError::SuspiciousContent("email".to_string()));
        }
    }

    if trimmed.matches('@').count() != 1 || trimmed.contains('\0') {
        return Err(ValidationError::SuspiciousContent("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a display name, returning the trimmed value.
pub fn is_valid_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("name".to_string()));
    }

    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(
            "name".to_string(),
            MAX_NAME_LENGTH,
        ));
    }

    if trimmed.contains('\0') || trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("name".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Parses a role string into the platform role set.
/// `None` defaults to `student`, mirroring account creation.
pub fn parse_role(role: Option<&str>) -> Result<Role, ValidationError> {
    match role {
        None => Ok(Role::Student),
        Some(r) => r
            .parse::<Role>()
            .map_err(|_| ValidationError::InvalidFormat("role".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_emails() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(
            is_valid_email("  user@example.com ").unwrap(),
            "user@example.com"
        );
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(is_valid_email("notanemail").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
        assert!(is_valid_email("user name@example.com").is_err());
    }

    #[test]
    fn rejects_out_of_range_lengths() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());
        assert!(is_valid_email("a@a.c").is_err());
        assert!(is_valid_email("").is_err());
    }

    #[test]
    fn rejects_oversized_local_part() {
        let email = format!("{}@example.com", "a".repeat(65));
        assert!(is_valid_email(&email).is_err());
    }

    #[test]
    fn accepts_reasonable_names() {
        assert!(is_valid_name("John Doe").is_ok());
        assert!(is_valid_name("Jean-Pierre").is_ok());
        assert!(is_valid_name("O'Brien").is_ok());
    }

    #[test]
    fn rejects_bad_names() {
        assert!(is_valid_name("").is_err());
        assert!(is_valid_name("   ").is_err());
        assert!(is_valid_name(&"a".repeat(129)).is_err());
        assert!(is_valid_name("Name\0with\0null").is_err());
        assert!(is_valid_name("tab\tname").is_err());
    }

    #[test]
    fn role_defaults_to_student() {
        assert_eq!(parse_role(None).unwrap(), Role::Student);
    }

    #[test]
    fn role_parses_the_fixed_set() {
        assert_eq!(parse_role(Some("student")).unwrap(), Role::Student);
        assert_eq!(parse_role(Some("mentor")).unwrap(), Role::Mentor);
        assert_eq!(parse_role(Some("admin")).unwrap(), Role::Admin);
        assert!(parse_role(Some("superuser")).is_err());
    }
}
