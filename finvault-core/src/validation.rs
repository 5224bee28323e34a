use crate::{config::MAX_OTP_LENGTH, error::ValidationError};
use regex::Regex;
use std::sync::LazyLock;

/// Practical subset of RFC 5322, compiled once.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

/// Validates an email address
///
/// # Examples
///
/// ```rust
/// use finvault_core::validation::validate_email;
///
/// assert!(validate_email("customer@example.com").is_ok());
/// assert!(validate_email("invalid-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingField(
            "Email is required".to_string(),
        ));
    }

    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(
            "Email is too long".to_string(),
        ));
    }

    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(format!(
            "Invalid email format: {email}"
        )))
    }
}

/// Trim and lower-case the domain part, leaving the local part untouched.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Validates a password according to security requirements
///
/// - Minimum 8 characters
/// - Maximum 128 characters
/// - Cannot be empty or whitespace only
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField(
            "Password is required".to_string(),
        ));
    }

    if password.trim().is_empty() {
        return Err(ValidationError::InvalidPassword(
            "Password cannot be only whitespace".to_string(),
        ));
    }

    if password.chars().count() < 8 {
        return Err(ValidationError::InvalidPassword(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if password.chars().count() > 128 {
        return Err(ValidationError::InvalidPassword(
            "Password must be no more than 128 characters long".to_string(),
        ));
    }

    Ok(())
}

/// Validates an optional first or last name.
pub fn validate_name(name: Option<&str>) -> Result<(), ValidationError> {
    let Some(name) = name else {
        return Ok(());
    };

    if name.trim().is_empty() {
        return Err(ValidationError::InvalidName(
            "Name cannot be empty or only whitespace".to_string(),
        ));
    }

    if name.chars().count() > 100 {
        return Err(ValidationError::InvalidName(
            "Name must be no more than 100 characters long".to_string(),
        ));
    }

    if name.chars().any(char::is_control) {
        return Err(ValidationError::InvalidName(
            "Name cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

/// Reject passcode candidates that could never match an issued code.
///
/// This only checks shape, never the stored code, so it reveals nothing about
/// the account.
pub fn validate_otp_candidate(candidate: &str) -> Result<(), ValidationError> {
    if candidate.is_empty() {
        return Err(ValidationError::MissingField(
            "One-time passcode is required".to_string(),
        ));
    }

    if candidate.len() > MAX_OTP_LENGTH || !candidate.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidField(
            "One-time passcode must be numeric".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("customer@example.com").is_ok());
        assert!(validate_email("first.last+tag@bank.co.uk").is_ok());
        assert!(matches!(
            validate_email(""),
            Err(ValidationError::MissingField(_))
        ));
        assert!(matches!(
            validate_email("customer@"),
            Err(ValidationError::InvalidEmail(_))
        ));
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Ada.Lovelace@Example.COM "),
            "Ada.Lovelace@example.com"
        );
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("securepassword123").is_ok());
        assert!(matches!(
            validate_password(""),
            Err(ValidationError::MissingField(_))
        ));
        assert!(validate_password("        ").is_err());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name(None).is_ok());
        assert!(validate_name(Some("Ada")).is_ok());
        assert!(validate_name(Some("  ")).is_err());
        assert!(validate_name(Some("Ada\u{0007}")).is_err());
        assert!(validate_name(Some(&"a".repeat(101))).is_err());
    }

    #[test]
    fn test_validate_otp_candidate() {
        assert!(validate_otp_candidate("482913").is_ok());
        assert!(validate_otp_candidate("0000").is_ok());
        assert!(matches!(
            validate_otp_candidate(""),
            Err(ValidationError::MissingField(_))
        ));
        assert!(matches!(
            validate_otp_candidate("48a913"),
            Err(ValidationError::InvalidField(_))
        ));
        assert!(validate_otp_candidate("12345678901").is_err());
    }
}
