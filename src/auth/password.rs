use bcrypt::{hash, verify, DEFAULT_COST};
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("Password too weak: {0}")]
    TooWeak(String),
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    Ok(hash(password, DEFAULT_COST)?)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PasswordError> {
    Ok(verify(password, password_hash)?)
}

/// Minimum bar: 8+ characters with upper, lower, and a digit.
pub fn validate_password_strength(password: &str) -> Result<(), PasswordError> {
    if password.len() < 8 {
        return Err(PasswordError::TooWeak(
            "must be at least 8 characters".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordError::TooWeak(
            "must contain an uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordError::TooWeak(
            "must contain a lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::TooWeak("must contain a digit".to_string()));
    }
    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
    });
    re.is_match(email)
}

pub fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("Secure123").unwrap();
        assert!(verify_password("Secure123", &hash).unwrap());
        assert!(!verify_password("Secure124", &hash).unwrap());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("Mentor2024").is_ok());
        assert_matches!(
            validate_password_strength("short1A"),
            Err(PasswordError::TooWeak(_))
        );
        assert_matches!(
            validate_password_strength("alllowercase1"),
            Err(PasswordError::TooWeak(_))
        );
        assert_matches!(
            validate_password_strength("ALLUPPERCASE1"),
            Err(PasswordError::TooWeak(_))
        );
        assert_matches!(
            validate_password_strength("NoDigitsHere"),
            Err(PasswordError::TooWeak(_))
        );
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("nurse@moh.go.ke"));
        assert!(is_valid_email("coordinator@county.health"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("user@domain"));
        assert!(!is_valid_email("@domain.com"));
        assert!(!is_valid_email("user@"));
    }

    #[test]
    fn test_reset_token_uniqueness() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), 48);
        assert_ne!(a, b);
    }
}
