/// Password hashing and verification.
///
/// Bcrypt with a configurable work factor (default cost 12). Verification
/// delegates to bcrypt's constant-time comparison, so timing does not depend
/// on where a mismatch occurs.

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
// Bcrypt only hashes the first 72 bytes; longer inputs would silently
// collide, so reject them outright.
const MAX_PASSWORD_LENGTH: usize = 72;

/// Hash a password after validating its strength.
///
/// Only called when the stored password value actually changes; ordinary
/// user updates never re-hash.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    validate_password_strength(password)?;

    bcrypt::hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// Strength requirements: 8..=72 bytes, at least one digit, one lowercase
/// and one uppercase letter.
fn validate_password_strength(password: &str) -> Result<(), AppError> {
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

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(AppError::Validation(ValidationError::InvalidFormat(
            "password must contain at least one digit, one lowercase letter, and one uppercase letter"
                .to_string(),
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the test suite fast; production uses 12.
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_produces_bcrypt_output() {
        let password = "ValidPassword123";
        let hash = hash_password(password, TEST_COST).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn verify_accepts_correct_password() {
        let password = "ValidPassword123";
        let hash = hash_password(password, TEST_COST).expect("Failed to hash password");

        assert!(verify_password(password, &hash).expect("Failed to verify password"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("ValidPassword123", TEST_COST).expect("Failed to hash password");

        assert!(!verify_password("WrongPassword123", &hash).expect("Failed to verify password"));
    }

    #[test]
    fn rejects_too_short_password() {
        assert!(hash_password("Short1", TEST_COST).is_err());
    }

    #[test]
    fn rejects_too_long_password() {
        let long_password = format!("A1{}", "a".repeat(MAX_PASSWORD_LENGTH));
        assert!(hash_password(&long_password, TEST_COST).is_err());
    }

    #[test]
    fn rejects_missing_character_classes() {
        assert!(hash_password("nodigitspassword", TEST_COST).is_err());
        assert!(hash_password("NOLOWERCASE1", TEST_COST).is_err());
        assert!(hash_password("nouppercase1", TEST_COST).is_err());
    }
}
