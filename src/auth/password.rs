//! Password hashing for depot.
//!
//! Uses Argon2id with PHC-formatted hashes. Inputs are truncated to a
//! fixed byte ceiling before hashing, and the same truncation is applied
//! before verification so both sides always agree.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use thiserror::Error;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Byte ceiling applied to password input before hashing and verifying.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Password-related errors.
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Password is too short.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    HashError(String),

    /// Password hash is invalid.
    #[error("invalid password hash format")]
    InvalidHash,

    /// Password verification failed (wrong password).
    #[error("password verification failed")]
    VerificationFailed,
}

impl From<PasswordError> for crate::DepotError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::TooShort => crate::DepotError::Validation(e.to_string()),
            PasswordError::VerificationFailed => crate::DepotError::InvalidCredentials,
            other => crate::DepotError::Auth(other.to_string()),
        }
    }
}

/// Truncate a password to the byte ceiling without splitting a character.
fn truncate_password(password: &str) -> &str {
    if password.len() <= MAX_PASSWORD_BYTES {
        return password;
    }
    let mut end = MAX_PASSWORD_BYTES;
    while !password.is_char_boundary(end) {
        end -= 1;
    }
    &password[..end]
}

/// Hash a password using Argon2id.
///
/// Returns a PHC-formatted hash string that includes the salt and
/// parameters.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }

    let password = truncate_password(password);

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let password = truncate_password(password);

    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_format() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_hash_password_different_salts() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct() {
        let hash = hash_password("correct_password").unwrap();
        assert!(verify_password("correct_password", &hash).is_ok());
    }

    #[test]
    fn test_verify_password_wrong() {
        let hash = hash_password("correct_password").unwrap();
        let result = verify_password("wrong_password", &hash);
        assert!(matches!(result, Err(PasswordError::VerificationFailed)));
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        let result = verify_password("any_password", "not_a_valid_hash");
        assert!(matches!(result, Err(PasswordError::InvalidHash)));
    }

    #[test]
    fn test_hash_password_too_short() {
        let result = hash_password("short");
        assert!(matches!(result, Err(PasswordError::TooShort)));
    }

    #[test]
    fn test_minimum_length_accepted() {
        assert!(hash_password("12345678").is_ok());
    }

    #[test]
    fn test_truncation_is_consistent_between_hash_and_verify() {
        // Two passwords that agree on the first 72 bytes hash and verify
        // identically.
        let base = "a".repeat(MAX_PASSWORD_BYTES);
        let long_a = format!("{base}XXXX");
        let long_b = format!("{base}YYYY");

        let hash = hash_password(&long_a).unwrap();
        assert!(verify_password(&long_b, &hash).is_ok());
        // While a difference inside the ceiling still fails
        assert!(verify_password(&base[..MAX_PASSWORD_BYTES - 1], &hash).is_err());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // 24 three-byte characters = exactly 72 bytes, plus one more that
        // would straddle the boundary.
        let password = "あ".repeat(25);
        let truncated = truncate_password(&password);
        assert!(truncated.len() <= MAX_PASSWORD_BYTES);
        assert_eq!(truncated, "あ".repeat(24));

        let hash = hash_password(&password).unwrap();
        assert!(verify_password(&password, &hash).is_ok());
    }

    #[test]
    fn test_password_with_unicode() {
        let password = "пароль123секрет";
        let hash = hash_password(password).unwrap();
        assert!(verify_password(password, &hash).is_ok());
    }

    #[test]
    fn test_error_conversion() {
        let err: crate::DepotError = PasswordError::VerificationFailed.into();
        assert!(matches!(err, crate::DepotError::InvalidCredentials));

        let err: crate::DepotError = PasswordError::TooShort.into();
        assert!(matches!(err, crate::DepotError::Validation(_)));
    }
}
