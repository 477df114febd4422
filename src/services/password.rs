//! Password hashing and strength policy.
//!
//! Hashes are Argon2id in PHC string form with the argon2 crate's default
//! parameters and a fresh random salt per hash. The strength policy is
//! enforced at registration and on password change.

use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

/// Minimum accepted password length in bytes
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted password length in bytes
const MAX_PASSWORD_LENGTH: usize = 128;

/// Reasons a password fails the strength policy
///
/// The `Display` text of each variant is the message returned to the client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("password must be at least 8 characters long")]
    TooShort,
    #[error("password must not exceed 128 characters")]
    TooLong,
    #[error("password must contain at least one lowercase letter")]
    MissingLowercase,
    #[error("password must contain at least one uppercase letter or one number")]
    MissingUppercaseOrDigit,
}

/// Check a password against the strength policy.
///
/// Requirements:
/// - 8 to 128 bytes long
/// - at least one lowercase letter
/// - at least one uppercase letter or one digit
pub fn validate_password(password: &str) -> Result<(), PasswordPolicyError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooShort);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooLong);
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    for c in password.chars() {
        if c.is_uppercase() {
            has_upper = true;
        } else if c.is_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        }
    }

    if !has_lower {
        return Err(PasswordPolicyError::MissingLowercase);
    }
    if !has_upper && !has_digit {
        return Err(PasswordPolicyError::MissingUppercaseOrDigit);
    }

    Ok(())
}

/// Hash a plaintext password into a PHC string (`$argon2id$...`).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Check a plaintext password against a stored PHC hash.
///
/// A mismatched password is `Ok(false)`; a hash that cannot be parsed
/// is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Stored password hash is not a valid PHC string: {}", e))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e)),
    }
}
