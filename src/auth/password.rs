//! Password hashing with Argon2id
//!
//! Hashes are stored in PHC string format (salt and parameters included),
//! so verification needs nothing beyond the stored string.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::{GoalpostError, Result};

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| GoalpostError::Auth(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored PHC hash. A malformed stored hash is an
/// error; a wrong password is `Ok(false)`.
pub fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| GoalpostError::Auth(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let hash = hash_password("sticker-chart-2026").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("sticker-chart-2026", &hash).unwrap());
        assert!(!verify_password("sticker-chart-2025", &hash).unwrap());
    }

    #[test]
    fn test_salting_gives_distinct_hashes() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("same-password", &first).unwrap());
        assert!(verify_password("same-password", &second).unwrap());
    }

    #[test]
    fn test_malformed_stored_hash_is_error() {
        assert!(verify_password("anything", "plainly-not-a-phc-string").is_err());
    }
}
