//! Argon2id password hashing
//!
//! Hashes are PHC strings (`$argon2id$v=19$...`) carrying their own salt and
//! parameters, so they can be verified without any other stored state.

use crate::{CryptoError, Result};
use argon2::Argon2;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::OnceLock;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| CryptoError::PasswordHash(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CryptoError::PasswordHash(e.to_string()))?
        .to_string();
    Ok(phc)
}

/// Verify a password against a stored PHC string. Malformed hashes never verify.
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Spend the same work as a real verification. Used when the username is
/// unknown so that response timing does not reveal which accounts exist.
pub fn burn_verification(password: &str) {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    if let Some(hash) = DUMMY.get_or_init(|| hash_password("stash-unknown-user").ok()) {
        let _ = verify_password(hash, password);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hash, "correct horse"));
        assert!(!verify_password(&hash, "wrong horse"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
        assert!(verify_password(&a, "same password"));
        assert!(verify_password(&b, "same password"));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("plaintext", "plaintext"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn test_burn_verification_does_not_panic() {
        burn_verification("anything");
        burn_verification("");
    }
}
