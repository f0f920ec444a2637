//! Password hashing for local email/password accounts
//!
//! Hashes are argon2id PHC strings with a random 16 byte salt.

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

/// Hash a password into a PHC string
///
/// # Errors
///
/// Returns an error if the system random source fails or hashing fails
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!("Failed to generate salt: {e}"))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!("Invalid salt: {e}"))?;

    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {e}"))?
        .to_string();
    Ok(phc)
}

/// Check a password against a stored PHC string
///
/// Unparseable hashes never match.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("Stored password hash is not a valid PHC string: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("123").unwrap(), hash_password("123").unwrap());
    }

    #[test]
    fn test_garbage_hash_never_matches() {
        assert!(!verify_password("123", "not-a-hash"));
        assert!(!verify_password("", ""));
    }
}
