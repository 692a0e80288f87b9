//! Salted, iterated password hashing (PBKDF2-HMAC-SHA256).
//!
//! Stored format: `pbkdf2-sha256$<iterations>$<salt hex>$<hash hex>`.

use crate::{Error, Result};
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use sha2::Sha256;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Hashes a password with a fresh random salt.
///
/// # Errors
///
/// Returns an error if `iterations` is zero.
pub fn hash_password(password: &str, iterations: u32) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt);
    let hash = pbkdf2_sha256(password.as_bytes(), &salt, iterations)?;
    Ok(format!(
        "{SCHEME}${iterations}${}${}",
        hex::encode(salt),
        hex::encode(hash)
    ))
}

/// Checks a password against a stored hash.
///
/// Malformed stored hashes never verify.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    let (Ok(iterations), Ok(salt), Ok(expected)) = (
        iterations.parse::<u32>(),
        hex::decode(salt),
        hex::decode(expected),
    ) else {
        return false;
    };

    pbkdf2_sha256(password.as_bytes(), &salt, iterations)
        .is_ok_and(|actual| constant_time_eq(&actual, &expected))
}

/// Derives a 32-byte PBKDF2-HMAC-SHA256 key.
fn pbkdf2_sha256(password: &[u8], salt: &[u8], iterations: u32) -> Result<[u8; HASH_LEN]> {
    if iterations == 0 {
        return Err(Error::InvalidInput(
            "PBKDF2 iteration count must be positive".to_string(),
        ));
    }

    let mut key = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    Ok(key)
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pbkdf2_known_vectors() {
        let one = pbkdf2_sha256(b"password", b"salt", 1).unwrap();
        assert_eq!(
            hex::encode(one),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
        let two = pbkdf2_sha256(b"password", b"salt", 2).unwrap();
        assert_eq!(
            hex::encode(two),
            "ae4d0c95af6b46d32d0adff928f06dd02a303f8ef3c251dfd6e2d85a95474c43"
        );
    }

    #[test]
    fn test_verifies_hash_from_fixed_salt() {
        // 4096 rounds of "password" over "salt", as stored by an earlier release
        let stored = "pbkdf2-sha256$4096$73616c74$c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a";
        assert!(verify_password("password", stored));
        assert!(!verify_password("Password", stored));
    }

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("hunter22", 1_000).unwrap();
        assert!(stored.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same", 10).unwrap();
        let b = hash_password("same", 10).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "bcrypt$10$abc$def"));
        assert!(!verify_password("x", "pbkdf2-sha256$ten$00$00"));
        assert!(!verify_password("x", "pbkdf2-sha256$0$00$00"));
        assert!(!verify_password("x", "pbkdf2-sha256$1$zz$00"));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(matches!(hash_password("x", 0), Err(Error::InvalidInput(_))));
    }
}
