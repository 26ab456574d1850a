//! One-way hashing and random token helpers.
//!
//! For values that never need to be decrypted — verification tokens, OTP
//! hashes — a SHA-256 digest is stored instead of an envelope.

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// SHA-256 digest of `value`, hex-encoded.
pub fn hash_value(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// Generate `len` random bytes from the OS CSPRNG, hex-encoded.
pub fn generate_secure_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Compare `value` against a hash produced by [`hash_value`] without
/// short-circuiting on the first differing byte.
pub fn verify_hash(value: &str, expected: &str) -> bool {
    let actual = hash_value(value);
    if actual.len() != expected.len() {
        return false;
    }
    actual
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_hex() {
        let h = hash_value("token-123");
        assert_eq!(h, hash_value("token-123"));
        assert_eq!(h.len(), 64);
        assert!(h.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn verify_accepts_matching_value() {
        let h = hash_value("otp-991238");
        assert!(verify_hash("otp-991238", &h));
    }

    #[test]
    fn verify_rejects_wrong_value_and_wrong_length() {
        let h = hash_value("expected");
        assert!(!verify_hash("actual", &h));
        assert!(!verify_hash("expected", "deadbeef"));
    }

    #[test]
    fn tokens_are_random_and_sized() {
        let a = generate_secure_token(32);
        let b = generate_secure_token(32);
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
