//! The versioned ciphertext envelope: a self-describing string stored in
//! place of a sensitive field.
//!
//! # Wire format
//!
//! ```text
//! ENC:v1:<key_version>:<base64url-no-pad(nonce)>:<base64url-no-pad(ciphertext+tag)>
//! ```
//!
//! The fixed `ENC:` magic never collides with plausible plaintext, and the
//! algorithm tag (`v1`) plus decimal key version let future key or algorithm
//! rotations coexist with old ciphertext. The envelope is decoded exactly
//! once at the boundary into the [`Envelope`] variant; downstream code never
//! pattern-matches on raw strings.
//!
//! Parsing is total: any input that is not a well-formed envelope — empty,
//! numeric, truncated, or a magic prefix with a malformed body — yields an
//! error from [`Envelope::parse`] (or `None` from [`Envelope::decode`]),
//! never a panic. A malformed body is treated as plaintext that happens to
//! look similar, which is the safer default than blocking a read.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::error::EncodingError;

/// Magic tag at the start of every encrypted field value.
pub const MAGIC: &str = "ENC";

/// Algorithm version tag for AES-256-GCM-SIV envelopes.
pub const ALG_V1: &str = "v1";

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the authentication tag appended to the ciphertext.
pub const TAG_LEN: usize = 16;

const MAGIC_PREFIX: &str = "ENC:";

/// A parsed ciphertext envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// AES-256-GCM-SIV under the key generation named by `key_version`.
    V1 {
        /// Which key generation sealed this value.
        key_version: u32,
        /// Raw nonce bytes.
        nonce: [u8; NONCE_LEN],
        /// Raw ciphertext + authentication tag bytes.
        ciphertext: Vec<u8>,
    },
}

impl Envelope {
    /// The key generation this envelope was sealed under.
    pub fn key_version(&self) -> u32 {
        match self {
            Envelope::V1 { key_version, .. } => *key_version,
        }
    }

    /// Encode to the canonical string representation. Deterministic and
    /// lossless: `parse(encode(e)) == e`.
    pub fn encode(&self) -> String {
        match self {
            Envelope::V1 {
                key_version,
                nonce,
                ciphertext,
            } => format!(
                "{MAGIC}:{ALG_V1}:{key_version}:{}:{}",
                URL_SAFE_NO_PAD.encode(nonce),
                URL_SAFE_NO_PAD.encode(ciphertext),
            ),
        }
    }

    /// Parse an envelope string, reporting why parsing failed.
    ///
    /// # Errors
    ///
    /// [`EncodingError::MissingMagic`] when the value is not an envelope at
    /// all; any other variant when the magic prefix is present but the body
    /// is malformed.
    pub fn parse(value: &str) -> Result<Self, EncodingError> {
        if !value.starts_with(MAGIC_PREFIX) {
            return Err(EncodingError::MissingMagic);
        }

        // base64url never contains ':', so a plain split is unambiguous.
        let parts: Vec<&str> = value.split(':').collect();
        if parts.len() != 5 {
            return Err(EncodingError::WrongSegmentCount(parts.len()));
        }
        if parts[1] != ALG_V1 {
            return Err(EncodingError::UnsupportedAlgVersion(parts[1].to_owned()));
        }

        let key_version: u32 = parts[2]
            .parse()
            .map_err(|_| EncodingError::InvalidKeyVersion(parts[2].to_owned()))?;

        let nonce_bytes = URL_SAFE_NO_PAD
            .decode(parts[3])
            .map_err(|_| EncodingError::InvalidBase64("nonce"))?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(EncodingError::BadNonceLength(nonce_bytes.len()));
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&nonce_bytes);

        let ciphertext = URL_SAFE_NO_PAD
            .decode(parts[4])
            .map_err(|_| EncodingError::InvalidBase64("ciphertext"))?;
        if ciphertext.len() < TAG_LEN {
            return Err(EncodingError::TruncatedCiphertext);
        }

        Ok(Envelope::V1 {
            key_version,
            nonce,
            ciphertext,
        })
    }

    /// Parse an envelope string, collapsing all failures to `None`.
    pub fn decode(value: &str) -> Option<Self> {
        Self::parse(value).ok()
    }

    /// Whether `value` carries the envelope magic prefix — regardless of
    /// whether the rest of it parses.
    pub fn has_magic(value: &str) -> bool {
        value.starts_with(MAGIC_PREFIX)
    }
}

/// Whether `value` is a well-formed envelope under a recognised algorithm
/// version. Total: never panics, false for anything else.
pub fn is_encrypted(value: &str) -> bool {
    Envelope::decode(value).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope::V1 {
            key_version: 3,
            nonce: [7u8; NONCE_LEN],
            ciphertext: vec![0xAB; TAG_LEN + 4],
        }
    }

    #[test]
    fn encode_parse_round_trip() {
        let env = sample();
        let s = env.encode();
        assert!(s.starts_with("ENC:v1:3:"), "unexpected prefix: {s}");
        assert_eq!(Envelope::parse(&s).unwrap(), env);
    }

    #[test]
    fn is_encrypted_true_only_for_well_formed_envelopes() {
        assert!(is_encrypted(&sample().encode()));
        assert!(!is_encrypted(""));
        assert!(!is_encrypted("plain text"));
        assert!(!is_encrypted("not:an:envelope"));
        assert!(!is_encrypted("12345"));
    }

    #[test]
    fn decode_is_total_on_malformed_envelope_like_strings() {
        // None of these may panic; all must decode to None.
        for s in [
            "ENC:",
            "ENC:v1",
            "ENC:v1:1",
            "ENC:v1:1:AAAA",
            "ENC:v1:1:AAAA:BBBB:extra",
            "ENC:v1:notanumber:AAAAAAAAAAAAAAAA:AAAAAAAAAAAAAAAAAAAAAA",
            "ENC:v1:1:!!!!:AAAAAAAAAAAAAAAAAAAAAA",
            "ENC:v1:1:AAAAAAAAAAAAAAAA:????",
        ] {
            assert!(Envelope::decode(s).is_none(), "decoded: {s}");
            assert!(!is_encrypted(s));
        }
    }

    #[test]
    fn truncated_envelope_is_not_encrypted() {
        let s = sample().encode();
        let truncated = &s[..s.len() - 10];
        assert!(!is_encrypted(truncated));
    }

    #[test]
    fn unknown_alg_version_is_rejected() {
        let s = sample().encode().replacen("v1", "v9", 1);
        assert!(matches!(
            Envelope::parse(&s),
            Err(EncodingError::UnsupportedAlgVersion(v)) if v == "v9"
        ));
        assert!(!is_encrypted(&s));
    }

    #[test]
    fn wrong_nonce_length_is_rejected() {
        let short_nonce = URL_SAFE_NO_PAD.encode([1u8; 8]);
        let ct = URL_SAFE_NO_PAD.encode([2u8; TAG_LEN]);
        let s = format!("ENC:v1:1:{short_nonce}:{ct}");
        assert!(matches!(
            Envelope::parse(&s),
            Err(EncodingError::BadNonceLength(8))
        ));
    }

    #[test]
    fn ciphertext_shorter_than_tag_is_rejected() {
        let nonce = URL_SAFE_NO_PAD.encode([1u8; NONCE_LEN]);
        let ct = URL_SAFE_NO_PAD.encode([2u8; TAG_LEN - 1]);
        let s = format!("ENC:v1:1:{nonce}:{ct}");
        assert!(matches!(
            Envelope::parse(&s),
            Err(EncodingError::TruncatedCiphertext)
        ));
    }

    #[test]
    fn has_magic_does_not_require_a_valid_body() {
        assert!(Envelope::has_magic("ENC:garbage"));
        assert!(!Envelope::has_magic("ENC"));
        assert!(!Envelope::has_magic("plaintext"));
    }

    #[test]
    fn key_version_is_preserved() {
        let s = sample().encode();
        assert_eq!(Envelope::parse(&s).unwrap().key_version(), 3);
    }
}
