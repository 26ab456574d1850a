//! Error taxonomy shared across the engine.
//!
//! Three failure families must never be conflated, because operators respond
//! to them differently:
//!
//! - [`ConfigError`] — key material missing or malformed at startup. Fatal;
//!   the façade refuses to operate rather than falling back to plaintext.
//! - [`EncodingError`] — a value carries the envelope magic prefix but its
//!   body cannot be parsed ("can't even parse this").
//! - [`DecryptError`] — the envelope parsed but decryption failed ("parsed
//!   fine but authentication failed"), or in strict mode the value was never
//!   encrypted at all.

use thiserror::Error;

/// Fatal configuration problems, surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The underlying environment source could not be read or deserialised.
    #[error("failed to read configuration from environment: {0}")]
    Environment(#[from] config::ConfigError),

    /// `FIELD_ENCRYPTION_KEY` is absent or blank.
    #[error("FIELD_ENCRYPTION_KEY is required and must not be empty")]
    MissingKey,

    /// Key material has the wrong length.
    #[error("key material must be 64 hex characters (32 bytes), got {0} characters")]
    BadKeyLength(usize),

    /// Key material is not valid hex.
    #[error("key material is not valid hex")]
    BadKeyEncoding,

    /// Key versions start at 1; version 0 is reserved as "never valid".
    #[error("key version must be >= 1")]
    ZeroKeyVersion,

    /// A `FIELD_ENCRYPTION_PRIOR_KEYS` entry does not match `<version>=<hex>`.
    #[error("invalid prior key entry {0:?}: expected <version>=<hex>")]
    BadPriorKeyEntry(String),

    /// The same key version appears twice.
    #[error("duplicate key version {0}")]
    DuplicateKeyVersion(u32),

    /// New encryptions must always use the highest version available.
    #[error("prior key version {prior} must be lower than the active version {active}")]
    VersionOrder { prior: u32, active: u32 },
}

/// Envelope parse failures.
///
/// [`MissingMagic`](EncodingError::MissingMagic) means "this is not an
/// envelope at all"; every other variant means the magic prefix was present
/// but the body is malformed.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// The value does not start with the `ENC:` magic prefix.
    #[error("value does not carry the envelope magic prefix")]
    MissingMagic,

    /// The value does not split into the expected five segments.
    #[error("envelope has {0} segments, expected 5")]
    WrongSegmentCount(usize),

    /// The algorithm version tag is not one this build understands.
    #[error("unsupported algorithm version {0:?}")]
    UnsupportedAlgVersion(String),

    /// The key version segment is not a decimal integer.
    #[error("invalid key version segment {0:?}")]
    InvalidKeyVersion(String),

    /// A segment is not valid URL-safe base64.
    #[error("invalid base64 in {0} segment")]
    InvalidBase64(&'static str),

    /// The nonce decodes to the wrong number of bytes.
    #[error("nonce has wrong length: {0} bytes")]
    BadNonceLength(usize),

    /// The ciphertext segment is too short to even contain an authentication tag.
    #[error("ciphertext segment too short to contain an authentication tag")]
    TruncatedCiphertext,
}

/// Encryption failures.
#[derive(Debug, Error)]
pub enum EncryptError {
    /// The AEAD operation failed (unreachable with a well-formed key).
    #[error("aead encryption failed")]
    Aead,
}

/// Decryption failures. Always surfaced to the caller, never swallowed:
/// each variant signals either corrupted storage or an operational
/// key-management mistake.
#[derive(Debug, Error)]
pub enum DecryptError {
    /// Strict mode only: the value carries no envelope magic and was
    /// therefore never encrypted.
    #[error("value is not an encrypted envelope")]
    NotEncrypted,

    /// The value carries the magic prefix but the envelope body is malformed.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The envelope references a key generation this process does not hold.
    #[error("no key available for key version {0}")]
    UnknownKeyVersion(u32),

    /// Authenticated decryption failed: the ciphertext was tampered with,
    /// is corrupt, or was produced under a different key.
    #[error("authentication failed: ciphertext is corrupt or was tampered with")]
    Authentication,

    /// The decrypted bytes are not valid UTF-8.
    #[error("decrypted bytes are not valid UTF-8")]
    InvalidPlaintext,
}

/// Lookup miss in the field registry — a programmer error, surfaced loudly.
#[derive(Debug, Error)]
#[error("no field declarations registered for document type {0:?}")]
pub struct UnknownDocumentType(pub String);
