//! Field-level encryption for the account dashboard's document store.
//!
//! Individual string fields inside otherwise-plaintext documents are sealed
//! with AES-256-GCM-SIV and stored as versioned envelope strings:
//!
//! ```text
//! ENC:v1:<key_version>:<nonce>:<ciphertext+tag>
//! ```
//!
//! The [`FieldCrypt`] façade is the application-facing surface; each document
//! type declares which of its fields must be encrypted via [`FieldRegistry`].
//! Key material is resolved once at startup into an immutable
//! [`KeyProvider`], which holds retired key generations so old envelopes
//! stay readable across rotations. The companion `fieldcrypt-audit` binary
//! drives the same façade in bulk to migrate and verify live collections.

pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod facade;
pub mod fields;
pub mod hashing;
pub mod keys;

pub use config::{Config, DecryptMode};
pub use envelope::{is_encrypted, Envelope};
pub use error::{ConfigError, DecryptError, EncodingError, EncryptError, UnknownDocumentType};
pub use facade::FieldCrypt;
pub use fields::{FieldPath, FieldRegistry};
pub use keys::{KeyMaterial, KeyProvider, KEY_LEN};
