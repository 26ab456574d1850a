//! AES-256-GCM-SIV field encryption primitives.
//!
//! This module is intentionally free of configuration and I/O dependencies.
//! It provides the low-level seal/open operations composed by the façade;
//! the string form of a ciphertext is defined in [`crate::envelope`].

pub mod cipher;

pub use cipher::{open_field, seal_field};
