//! Key material resolution and rotation support.
//!
//! # Lifecycle
//!
//! 1. At startup, [`KeyProvider::from_config`] reads the active key (and any
//!    retired generations) from validated process configuration.
//! 2. The provider is immutable from then on and shared by `Arc` into the
//!    façade and the audit tool — load once, reuse everywhere, no locking.
//! 3. New encryptions always use the active key, which is the highest
//!    version the provider holds; decryption accepts any known version.
//!
//! # Security invariants
//!
//! - Key bytes are **never** written to logs or `Debug` output and are
//!   zeroed when dropped.
//! - A missing or malformed key is fatal at construction; there is no
//!   fallback to a derived or default key.

pub mod provider;

pub use provider::{KeyMaterial, KeyProvider, KEY_LEN};
