//! Per-document-type declarations of which fields hold sensitive data, and
//! traversal of documents along those declarations.
//!
//! # Responsibilities
//!
//! - Parse dot-notation paths (`kycData.idNumber`, `items[].serial`) into
//!   typed segments.
//! - Map each document-type name to its ordered, deduplicated path list.
//! - Walk a `serde_json::Value` to the values a path names, treating missing
//!   intermediate objects as "field absent", never as an error.
//!
//! # Module invariants
//!
//! - **No crypto dependencies.** This module must not import anything from
//!   `crate::crypto` or `crate::keys`.
//! - Declarations are static configuration, fixed at deploy time — never
//!   derived from the data being scanned.

pub mod path;
pub mod registry;
pub mod walk;

pub use path::{FieldPath, Segment};
pub use registry::FieldRegistry;
