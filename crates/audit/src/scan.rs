//! Batch scan of one collection: the per-field classification state machine.
//!
//! Every declared field of every document lands in exactly one state:
//!
//! ```text
//! UNSEEN ──▶ ALREADY_ENCRYPTED      value parses as an envelope
//!        ──▶ EMPTY                  absent, null, non-string, or ""
//!        ──▶ PLAINTEXT_FOUND        a declared field holding plaintext
//!               └─(migrate mode)──▶ ENCRYPTED_NOW | ERROR
//! ```
//!
//! Audit mode is read-only and records every PLAINTEXT_FOUND with its
//! document id and field path — that pair is the actionable compliance
//! signal. Migrate mode encrypts in place and persists per batch; a single
//! document's failure is logged and counted, never fatal to the batch.
//! Cancellation is checked before each batch, so stopping a long migration
//! never interrupts in-flight writes.

use anyhow::Result;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use fieldcrypt::fields::walk;
use fieldcrypt::{is_encrypted, FieldCrypt, FieldPath};

use crate::store::DocumentStore;

/// Whether the scan may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Read-only verification.
    Audit,
    /// Encrypt plaintext fields and persist the result.
    Migrate,
}

/// Field classification counts for one collection.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldCounts {
    pub already_encrypted: u64,
    pub empty: u64,
    pub plaintext_found: u64,
    pub encrypted_now: u64,
    pub errors: u64,
}

/// A declared field observed in plaintext during an audit.
#[derive(Debug, Clone)]
pub struct Violation {
    pub doc_id: String,
    pub path: String,
}

/// Outcome of scanning one collection.
#[derive(Debug)]
pub struct CollectionReport {
    pub collection: String,
    pub documents: u64,
    pub counts: FieldCounts,
    pub violations: Vec<Violation>,
    /// Documents actually persisted with changes (always 0 in audit mode).
    pub documents_written: u64,
    /// Whether the scan stopped early on a cancellation signal.
    pub cancelled: bool,
}

/// Walk `store` in bounded batches, classifying every declared field.
pub async fn scan_collection<S: DocumentStore>(
    store: &mut S,
    crypt: &FieldCrypt,
    collection: &str,
    paths: &[FieldPath],
    mode: Mode,
    batch_size: usize,
    cancel: &CancellationToken,
) -> Result<CollectionReport> {
    let mut report = CollectionReport {
        collection: collection.to_owned(),
        documents: 0,
        counts: FieldCounts::default(),
        violations: Vec::new(),
        documents_written: 0,
        cancelled: false,
    };

    loop {
        if cancel.is_cancelled() {
            report.cancelled = true;
            store.finish(false).await?;
            return Ok(report);
        }

        let mut batch = store.next_batch(batch_size).await?;
        if batch.is_empty() {
            break;
        }

        let mut modified: Vec<String> = Vec::new();
        for doc in &mut batch {
            report.documents += 1;
            let mut doc_changed = false;
            for path in paths {
                classify_field(
                    doc.id.as_str(),
                    &mut doc.body,
                    path,
                    crypt,
                    mode,
                    &mut report,
                    &mut doc_changed,
                );
            }
            if doc_changed {
                modified.push(doc.id.clone());
            }
        }

        report.documents_written += modified.len() as u64;
        store.commit_batch(batch, &modified).await?;
    }

    store.finish(true).await?;
    Ok(report)
}

/// Classify (and in migrate mode, encrypt) every leaf a path names on one
/// document.
fn classify_field(
    doc_id: &str,
    body: &mut Value,
    path: &FieldPath,
    crypt: &FieldCrypt,
    mode: Mode,
    report: &mut CollectionReport,
    doc_changed: &mut bool,
) {
    let leaves = walk::collect_mut(body, path);
    if leaves.is_empty() {
        report.counts.empty += 1;
        return;
    }

    for leaf in leaves {
        let Value::String(s) = leaf else {
            report.counts.empty += 1;
            continue;
        };
        if s.is_empty() {
            report.counts.empty += 1;
            continue;
        }
        if is_encrypted(s) {
            report.counts.already_encrypted += 1;
            continue;
        }

        report.counts.plaintext_found += 1;
        match mode {
            Mode::Audit => {
                report.violations.push(Violation {
                    doc_id: doc_id.to_owned(),
                    path: path.as_str().to_owned(),
                });
            }
            Mode::Migrate => match crypt.encrypt(s) {
                Ok(sealed) => {
                    *s = sealed;
                    report.counts.encrypted_now += 1;
                    *doc_changed = true;
                    debug!(doc_id, path = %path, "field encrypted");
                }
                Err(e) => {
                    report.counts.errors += 1;
                    warn!(doc_id, path = %path, error = %e, "field encryption failed");
                }
            },
        }
    }
}
