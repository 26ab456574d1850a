//! Summary rendering and exit-code policy.

use crate::scan::{CollectionReport, FieldCounts, Mode};

/// Print every recorded violation followed by the per-collection summary
/// table and a final status line.
pub fn print_summary(reports: &[CollectionReport], mode: Mode) {
    println!();
    for report in reports {
        for v in &report.violations {
            println!(
                "plaintext found: collection={} id={} field={}",
                report.collection, v.doc_id, v.path
            );
        }
    }

    println!(
        "{:<26} {:>9} {:>10} {:>10} {:>10} {:>7} {:>7}",
        "collection", "documents", "encrypted", "plaintext", "migrated", "empty", "errors"
    );
    let mut total = FieldCounts::default();
    let mut total_docs = 0u64;
    for report in reports {
        print_row(&report.collection, report.documents, &report.counts);
        total_docs += report.documents;
        total.already_encrypted += report.counts.already_encrypted;
        total.plaintext_found += report.counts.plaintext_found;
        total.encrypted_now += report.counts.encrypted_now;
        total.empty += report.counts.empty;
        total.errors += report.counts.errors;
    }
    println!("{}", "-".repeat(85));
    print_row("TOTAL", total_docs, &total);
    println!();

    if reports.iter().any(|r| r.cancelled) {
        println!("cancelled before completion; results above are partial");
        return;
    }
    match mode {
        Mode::Audit if total.plaintext_found == 0 => {
            println!("audit passed: every declared field is encrypted or empty");
        }
        Mode::Audit => {
            println!(
                "audit FAILED: {} plaintext field(s) outstanding — run with --migrate to encrypt them",
                total.plaintext_found
            );
        }
        Mode::Migrate if total.errors == 0 => {
            println!(
                "migration complete: {} field(s) encrypted across {} document(s)",
                total.encrypted_now,
                reports.iter().map(|r| r.documents_written).sum::<u64>()
            );
        }
        Mode::Migrate => {
            println!(
                "migration finished with {} error(s): {} field(s) encrypted, review the log",
                total.errors, total.encrypted_now
            );
        }
    }
}

fn print_row(label: &str, documents: u64, c: &FieldCounts) {
    println!(
        "{:<26} {:>9} {:>10} {:>10} {:>10} {:>7} {:>7}",
        label, documents, c.already_encrypted, c.plaintext_found, c.encrypted_now, c.empty, c.errors
    );
}

/// Exit code policy: zero only when no policy violation is outstanding.
///
/// - Audit: any PLAINTEXT_FOUND fails.
/// - Migrate: any per-field error fails.
/// - A cancelled run is incomplete and therefore fails in both modes.
pub fn exit_code(reports: &[CollectionReport], mode: Mode) -> u8 {
    let cancelled = reports.iter().any(|r| r.cancelled);
    let errors = reports.iter().any(|r| r.counts.errors > 0);
    let outstanding =
        mode == Mode::Audit && reports.iter().any(|r| r.counts.plaintext_found > 0);

    u8::from(cancelled || errors || outstanding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(plaintext_found: u64, errors: u64, cancelled: bool) -> CollectionReport {
        CollectionReport {
            collection: "users".into(),
            documents: 1,
            counts: FieldCounts {
                plaintext_found,
                errors,
                ..FieldCounts::default()
            },
            violations: Vec::new(),
            documents_written: 0,
            cancelled,
        }
    }

    #[test]
    fn clean_audit_exits_zero() {
        let reports = vec![report(0, 0, false)];
        assert_eq!(exit_code(&reports, Mode::Audit), 0);
    }

    #[test]
    fn audit_with_outstanding_plaintext_exits_nonzero() {
        let reports = vec![report(1, 0, false)];
        assert_eq!(exit_code(&reports, Mode::Audit), 1);
    }

    #[test]
    fn migrate_with_remaining_plaintext_but_no_errors_exits_zero() {
        // In migrate mode plaintext_found counts fields that *were* found
        // and encrypted; only errors leave outstanding work.
        let reports = vec![report(3, 0, false)];
        assert_eq!(exit_code(&reports, Mode::Migrate), 0);
    }

    #[test]
    fn migrate_with_errors_exits_nonzero() {
        let reports = vec![report(3, 1, false)];
        assert_eq!(exit_code(&reports, Mode::Migrate), 1);
    }

    #[test]
    fn cancelled_run_exits_nonzero_in_both_modes() {
        let reports = vec![report(0, 0, true)];
        assert_eq!(exit_code(&reports, Mode::Audit), 1);
        assert_eq!(exit_code(&reports, Mode::Migrate), 1);
    }
}
