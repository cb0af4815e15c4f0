//! Human-readable job summaries, used by the command-line runner and logs.

use crate::core::{
    budget_guard::BudgetGuardReport, cleanup::CleanupReport, materializer::MaterializeReport,
    reconciler::ReconcileReport,
};
use std::fmt::Write;

/// Formats a materializer report.
#[must_use]
pub fn format_materialize_summary(report: &MaterializeReport) -> String {
    let mut summary = format!(
        "Materialize - {} subscription(s) processed\n  Created: {} | Already present: {}\n",
        report.clients_processed, report.created_count, report.already_present_count
    );

    for failure in &report.invalid {
        // write! is infallible when writing to String
        let _ = writeln!(summary, "  Skipped client {}: {}", failure.client_id, failure.reason);
    }
    for failure in &report.failed {
        let _ = writeln!(summary, "  Failed client {}: {}", failure.client_id, failure.error);
    }

    summary
}

/// Formats a reconciler report.
#[must_use]
pub fn format_reconcile_summary(report: &ReconcileReport) -> String {
    format!(
        "Reconcile - examined {} future income(s)\n  Reset to pending: {} | Promoted to paid: {}\n",
        report.examined, report.corrected, report.promoted
    )
}

/// Formats a budget guard report, one line per moved record.
#[must_use]
pub fn format_budget_guard_summary(report: &BudgetGuardReport) -> String {
    let mut summary = format!(
        "Budget guard - fixed {} record(s), {} orphan(s)\n",
        report.fixed, report.orphans
    );

    for fix in &report.fixes {
        let _ = writeln!(
            summary,
            "  {} {} | budget {} → {} ({})",
            fix.kind.as_str(),
            fix.record_id,
            fix.from_budget_id,
            fix.to_budget_id,
            fix.budget_type
        );
    }
    for failure in &report.failures {
        let _ = match failure.record_id {
            Some(id) => writeln!(summary, "  {} {} failed: {}", failure.scan, id, failure.error),
            None => writeln!(summary, "  Scan {} failed: {}", failure.scan, failure.error),
        };
    }

    summary
}

/// Formats a cleanup report.
#[must_use]
pub fn format_cleanup_summary(report: &CleanupReport) -> String {
    format!(
        "Cleanup - warnings30: {} | warnings7: {} | blocked: {} | deleted: {}\n",
        report.warnings30, report.warnings7, report.blocked, report.deleted
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::budget_guard::{BudgetFix, RecordKind, ScanFailure};
    use crate::core::materializer::ValidationFailure;
    use crate::entities::BudgetType;

    #[test]
    fn test_format_materialize_summary() {
        let report = MaterializeReport {
            created_count: 4,
            already_present_count: 2,
            clients_processed: 3,
            invalid: vec![ValidationFailure {
                client_id: 9,
                success: false,
                reason: "subscription cadence is missing".to_string(),
            }],
            failed: Vec::new(),
        };

        let summary = format_materialize_summary(&report);
        assert!(summary.contains("3 subscription(s) processed"));
        assert!(summary.contains("Created: 4 | Already present: 2"));
        assert!(summary.contains("Skipped client 9: subscription cadence is missing"));
    }

    #[test]
    fn test_format_budget_guard_summary() {
        let report = BudgetGuardReport {
            fixed: 1,
            orphans: 2,
            fixes: vec![BudgetFix {
                kind: RecordKind::Bill,
                record_id: 12,
                from_budget_id: 3,
                to_budget_id: 5,
                budget_type: BudgetType::Business,
            }],
            failures: vec![ScanFailure {
                scan: "expense".to_string(),
                record_id: Some(7),
                error: "Validation failed: month 13 is out of range".to_string(),
            }],
        };

        let summary = format_budget_guard_summary(&report);
        assert!(summary.contains("fixed 1 record(s), 2 orphan(s)"));
        assert!(summary.contains("bill 12 | budget 3 → 5 (BUSINESS)"));
        assert!(summary.contains("expense 7 failed: Validation failed: month 13 is out of range"));
    }

    #[test]
    fn test_format_cleanup_summary() {
        let summary = format_cleanup_summary(&CleanupReport {
            warnings30: 1,
            warnings7: 0,
            blocked: 2,
            deleted: 0,
        });
        assert_eq!(
            summary,
            "Cleanup - warnings30: 1 | warnings7: 0 | blocked: 2 | deleted: 0\n"
        );
    }
}
