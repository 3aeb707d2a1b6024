use std::collections::{BTreeMap, BTreeSet};

use crate::engine::Tally;
use crate::model::{AuditSummary, Issue};

/// Compute summary statistics from the issue list.
pub fn compute_summary(issues: &[Issue], tally: &Tally) -> AuditSummary {
    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut sheets: BTreeSet<&str> = BTreeSet::new();

    for issue in issues {
        *category_counts.entry(issue.category.to_string()).or_insert(0) += 1;
        sheets.insert(issue.sheet.as_str());
    }

    AuditSummary {
        total_issues: issues.len(),
        sheets_checked: tally.sheets_checked,
        sheets_skipped: tally.sheets_skipped,
        sheets_with_issues: sheets.len(),
        rows_checked: tally.rows_checked,
        rows_excluded: tally.rows_excluded,
        category_counts,
        passed: issues.is_empty(),
    }
}
