use serde::Serialize;

use crate::model::{AuditReport, Issue, SheetCategory, SheetRef};

/// Issues of one cohort sheet.
#[derive(Debug, Clone, Serialize)]
pub struct SheetBucket {
    pub sheet: String,
    pub category: SheetCategory,
    pub issues: Vec<Issue>,
}

/// Presentation view over a flat issue list. Grouping never drops,
/// deduplicates, or reorders: each issue lands in `all` and in exactly one
/// of `sheets` / `other`.
#[derive(Debug, Clone, Serialize)]
pub struct GroupedIssues {
    pub all: Vec<Issue>,
    /// One bucket per cohort sheet, in workbook order (empty buckets included).
    pub sheets: Vec<SheetBucket>,
    /// Issues from unclassified sheets.
    pub other: Vec<Issue>,
}

impl GroupedIssues {
    pub fn bucket(&self, sheet: &str) -> Option<&SheetBucket> {
        self.sheets.iter().find(|b| b.sheet == sheet)
    }
}

/// Partition `issues` by the sheets they came from. Issues naming a sheet
/// that is not a known cohort sheet fall into `other`.
pub fn group_issues(issues: &[Issue], sheets: &[SheetRef]) -> GroupedIssues {
    let mut buckets: Vec<SheetBucket> = sheets
        .iter()
        .filter(|s| s.category.is_cohort())
        .map(|s| SheetBucket {
            sheet: s.name.clone(),
            category: s.category,
            issues: Vec::new(),
        })
        .collect();
    let mut other = Vec::new();

    for issue in issues {
        match buckets.iter_mut().find(|b| b.sheet == issue.sheet) {
            Some(bucket) => bucket.issues.push(issue.clone()),
            None => other.push(issue.clone()),
        }
    }

    GroupedIssues {
        all: issues.to_vec(),
        sheets: buckets,
        other,
    }
}

impl AuditReport {
    /// Per-sheet view of this report's issues.
    pub fn grouped(&self) -> GroupedIssues {
        group_issues(&self.issues, &self.sheets)
    }
}
