use crate::arithmetic::{check_operating_credit, check_readable, check_summary};
use crate::compound::check_compound;
use crate::config::AuditConfig;
use crate::consistency::check_registry;
use crate::error::AuditError;
use crate::exclusion::resolve_mode;
use crate::model::{
    AuditMeta, AuditReport, Issue, IssueCategory, RawWorkbook, Row, RowMode, SheetCategory,
    SheetContent, SheetRef, Workbook,
};
use crate::registry::RegistryIndex;
use crate::summary::compute_summary;

/// Row counts gathered alongside the issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub sheets_checked: usize,
    pub sheets_skipped: usize,
    pub rows_checked: usize,
    pub rows_excluded: usize,
}

/// Parse, classify, and check a whole workbook.
///
/// Only rule-set errors fail the run. Unreadable sheets become structural
/// issues, and a missing registry becomes a warning with arithmetic checks
/// still applied everywhere.
pub fn run(config: &AuditConfig, raw: &RawWorkbook) -> Result<AuditReport, AuditError> {
    config.validate()?;
    let workbook = Workbook::build(raw, config)?;

    let mut warnings = Vec::new();
    let registry = match RegistryIndex::from_workbook(raw, &config.registry) {
        Ok(index) => Some(index),
        Err(e @ AuditError::MissingRegistry(_)) => {
            log::warn!("{e}");
            warnings.push(e.to_string());
            None
        }
        Err(e) => return Err(e),
    };

    let (issues, tally) = validate(&workbook, registry.as_ref(), config.similarity_threshold);
    let summary = compute_summary(&issues, &tally);
    log::info!(
        "checked {} sheet(s), {} row(s): {} issue(s), {} row(s) excluded",
        tally.sheets_checked,
        tally.rows_checked,
        summary.total_issues,
        tally.rows_excluded
    );

    Ok(AuditReport {
        meta: AuditMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            registry_entries: registry.as_ref().map_or(0, RegistryIndex::len),
        },
        summary,
        warnings,
        issues,
        sheets: workbook
            .entries
            .iter()
            .map(|e| SheetRef {
                name: e.name.clone(),
                category: e.category,
            })
            .collect(),
    })
}

/// Check every sheet of an already-built workbook. Pure: the same inputs
/// always produce the same issue list, in sheet order then row order.
pub fn validate(
    workbook: &Workbook,
    registry: Option<&RegistryIndex>,
    threshold: f64,
) -> (Vec<Issue>, Tally) {
    let mut issues = Vec::new();
    let mut tally = Tally::default();

    for entry in &workbook.entries {
        match &entry.content {
            SheetContent::Rows(rows) => {
                tally.sheets_checked += 1;
                issues.extend(check_sheet(&entry.name, entry.category, rows, registry, threshold, &mut tally));
            }
            SheetContent::Notes => {
                tally.sheets_skipped += 1;
            }
            SheetContent::Unreadable(e) => {
                log::warn!("{e}");
                tally.sheets_skipped += 1;
                issues.push(Issue::sheet_level(&entry.name, IssueCategory::Structural, e.to_string()));
            }
        }
    }

    (issues, tally)
}

/// Check one sheet's rows in order. Rows are sequential because the
/// carry-over rule reads the row above.
pub fn check_sheet(
    sheet: &str,
    category: SheetCategory,
    rows: &[Row],
    registry: Option<&RegistryIndex>,
    threshold: f64,
    tally: &mut Tally,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let mode = resolve_mode(row, category);
        if mode == RowMode::Excluded {
            tally.rows_excluded += 1;
            continue;
        }
        tally.rows_checked += 1;

        issues.extend(check_readable(sheet, row));
        let previous = i.checked_sub(1).map(|p| &rows[p]);
        issues.extend(check_operating_credit(sheet, row, previous));
        issues.extend(check_summary(sheet, row));

        match (mode, registry) {
            (RowMode::Compound, Some(index)) => {
                issues.extend(check_compound(sheet, row, index, threshold));
            }
            (RowMode::Normal, Some(index)) => {
                issues.extend(check_registry(sheet, row, index, threshold));
            }
            _ => {}
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SubjectAttributes, SummaryCell};
    use crate::registry::RegistryEntry;

    const YELLOW: [u8; 4] = [255, 255, 0, 255];

    fn row(number: usize, name: &str, op: f64, detail: [f64; 6]) -> Row {
        let sum: f64 = detail.iter().sum();
        Row {
            row_number: number,
            subject_name: name.into(),
            name_fill: None,
            operating_credit: op,
            detail_credits: detail.to_vec(),
            summary_values: vec![SummaryCell {
                column: "M".into(),
                observed: sum,
                expected: sum,
            }],
            attributes: attrs(),
            unreadable: vec![],
        }
    }

    fn attrs() -> SubjectAttributes {
        SubjectAttributes {
            subject_type: "일반선택".into(),
            base_credit: "3".into(),
            grading_method: "5등급".into(),
            scope: "과학".into(),
        }
    }

    fn registry() -> RegistryIndex {
        RegistryIndex::from_entries(["물리학Ⅰ", "생명과학Ⅰ"].map(|n| RegistryEntry {
            name: n.into(),
            attributes: attrs(),
        }))
    }

    #[test]
    fn excluded_row_produces_nothing_even_when_broken() {
        let mut bad = row(2, "없는과목", 9.0, [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        bad.name_fill = Some(YELLOW);
        bad.summary_values[0].observed = 42.0;
        let mut tally = Tally::default();
        let issues = check_sheet("2025", SheetCategory::Cohort2025_2026, &[bad], Some(&registry()), 0.6, &mut tally);
        assert!(issues.is_empty());
        assert_eq!(tally.rows_excluded, 1);
        assert_eq!(tally.rows_checked, 0);
    }

    #[test]
    fn carry_over_reads_excluded_row_above() {
        let mut above = row(2, "물리학Ⅰ", 3.0, [1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        above.name_fill = Some(YELLOW);
        let below = row(3, "생명과학Ⅰ", 3.0, [0.0; 6]);
        let mut tally = Tally::default();
        let issues = check_sheet(
            "2025",
            SheetCategory::Cohort2025_2026,
            &[above, below],
            Some(&registry()),
            0.6,
            &mut tally,
        );
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn cohort_2024_skips_name_checks() {
        let rows = [row(2, "없는과목", 3.0, [3.0, 0.0, 0.0, 0.0, 0.0, 0.0])];
        let mut tally = Tally::default();
        let issues = check_sheet("2024", SheetCategory::Cohort2024, &rows, Some(&registry()), 0.6, &mut tally);
        assert!(issues.is_empty());
    }

    #[test]
    fn missing_registry_still_runs_arithmetic() {
        let rows = [row(2, "없는과목", 4.0, [3.0, 0.0, 0.0, 0.0, 0.0, 0.0])];
        let mut tally = Tally::default();
        let issues = check_sheet("2025", SheetCategory::Cohort2025_2026, &rows, None, 0.6, &mut tally);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, IssueCategory::Arithmetic);
    }

    #[test]
    fn compound_row_never_compares_attributes() {
        let mut r = row(2, "물리학Ⅰ↔화학Ⅰ", 3.0, [3.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        r.attributes.base_credit = "99".into();
        let mut tally = Tally::default();
        let issues = check_sheet("2025", SheetCategory::Cohort2025_2026, &[r], Some(&registry()), 0.6, &mut tally);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, IssueCategory::NameNotFound);
        assert!(issues[0].message.contains("화학Ⅰ"));
    }
}
