//! Credit arithmetic: operating credit vs. detail sum (with carry-over), and
//! summary-column totals. Both checks run independently on every row that
//! is not excluded.

use crate::model::{format_number, Issue, IssueCategory, Row};

const EPSILON: f64 = 1e-9;

fn same(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Operating credit must equal the detail sum. A zero detail sum marks a
/// carry-over row, whose credits live on the row above: its operating credit
/// must then equal the previous row's. The previous row is positional,
/// regardless of that row's own mode.
pub fn check_operating_credit(sheet: &str, row: &Row, previous: Option<&Row>) -> Option<Issue> {
    let detail_sum = row.detail_sum();
    let observed = row.operating_credit;

    if !same(detail_sum, 0.0) {
        if same(observed, detail_sum) {
            return None;
        }
        return Some(Issue::at(
            sheet,
            row.row_number,
            IssueCategory::Arithmetic,
            format!(
                "operating credit {} does not match detail credit sum {}",
                format_number(observed),
                format_number(detail_sum)
            ),
        ));
    }

    match previous {
        Some(prev) if same(observed, prev.operating_credit) => None,
        Some(prev) => Some(Issue::at(
            sheet,
            row.row_number,
            IssueCategory::Arithmetic,
            format!(
                "carry-over row: expected operating credit {} (row {}), found {}",
                format_number(prev.operating_credit),
                prev.row_number,
                format_number(observed)
            ),
        )),
        None => Some(Issue::at(
            sheet,
            row.row_number,
            IssueCategory::Arithmetic,
            format!(
                "detail credits are all zero and there is no previous row to carry operating credit {} from",
                format_number(observed)
            ),
        )),
    }
}

/// One issue per summary column whose value differs from its source sum.
pub fn check_summary(sheet: &str, row: &Row) -> Vec<Issue> {
    row.summary_values
        .iter()
        .filter(|cell| !same(cell.observed, cell.expected))
        .map(|cell| {
            Issue::at(
                sheet,
                row.row_number,
                IssueCategory::Arithmetic,
                format!(
                    "column {}: expected {}, found {}",
                    cell.column,
                    format_number(cell.expected),
                    format_number(cell.observed)
                ),
            )
        })
        .collect()
}

/// Numeric cells holding text were read as 0; say so.
pub fn check_readable(sheet: &str, row: &Row) -> Vec<Issue> {
    row.unreadable
        .iter()
        .map(|cell| {
            Issue::at(
                sheet,
                row.row_number,
                IssueCategory::Structural,
                format!("column {}: '{}' is not a number, read as 0", cell.column, cell.raw),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SubjectAttributes, SummaryCell};

    fn row(number: usize, op: f64, detail: [f64; 6]) -> Row {
        Row {
            row_number: number,
            subject_name: "국어".into(),
            name_fill: None,
            operating_credit: op,
            detail_credits: detail.to_vec(),
            summary_values: vec![],
            attributes: SubjectAttributes::default(),
            unreadable: vec![],
        }
    }

    #[test]
    fn detail_sum_matches() {
        let r = row(3, 3.0, [1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        assert!(check_operating_credit("2025", &r, None).is_none());
    }

    #[test]
    fn detail_sum_mismatch_cites_both_values() {
        let r = row(3, 4.0, [1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        let issue = check_operating_credit("2025", &r, None).unwrap();
        assert_eq!(issue.category, IssueCategory::Arithmetic);
        assert_eq!(issue.row, Some(3));
        assert!(issue.message.contains("operating credit 4"));
        assert!(issue.message.contains("sum 3"));
    }

    #[test]
    fn fractional_credits_compare_with_tolerance() {
        let r = row(3, 0.3, [0.1, 0.2, 0.0, 0.0, 0.0, 0.0]);
        assert!(check_operating_credit("2025", &r, None).is_none());
    }

    #[test]
    fn carry_over_matches_previous() {
        let prev = row(4, 3.0, [1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        let r = row(5, 3.0, [0.0; 6]);
        assert!(check_operating_credit("2025", &r, Some(&prev)).is_none());
    }

    #[test]
    fn carry_over_mismatch_reports_expected_and_observed() {
        let prev = row(4, 2.0, [1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let r = row(5, 3.0, [0.0; 6]);
        let issue = check_operating_credit("2025", &r, Some(&prev)).unwrap();
        assert_eq!(
            issue.message,
            "carry-over row: expected operating credit 2 (row 4), found 3"
        );
    }

    #[test]
    fn carry_over_without_previous_row_fails() {
        let r = row(2, 0.0, [0.0; 6]);
        let issue = check_operating_credit("2025", &r, None).unwrap();
        assert!(issue.message.contains("no previous row"));
    }

    #[test]
    fn summary_columns_checked_independently() {
        let mut r = row(3, 3.0, [1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        r.summary_values = vec![
            SummaryCell {
                column: "M".into(),
                observed: 2.0,
                expected: 3.0,
            },
            SummaryCell {
                column: "N".into(),
                observed: 3.0,
                expected: 3.0,
            },
        ];
        let issues = check_summary("2025", &r);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "column M: expected 3, found 2");
    }
}
