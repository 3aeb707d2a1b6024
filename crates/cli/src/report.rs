//! Human-readable rendering of an audit report.

use std::fmt::Write as _;

use curricheck_rules::{AuditReport, GroupedIssues, Issue};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Sheet names wider than this are truncated in the "all" table.
const SHEET_COLUMN_MAX: usize = 28;

/// Display width of a string, accounting for CJK double-width characters.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate to `width` display columns, ending in ".." when cut.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    let budget = width.saturating_sub(2);
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    if width >= 2 {
        out.push_str("..");
    }
    out
}

/// Pad (or truncate) to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let t = truncate_display(s, width);
    let w = display_width(&t);
    format!("{t}{}", " ".repeat(width.saturating_sub(w)))
}

fn row_label(issue: &Issue) -> String {
    match issue.row {
        Some(r) => format!("row {r}"),
        None => "sheet".to_string(),
    }
}

fn write_issue_lines(out: &mut String, issues: &[Issue], with_sheet: bool) {
    let sheet_width = issues
        .iter()
        .map(|i| display_width(&i.sheet))
        .max()
        .unwrap_or(0)
        .min(SHEET_COLUMN_MAX);

    for issue in issues {
        out.push_str("  ");
        if with_sheet {
            out.push_str(&pad_right(&issue.sheet, sheet_width));
            out.push_str("  ");
        }
        let _ = writeln!(
            out,
            "{}  {}  {}",
            pad_right(&row_label(issue), 8),
            pad_right(&issue.category.to_string(), 17),
            issue.message
        );
    }
}

fn write_section(out: &mut String, title: &str, issues: &[Issue], with_sheet: bool) {
    let _ = writeln!(out, "\n== {title} ({}) ==", issues.len());
    if issues.is_empty() {
        out.push_str("  no issues\n");
    } else {
        write_issue_lines(out, issues, with_sheet);
    }
}

/// Render the header, the "all" section, one section per cohort sheet and
/// the "other" section. With `only_sheet`, print that one bucket instead.
pub fn render(report: &AuditReport, grouped: &GroupedIssues, only_sheet: Option<&str>) -> String {
    let s = &report.summary;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} issue(s) in {} sheet(s); {} row(s) checked, {} excluded; {} sheet(s) skipped",
        report.meta.config_name,
        s.total_issues,
        s.sheets_with_issues,
        s.rows_checked,
        s.rows_excluded,
        s.sheets_skipped,
    );
    for warning in &report.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }

    match only_sheet {
        Some(name) => {
            if let Some(bucket) = grouped.bucket(name) {
                write_section(&mut out, &format!("{} [{}]", bucket.sheet, bucket.category), &bucket.issues, false);
            } else {
                let issues: Vec<Issue> = grouped.other.iter().filter(|i| i.sheet == name).cloned().collect();
                write_section(&mut out, name, &issues, false);
            }
        }
        None => {
            write_section(&mut out, "all", &grouped.all, true);
            for bucket in &grouped.sheets {
                write_section(&mut out, &format!("{} [{}]", bucket.sheet, bucket.category), &bucket.issues, false);
            }
            write_section(&mut out, "other", &grouped.other, true);
        }
    }

    if s.passed {
        out.push_str("\nPASS\n");
    } else {
        out.push_str("\nFAIL\n");
    }
    out
}
