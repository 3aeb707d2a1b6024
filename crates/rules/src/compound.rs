//! "A↔B" rows: two alternative subjects sharing one line.
//!
//! The registry holds single-subject attribute tuples, which do not describe
//! a two-subject line, so only the existence of each half is checked.

use crate::model::{Issue, IssueCategory, Row};
use crate::registry::RegistryIndex;

pub const SEPARATOR: char = '↔';

pub fn is_compound(name: &str) -> bool {
    name.contains(SEPARATOR)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Split on the first separator, trimming both halves.
pub fn split(name: &str) -> Option<(&str, &str)> {
    name.split_once(SEPARATOR).map(|(l, r)| (l.trim(), r.trim()))
}

/// One `name_not_found` issue per half missing from the registry.
pub fn check_compound(
    sheet: &str,
    row: &Row,
    registry: &RegistryIndex,
    threshold: f64,
) -> Vec<Issue> {
    let Some((left, right)) = split(&row.subject_name) else {
        return Vec::new();
    };

    let mut issues = Vec::new();
    for (side, name) in [(Side::Left, left), (Side::Right, right)] {
        if name.is_empty() {
            issues.push(Issue::at(
                sheet,
                row.row_number,
                IssueCategory::NameNotFound,
                format!("compound name '{}': {side} side is empty", row.subject_name),
            ));
            continue;
        }
        if registry.exact(name).is_some() {
            continue;
        }

        let near = registry.nearest(name, threshold);
        let mut message = format!(
            "compound name '{}': {side} side '{name}' not in registry",
            row.subject_name
        );
        if let Some(m) = &near {
            message.push_str(&format!(" (did you mean '{}'?)", m.name));
        }
        issues.push(
            Issue::at(sheet, row.row_number, IssueCategory::NameNotFound, message)
                .with_suggestion(near.map(|m| m.name)),
        );
    }
    issues
}
