use crate::model::{Issue, IssueCategory, Row, SubjectAttributes};
use crate::registry::RegistryIndex;

/// Compare a plain-named row against its registry entry, field by field.
/// An unknown name yields one `name_not_found`; each differing field yields
/// one `registry_mismatch`.
pub fn check_registry(sheet: &str, row: &Row, registry: &RegistryIndex, threshold: f64) -> Vec<Issue> {
    let name = row.subject_name.as_str();

    let Some(entry) = registry.exact(name) else {
        let near = registry.nearest(name, threshold);
        let mut message = format!("subject '{name}' not in registry");
        if let Some(m) = &near {
            message.push_str(&format!(" (did you mean '{}'?)", m.name));
        }
        return vec![Issue::at(sheet, row.row_number, IssueCategory::NameNotFound, message)
            .with_suggestion(near.map(|m| m.name))];
    };

    field_mismatches(&row.attributes, &entry.attributes)
        .into_iter()
        .map(|(field, expected, observed)| {
            Issue::at(
                sheet,
                row.row_number,
                IssueCategory::RegistryMismatch,
                format!("subject '{name}': {field} expected '{expected}', found '{observed}'"),
            )
        })
        .collect()
}

/// (field, expected, observed) for every attribute that differs.
fn field_mismatches<'a>(
    observed: &'a SubjectAttributes,
    expected: &'a SubjectAttributes,
) -> Vec<(&'static str, &'a str, &'a str)> {
    let fields = [
        ("subject type", &expected.subject_type, &observed.subject_type, false),
        ("base credit", &expected.base_credit, &observed.base_credit, true),
        ("grading method", &expected.grading_method, &observed.grading_method, false),
        ("scope", &expected.scope, &observed.scope, false),
    ];

    fields
        .into_iter()
        .filter(|(_, e, o, numeric)| !values_match(e, o, *numeric))
        .map(|(field, e, o, _)| (field, e.as_str(), o.as_str()))
        .collect()
}

fn values_match(expected: &str, observed: &str, numeric: bool) -> bool {
    if numeric {
        if let (Ok(e), Ok(o)) = (expected.parse::<f64>(), observed.parse::<f64>()) {
            return (e - o).abs() < 1e-9;
        }
    }
    expected.trim() == observed.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryEntry;

    fn attrs(kind: &str, credit: &str, grading: &str, scope: &str) -> SubjectAttributes {
        SubjectAttributes {
            subject_type: kind.into(),
            base_credit: credit.into(),
            grading_method: grading.into(),
            scope: scope.into(),
        }
    }

    fn registry() -> RegistryIndex {
        RegistryIndex::from_entries(vec![
            RegistryEntry {
                name: "물리학Ⅰ".into(),
                attributes: attrs("일반선택", "3", "5등급", "과학"),
            },
            RegistryEntry {
                name: "화학Ⅰ".into(),
                attributes: attrs("일반선택", "3", "5등급", "과학"),
            },
        ])
    }

    fn row(name: &str, attributes: SubjectAttributes) -> Row {
        Row {
            row_number: 12,
            subject_name: name.into(),
            name_fill: None,
            operating_credit: 3.0,
            detail_credits: vec![3.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            summary_values: vec![],
            attributes,
            unreadable: vec![],
        }
    }

    #[test]
    fn matching_row_passes() {
        let r = row("물리학Ⅰ", attrs("일반선택", "3", "5등급", "과학"));
        assert!(check_registry("2025", &r, &registry(), 0.6).is_empty());
    }

    #[test]
    fn base_credit_compares_numerically() {
        let r = row("물리학Ⅰ", attrs("일반선택", "3.0", "5등급", "과학"));
        assert!(check_registry("2025", &r, &registry(), 0.6).is_empty());
    }

    #[test]
    fn one_issue_per_mismatched_field() {
        let r = row("물리학Ⅰ", attrs("진로선택", "2", "5등급", "과학"));
        let issues = check_registry("2025", &r, &registry(), 0.6);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.category == IssueCategory::RegistryMismatch));
        assert_eq!(
            issues[0].message,
            "subject '물리학Ⅰ': subject type expected '일반선택', found '진로선택'"
        );
        assert!(issues[1].message.contains("base credit expected '3', found '2'"));
    }

    #[test]
    fn unknown_name_with_suggestion() {
        let r = row("물리학 Ⅰ", attrs("일반선택", "3", "5등급", "과학"));
        let issues = check_registry("2025", &r, &registry(), 0.6);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, IssueCategory::NameNotFound);
        assert_eq!(issues[0].suggestion.as_deref(), Some("물리학Ⅰ"));
        assert!(issues[0].message.contains("did you mean '물리학Ⅰ'"));
    }

    #[test]
    fn unknown_name_without_suggestion() {
        let r = row("정보", attrs("", "", "", ""));
        let issues = check_registry("2025", &r, &registry(), 0.6);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].suggestion, None);
        assert_eq!(issues[0].message, "subject '정보' not in registry");
    }
}
