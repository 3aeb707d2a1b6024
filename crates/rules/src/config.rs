use serde::{Deserialize, Serialize};

use crate::cellref::letter_to_col;
use crate::error::AuditError;
use crate::model::SheetCategory;

// ---------------------------------------------------------------------------
// Top-level rule set
// ---------------------------------------------------------------------------

/// Rule set for one validation run. Every field has a default, so an empty
/// TOML document yields the stock layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Minimum similarity a registry name needs to be offered as a suggestion.
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f64,
    /// First spreadsheet row (1-based) holding subject data on cohort sheets.
    #[serde(default = "default_first_data_row")]
    pub first_data_row: usize,
    #[serde(default)]
    pub columns: ColumnLayout,
    #[serde(default)]
    pub registry: RegistryLayout,
    /// Ordered; first matching pattern wins.
    #[serde(default = "default_cohorts")]
    pub cohorts: Vec<CohortPattern>,
}

fn default_name() -> String {
    "curriculum audit".into()
}

fn default_threshold() -> f64 {
    0.6
}

fn default_first_data_row() -> usize {
    2
}

fn default_cohorts() -> Vec<CohortPattern> {
    vec![
        CohortPattern {
            category: SheetCategory::Cohort2024,
            pattern: "2024".into(),
        },
        CohortPattern {
            category: SheetCategory::Cohort2025_2026,
            pattern: "2025|2026".into(),
        },
    ]
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            similarity_threshold: default_threshold(),
            first_data_row: default_first_data_row(),
            columns: ColumnLayout::default(),
            registry: RegistryLayout::default(),
            cohorts: default_cohorts(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cohort sheet layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub subject_name: String,
    pub operating_credit: String,
    pub detail: Vec<String>,
    pub subject_type: String,
    pub base_credit: String,
    pub grading_method: String,
    pub scope: String,
    pub summary: Vec<SummaryRule>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            subject_name: "D".into(),
            operating_credit: "F".into(),
            detail: ["G", "H", "I", "J", "K", "L"].map(String::from).to_vec(),
            subject_type: "C".into(),
            base_credit: "E".into(),
            grading_method: "O".into(),
            scope: "P".into(),
            summary: vec![
                SummaryRule {
                    column: "M".into(),
                    sources: ["G", "H", "I", "J", "K", "L"].map(String::from).to_vec(),
                },
                SummaryRule {
                    column: "N".into(),
                    sources: vec!["F".into()],
                },
            ],
        }
    }
}

/// A summary column must equal the sum of its source columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRule {
    pub column: String,
    pub sources: Vec<String>,
}

// ---------------------------------------------------------------------------
// Hidden registry layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryLayout {
    /// Registry sheet name. `None` = first hidden sheet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    pub first_data_row: usize,
    pub name: String,
    pub subject_type: String,
    pub base_credit: String,
    pub grading_method: String,
    pub scope: String,
}

impl Default for RegistryLayout {
    fn default() -> Self {
        Self {
            sheet: None,
            first_data_row: 2,
            name: "A".into(),
            subject_type: "B".into(),
            base_credit: "C".into(),
            grading_method: "D".into(),
            scope: "E".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sheet-name classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortPattern {
    pub category: SheetCategory,
    /// Regular expression matched anywhere in the sheet name.
    pub pattern: String,
}

// ---------------------------------------------------------------------------
// Resolved (0-based) column indices
// ---------------------------------------------------------------------------

/// Indices of the four registry attributes, in field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeColumns {
    pub subject_type: usize,
    pub base_credit: usize,
    pub grading_method: usize,
    pub scope: usize,
}

impl AttributeColumns {
    pub fn all(&self) -> [usize; 4] {
        [self.subject_type, self.base_credit, self.grading_method, self.scope]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSummary {
    pub column: usize,
    pub sources: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub subject_name: usize,
    pub operating_credit: usize,
    pub detail: Vec<usize>,
    pub attributes: AttributeColumns,
    pub summary: Vec<ResolvedSummary>,
}

impl ResolvedColumns {
    /// Columns whose absence makes a sheet of `category` unreadable. Sheets
    /// compared against the registry also need the attribute columns.
    pub fn required(&self, category: SheetCategory) -> Vec<usize> {
        let mut cols = vec![self.subject_name, self.operating_credit];
        cols.extend(&self.detail);
        for rule in &self.summary {
            cols.push(rule.column);
            cols.extend(&rule.sources);
        }
        if category.checks_registry() {
            cols.extend(self.attributes.all());
        }
        cols.sort_unstable();
        cols.dedup();
        cols
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRegistryColumns {
    pub name: usize,
    pub attributes: AttributeColumns,
}

fn column(field: &str, value: &str) -> Result<usize, AuditError> {
    letter_to_col(value).ok_or_else(|| AuditError::InvalidColumn {
        field: field.into(),
        value: value.into(),
    })
}

impl ColumnLayout {
    pub fn resolve(&self) -> Result<ResolvedColumns, AuditError> {
        let detail = self
            .detail
            .iter()
            .map(|c| column("columns.detail", c))
            .collect::<Result<Vec<_>, _>>()?;

        let mut summary = Vec::with_capacity(self.summary.len());
        for rule in &self.summary {
            summary.push(ResolvedSummary {
                column: column("columns.summary.column", &rule.column)?,
                sources: rule
                    .sources
                    .iter()
                    .map(|c| column("columns.summary.sources", c))
                    .collect::<Result<Vec<_>, _>>()?,
            });
        }

        Ok(ResolvedColumns {
            subject_name: column("columns.subject_name", &self.subject_name)?,
            operating_credit: column("columns.operating_credit", &self.operating_credit)?,
            detail,
            attributes: AttributeColumns {
                subject_type: column("columns.subject_type", &self.subject_type)?,
                base_credit: column("columns.base_credit", &self.base_credit)?,
                grading_method: column("columns.grading_method", &self.grading_method)?,
                scope: column("columns.scope", &self.scope)?,
            },
            summary,
        })
    }
}

impl RegistryLayout {
    pub fn resolve(&self) -> Result<ResolvedRegistryColumns, AuditError> {
        Ok(ResolvedRegistryColumns {
            name: column("registry.name", &self.name)?,
            attributes: AttributeColumns {
                subject_type: column("registry.subject_type", &self.subject_type)?,
                base_credit: column("registry.base_credit", &self.base_credit)?,
                grading_method: column("registry.grading_method", &self.grading_method)?,
                scope: column("registry.scope", &self.scope)?,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl AuditConfig {
    pub fn from_toml(input: &str) -> Result<Self, AuditError> {
        let config: AuditConfig =
            toml::from_str(input).map_err(|e| AuditError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, AuditError> {
        toml::to_string_pretty(self).map_err(|e| AuditError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), AuditError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(AuditError::ConfigValidation(format!(
                "similarity_threshold must be within 0..=1, got {}",
                self.similarity_threshold
            )));
        }

        if self.first_data_row == 0 || self.registry.first_data_row == 0 {
            return Err(AuditError::ConfigValidation(
                "first_data_row is 1-based and must be at least 1".into(),
            ));
        }

        if self.columns.detail.is_empty() {
            return Err(AuditError::ConfigValidation(
                "columns.detail must list at least one column".into(),
            ));
        }

        for rule in &self.columns.summary {
            if rule.sources.is_empty() {
                return Err(AuditError::ConfigValidation(format!(
                    "summary column '{}' has no source columns",
                    rule.column
                )));
            }
        }

        self.columns.resolve()?;
        self.registry.resolve()?;

        for cohort in &self.cohorts {
            regex::Regex::new(&cohort.pattern).map_err(|e| AuditError::InvalidPattern {
                pattern: cohort.pattern.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AuditConfig::from_toml("").unwrap();
        assert_eq!(config.name, "curriculum audit");
        assert_eq!(config.similarity_threshold, 0.6);
        assert_eq!(config.first_data_row, 2);
        assert_eq!(config.columns.subject_name, "D");
        assert_eq!(config.columns.detail.len(), 6);
        assert_eq!(config.columns.summary.len(), 2);
        assert_eq!(config.cohorts.len(), 2);
        assert!(config.registry.sheet.is_none());
    }

    #[test]
    fn resolve_default_columns() {
        let cols = AuditConfig::default().columns.resolve().unwrap();
        assert_eq!(cols.subject_name, 3);
        assert_eq!(cols.operating_credit, 5);
        assert_eq!(cols.detail, vec![6, 7, 8, 9, 10, 11]);
        assert_eq!(cols.summary[0].column, 12);
        assert_eq!(cols.summary[1].column, 13);
        assert_eq!(cols.summary[1].sources, vec![5]);
        // D, F, G..L, M, N
        assert_eq!(cols.required(SheetCategory::Cohort2024), vec![3, 5, 6, 7, 8, 9, 10, 11, 12, 13]);
        // plus C, E, O, P where the registry is consulted
        assert_eq!(
            cols.required(SheetCategory::Cohort2025_2026),
            vec![2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]
        );
    }

    #[test]
    fn parse_custom_layout() {
        let input = r#"
name = "2026 plan"
similarity_threshold = 0.75
first_data_row = 5

[columns]
detail = ["G", "H", "I", "J"]

[[columns.summary]]
column = "K"
sources = ["G", "H", "I", "J"]

[registry]
sheet = "과목목록"
name = "B"

[[cohorts]]
category = "cohort_2025_2026"
pattern = "^2026"
"#;
        let config = AuditConfig::from_toml(input).unwrap();
        assert_eq!(config.name, "2026 plan");
        assert_eq!(config.first_data_row, 5);
        assert_eq!(config.columns.detail.len(), 4);
        assert_eq!(config.columns.subject_name, "D");
        assert_eq!(config.columns.summary.len(), 1);
        assert_eq!(config.registry.sheet.as_deref(), Some("과목목록"));
        assert_eq!(config.registry.resolve().unwrap().name, 1);
        assert_eq!(config.cohorts.len(), 1);
        assert_eq!(config.cohorts[0].category, SheetCategory::Cohort2025_2026);
    }

    #[test]
    fn reject_threshold_out_of_range() {
        let err = AuditConfig::from_toml("similarity_threshold = 1.5").unwrap_err();
        assert!(err.to_string().contains("similarity_threshold"));
    }

    #[test]
    fn reject_bad_column_letter() {
        let err = AuditConfig::from_toml("[columns]\nsubject_name = \"D1\"").unwrap_err();
        assert_eq!(
            err,
            AuditError::InvalidColumn {
                field: "columns.subject_name".into(),
                value: "D1".into(),
            }
        );
    }

    #[test]
    fn reject_empty_detail() {
        let err = AuditConfig::from_toml("[columns]\ndetail = []").unwrap_err();
        assert!(err.to_string().contains("columns.detail"));
    }

    #[test]
    fn reject_bad_pattern() {
        let input = r#"
[[cohorts]]
category = "cohort_2024"
pattern = "(2024"
"#;
        let err = AuditConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, AuditError::InvalidPattern { .. }));
    }

    #[test]
    fn reject_unknown_category() {
        let input = r#"
[[cohorts]]
category = "cohort_2030"
pattern = "2030"
"#;
        assert!(matches!(
            AuditConfig::from_toml(input),
            Err(AuditError::ConfigParse(_))
        ));
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let text = AuditConfig::default().to_toml().unwrap();
        let parsed = AuditConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.columns.detail, AuditConfig::default().columns.detail);
        assert_eq!(parsed.cohorts.len(), 2);
    }
}
