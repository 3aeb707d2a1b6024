use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

// ---------------------------------------------------------------------------
// Input document
// ---------------------------------------------------------------------------

/// A single cell as handed over by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Display text with integral numbers printed without a fraction
    /// (3.0 → "3"), so text and numeric cells compare alike.
    pub fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => format_number(*n),
        }
    }

    /// Numeric reading: blank → Some(0), numeric text → parsed value,
    /// anything else → None.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Empty => Some(0.0),
            Self::Number(n) => Some(*n),
            Self::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    Some(0.0)
                } else {
                    t.replace(',', "").parse::<f64>().ok()
                }
            }
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// One sheet of the parsed workbook, before merge resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSheet {
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    /// Row-major; `cells[0][0]` is A1.
    #[serde(default)]
    pub cells: Vec<Vec<CellValue>>,
    /// A1 reference → ARGB / RGB hex fill.
    #[serde(default)]
    pub fills: BTreeMap<String, String>,
    /// A1 ranges such as "D7:D8".
    #[serde(default)]
    pub merged: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWorkbook {
    pub sheets: Vec<RawSheet>,
}

impl RawWorkbook {
    pub fn from_json(input: &str) -> Result<Self, AuditError> {
        serde_json::from_str(input).map_err(|e| AuditError::Input(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Classified workbook
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetCategory {
    #[serde(rename = "cohort_2024")]
    Cohort2024,
    #[serde(rename = "cohort_2025_2026")]
    Cohort2025_2026,
    Other,
}

impl SheetCategory {
    /// A filled subject-name cell removes the row from every check.
    pub fn excludes_on_color(&self) -> bool {
        matches!(self, Self::Cohort2025_2026)
    }

    /// Rows are compared against the hidden registry.
    pub fn checks_registry(&self) -> bool {
        matches!(self, Self::Cohort2025_2026)
    }

    pub fn is_cohort(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl std::fmt::Display for SheetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cohort2024 => write!(f, "cohort_2024"),
            Self::Cohort2025_2026 => write!(f, "cohort_2025_2026"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// The four attributes the registry holds per subject. Values are kept as
/// display text; see [`CellValue::as_text`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubjectAttributes {
    pub subject_type: String,
    pub base_credit: String,
    pub grading_method: String,
    pub scope: String,
}

/// A numeric cell that held non-numeric text.
#[derive(Debug, Clone, PartialEq)]
pub struct UnreadableCell {
    pub column: String,
    pub raw: String,
}

/// One subject entry on a cohort sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Spreadsheet row number (1-based).
    pub row_number: usize,
    pub subject_name: String,
    /// Merge-resolved fill of the subject-name cell, RGBA.
    pub name_fill: Option<[u8; 4]>,
    pub operating_credit: f64,
    pub detail_credits: Vec<f64>,
    /// One entry per summary rule, in rule order.
    pub summary_values: Vec<SummaryCell>,
    pub attributes: SubjectAttributes,
    pub unreadable: Vec<UnreadableCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryCell {
    pub column: String,
    pub observed: f64,
    /// Sum of the rule's source columns on the same row.
    pub expected: f64,
}

impl Row {
    pub fn detail_sum(&self) -> f64 {
        self.detail_credits.iter().sum()
    }
}

/// What a visible sheet turned out to hold.
#[derive(Debug, Clone)]
pub enum SheetContent {
    /// Subject rows, ready for checking.
    Rows(Vec<Row>),
    /// Unclassified sheet without a subject-name column: free text, not a table.
    Notes,
    /// Missing required columns or malformed merges/fills. Reported, not checked.
    Unreadable(AuditError),
}

/// A visible sheet after classification.
#[derive(Debug, Clone)]
pub struct SheetEntry {
    pub name: String,
    pub category: SheetCategory,
    pub content: SheetContent,
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub entries: Vec<SheetEntry>,
}

// ---------------------------------------------------------------------------
// Row mode
// ---------------------------------------------------------------------------

/// Outcome of the exclusion precedence chain for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowMode {
    /// Filled subject-name cell: no checks at all.
    Excluded,
    /// Arithmetic only; no name lookup.
    RegistryExempt,
    /// "A↔B": arithmetic plus existence of each half.
    Compound,
    /// Arithmetic plus full registry comparison.
    Normal,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Structural,
    Arithmetic,
    RegistryMismatch,
    NameNotFound,
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structural => write!(f, "structural"),
            Self::Arithmetic => write!(f, "arithmetic"),
            Self::RegistryMismatch => write!(f, "registry_mismatch"),
            Self::NameNotFound => write!(f, "name_not_found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub sheet: String,
    /// Spreadsheet row number; `None` for sheet-level issues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub category: IssueCategory,
    pub message: String,
    /// Closest registry name, when one clears the similarity threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Issue {
    pub fn at(sheet: &str, row: usize, category: IssueCategory, message: String) -> Self {
        Self {
            sheet: sheet.to_string(),
            row: Some(row),
            category,
            message,
            suggestion: None,
        }
    }

    pub fn sheet_level(sheet: &str, category: IssueCategory, message: String) -> Self {
        Self {
            sheet: sheet.to_string(),
            row: None,
            category,
            message,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditSummary {
    pub total_issues: usize,
    pub sheets_checked: usize,
    pub sheets_skipped: usize,
    pub sheets_with_issues: usize,
    pub rows_checked: usize,
    pub rows_excluded: usize,
    pub category_counts: BTreeMap<String, usize>,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub registry_entries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub meta: AuditMeta,
    pub summary: AuditSummary,
    /// Run-level problems that did not stop the run (missing registry).
    pub warnings: Vec<String>,
    /// Every issue, in sheet order then row order.
    pub issues: Vec<Issue>,
    /// (sheet name, category) for every visible sheet, in workbook order.
    pub sheets: Vec<SheetRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetRef {
    pub name: String,
    pub category: SheetCategory,
}
