use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AuditError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Rule set validation error (threshold out of range, empty detail list, etc.).
    ConfigValidation(String),
    /// A column letter in the rule set is not a valid A1 column.
    InvalidColumn { field: String, value: String },
    /// A cohort sheet-name pattern does not compile.
    InvalidPattern { pattern: String, reason: String },
    /// A cohort sheet lacks columns the checks read. Fatal to that sheet only.
    MissingColumns { sheet: String, columns: Vec<String> },
    /// Hidden registry sheet absent or unreadable. Fatal to registry checks only.
    MissingRegistry(String),
    /// Malformed workbook document (bad merge range, bad fill color, bad JSON).
    Input(String),
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "rule set parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "rule set validation error: {msg}"),
            Self::InvalidColumn { field, value } => {
                write!(f, "{field}: '{value}' is not a column letter")
            }
            Self::InvalidPattern { pattern, reason } => {
                write!(f, "invalid sheet pattern '{pattern}': {reason}")
            }
            Self::MissingColumns { sheet, columns } => {
                write!(f, "sheet '{sheet}': missing column(s) {}", columns.join(", "))
            }
            Self::MissingRegistry(reason) => {
                write!(f, "subject registry unavailable, registry checks skipped: {reason}")
            }
            Self::Input(msg) => write!(f, "workbook input error: {msg}"),
        }
    }
}

impl std::error::Error for AuditError {}
