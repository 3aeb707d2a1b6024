//! CLI Exit Code Registry
//!
//! Single source of truth for `curricheck` exit codes. Scripts and CI jobs
//! gate on these, so they are part of the shell contract.
//!
//! | Code | Meaning                                         |
//! |------|-------------------------------------------------|
//! | 0    | Audit passed (no issues) / command succeeded    |
//! | 1    | General error (output could not be written)     |
//! | 2    | Usage error (bad arguments, unknown sheet)      |
//! | 3    | Audit completed and found issues                |
//! | 4    | Rule set could not be read, parsed or validated |
//! | 5    | Workbook document could not be read or parsed   |

use curricheck_rules::AuditError;

/// Success - audit passed or command completed.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - output could not be written.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments. clap uses this code for its own errors.
pub const EXIT_USAGE: u8 = 2;

/// The audit ran and reported at least one issue.
/// Like `diff(1)`, a non-zero code means "the workbook has problems".
pub const EXIT_AUDIT_ISSUES: u8 = 3;

/// Rule set unreadable, malformed, or invalid.
pub const EXIT_AUDIT_RULES: u8 = 4;

/// Workbook document unreadable or malformed.
pub const EXIT_AUDIT_INPUT: u8 = 5;

/// Map an engine error to its exit code.
pub fn audit_exit_code(err: &AuditError) -> u8 {
    match err {
        AuditError::ConfigParse(_)
        | AuditError::ConfigValidation(_)
        | AuditError::InvalidColumn { .. }
        | AuditError::InvalidPattern { .. } => EXIT_AUDIT_RULES,
        AuditError::MissingColumns { .. } | AuditError::MissingRegistry(_) | AuditError::Input(_) => {
            EXIT_AUDIT_INPUT
        }
    }
}
