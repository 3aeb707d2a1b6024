//! `curricheck-rules`: curriculum workbook rule engine.
//!
//! Pure engine crate: receives an already-parsed workbook (cell values,
//! fills, merge ranges), returns a sheet-grouped issue report.
//! No CLI or IO dependencies.

pub mod aggregate;
pub mod arithmetic;
pub mod cellref;
pub mod classify;
pub mod compound;
pub mod config;
pub mod consistency;
pub mod engine;
pub mod error;
pub mod exclusion;
pub mod model;
pub mod registry;
pub mod summary;
pub mod workbook;

pub use aggregate::{group_issues, GroupedIssues, SheetBucket};
pub use config::AuditConfig;
pub use engine::{run, validate};
pub use error::AuditError;
pub use model::{AuditReport, Issue, IssueCategory, RawSheet, RawWorkbook, RowMode, SheetCategory};
pub use registry::RegistryIndex;
