use crate::compound::is_compound;
use crate::model::{Row, RowMode, SheetCategory};
use crate::workbook::is_no_fill;

/// Decide which checks a row receives. Evaluated once per row, in order:
///
/// 1. filled subject-name cell on a sheet whose rule set excludes on color → `Excluded`
/// 2. sheet rule set without registry comparison (2024 cohort, unclassified) → `RegistryExempt`
/// 3. name containing `↔` → `Compound`
/// 4. otherwise → `Normal`
pub fn resolve_mode(row: &Row, category: SheetCategory) -> RowMode {
    if category.excludes_on_color() && !is_no_fill(row.name_fill) {
        RowMode::Excluded
    } else if !category.checks_registry() {
        RowMode::RegistryExempt
    } else if is_compound(&row.subject_name) {
        RowMode::Compound
    } else {
        RowMode::Normal
    }
}
