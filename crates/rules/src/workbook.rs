//! Workbook model: merge resolution and cohort-sheet row extraction.
//!
//! Authors mark a merged block by filling only its anchor cell, so every cell
//! inside a merged range reads the anchor's value and fill. A per-cell read
//! would miss those fills and under-report excluded rows.

use std::collections::HashMap;

use crate::cellref::{col_to_letter, parse_a1, MergeRange};
use crate::classify::SheetClassifier;
use crate::config::{AuditConfig, RegistryLayout, ResolvedColumns};
use crate::error::AuditError;
use crate::model::{
    CellValue, RawSheet, RawWorkbook, Row, SheetCategory, SheetContent, SheetEntry,
    SubjectAttributes, SummaryCell, UnreadableCell, Workbook,
};

static EMPTY: CellValue = CellValue::Empty;

/// Parse AARRGGBB or RRGGBB hex to RGBA [u8; 4].
pub fn parse_argb_hex(hex: &str) -> Option<[u8; 4]> {
    let s = hex.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }

    if s.len() == 8 {
        // AARRGGBB → RGBA
        let a = u8::from_str_radix(&s[0..2], 16).ok()?;
        let r = u8::from_str_radix(&s[2..4], 16).ok()?;
        let g = u8::from_str_radix(&s[4..6], 16).ok()?;
        let b = u8::from_str_radix(&s[6..8], 16).ok()?;
        Some([r, g, b, a])
    } else if s.len() == 6 {
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        Some([r, g, b, 255])
    } else {
        None
    }
}

/// White and fully transparent fills read the same as no fill.
pub fn is_no_fill(fill: Option<[u8; 4]>) -> bool {
    match fill {
        None => true,
        Some([_, _, _, 0]) => true,
        Some([255, 255, 255, _]) => true,
        Some(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Merge-resolved grid
// ---------------------------------------------------------------------------

/// Read-only view over a raw sheet with merged ranges resolved to anchors.
pub struct ResolvedGrid<'a> {
    sheet: &'a RawSheet,
    merges: Vec<MergeRange>,
    fills: HashMap<(usize, usize), [u8; 4]>,
}

impl<'a> ResolvedGrid<'a> {
    pub fn new(sheet: &'a RawSheet) -> Result<Self, AuditError> {
        let merges = sheet
            .merged
            .iter()
            .map(|r| {
                MergeRange::parse(r).ok_or_else(|| {
                    AuditError::Input(format!("sheet '{}': bad merge range '{r}'", sheet.name))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut fills = HashMap::with_capacity(sheet.fills.len());
        for (addr, hex) in &sheet.fills {
            let pos = parse_a1(addr).ok_or_else(|| {
                AuditError::Input(format!("sheet '{}': bad fill reference '{addr}'", sheet.name))
            })?;
            let color = parse_argb_hex(hex).ok_or_else(|| {
                AuditError::Input(format!(
                    "sheet '{}': bad fill color '{hex}' at {addr}",
                    sheet.name
                ))
            })?;
            fills.insert(pos, color);
        }

        Ok(Self {
            sheet,
            merges,
            fills,
        })
    }

    pub fn height(&self) -> usize {
        self.sheet.cells.len()
    }

    /// Longest row in the grid.
    pub fn width(&self) -> usize {
        self.sheet.cells.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn anchor_of(&self, row: usize, col: usize) -> (usize, usize) {
        self.merges
            .iter()
            .find(|m| m.contains(row, col))
            .map(MergeRange::anchor)
            .unwrap_or((row, col))
    }

    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        let (r, c) = self.anchor_of(row, col);
        self.sheet
            .cells
            .get(r)
            .and_then(|cells| cells.get(c))
            .unwrap_or(&EMPTY)
    }

    pub fn fill(&self, row: usize, col: usize) -> Option<[u8; 4]> {
        self.fills.get(&self.anchor_of(row, col)).copied()
    }
}

// ---------------------------------------------------------------------------
// Workbook construction
// ---------------------------------------------------------------------------

/// Registry sheet: the configured name if set, else the first hidden sheet.
pub fn find_registry_sheet<'a>(raw: &'a RawWorkbook, layout: &RegistryLayout) -> Option<&'a RawSheet> {
    match &layout.sheet {
        Some(name) => raw.sheets.iter().find(|s| &s.name == name),
        None => raw.sheets.iter().find(|s| s.hidden),
    }
}

impl Workbook {
    /// Classify every visible sheet and extract its rows. Unreadable sheets
    /// are kept as entries so the run can report them.
    pub fn build(raw: &RawWorkbook, config: &AuditConfig) -> Result<Self, AuditError> {
        let classifier = SheetClassifier::new(&config.cohorts)?;
        let columns = config.columns.resolve()?;
        let registry_name = find_registry_sheet(raw, &config.registry).map(|s| s.name.as_str());

        let mut entries = Vec::new();
        for sheet in &raw.sheets {
            if Some(sheet.name.as_str()) == registry_name {
                continue;
            }
            if sheet.hidden {
                log::debug!("skipping hidden sheet '{}'", sheet.name);
                continue;
            }

            let category = classifier.classify(&sheet.name);
            log::debug!("sheet '{}' classified as {category}", sheet.name);

            let content = match ResolvedGrid::new(sheet) {
                Err(e) => SheetContent::Unreadable(e),
                Ok(grid) if !category.is_cohort() && columns.subject_name >= grid.width() => {
                    log::debug!("sheet '{}' has no subject name column, not a subject table", sheet.name);
                    SheetContent::Notes
                }
                Ok(grid) => {
                    match extract_rows(&sheet.name, &grid, &columns, category, config.first_data_row) {
                        Ok(rows) => SheetContent::Rows(rows),
                        Err(e) => SheetContent::Unreadable(e),
                    }
                }
            };

            entries.push(SheetEntry {
                name: sheet.name.clone(),
                category,
                content,
            });
        }

        Ok(Workbook { entries })
    }
}

fn read_number(
    grid: &ResolvedGrid<'_>,
    row: usize,
    col: usize,
    unreadable: &mut Vec<UnreadableCell>,
) -> f64 {
    let cell = grid.value(row, col);
    match cell.as_number() {
        Some(n) => n,
        None => {
            unreadable.push(UnreadableCell {
                column: col_to_letter(col),
                raw: cell.as_text(),
            });
            0.0
        }
    }
}

/// Rows from `first_data_row` down whose subject name is non-blank.
pub fn extract_rows(
    sheet_name: &str,
    grid: &ResolvedGrid<'_>,
    columns: &ResolvedColumns,
    category: SheetCategory,
    first_data_row: usize,
) -> Result<Vec<Row>, AuditError> {
    let width = grid.width();
    let missing: Vec<String> = columns
        .required(category)
        .into_iter()
        .filter(|&c| c >= width)
        .map(col_to_letter)
        .collect();
    if !missing.is_empty() {
        return Err(AuditError::MissingColumns {
            sheet: sheet_name.to_string(),
            columns: missing,
        });
    }

    let mut rows = Vec::new();
    for r in first_data_row.saturating_sub(1)..grid.height() {
        let name_cell = grid.value(r, columns.subject_name);
        if name_cell.is_blank() {
            continue;
        }

        let mut unreadable = Vec::new();
        let operating_credit = read_number(grid, r, columns.operating_credit, &mut unreadable);
        let detail_credits = columns
            .detail
            .iter()
            .map(|&c| read_number(grid, r, c, &mut unreadable))
            .collect();

        let mut summary_values = Vec::with_capacity(columns.summary.len());
        for rule in &columns.summary {
            let observed = read_number(grid, r, rule.column, &mut unreadable);
            // Source cells already reported above are not reported twice.
            let mut scratch = Vec::new();
            let expected = rule
                .sources
                .iter()
                .map(|&c| read_number(grid, r, c, &mut scratch))
                .sum();
            for cell in scratch {
                if !unreadable.contains(&cell) {
                    unreadable.push(cell);
                }
            }
            summary_values.push(SummaryCell {
                column: col_to_letter(rule.column),
                observed,
                expected,
            });
        }

        let attrs = &columns.attributes;
        rows.push(Row {
            row_number: r + 1,
            subject_name: name_cell.as_text(),
            name_fill: grid.fill(r, columns.subject_name),
            operating_credit,
            detail_credits,
            summary_values,
            attributes: SubjectAttributes {
                subject_type: grid.value(r, attrs.subject_type).as_text(),
                base_credit: grid.value(r, attrs.base_credit).as_text(),
                grading_method: grid.value(r, attrs.grading_method).as_text(),
                scope: grid.value(r, attrs.scope).as_text(),
            },
            unreadable,
        });
    }

    Ok(rows)
}
