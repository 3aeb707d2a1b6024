//! Hidden subject registry: name → canonical attributes, with exact lookup
//! and nearest-name suggestions.
//!
//! `nearest` only feeds "did you mean" text on an issue. A near miss is
//! never accepted as a pass.

use std::collections::HashMap;

use crate::cellref::col_to_letter;
use crate::config::RegistryLayout;
use crate::error::AuditError;
use crate::model::{RawSheet, RawWorkbook, SubjectAttributes};
use crate::workbook::{find_registry_sheet, ResolvedGrid};

// ---------------------------------------------------------------------------
// Similarity
// ---------------------------------------------------------------------------

/// String similarity in [0, 1]; 1 means identical.
pub trait Similarity {
    fn ratio(&self, a: &str, b: &str) -> f64;
}

/// Ratcliff/Obershelp ratio: 2·M / (|a| + |b|), where M is the total size of
/// the recursively found longest common blocks. Operates on chars so Hangul
/// syllables count as one unit each.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceRatio;

impl Similarity for SequenceRatio {
    fn ratio(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let total = a.len() + b.len();
        if total == 0 {
            return 1.0;
        }
        2.0 * matching_chars(&a, &b) as f64 / total as f64
    }
}

/// Longest common block in a[alo..ahi] × b[blo..bhi] as (i, j, len).
/// Ties go to the block starting earliest in `a`, then in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    let mut prev = vec![0usize; bhi - blo + 1];
    for i in alo..ahi {
        let mut cur = vec![0usize; bhi - blo + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = prev[j - blo] + 1;
                cur[j - blo + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        prev = cur;
    }
    best
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut stack = vec![((0, a.len()), (0, b.len()))];
    while let Some(((alo, ahi), (blo, bhi))) = stack.pop() {
        let (i, j, k) = longest_match(a, b, (alo, ahi), (blo, bhi));
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            stack.push(((alo, i), (blo, j)));
        }
        if i + k < ahi && j + k < bhi {
            stack.push(((i + k, ahi), (j + k, bhi)));
        }
    }
    total
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub name: String,
    pub attributes: SubjectAttributes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearMatch {
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RegistryIndex {
    entries: Vec<RegistryEntry>,
    by_name: HashMap<String, usize>,
}

impl RegistryIndex {
    /// Build from entries in sheet order. The first entry wins on duplicate names.
    pub fn from_entries(entries: impl IntoIterator<Item = RegistryEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            if index.by_name.contains_key(&entry.name) {
                log::warn!("duplicate registry subject '{}', keeping first", entry.name);
                continue;
            }
            index.by_name.insert(entry.name.clone(), index.entries.len());
            index.entries.push(entry);
        }
        index
    }

    /// Locate the registry sheet in the workbook and index it.
    pub fn from_workbook(raw: &RawWorkbook, layout: &RegistryLayout) -> Result<Self, AuditError> {
        let sheet = find_registry_sheet(raw, layout).ok_or_else(|| match &layout.sheet {
            Some(name) => AuditError::MissingRegistry(format!("sheet '{name}' not found")),
            None => AuditError::MissingRegistry("workbook has no hidden sheet".into()),
        })?;
        Self::from_sheet(sheet, layout)
    }

    pub fn from_sheet(sheet: &RawSheet, layout: &RegistryLayout) -> Result<Self, AuditError> {
        let cols = layout.resolve()?;
        let grid = ResolvedGrid::new(sheet).map_err(|e| AuditError::MissingRegistry(e.to_string()))?;

        let width = grid.width();
        let mut needed = vec![cols.name];
        needed.extend(cols.attributes.all());
        needed.sort_unstable();
        needed.dedup();
        let missing: Vec<String> = needed.into_iter().filter(|&c| c >= width).map(col_to_letter).collect();
        if !missing.is_empty() {
            return Err(AuditError::MissingRegistry(format!(
                "sheet '{}': missing column(s) {}",
                sheet.name,
                missing.join(", ")
            )));
        }

        let attrs = cols.attributes;
        let entries = (layout.first_data_row.saturating_sub(1)..grid.height())
            .filter(|&r| !grid.value(r, cols.name).is_blank())
            .map(|r| RegistryEntry {
                name: grid.value(r, cols.name).as_text(),
                attributes: SubjectAttributes {
                    subject_type: grid.value(r, attrs.subject_type).as_text(),
                    base_credit: grid.value(r, attrs.base_credit).as_text(),
                    grading_method: grid.value(r, attrs.grading_method).as_text(),
                    scope: grid.value(r, attrs.scope).as_text(),
                },
            });

        let index = Self::from_entries(entries);
        if index.is_empty() {
            return Err(AuditError::MissingRegistry(format!(
                "sheet '{}' lists no subjects",
                sheet.name
            )));
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn exact(&self, name: &str) -> Option<&RegistryEntry> {
        self.by_name.get(name.trim()).map(|&i| &self.entries[i])
    }

    /// Best-scoring registry name above `threshold`, by [`SequenceRatio`].
    pub fn nearest(&self, name: &str, threshold: f64) -> Option<NearMatch> {
        self.nearest_by(name, threshold, &SequenceRatio)
    }

    /// Ties keep the earlier registry entry.
    pub fn nearest_by(&self, name: &str, threshold: f64, similarity: &dyn Similarity) -> Option<NearMatch> {
        let name = name.trim();
        let mut best: Option<NearMatch> = None;
        for entry in &self.entries {
            let score = similarity.ratio(name, &entry.name);
            if score > threshold && best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(NearMatch {
                    name: entry.name.clone(),
                    score,
                });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;
    use std::collections::BTreeMap;

    fn entry(name: &str, credit: &str) -> RegistryEntry {
        RegistryEntry {
            name: name.into(),
            attributes: SubjectAttributes {
                subject_type: "일반".into(),
                base_credit: credit.into(),
                grading_method: "5등급".into(),
                scope: "공통".into(),
            },
        }
    }

    fn t(s: &str) -> CellValue {
        CellValue::Text(s.into())
    }

    #[test]
    fn ratio_matches_reference_values() {
        let r = SequenceRatio;
        assert_eq!(r.ratio("", ""), 1.0);
        assert_eq!(r.ratio("abc", ""), 0.0);
        assert_eq!(r.ratio("abcd", "abcd"), 1.0);
        // "abcd" vs "bcde": block "bcd" → 2·3/8
        assert!((r.ratio("abcd", "bcde") - 0.75).abs() < 1e-9);
        // Hangul: one syllable differs out of four
        assert!((r.ratio("물리학Ⅰ", "물리학Ⅱ") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn ratio_counts_disjoint_blocks() {
        // "ab" and "cd" both match, split by a mismatch: 2·4/10
        assert!((SequenceRatio.ratio("abXcd", "abYcd") - 0.8).abs() < 1e-9);
    }

    #[test]
    fn exact_trims_and_first_duplicate_wins() {
        let index = RegistryIndex::from_entries(vec![
            entry("국어", "8"),
            entry("수학", "8"),
            entry("국어", "4"),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.exact(" 국어 ").unwrap().attributes.base_credit, "8");
        assert!(index.exact("영어").is_none());
    }

    #[test]
    fn nearest_respects_threshold() {
        let index = RegistryIndex::from_entries(vec![entry("물리학Ⅰ", "3"), entry("화학Ⅰ", "3")]);
        let m = index.nearest("물리학Ⅱ", 0.6).unwrap();
        assert_eq!(m.name, "물리학Ⅰ");
        assert!((m.score - 0.75).abs() < 1e-9);
        assert!(index.nearest("물리학Ⅱ", 0.75).is_none(), "score must exceed threshold");
        assert!(index.nearest("정보", 0.6).is_none());
    }

    #[test]
    fn nearest_by_custom_similarity() {
        struct Prefix;
        impl Similarity for Prefix {
            fn ratio(&self, a: &str, b: &str) -> f64 {
                if b.starts_with(a) { 1.0 } else { 0.0 }
            }
        }
        let index = RegistryIndex::from_entries(vec![entry("통합과학1", "4"), entry("통합사회1", "4")]);
        let m = index.nearest_by("통합사", 0.5, &Prefix).unwrap();
        assert_eq!(m.name, "통합사회1");
    }

    #[test]
    fn from_sheet_reads_rows_below_header() {
        let sheet = RawSheet {
            name: "과목".into(),
            hidden: true,
            cells: vec![
                vec![t("과목명"), t("유형"), t("기본학점"), t("평가"), t("범위")],
                vec![t("물리학Ⅰ"), t("일반"), CellValue::Number(3.0), t("5등급"), t("선택")],
                vec![CellValue::Empty],
                vec![t("화학Ⅰ"), t("일반"), t("3"), t("5등급"), t("선택")],
            ],
            fills: BTreeMap::new(),
            merged: vec![],
        };
        let index = RegistryIndex::from_sheet(&sheet, &RegistryLayout::default()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.exact("물리학Ⅰ").unwrap().attributes.base_credit, "3");
        assert_eq!(index.exact("화학Ⅰ").unwrap().attributes.scope, "선택");
    }

    #[test]
    fn missing_or_empty_registry() {
        let raw = RawWorkbook {
            sheets: vec![RawSheet {
                name: "2025".into(),
                ..Default::default()
            }],
        };
        let err = RegistryIndex::from_workbook(&raw, &RegistryLayout::default()).unwrap_err();
        assert!(matches!(err, AuditError::MissingRegistry(_)));

        let hidden = RawSheet {
            name: "과목".into(),
            hidden: true,
            cells: vec![vec![t("과목명"), t("유형"), t("기본학점"), t("평가"), t("범위")]],
            ..Default::default()
        };
        let err = RegistryIndex::from_sheet(&hidden, &RegistryLayout::default()).unwrap_err();
        assert!(err.to_string().contains("lists no subjects"));
    }

    #[test]
    fn registry_without_attribute_columns_is_unavailable() {
        // Names alone would turn every cohort row into a blank-attribute mismatch.
        let names_only = RawSheet {
            name: "과목".into(),
            hidden: true,
            cells: vec![vec![t("과목명"), t("유형")], vec![t("국어"), t("공통")]],
            ..Default::default()
        };
        let err = RegistryIndex::from_sheet(&names_only, &RegistryLayout::default()).unwrap_err();
        assert_eq!(
            err,
            AuditError::MissingRegistry("sheet '과목': missing column(s) C, D, E".into())
        );
    }
}
