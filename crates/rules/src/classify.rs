use regex::Regex;

use crate::config::CohortPattern;
use crate::error::AuditError;
use crate::model::SheetCategory;

/// Maps a sheet name to the cohort rule set that governs it.
pub struct SheetClassifier {
    patterns: Vec<(Regex, SheetCategory)>,
}

impl SheetClassifier {
    pub fn new(cohorts: &[CohortPattern]) -> Result<Self, AuditError> {
        let patterns = cohorts
            .iter()
            .map(|c| {
                Regex::new(&c.pattern)
                    .map(|re| (re, c.category))
                    .map_err(|e| AuditError::InvalidPattern {
                        pattern: c.pattern.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// First matching pattern wins; no match is `Other`.
    pub fn classify(&self, sheet_name: &str) -> SheetCategory {
        self.patterns
            .iter()
            .find(|(re, _)| re.is_match(sheet_name))
            .map(|(_, category)| *category)
            .unwrap_or(SheetCategory::Other)
    }
}
