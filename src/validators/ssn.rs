use std::path::Path;

use super::{Candidate, ConfidenceBase, Validator, find_candidates, score_candidate};
use crate::model::Match;
use crate::validators::pattern_cache::{CompiledPattern, PatternCache};

const SSN_PATTERN: &str = r"\b(\d{3})-(\d{2})-(\d{4})\b";

/// US Social Security Numbers. Format validation rejects reserved area
/// numbers (`000`, `666`, `900-999`), reserved group `00`, and reserved
/// serial `0000` — the same invalid ranges the SSA never issues.
pub struct SsnValidator {
    pattern: Option<CompiledPattern>,
}

impl SsnValidator {
    pub fn new() -> Self {
        Self {
            pattern: PatternCache::compile_named("ssn", SSN_PATTERN, &["ssn"], false),
        }
    }

    fn is_valid_format(text: &str) -> bool {
        let parts: Vec<&str> = text.split('-').collect();
        if parts.len() != 3 {
            return false;
        }
        let area: u32 = parts[0].parse().unwrap_or(0);
        let group: u32 = parts[1].parse().unwrap_or(0);
        let serial: u32 = parts[2].parse().unwrap_or(0);
        area != 0 && area != 666 && area < 900 && group != 0 && serial != 0
    }
}

impl Validator for SsnValidator {
    fn id(&self) -> &'static str {
        "SSN"
    }

    fn validate_content(&self, content: &str, path: &Path) -> Vec<Match> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };
        find_candidates(pattern, content)
            .into_iter()
            .filter_map(|c| score_candidate(self, c, path, content))
            .collect()
    }

    fn calculate_confidence(&self, candidate: &Candidate) -> ConfidenceBase {
        let mut base = 75.0;
        let mut failed_checks = Vec::new();
        if !Self::is_valid_format(&candidate.text) {
            base -= 40.0;
            failed_checks.push("reserved_range");
        }
        ConfidenceBase {
            base: base.max(0.0),
            failed_checks,
            finding_type: Some("SSN".to_string()),
            extra_metadata: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_valid_ssn() {
        let validator = SsnValidator::new();
        let matches = validator.validate_content("ssn: 123-45-6789", &PathBuf::from("a.txt"));
        assert_eq!(matches.len(), 1);
        assert!(matches[0].confidence > 0.0);
    }

    #[test]
    fn reserved_area_number_penalized() {
        let validator = SsnValidator::new();
        let matches = validator.validate_content("id 000-12-3456 on file", &PathBuf::from("a.txt"));
        assert!(matches.is_empty() || matches[0].confidence < 75.0);
    }
}
