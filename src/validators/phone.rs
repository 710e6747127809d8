use std::path::Path;

use super::{Candidate, ConfidenceBase, Validator, find_candidates, score_candidate};
use crate::model::Match;
use crate::validators::pattern_cache::{CompiledPattern, PatternCache};

const PHONE_PATTERN: &str = r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b";

pub struct PhoneValidator {
    pattern: Option<CompiledPattern>,
}

impl PhoneValidator {
    pub fn new() -> Self {
        Self {
            pattern: PatternCache::compile_named("phone", PHONE_PATTERN, &[], false),
        }
    }
}

impl Validator for PhoneValidator {
    fn id(&self) -> &'static str {
        "PHONE"
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
        let digits: String = candidate.text.chars().filter(|c| c.is_ascii_digit()).collect();
        let mut base = 60.0;
        let mut failed_checks = Vec::new();

        // 555-01xx is the reserved fictional-number range for North American
        // media/examples.
        if digits.len() >= 7 && &digits[digits.len() - 7..digits.len() - 4] == "555" {
            base -= 35.0;
            failed_checks.push("reserved_555_range");
        }
        if !(10..=11).contains(&digits.len()) {
            base -= 20.0;
            failed_checks.push("length");
        }
        ConfidenceBase {
            base: base.max(0.0),
            failed_checks,
            finding_type: Some("PHONE".to_string()),
            extra_metadata: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_formatted_phone_number() {
        let validator = PhoneValidator::new();
        let matches = validator.validate_content("call me at 415-867-5309", &PathBuf::from("a.txt"));
        assert!(!matches.is_empty());
    }

    #[test]
    fn reserved_555_range_penalized() {
        let validator = PhoneValidator::new();
        let matches = validator.validate_content("555-0100 example", &PathBuf::from("a.txt"));
        assert!(matches.is_empty() || matches[0].confidence < 60.0);
    }
}
