use std::path::Path;

use super::{Candidate, ConfidenceBase, Validator, find_candidates, score_candidate};
use crate::model::{Match, MatchContext};
use crate::validators::pattern_cache::{CompiledPattern, PatternCache};

/// US passport book numbers: one letter (series) followed by 8 digits, or
/// the legacy all-digit 9-character format.
const PASSPORT_PATTERN: &str = r"\b[A-Z]\d{8}\b|\b\d{9}\b";

pub struct PassportValidator {
    pattern: Option<CompiledPattern>,
}

impl PassportValidator {
    pub fn new() -> Self {
        Self {
            pattern: PatternCache::compile_named("passport", PASSPORT_PATTERN, &["passport"], false),
        }
    }
}

impl Validator for PassportValidator {
    fn id(&self) -> &'static str {
        "PASSPORT"
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
        // The all-digit legacy format is indistinguishable from a dozen
        // other 9-digit numbers (phone, account ids, …) without context,
        // so it starts much lower than the letter-prefixed modern format.
        let is_modern_format = candidate
            .text
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic())
            .unwrap_or(false);
        let base = if is_modern_format { 55.0 } else { 20.0 };
        ConfidenceBase {
            base,
            failed_checks: Vec::new(),
            finding_type: Some("PASSPORT".to_string()),
            extra_metadata: Vec::new(),
        }
    }

    fn analyze_context(&self, _candidate: &Candidate, context: &MatchContext) -> f64 {
        let positive = &["passport", "travel document", "nationality", "visa application"];
        let negative = &["phone", "account", "order", "invoice", "test", "example"];
        super::keywords::score_with_keywords(context, positive, negative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_modern_format_with_passport_keyword() {
        let validator = PassportValidator::new();
        let matches = validator.validate_content("passport number: A12345678", &PathBuf::from("a.txt"));
        assert!(!matches.is_empty());
        assert!(matches[0].confidence > 55.0);
    }

    #[test]
    fn bare_nine_digits_start_low() {
        let validator = PassportValidator::new();
        let matches = validator.validate_content("order id 123456789 shipped", &PathBuf::from("a.txt"));
        assert!(matches.is_empty() || matches[0].confidence < 55.0);
    }
}
