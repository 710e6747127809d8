use std::path::Path;

use super::{Candidate, ConfidenceBase, Validator, find_candidates, score_candidate};
use crate::model::Match;
use crate::name_db;
use crate::validators::pattern_cache::{CompiledPattern, PatternCache};

const NAME_PATTERN: &str = r"\b([A-Z][a-z]+)\s+([A-Z][a-z]+)\b";

/// Backed by the fixed first/last name database (spec §4.5.5): two
/// capitalized words only score above zero when both halves are present
/// in `name_db`, which keeps this from firing on every two-word proper
/// noun in a document.
pub struct PersonNameValidator {
    pattern: Option<CompiledPattern>,
}

impl PersonNameValidator {
    pub fn new() -> Self {
        Self {
            pattern: PatternCache::compile_named("person_name", NAME_PATTERN, &[], true),
        }
    }
}

impl Validator for PersonNameValidator {
    fn id(&self) -> &'static str {
        "PERSON_NAME"
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
        let mut parts = candidate.text.split_whitespace();
        let (Some(first), Some(last)) = (parts.next(), parts.next()) else {
            return ConfidenceBase {
                base: 0.0,
                failed_checks: vec!["malformed_candidate"],
                finding_type: Some("PERSON_NAME".to_string()),
                extra_metadata: Vec::new(),
            };
        };

        if name_db::is_known_name(first, last) {
            ConfidenceBase {
                base: 65.0,
                failed_checks: Vec::new(),
                finding_type: Some("PERSON_NAME".to_string()),
                extra_metadata: Vec::new(),
            }
        } else {
            ConfidenceBase {
                base: 0.0,
                failed_checks: vec!["not_in_name_database"],
                finding_type: Some("PERSON_NAME".to_string()),
                extra_metadata: Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_known_full_name() {
        let validator = PersonNameValidator::new();
        let matches = validator.validate_content("Contact John Smith for details", &PathBuf::from("a.txt"));
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn unknown_capitalized_pair_is_dropped() {
        let validator = PersonNameValidator::new();
        let matches = validator.validate_content("Visit New York today", &PathBuf::from("a.txt"));
        assert!(matches.is_empty());
    }
}
