use std::path::Path;

use super::{Candidate, ConfidenceBase, Validator, find_candidates, score_candidate};
use crate::model::Match;
use crate::validators::pattern_cache::{CompiledPattern, PatternCache};

/// Configuration-driven regex families for internal URLs and
/// copyright/patent/trademark text. Requires no default patterns — per
/// spec §4.5.5, an unconfigured instance logs an informational message and
/// contributes nothing rather than guessing at what "internal" means for
/// a given organization.
pub struct IntellectualPropertyValidator {
    patterns: Vec<CompiledPattern>,
}

impl IntellectualPropertyValidator {
    /// `configured_patterns` come from `config.validators.INTELLECTUAL_PROPERTY`
    /// (spec §6's config schema); each is compiled independently so one bad
    /// pattern from config doesn't disable the rest.
    pub fn new(configured_patterns: &[(&str, &str)]) -> Self {
        if configured_patterns.is_empty() {
            tracing::info!(
                "INTELLECTUAL_PROPERTY validator has no configured patterns; contributing nothing this scan"
            );
        }
        let patterns = configured_patterns
            .iter()
            .filter_map(|(_name, source)| PatternCache::compile_named("intellectual_property", source, &[], false))
            .collect();
        Self { patterns }
    }

    pub fn from_config(patterns: &[(String, String)]) -> Self {
        let owned: Vec<(&str, &str)> = patterns
            .iter()
            .map(|(n, s)| (n.as_str(), s.as_str()))
            .collect();
        Self::new(&owned)
    }
}

impl Validator for IntellectualPropertyValidator {
    fn id(&self) -> &'static str {
        "INTELLECTUAL_PROPERTY"
    }

    fn validate_content(&self, content: &str, path: &Path) -> Vec<Match> {
        let mut matches = Vec::new();
        for pattern in &self.patterns {
            matches.extend(
                find_candidates(pattern, content)
                    .into_iter()
                    .filter_map(|c| score_candidate(self, c, path, content)),
            );
        }
        matches
    }

    fn calculate_confidence(&self, _candidate: &Candidate) -> ConfidenceBase {
        ConfidenceBase {
            base: 60.0,
            failed_checks: Vec::new(),
            finding_type: Some("INTELLECTUAL_PROPERTY".to_string()),
            extra_metadata: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn unconfigured_validator_is_a_no_op() {
        let validator = IntellectualPropertyValidator::new(&[]);
        let matches = validator.validate_content("Copyright 2024 Acme Corp", &PathBuf::from("a.txt"));
        assert!(matches.is_empty());
    }

    #[test]
    fn configured_pattern_detects_internal_url() {
        let validator = IntellectualPropertyValidator::new(&[(
            "internal_wiki",
            r"internal\.example\.corp/\S+",
        )]);
        let matches = validator.validate_content(
            "see https://internal.example.corp/secret-roadmap",
            &PathBuf::from("a.txt"),
        );
        assert_eq!(matches.len(), 1);
    }
}
