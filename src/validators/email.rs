use std::path::Path;

use super::{Candidate, ConfidenceBase, Validator, find_candidates, score_candidate};
use crate::model::Match;
use crate::validators::pattern_cache::{CompiledPattern, PatternCache};

const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}";

pub struct EmailValidator {
    pattern: Option<CompiledPattern>,
}

impl EmailValidator {
    pub fn new() -> Self {
        Self {
            pattern: PatternCache::compile_named("email", EMAIL_PATTERN, &["@"], false),
        }
    }
}

impl Validator for EmailValidator {
    fn id(&self) -> &'static str {
        "EMAIL"
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
        let mut base = 80.0;
        let mut failed_checks = Vec::new();
        let domain = candidate.text.rsplit('@').next().unwrap_or("");
        if domain.eq_ignore_ascii_case("example.com") || domain.ends_with(".example") {
            base -= 35.0;
            failed_checks.push("placeholder_domain");
        }
        ConfidenceBase {
            base: base.max(0.0),
            failed_checks,
            finding_type: Some("EMAIL".to_string()),
            extra_metadata: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_email_in_line() {
        let validator = EmailValidator::new();
        let matches = validator.validate_content("contact: jane@example.org", &PathBuf::from("a.txt"));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].coordinate.line, 1);
    }

    #[test]
    fn placeholder_domain_penalized() {
        let validator = EmailValidator::new();
        let matches = validator.validate_content("foo@example.com", &PathBuf::from("a.txt"));
        assert!(matches.is_empty() || matches[0].confidence < 80.0);
    }
}
