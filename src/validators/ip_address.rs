use std::net::Ipv4Addr;
use std::path::Path;

use super::{Candidate, ConfidenceBase, Validator, find_candidates, score_candidate};
use crate::model::Match;
use crate::validators::pattern_cache::{CompiledPattern, PatternCache};

const IPV4_PATTERN: &str = r"\b(?:\d{1,3}\.){3}\d{1,3}\b";

pub struct IpAddressValidator {
    pattern: Option<CompiledPattern>,
}

impl IpAddressValidator {
    pub fn new() -> Self {
        Self {
            pattern: PatternCache::compile_named("ipv4", IPV4_PATTERN, &[], true),
        }
    }
}

fn is_private_or_reserved(addr: &Ipv4Addr) -> bool {
    addr.is_private()
        || addr.is_loopback()
        || addr.is_link_local()
        || addr.is_broadcast()
        || addr.is_documentation()
        || addr.is_unspecified()
}

impl Validator for IpAddressValidator {
    fn id(&self) -> &'static str {
        "IP_ADDRESS"
    }

    fn validate_content(&self, content: &str, path: &Path) -> Vec<Match> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };
        find_candidates(pattern, content)
            .into_iter()
            .filter(|c| c.text.parse::<Ipv4Addr>().is_ok())
            .filter_map(|c| score_candidate(self, c, path, content))
            .collect()
    }

    fn calculate_confidence(&self, candidate: &Candidate) -> ConfidenceBase {
        let mut base = 55.0;
        let mut failed_checks = Vec::new();
        if let Ok(addr) = candidate.text.parse::<Ipv4Addr>() {
            if is_private_or_reserved(&addr) {
                base -= 25.0;
                failed_checks.push("private_or_reserved_range");
            }
        } else {
            base = 0.0;
            failed_checks.push("not_an_ipv4_literal");
        }
        ConfidenceBase {
            base: base.max(0.0),
            failed_checks,
            finding_type: Some("IP_ADDRESS".to_string()),
            extra_metadata: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_public_ipv4() {
        let validator = IpAddressValidator::new();
        let matches = validator.validate_content("server at 203.0.113.42 in prod", &PathBuf::from("a.txt"));
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn private_range_penalized() {
        let validator = IpAddressValidator::new();
        let matches = validator.validate_content("localhost 192.168.1.1", &PathBuf::from("a.txt"));
        assert!(matches.is_empty() || matches[0].confidence < 55.0);
    }

    #[test]
    fn rejects_out_of_range_octets() {
        let validator = IpAddressValidator::new();
        let matches = validator.validate_content("version 999.999.999.999", &PathBuf::from("a.txt"));
        assert!(matches.is_empty());
    }
}
