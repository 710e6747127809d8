//! CREDIT_CARD validator — Luhn + IIN range + length table (spec §4.5.3).
//! New; no teacher analog. Pattern-table idiom (name/regex/keywords)
//! follows `scan/static_data/base_patterns.rs`.

use std::path::Path;

use super::{Candidate, ConfidenceBase, Validator, score_candidate};
use crate::model::{Match, MatchContext};
use crate::validators::pattern_cache::{CompiledPattern, PatternCache};

const BOUNDARY_PATTERN: &str =
    r#"(?:^|[\s,;|"'(){}\[\]<>])(\d(?:[ -]?\d){13,15})(?:$|[\s,;|"'(){}\[\]<>])"#;

const TEST_PREFIXES: &[&str] = &["4000000000000002", "4242424242424242", "4111111111111111"];

#[derive(Debug, Clone, Copy)]
struct IinRange {
    card_type: &'static str,
    min: u64,
    max: u64,
    prefix_digits: u8,
    lengths: &'static [u8],
}

const IIN_TABLE: &[IinRange] = &[
    IinRange { card_type: "VISA", min: 4, max: 4, prefix_digits: 1, lengths: &[13, 16, 19] },
    IinRange { card_type: "MASTERCARD", min: 51, max: 55, prefix_digits: 2, lengths: &[16] },
    IinRange { card_type: "MASTERCARD", min: 2221, max: 2720, prefix_digits: 4, lengths: &[16] },
    IinRange { card_type: "AMERICAN_EXPRESS", min: 34, max: 34, prefix_digits: 2, lengths: &[15] },
    IinRange { card_type: "AMERICAN_EXPRESS", min: 37, max: 37, prefix_digits: 2, lengths: &[15] },
    IinRange { card_type: "DISCOVER", min: 6011, max: 6011, prefix_digits: 4, lengths: &[16, 19] },
    IinRange { card_type: "DISCOVER", min: 644, max: 649, prefix_digits: 3, lengths: &[16] },
    IinRange { card_type: "DISCOVER", min: 65, max: 65, prefix_digits: 2, lengths: &[16] },
    IinRange { card_type: "DINERS_CLUB", min: 300, max: 305, prefix_digits: 3, lengths: &[14] },
    IinRange { card_type: "DINERS_CLUB", min: 36, max: 36, prefix_digits: 2, lengths: &[14] },
    IinRange { card_type: "JCB", min: 3528, max: 3589, prefix_digits: 4, lengths: &[16] },
    IinRange { card_type: "UNIONPAY", min: 62, max: 62, prefix_digits: 2, lengths: &[16, 19] },
    IinRange { card_type: "MAESTRO", min: 5018, max: 5018, prefix_digits: 4, lengths: &[16, 19] },
    IinRange { card_type: "MAESTRO", min: 6759, max: 6763, prefix_digits: 4, lengths: &[16, 19] },
    // Retailer-issued private-label cards have no single registered IIN
    // range; 604-609 reserves a representative 3-digit prefix band (no
    // overlap with any range above) so the validator can still reach this
    // type when a custom program uses it.
    IinRange { card_type: "PRIVATE_LABEL_CARD", min: 604, max: 609, prefix_digits: 3, lengths: &[16] },
];

pub struct CreditCardValidator {
    pattern: Option<CompiledPattern>,
}

impl CreditCardValidator {
    pub fn new() -> Self {
        Self {
            pattern: PatternCache::compile_named("credit_card", BOUNDARY_PATTERN, &["card"], false),
        }
    }

    fn classify(digits: &str) -> (&'static str, bool) {
        for range in IIN_TABLE {
            let prefix: u64 = digits[..range.prefix_digits as usize]
                .parse()
                .unwrap_or(u64::MAX);
            if prefix >= range.min
                && prefix <= range.max
                && range.lengths.contains(&(digits.len() as u8))
            {
                return (range.card_type, true);
            }
        }
        ("CREDIT_CARD", false)
    }
}

fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    let mut double = false;
    for c in digits.chars().rev() {
        let Some(d) = c.to_digit(10) else {
            return false;
        };
        let mut d = d;
        if double {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
        double = !double;
    }
    sum % 10 == 0
}

impl Validator for CreditCardValidator {
    fn id(&self) -> &'static str {
        "CREDIT_CARD"
    }

    fn validate_content(&self, content: &str, path: &Path) -> Vec<Match> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };
        let mut matches = Vec::new();
        for outer in pattern.regex.captures_iter(content) {
            let Some(group) = outer.get(1) else { continue };
            let candidate = Candidate {
                text: group.as_str().to_string(),
                byte_start: group.start(),
                byte_end: group.end(),
                line: line_of(content, group.start()),
                column: 0,
            };
            if let Some(m) = score_candidate(self, candidate, path, content) {
                matches.push(m);
            }
        }
        matches
    }

    fn calculate_confidence(&self, candidate: &Candidate) -> ConfidenceBase {
        let digits: String = candidate.text.chars().filter(|c| c.is_ascii_digit()).collect();

        let mut base = 70.0;
        let mut failed_checks = Vec::new();

        let luhn_ok = luhn_valid(&digits);
        if !luhn_ok {
            base -= 30.0;
            failed_checks.push("luhn");
        }

        let (card_type, iin_ok) = Self::classify(&digits);
        if !iin_ok {
            base -= 20.0;
            failed_checks.push("iin_range_or_length");
        }

        if TEST_PREFIXES.iter().any(|p| digits.starts_with(p) || digits == *p) {
            base = base.min(15.0);
            failed_checks.push("known_test_prefix");
        }

        ConfidenceBase {
            base: base.max(0.0),
            failed_checks,
            finding_type: Some(card_type.to_string()),
            extra_metadata: vec![("card_type".to_string(), card_type.to_string())],
        }
    }

    fn analyze_context(&self, _candidate: &Candidate, context: &MatchContext) -> f64 {
        let positive = &["card", "payment", "billing", "checkout", "invoice", "customer"];
        let negative = &["test", "example", "sample", "fake", "dummy", "4111", "xxxx"];
        super::keywords::score_with_keywords(context, positive, negative)
    }
}

fn line_of(content: &str, byte_offset: usize) -> u32 {
    content[..byte_offset].bytes().filter(|&b| b == b'\n').count() as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_valid_visa() {
        let validator = CreditCardValidator::new();
        let text = "Customer card: 4532-0151-1283-0366 expires 12/25";
        let matches = validator.validate_content(text, &PathBuf::from("a.txt"));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].finding_type, "VISA");
        assert!(matches[0].confidence >= 90.0);
        assert_eq!(matches[0].coordinate.line, 1);
        assert_eq!(matches[0].metadata_get("card_type"), Some("VISA"));
    }

    #[test]
    fn known_test_prefix_drops_confidence() {
        let validator = CreditCardValidator::new();
        let text = "test card 4000 0000 0000 0002 is fake";
        let matches = validator.validate_content(text, &PathBuf::from("a.txt"));
        assert!(matches.is_empty() || matches[0].confidence < 20.0);
    }

    #[test]
    fn detects_private_label_card() {
        let validator = CreditCardValidator::new();
        let text = "store card 6044 0000 0000 0005 on file";
        let matches = validator.validate_content(text, &PathBuf::from("a.txt"));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].finding_type, "PRIVATE_LABEL_CARD");
        assert_eq!(matches[0].metadata_get("card_type"), Some("PRIVATE_LABEL_CARD"));
    }

    #[test]
    fn luhn_failure_drops_base_confidence() {
        let validator = CreditCardValidator::new();
        // Valid IIN/length, but digits fail Luhn.
        let text = "card 4532015112830367 in prod";
        let matches = validator.validate_content(text, &PathBuf::from("a.txt"));
        if let Some(m) = matches.first() {
            assert!(m.confidence < 70.0);
        }
    }
}
