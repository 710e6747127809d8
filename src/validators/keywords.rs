//! Shared keyword-weighted context scoring (spec §4.5.2 step 3). Every
//! built-in validator's default `analyze_context` funnels through this;
//! validators with type-specific keyword lists (credit card, secrets)
//! override `analyze_context` to call `score_with_keywords` with their own
//! lists instead of the generic defaults here.

use crate::model::MatchContext;

const DEFAULT_POSITIVE: &[&str] = &[
    "payment", "billing", "invoice", "customer", "account", "card number", "ssn",
    "social security", "patient", "diagnosis", "salary", "confidential", "private",
    "production", "prod", "live",
];

const DEFAULT_NEGATIVE: &[&str] = &[
    "test", "example", "sample", "fake", "dummy", "mock", "placeholder", "lorem ipsum",
    "xxx", "todo", "fixme", "redacted", "foo", "bar",
];

/// Generic keyword scan using the shared default lists.
pub fn score_keywords(context: &MatchContext) -> f64 {
    score_with_keywords(context, DEFAULT_POSITIVE, DEFAULT_NEGATIVE)
}

/// Weighted keyword scan: same-line hits count more than surrounding-text
/// hits, per the weight table in spec §4.5.2.
///
/// `positive` same line: +7, surrounding: +3.
/// `negative` same line: −15, surrounding: −7.
/// Sum is the caller's responsibility to clamp to `[-50, +25]`.
pub fn score_with_keywords(context: &MatchContext, positive: &[&str], negative: &[&str]) -> f64 {
    let line_lower = context.full_line.to_lowercase();
    let surrounding_lower = format!(
        "{} {}",
        context.before.to_lowercase(),
        context.after.to_lowercase()
    );

    let mut delta = 0.0;
    for kw in positive {
        if line_lower.contains(kw) {
            delta += 7.0;
        } else if surrounding_lower.contains(kw) {
            delta += 3.0;
        }
    }
    for kw in negative {
        if line_lower.contains(kw) {
            delta -= 15.0;
        } else if surrounding_lower.contains(kw) {
            delta -= 7.0;
        }
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(line: &str, before: &str, after: &str) -> MatchContext {
        MatchContext {
            before: before.to_string(),
            full_line: line.to_string(),
            after: after.to_string(),
            positive_keywords: Vec::new(),
            negative_keywords: Vec::new(),
            confidence_impact: 0.0,
        }
    }

    #[test]
    fn positive_same_line_outweighs_surrounding() {
        let c = ctx("customer card number below", "", "");
        assert!(score_keywords(&c) > 0.0);
    }

    #[test]
    fn negative_keyword_same_line_penalizes_hard() {
        let c = ctx("this is a test fixture value", "", "");
        assert!(score_keywords(&c) < 0.0);
    }
}
