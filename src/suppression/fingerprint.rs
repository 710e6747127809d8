//! Suppression fingerprint — spec §3/§4.8: a hash that fully determines a
//! finding's identity without ever persisting its plaintext match text or
//! surrounding context. New module; no teacher analog (the teacher has no
//! suppression concept), built in the same "stable hex-encoded SHA-256
//! digest of a pipe-joined field tuple" idiom `sha2` usage elsewhere in the
//! pack favors (`sibyllinesoft-valknut`'s content-addressed cache keys).

use sha2::{Digest, Sha256};

use crate::model::Match;

/// `SHA-256(type || "|" || round(confidence,2) || "|" || full_line || "|"
/// || basename(filename) || "|" || line_number || "|" ||
/// SHA-256(match_text) || "|" || SHA-256(before_text || after_text))`,
/// lowercase hex. Privacy invariant: the two innermost hashes are the only
/// trace of the plaintext match/context that ever leaves this function.
pub fn compute(finding: &Match) -> String {
    let rounded_confidence = round_2dp(finding.confidence);
    let match_text_hash = hex_sha256(finding.matched_text.as_bytes());
    let surrounding = format!("{}{}", finding.context.before, finding.context.after);
    let context_hash = hex_sha256(surrounding.as_bytes());

    let joined = format!(
        "{}|{}|{}|{}|{}|{}|{}",
        finding.finding_type,
        rounded_confidence,
        finding.context.full_line,
        finding.filename(),
        finding.coordinate.line,
        match_text_hash,
        context_hash,
    );
    hex_sha256(joined.as_bytes())
}

/// The two sub-hashes recorded on `SuppressionAttributes` — computed
/// separately from `compute` so the store can persist them without ever
/// holding the plaintext alongside.
pub fn match_text_hash(finding: &Match) -> String {
    hex_sha256(finding.matched_text.as_bytes())
}

pub fn context_hash(finding: &Match) -> String {
    let surrounding = format!("{}{}", finding.context.before, finding.context.after);
    hex_sha256(surrounding.as_bytes())
}

fn round_2dp(value: f64) -> String {
    format!("{:.2}", value)
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, MatchContext};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn sample_match() -> Match {
        Match {
            finding_type: "SSN".to_string(),
            validator_id: "SSN",
            matched_text: "123-45-6789".to_string(),
            coordinate: Coordinate { byte_start: 0, byte_end: 11, line: 42, column: 5 },
            confidence: 82.345,
            file_path: Arc::new(PathBuf::from("dir/b.txt")),
            context: MatchContext {
                before: "line above".to_string(),
                full_line: "ssn: 123-45-6789".to_string(),
                after: "line below".to_string(),
                positive_keywords: Vec::new(),
                negative_keywords: Vec::new(),
                confidence_impact: 0.0,
            },
            metadata: Vec::new(),
            cluster_members: Vec::new(),
        }
    }

    #[test]
    fn stable_across_calls() {
        let m = sample_match();
        assert_eq!(compute(&m), compute(&m));
    }

    #[test]
    fn hash_is_hex_sha256_length() {
        let hash = compute(&sample_match());
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn confidence_rounds_to_two_decimals_before_hashing() {
        let mut a = sample_match();
        let mut b = sample_match();
        a.confidence = 82.3449;
        b.confidence = 82.3451;
        assert_eq!(compute(&a), compute(&b));
    }

    #[test]
    fn different_match_text_changes_hash_even_if_everything_else_equal() {
        let mut a = sample_match();
        let mut b = sample_match();
        a.matched_text = "111-11-1111".to_string();
        b.matched_text = "222-22-2222".to_string();
        assert_ne!(compute(&a), compute(&b));
    }

    #[test]
    fn uses_basename_not_full_path() {
        let mut a = sample_match();
        let mut b = sample_match();
        a.file_path = Arc::new(PathBuf::from("/one/path/b.txt"));
        b.file_path = Arc::new(PathBuf::from("/other/path/b.txt"));
        assert_eq!(compute(&a), compute(&b));
    }
}
