//! Inline ignore-comment suppression (`ferret:ignore`, `ferret:ignore-line`,
//! `ferret:ignore-next`) — SPEC_FULL.md §3's second, inline suppression
//! mechanism, complementing (not replacing) `SuppressionStore`. Grounded on
//! the teacher's `scan/filters/content/comment.rs` (`CommentFilter`) and the
//! directive/comment-style matrix its integration tests exercise
//! (`tests/integration/scan/filters/content/comment.rs`): `//`, `#`, `--`,
//! and `/* */` comment styles, case-sensitive directive matching.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::model::Match;

/// Matches a same-line directive: `ferret:ignore` or `ferret:ignore-line`,
/// in any of the comment styles the teacher's test matrix covers.
static LINE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?://|#|--|/\*)\s*ferret:ignore(?:-line)?\b").unwrap());

/// Matches a next-line directive: `ferret:ignore-next`.
static NEXT_LINE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?://|#|--|/\*)\s*ferret:ignore-next\b").unwrap());

/// True if `line` carries a same-line ignore directive.
pub fn line_has_ignore_directive(line: &str) -> bool {
    LINE_DIRECTIVE.is_match(line)
}

/// True if `line` carries a `ferret:ignore-next` directive, scoping the
/// suppression to the line immediately following it.
pub fn line_has_ignore_next_directive(line: &str) -> bool {
    NEXT_LINE_DIRECTIVE.is_match(line)
}

/// Computes the set of 1-based line numbers a finding must not be reported
/// on, given the full file text: every line with a same-line directive, plus
/// the line after every `ferret:ignore-next`.
fn suppressed_lines(content: &str) -> HashSet<u32> {
    let mut suppressed = HashSet::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        if line_has_ignore_directive(line) {
            suppressed.insert(line_no);
        }
        if line_has_ignore_next_directive(line) {
            suppressed.insert(line_no + 1);
        }
    }
    suppressed
}

/// Drops every finding whose line falls in an ignore-commented range.
/// Returns the surviving findings and the count dropped, for `ScanStats`.
pub fn filter_matches(matches: Vec<Match>, content: &str) -> (Vec<Match>, usize) {
    let suppressed = suppressed_lines(content);
    if suppressed.is_empty() {
        return (matches, 0);
    }
    let before = matches.len();
    let kept: Vec<Match> = matches.into_iter().filter(|m| !suppressed.contains(&m.coordinate.line)).collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, MatchContext};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn make_match(line: u32) -> Match {
        Match {
            finding_type: "SECRETS".to_string(),
            validator_id: "SECRETS",
            matched_text: "secret123".to_string(),
            coordinate: Coordinate { byte_start: 0, byte_end: 9, line, column: 0 },
            confidence: 80.0,
            file_path: Arc::new(PathBuf::from("a.rs")),
            context: MatchContext::default(),
            metadata: Vec::new(),
            cluster_members: Vec::new(),
        }
    }

    #[test]
    fn detects_various_comment_styles() {
        assert!(line_has_ignore_directive("const key = 'secret'; // ferret:ignore"));
        assert!(line_has_ignore_directive("const key = 'secret'; /* ferret:ignore */"));
        assert!(line_has_ignore_directive("const key = 'secret'; # ferret:ignore"));
        assert!(line_has_ignore_directive("const key = 'secret'; -- ferret:ignore"));
        assert!(line_has_ignore_directive("const key = 'secret'; //ferret:ignore-line"));
        assert!(!line_has_ignore_directive("const key = 'secret';"));
    }

    #[test]
    fn does_not_match_directive_as_part_of_identifier() {
        assert!(!line_has_ignore_directive("const ferretIgnoreThis = 'test';"));
    }

    #[test]
    fn filters_same_line_matches() {
        let matches = vec![make_match(1), make_match(2)];
        let content = "const secret1 = 'x'; // ferret:ignore\nconst secret2 = 'y';\n";
        let (kept, dropped) = filter_matches(matches, content);
        assert_eq!(dropped, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].coordinate.line, 2);
    }

    #[test]
    fn ignore_next_suppresses_the_following_line() {
        let matches = vec![make_match(2)];
        let content = "// ferret:ignore-next\nconst secret = 'x';\n";
        let (kept, dropped) = filter_matches(matches, content);
        assert_eq!(dropped, 1);
        assert!(kept.is_empty());
    }
}
