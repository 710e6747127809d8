//! `ContextExtractor` — given full file text, a 1-based line number, and
//! the match text, return the surrounding lines and the full matched line
//! (spec §2, §4.5.2 step 2). New module: the teacher extracts only the
//! single matched line (`Secret::extract_line_content` in `scan/secret.rs`)
//! — this generalizes that to before/after windows for keyword scanning.

const SURROUNDING_LINES: usize = 2;

pub struct ContextExtractor;

impl ContextExtractor {
    pub fn extract(full_text: &str, line_number: u32, _matched_text: &str) -> crate::model::MatchContext {
        let lines: Vec<&str> = full_text.lines().collect();
        let idx = (line_number as usize).saturating_sub(1);
        let full_line = lines.get(idx).copied().unwrap_or_default().to_string();

        let before_start = idx.saturating_sub(SURROUNDING_LINES);
        let before = lines[before_start..idx].join("\n");

        let after_end = (idx + 1 + SURROUNDING_LINES).min(lines.len());
        let after = if idx + 1 < lines.len() {
            lines[idx + 1..after_end].join("\n")
        } else {
            String::new()
        };

        crate::model::MatchContext {
            before,
            full_line,
            after,
            positive_keywords: Vec::new(),
            negative_keywords: Vec::new(),
            confidence_impact: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_surrounding_window() {
        let text = "line1\nline2\nline3\nline4\nline5";
        let ctx = ContextExtractor::extract(text, 3, "line3");
        assert_eq!(ctx.full_line, "line3");
        assert_eq!(ctx.before, "line1\nline2");
        assert_eq!(ctx.after, "line4\nline5");
    }

    #[test]
    fn handles_first_and_last_line() {
        let text = "only line";
        let ctx = ContextExtractor::extract(text, 1, "only");
        assert_eq!(ctx.full_line, "only line");
        assert_eq!(ctx.before, "");
        assert_eq!(ctx.after, "");
    }
}
