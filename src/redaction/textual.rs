//! Textual redaction: direct substring replace on decoded text, applied by
//! exact byte offset (spec §4.9's first row). New module; the
//! descending-offset splice loop follows the planning order
//! `RedactionEngine::build_plan` already establishes.

use std::path::Path;

use crate::error::{FerretError, Result};
use crate::model::RedactionEdit;

/// Applies `edits` (already sorted descending by `coordinate.byte_start`
/// by the caller) to `content`, splicing in-place so each edit's offsets
/// are still valid when the next (earlier) edit is applied.
pub fn redact(content: &str, edits: &[RedactionEdit]) -> String {
    let mut buf = content.to_string();
    for edit in edits {
        let start = edit.coordinate.byte_start as usize;
        let end = edit.coordinate.byte_end as usize;
        if start > buf.len() || end > buf.len() || start > end {
            continue;
        }
        if !buf.is_char_boundary(start) || !buf.is_char_boundary(end) {
            continue;
        }
        buf.replace_range(start..end, &edit.replacement);
    }
    buf
}

pub fn redact_file(path: &Path, output_path: &Path, edits: &[RedactionEdit]) -> Result<()> {
    let content = std::fs::read_to_string(path).map_err(|source| FerretError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let redacted = redact(&content, edits);
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| FerretError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(output_path, redacted).map_err(|source| FerretError::Io {
        path: output_path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;

    fn edit(start: u64, end: u64, replacement: &str) -> RedactionEdit {
        RedactionEdit {
            coordinate: Coordinate { byte_start: start, byte_end: end, line: 1, column: 0 },
            matched_text: String::new(),
            replacement: replacement.to_string(),
            validator_id: "SSN",
        }
    }

    #[test]
    fn descending_offsets_do_not_invalidate_each_other() {
        let content = "aaa bbb ccc";
        let edits = vec![edit(8, 11, "[X]"), edit(0, 3, "[Y]")];
        let out = redact(content, &edits);
        assert_eq!(out, "[Y] bbb [X]");
    }

    #[test]
    fn original_substring_absent_after_redaction() {
        let content = "ssn: 123-45-6789 on file";
        let edits = vec![edit(5, 16, "[SSN-REDACTED]")];
        let out = redact(content, &edits);
        assert!(!out.contains("123-45-6789"));
    }
}
