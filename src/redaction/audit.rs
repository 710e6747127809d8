//! Append-only, plaintext-free audit log (spec §4.9). One JSON line per
//! file per scan. New module — no teacher analog; the "never retain the
//! sensitive value, only its shape" rule matches the suppression store's
//! privacy invariant (`suppression::fingerprint`) applied to a log instead
//! of a hash.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::{FerretError, Result};
use crate::model::{AuditEntry, Coordinate, RedactionEdit};

#[derive(Debug, Serialize)]
struct AuditRecord<'a> {
    path: &'a Path,
    outcome: &'static str,
    skip_reason: Option<&'a str>,
    redactions: Vec<RedactionLine>,
}

#[derive(Debug, Serialize)]
struct RedactionLine {
    data_type: &'static str,
    strategy: String,
    line: u32,
}

pub fn entry_for_edits(path: &Path, strategy_name: &str, edits: &[RedactionEdit]) -> Vec<AuditEntry> {
    edits
        .iter()
        .map(|edit| AuditEntry {
            path: path.to_path_buf(),
            validator: edit.validator_id,
            strategy: strategy_name.to_string(),
            coordinate: edit.coordinate,
            skipped: false,
            skip_reason: None,
        })
        .collect()
}

pub fn skipped_entry(path: &Path, reason: &str) -> AuditEntry {
    AuditEntry {
        path: path.to_path_buf(),
        validator: "REDACTION",
        strategy: String::new(),
        coordinate: Coordinate { byte_start: 0, byte_end: 0, line: 0, column: 0 },
        skipped: true,
        skip_reason: Some(reason.to_string()),
    }
}

/// Appends one JSON record (not a bare array — newline-delimited JSON, so a
/// crashed run never corrupts earlier entries) to `log_path`.
pub fn append(log_path: &Path, path: &Path, entries: &[AuditEntry]) -> Result<()> {
    let outcome = if entries.iter().any(|e| e.skipped) { "failed" } else { "redacted" };
    let skip_reason = entries.iter().find_map(|e| e.skip_reason.as_deref());

    let record = AuditRecord {
        path,
        outcome,
        skip_reason,
        redactions: entries
            .iter()
            .filter(|e| !e.skipped)
            .map(|e| RedactionLine {
                data_type: e.validator,
                strategy: e.strategy.clone(),
                line: e.coordinate.line,
            })
            .collect(),
    };

    let line = serde_json::to_string(&record)
        .map_err(|e| FerretError::ConfigError(format!("failed to serialize audit record: {e}")))?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|source| FerretError::Io { path: log_path.to_path_buf(), source })?;
    writeln!(file, "{line}").map_err(|source| FerretError::Io { path: log_path.to_path_buf(), source })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn appends_one_line_per_call() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");
        let entries = vec![skipped_entry(&dir.path().join("a.pdf"), "pdf_body_redaction_not_implemented")];
        append(&log_path, &dir.path().join("a.pdf"), &entries).unwrap();
        append(&log_path, &dir.path().join("b.txt"), &entries).unwrap();
        let content = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn never_contains_plaintext_match_text() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");
        let entries = vec![skipped_entry(&dir.path().join("a.txt"), "some_reason")];
        append(&log_path, &dir.path().join("a.txt"), &entries).unwrap();
        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(!content.contains("123-45-6789"));
    }
}
