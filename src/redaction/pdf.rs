//! PDF redaction stub. Per the Open Question decision recorded in
//! `DESIGN.md`: rewriting a PDF's content stream in place (without
//! corrupting cross-reference tables or triggering a visual reflow) is
//! out of scope for this pass. `RedactionEngine` copies the file unchanged
//! and records the skip in the audit log rather than silently pretending
//! to have redacted it; it also logs one `tracing::warn!` the first time
//! this is hit in a given process, not once per file, so a large scan
//! doesn't drown in identical warnings.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{FerretError, Result};

static WARNED: AtomicBool = AtomicBool::new(false);

pub const SKIP_REASON: &str = "pdf_body_redaction_not_implemented";

pub fn redact_file(path: &Path, output_path: &Path) -> Result<()> {
    if !WARNED.swap(true, Ordering::Relaxed) {
        tracing::warn!(
            "PDF body redaction is not implemented; PDFs are copied unchanged and findings are recorded as skipped in the audit log"
        );
    }
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| FerretError::Io { path: parent.to_path_buf(), source })?;
    }
    std::fs::copy(path, output_path).map_err(|source| FerretError::Io { path: path.to_path_buf(), source })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copies_file_unchanged() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.pdf");
        let output = dir.path().join("out/a.pdf");
        std::fs::write(&input, b"%PDF-1.4 fake body with ssn 123-45-6789").unwrap();

        redact_file(&input, &output).unwrap();

        let out_bytes = std::fs::read(&output).unwrap();
        let in_bytes = std::fs::read(&input).unwrap();
        assert_eq!(out_bytes, in_bytes);
    }
}
