use std::path::Path;

use super::{Preprocessor, check_size};
use crate::error::{FerretError, Result};
use crate::model::{MediaClass, ProducerKind, Segment};

const MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Raw UTF-8 decode, newline-preserving. Body only; no metadata section is
/// ever produced, matching the plain-text short-circuit in spec §4.4.
pub struct PlainTextPreprocessor;

impl Preprocessor for PlainTextPreprocessor {
    fn producer_name(&self) -> &'static str {
        "plain_text"
    }

    fn supports(&self, media_class: MediaClass) -> bool {
        matches!(media_class, MediaClass::PlainText)
    }

    fn process(&self, path: &Path) -> Result<Vec<Segment>> {
        check_size(path, MAX_FILE_BYTES)?;
        let bytes = std::fs::read(path).map_err(|source| FerretError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).unwrap_or_else(|e| {
            tracing::debug!(path = %path.display(), "plain text: not valid utf-8, using lossy decode");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        });
        Ok(vec![Segment {
            producer_name: self.producer_name(),
            producer_kind: ProducerKind::Body,
            text,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_utf8_text_verbatim() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hello\nworld").unwrap();
        let segs = PlainTextPreprocessor.process(file.path()).unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].text, "hello\nworld\n");
    }

    #[test]
    fn empty_file_yields_empty_body() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let segs = PlainTextPreprocessor.process(file.path()).unwrap();
        assert_eq!(segs[0].text, "");
    }
}
