use std::path::Path;

use lopdf::Document;

use super::{Preprocessor, check_size};
use crate::error::{FerretError, Result};
use crate::model::{MediaClass, ProducerKind, Segment};

const MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Extracts selectable text from PDF content streams via `lopdf`. No OCR —
/// scanned/image-only PDFs yield no body text, which is expected per spec
/// §4.3 ("no OCR").
pub struct PdfTextPreprocessor;

impl Preprocessor for PdfTextPreprocessor {
    fn producer_name(&self) -> &'static str {
        "pdf_text"
    }

    fn supports(&self, media_class: MediaClass) -> bool {
        matches!(media_class, MediaClass::Pdf)
    }

    fn process(&self, path: &Path) -> Result<Vec<Segment>> {
        check_size(path, MAX_FILE_BYTES)?;

        let doc = Document::load(path).map_err(|e| FerretError::PreprocessFailed {
            path: path.to_path_buf(),
            reason: format!("corrupt pdf: {e}"),
        })?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let mut text = String::new();
        for page in page_numbers {
            match doc.extract_text(&[page]) {
                Ok(page_text) => {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(&page_text);
                }
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        page,
                        error = %e,
                        "pdf text: page failed to decode, skipping"
                    );
                }
            }
        }

        Ok(vec![Segment {
            producer_name: self.producer_name(),
            producer_kind: ProducerKind::Body,
            text,
        }])
    }
}
