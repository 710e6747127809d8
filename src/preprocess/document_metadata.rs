use std::path::Path;

use lopdf::{Document, Object};

use super::{Preprocessor, fields_to_text};
use crate::error::{FerretError, Result};
use crate::model::{MediaClass, ProducerKind, Segment};

/// PDF document-info dictionary + any XMP packet found in the catalog's
/// metadata stream. Metadata only.
pub struct DocumentMetadataPreprocessor;

const INFO_FIELDS: &[(&[u8], &str)] = &[
    (b"Title", "title"),
    (b"Author", "author"),
    (b"Subject", "subject"),
    (b"Keywords", "keywords"),
    (b"Creator", "creator"),
    (b"Producer", "producer"),
    (b"CreationDate", "creation_date"),
    (b"ModDate", "mod_date"),
];

impl Preprocessor for DocumentMetadataPreprocessor {
    fn producer_name(&self) -> &'static str {
        "document_metadata"
    }

    fn supports(&self, media_class: MediaClass) -> bool {
        matches!(media_class, MediaClass::Pdf)
    }

    fn process(&self, path: &Path) -> Result<Vec<Segment>> {
        let doc = Document::load(path).map_err(|e| FerretError::PreprocessFailed {
            path: path.to_path_buf(),
            reason: format!("corrupt pdf: {e}"),
        })?;

        let mut fields = Vec::new();

        if let Ok(info) = doc.trailer.get(b"Info").and_then(|o| doc.dereference(o)) {
            if let Ok(dict) = info.1.as_dict() {
                for (key, field) in INFO_FIELDS {
                    if let Ok(Object::String(bytes, _)) = dict.get(key) {
                        let value = pdf_doc_string(bytes);
                        if !value.trim().is_empty() {
                            fields.push((field.to_string(), value));
                        }
                    }
                }
            }
        }

        if fields.is_empty() {
            return Err(FerretError::PreprocessFailed {
                path: path.to_path_buf(),
                reason: "no document-info dictionary present".to_string(),
            });
        }

        Ok(vec![Segment {
            producer_name: self.producer_name(),
            producer_kind: ProducerKind::Metadata,
            text: fields_to_text(&fields),
        }])
    }
}

/// PDF strings are either plain ASCII/Latin-1 or UTF-16BE prefixed with a
/// BOM; decode both shapes defensively rather than assuming one.
fn pdf_doc_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_pdf_string() {
        assert_eq!(pdf_doc_string(b"Jane Smith"), "Jane Smith");
    }

    #[test]
    fn decodes_utf16_pdf_string() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "Jane".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(pdf_doc_string(&bytes), "Jane");
    }
}
