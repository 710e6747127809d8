use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use zip::ZipArchive;

use super::{Preprocessor, check_size};
use crate::error::{FerretError, Result};
use crate::model::{MediaClass, ProducerKind, Segment};

const MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Extracts visible text from zipped XML office containers (docx/xlsx/pptx;
/// the legacy `.doc/.xls/.ppt` binary formats and ODF siblings are accepted
/// by `FileRouter` but this extractor only has a real implementation for
/// the OOXML family — legacy formats degrade to `unsupported_format`).
/// Body only.
pub struct OfficeTextPreprocessor;

impl Preprocessor for OfficeTextPreprocessor {
    fn producer_name(&self) -> &'static str {
        "office_text"
    }

    fn supports(&self, media_class: MediaClass) -> bool {
        matches!(media_class, MediaClass::Office)
    }

    fn process(&self, path: &Path) -> Result<Vec<Segment>> {
        check_size(path, MAX_FILE_BYTES)?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let entry_name = match ext.as_str() {
            "docx" => "word/document.xml",
            "pptx" => "ppt/slides",
            "xlsx" => "xl/worksheets",
            _ => {
                return Err(FerretError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    reason: format!("legacy binary office format `.{ext}` has no text extractor"),
                });
            }
        };

        let file = std::fs::File::open(path).map_err(|source| FerretError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = ZipArchive::new(file).map_err(|e| FerretError::PreprocessFailed {
            path: path.to_path_buf(),
            reason: format!("corrupt zip container: {e}"),
        })?;

        let mut text = String::new();
        let text_tag: &[&str] = match ext.as_str() {
            "docx" => &["w:t"],
            "pptx" => &["a:t"],
            "xlsx" => &["t"], // shared strings / inline strings
            _ => &[],
        };

        // xlsx keeps cell text in xl/sharedStrings.xml, referenced by index
        // from the worksheet XML; extracting sharedStrings directly still
        // yields every distinct string value present in the workbook, which
        // is sufficient for content scanning even without resolving each
        // cell's index back to a specific sheet position.
        let candidate_names: Vec<String> = (0..archive.len())
            .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
            .filter(|name| match ext.as_str() {
                "docx" => name == entry_name,
                "pptx" => name.starts_with(entry_name) && name.ends_with(".xml"),
                "xlsx" => {
                    name.starts_with(entry_name) && name.ends_with(".xml")
                        || name == "xl/sharedStrings.xml"
                }
                _ => false,
            })
            .collect();

        if candidate_names.is_empty() {
            return Err(FerretError::PreprocessFailed {
                path: path.to_path_buf(),
                reason: "no document XML parts found in container".to_string(),
            });
        }

        for name in candidate_names {
            let mut entry = archive
                .by_name(&name)
                .map_err(|e| FerretError::PreprocessFailed {
                    path: path.to_path_buf(),
                    reason: format!("missing part `{name}`: {e}"),
                })?;
            let mut xml = String::new();
            entry
                .read_to_string(&mut xml)
                .map_err(|source| FerretError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            extract_tagged_text(&xml, text_tag, &mut text);
        }

        Ok(vec![Segment {
            producer_name: self.producer_name(),
            producer_kind: ProducerKind::Body,
            text,
        }])
    }
}

/// Walks an XML part collecting text nodes whose immediately enclosing tag
/// (local name, namespace prefix ignored) is in `tags`.
fn extract_tagged_text(xml: &str, tags: &[&str], out: &mut String) {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut in_target = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                in_target = tags.contains(&local);
            }
            Ok(Event::Empty(_)) => {
                in_target = false;
            }
            Ok(Event::Text(t)) => {
                if in_target {
                    if let Ok(text) = t.decode() {
                        if !out.is_empty() {
                            out.push(' ');
                        }
                        out.push_str(text.as_ref());
                    }
                }
            }
            Ok(Event::End(_)) => {
                in_target = false;
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
}

fn local_name(qname: &[u8]) -> &str {
    let s = std::str::from_utf8(qname).unwrap_or("");
    s.rsplit(':').next().unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_word_text_nodes() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t>world</w:t></w:r></w:p></w:body></w:document>"#;
        let mut out = String::new();
        extract_tagged_text(xml, &["w:t"], &mut out);
        assert_eq!(out, "Hello world");
    }

    #[test]
    fn ignores_non_target_tags() {
        let xml = r#"<root><w:t>kept</w:t><other>dropped</other></root>"#;
        let mut out = String::new();
        extract_tagged_text(xml, &["w:t"], &mut out);
        assert_eq!(out, "kept");
    }
}
