use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use zip::ZipArchive;

use super::{Preprocessor, fields_to_text};
use crate::error::{FerretError, Result};
use crate::model::{MediaClass, ProducerKind, Segment};

/// Core/app properties (`docProps/core.xml`, `docProps/app.xml`):
/// `author`, `lastModifiedBy`, `manager`, `comments`, `company`, `keywords`,
/// `description`, `copyright`. Metadata only.
pub struct OfficeMetadataPreprocessor;

const CORE_TAGS: &[(&str, &str)] = &[
    ("dc:creator", "author"),
    ("cp:lastModifiedBy", "lastmodifiedby"),
    ("dc:description", "description"),
    ("cp:keywords", "keywords"),
    ("dc:subject", "subject"),
    ("cp:category", "category"),
    ("dc:title", "title"),
    ("cp:contentStatus", "comments"),
];

const APP_TAGS: &[(&str, &str)] = &[
    ("Company", "company"),
    ("Manager", "manager"),
    ("HyperlinkBase", "hyperlink_base"),
];

impl Preprocessor for OfficeMetadataPreprocessor {
    fn producer_name(&self) -> &'static str {
        "office_metadata"
    }

    fn supports(&self, media_class: MediaClass) -> bool {
        matches!(media_class, MediaClass::Office)
    }

    fn process(&self, path: &Path) -> Result<Vec<Segment>> {
        let file = std::fs::File::open(path).map_err(|source| FerretError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = ZipArchive::new(file).map_err(|e| FerretError::PreprocessFailed {
            path: path.to_path_buf(),
            reason: format!("corrupt zip container: {e}"),
        })?;

        let mut fields = Vec::new();
        read_part_fields(&mut archive, "docProps/core.xml", CORE_TAGS, &mut fields);
        read_part_fields(&mut archive, "docProps/app.xml", APP_TAGS, &mut fields);

        if fields.is_empty() {
            return Err(FerretError::PreprocessFailed {
                path: path.to_path_buf(),
                reason: "no docProps metadata parts found".to_string(),
            });
        }

        Ok(vec![Segment {
            producer_name: self.producer_name(),
            producer_kind: ProducerKind::Metadata,
            text: fields_to_text(&fields),
        }])
    }
}

fn read_part_fields(
    archive: &mut ZipArchive<std::fs::File>,
    part_name: &str,
    tags: &[(&str, &str)],
    out: &mut Vec<(String, String)>,
) {
    let Ok(mut entry) = archive.by_name(part_name) else {
        return;
    };
    let mut xml = String::new();
    if entry.read_to_string(&mut xml).is_err() {
        return;
    }
    drop(entry);

    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);
    let mut current_field: Option<&'static str> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name_bytes = e.name();
                let name = std::str::from_utf8(name_bytes.as_ref()).unwrap_or("");
                current_field = tags
                    .iter()
                    .find(|(tag, _)| *tag == name)
                    .map(|(_, field)| *field);
            }
            Ok(Event::Text(t)) => {
                if let Some(field) = current_field {
                    if let Ok(text) = t.decode() {
                        if !text.trim().is_empty() {
                            out.push((field.to_string(), text.trim().to_string()));
                        }
                    }
                }
            }
            Ok(Event::End(_)) => current_field = None,
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_core_properties() {
        let xml = r#"<cp:coreProperties xmlns:dc="x" xmlns:cp="y">
            <dc:creator>Jane Smith</dc:creator>
            <cp:lastModifiedBy>Bob Jones</cp:lastModifiedBy>
        </cp:coreProperties>"#;
        let mut out = Vec::new();
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut current_field = None;
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name = std::str::from_utf8(e.name().as_ref()).unwrap();
                    current_field = CORE_TAGS.iter().find(|(t, _)| *t == name).map(|(_, f)| *f);
                }
                Ok(Event::Text(t)) => {
                    if let Some(f) = current_field {
                        out.push((f.to_string(), t.decode().unwrap().trim().to_string()));
                    }
                }
                Ok(Event::End(_)) => current_field = None,
                Ok(Event::Eof) => break,
                _ => {}
            }
            buf.clear();
        }
        assert_eq!(out[0], ("author".to_string(), "Jane Smith".to_string()));
        assert_eq!(
            out[1],
            ("lastmodifiedby".to_string(), "Bob Jones".to_string())
        );
    }
}
