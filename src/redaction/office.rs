//! Office-container redaction: rewrite the zip container, replacing
//! matching text inside the same XML parts `OfficeTextPreprocessor` reads
//! from (and `xl/sharedStrings.xml` for xlsx). New module; the
//! part-selection logic mirrors `preprocess::office_text` so detection and
//! redaction agree on what counts as "the document's text".
//!
//! Unlike textual redaction, a finding's byte offset here is relative to
//! the *concatenated* extracted text, not to a position inside any single
//! zip member — so this operates by literal substring search-and-replace
//! of `matched_text` within each candidate part instead of by offset.

use std::io::{Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{FerretError, Result};
use crate::model::RedactionEdit;

fn text_part_names(ext: &str, archive: &mut ZipArchive<std::fs::File>) -> Vec<String> {
    (0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
        .filter(|name| match ext {
            "docx" => name == "word/document.xml",
            "pptx" => name.starts_with("ppt/slides") && name.ends_with(".xml"),
            "xlsx" => {
                (name.starts_with("xl/worksheets") && name.ends_with(".xml"))
                    || name == "xl/sharedStrings.xml"
            }
            _ => false,
        })
        .collect()
}

pub fn redact_file(path: &Path, output_path: &Path, edits: &[RedactionEdit]) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let input = std::fs::File::open(path).map_err(|source| FerretError::Io { path: path.to_path_buf(), source })?;
    let mut archive = ZipArchive::new(input).map_err(|e| FerretError::RedactionUnsupported {
        path: path.to_path_buf(),
        reason: format!("corrupt zip container: {e}"),
    })?;

    let redactable_parts = text_part_names(&ext, &mut archive);

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| FerretError::Io { path: parent.to_path_buf(), source })?;
    }
    let output_file = std::fs::File::create(output_path)
        .map_err(|source| FerretError::Io { path: output_path.to_path_buf(), source })?;
    let mut writer = ZipWriter::new(output_file);

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| FerretError::RedactionUnsupported { path: path.to_path_buf(), reason: e.to_string() })?;
        let name = entry.name().to_string();
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        writer
            .start_file(&name, options)
            .map_err(|e| FerretError::RedactionUnsupported { path: path.to_path_buf(), reason: e.to_string() })?;

        if redactable_parts.contains(&name) {
            let mut xml = String::new();
            entry
                .read_to_string(&mut xml)
                .map_err(|source| FerretError::Io { path: path.to_path_buf(), source })?;
            for edit in edits {
                if edit.matched_text.is_empty() {
                    continue;
                }
                xml = xml.replace(&edit.matched_text, &edit.replacement);
            }
            writer
                .write_all(xml.as_bytes())
                .map_err(|source| FerretError::Io { path: output_path.to_path_buf(), source })?;
        } else {
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|source| FerretError::Io { path: path.to_path_buf(), source })?;
            writer
                .write_all(&bytes)
                .map_err(|source| FerretError::Io { path: output_path.to_path_buf(), source })?;
        }
    }

    writer
        .finish()
        .map_err(|e| FerretError::RedactionUnsupported { path: path.to_path_buf(), reason: e.to_string() })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;
    use std::io::Cursor;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn build_docx(path: &Path, body_xml: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(body_xml.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    fn edit(matched: &str, replacement: &str) -> RedactionEdit {
        RedactionEdit {
            coordinate: Coordinate { byte_start: 0, byte_end: 0, line: 1, column: 0 },
            matched_text: matched.to_string(),
            replacement: replacement.to_string(),
            validator_id: "SSN",
        }
    }

    #[test]
    fn replaces_matching_text_in_document_xml() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.docx");
        let output = dir.path().join("out/a.docx");
        build_docx(&input, "<w:document><w:body><w:t>ssn 123-45-6789</w:t></w:body></w:document>");

        redact_file(&input, &output, &[edit("123-45-6789", "[SSN-REDACTED]")]).unwrap();

        let out_file = std::fs::File::open(&output).unwrap();
        let mut archive = ZipArchive::new(out_file).unwrap();
        let mut content = String::new();
        archive.by_name("word/document.xml").unwrap().read_to_string(&mut content).unwrap();
        assert!(!content.contains("123-45-6789"));
        assert!(content.contains("[SSN-REDACTED]"));
    }

    #[test]
    fn reopenable_as_valid_zip_after_redaction() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.docx");
        let output = dir.path().join("a-out.docx");
        build_docx(&input, "<w:document><w:body><w:t>nothing sensitive</w:t></w:body></w:document>");

        redact_file(&input, &output, &[]).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes));
        assert!(archive.is_ok());
    }
}
