//! `FileRouter` — pure, I/O-free (besides the caller's own `stat`) extension
//! classification.
//!
//! Grounded on the teacher's extension-sniffing idiom in
//! `scan/filters/directory/*` (`is_binary_file_by_extension`), generalized
//! from a binary/text boolean into the five-way `MediaClass` split §4.2
//! needs.

use std::path::Path;

use crate::model::{MediaClass, MetadataKind};

const METADATA_CAPABLE: &[&str] = &[
    "docx", "doc", "xlsx", "xls", "pptx", "ppt", "odt", "ods", "odp", "pdf", "jpg", "jpeg", "png",
    "gif", "tiff", "tif", "bmp", "webp", "heic", "heif", "raw", "cr2", "nef", "arw", "mp4", "mov",
    "avi", "mkv", "wmv", "flv", "webm", "m4v", "3gp", "ogv", "mp3", "flac", "wav", "ogg", "m4a",
    "aac", "wma", "opus",
];

const PLAIN_TEXT: &[&str] = &[
    "txt", "md", "log", "csv", "json", "xml", "yaml", "yml", "ini", "conf", "cfg", "js", "py",
    "go", "java", "c", "cpp", "h", "sh", "bat", "ps1", "html", "css",
];

const OFFICE: &[&str] = &["docx", "doc", "xlsx", "xls", "pptx", "ppt", "odt", "ods", "odp"];

const IMAGE: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "tiff", "tif", "bmp", "webp", "heic", "heif", "raw", "cr2",
    "nef", "arw",
];

const VIDEO: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "wmv", "flv", "webm", "m4v", "3gp", "ogv",
];

const AUDIO: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "wma", "opus"];

/// Stateless extension classifier, shared read-only by every worker.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileRouter;

impl FileRouter {
    pub fn new() -> Self {
        Self
    }

    fn extension(path: &Path) -> Option<String> {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    pub fn classify(&self, path: &Path) -> MediaClass {
        let Some(ext) = Self::extension(path) else {
            return MediaClass::Unsupported;
        };
        let ext = ext.as_str();
        if ext == "pdf" {
            MediaClass::Pdf
        } else if OFFICE.contains(&ext) {
            MediaClass::Office
        } else if IMAGE.contains(&ext) {
            MediaClass::Image
        } else if VIDEO.contains(&ext) {
            MediaClass::Video
        } else if AUDIO.contains(&ext) {
            MediaClass::Audio
        } else if PLAIN_TEXT.contains(&ext) {
            MediaClass::PlainText
        } else {
            MediaClass::Unsupported
        }
    }

    /// True exactly for the enumerated metadata-capable extension set.
    pub fn can_contain_metadata(&self, path: &Path) -> bool {
        Self::extension(path)
            .map(|ext| METADATA_CAPABLE.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    pub fn metadata_type(&self, path: &Path) -> Option<MetadataKind> {
        if !self.can_contain_metadata(path) {
            return None;
        }
        match self.classify(path) {
            MediaClass::Image => Some(MetadataKind::Image),
            MediaClass::Video => Some(MetadataKind::Video),
            MediaClass::Audio => Some(MetadataKind::Audio),
            MediaClass::Office | MediaClass::Pdf => Some(MetadataKind::Document),
            _ => None,
        }
    }

    /// True for extensions the orchestrator recognizes at all — either a
    /// plain-text format or one of the metadata-capable formats. Anything
    /// else is skipped with reason `unsupported_format`.
    pub fn is_supported(&self, path: &Path) -> bool {
        !matches!(self.classify(path), MediaClass::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn p(name: &str) -> PathBuf {
        PathBuf::from(name)
    }

    #[test]
    fn classifies_plain_text() {
        let router = FileRouter::new();
        assert_eq!(router.classify(&p("a.py")), MediaClass::PlainText);
        assert!(!router.can_contain_metadata(&p("a.py")));
        assert_eq!(router.metadata_type(&p("a.py")), None);
    }

    #[test]
    fn classifies_office_and_metadata() {
        let router = FileRouter::new();
        assert_eq!(router.classify(&p("report.docx")), MediaClass::Office);
        assert!(router.can_contain_metadata(&p("report.docx")));
        assert_eq!(
            router.metadata_type(&p("report.docx")),
            Some(MetadataKind::Document)
        );
    }

    #[test]
    fn classifies_image() {
        let router = FileRouter::new();
        assert_eq!(router.classify(&p("photo.JPG")), MediaClass::Image);
        assert_eq!(
            router.metadata_type(&p("photo.JPG")),
            Some(MetadataKind::Image)
        );
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let router = FileRouter::new();
        assert_eq!(router.classify(&p("binary.exe")), MediaClass::Unsupported);
        assert!(!router.is_supported(&p("binary.exe")));
    }
}
