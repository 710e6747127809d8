use std::path::Path;

use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::Accessor;

use super::{Preprocessor, check_size, fields_to_text};
use crate::error::{FerretError, Result};
use crate::model::{MediaClass, ProducerKind, Segment};

const MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Container tags (GPS, device, recording credits). `lofty`'s container
/// support covers the MPEG-4 family (`mp4`, `m4v`, `3gp`) well; the other
/// video extensions `FileRouter` accepts (`mkv`, `avi`, `wmv`, `flv`,
/// `webm`, `ogv`) have no tag reader in this crate's stack and degrade to
/// `unsupported_format` rather than guessing at a container layout.
pub struct VideoMetadataPreprocessor;

const MP4_FAMILY: &[&str] = &["mp4", "m4v", "3gp"];

impl Preprocessor for VideoMetadataPreprocessor {
    fn producer_name(&self) -> &'static str {
        "video_metadata"
    }

    fn supports(&self, media_class: MediaClass) -> bool {
        matches!(media_class, MediaClass::Video)
    }

    fn process(&self, path: &Path) -> Result<Vec<Segment>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !MP4_FAMILY.contains(&ext.as_str()) {
            return Err(FerretError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: format!("no tag reader for video container `.{ext}`"),
            });
        }

        check_size(path, MAX_FILE_BYTES)?;

        let tagged = Probe::open(path)
            .map_err(|e| FerretError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: format!("probe failed: {e}"),
            })?
            .read()
            .map_err(|e| FerretError::PreprocessFailed {
                path: path.to_path_buf(),
                reason: format!("corrupt video container: {e}"),
            })?;

        let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
            return Err(FerretError::PreprocessFailed {
                path: path.to_path_buf(),
                reason: "no tag block present".to_string(),
            });
        };

        let mut fields = Vec::new();
        if let Some(v) = tag.artist() {
            if !v.trim().is_empty() {
                fields.push(("recorded_by".to_string(), v.to_string()));
            }
        }
        if let Some(v) = tag.get_string(&lofty::tag::ItemKey::Composer) {
            if !v.trim().is_empty() {
                fields.push(("director".to_string(), v.to_string()));
            }
        }
        if let Some(v) = tag.comment() {
            if !v.trim().is_empty() {
                fields.push(("comment".to_string(), v.to_string()));
            }
        }

        if fields.is_empty() {
            return Err(FerretError::PreprocessFailed {
                path: path.to_path_buf(),
                reason: "tag block present but no recognized fields".to_string(),
            });
        }

        Ok(vec![Segment {
            producer_name: self.producer_name(),
            producer_kind: ProducerKind::Metadata,
            text: fields_to_text(&fields),
        }])
    }
}
