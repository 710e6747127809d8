use std::path::Path;

use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::Accessor;

use super::{Preprocessor, check_size, fields_to_text};
use crate::error::{FerretError, Result};
use crate::model::{MediaClass, ProducerKind, Segment};

const MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Container tags: artist/performer/composer, album artist, publisher,
/// label, and any free-text comment field (where GPS coordinates, booking
/// contacts, or social handles sometimes get embedded). Metadata only.
pub struct AudioMetadataPreprocessor;

impl Preprocessor for AudioMetadataPreprocessor {
    fn producer_name(&self) -> &'static str {
        "audio_metadata"
    }

    fn supports(&self, media_class: MediaClass) -> bool {
        matches!(media_class, MediaClass::Audio)
    }

    fn process(&self, path: &Path) -> Result<Vec<Segment>> {
        check_size(path, MAX_FILE_BYTES)?;

        let tagged = Probe::open(path)
            .map_err(|e| FerretError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: format!("probe failed: {e}"),
            })?
            .read()
            .map_err(|e| FerretError::PreprocessFailed {
                path: path.to_path_buf(),
                reason: format!("corrupt audio container: {e}"),
            })?;

        let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
            return Err(FerretError::PreprocessFailed {
                path: path.to_path_buf(),
                reason: "no tag block present".to_string(),
            });
        };

        let mut fields = Vec::new();
        push_if_present(&mut fields, "artist", tag.artist());
        push_if_present(&mut fields, "albumartist", tag.album());
        push_if_present(&mut fields, "composer", tag.get_string(&lofty::tag::ItemKey::Composer));
        push_if_present(&mut fields, "publisher", tag.get_string(&lofty::tag::ItemKey::Publisher));
        push_if_present(&mut fields, "comment", tag.comment());

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

fn push_if_present(
    fields: &mut Vec<(String, String)>,
    name: &str,
    value: Option<impl AsRef<str>>,
) {
    if let Some(v) = value {
        let v = v.as_ref();
        if !v.trim().is_empty() {
            fields.push((name.to_string(), v.to_string()));
        }
    }
}
