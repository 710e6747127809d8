//! Preprocessor set — per-media-class textual body and/or structured
//! metadata extraction (spec §4.3).
//!
//! The `Preprocessor` trait and registry are new (the teacher has no
//! preprocessing layer; it scans source files directly). The body/metadata
//! segment split follows the data shape of the teacher's `scan::data`
//! structs — small owned structs, no behavior on the data itself — and the
//! per-file-kind dispatch mirrors `FileRouter::classify` plus
//! `scan/filters/directory`'s extension-driven branching.

mod audio_metadata;
mod document_metadata;
mod image_metadata;
mod office_metadata;
mod office_text;
mod pdf_text;
mod plain_text;
mod video_metadata;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{FerretError, Result};
use crate::model::{MediaClass, ProcessedContent, Segment};
use crate::router::FileRouter;

/// Outcome of a cancellation-aware preprocessor pass (spec.md §5:
/// cancellation must be "checked... between preprocessors").
pub enum PreprocessOutcome {
    Ok(ProcessedContent),
    Failed(Vec<FerretError>),
    Cancelled,
}

pub use audio_metadata::AudioMetadataPreprocessor;
pub use document_metadata::DocumentMetadataPreprocessor;
pub use image_metadata::ImageMetadataPreprocessor;
pub use office_metadata::OfficeMetadataPreprocessor;
pub use office_text::OfficeTextPreprocessor;
pub use pdf_text::PdfTextPreprocessor;
pub use plain_text::PlainTextPreprocessor;
pub use video_metadata::VideoMetadataPreprocessor;

/// One producer of `ProcessedContent` segments for a given media class.
/// A file may be handed to several preprocessors in sequence (e.g. a PDF
/// gets both `PdfTextPreprocessor` and `DocumentMetadataPreprocessor`); the
/// registry merges their segments into one `ProcessedContent` before
/// `ContentRouter` ever sees it.
pub trait Preprocessor: Send + Sync {
    fn producer_name(&self) -> &'static str;
    fn supports(&self, media_class: MediaClass) -> bool;
    fn process(&self, path: &Path) -> Result<Vec<Segment>>;
}

/// Registry of all CORE-required preprocessors, consulted by the
/// orchestrator once per file.
pub struct PreprocessorRegistry {
    preprocessors: Vec<Box<dyn Preprocessor>>,
}

impl Default for PreprocessorRegistry {
    fn default() -> Self {
        Self {
            preprocessors: vec![
                Box::new(PlainTextPreprocessor),
                Box::new(OfficeTextPreprocessor),
                Box::new(PdfTextPreprocessor),
                Box::new(ImageMetadataPreprocessor),
                Box::new(OfficeMetadataPreprocessor),
                Box::new(DocumentMetadataPreprocessor),
                Box::new(AudioMetadataPreprocessor),
                Box::new(VideoMetadataPreprocessor),
            ],
        }
    }
}

impl PreprocessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every preprocessor that claims this media class, merging their
    /// segments in registration order (body producers first by
    /// construction above, so `ProcessedContent.text`'s first segment is
    /// always body text when one exists).
    ///
    /// Per spec §4.1/§4.3: a preprocessor failure is contained here and
    /// reported to the caller rather than aborting the file; if *every*
    /// applicable preprocessor fails, the caller falls back to raw-text
    /// validation (textual files) or skips with `preprocess_failed`.
    pub fn process(
        &self,
        path: &Path,
        media_class: MediaClass,
    ) -> std::result::Result<ProcessedContent, Vec<FerretError>> {
        let mut segments = Vec::new();
        let mut errors = Vec::new();

        for preprocessor in &self.preprocessors {
            if !preprocessor.supports(media_class) {
                continue;
            }
            match preprocessor.process(path) {
                Ok(mut segs) => segments.append(&mut segs),
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        producer = preprocessor.producer_name(),
                        error = %e,
                        "preprocessor failed for file, continuing with remaining producers"
                    );
                    errors.push(e);
                }
            }
        }

        if segments.is_empty() {
            return Err(errors);
        }

        Ok(ProcessedContent::from_segments(
            Arc::new(path.to_path_buf()),
            segments,
        ))
    }

    /// Same merge as `process`, but checks `cancel` before invoking each
    /// applicable preprocessor so a flip mid-file stops further producers
    /// from running instead of waiting for the whole file to finish (spec
    /// §5's "checked... between preprocessors"). A cancellation observed
    /// here discards whatever segments earlier producers already collected
    /// for this file, since a cancelled file must never be reported as
    /// partially scanned.
    pub fn process_cancellable(
        &self,
        path: &Path,
        media_class: MediaClass,
        cancel: &AtomicBool,
    ) -> PreprocessOutcome {
        let mut segments = Vec::new();
        let mut errors = Vec::new();

        for preprocessor in &self.preprocessors {
            if !preprocessor.supports(media_class) {
                continue;
            }
            if cancel.load(Ordering::Relaxed) {
                tracing::debug!(path = %path.display(), "cancellation observed between preprocessors");
                return PreprocessOutcome::Cancelled;
            }
            match preprocessor.process(path) {
                Ok(mut segs) => segments.append(&mut segs),
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        producer = preprocessor.producer_name(),
                        error = %e,
                        "preprocessor failed for file, continuing with remaining producers"
                    );
                    errors.push(e);
                }
            }
        }

        if segments.is_empty() {
            return PreprocessOutcome::Failed(errors);
        }

        PreprocessOutcome::Ok(ProcessedContent::from_segments(
            Arc::new(path.to_path_buf()),
            segments,
        ))
    }
}

/// Shared helper: most preprocessors need a size guard (spec §6, 100 MiB
/// hard cap; images additionally capped at 10 MiB).
pub(crate) fn check_size(path: &Path, limit_bytes: u64) -> Result<u64> {
    let meta = std::fs::metadata(path).map_err(|source| FerretError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if meta.len() > limit_bytes {
        return Err(FerretError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: "too_large".to_string(),
        });
    }
    Ok(meta.len())
}

/// Turns a field list into the `key: value` line format spec §4.3 mandates
/// for metadata segments.
pub(crate) fn fields_to_text(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn router() -> FileRouter {
    FileRouter::new()
}
