//! `ContentRouter` — splits a `ProcessedContent` blob back into
//! `{document_body, metadata[]}` using the `\n\n--- <producer_name> ---\n`
//! wire contract between preprocessors and this module (spec §4.4, §6).
//!
//! New module; the split/fallback shape follows the teacher's
//! parse-with-default idiom (`scan/pattern.rs`'s YAML load falling back to
//! embedded defaults on error) generalized from "parse failed, use
//! defaults" to "markers not found, treat the whole blob as body".

use crate::model::{MetadataContent, MetadataKind, ProcessedContent, RoutedContent};
use crate::router::FileRouter;

/// The exact separator preprocessors must embed between segments. Changing
/// this string is a breaking wire-level change per spec §6.
pub fn segment_marker(producer_name: &str) -> String {
    format!("\n\n--- {producer_name} ---\n")
}

/// Maps a preprocessor's stable name to the metadata kind the METADATA
/// validator's boost table keys on. Body-only producers (plain text,
/// office/pdf text extraction) are absent here — their segments always
/// join into `document_body`.
fn producer_metadata_kind(producer_name: &str) -> Option<MetadataKind> {
    match producer_name {
        "image_metadata" => Some(MetadataKind::Image),
        "office_metadata" | "document_metadata" => Some(MetadataKind::Document),
        "audio_metadata" => Some(MetadataKind::Audio),
        "video_metadata" => Some(MetadataKind::Video),
        _ => None,
    }
}

/// Every producer name a real preprocessor (`preprocess/mod.rs`'s registry)
/// may legitimately emit. A `--- <name> ---` header whose name isn't in
/// this set didn't come from one of our own preprocessors — it is either
/// user content that happens to look like a marker, or a corrupted wire
/// segment — and `split` treats it as a sign of malformed structure rather
/// than guessing at the author's intent.
const KNOWN_PRODUCER_NAMES: &[&str] = &[
    "plain_text",
    "office_text",
    "pdf_text",
    "image_metadata",
    "office_metadata",
    "document_metadata",
    "audio_metadata",
    "video_metadata",
];

pub struct ContentRouter {
    file_router: FileRouter,
}

impl ContentRouter {
    pub fn new(file_router: FileRouter) -> Self {
        Self { file_router }
    }

    pub fn route(&self, processed: &ProcessedContent) -> RoutedContent {
        if !self.file_router.can_contain_metadata(&processed.path) {
            return RoutedContent {
                body: processed.text.clone(),
                metadata: Vec::new(),
                malformed_fallback: false,
            };
        }

        match self.split(&processed.text) {
            Some(routed) => routed,
            None => {
                tracing::warn!(
                    path = %processed.path.display(),
                    "content router: malformed segment structure, falling back to whole-body treatment"
                );
                RoutedContent {
                    body: processed.text.clone(),
                    metadata: Vec::new(),
                    malformed_fallback: true,
                }
            }
        }
    }

    /// Scans `text` for header lines of the form `--- <name> ---` (preceded
    /// by the blank-line marker) and buckets each following block into body
    /// or metadata. Returns `None` when a header names a producer outside
    /// `KNOWN_PRODUCER_NAMES` — that marker did not come from our own
    /// preprocessors, so the whole structure is treated as unparseable
    /// rather than silently accepting an attacker- or accident-controlled
    /// segment boundary.
    fn split(&self, text: &str) -> Option<RoutedContent> {
        let mut body = String::new();
        let mut metadata = Vec::new();
        let mut rest = text;
        let mut first = true;

        loop {
            let Some(header_start) = rest.find("\n\n--- ") else {
                Self::append_block(&mut body, &mut metadata, None, rest, first);
                break;
            };

            let (before, after_marker_start) = rest.split_at(header_start);
            Self::append_block(&mut body, &mut metadata, None, before, first);
            first = false;

            let after_open = &after_marker_start[2..]; // skip the blank-line newlines
            let Some(close_idx) = after_open.find(" ---\n") else {
                // Header started but never closed: not a real marker, keep
                // the raw text (including the partial "--- ") as body.
                body.push_str(after_marker_start);
                break;
            };
            let name = &after_open[4..close_idx]; // strip leading "--- "
            if !KNOWN_PRODUCER_NAMES.contains(&name) {
                return None;
            }
            let body_start = close_idx + " ---\n".len();
            let producer_kind = producer_metadata_kind(name);
            rest = &after_open[body_start..];

            // Find the next marker to know where this block ends.
            let next_marker = rest.find("\n\n--- ");
            let (block, remainder) = match next_marker {
                Some(idx) => (&rest[..idx], &rest[idx..]),
                None => (rest, ""),
            };

            Self::append_block(&mut body, &mut metadata, producer_kind, block, false);

            if remainder.is_empty() {
                break;
            }
            rest = remainder;
        }

        Some(RoutedContent {
            body,
            metadata,
            malformed_fallback: false,
        })
    }

    fn append_block(
        body: &mut String,
        metadata: &mut Vec<MetadataContent>,
        kind: Option<MetadataKind>,
        block: &str,
        is_first: bool,
    ) {
        if block.is_empty() {
            return;
        }
        match kind {
            None => {
                if !is_first && !body.is_empty() {
                    body.push_str("\n\n");
                }
                body.push_str(block);
            }
            Some(kind) => {
                let fields = block
                    .lines()
                    .filter_map(|line| line.split_once(": "))
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                metadata.push(MetadataContent { fields, kind: Some(kind) });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Segment;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn processed(path: &str, segments: Vec<Segment>) -> ProcessedContent {
        ProcessedContent::from_segments(Arc::new(PathBuf::from(path)), segments)
    }

    #[test]
    fn plain_text_never_produces_metadata() {
        let router = ContentRouter::new(FileRouter::new());
        let content = processed(
            "a.py",
            vec![Segment {
                producer_name: "plain_text",
                producer_kind: crate::model::ProducerKind::Body,
                text: "Author: John Doe".to_string(),
            }],
        );
        let routed = router.route(&content);
        assert!(routed.metadata.is_empty());
        assert_eq!(routed.body, "Author: John Doe");
    }

    #[test]
    fn office_file_splits_body_and_metadata() {
        let router = ContentRouter::new(FileRouter::new());
        let content = processed(
            "report.docx",
            vec![
                Segment {
                    producer_name: "office_text",
                    producer_kind: crate::model::ProducerKind::Body,
                    text: "Quarterly results look strong.".to_string(),
                },
                Segment {
                    producer_name: "office_metadata",
                    producer_kind: crate::model::ProducerKind::Metadata,
                    text: "author: Jane Smith\nmanager: Bob".to_string(),
                },
            ],
        );
        let routed = router.route(&content);
        assert_eq!(routed.metadata.len(), 1);
        assert_eq!(routed.metadata[0].kind, Some(MetadataKind::Document));
        assert!(routed.body.contains("Quarterly"));
        assert!(!routed.body.contains("manager"));
    }

    #[test]
    fn marker_inside_user_content_degrades_gracefully() {
        let router = ContentRouter::new(FileRouter::new());
        let content = processed(
            "weird.pdf",
            vec![Segment {
                producer_name: "pdf_text",
                producer_kind: crate::model::ProducerKind::Body,
                text: "normal text\n\n--- not-a-real-producer ---\nmore text".to_string(),
            }],
        );
        let routed = router.route(&content);
        // Unknown producer name: whole blob degrades to body, not dropped.
        assert!(routed.body.contains("normal text"));
        assert!(routed.body.contains("more text"));
        assert!(routed.metadata.is_empty());
        assert!(routed.malformed_fallback);
    }
}
