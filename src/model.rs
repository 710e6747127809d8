//! Core data model shared by every subsystem.
//!
//! Shapes follow the teacher's `scan::data` module (`SecretMatch`,
//! `FileResult`, `ScanResult`, `Coordinate`): plain structs with small,
//! cheaply-cloned fields (`Arc<str>` for repeated path/type strings),
//! constructors instead of raw struct literals scattered through call
//! sites, and no behavior baked into the data itself.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A byte-range position inside a file's extracted text, with a cached
/// line/column for display. Mirrors the teacher's packed `Coordinate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate {
    pub byte_start: u64,
    pub byte_end: u64,
    pub line: u32,
    pub column: u32,
}

/// The five media classes `FileRouter` sorts files into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaClass {
    PlainText,
    Office,
    Pdf,
    Image,
    Document,
    Video,
    Audio,
    Unsupported,
}

/// A discovered file queued for processing.
#[derive(Debug, Clone)]
pub struct File {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub media_class: MediaClass,
}

/// One preprocessor's contribution to a file's extracted text, before the
/// `ContentRouter` splits it back apart. `producer_kind` records whether the
/// segment is expected to carry document body text or structured metadata,
/// so the router can fall back sanely if the marker search comes up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerKind {
    Body,
    Metadata,
}

#[derive(Debug, Clone)]
pub struct Segment {
    pub producer_name: &'static str,
    pub producer_kind: ProducerKind,
    pub text: String,
}

/// Text extracted from a file, with its provenance segments intact.
///
/// `text` is the full concatenation preprocessors hand to the
/// `ContentRouter`: the first segment's text followed by, for every
/// subsequent segment, the marker `\n\n--- <producer_name> ---\n` and that
/// segment's text. `segments` retains the pre-join pieces so code that
/// already has `ProcessedContent` in hand (tests, the orchestrator's
/// preprocess-failed fallback) doesn't need to re-split `text`.
#[derive(Debug, Clone)]
pub struct ProcessedContent {
    pub path: Arc<PathBuf>,
    pub text: String,
    pub segments: Vec<Segment>,
}

impl ProcessedContent {
    pub fn from_segments(path: Arc<PathBuf>, segments: Vec<Segment>) -> Self {
        let mut text = String::new();
        for (i, seg) in segments.iter().enumerate() {
            if i == 0 {
                text.push_str(&seg.text);
            } else {
                text.push_str(&crate::content_router::segment_marker(seg.producer_name));
                text.push_str(&seg.text);
            }
        }
        Self {
            path,
            text,
            segments,
        }
    }
}

/// Structured, non-textual metadata pulled from a file (EXIF, office core
/// properties, PDF info dictionary, …). Kept separate from `text` so the
/// METADATA validator can apply kind-aware field tables without re-parsing.
#[derive(Debug, Clone, Default)]
pub struct MetadataContent {
    pub fields: Vec<(String, String)>,
    pub kind: Option<MetadataKind>,
}

impl MetadataContent {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Image,
    Document,
    Audio,
    Video,
}

/// Output of `ContentRouter`: body text and metadata text kept as separate
/// named segments so validators can be pointed at the right one.
#[derive(Debug, Clone)]
pub struct RoutedContent {
    pub body: String,
    pub metadata: Vec<MetadataContent>,
    /// Set when the marker-based split failed and the whole blob is being
    /// treated as body text.
    pub malformed_fallback: bool,
}

/// The line-local context surrounding a candidate, extracted by
/// `ContextExtractor` and consumed by `Validator::analyze_context`. Distinct
/// from `ContextAnalysis`, which is a whole-file classification.
#[derive(Debug, Clone, Default)]
pub struct MatchContext {
    pub before: String,
    pub full_line: String,
    pub after: String,
    pub positive_keywords: Vec<String>,
    pub negative_keywords: Vec<String>,
    /// The `delta` the confidence pipeline computed from the keyword scan,
    /// already clamped to `[-50, +25]`. Kept on the struct so formatters and
    /// `--debug` tracing can show why confidence moved.
    pub confidence_impact: f64,
}

/// A single detected finding. `finding_type` is the semantic tag shown to
/// users (`VISA`, `GPS_COORDINATE`, `SOCIAL_MEDIA_CLUSTER`, …);
/// `validator_id` is the stable id of the validator that produced it
/// (`CREDIT_CARD`, `METADATA`, …) and is what `--checks` filters on.
#[derive(Debug, Clone)]
pub struct Match {
    pub finding_type: String,
    pub validator_id: &'static str,
    pub matched_text: String,
    pub coordinate: Coordinate,
    pub confidence: f64,
    pub file_path: Arc<PathBuf>,
    pub context: MatchContext,
    /// Free-form key/value annotations a validator attaches to a finding
    /// (card type, cluster platforms, metadata source kind, …).
    pub metadata: Vec<(String, String)>,
    /// Populated only for `SOCIAL_MEDIA_CLUSTER` synthetic findings: the
    /// individual matches that were merged to produce this one.
    pub cluster_members: Vec<Arc<Match>>,
}

impl Match {
    pub fn span_len(&self) -> u64 {
        self.coordinate.byte_end - self.coordinate.byte_start
    }

    pub fn filename(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn metadata_get(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }
}

/// Whole-file classification produced by `ContextAnalyzer`, threaded
/// through `validate_with_context` and the METADATA boost table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextAnalysis {
    pub domain: Domain,
    pub document_type: DocumentStructure,
    pub environment: Environment,
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Domain {
    Financial,
    Healthcare,
    Legal,
    Hr,
    Government,
    Personal,
    #[default]
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentStructure {
    Csv,
    Json,
    Xml,
    #[default]
    Prose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Test,
    Staging,
    #[default]
    Production,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Financial => "financial",
            Domain::Healthcare => "healthcare",
            Domain::Legal => "legal",
            Domain::Hr => "hr",
            Domain::Government => "government",
            Domain::Personal => "personal",
            Domain::General => "general",
        }
    }
}

impl DocumentStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStructure::Csv => "csv",
            DocumentStructure::Json => "json",
            DocumentStructure::Xml => "xml",
            DocumentStructure::Prose => "prose",
        }
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// A persisted, hash-only suppression rule. Never stores plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressionRule {
    pub id: String,
    pub hash: String,
    pub reason: Option<String>,
    pub enabled: bool,
    pub created_at: String,
    pub last_seen_at: Option<String>,
    pub expires_at: Option<String>,
    pub created_by: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub attributes: SuppressionAttributes,
}

/// The non-plaintext fields recorded alongside a suppression hash, useful
/// for a human reviewing `--generate-suppressions` output without ever
/// persisting the matched text itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressionAttributes {
    pub finding_type: String,
    pub filename: String,
    pub line_number: u32,
    pub confidence: f64,
    pub context_hash: String,
    pub match_text_hash: String,
}

/// One scheduled redaction edit, ordered by descending byte offset before
/// being applied so earlier edits don't invalidate later offsets.
#[derive(Debug, Clone)]
pub struct RedactionEdit {
    pub coordinate: Coordinate,
    /// The finding's original matched text. Textual redaction uses
    /// `coordinate` to splice by exact byte offset; office-container and
    /// image redaction search for this substring directly instead, since
    /// a finding's offset is relative to extracted/concatenated text, not
    /// to a position inside a zip member or binary container.
    pub matched_text: String,
    pub replacement: String,
    pub validator_id: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct RedactionPlan {
    pub path: PathBuf,
    pub edits: Vec<RedactionEdit>,
}

/// A log of what was redacted, with no plaintext retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub path: PathBuf,
    pub validator: &'static str,
    pub strategy: String,
    pub coordinate: Coordinate,
    pub skipped: bool,
    pub skip_reason: Option<String>,
}
