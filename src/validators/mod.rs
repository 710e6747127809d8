//! Validator framework — pluggable validators, a process-wide compiled
//! pattern cache, an Aho-Corasick keyword prefilter, and the canonical
//! confidence-scoring pipeline (spec §4.5).
//!
//! Grounded on the teacher's `scan/pattern.rs` (`STATIC_PATTERNS:
//! LazyLock<Arc<Vec<Pattern>>>` — the process-wide compiled cache) and
//! `scan/filters/content/context.rs` (`ContextPrefilter`, the Aho-Corasick
//! keyword-to-pattern mapping). The "pattern with zero valid regexes
//! becomes a no-op and logs once" and "invalid regex skipped with a
//! warning" behaviors are new (spec §4.5.1; the teacher panics via
//! `Regex::new(..).unwrap()` in several call sites — the redesign in spec
//! §9 replaces that with a fallible compile).

pub mod credit_card;
pub mod email;
pub mod intellectual_property;
pub mod ip_address;
pub mod metadata;
pub mod passport;
pub mod person_name;
pub mod phone;
pub mod secrets;
pub mod social_media;
pub mod ssn;

mod context_extractor;
mod keywords;
mod pattern_cache;
mod prefilter;

pub use context_extractor::ContextExtractor;
pub use pattern_cache::{CompiledPattern, PatternCache};
pub use prefilter::KeywordPrefilter;

use std::path::Path;
use std::sync::Arc;

use crate::model::{ContextAnalysis, Match, MatchContext, MetadataContent};

/// A raw regex hit before confidence scoring — the framework's "Candidate"
/// (glossary). Validators that don't use regex at all (clustering
/// reconstruction, METADATA's field-table lookups) skip this and build
/// `Match` directly.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub text: String,
    pub byte_start: usize,
    pub byte_end: usize,
    pub line: u32,
    pub column: u32,
}

/// Result of `Validator::calculate_confidence`: a validator-chosen base
/// score plus the named checks that failed (logged under `--debug`, and
/// recorded on the finding's `metadata` for downstream transparency).
#[derive(Debug, Clone, Default)]
pub struct ConfidenceBase {
    pub base: f64,
    pub failed_checks: Vec<&'static str>,
    /// Validator-assigned semantic type for this candidate, e.g. `VISA`.
    /// Defaults to the validator's own id when a validator doesn't
    /// distinguish sub-types.
    pub finding_type: Option<String>,
    pub extra_metadata: Vec<(String, String)>,
}

/// Pluggable detection capability. Every CORE validator (§4.5) implements
/// this; `EnhancedValidatorManager` is the only caller.
pub trait Validator: Send + Sync {
    /// Stable id used by `--checks` and attached to every finding as
    /// `validator_id`.
    fn id(&self) -> &'static str;

    /// Scan extracted text, returning matches with confidence already
    /// scored via the canonical pipeline (see `score_candidates` below,
    /// which every built-in validator funnels through).
    fn validate_content(&self, content: &str, path: &Path) -> Vec<Match>;

    /// Context-aware variant; default delegates to `validate_content` for
    /// validators that don't need whole-file context.
    fn validate_with_context(
        &self,
        content: &str,
        path: &Path,
        _analysis: &ContextAnalysis,
    ) -> Vec<Match> {
        self.validate_content(content, path)
    }

    /// Pure, no I/O: base confidence and which fixed-penalty checks failed.
    fn calculate_confidence(&self, candidate: &Candidate) -> ConfidenceBase;

    /// Bounded confidence delta in `[-50, +25]` from keyword context.
    fn analyze_context(&self, _candidate: &Candidate, context: &MatchContext) -> f64 {
        keywords::score_keywords(context)
    }

    /// Whether this validator ever looks at `MetadataContent` (only
    /// METADATA does). Lets `EnhancedValidatorManager` skip handing
    /// metadata sections to validators that only care about body text.
    fn consumes_metadata(&self) -> bool {
        false
    }

    fn validate_metadata(&self, _metadata: &[MetadataContent], _path: &Path) -> Vec<Match> {
        Vec::new()
    }
}

/// Registry of all CORE-required validators, immutable after
/// construction (spec §9's "validator registry: immutable after init").
pub struct ValidatorRegistry {
    validators: Vec<Arc<dyn Validator>>,
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        let validators: Vec<Arc<dyn Validator>> = vec![
            Arc::new(credit_card::CreditCardValidator::new()),
            Arc::new(ssn::SsnValidator::new()),
            Arc::new(email::EmailValidator::new()),
            Arc::new(phone::PhoneValidator::new()),
            Arc::new(person_name::PersonNameValidator::new()),
            Arc::new(ip_address::IpAddressValidator::new()),
            Arc::new(secrets::SecretsValidator::new()),
            Arc::new(passport::PassportValidator::new()),
            Arc::new(social_media::SocialMediaValidator::new()),
            Arc::new(intellectual_property::IntellectualPropertyValidator::new(
                &[],
            )),
            Arc::new(metadata::MetadataValidator::new()),
        ];
        Self { validators }
    }
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }

    pub fn by_id(&self, id: &str) -> Option<Arc<dyn Validator>> {
        self.validators.iter().find(|v| v.id() == id).cloned()
    }

    /// `--checks <list|all>`: resolve the requested ids against the
    /// registry, silently skipping unknown ids (the CLI layer is
    /// responsible for warning about those).
    pub fn resolve(&self, ids: &[String]) -> Vec<Arc<dyn Validator>> {
        if ids.iter().any(|id| id.eq_ignore_ascii_case("all")) {
            return self.validators.clone();
        }
        ids.iter()
            .filter_map(|id| self.by_id(id))
            .collect()
    }
}

/// Canonical scoring pipeline (spec §4.5.2), shared by every pattern-based
/// validator: compute base confidence, extract line context, apply the
/// keyword-weighted delta, clamp, and drop zero-confidence candidates.
pub fn score_candidate(
    validator: &dyn Validator,
    candidate: Candidate,
    path: &Path,
    full_text: &str,
) -> Option<Match> {
    let confidence_base = validator.calculate_confidence(&candidate);
    let context = ContextExtractor::extract(full_text, candidate.line, &candidate.text);
    let delta = validator.analyze_context(&candidate, &context).clamp(-50.0, 25.0);
    let confidence = (confidence_base.base + delta).clamp(0.0, 100.0);

    if confidence <= 0.0 {
        return None;
    }

    let mut context = context;
    context.confidence_impact = delta;

    let finding_type = confidence_base
        .finding_type
        .unwrap_or_else(|| validator.id().to_string());

    Some(Match {
        finding_type,
        validator_id: validator.id(),
        matched_text: candidate.text,
        coordinate: crate::model::Coordinate {
            byte_start: candidate.byte_start as u64,
            byte_end: candidate.byte_end as u64,
            line: candidate.line,
            column: candidate.column,
        },
        confidence,
        file_path: Arc::new(path.to_path_buf()),
        context,
        metadata: confidence_base.extra_metadata,
        cluster_members: Vec::new(),
    })
}

/// Locates regex candidates in `content` for a single pattern, converting
/// byte offsets to 1-based line/column the way the teacher's
/// `Pattern::find_all_matches` does.
pub fn find_candidates(pattern: &CompiledPattern, content: &str) -> Vec<Candidate> {
    let mut line_starts = vec![0usize];
    for (i, b) in content.bytes().enumerate() {
        if b == b'\n' {
            line_starts.push(i + 1);
        }
    }

    pattern
        .regex
        .find_iter(content)
        .map(|m| {
            let start = m.start();
            let end = m.end();
            let line_idx = match line_starts.binary_search(&start) {
                Ok(i) => i,
                Err(i) => i.saturating_sub(1),
            };
            let line_start = line_starts[line_idx];
            Candidate {
                text: m.as_str().to_string(),
                byte_start: start,
                byte_end: end,
                line: (line_idx + 1) as u32,
                column: (start - line_start) as u32,
            }
        })
        .collect()
}
