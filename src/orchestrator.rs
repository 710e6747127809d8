//! `ScanOrchestrator` — discovery, filtering, bounded-parallel per-file
//! pipeline, cooperative cancellation, and result aggregation (spec.md
//! §4.1/§5). Grounded on the teacher's `scan/pipeline/directory.rs`
//! (`DirectoryPipeline::discover_files`/`process_files`, rayon `par_iter`
//! worker pool) and `scan/tracking/progress.rs`'s atomic-counter shape,
//! generalized from the teacher's placeholder bodies into the full
//! preprocess → route → validate → ignore-comment-filter → suppress →
//! redact pipeline this crate needs.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::config::ScanProfileConfig;
use crate::content_router::ContentRouter;
use crate::filters::{self, BinaryFilter, DirectoryFilter, FilterDecision, PathFilter, SizeFilter};
use crate::ignore_comments;
use crate::manager::EnhancedValidatorManager;
use crate::model::{Match, MediaClass};
use crate::preprocess::{PreprocessOutcome, PreprocessorRegistry};
use crate::redaction::RedactionEngine;
use crate::router::FileRouter;
use crate::stats::{ScanStats, StatsCollector};
use crate::suppression::SuppressionStore;
use crate::validators::Validator;

const DEFAULT_MAX_FILE_SIZE_MIB: u64 = 100;
const DEFAULT_MAX_WORKERS: usize = 8;

/// Per-file outcome the orchestrator aggregates. A skip is not an error —
/// it's recorded with a reason per spec.md §4.1 ("skipped files are
/// reported, not silently dropped").
#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: PathBuf,
    pub matches: Vec<Match>,
    pub skipped_reason: Option<&'static str>,
    pub redacted_output_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct FileError {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug)]
pub struct ScanReport {
    pub matches: Vec<Match>,
    pub file_results: Vec<FileResult>,
    pub file_errors: Vec<FileError>,
    pub stats: ScanStats,
    pub cancelled: bool,
}

/// Knobs that vary per invocation (CLI flags/profile), separate from the
/// longer-lived registries/stores passed to `ScanOrchestrator::new`.
pub struct ScanOptions {
    pub recursive: bool,
    pub confidence_floor: f64,
    /// Per-validator confidence floor overrides from `validators.<id>.confidence_floor`
    /// (spec.md §6's config schema). A validator absent here uses `confidence_floor`.
    pub validator_confidence_floors: HashMap<String, f64>,
    pub ignore_patterns: Vec<String>,
    pub max_file_size_mib: u64,
    pub worker_threads: Option<usize>,
    pub show_suppressed: bool,
    pub generate_suppressions: bool,
}

impl ScanOptions {
    pub fn from_profile(profile: &ScanProfileConfig, recursive: bool) -> Self {
        let validator_confidence_floors = profile
            .validators
            .iter()
            .filter_map(|(id, cfg)| cfg.confidence_floor.map(|floor| (id.clone(), floor as f64)))
            .collect();
        Self {
            recursive,
            confidence_floor: 0.0,
            validator_confidence_floors,
            ignore_patterns: Vec::new(),
            max_file_size_mib: profile.max_file_size_mib.unwrap_or(DEFAULT_MAX_FILE_SIZE_MIB),
            worker_threads: profile.worker_threads,
            show_suppressed: false,
            generate_suppressions: false,
        }
    }

    /// Effective floor for `validator_id`: its own config override if one
    /// was set, else the scan-wide `confidence_floor`.
    fn floor_for(&self, validator_id: &str) -> f64 {
        self.validator_confidence_floors
            .get(validator_id)
            .copied()
            .unwrap_or(self.confidence_floor)
    }
}

pub struct ScanOrchestrator {
    file_router: FileRouter,
    content_router: ContentRouter,
    preprocessors: PreprocessorRegistry,
    manager: EnhancedValidatorManager,
    suppression: Arc<SuppressionStore>,
    redaction: Option<RedactionEngine>,
    options: ScanOptions,
}

impl ScanOrchestrator {
    pub fn new(
        validators: Vec<Arc<dyn Validator>>,
        suppression: Arc<SuppressionStore>,
        redaction: Option<RedactionEngine>,
        options: ScanOptions,
    ) -> Self {
        let file_router = FileRouter::new();
        Self {
            content_router: ContentRouter::new(file_router),
            file_router,
            preprocessors: PreprocessorRegistry::new(),
            manager: EnhancedValidatorManager::new(validators),
            suppression,
            redaction,
            options,
        }
    }

    /// Expands `inputs` (file paths, directories, globs) into a deduped,
    /// order-stable file list. Globs are expanded with the `glob` crate;
    /// directories are walked with `ignore::WalkBuilder` (gitignore-aware),
    /// honoring `--recursive`.
    pub fn discover(&self, inputs: &[String]) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for input in inputs {
            if input.contains('*') || input.contains('?') || input.contains('[') {
                for entry in glob::glob(input).into_iter().flatten().flatten() {
                    push_unique(&mut seen, &mut out, entry);
                }
                continue;
            }

            let path = PathBuf::from(input);
            if path.is_dir() {
                // A secrets scanner must see gitignored files (.env, credential
                // dumps) as readily as tracked ones, so every VCS-aware filter
                // `ignore::WalkBuilder` offers is disabled here; it's used
                // purely as a directory walker.
                let mut builder = ignore::WalkBuilder::new(&path);
                builder
                    .max_depth(if self.options.recursive { None } else { Some(1) })
                    .hidden(false)
                    .git_ignore(false)
                    .git_global(false)
                    .git_exclude(false)
                    .ignore(false)
                    .parents(false);
                for entry in builder.build().flatten() {
                    let entry_path = entry.path().to_path_buf();
                    if entry_path.is_file() {
                        push_unique(&mut seen, &mut out, entry_path);
                    }
                }
            } else if path.is_file() {
                push_unique(&mut seen, &mut out, path);
            }
        }

        out
    }

    /// Runs the directory-filter fast path (path → size → binary, per the
    /// teacher's stated hierarchy), returning `None` if the path passes all
    /// filters or `Some(reason)` if it should be skipped before any I/O
    /// beyond the filters' own metadata checks.
    fn fast_path_skip_reason(&self, path: &Path) -> Option<&'static str> {
        let path_filter = PathFilter::new(self.options.ignore_patterns.clone());
        let size_filter = SizeFilter::new(self.options.max_file_size_mib);
        let binary_filter = BinaryFilter::new(self.file_router);
        let chain: Vec<&dyn DirectoryFilter> = vec![&path_filter, &size_filter, &binary_filter];
        match filters::run_all(&chain, path) {
            FilterDecision::Skip(reason) => Some(reason),
            FilterDecision::Process => None,
        }
    }

    /// Runs the full scan: discovery, per-file pipeline (bounded-parallel
    /// via rayon), aggregation. `cancel` is checked between files; a flip
    /// mid-scan stops new files from starting but lets in-flight ones
    /// finish, so no partial file ever appears in the result (spec.md §5's
    /// cancellation contract).
    pub fn run(&self, inputs: &[String], cancel: &AtomicBool) -> ScanReport {
        let started = Instant::now();
        let stats = StatsCollector::new();

        let files = self.discover(inputs);
        stats.record_discovered(files.len());

        let pool = match self.options.worker_threads.or(Some(DEFAULT_MAX_WORKERS.min(num_cpus::get()))) {
            Some(n) if n > 0 => rayon::ThreadPoolBuilder::new().num_threads(n).build().ok(),
            _ => None,
        };

        let process = |path: &PathBuf| -> Result<FileResult, FileError> {
            if cancel.load(Ordering::Relaxed) {
                stats.record_skip("cancelled");
                return Ok(FileResult { path: path.clone(), matches: vec![], skipped_reason: Some("cancelled"), redacted_output_path: None });
            }
            self.process_one(path, &stats, cancel)
        };

        let outcomes: Vec<Result<FileResult, FileError>> = match pool {
            Some(pool) => pool.install(|| files.par_iter().map(process).collect()),
            None => files.iter().map(process).collect(),
        };

        let mut file_results = Vec::with_capacity(outcomes.len());
        let mut file_errors = Vec::new();
        let mut matches = Vec::new();

        for outcome in outcomes {
            match outcome {
                Ok(result) => {
                    matches.extend(result.matches.iter().cloned());
                    file_results.push(result);
                }
                Err(e) => {
                    stats.record_failed();
                    file_errors.push(e);
                }
            }
        }

        self.suppression.flush_pending();

        ScanReport {
            matches,
            file_results,
            file_errors,
            stats: stats.snapshot(started.elapsed().as_millis() as u64),
            cancelled: cancel.load(Ordering::Relaxed),
        }
    }

    fn process_one(&self, path: &Path, stats: &StatsCollector, cancel: &AtomicBool) -> Result<FileResult, FileError> {
        if let Some(reason) = self.fast_path_skip_reason(path) {
            stats.record_skip(reason);
            return Ok(FileResult { path: path.to_path_buf(), matches: vec![], skipped_reason: Some(reason), redacted_output_path: None });
        }

        let media_class = self.file_router.classify(path);
        let processed = match self.preprocessors.process_cancellable(path, media_class, cancel) {
            PreprocessOutcome::Ok(content) => content,
            PreprocessOutcome::Cancelled => {
                stats.record_skip("cancelled");
                return Ok(FileResult { path: path.to_path_buf(), matches: vec![], skipped_reason: Some("cancelled"), redacted_output_path: None });
            }
            PreprocessOutcome::Failed(errors) => {
                if media_class == MediaClass::PlainText {
                    match std::fs::read_to_string(path) {
                        Ok(text) => crate::model::ProcessedContent::from_segments(
                            Arc::new(path.to_path_buf()),
                            vec![crate::model::Segment {
                                producer_name: "plain_text_fallback",
                                producer_kind: crate::model::ProducerKind::Body,
                                text,
                            }],
                        ),
                        Err(source) => {
                            return Err(FileError { path: path.to_path_buf(), message: source.to_string() });
                        }
                    }
                } else {
                    tracing::debug!(path = %path.display(), errors = ?errors, "all preprocessors failed");
                    stats.record_skip("preprocess_failed");
                    return Ok(FileResult {
                        path: path.to_path_buf(),
                        matches: vec![],
                        skipped_reason: Some("preprocess_failed"),
                        redacted_output_path: None,
                    });
                }
            }
        };

        if cancel.load(Ordering::Relaxed) {
            stats.record_skip("cancelled");
            return Ok(FileResult { path: path.to_path_buf(), matches: vec![], skipped_reason: Some("cancelled"), redacted_output_path: None });
        }

        let routed = self.content_router.route(&processed);
        let (raw_matches, file_cancelled) = self.manager.analyze_file(&routed, path, cancel);
        if file_cancelled {
            stats.record_skip("cancelled");
            return Ok(FileResult { path: path.to_path_buf(), matches: vec![], skipped_reason: Some("cancelled"), redacted_output_path: None });
        }

        let (comment_filtered, ignored_count) = ignore_comments::filter_matches(raw_matches, &routed.body);
        stats.record_ignore_comment_drops(ignored_count);

        let mut kept = Vec::with_capacity(comment_filtered.len());
        let mut suppressed_count = 0usize;
        for finding in comment_filtered {
            if self.suppression.is_suppressed(&finding) {
                suppressed_count += 1;
                if self.options.show_suppressed {
                    kept.push(finding);
                }
                continue;
            }
            if self.options.generate_suppressions {
                self.suppression.record(&finding, None, false);
            }
            if finding.confidence >= self.options.floor_for(finding.validator_id) {
                kept.push(finding);
            }
        }
        stats.record_suppression_drops(suppressed_count);

        let bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let lines = routed.body.lines().count();
        stats.record_scanned(bytes, lines, kept.len());

        // spec §5: cancellation is also observed between redaction
        // operations — a flip here skips writing a redacted copy for a file
        // whose matches were already fully computed, rather than aborting
        // the file's (already-final) detection results.
        let redacted_output_path = if cancel.load(Ordering::Relaxed) {
            None
        } else if let Some(engine) = &self.redaction {
            let plan = engine.build_plan(path, kept.clone());
            if !plan.edits.is_empty() {
                match engine.apply(&plan) {
                    Ok(output_path) => Some(output_path),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "redaction failed for file");
                        None
                    }
                }
            } else {
                None
            }
        } else {
            None
        };

        Ok(FileResult { path: path.to_path_buf(), matches: kept, skipped_reason: None, redacted_output_path })
    }
}

fn push_unique(seen: &mut HashSet<PathBuf>, out: &mut Vec<PathBuf>, path: PathBuf) {
    let canonical = path.canonicalize().unwrap_or(path);
    if seen.insert(canonical.clone()) {
        out.push(canonical);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::ValidatorRegistry;
    use tempfile::tempdir;

    fn orchestrator(options: ScanOptions) -> ScanOrchestrator {
        let registry = ValidatorRegistry::new();
        let suppression = Arc::new(SuppressionStore::load(&PathBuf::from("/nonexistent/suppressions.yaml")));
        ScanOrchestrator::new(registry.all().to_vec(), suppression, None, options)
    }

    #[test]
    fn discovers_single_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "hello").unwrap();
        let profile = ScanProfileConfig::default();
        let orch = orchestrator(ScanOptions::from_profile(&profile, false));
        let found = orch.discover(&[file.to_string_lossy().to_string()]);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn skips_oversized_file_with_reason() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("big.txt");
        std::fs::write(&file, vec![0u8; 1024]).unwrap();
        let mut profile = ScanProfileConfig::default();
        profile.max_file_size_mib = Some(0);
        let orch = orchestrator(ScanOptions::from_profile(&profile, false));
        let cancel = AtomicBool::new(false);
        let report = orch.run(&[file.to_string_lossy().to_string()], &cancel);
        assert_eq!(report.file_results[0].skipped_reason, Some("too_large"));
    }

    #[test]
    fn detects_credit_card_in_plain_text_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "Customer card: 4532-0151-1283-0366 expires 12/25").unwrap();
        let profile = ScanProfileConfig::default();
        let orch = orchestrator(ScanOptions::from_profile(&profile, false));
        let cancel = AtomicBool::new(false);
        let report = orch.run(&[file.to_string_lossy().to_string()], &cancel);
        assert!(report.matches.iter().any(|m| m.validator_id == "CREDIT_CARD"));
    }

    #[test]
    fn cancelled_scan_reports_cancelled_flag() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "hello").unwrap();
        let profile = ScanProfileConfig::default();
        let orch = orchestrator(ScanOptions::from_profile(&profile, false));
        let cancel = AtomicBool::new(true);
        let report = orch.run(&[file.to_string_lossy().to_string()], &cancel);
        assert!(report.cancelled);
    }

    #[test]
    fn suppressed_finding_is_absent_unless_show_suppressed() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("b.txt");
        std::fs::write(&file, "Customer card: 4532-0151-1283-0366 expires 12/25").unwrap();

        let registry = ValidatorRegistry::new();
        let suppression = Arc::new(SuppressionStore::load(&PathBuf::from("/nonexistent/suppressions.yaml")));

        let profile = ScanProfileConfig::default();
        let probe = ScanOrchestrator::new(
            registry.all().to_vec(),
            suppression.clone(),
            None,
            ScanOptions::from_profile(&profile, false),
        );
        let cancel = AtomicBool::new(false);
        let first_pass = probe.run(&[file.to_string_lossy().to_string()], &cancel);
        let finding = first_pass.matches.first().expect("expected a credit card match");
        suppression.record(finding, Some("test fixture".to_string()), true);

        let orch =
            ScanOrchestrator::new(registry.all().to_vec(), suppression, None, ScanOptions::from_profile(&profile, false));
        let report = orch.run(&[file.to_string_lossy().to_string()], &cancel);
        assert!(report.matches.is_empty());
    }
}
