//! Redaction engine (spec §4.9): turns confirmed, non-suppressed findings
//! into an on-disk rewritten copy of each scanned file, plus a plaintext-free
//! audit trail. New subsystem — the teacher has no redaction feature — built
//! from the format-dispatch idiom `FileRouter`/`ContentRouter` already
//! establish for detection, now reused for output instead of input.

pub mod audit;
pub mod image;
pub mod office;
pub mod pdf;
pub mod strategy;
pub mod textual;

use std::path::{Path, PathBuf};

use crate::config::RedactionStrategyName;
use crate::error::Result;
use crate::manager::resolve_overlaps;
use crate::model::{AuditEntry, Match, MediaClass, RedactionEdit, RedactionPlan};
use crate::router::FileRouter;

pub struct RedactionEngine {
    router: FileRouter,
    strategy: strategy::Strategy,
    output_dir: PathBuf,
    audit_log: Option<PathBuf>,
}

impl RedactionEngine {
    pub fn new(strategy_name: RedactionStrategyName, output_dir: PathBuf, audit_log: Option<PathBuf>) -> Self {
        Self {
            router: FileRouter::new(),
            strategy: strategy::Strategy::from_config_name(strategy_name),
            output_dir,
            audit_log,
        }
    }

    /// Builds the ordered edit list for one file: overlaps resolved first
    /// (the same "longer span wins" tie-break detection uses), then sorted
    /// descending by byte offset so textual splicing never invalidates an
    /// edit still queued behind it.
    pub fn build_plan(&self, path: &Path, findings: Vec<Match>) -> RedactionPlan {
        let mut resolved = resolve_overlaps(findings);
        resolved.sort_by(|a, b| b.coordinate.byte_start.cmp(&a.coordinate.byte_start));

        let edits = resolved
            .iter()
            .map(|finding| RedactionEdit {
                coordinate: finding.coordinate,
                matched_text: finding.matched_text.clone(),
                replacement: strategy::replacement_for(finding, self.strategy),
                validator_id: finding.validator_id,
            })
            .collect();

        RedactionPlan { path: path.to_path_buf(), edits }
    }

    fn output_path_for(&self, path: &Path) -> PathBuf {
        match path.file_name() {
            Some(name) => self.output_dir.join(name),
            None => self.output_dir.join("redacted-output"),
        }
    }

    /// Applies `plan` and appends to the audit log, if one was configured.
    /// Dispatch is keyed on `FileRouter::classify`, mirroring how
    /// `ScanOrchestrator` already routes the same file for detection.
    pub fn apply(&self, plan: &RedactionPlan) -> Result<PathBuf> {
        let output_path = self.output_path_for(&plan.path);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| crate::error::FerretError::Io { path: parent.to_path_buf(), source })?;
        }
        let strategy_name = strategy_label(self.strategy);

        let entries: Vec<AuditEntry> = match self.router.classify(&plan.path) {
            MediaClass::PlainText => {
                textual::redact_file(&plan.path, &output_path, &plan.edits)?;
                audit::entry_for_edits(&plan.path, strategy_name, &plan.edits)
            }
            MediaClass::Office => {
                office::redact_file(&plan.path, &output_path, &plan.edits)?;
                audit::entry_for_edits(&plan.path, strategy_name, &plan.edits)
            }
            MediaClass::Image => match image::redact_file(&plan.path, &output_path) {
                Ok(()) => vec![],
                Err(e) => {
                    std::fs::copy(&plan.path, &output_path).map_err(|source| crate::error::FerretError::Io {
                        path: plan.path.clone(),
                        source,
                    })?;
                    vec![audit::skipped_entry(&plan.path, &e.to_string())]
                }
            },
            MediaClass::Pdf => {
                pdf::redact_file(&plan.path, &output_path)?;
                vec![audit::skipped_entry(&plan.path, pdf::SKIP_REASON)]
            }
            MediaClass::Document | MediaClass::Video | MediaClass::Audio | MediaClass::Unsupported => {
                std::fs::copy(&plan.path, &output_path).map_err(|source| crate::error::FerretError::Io {
                    path: plan.path.clone(),
                    source,
                })?;
                vec![audit::skipped_entry(&plan.path, "redaction_unsupported_for_media_class")]
            }
        };

        if let Some(log_path) = &self.audit_log {
            audit::append(log_path, &plan.path, &entries)?;
        }

        Ok(output_path)
    }
}

fn strategy_label(strategy: strategy::Strategy) -> &'static str {
    match strategy {
        strategy::Strategy::Simple => "simple",
        strategy::Strategy::FormatPreserving => "format_preserving",
        strategy::Strategy::Synthetic => "synthetic",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, MatchContext};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn finding(path: Arc<PathBuf>, start: u64, end: u64, text: &str) -> Match {
        Match {
            finding_type: "SSN".to_string(),
            validator_id: "SSN",
            matched_text: text.to_string(),
            coordinate: Coordinate { byte_start: start, byte_end: end, line: 1, column: 0 },
            confidence: 90.0,
            file_path: path,
            context: MatchContext::default(),
            metadata: vec![],
            cluster_members: vec![],
        }
    }

    #[test]
    fn plan_is_sorted_descending_by_offset() {
        let engine = RedactionEngine::new(RedactionStrategyName::Simple, PathBuf::from("/tmp/out"), None);
        let path = Arc::new(PathBuf::from("a.txt"));
        let findings = vec![
            finding(path.clone(), 0, 11, "123-45-6789"),
            finding(path.clone(), 20, 31, "987-65-4321"),
        ];
        let plan = engine.build_plan(&path, findings);
        assert!(plan.edits[0].coordinate.byte_start > plan.edits[1].coordinate.byte_start);
    }

    #[test]
    fn apply_writes_redacted_textual_output_and_audit_log() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.txt");
        std::fs::write(&input, "ssn 123-45-6789 on file").unwrap();
        let audit_log = dir.path().join("audit.jsonl");

        let engine =
            RedactionEngine::new(RedactionStrategyName::Simple, dir.path().join("out"), Some(audit_log.clone()));
        let path = Arc::new(input.clone());
        let findings = vec![finding(path.clone(), 4, 15, "123-45-6789")];
        let plan = engine.build_plan(&input, findings);

        let output_path = engine.apply(&plan).unwrap();
        let out_content = std::fs::read_to_string(&output_path).unwrap();
        assert!(!out_content.contains("123-45-6789"));
        assert!(std::fs::read_to_string(&audit_log).unwrap().contains("SSN"));
    }
}
