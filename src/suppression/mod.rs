//! `SuppressionStore` — persistent, hash-only suppression rules (spec
//! §3/§4.8). New subsystem; no teacher analog. The YAML load/save idiom
//! (parse-with-fallback-to-empty-on-corruption, atomic rename on write)
//! follows `config::core`'s config-loading shape, generalized to a
//! mutable, periodically-rewritten file instead of a read-once config.

mod fingerprint;

pub use fingerprint::compute as fingerprint_hash;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{FerretError, Result};
use crate::model::{Match, SuppressionAttributes, SuppressionRule};

const CURRENT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SuppressionFile {
    version: String,
    #[serde(default)]
    rules: Vec<SuppressionRule>,
}

/// Suppression rules, keyed by hash. Reads are lock-free snapshots (a
/// cloned `Vec` behind a `RwLock`); writes (insert/update/remove) take the
/// write lock. `last_seen_at` bumps from concurrent scan workers are queued
/// write-behind and only merged into the map on `flush_pending`/`save`, so
/// a hot `is_suppressed` read path never blocks on another worker's update
/// (spec §9's "thread-local globals for last-seen" redesign).
pub struct SuppressionStore {
    path: PathBuf,
    rules: RwLock<HashMap<String, SuppressionRule>>,
    pending_last_seen: Mutex<Vec<(String, String)>>,
    /// Set when `load` had to fall back to an empty store because the file
    /// was corrupt — surfaced so the CLI can warn once, per spec §7.
    pub loaded_from_corrupt_file: bool,
}

impl SuppressionStore {
    /// Loads from `path`. A missing file is not an error — the crate
    /// behaves as if an empty store existed (first run). A present-but-
    /// corrupt file falls back to an empty in-memory store with a logged
    /// warning, per spec §7 ("proceeds without suppressions rather than
    /// misclassify findings as suppressed").
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::empty(path.to_path_buf());
        }

        match fs::read_to_string(path) {
            Ok(raw) => match serde_yml::from_str::<SuppressionFile>(&raw) {
                Ok(file) => {
                    let rules = file.rules.into_iter().map(|r| (r.hash.clone(), r)).collect();
                    Self {
                        path: path.to_path_buf(),
                        rules: RwLock::new(rules),
                        pending_last_seen: Mutex::new(Vec::new()),
                        loaded_from_corrupt_file: false,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "suppression file corrupt; proceeding with an empty in-memory store"
                    );
                    let mut store = Self::empty(path.to_path_buf());
                    store.loaded_from_corrupt_file = true;
                    store
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read suppression file");
                let mut store = Self::empty(path.to_path_buf());
                store.loaded_from_corrupt_file = true;
                store
            }
        }
    }

    fn empty(path: PathBuf) -> Self {
        Self {
            path,
            rules: RwLock::new(HashMap::new()),
            pending_last_seen: Mutex::new(Vec::new()),
            loaded_from_corrupt_file: false,
        }
    }

    /// True iff an enabled, non-expired rule matches `finding`'s
    /// fingerprint. Queues a write-behind `last_seen_at` bump on a hit
    /// (non-blocking: the push only takes the small pending-queue lock,
    /// never the rules map's write lock).
    pub fn is_suppressed(&self, finding: &Match) -> bool {
        let hash = fingerprint_hash(finding);
        let rules = self.rules.read().unwrap();
        let Some(rule) = rules.get(&hash) else { return false };

        if !rule.enabled {
            return false;
        }
        if let Some(expires_at) = &rule.expires_at {
            if is_expired(expires_at) {
                return false;
            }
        }

        self.queue_last_seen(hash);
        true
    }

    /// Per spec §9's decision: a *disabled* rule's `last_seen_at` is
    /// bumped only when the finding recurs, even though the rule never
    /// suppresses. Callers that want that behavior call this explicitly
    /// for findings that matched a disabled rule's hash (disabled rules
    /// never suppress, so `is_suppressed` already returned `false` for
    /// them and the caller must check separately if it cares).
    pub fn note_recurrence_of_disabled_rule(&self, finding: &Match) {
        let hash = fingerprint_hash(finding);
        let rules = self.rules.read().unwrap();
        if rules.contains_key(&hash) {
            drop(rules);
            self.queue_last_seen(hash);
        }
    }

    fn queue_last_seen(&self, hash: String) {
        let now = Utc::now().to_rfc3339();
        self.pending_last_seen.lock().unwrap().push((hash, now));
    }

    /// Drains the write-behind queue into the rules map. Call before
    /// `save` (and may be called periodically by a long scan to bound
    /// queue growth).
    pub fn flush_pending(&self) {
        let pending = std::mem::take(&mut *self.pending_last_seen.lock().unwrap());
        if pending.is_empty() {
            return;
        }
        let mut rules = self.rules.write().unwrap();
        for (hash, timestamp) in pending {
            if let Some(rule) = rules.get_mut(&hash) {
                rule.last_seen_at = Some(timestamp);
            }
        }
    }

    /// Upserts a rule for `finding`. Used both by normal suppression
    /// management and by `--generate-suppressions`, which calls this with
    /// `enabled=false` for every non-suppressed finding so a human can
    /// review and flip it on later. The rule id is the fingerprint hash
    /// itself — per spec §3 the hash already fully determines the match,
    /// so a separate generated id would just be a second name for the same
    /// thing.
    pub fn record(&self, finding: &Match, reason: Option<String>, enabled: bool) -> String {
        let hash = fingerprint_hash(finding);
        let now = Utc::now().to_rfc3339();

        let mut rules = self.rules.write().unwrap();
        let entry = rules.entry(hash.clone()).or_insert_with(|| SuppressionRule {
            id: hash.clone(),
            hash: hash.clone(),
            reason: None,
            enabled,
            created_at: now.clone(),
            last_seen_at: None,
            expires_at: None,
            created_by: None,
            reviewed_by: None,
            reviewed_at: None,
            attributes: SuppressionAttributes {
                finding_type: finding.finding_type.clone(),
                filename: finding.filename(),
                line_number: finding.coordinate.line,
                confidence: finding.confidence,
                context_hash: fingerprint::context_hash(finding),
                match_text_hash: fingerprint::match_text_hash(finding),
            },
        });
        entry.reason = reason.or_else(|| entry.reason.clone());
        entry.enabled = enabled;
        hash
    }

    pub fn list(&self) -> Vec<SuppressionRule> {
        self.rules.read().unwrap().values().cloned().collect()
    }

    pub fn remove(&self, id: &str) -> bool {
        self.rules.write().unwrap().remove(id).is_some()
    }

    /// Drops every rule whose `expires_at` is in the past relative to now.
    pub fn cleanup_expired(&self) -> usize {
        let mut rules = self.rules.write().unwrap();
        let before = rules.len();
        rules.retain(|_, rule| !rule.expires_at.as_ref().is_some_and(|e| is_expired(e)));
        before - rules.len()
    }

    /// Versioned YAML, file mode `0600`, atomic rename (spec §4.8/§6).
    pub fn save(&self) -> Result<()> {
        self.flush_pending();

        let rules: Vec<SuppressionRule> = {
            let guard = self.rules.read().unwrap();
            let mut rules: Vec<_> = guard.values().cloned().collect();
            rules.sort_by(|a, b| a.hash.cmp(&b.hash));
            rules
        };
        let file = SuppressionFile { version: CURRENT_VERSION.to_string(), rules };

        let yaml = serde_yml::to_string(&file)
            .map_err(|e| FerretError::ConfigError(format!("failed to serialize suppressions: {e}")))?;

        let parent = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let tmp_path = match parent {
            Some(dir) => dir.join(format!(
                ".{}.tmp",
                self.path.file_name().and_then(|n| n.to_str()).unwrap_or("suppressions")
            )),
            None => PathBuf::from(format!(
                ".{}.tmp",
                self.path.file_name().and_then(|n| n.to_str()).unwrap_or("suppressions")
            )),
        };

        fs::write(&tmp_path, &yaml).map_err(|source| FerretError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        set_owner_only_permissions(&tmp_path)?;

        fs::rename(&tmp_path, &self.path).map_err(|source| FerretError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let permissions = fs::Permissions::from_mode(0o600);
    fs::set_permissions(path, permissions).map_err(|source| FerretError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

fn is_expired(expires_at: &str) -> bool {
    let Ok(expiry) = chrono::DateTime::parse_from_rfc3339(expires_at) else {
        return false;
    };
    expiry < Utc::now()
}

/// `--suppression-file` (explicit) → `./.ferret-scan-suppressions.yaml` →
/// `$HOME/.ferret-scan-suppressions.yaml` (spec §4.8/§6's load precedence).
pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    let cwd_default = PathBuf::from(".ferret-scan-suppressions.yaml");
    if cwd_default.exists() {
        return cwd_default;
    }
    if let Some(home) = std::env::var_os("HOME") {
        let home_default = PathBuf::from(home).join(".ferret-scan-suppressions.yaml");
        if home_default.exists() {
            return home_default;
        }
    }
    cwd_default
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, MatchContext};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn sample_match() -> Match {
        Match {
            finding_type: "SSN".to_string(),
            validator_id: "SSN",
            matched_text: "123-45-6789".to_string(),
            coordinate: Coordinate { byte_start: 0, byte_end: 11, line: 42, column: 0 },
            confidence: 90.0,
            file_path: Arc::new(PathBuf::from("b.txt")),
            context: MatchContext {
                before: String::new(),
                full_line: "ssn: 123-45-6789".to_string(),
                after: String::new(),
                positive_keywords: Vec::new(),
                negative_keywords: Vec::new(),
                confidence_impact: 0.0,
            },
            metadata: Vec::new(),
            cluster_members: Vec::new(),
        }
    }

    #[test]
    fn missing_file_is_empty_store_not_error() {
        let store = SuppressionStore::load(&PathBuf::from("/nonexistent/path/suppressions.yaml"));
        assert!(store.list().is_empty());
        assert!(!store.loaded_from_corrupt_file);
    }

    #[test]
    fn record_then_is_suppressed_when_enabled() {
        let store = SuppressionStore::empty(PathBuf::from("unused.yaml"));
        let finding = sample_match();
        store.record(&finding, Some("reviewed".to_string()), true);
        assert!(store.is_suppressed(&finding));
    }

    #[test]
    fn disabled_rule_never_suppresses() {
        let store = SuppressionStore::empty(PathBuf::from("unused.yaml"));
        let finding = sample_match();
        store.record(&finding, None, false);
        assert!(!store.is_suppressed(&finding));
    }

    #[test]
    fn is_suppressed_queues_last_seen_update() {
        let store = SuppressionStore::empty(PathBuf::from("unused.yaml"));
        let finding = sample_match();
        store.record(&finding, None, true);
        assert!(store.is_suppressed(&finding));
        store.flush_pending();
        let rule = store.list().into_iter().next().unwrap();
        assert!(rule.last_seen_at.is_some());
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("suppressions.yaml");
        let store = SuppressionStore::empty(path.clone());
        store.record(&sample_match(), Some("known test fixture".to_string()), true);
        store.save().unwrap();

        let reloaded = SuppressionStore::load(&path);
        assert_eq!(reloaded.list().len(), 1);
        assert!(reloaded.is_suppressed(&sample_match()));
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_has_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let path = dir.path().join("suppressions.yaml");
        let store = SuppressionStore::empty(path.clone());
        store.record(&sample_match(), None, true);
        store.save().unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn corrupt_file_falls_back_to_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("suppressions.yaml");
        fs::write(&path, "not: [valid, yaml: structure :::").unwrap();
        let store = SuppressionStore::load(&path);
        assert!(store.list().is_empty());
        assert!(store.loaded_from_corrupt_file);
    }

    #[test]
    fn cleanup_expired_removes_past_rules() {
        let store = SuppressionStore::empty(PathBuf::from("unused.yaml"));
        let finding = sample_match();
        store.record(&finding, None, true);
        {
            let mut rules = store.rules.write().unwrap();
            for rule in rules.values_mut() {
                rule.expires_at = Some("2000-01-01T00:00:00+00:00".to_string());
            }
        }
        let removed = store.cleanup_expired();
        assert_eq!(removed, 1);
        assert!(store.list().is_empty());
    }
}
