//! Configuration loading.
//!
//! Shape follows the teacher's `config::core` (an `Arc`-wrapped root struct
//! behind a `LazyLock` default) and `config::mod` (serde structs loaded from
//! YAML), narrowed to what the scan engine itself needs: validator toggles,
//! redaction settings, and suppression-file location. CLI flag parsing and
//! interactive config editing are out of scope; this module only loads and
//! merges.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FerretError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub confidence_floor: Option<u8>,
    /// Named regex patterns for configuration-driven validators (currently
    /// only `INTELLECTUAL_PROPERTY` reads these; other validators ignore
    /// this field).
    #[serde(default)]
    pub custom_patterns: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_floor: None,
            custom_patterns: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    #[serde(default)]
    pub strategy: RedactionStrategyName,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionStrategyName {
    #[default]
    Simple,
    FormatPreserving,
    Synthetic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProfileConfig {
    #[serde(default)]
    pub validators: BTreeMap<String, ValidatorConfig>,
    #[serde(default)]
    pub max_file_size_mib: Option<u64>,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ScanProfileConfig {
    fn default() -> Self {
        Self {
            validators: BTreeMap::new(),
            max_file_size_mib: None,
            worker_threads: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FerretConfig {
    #[serde(default)]
    pub defaults: ScanProfileConfig,
    #[serde(default)]
    pub profiles: BTreeMap<String, ScanProfileConfig>,
    #[serde(default)]
    pub redaction: RedactionConfig,
    #[serde(default)]
    pub suppression_file: Option<PathBuf>,
    /// Unknown top-level keys, collected rather than rejected, per the
    /// tagged-union-configs redesign: callers log them as warnings instead
    /// of failing to parse.
    #[serde(skip)]
    pub unknown_keys: Vec<String>,
}

impl Default for FerretConfig {
    fn default() -> Self {
        Self {
            defaults: ScanProfileConfig::default(),
            profiles: BTreeMap::new(),
            redaction: RedactionConfig {
                strategy: RedactionStrategyName::Simple,
            },
            suppression_file: None,
            unknown_keys: Vec::new(),
        }
    }
}

impl FerretConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| FerretError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let value: serde_yml::Value = serde_yml::from_str(raw)
            .map_err(|e| FerretError::ConfigError(format!("invalid YAML: {e}")))?;

        let unknown_keys = collect_unknown_top_level_keys(&value);

        let mut config: FerretConfig = serde_yml::from_value(value)
            .map_err(|e| FerretError::ConfigError(format!("schema mismatch: {e}")))?;
        config.unknown_keys = unknown_keys;
        Ok(config)
    }

    /// Resolve the effective profile config: `defaults` shallow-merged with
    /// the named profile, the profile winning on any key it sets.
    pub fn resolve_profile(&self, name: Option<&str>) -> ScanProfileConfig {
        let Some(name) = name else {
            return self.defaults.clone();
        };
        let Some(profile) = self.profiles.get(name) else {
            return self.defaults.clone();
        };

        let mut merged = self.defaults.clone();
        for (validator, cfg) in &profile.validators {
            merged.validators.insert(validator.clone(), cfg.clone());
        }
        if profile.max_file_size_mib.is_some() {
            merged.max_file_size_mib = profile.max_file_size_mib;
        }
        if profile.worker_threads.is_some() {
            merged.worker_threads = profile.worker_threads;
        }
        merged
    }

    /// `--suppression-file` (explicit arg) → `./.ferret-scan-suppressions.yaml`
    /// → `$HOME/.ferret-scan-suppressions.yaml`, per the load precedence.
    pub fn resolve_suppression_path(&self, explicit: Option<PathBuf>) -> PathBuf {
        if let Some(path) = explicit {
            return path;
        }
        if let Some(path) = &self.suppression_file {
            return path.clone();
        }
        let cwd_default = PathBuf::from(".ferret-scan-suppressions.yaml");
        if cwd_default.exists() {
            return cwd_default;
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".ferret-scan-suppressions.yaml");
        }
        cwd_default
    }
}

fn collect_unknown_top_level_keys(value: &serde_yml::Value) -> Vec<String> {
    const KNOWN: &[&str] = &["defaults", "profiles", "redaction", "suppression_file"];
    let serde_yml::Value::Mapping(map) = value else {
        return Vec::new();
    };
    map.keys()
        .filter_map(|k| k.as_str())
        .filter(|k| !KNOWN.contains(k))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let config = FerretConfig::from_yaml_str("{}").unwrap();
        assert!(config.profiles.is_empty());
        assert!(config.unknown_keys.is_empty());
    }

    #[test]
    fn flags_unknown_top_level_keys() {
        let config = FerretConfig::from_yaml_str("totally_unknown: 1\ndefaults: {}\n").unwrap();
        assert_eq!(config.unknown_keys, vec!["totally_unknown".to_string()]);
    }

    #[test]
    fn profile_overrides_defaults() {
        let yaml = r#"
defaults:
  max_file_size_mib: 100
profiles:
  strict:
    max_file_size_mib: 10
"#;
        let config = FerretConfig::from_yaml_str(yaml).unwrap();
        let resolved = config.resolve_profile(Some("strict"));
        assert_eq!(resolved.max_file_size_mib, Some(10));
        let resolved_default = config.resolve_profile(None);
        assert_eq!(resolved_default.max_file_size_mib, Some(100));
    }

    #[test]
    fn validator_config_reads_custom_patterns_and_floor() {
        let yaml = r#"
defaults:
  validators:
    INTELLECTUAL_PROPERTY:
      enabled: true
      confidence_floor: 40
      custom_patterns:
        internal_wiki: 'internal\.example\.corp/\S+'
    SSN:
      enabled: false
"#;
        let config = FerretConfig::from_yaml_str(yaml).unwrap();
        let resolved = config.resolve_profile(None);
        let ip_cfg = &resolved.validators["INTELLECTUAL_PROPERTY"];
        assert_eq!(ip_cfg.confidence_floor, Some(40));
        assert_eq!(
            ip_cfg.custom_patterns.get("internal_wiki").map(String::as_str),
            Some(r"internal\.example\.corp/\S+")
        );
        assert!(!resolved.validators["SSN"].enabled);
    }
}
