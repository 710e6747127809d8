//! Environment-variable driven defaults (spec.md §6). Read once at startup
//! and layered under explicit CLI flags — a flag always wins over an env
//! var, per the teacher's `cli/commands/scan.rs` "env overrides config,
//! flags override env" layering.

use std::path::PathBuf;

use super::ConfidenceTier;

#[derive(Debug, Clone, Default)]
pub struct EnvSettings {
    pub config_dir: Option<PathBuf>,
    pub debug: bool,
    pub quiet: bool,
    pub container_mode: bool,
    pub pre_commit_detected: bool,
    pub precommit_exit_on: Option<ConfidenceTier>,
    pub precommit_exit_on_first: bool,
    pub precommit_batch_size: u32,
}

const DEFAULT_BATCH_SIZE: u32 = 20;

impl EnvSettings {
    pub fn load() -> Self {
        let pre_commit_detected = is_set("PRE_COMMIT") || is_set("_PRE_COMMIT_RUNNING") || is_set("PRE_COMMIT_HOME");

        Self {
            config_dir: std::env::var_os("FERRET_CONFIG_DIR").map(PathBuf::from),
            debug: is_truthy("FERRET_DEBUG"),
            quiet: is_truthy("FERRET_QUIET_MODE"),
            container_mode: is_truthy("FERRET_CONTAINER_MODE"),
            pre_commit_detected,
            precommit_exit_on: std::env::var("FERRET_PRECOMMIT_EXIT_ON")
                .ok()
                .and_then(|v| parse_tier(&v)),
            precommit_exit_on_first: is_truthy("FERRET_PRECOMMIT_EXIT_ON_FIRST"),
            precommit_batch_size: std::env::var("FERRET_PRECOMMIT_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .map(|n| n.clamp(1, 100))
                .unwrap_or(DEFAULT_BATCH_SIZE),
        }
    }
}

fn is_set(var: &str) -> bool {
    std::env::var_os(var).is_some_and(|v| !v.is_empty())
}

fn is_truthy(var: &str) -> bool {
    match std::env::var(var) {
        Ok(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => false,
    }
}

fn parse_tier(raw: &str) -> Option<ConfidenceTier> {
    match raw.to_ascii_lowercase().as_str() {
        "high" => Some(ConfidenceTier::High),
        "medium" => Some(ConfidenceTier::Medium),
        "low" => Some(ConfidenceTier::Low),
        "none" => Some(ConfidenceTier::None),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tiers() {
        assert_eq!(parse_tier("High"), Some(ConfidenceTier::High));
        assert_eq!(parse_tier("none"), Some(ConfidenceTier::None));
        assert_eq!(parse_tier("bogus"), None);
    }

    #[test]
    fn batch_size_clamped_to_range() {
        // SAFETY: test-only env mutation, single-threaded test.
        unsafe {
            std::env::set_var("FERRET_PRECOMMIT_BATCH_SIZE", "500");
        }
        let settings = EnvSettings::load();
        assert_eq!(settings.precommit_batch_size, 100);
        unsafe {
            std::env::remove_var("FERRET_PRECOMMIT_BATCH_SIZE");
        }
    }
}
