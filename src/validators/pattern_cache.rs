//! Process-wide compiled-pattern cache, keyed by source pattern string
//! (spec §4.5.1). Grounded on the teacher's `STATIC_PATTERNS:
//! LazyLock<Arc<Vec<Pattern>>>` in `scan/pattern.rs`, generalized from "one
//! fixed pattern set" to "any validator can ask for any pattern string and
//! get back a shared compiled `Regex`".

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use regex::Regex;

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub source: String,
    pub regex: Arc<Regex>,
    pub keywords: Vec<String>,
}

lazy_static::lazy_static! {
    static ref CACHE: RwLock<HashMap<String, Arc<Regex>>> = RwLock::new(HashMap::new());
}

pub struct PatternCache;

impl PatternCache {
    /// Compiles `source`, prepending a case-insensitive flag when the
    /// author supplied no inline flags (spec §4.5.1's default). Returns
    /// `None` and logs a warning on an invalid regex rather than panicking
    /// — the spec §9 redesign away from panic-for-control-flow.
    pub fn get(source: &str, case_sensitive: bool) -> Option<Arc<Regex>> {
        let key = format!("{case_sensitive}:{source}");
        if let Some(hit) = CACHE.read().unwrap().get(&key) {
            return Some(hit.clone());
        }

        let pattern_str = if case_sensitive || has_inline_flags(source) {
            source.to_string()
        } else {
            format!("(?i){source}")
        };

        match Regex::new(&pattern_str) {
            Ok(regex) => {
                warn_on_unbounded_nesting(source);
                let regex = Arc::new(regex);
                CACHE.write().unwrap().insert(key, regex.clone());
                Some(regex)
            }
            Err(e) => {
                tracing::warn!(pattern = %source, error = %e, "pattern compile failed, skipping");
                None
            }
        }
    }

    pub fn compile_named(
        _name: &'static str,
        source: &str,
        keywords: &[&str],
        case_sensitive: bool,
    ) -> Option<CompiledPattern> {
        let regex = Self::get(source, case_sensitive)?;
        Some(CompiledPattern {
            source: source.to_string(),
            regex,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        })
    }
}

fn has_inline_flags(source: &str) -> bool {
    source.starts_with("(?i)") || source.starts_with("(?i:") || source.contains("(?-i")
}

/// Regex compile-time pre-warning for patterns with nested unbounded
/// quantifiers (spec §5's cancellation/timeouts section): `(a+)+`,
/// `(.*)*` and similar shapes are classic catastrophic-backtracking
/// triggers in backtracking engines. The `regex` crate itself never
/// backtracks exponentially, so this is advisory only — it still compiles
/// and runs, just logged once so authors notice.
fn warn_on_unbounded_nesting(source: &str) {
    let suspicious = ["+)+", "*)*", "+)*", "*)+"];
    if suspicious.iter().any(|s| source.contains(s)) {
        tracing::warn!(pattern = %source, "pattern has nested unbounded quantifiers; compiled anyway");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_by_source_string() {
        let a = PatternCache::get("abc", false).unwrap();
        let b = PatternCache::get("abc", false).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn invalid_regex_returns_none() {
        assert!(PatternCache::get("([", false).is_none());
    }

    #[test]
    fn case_insensitive_by_default() {
        let re = PatternCache::get("hello", false).unwrap();
        assert!(re.is_match("HELLO"));
    }

    #[test]
    fn respects_explicit_inline_flags() {
        let re = PatternCache::get("(?-i:hello)", false).unwrap();
        assert!(!re.is_match("HELLO"));
    }
}
