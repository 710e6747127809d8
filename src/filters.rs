//! Directory-level filters — cheap, metadata-only checks applied before any
//! file is opened (spec.md §4.1's discovery contract; SPEC_FULL.md §3's
//! "directory-filter fast path"). Grounded on the teacher's
//! `scan/filters/traits.rs` (`Filter`/`FilterDecision`/`DirectoryFilter`)
//! and `scan/filters/directory/{size,path,binary}.rs`, whose bodies were
//! placeholders in the teacher — the trait shape is kept, the bodies are
//! real here.

use std::path::Path;

use crate::router::FileRouter;

/// Outcome of running a single filter over one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Process,
    Skip(&'static str),
}

/// Base filter trait every directory-level filter implements.
pub trait DirectoryFilter {
    fn filter(&self, path: &Path) -> FilterDecision;
    fn name(&self) -> &'static str;
}

/// Rejects anything over the configured byte ceiling (100 MiB default, per
/// spec.md §4.1) without reading file content.
pub struct SizeFilter {
    max_size_bytes: u64,
}

impl SizeFilter {
    pub fn new(max_size_mib: u64) -> Self {
        Self { max_size_bytes: max_size_mib * 1024 * 1024 }
    }
}

impl DirectoryFilter for SizeFilter {
    fn filter(&self, path: &Path) -> FilterDecision {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > self.max_size_bytes => FilterDecision::Skip("too_large"),
            Ok(_) => FilterDecision::Process,
            Err(_) => FilterDecision::Skip("io_error"),
        }
    }

    fn name(&self) -> &'static str {
        "SizeFilter"
    }
}

/// Rejects paths matching one of a small set of literal substring
/// ignore-patterns (e.g. `node_modules/`, `.git/`) supplied by the caller —
/// a cheap pre-check ahead of the `ignore` crate's gitignore-aware walk,
/// for patterns the caller wants honored regardless of `.gitignore` state.
pub struct PathFilter {
    ignore_patterns: Vec<String>,
}

impl PathFilter {
    pub fn new(ignore_patterns: Vec<String>) -> Self {
        Self { ignore_patterns }
    }
}

impl DirectoryFilter for PathFilter {
    fn filter(&self, path: &Path) -> FilterDecision {
        let path_str = path.to_string_lossy();
        if self.ignore_patterns.iter().any(|p| path_str.contains(p.as_str())) {
            FilterDecision::Skip("ignored_path")
        } else {
            FilterDecision::Process
        }
    }

    fn name(&self) -> &'static str {
        "PathFilter"
    }
}

/// Rejects files whose extension isn't in the supported set (spec.md §6's
/// plain-text or metadata-capable extension tables) without opening them.
pub struct BinaryFilter {
    router: FileRouter,
}

impl BinaryFilter {
    pub fn new(router: FileRouter) -> Self {
        Self { router }
    }
}

impl DirectoryFilter for BinaryFilter {
    fn filter(&self, path: &Path) -> FilterDecision {
        if self.router.is_supported(path) {
            FilterDecision::Process
        } else {
            FilterDecision::Skip("unsupported_format")
        }
    }

    fn name(&self) -> &'static str {
        "BinaryFilter"
    }
}

/// Runs `filters` in order, short-circuiting on the first `Skip`. Mirrors
/// the teacher's stated filter hierarchy: path, then size, then binary.
pub fn run_all(filters: &[&dyn DirectoryFilter], path: &Path) -> FilterDecision {
    for filter in filters {
        let decision = filter.filter(path);
        if matches!(decision, FilterDecision::Skip(_)) {
            return decision;
        }
    }
    FilterDecision::Process
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn size_filter_skips_oversized_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.txt");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();
        let filter = SizeFilter::new(0); // 0 MiB ceiling: anything is too large
        assert_eq!(filter.filter(&path), FilterDecision::Skip("too_large"));
    }

    #[test]
    fn path_filter_skips_matching_substrings() {
        let filter = PathFilter::new(vec!["node_modules".to_string()]);
        assert_eq!(
            filter.filter(Path::new("/repo/node_modules/lib/index.js")),
            FilterDecision::Skip("ignored_path")
        );
        assert_eq!(filter.filter(Path::new("/repo/src/main.rs")), FilterDecision::Process);
    }

    #[test]
    fn binary_filter_skips_unsupported_extensions() {
        let filter = BinaryFilter::new(FileRouter::new());
        assert_eq!(filter.filter(Path::new("a.exe")), FilterDecision::Skip("unsupported_format"));
        assert_eq!(filter.filter(Path::new("a.txt")), FilterDecision::Process);
    }

    #[test]
    fn run_all_short_circuits_on_first_skip() {
        let size = SizeFilter::new(1000);
        let binary = BinaryFilter::new(FileRouter::new());
        let filters: Vec<&dyn DirectoryFilter> = vec![&size, &binary];
        let decision = run_all(&filters, Path::new("a.exe"));
        assert_eq!(decision, FilterDecision::Skip("unsupported_format"));
    }
}
