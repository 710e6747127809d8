//! Scan statistics (SPEC_FULL.md §3's "statistics collection" supplement).
//! Grounded on the teacher's `scan/data/stats.rs` almost verbatim: an
//! atomic `StatsCollector` accumulated by workers, converted once at the
//! end into a plain `ScanStats` snapshot for reporting. Generalized from
//! the teacher's comment/entropy filter counters to this crate's own
//! filter stages (directory fast-path, ignore-comments, suppression).

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Immutable snapshot of one scan's statistics.
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub total_files_discovered: usize,

    pub total_matches: usize,

    pub total_bytes_processed: u64,
    pub total_lines_processed: usize,
    pub scan_duration_ms: u64,

    pub files_filtered_by_size: usize,
    pub files_filtered_by_binary: usize,
    pub files_filtered_by_path: usize,
    pub matches_filtered_by_ignore_comment: usize,
    pub matches_filtered_by_suppression: usize,
}

impl ScanStats {
    pub fn throughput_mb_per_sec(&self) -> f64 {
        if self.scan_duration_ms == 0 {
            return 0.0;
        }
        let mb = self.total_bytes_processed as f64 / (1024.0 * 1024.0);
        let seconds = self.scan_duration_ms as f64 / 1000.0;
        mb / seconds
    }
}

/// Thread-safe collector workers update concurrently via relaxed atomics
/// (no ordering dependency between counters; only the final snapshot after
/// the worker pool joins is ever read as a whole).
#[derive(Debug, Default)]
pub struct StatsCollector {
    files_scanned: AtomicUsize,
    files_skipped: AtomicUsize,
    files_failed: AtomicUsize,
    total_files_discovered: AtomicUsize,
    total_matches: AtomicUsize,
    total_bytes_processed: AtomicU64,
    total_lines_processed: AtomicUsize,
    files_filtered_by_size: AtomicUsize,
    files_filtered_by_binary: AtomicUsize,
    files_filtered_by_path: AtomicUsize,
    matches_filtered_by_ignore_comment: AtomicUsize,
    matches_filtered_by_suppression: AtomicUsize,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_discovered(&self, count: usize) {
        self.total_files_discovered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_skip(&self, reason: &str) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
        match reason {
            "too_large" => {
                self.files_filtered_by_size.fetch_add(1, Ordering::Relaxed);
            }
            "unsupported_format" => {
                self.files_filtered_by_binary.fetch_add(1, Ordering::Relaxed);
            }
            "ignored_path" => {
                self.files_filtered_by_path.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    pub fn record_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scanned(&self, bytes: u64, lines: usize, matches: usize) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
        self.total_bytes_processed.fetch_add(bytes, Ordering::Relaxed);
        self.total_lines_processed.fetch_add(lines, Ordering::Relaxed);
        self.total_matches.fetch_add(matches, Ordering::Relaxed);
    }

    pub fn record_ignore_comment_drops(&self, count: usize) {
        self.matches_filtered_by_ignore_comment.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_suppression_drops(&self, count: usize) {
        self.matches_filtered_by_suppression.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self, scan_duration_ms: u64) -> ScanStats {
        ScanStats {
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            total_files_discovered: self.total_files_discovered.load(Ordering::Relaxed),
            total_matches: self.total_matches.load(Ordering::Relaxed),
            total_bytes_processed: self.total_bytes_processed.load(Ordering::Relaxed),
            total_lines_processed: self.total_lines_processed.load(Ordering::Relaxed),
            scan_duration_ms,
            files_filtered_by_size: self.files_filtered_by_size.load(Ordering::Relaxed),
            files_filtered_by_binary: self.files_filtered_by_binary.load(Ordering::Relaxed),
            files_filtered_by_path: self.files_filtered_by_path.load(Ordering::Relaxed),
            matches_filtered_by_ignore_comment: self.matches_filtered_by_ignore_comment.load(Ordering::Relaxed),
            matches_filtered_by_suppression: self.matches_filtered_by_suppression.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_skips_by_reason() {
        let collector = StatsCollector::new();
        collector.record_skip("too_large");
        collector.record_skip("unsupported_format");
        collector.record_skip("ignored_path");
        let stats = collector.snapshot(0);
        assert_eq!(stats.files_skipped, 3);
        assert_eq!(stats.files_filtered_by_size, 1);
        assert_eq!(stats.files_filtered_by_binary, 1);
        assert_eq!(stats.files_filtered_by_path, 1);
    }

    #[test]
    fn throughput_is_zero_with_no_duration() {
        let stats = ScanStats::default();
        assert_eq!(stats.throughput_mb_per_sec(), 0.0);
    }
}
