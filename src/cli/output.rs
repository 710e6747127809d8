//! Report rendering. Only `text` and `json` are real formatters here —
//! csv/yaml/junit/gitlab-sast are out of scope per spec.md §1 ("output
//! formatters... out of scope") and degrade to `text` with a warning rather
//! than silently picking one shape.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::orchestrator::ScanReport;

use super::OutputFormat;

pub fn warn_user(quiet: bool, message: &str) {
    if !quiet {
        tracing::warn!("{message}");
    }
}

#[derive(Serialize)]
struct JsonMatch {
    r#type: String,
    validator_id: &'static str,
    text: String,
    filename: String,
    line: u32,
    column: u32,
    confidence: f64,
}

#[derive(Serialize)]
struct JsonReport {
    matches: Vec<JsonMatch>,
    files_scanned: usize,
    files_skipped: usize,
    files_failed: usize,
    total_matches: usize,
    cancelled: bool,
}

pub fn emit(
    report: &ScanReport,
    format: OutputFormat,
    output: Option<&Path>,
    quiet: bool,
    verbose: bool,
) -> Result<()> {
    let effective_format = match format {
        OutputFormat::Text | OutputFormat::Json => format,
        other => {
            warn_user(
                quiet,
                &format!("{other:?} formatter is out of scope for this crate; falling back to text"),
            );
            OutputFormat::Text
        }
    };

    let rendered = match effective_format {
        OutputFormat::Json => render_json(report)?,
        _ => render_text(report, quiet, verbose),
    };

    match output {
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("writing report to {}", path.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes()).context("writing report to stdout")?;
        }
    }
    Ok(())
}

fn render_json(report: &ScanReport) -> Result<String> {
    let matches = report
        .matches
        .iter()
        .map(|m| JsonMatch {
            r#type: m.finding_type.clone(),
            validator_id: m.validator_id,
            text: m.matched_text.clone(),
            filename: m.filename(),
            line: m.coordinate.line,
            column: m.coordinate.column,
            confidence: (m.confidence * 100.0).round() / 100.0,
        })
        .collect();

    let payload = JsonReport {
        matches,
        files_scanned: report.stats.files_scanned,
        files_skipped: report.stats.files_skipped,
        files_failed: report.stats.files_failed,
        total_matches: report.matches.len(),
        cancelled: report.cancelled,
    };
    serde_json::to_string_pretty(&payload).context("serializing report as JSON")
}

fn render_text(report: &ScanReport, quiet: bool, verbose: bool) -> String {
    let mut out = String::new();

    if !quiet {
        for m in &report.matches {
            out.push_str(&format!(
                "{}:{}: [{}] {} (confidence {:.0})\n",
                m.filename(),
                m.coordinate.line,
                m.validator_id,
                m.finding_type,
                m.confidence
            ));
        }
    }

    out.push_str(&format!(
        "\nscanned {} file(s), {} skipped, {} failed, {} finding(s)\n",
        report.stats.files_scanned,
        report.stats.files_skipped,
        report.stats.files_failed,
        report.matches.len()
    ));

    if verbose {
        out.push_str(&format!(
            "throughput: {:.2} MiB/s over {} ms\n",
            report.stats.throughput_mb_per_sec(),
            report.stats.scan_duration_ms
        ));
        for error in &report.file_errors {
            out.push_str(&format!("error: {}: {}\n", error.path.display(), error.message));
        }
        for result in &report.file_results {
            if let Some(reason) = result.skipped_reason {
                out.push_str(&format!("skipped: {}: {}\n", result.path.display(), reason));
            }
        }
    }

    if report.cancelled {
        out.push_str("scan cancelled: results are partial\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::FileError;
    use crate::stats::ScanStats;

    fn empty_report() -> ScanReport {
        ScanReport {
            matches: vec![],
            file_results: vec![],
            file_errors: vec![],
            stats: ScanStats::default(),
            cancelled: false,
        }
    }

    #[test]
    fn text_report_mentions_scanned_count() {
        let report = empty_report();
        let rendered = render_text(&report, false, false);
        assert!(rendered.contains("scanned 0 file(s)"));
    }

    #[test]
    fn json_report_serializes_empty_matches() {
        let report = empty_report();
        let rendered = render_json(&report).unwrap();
        assert!(rendered.contains("\"matches\": []"));
    }

    #[test]
    fn verbose_text_lists_file_errors() {
        let mut report = empty_report();
        report.file_errors.push(FileError { path: "a.txt".into(), message: "boom".to_string() });
        let rendered = render_text(&report, false, true);
        assert!(rendered.contains("boom"));
    }

    #[test]
    fn cancelled_scan_notes_partial_results() {
        let mut report = empty_report();
        report.cancelled = true;
        let rendered = render_text(&report, false, false);
        assert!(rendered.contains("partial"));
    }
}
