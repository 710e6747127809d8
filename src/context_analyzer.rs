//! `ContextAnalyzer` — whole-file heuristic classification (spec §4.7):
//! domain, document structure, environment, and a placeholder language tag.
//! New module; no teacher analog (the teacher never classifies a file
//! before scanning it), but the keyword-set-per-category idiom follows the
//! same shape as `validators::keywords`'s positive/negative lists, and the
//! structural-marker detection (CSV header row, JSON brace density, XML
//! tags) is a simple deterministic heuristic rather than a real parser,
//! matching the teacher's preference for cheap lexical checks over full
//! parsing wherever a full parse isn't otherwise needed.

use std::path::Path;

use crate::model::{ContextAnalysis, Domain, DocumentStructure, Environment};

struct DomainKeywords {
    domain: Domain,
    keywords: &'static [&'static str],
}

const DOMAIN_KEYWORDS: &[DomainKeywords] = &[
    DomainKeywords {
        domain: Domain::Financial,
        keywords: &[
            "invoice", "billing", "payment", "account balance", "transaction", "ledger",
            "routing number", "wire transfer", "statement",
        ],
    },
    DomainKeywords {
        domain: Domain::Healthcare,
        keywords: &[
            "patient", "diagnosis", "prescription", "physician", "medical record", "hipaa",
            "treatment plan", "icd-10",
        ],
    },
    DomainKeywords {
        domain: Domain::Legal,
        keywords: &[
            "plaintiff", "defendant", "hereinafter", "witnesseth", "pursuant to", "affidavit",
            "subpoena",
        ],
    },
    DomainKeywords {
        domain: Domain::Hr,
        keywords: &[
            "employee id", "performance review", "salary", "onboarding", "termination",
            "payroll", "benefits enrollment",
        ],
    },
    DomainKeywords {
        domain: Domain::Government,
        keywords: &[
            "classified", "freedom of information", "federal register", "clearance level",
            "agency use only",
        ],
    },
    DomainKeywords {
        domain: Domain::Personal,
        keywords: &["my address", "my phone", "personal email", "home address", "date of birth"],
    },
];

const ENV_MARKERS: &[(Environment, &[&str])] = &[
    (Environment::Test, &["test", "staging", "sandbox", "example.com", "localhost", "dummy"]),
    (Environment::Staging, &["staging", "pre-prod", "preprod", "uat"]),
];

/// Deterministic, keyword-driven whole-file classifier. Two calls on
/// identical input always produce identical output (spec §4.7's
/// determinism requirement) — no randomness, no clock reads, no I/O beyond
/// what's already in `text`.
pub struct ContextAnalyzer;

impl ContextAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str, path: &Path) -> ContextAnalysis {
        let lower = text.to_lowercase();
        ContextAnalysis {
            domain: Self::classify_domain(&lower),
            document_type: Self::classify_structure(text, path),
            environment: Self::classify_environment(&lower, path),
            language: "en".to_string(),
        }
    }

    fn classify_domain(lower: &str) -> Domain {
        let mut best = Domain::General;
        let mut best_hits = 0usize;
        for entry in DOMAIN_KEYWORDS {
            let hits = entry.keywords.iter().filter(|kw| lower.contains(*kw)).count();
            if hits > best_hits {
                best_hits = hits;
                best = entry.domain;
            }
        }
        best
    }

    fn classify_structure(text: &str, path: &Path) -> DocumentStructure {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            match ext.to_lowercase().as_str() {
                "csv" => return DocumentStructure::Csv,
                "json" => return DocumentStructure::Json,
                "xml" | "html" => return DocumentStructure::Xml,
                _ => {}
            }
        }

        let trimmed = text.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            let brace_density = text.chars().filter(|c| matches!(c, '{' | '}' | '[' | ']')).count();
            if brace_density * 20 >= text.len().max(1) {
                return DocumentStructure::Json;
            }
        }
        if trimmed.starts_with('<') {
            return DocumentStructure::Xml;
        }

        let mut lines = text.lines();
        if let Some(header) = lines.next() {
            let commas = header.matches(',').count();
            if commas >= 2 {
                let second_line_commas = lines.next().map(|l| l.matches(',').count());
                if second_line_commas == Some(commas) {
                    return DocumentStructure::Csv;
                }
            }
        }

        DocumentStructure::Prose
    }

    fn classify_environment(lower: &str, path: &Path) -> Environment {
        let path_str = path.to_string_lossy().to_lowercase();
        for (env, markers) in ENV_MARKERS {
            if markers.iter().any(|m| lower.contains(m) || path_str.contains(m)) {
                return *env;
            }
        }
        Environment::Production
    }
}

impl Default for ContextAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_financial_domain() {
        let analyzer = ContextAnalyzer::new();
        let analysis = analyzer.analyze(
            "Invoice #4471 — billing contact for wire transfer follows.",
            &PathBuf::from("a.txt"),
        );
        assert_eq!(analysis.domain, Domain::Financial);
    }

    #[test]
    fn detects_csv_structure_from_extension() {
        let analyzer = ContextAnalyzer::new();
        let analysis = analyzer.analyze("a,b,c\n1,2,3", &PathBuf::from("data.csv"));
        assert_eq!(analysis.document_type, DocumentStructure::Csv);
    }

    #[test]
    fn detects_test_environment_from_path() {
        let analyzer = ContextAnalyzer::new();
        let analysis = analyzer.analyze("nothing special here", &PathBuf::from("fixtures/test/sample.txt"));
        assert_eq!(analysis.environment, Environment::Test);
    }

    #[test]
    fn is_deterministic() {
        let analyzer = ContextAnalyzer::new();
        let path = PathBuf::from("report.json");
        let a = analyzer.analyze("{\"a\": 1}", &path);
        let b = analyzer.analyze("{\"a\": 1}", &path);
        assert_eq!(a, b);
    }

    #[test]
    fn defaults_to_general_domain_and_prose() {
        let analyzer = ContextAnalyzer::new();
        let analysis = analyzer.analyze("Just a normal paragraph of text.", &PathBuf::from("notes.txt"));
        assert_eq!(analysis.domain, Domain::General);
        assert_eq!(analysis.document_type, DocumentStructure::Prose);
    }
}
