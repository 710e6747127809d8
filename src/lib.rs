//! # ferret-scan-core
//!
//! A local-first sensitive-data detection engine: given files on disk, it
//! extracts textual and structural content from heterogeneous formats,
//! routes that content through type-aware validators that detect
//! PII/PHI/secrets, calibrates confidences, suppresses known false
//! positives, and optionally produces redacted copies of the originals.
//!
//! The top-level data flow: `ScanOrchestrator -> FileRouter ->
//! Preprocessors -> ContentRouter -> EnhancedValidatorManager ->
//! (suppression filter) -> RedactionEngine -> results`.

pub mod cli;
pub mod config;
pub mod content_router;
pub mod context_analyzer;
pub mod entropy;
pub mod error;
pub mod filters;
pub mod ignore_comments;
pub mod manager;
pub mod model;
pub mod name_db;
pub mod orchestrator;
pub mod preprocess;
pub mod redaction;
pub mod router;
pub mod stats;
pub mod suppression;
pub mod validators;

pub use error::{FerretError, Result};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
