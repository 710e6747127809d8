//! Structured error kinds for the scan engine.
//!
//! Library code returns `Result<T, FerretError>` so callers can match on a
//! specific failure kind; the CLI layer collapses everything into
//! `anyhow::Error` with added context, the same split the rest of this
//! crate follows between engine modules and `cli`/`main`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FerretError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported format for {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("preprocessing failed for {path}: {reason}")]
    PreprocessFailed { path: PathBuf, reason: String },

    #[error("pattern compile failed for `{name}`: {source}")]
    PatternCompileFailed {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("validation failed in `{validator}`: {reason}")]
    ValidationFailed { validator: String, reason: String },

    #[error("suppression store corrupt at {path}: {reason}")]
    SuppressionStoreCorrupt { path: PathBuf, reason: String },

    #[error("redaction unsupported for {path}: {reason}")]
    RedactionUnsupported { path: PathBuf, reason: String },

    #[error("scan cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, FerretError>;
