//! Error taxonomy shared across the crate.
//!
//! Each component reports failure through its own enum and never panics past
//! its boundary. The validation orchestrator is the single place that folds
//! residual failures into a structured error report.

use thiserror::Error;

/// Manifest extraction failures. `NotFound` (the archive opened fine but has
/// no manifest entry) is deliberately distinct from the corrupt variants so
/// user-visible messages can tell the two apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("backup archive is not a readable tar stream: {0}")]
    Corrupt(String),
    #[error("no manifest.json entry found in backup archive")]
    NotFound,
    #[error("manifest.json is present but could not be parsed: {0}")]
    InvalidJson(String),
}

/// Supervisor API failures. Never retried here; callers report them upward.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("supervisor request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("supervisor returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected supervisor response shape: {0}")]
    Decode(String),
}

/// Failures reading or writing a persisted JSON document (the breaking-change
/// database and the add-on configuration).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a valid JSON document: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Aggregate failure for one validation call. The orchestrator pattern-matches
/// on this and downgrades it to a `status = error` report.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("failed to fetch from supervisor: {0}")]
    Fetch(#[from] ApiError),
    #[error(transparent)]
    Analyze(#[from] ManifestError),
}
