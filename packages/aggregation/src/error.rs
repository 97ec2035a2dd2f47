//! Typed errors for the aggregation library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so the orchestrator can
//! turn every fetcher failure into a diagnostic instead of swallowing it.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors a fetcher can report from a single invocation.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Upstream answered with a non-success status
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Response body could not be understood
    #[error("parse error: {0}")]
    Parse(String),

    /// Fetcher exceeded its time budget
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Fetcher panicked while running
    #[error("fetcher panicked: {0}")]
    Panicked(String),

    /// Fetcher is misconfigured
    #[error("config error: {0}")]
    Config(String),
}

impl FetchError {
    /// Wrap any error as an HTTP failure.
    pub fn http(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Http(Box::new(err))
    }
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Artifact could not be written to disk
    #[error("failed to write artifact to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact could not be read back
    #[error("failed to read artifact from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact could not be (de)serialized
    #[error("JSON error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Run was cancelled before orchestration finished
    #[error("pipeline run cancelled")]
    Cancelled,
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for fetcher invocations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
