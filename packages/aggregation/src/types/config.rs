//! Configuration types for orchestration and deduplication.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for running fetchers.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum number of fetchers running at once.
    ///
    /// 1 runs fetchers strictly one after another. Default: 4.
    pub concurrency: usize,

    /// Time budget for a single fetcher invocation.
    ///
    /// Default: 600 seconds.
    pub fetch_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            fetch_timeout: Duration::from_secs(600),
        }
    }
}

impl OrchestratorConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run fetchers one at a time.
    pub fn sequential() -> Self {
        Self::default().with_concurrency(1)
    }

    /// Set concurrency (clamped to at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-fetcher timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

/// Which value identifies "the same opportunity" during deduplication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupKey {
    /// The listing URL
    #[default]
    Url,

    /// The canonical ID (title + url digest)
    Id,

    /// A string extension field; records without it fall back to the URL
    Field(String),
}

impl DedupKey {
    /// Parse `url`, `id` or `field:<name>`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "" | "url" => Some(Self::Url),
            "id" => Some(Self::Id),
            other => other
                .strip_prefix("field:")
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| Self::Field(name.to_string())),
        }
    }
}

/// Configuration for a full pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Orchestration settings
    pub orchestrator: OrchestratorConfig,

    /// Identity key for deduplication
    pub dedup_key: DedupKey,
}

impl PipelineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set orchestration settings.
    pub fn with_orchestrator(mut self, orchestrator: OrchestratorConfig) -> Self {
        self.orchestrator = orchestrator;
        self
    }

    /// Set the dedup key.
    pub fn with_dedup_key(mut self, key: DedupKey) -> Self {
        self.dedup_key = key;
        self
    }
}
