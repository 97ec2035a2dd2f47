//! Source-Agnostic Listing Aggregation Library
//!
//! Merges listings from many unreliable, partially-overlapping sources into
//! one deduplicated, sorted, canonically-identified artifact.
//!
//! # Design
//!
//! - Sources are black boxes behind the [`Fetcher`] trait
//! - One source failing never fails the run
//! - Output is reproducible: discovery order, first-seen dedup, total sort
//! - Every run is a fresh snapshot; nothing carries across runs
//!
//! # Usage
//!
//! ```rust,ignore
//! use aggregation::{run_pipeline, AllowList, FetcherRegistry, PipelineConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let fetchers = registry.discover(&AllowList::from_env("SCRAPERS"));
//! let report = run_pipeline(&fetchers, &PipelineConfig::default(), CancellationToken::new()).await?;
//! aggregation::store::write_artifact("data/grants.json", &report.artifact)?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - The `Fetcher` abstraction
//! - [`types`] - Records, artifact and config types
//! - [`registry`] - Static fetcher registry and allow-list
//! - [`pipeline`] - Orchestration, canonical IDs, dedup, sort, aggregation
//! - [`store`] - Artifact persistence
//! - [`testing`] - Mock fetchers for tests

pub mod error;
pub mod pipeline;
pub mod registry;
pub mod store;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{FetchError, FetchResult, PipelineError, Result};
pub use registry::{AllowList, FetcherRegistry};
pub use traits::fetcher::{Fetcher, FetcherMetadata};
pub use types::{
    artifact::{ArtifactMeta, RunArtifact},
    config::{DedupKey, OrchestratorConfig, PipelineConfig},
    record::{ListingRecord, DEFAULT_TAGS, MAX_DESCRIPTION_CHARS, RESERVED_FIELDS},
};

// Re-export pipeline components
pub use pipeline::{
    assemble, assign_id, canonical_id, dedupe, process, run_pipeline, sort_records, FetchOutcome,
    FetchStatus, OrchestrationReport, Orchestrator, RunReport,
};

// Re-export testing utilities
pub use testing::{FailingFetcher, MockFetcher};
