//! Aggregation pipeline.
//!
//! The pipeline orchestrates:
//! - Orchestration (run fetchers, isolate failures)
//! - Canonical IDs
//! - Deduplication (first-seen wins)
//! - Sorting (newest first)
//! - Aggregation (counts, keywords, artifact)

pub mod aggregate;
pub mod canonical;
pub mod dedupe;
pub mod orchestrate;
pub mod sort;

pub use aggregate::{assemble, declared_keywords, source_counts};
pub use canonical::{assign_id, canonical_id, canonicalize};
pub use dedupe::dedupe;
pub use orchestrate::{FetchOutcome, FetchStatus, OrchestrationReport, Orchestrator};
pub use sort::{compare_records, sort_records};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::traits::fetcher::Fetcher;
use crate::types::artifact::RunArtifact;
use crate::types::config::{DedupKey, PipelineConfig};
use crate::types::record::ListingRecord;

/// Result of a full pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Identifier used in this run's log lines
    pub run_id: Uuid,

    /// The assembled artifact
    pub artifact: RunArtifact,

    /// One entry per invoked fetcher, in discovery order
    pub outcomes: Vec<FetchOutcome>,
}

impl RunReport {
    /// Outcomes of fetchers that failed or timed out.
    pub fn failures(&self) -> impl Iterator<Item = &FetchOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Canonicalize → dedupe → sort.
pub fn process(records: Vec<ListingRecord>, key: &DedupKey) -> Vec<ListingRecord> {
    let merged = records.len();
    let mut records = dedupe(canonicalize(records), key);
    sort_records(&mut records);

    info!(
        merged,
        unique = records.len(),
        dropped = merged - records.len(),
        "Records deduplicated and sorted"
    );

    records
}

/// Run every fetcher and assemble the artifact.
///
/// Returns [`PipelineError::Cancelled`](crate::error::PipelineError::Cancelled)
/// if `cancel` fires before all fetchers finish; no artifact is produced in
/// that case.
pub async fn run_pipeline(
    fetchers: &[Arc<dyn Fetcher>],
    config: &PipelineConfig,
    cancel: CancellationToken,
) -> Result<RunReport> {
    let run_id = Uuid::now_v7();
    let span = tracing::info_span!("pipeline_run", %run_id);

    async move {
        let orchestrator = Orchestrator::new(config.orchestrator.clone());
        let report = orchestrator.run_with_cancel(fetchers, cancel).await?;

        let records = process(report.records, &config.dedup_key);
        let artifact = assemble(records, &report.outcomes);

        info!(
            count = artifact.count,
            sources = artifact.source_counts.len(),
            "Artifact assembled"
        );

        Ok(RunReport {
            run_id,
            artifact,
            outcomes: report.outcomes,
        })
    }
    .instrument(span)
    .await
}
