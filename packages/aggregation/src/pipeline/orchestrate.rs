//! Orchestration - run every fetcher with failure isolation.
//!
//! Fetchers run with bounded concurrency, each under its own timeout. Errors,
//! timeouts and panics become [`FetchOutcome`] entries; they never abort the
//! run. Results are concatenated in discovery order no matter which fetcher
//! finishes first, so downstream dedup stays deterministic.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{FutureExt, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{FetchError, PipelineError, Result};
use crate::traits::fetcher::{Fetcher, FetcherMetadata};
use crate::types::config::OrchestratorConfig;
use crate::types::record::ListingRecord;

/// How a single fetcher invocation finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    /// Returned records (possibly none)
    Succeeded { records: usize },

    /// Returned an error or panicked
    Failed { reason: String },

    /// Exceeded the per-fetcher timeout
    TimedOut { after: Duration },
}

/// Diagnostic entry for one invoked fetcher.
#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    /// Declared metadata of the fetcher
    pub metadata: FetcherMetadata,

    /// The fetcher was constructed
    pub loaded: bool,

    /// The fetcher exposes a callable entry point
    pub callable: bool,

    /// How the invocation ended
    pub status: FetchStatus,

    /// Wall-clock time spent
    pub elapsed: Duration,
}

impl FetchOutcome {
    /// Whether the fetcher produced a result.
    pub fn is_success(&self) -> bool {
        matches!(self.status, FetchStatus::Succeeded { .. })
    }

    /// Failure reason, if the fetcher failed.
    pub fn failure_reason(&self) -> Option<String> {
        match &self.status {
            FetchStatus::Succeeded { .. } => None,
            FetchStatus::Failed { reason } => Some(reason.clone()),
            FetchStatus::TimedOut { after } => Some(FetchError::Timeout(*after).to_string()),
        }
    }
}

/// Merged output of an orchestration pass.
#[derive(Debug, Clone, Default)]
pub struct OrchestrationReport {
    /// All records, grouped by fetcher in discovery order
    pub records: Vec<ListingRecord>,

    /// One entry per invoked fetcher, in discovery order
    pub outcomes: Vec<FetchOutcome>,
}

impl OrchestrationReport {
    /// Outcomes of fetchers that failed or timed out.
    pub fn failures(&self) -> impl Iterator<Item = &FetchOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Number of fetchers that completed successfully.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }
}

/// Runs fetchers and collects their records.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator.
    pub fn new(config: OrchestratorConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Invoke every fetcher and merge the results.
    pub async fn run(&self, fetchers: &[Arc<dyn Fetcher>]) -> OrchestrationReport {
        let timeout = self.config.fetch_timeout;

        info!(
            fetchers = fetchers.len(),
            concurrency = self.config.concurrency,
            "Running fetchers"
        );

        // `buffered` yields in input order, whatever the completion order.
        let results: Vec<(FetchOutcome, Vec<ListingRecord>)> =
            futures::stream::iter(fetchers.iter().cloned())
                .map(|fetcher| invoke(fetcher, timeout))
                .buffered(self.config.concurrency.max(1))
                .collect()
                .await;

        let mut report = OrchestrationReport::default();
        for (outcome, records) in results {
            report.records.extend(records);
            report.outcomes.push(outcome);
        }

        info!(
            records = report.records.len(),
            succeeded = report.succeeded(),
            failed = report.outcomes.len() - report.succeeded(),
            "Fetchers finished"
        );

        report
    }

    /// Like [`run`](Self::run), but abandons everything on cancellation.
    ///
    /// A cancelled run returns [`PipelineError::Cancelled`]; partial results
    /// are dropped.
    pub async fn run_with_cancel(
        &self,
        fetchers: &[Arc<dyn Fetcher>],
        cancel: CancellationToken,
    ) -> Result<OrchestrationReport> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Orchestration cancelled, discarding partial results");
                Err(PipelineError::Cancelled)
            }
            report = self.run(fetchers) => Ok(report),
        }
    }
}

/// Invoke one fetcher, converting every failure mode into an outcome.
async fn invoke(
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
) -> (FetchOutcome, Vec<ListingRecord>) {
    let metadata = fetcher.metadata();
    let started = Instant::now();
    debug!(fetcher = %metadata.name, "Fetcher starting");

    let call = AssertUnwindSafe(fetcher.fetch()).catch_unwind();
    let result = match tokio::time::timeout(timeout, call).await {
        Ok(Ok(result)) => result,
        Ok(Err(panic)) => Err(FetchError::Panicked(panic_message(panic.as_ref()))),
        Err(_) => Err(FetchError::Timeout(timeout)),
    };
    let elapsed = started.elapsed();

    let (status, records) = match result {
        Ok(records) => {
            info!(
                fetcher = %metadata.name,
                records = records.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Fetcher complete"
            );
            (FetchStatus::Succeeded { records: records.len() }, records)
        }
        Err(FetchError::Timeout(after)) => {
            warn!(fetcher = %metadata.name, ?after, "Fetcher timed out");
            (FetchStatus::TimedOut { after }, Vec::new())
        }
        Err(e) => {
            warn!(fetcher = %metadata.name, error = %e, "Fetcher failed");
            (FetchStatus::Failed { reason: e.to_string() }, Vec::new())
        }
    };

    let outcome = FetchOutcome {
        metadata,
        loaded: true,
        callable: true,
        status,
        elapsed,
    };

    (outcome, records)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
