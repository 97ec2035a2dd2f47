//! First-responder grant finder.
//!
//! Sources for federal and web grant listings plus the run entry point used
//! by the `fetch` binary.
//!
//! # Modules
//!
//! - [`sources`] - Grants.gov, DHS FRG and generic listing fetchers
//! - [`config`] - Environment configuration
//! - [`cli`] - Command-line overrides

pub mod cli;
pub mod config;
pub mod sources;

pub use cli::Cli;
pub use config::Config;

use aggregation::{run_pipeline, store, FetcherRegistry, RunReport};
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run every permitted fetcher in `registry` and write the artifact.
///
/// Fetcher failures are logged and reported, never returned as errors. A
/// cancelled run writes nothing.
pub async fn run(
    config: &Config,
    registry: &FetcherRegistry,
    cancel: CancellationToken,
) -> Result<RunReport> {
    let fetchers = registry.discover(&config.scrapers);
    info!(
        loaded = fetchers.len(),
        allowlist = ?config.scrapers.entries().collect::<Vec<_>>(),
        "Fetchers discovered"
    );

    let report = run_pipeline(&fetchers, &config.pipeline(), cancel)
        .await
        .context("Pipeline run failed")?;

    for outcome in report.failures() {
        warn!(
            run_id = %report.run_id,
            fetcher = %outcome.metadata.name,
            reason = %outcome.failure_reason().unwrap_or_default(),
            "Fetcher produced no records"
        );
    }

    store::write_artifact(&config.output_path, &report.artifact).with_context(|| {
        format!("Failed to write artifact to {}", config.output_path.display())
    })?;

    info!(
        run_id = %report.run_id,
        path = %config.output_path.display(),
        loaded = report.outcomes.len(),
        succeeded = report.outcomes.len() - report.failures().count(),
        failed = report.failures().count(),
        count = report.artifact.count,
        "Artifact written"
    );

    for (source, count) in &report.artifact.source_counts {
        info!(source = %source, count, "Source total");
    }
    for (source, keywords) in report.artifact.meta.keyword_lines() {
        info!(source = %source, keywords = %keywords, "Source keywords");
    }

    Ok(report)
}
