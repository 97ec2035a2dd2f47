use std::path::PathBuf;
use std::time::Duration;

use aggregation::{AllowList, DedupKey};
use anyhow::{Context, Result};
use clap::Parser;

use crate::config::Config;

/// Aggregate grant listings from every enabled source into one JSON file.
///
/// Unset flags keep the values from the environment (and `.env`).
#[derive(Debug, Parser)]
#[command(name = "fetch", version)]
pub struct Cli {
    /// Comma-separated fetcher names or slugs to run (default: all)
    #[arg(long)]
    pub scrapers: Option<String>,

    /// Where to write the artifact
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Fetchers running at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-fetcher time limit in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Grants.gov search rows per keyword
    #[arg(long)]
    pub max_rows: Option<u32>,

    /// Dedup identity: url, id or field:<name>
    #[arg(long)]
    pub dedup_key: Option<String>,

    /// Extra listing pages for the generic scraper (repeatable)
    #[arg(long = "listing-url")]
    pub listing_urls: Vec<String>,

    /// Print the discoverable fetchers and exit
    #[arg(long)]
    pub list: bool,
}

impl Cli {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(scrapers) = &self.scrapers {
            config.scrapers = AllowList::parse(scrapers);
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(secs) = self.timeout_secs {
            config.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(rows) = self.max_rows {
            config.grants_gov_max_rows = rows;
        }
        if let Some(key) = &self.dedup_key {
            config.dedup_key = DedupKey::parse(key)
                .with_context(|| format!("--dedup-key must be url, id or field:<name>, got {key:?}"))?;
        }
        config.multi_source_urls.extend(self.listing_urls.iter().cloned());
        Ok(())
    }
}
