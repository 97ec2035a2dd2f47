use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use aggregation::store::DEFAULT_ARTIFACT_PATH;
use aggregation::{AllowList, DedupKey, OrchestratorConfig, PipelineConfig};
use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::sources::grants_gov::DEFAULT_MAX_ROWS;
use crate::sources::multi_source::SelectorOverrides;

/// Run configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Fetchers allowed to run; empty means all
    pub scrapers: AllowList,
    pub output_path: PathBuf,
    pub concurrency: usize,
    pub fetch_timeout: Duration,
    pub grants_gov_max_rows: u32,
    pub dedup_key: DedupKey,
    /// Listing pages for the generic scraper
    pub multi_source_urls: Vec<String>,
    /// Selector overrides keyed by full URL or host
    pub multi_source_selectors: BTreeMap<String, SelectorOverrides>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let set = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            scrapers: set("SCRAPERS")
                .map(|v| AllowList::parse(&v))
                .unwrap_or_default(),
            output_path: set("GRANTS_OUTPUT_PATH")
                .unwrap_or_else(|| DEFAULT_ARTIFACT_PATH.to_string())
                .into(),
            concurrency: set("FETCH_CONCURRENCY")
                .unwrap_or_else(|| "4".to_string())
                .trim()
                .parse()
                .context("FETCH_CONCURRENCY must be a valid number")?,
            fetch_timeout: Duration::from_secs(
                set("FETCH_TIMEOUT_SECS")
                    .unwrap_or_else(|| "600".to_string())
                    .trim()
                    .parse()
                    .context("FETCH_TIMEOUT_SECS must be a valid number")?,
            ),
            grants_gov_max_rows: set("GRANTS_GOV_MAX_ROWS")
                .map(|v| v.trim().parse())
                .transpose()
                .context("GRANTS_GOV_MAX_ROWS must be a valid number")?
                .unwrap_or(DEFAULT_MAX_ROWS),
            dedup_key: set("DEDUP_KEY")
                .map(|v| {
                    DedupKey::parse(&v)
                        .with_context(|| format!("DEDUP_KEY must be url, id or field:<name>, got {v:?}"))
                })
                .transpose()?
                .unwrap_or_default(),
            multi_source_urls: set("MULTI_SOURCE_URLS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            multi_source_selectors: set("MULTI_SOURCE_SELECTORS")
                .map(|v| serde_json::from_str(&v))
                .transpose()
                .context("MULTI_SOURCE_SELECTORS must be a JSON object of selector overrides")?
                .unwrap_or_default(),
        })
    }

    /// Pipeline settings derived from this configuration.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_orchestrator(
                OrchestratorConfig::new()
                    .with_concurrency(self.concurrency)
                    .with_fetch_timeout(self.fetch_timeout),
            )
            .with_dedup_key(self.dedup_key.clone())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert!(config.scrapers.is_empty());
        assert_eq!(config.output_path, PathBuf::from("data/grants.json"));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.fetch_timeout, Duration::from_secs(600));
        assert_eq!(config.grants_gov_max_rows, 400);
        assert_eq!(config.dedup_key, DedupKey::Url);
        assert!(config.multi_source_urls.is_empty());
        assert!(config.multi_source_selectors.is_empty());
    }

    #[test]
    fn test_values_from_environment() {
        let config = config(&[
            ("SCRAPERS", "grants.gov, dhs_frg"),
            ("GRANTS_OUTPUT_PATH", "out/run.json"),
            ("FETCH_CONCURRENCY", "1"),
            ("FETCH_TIMEOUT_SECS", "30"),
            ("GRANTS_GOV_MAX_ROWS", "100"),
            ("DEDUP_KEY", "field:opportunity_number"),
            ("MULTI_SOURCE_URLS", "https://a.gov/grants, ,https://b.org/news"),
            ("MULTI_SOURCE_SELECTORS", r#"{"a.gov": {"card": "li.result"}}"#),
        ])
        .unwrap();

        assert_eq!(config.scrapers.entries().collect::<Vec<_>>(), vec!["dhs_frg", "grants.gov"]);
        assert_eq!(config.output_path, PathBuf::from("out/run.json"));
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.grants_gov_max_rows, 100);
        assert_eq!(config.multi_source_urls, vec!["https://a.gov/grants", "https://b.org/news"]);
        assert_eq!(
            config.multi_source_selectors["a.gov"].card.as_deref(),
            Some("li.result")
        );

        let pipeline = config.pipeline();
        assert_eq!(pipeline.orchestrator.concurrency, 1);
        assert_eq!(pipeline.orchestrator.fetch_timeout, Duration::from_secs(30));
        assert_eq!(
            pipeline.dedup_key,
            DedupKey::Field("opportunity_number".to_string())
        );
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = config(&[("SCRAPERS", "  "), ("FETCH_CONCURRENCY", "")]).unwrap();
        assert!(config.scrapers.is_empty());
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = config(&[("FETCH_CONCURRENCY", "many")]).unwrap_err();
        assert!(err.to_string().contains("FETCH_CONCURRENCY"));

        let err = config(&[("DEDUP_KEY", "title")]).unwrap_err();
        assert!(err.to_string().contains("DEDUP_KEY"));

        let err = config(&[("MULTI_SOURCE_SELECTORS", "not json")]).unwrap_err();
        assert!(err.to_string().contains("MULTI_SOURCE_SELECTORS"));
    }
}
