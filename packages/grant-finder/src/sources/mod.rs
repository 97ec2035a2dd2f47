//! Listing sources.
//!
//! Every source is registered here under its name; discovery order is the
//! sorted registry order.

pub mod base;
pub mod dhs_frg;
pub mod grants_gov;
pub mod multi_source;

use std::sync::Arc;

use aggregation::{FetchError, Fetcher, FetcherRegistry};
use grants_gov_client::GrantsGovClient;

use crate::config::Config;

/// Registry of every known source, configured from `config`.
pub fn registry(config: &Config) -> FetcherRegistry {
    let max_rows = config.grants_gov_max_rows;
    let urls = config.multi_source_urls.clone();
    let selectors = config.multi_source_selectors.clone();

    FetcherRegistry::new()
        .with(grants_gov::NAME, move || {
            let client = GrantsGovClient::new().map_err(FetchError::http)?;
            Ok(Arc::new(grants_gov::GrantsGovFetcher::new(client).with_max_rows(max_rows))
                as Arc<dyn Fetcher>)
        })
        .with(dhs_frg::NAME, || Ok(Arc::new(dhs_frg::DhsFrgFetcher::new()) as Arc<dyn Fetcher>))
        .with(multi_source::NAME, move || {
            Ok(Arc::new(
                multi_source::MultiSourceFetcher::new(urls.clone()).with_overrides(selectors.clone()),
            ) as Arc<dyn Fetcher>)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggregation::AllowList;

    fn config() -> Config {
        Config::from_lookup(|_| None).unwrap()
    }

    #[test]
    fn test_registry_names_in_discovery_order() {
        let registry = registry(&config());
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["dhs_frg", "grants_gov", "multi_source"]);
    }

    #[test]
    fn test_discover_by_slug() {
        let fetchers = registry(&config()).discover(&AllowList::parse("grants.gov"));
        assert_eq!(fetchers.len(), 1);
        assert_eq!(fetchers[0].name(), "grants_gov");
    }

    #[test]
    fn test_discover_all() {
        let fetchers = registry(&config()).discover(&AllowList::all());
        let slugs: Vec<_> = fetchers.iter().map(|f| f.metadata().key().to_string()).collect();
        assert_eq!(slugs, vec!["dhs_frg", "grants.gov", "multi_source"]);
    }
}
