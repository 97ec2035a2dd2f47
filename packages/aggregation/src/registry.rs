//! Static fetcher registry and allow-list filtering.
//!
//! Fetchers are registered by name with a constructor at program start.
//! [`FetcherRegistry::discover`] instantiates the ones the allow-list
//! permits, in name order, so diagnostics read the same on every run.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use crate::error::FetchResult;
use crate::traits::fetcher::Fetcher;

/// Name reserved for shared helpers that are not fetchers themselves.
pub const SHARED_UTILITIES_NAME: &str = "base";

/// Constructor for a registered fetcher.
pub type FetcherFactory = Box<dyn Fn() -> FetchResult<Arc<dyn Fetcher>> + Send + Sync>;

/// Names hidden from discovery: `_`-prefixed entries and the shared utilities.
pub fn is_private(name: &str) -> bool {
    name.starts_with('_') || name == SHARED_UTILITIES_NAME
}

/// Set of fetcher names/slugs permitted to run.
///
/// An empty allow-list permits everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    entries: BTreeSet<String>,
}

impl AllowList {
    /// Permit every fetcher.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list. Blank entries are ignored.
    pub fn parse(raw: &str) -> Self {
        Self {
            entries: raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Read the list from an environment variable; unset means "all".
    pub fn from_env(var: &str) -> Self {
        std::env::var(var)
            .map(|raw| Self::parse(&raw))
            .unwrap_or_default()
    }

    /// Whether no restriction is in place.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a fetcher with this name and declared slug may run.
    pub fn permits(&self, name: &str, slug: Option<&str>) -> bool {
        self.is_empty()
            || self.entries.contains(name)
            || slug.is_some_and(|s| self.entries.contains(s))
    }

    /// Entries in sorted order.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|s| Into::<String>::into(s).trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// Name → constructor mapping for every known fetcher.
#[derive(Default)]
pub struct FetcherRegistry {
    factories: BTreeMap<String, FetcherFactory>,
}

impl FetcherRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under `name`, replacing any earlier one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> FetchResult<Arc<dyn Fetcher>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Register a constructor (builder pattern).
    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> FetchResult<Arc<dyn Fetcher>> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    /// Register an already-built fetcher under its own name.
    pub fn with_fetcher(self, fetcher: Arc<dyn Fetcher>) -> Self {
        let name = fetcher.name().to_string();
        self.with(name, move || Ok(Arc::clone(&fetcher)))
    }

    /// Registered names in discovery order, private ones included.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Number of registered constructors.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiate the public fetchers the allow-list permits, sorted by name.
    ///
    /// Constructors that fail are skipped; they never count as run failures.
    pub fn discover(&self, allowlist: &AllowList) -> Vec<Arc<dyn Fetcher>> {
        let mut discovered = Vec::new();

        for (name, factory) in &self.factories {
            if is_private(name) {
                debug!(fetcher = %name, "Skipping private registry entry");
                continue;
            }

            let fetcher = match factory() {
                Ok(fetcher) => fetcher,
                Err(e) => {
                    debug!(fetcher = %name, error = %e, "Fetcher failed to load, skipping");
                    continue;
                }
            };

            if !allowlist.permits(name, fetcher.slug()) {
                debug!(fetcher = %name, "Fetcher not in allow-list");
                continue;
            }

            discovered.push(fetcher);
        }

        debug!(
            registered = self.factories.len(),
            discovered = discovered.len(),
            "Fetcher discovery complete"
        );

        discovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::testing::MockFetcher;

    fn registry() -> FetcherRegistry {
        FetcherRegistry::new()
            .with_fetcher(Arc::new(MockFetcher::new("multi_source")))
            .with_fetcher(Arc::new(MockFetcher::new("grants_gov").with_slug("grants.gov")))
            .with_fetcher(Arc::new(MockFetcher::new("dhs_frg")))
            .with_fetcher(Arc::new(MockFetcher::new("base")))
            .with_fetcher(Arc::new(MockFetcher::new("_scratch")))
    }

    fn names(fetchers: &[Arc<dyn Fetcher>]) -> Vec<String> {
        fetchers.iter().map(|f| f.name().to_string()).collect()
    }

    #[test]
    fn test_discover_sorted_and_skips_private() {
        let found = registry().discover(&AllowList::all());
        assert_eq!(names(&found), vec!["dhs_frg", "grants_gov", "multi_source"]);
    }

    #[test]
    fn test_allowlist_by_name_or_slug() {
        let found = registry().discover(&AllowList::parse("grants.gov, multi_source"));
        assert_eq!(names(&found), vec!["grants_gov", "multi_source"]);
    }

    #[test]
    fn test_allowlist_cannot_enable_private_entries() {
        let found = registry().discover(&AllowList::parse("base,_scratch"));
        assert!(found.is_empty());
    }

    #[test]
    fn test_allowlist_unknown_slug_yields_nothing() {
        let found = registry().discover(&AllowList::parse("nope"));
        assert!(found.is_empty());
    }

    #[test]
    fn test_failed_constructor_is_skipped() {
        let registry = registry().with("broken", || Err(FetchError::Config("missing key".into())));
        let found = registry.discover(&AllowList::all());
        assert_eq!(names(&found), vec!["dhs_frg", "grants_gov", "multi_source"]);
    }

    #[test]
    fn test_parse_allowlist() {
        assert!(AllowList::parse("").is_empty());
        assert!(AllowList::parse(" , ,").is_empty());

        let list = AllowList::parse("dhs_frg, grants.gov,,");
        assert_eq!(list.entries().collect::<Vec<_>>(), vec!["dhs_frg", "grants.gov"]);
        assert!(list.permits("dhs_frg", None));
        assert!(list.permits("grants_gov", Some("grants.gov")));
        assert!(!list.permits("multi_source", None));
    }

    #[test]
    fn test_allowlist_from_iter() {
        let list: AllowList = ["a", " ", "b"].into_iter().collect();
        assert_eq!(list.entries().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_allowlist_from_iter_trims_entries() {
        let list: AllowList = [" dhs_frg", "grants.gov\n"].into_iter().collect();
        assert_eq!(list.entries().collect::<Vec<_>>(), vec!["dhs_frg", "grants.gov"]);
        assert!(list.permits("dhs_frg", None));
        assert!(list.permits("grants_gov", Some("grants.gov")));
    }
}
