//! Testing utilities including mock fetchers.
//!
//! These let applications exercise the pipeline without touching the
//! network: canned records, forced failures, hangs and panics.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::Fetcher;
use crate::types::record::ListingRecord;

/// Build a record with an optional `YYYY-MM-DD` posted date.
pub fn listing(title: &str, url: &str, source: &str, posted: Option<&str>) -> ListingRecord {
    ListingRecord::new(title, url, source)
        .with_posted_date(posted.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

/// A mock fetcher returning canned records.
///
/// Clones share the same records and call counter.
///
/// # Example
///
/// ```rust
/// use aggregation::testing::MockFetcher;
///
/// let fetcher = MockFetcher::new("dhs_frg")
///     .with_listing("Peer Support Grant", "https://www.dhs.gov/frg/1");
/// ```
#[derive(Clone)]
pub struct MockFetcher {
    name: String,
    slug: Option<String>,
    keywords: Option<Vec<String>>,
    records: Arc<RwLock<Vec<ListingRecord>>>,
    calls: Arc<RwLock<usize>>,
}

impl MockFetcher {
    /// Create a mock with no records.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: None,
            keywords: None,
            records: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(RwLock::new(0)),
        }
    }

    /// Declare a slug.
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Declare a keyword list.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    /// Add a canned record as-is.
    pub fn with_record(self, record: ListingRecord) -> Self {
        self.records.write().unwrap().push(record);
        self
    }

    /// Add several canned records.
    pub fn with_records(self, records: Vec<ListingRecord>) -> Self {
        self.records.write().unwrap().extend(records);
        self
    }

    /// Add a record whose `source` is this fetcher's slug (or name).
    pub fn with_listing(self, title: &str, url: &str) -> Self {
        let source = self.slug.clone().unwrap_or_else(|| self.name.clone());
        self.with_record(ListingRecord::new(title, url, source))
    }

    /// Number of times `fetch` ran.
    pub fn call_count(&self) -> usize {
        *self.calls.read().unwrap()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self) -> FetchResult<Vec<ListingRecord>> {
        *self.calls.write().unwrap() += 1;
        Ok(self.records.read().unwrap().clone())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn keywords(&self) -> Option<Vec<String>> {
        self.keywords.clone()
    }
}

/// A fetcher that always fails.
pub struct FailingFetcher {
    name: String,
    message: String,
}

impl FailingFetcher {
    /// Create a fetcher failing with `message`.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Fetcher for FailingFetcher {
    async fn fetch(&self) -> FetchResult<Vec<ListingRecord>> {
        Err(FetchError::Http(self.message.clone().into()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A fetcher that waits before answering with its canned records.
pub struct SlowFetcher {
    inner: MockFetcher,
    delay: Duration,
}

impl SlowFetcher {
    /// Wrap a mock so every fetch takes `delay`.
    pub fn new(inner: MockFetcher, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl Fetcher for SlowFetcher {
    async fn fetch(&self) -> FetchResult<Vec<ListingRecord>> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch().await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn slug(&self) -> Option<&str> {
        self.inner.slug()
    }

    fn keywords(&self) -> Option<Vec<String>> {
        self.inner.keywords()
    }
}

/// A fetcher that panics when invoked.
pub struct PanickingFetcher {
    name: String,
}

impl PanickingFetcher {
    /// Create a panicking fetcher.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Fetcher for PanickingFetcher {
    async fn fetch(&self) -> FetchResult<Vec<ListingRecord>> {
        panic!("{} blew up", self.name);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetcher_tracks_calls() {
        let mock = MockFetcher::new("dhs_frg").with_listing("A", "https://x/a");
        let shared = mock.clone();

        assert_eq!(mock.fetch().await.unwrap().len(), 1);
        mock.fetch().await.unwrap();
        assert_eq!(shared.call_count(), 2);
    }

    #[tokio::test]
    async fn test_listing_source_uses_slug() {
        let mock = MockFetcher::new("grants_gov")
            .with_slug("grants.gov")
            .with_listing("A", "https://x/a");

        let records = mock.fetch().await.unwrap();
        assert_eq!(records[0].source, "grants.gov");
    }

    #[tokio::test]
    async fn test_failing_fetcher_errors() {
        let err = FailingFetcher::new("bad", "connection refused")
            .fetch()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_listing_helper_parses_date() {
        let record = listing("A", "https://x/a", "s", Some("2024-01-01"));
        assert_eq!(record.posted_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(listing("A", "u", "s", None).posted_date, None);
    }
}
