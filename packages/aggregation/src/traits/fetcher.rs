//! Fetcher trait for pluggable listing sources.
//!
//! A fetcher wraps one external data source (a government API, an HTML
//! listing page, ...) and turns it into [`ListingRecord`]s. The pipeline
//! treats every fetcher as a black box: it calls [`Fetcher::fetch`] once per
//! run and reads the static metadata for reporting.
//!
//! # Usage
//!
//! ```rust,ignore
//! use aggregation::traits::fetcher::Fetcher;
//!
//! let records = fetcher.fetch().await?;
//! println!("{} produced {} records", fetcher.name(), records.len());
//! ```

use async_trait::async_trait;
use serde::Serialize;

use crate::error::FetchResult;
use crate::types::record::ListingRecord;

/// A source of listing records.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch every listing this source currently offers.
    ///
    /// An empty list means "nothing found", not failure. Errors are caught by
    /// the orchestrator and reported as diagnostics.
    async fn fetch(&self) -> FetchResult<Vec<ListingRecord>>;

    /// Identifier of this fetcher (its registry name).
    fn name(&self) -> &str;

    /// Declared short source slug, if different from the name.
    fn slug(&self) -> Option<&str> {
        None
    }

    /// Declared keyword list used by this source.
    fn keywords(&self) -> Option<Vec<String>> {
        None
    }

    /// Static metadata for reporting.
    fn metadata(&self) -> FetcherMetadata {
        FetcherMetadata {
            name: self.name().to_string(),
            slug: self.slug().map(str::to_string),
            keywords: self.keywords(),
        }
    }
}

/// Metadata a fetcher declares about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetcherMetadata {
    /// Registry name
    pub name: String,

    /// Declared slug
    pub slug: Option<String>,

    /// Declared keyword list
    pub keywords: Option<Vec<String>>,
}

impl FetcherMetadata {
    /// Key used when reporting: the slug, falling back to the name.
    pub fn key(&self) -> &str {
        self.slug.as_deref().unwrap_or(&self.name)
    }

    /// Declared keywords with duplicates removed, first occurrence kept.
    pub fn unique_keywords(&self) -> Option<Vec<String>> {
        self.keywords.as_ref().map(|keywords| {
            let mut seen = std::collections::HashSet::new();
            keywords
                .iter()
                .filter(|k| seen.insert(k.as_str()))
                .cloned()
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named;

    #[async_trait]
    impl Fetcher for Named {
        async fn fetch(&self) -> FetchResult<Vec<ListingRecord>> {
            Ok(vec![])
        }

        fn name(&self) -> &str {
            "named"
        }
    }

    #[test]
    fn test_metadata_defaults_to_name() {
        let meta = Named.metadata();
        assert_eq!(meta.key(), "named");
        assert_eq!(meta.keywords, None);
        assert_eq!(meta.unique_keywords(), None);
    }

    #[test]
    fn test_unique_keywords_preserve_first_occurrence() {
        let meta = FetcherMetadata {
            name: "grants_gov".to_string(),
            slug: Some("grants.gov".to_string()),
            keywords: Some(vec![
                "wellness".to_string(),
                "cisd".to_string(),
                "wellness".to_string(),
                "stress".to_string(),
            ]),
        };

        assert_eq!(meta.key(), "grants.gov");
        assert_eq!(
            meta.unique_keywords(),
            Some(vec![
                "wellness".to_string(),
                "cisd".to_string(),
                "stress".to_string()
            ])
        );
    }
}
