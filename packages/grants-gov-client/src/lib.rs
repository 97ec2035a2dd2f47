//! Pure Grants.gov REST API client.
//!
//! A minimal client for the public Grants.gov v1 API. Supports keyword search
//! over forecasted and posted opportunities (with paging) and fetching the
//! full detail record of one opportunity.
//!
//! # Example
//!
//! ```rust,ignore
//! use grants_gov_client::GrantsGovClient;
//!
//! let client = GrantsGovClient::new()?;
//!
//! let hits = client.search_keyword("first responder", 400).await?;
//! for hit in &hits {
//!     println!("{}", hit.display_title().unwrap_or("(untitled)"));
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{GrantsGovError, Result};
pub use types::{OpportunityDetail, OpportunityHit, SearchData, SearchRequest};

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use types::{ApiResponse, FetchOpportunityRequest};

pub const BASE_URL: &str = "https://api.grants.gov/v1/api";

/// Public opportunity page; append the opportunity ID.
pub const OPPORTUNITY_URL: &str = "https://www.grants.gov/search-results-detail/";

pub const USER_AGENT: &str = "first-responder-grant-finder/1.0 (+github)";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);
const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(150);
const PAGE_ROWS: u32 = 100;

pub struct GrantsGovClient {
    client: reqwest::Client,
    base_url: String,
    page_delay: Duration,
}

impl GrantsGovClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            page_delay: DEFAULT_PAGE_DELAY,
        })
    }

    /// Point the client at another host (e.g. a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Pause between result pages.
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// One page of `search2` results.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchData> {
        let resp: ApiResponse<SearchData> = self.post_json("search2", request).await?;
        Ok(resp.data.unwrap_or_default())
    }

    /// All hits for a keyword, paging until `max_rows` or the hit count is reached.
    pub async fn search_keyword(&self, keyword: &str, max_rows: u32) -> Result<Vec<OpportunityHit>> {
        let mut hits = Vec::new();
        let mut start = 0;

        while start < max_rows {
            let rows = PAGE_ROWS.min(max_rows - start);
            let page = self
                .search(&SearchRequest::new(keyword).page(start, rows))
                .await?;
            let returned = page.opp_hits.len() as u32;

            debug!(keyword, start, returned, hit_count = page.hit_count, "Grants.gov page");
            hits.extend(page.opp_hits);

            if returned == 0 || start + returned >= page.hit_count {
                break;
            }
            start += returned;
            tokio::time::sleep(self.page_delay).await;
        }

        Ok(hits)
    }

    /// Full detail record for one opportunity.
    pub async fn fetch_opportunity(&self, opportunity_id: &str) -> Result<OpportunityDetail> {
        let id: u64 = opportunity_id
            .trim()
            .parse()
            .map_err(|_| GrantsGovError::InvalidOpportunityId(opportunity_id.to_string()))?;

        let resp: ApiResponse<OpportunityDetail> = self
            .post_json("fetchOpportunity", &FetchOpportunityRequest { opportunity_id: id })
            .await?;
        Ok(resp.data.unwrap_or_default())
    }

    async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        let resp = self.client.post(&url).json(body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GrantsGovError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }
}

/// Public page for an opportunity.
pub fn opportunity_url(opportunity_id: &str) -> String {
    format!("{}{}", OPPORTUNITY_URL, opportunity_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opportunity_url() {
        assert_eq!(
            opportunity_url("350123"),
            "https://www.grants.gov/search-results-detail/350123"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GrantsGovClient::new()
            .unwrap()
            .with_base_url("http://localhost:9000/");
        assert_eq!(client.base_url, "http://localhost:9000");
    }

    #[tokio::test]
    async fn test_fetch_opportunity_rejects_non_numeric_id() {
        let client = GrantsGovClient::new().unwrap();
        let err = client.fetch_opportunity("DHS-24-001").await.unwrap_err();
        assert!(matches!(err, GrantsGovError::InvalidOpportunityId(_)));
    }
}
