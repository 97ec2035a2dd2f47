//! Grants.gov source.
//!
//! Searches forecasted and posted opportunities for each keyword, then
//! enriches every new hit with its detail record. Detail lookups are best
//! effort: a failed lookup still yields a record built from the search hit.

use std::collections::HashSet;
use std::future::Future;

use aggregation::{FetchError, FetchResult, Fetcher, ListingRecord};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use grants_gov_client::{opportunity_url, GrantsGovClient, OpportunityDetail, OpportunityHit};
use serde_json::Value;
use tracing::{debug, info};

use super::base::{clean, parse_date, strip_tags};

pub const NAME: &str = "grants_gov";
pub const SLUG: &str = "grants.gov";

pub const KEYWORDS: &[&str] = &[
    "first responder",
    "first responders",
    "wellness",
    "mental health",
    "behavioral health",
    "psychological evaluation",
    "pre-employment",
    "critical incident",
    "stress debriefing",
    "fitness for duty",
    "peer support",
    "cisd",
];

const TAGS: [&str; 2] = ["federal", "grants.gov"];

pub const DEFAULT_MAX_ROWS: u32 = 400;

/// Detail lookups in flight per keyword.
pub const DETAIL_CONCURRENCY: usize = 8;

pub struct GrantsGovFetcher {
    client: GrantsGovClient,
    keywords: Vec<String>,
    max_rows: u32,
}

impl GrantsGovFetcher {
    pub fn new(client: GrantsGovClient) -> Self {
        Self {
            client,
            keywords: KEYWORDS.iter().map(|k| k.to_string()).collect(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    /// Cap on search rows fetched per keyword.
    pub fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = max_rows;
        self
    }

    async fn detail(&self, opportunity_id: &str) -> OpportunityDetail {
        match self.client.fetch_opportunity(opportunity_id).await {
            Ok(detail) => detail,
            Err(e) => {
                debug!(opportunity_id, error = %e, "Detail lookup failed, using search hit only");
                OpportunityDetail::default()
            }
        }
    }
}

#[async_trait]
impl Fetcher for GrantsGovFetcher {
    async fn fetch(&self) -> FetchResult<Vec<ListingRecord>> {
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for keyword in &self.keywords {
            let hits = self
                .client
                .search_keyword(keyword, self.max_rows)
                .await
                .map_err(FetchError::http)?;
            let total = hits.len();

            let unseen = unseen_hits(hits, &mut seen);
            records.extend(enrich(unseen, |id| async move { self.detail(&id).await }).await);

            info!(keyword = %keyword, hits = total, records = records.len(), "Grants.gov keyword searched");
        }

        Ok(records)
    }

    fn name(&self) -> &str {
        NAME
    }

    fn slug(&self) -> Option<&str> {
        Some(SLUG)
    }

    fn keywords(&self) -> Option<Vec<String>> {
        Some(self.keywords.clone())
    }
}

/// Hits with an ID not yet in `seen`, in search order.
fn unseen_hits(hits: Vec<OpportunityHit>, seen: &mut HashSet<String>) -> Vec<(String, OpportunityHit)> {
    hits.into_iter()
        .filter_map(|hit| {
            let id = hit.id.clone()?;
            seen.insert(id.clone()).then_some((id, hit))
        })
        .collect()
}

/// Look up details for `hits` with up to [`DETAIL_CONCURRENCY`] requests in
/// flight. Records come back in hit order.
async fn enrich<F, Fut>(hits: Vec<(String, OpportunityHit)>, lookup: F) -> Vec<ListingRecord>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = OpportunityDetail>,
{
    stream::iter(hits)
        .map(|(id, hit)| {
            let detail = lookup(id);
            async move { build_record(&hit, &detail.await) }
        })
        .buffered(DETAIL_CONCURRENCY)
        .filter_map(|record| async move { record })
        .collect()
        .await
}

/// Turn a search hit plus its (possibly empty) detail into a record.
///
/// Returns `None` for hits without an opportunity ID.
pub fn build_record(hit: &OpportunityHit, detail: &OpportunityDetail) -> Option<ListingRecord> {
    let id = hit.id.as_deref().filter(|id| !id.is_empty())?;

    let title = clean(hit.display_title().unwrap_or_default());
    let title = if title.is_empty() {
        format!("Grants.gov Opportunity {id}")
    } else {
        title
    };

    let description = detail.raw_description().map(strip_tags).unwrap_or_default();

    let agency_name = detail
        .agency_name()
        .map(str::to_string)
        .or_else(|| hit.agency_name.clone());
    let opp_status = detail
        .status()
        .filter(|s| !s.is_empty())
        .or_else(|| hit.opp_status.as_deref().map(str::to_lowercase))
        .unwrap_or_default();
    let alns = {
        let from_detail = detail.aln_numbers();
        if from_detail.is_empty() {
            hit.alnist.clone()
        } else {
            from_detail
        }
    };

    let record = ListingRecord::new(title, opportunity_url(id), SLUG)
        .with_description(description)
        .with_posted_date(hit.opened().and_then(parse_date))
        .with_deadline_date(hit.close_date.as_deref().and_then(parse_date))
        .with_tags(TAGS)
        .with_extra("opportunity_number", optional(hit.number.clone()))
        .with_extra("agency_code", optional(hit.agency_code.clone()))
        .with_extra("agency_name", optional(agency_name))
        .with_extra("opp_status", opp_status)
        .with_extra("doc_type", hit.doc_type.clone().unwrap_or_default())
        .with_extra("funding_instruments", detail.funding_instruments())
        .with_extra("funding_categories", detail.funding_categories())
        .with_extra("eligibilities", detail.eligibilities())
        .with_extra("alns", alns);

    Some(record)
}

fn optional(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}
