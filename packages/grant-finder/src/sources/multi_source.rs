//! Generic HTML listing scraper.
//!
//! Reads "card" style listing pages (search results, news rolls, program
//! indexes) with a default selector set that fits most server-rendered sites.
//! Sites that need different selectors get an override keyed by full URL or
//! by host.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use aggregation::{FetchError, FetchResult, Fetcher, ListingRecord};
use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use super::base::{
    element_text, find_date_in_text, get_text, http_client, is_relevant, parse_date, selector,
    KEYWORDS,
};

pub const NAME: &str = "multi_source";

const TAGS: [&str; 2] = ["first-responders", "wellness"];
const TIMEOUT: Duration = Duration::from_secs(20);
const USER_AGENT: &str = "grant-finder/1.0 (+github)";

/// CSS selectors used to read one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSet {
    pub card: String,
    pub title: String,
    pub link: String,
    pub desc: String,
    pub date: String,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            card: "article, .result, .card, .views-row, li.search-result".into(),
            title: "h1, h2, h3, .title, .card-title, a".into(),
            link: "a[href]".into(),
            desc: "p, .summary, .teaser, .card-text".into(),
            date: "time[datetime], .date, .published, .pubdate".into(),
        }
    }
}

impl SelectorSet {
    /// Defaults with any overridden selectors replaced.
    pub fn merged(overrides: &SelectorOverrides) -> Self {
        let mut set = Self::default();
        let pick = |slot: &mut String, value: &Option<String>| {
            if let Some(v) = value.as_ref().filter(|v| !v.trim().is_empty()) {
                *slot = v.clone();
            }
        };
        pick(&mut set.card, &overrides.card);
        pick(&mut set.title, &overrides.title);
        pick(&mut set.link, &overrides.link);
        pick(&mut set.desc, &overrides.desc);
        pick(&mut set.date, &overrides.date);
        set
    }

    fn compile(&self) -> FetchResult<CompiledSelectors> {
        Ok(CompiledSelectors {
            card: selector(&self.card)?,
            title: selector(&self.title)?,
            link: selector(&self.link)?,
            desc: selector(&self.desc)?,
            date: selector(&self.date)?,
        })
    }
}

/// Per-site selector overrides; unset fields keep the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SelectorOverrides {
    #[serde(default)]
    pub card: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

struct CompiledSelectors {
    card: Selector,
    title: Selector,
    link: Selector,
    desc: Selector,
    date: Selector,
}

#[derive(Debug, Clone, Default)]
pub struct MultiSourceFetcher {
    start_urls: Vec<String>,
    overrides: BTreeMap<String, SelectorOverrides>,
}

impl MultiSourceFetcher {
    pub fn new<I, S>(start_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            start_urls: start_urls.into_iter().map(Into::into).collect(),
            overrides: BTreeMap::new(),
        }
    }

    /// Register selector overrides for a full URL or a host.
    pub fn with_override(mut self, key: impl Into<String>, overrides: SelectorOverrides) -> Self {
        self.overrides.insert(key.into(), overrides);
        self
    }

    pub fn with_overrides(mut self, overrides: BTreeMap<String, SelectorOverrides>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    /// Selectors for a listing page: full URL match, then host, then defaults.
    pub fn selectors_for(&self, list_url: &str) -> SelectorSet {
        if let Some(o) = self.overrides.get(list_url) {
            return SelectorSet::merged(o);
        }
        let host = Url::parse(list_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase));
        match host.and_then(|h| self.overrides.get(&h)) {
            Some(o) => SelectorSet::merged(o),
            None => SelectorSet::default(),
        }
    }

    async fn scrape(&self, client: &reqwest::Client, list_url: &str) -> FetchResult<Vec<ListingRecord>> {
        let selectors = self.selectors_for(list_url);
        let html = get_text(client, list_url).await?;
        extract_listing(&html, list_url, &selectors)
    }
}

#[async_trait]
impl Fetcher for MultiSourceFetcher {
    async fn fetch(&self) -> FetchResult<Vec<ListingRecord>> {
        if self.start_urls.is_empty() {
            debug!("No listing pages configured");
            return Ok(Vec::new());
        }

        let client = http_client(USER_AGENT, TIMEOUT)?;
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for list_url in &self.start_urls {
            match self.scrape(&client, list_url).await {
                Ok(found) => {
                    info!(url = %list_url, records = found.len(), "Listing page scraped");
                    records.extend(found.into_iter().filter(|r| seen.insert(r.url.clone())));
                }
                Err(e) => warn!(url = %list_url, error = %e, "Listing page failed"),
            }
        }

        Ok(records)
    }

    fn name(&self) -> &str {
        NAME
    }

    fn slug(&self) -> Option<&str> {
        Some(NAME)
    }

    fn keywords(&self) -> Option<Vec<String>> {
        Some(KEYWORDS.iter().map(|k| k.to_string()).collect())
    }
}

/// Extract relevant records from one listing page.
pub fn extract_listing(
    html: &str,
    list_url: &str,
    selectors: &SelectorSet,
) -> FetchResult<Vec<ListingRecord>> {
    let base = Url::parse(list_url)
        .map_err(|e| FetchError::Config(format!("invalid listing url {list_url:?}: {e}")))?;
    let sel = selectors.compile()?;
    let doc = Html::parse_document(html);

    let records = doc
        .select(&sel.card)
        .filter_map(|card| extract_card(card, &base, &sel))
        .collect();

    Ok(records)
}

fn extract_card(card: ElementRef<'_>, base: &Url, sel: &CompiledSelectors) -> Option<ListingRecord> {
    let title_el = card.select(&sel.title).next()?;
    let link_el = card.select(&sel.link).next()?;

    let href = link_el.value().attr("href").map(str::trim).filter(|h| !h.is_empty())?;
    let url = base.join(href).ok()?;

    let title = element_text(title_el);
    let desc = card.select(&sel.desc).next().map(element_text).unwrap_or_default();

    if !is_relevant(&format!("{title} {desc}"), KEYWORDS) {
        return None;
    }

    Some(
        ListingRecord::new(title, url.to_string(), NAME)
            .with_description(desc)
            .with_posted_date(card_date(card, &sel.date))
            .with_tags(TAGS),
    )
}

/// Structured date first (`datetime` attribute, else element text), then any
/// date-looking text in the card.
fn card_date(card: ElementRef<'_>, date_sel: &Selector) -> Option<NaiveDate> {
    let structured = card.select(date_sel).next().and_then(|node| match node.value().attr("datetime") {
        Some(dt) => parse_date(dt),
        None => parse_date(&element_text(node)),
    });
    structured.or_else(|| find_date_in_text(&element_text(card)))
}
