//! DHS Science & Technology First Responder Grants page.
//!
//! Follows every same-site link in the page body and keeps the articles that
//! mention first-responder wellness topics.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use aggregation::{FetchResult, Fetcher, ListingRecord};
use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use super::base::{clean, element_text, get_text, http_client, is_relevant, parse_date};

pub const NAME: &str = "dhs_frg";

pub const BASE_URL: &str = "https://www.dhs.gov";
const SITE_HOST: &str = "www.dhs.gov";
pub const LIST_URL: &str = "https://www.dhs.gov/science-and-technology/frg-grants";

pub const KEYWORDS: &[&str] = &[
    "first responder",
    "wellness",
    "mental health",
    "behavioral health",
    "psychological",
    "fitness for duty",
    "critical incident",
    "stress",
    "peer",
];

const TAGS: [&str; 3] = ["first-responders", "federal", "dhs"];
const TIMEOUT: Duration = Duration::from_secs(20);
const BODY_PARAGRAPHS: usize = 6;
const USER_AGENT: &str = "first-responder-grant-finder/1.0 (+github)";

static LINKS: LazyLock<Selector> = LazyLock::new(|| sel("main a[href]"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| sel("h1, .node__title, .page-title"));
static PARAGRAPHS: LazyLock<Selector> = LazyLock::new(|| sel("main p, article p"));
static POSTED: LazyLock<Selector> = LazyLock::new(|| sel("time[datetime], .submitted time"));

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// A link found on the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLink {
    pub url: String,
    pub text: String,
}

pub struct DhsFrgFetcher {
    list_url: String,
}

impl DhsFrgFetcher {
    pub fn new() -> Self {
        Self {
            list_url: LIST_URL.to_string(),
        }
    }
}

impl Default for DhsFrgFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for DhsFrgFetcher {
    async fn fetch(&self) -> FetchResult<Vec<ListingRecord>> {
        let client = http_client(USER_AGENT, TIMEOUT)?;
        let listing = get_text(&client, &self.list_url).await?;
        let links = article_links(&listing);

        info!(links = links.len(), "DHS FRG listing parsed");

        let mut records = Vec::new();
        for link in links {
            let html = match get_text(&client, &link.url).await {
                Ok(html) => html,
                Err(e) => {
                    debug!(url = %link.url, error = %e, "Skipping DHS article");
                    continue;
                }
            };
            records.extend(parse_article(&html, &link));
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

/// Same-site links in the page body, absolute, in page order, first occurrence only.
pub fn article_links(html: &str) -> Vec<ArticleLink> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();

    doc.select(&LINKS)
        .filter_map(|a| {
            let href = a.value().attr("href")?.trim();
            let url = resolve(href)?;
            Some(ArticleLink {
                url,
                text: element_text(a),
            })
        })
        .filter(|link| seen.insert(link.url.clone()))
        .collect()
}

fn resolve(href: &str) -> Option<String> {
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let base = Url::parse(BASE_URL).ok()?;
    let url = if href.starts_with('/') && !href.starts_with("//") {
        base.join(href).ok()?
    } else {
        Url::parse(href).ok()?
    };
    (url.scheme() == "https" && url.host_str() == Some(SITE_HOST)).then(|| url.to_string())
}

/// Build a record from an article page, or `None` when it is off-topic.
pub fn parse_article(html: &str, link: &ArticleLink) -> Option<ListingRecord> {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&TITLE)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| clean(&link.text));

    let body = doc
        .select(&PARAGRAPHS)
        .take(BODY_PARAGRAPHS)
        .map(element_text)
        .collect::<Vec<_>>()
        .join(" ");
    let body = clean(&body);

    if !is_relevant(&format!("{title} {body}"), KEYWORDS) {
        return None;
    }

    let posted = doc
        .select(&POSTED)
        .next()
        .and_then(|t| t.value().attr("datetime"))
        .and_then(parse_date);

    Some(
        ListingRecord::new(title, link.url.clone(), NAME)
            .with_description(body)
            .with_posted_date(posted)
            .with_tags(TAGS),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const LISTING: &str = r##"
        <html><body>
          <nav><a href="/about">About</a></nav>
          <main>
            <a href="#content">Skip</a>
            <a href="/science-and-technology/news/wellness-grant">Wellness grant</a>
            <a href="https://www.dhs.gov/science-and-technology/peer-support">Peer support</a>
            <a href="/science-and-technology/news/wellness-grant">Wellness grant (again)</a>
            <a href="https://www.fema.gov/grants">FEMA grants</a>
            <a href="https://www.dhs.gov.example.com/x">Lookalike</a>
            <a href="//cdn.example.com/x.pdf">PDF</a>
            <a href="">Empty</a>
          </main>
        </body></html>
    "##;

    #[test]
    fn test_article_links_same_site_only() {
        let links = article_links(LISTING);
        let urls: Vec<_> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.dhs.gov/science-and-technology/news/wellness-grant",
                "https://www.dhs.gov/science-and-technology/peer-support",
            ]
        );
        assert_eq!(links[0].text, "Wellness grant");
    }

    fn link() -> ArticleLink {
        ArticleLink {
            url: "https://www.dhs.gov/science-and-technology/peer-support".into(),
            text: "Peer support link".into(),
        }
    }

    #[test]
    fn test_parse_relevant_article() {
        let html = r#"
            <html><body>
              <h1 class="page-title">  S&amp;T Funds Peer Support  </h1>
              <div class="submitted"><time datetime="2024-05-01T12:00:00Z">May 1, 2024</time></div>
              <main>
                <p>The program helps first responders manage critical incident stress.</p>
                <p>Second paragraph.</p>
              </main>
            </body></html>
        "#;

        let record = parse_article(html, &link()).unwrap();
        assert_eq!(record.title, "S&T Funds Peer Support");
        assert_eq!(record.source, "dhs_frg");
        assert_eq!(
            record.description,
            "The program helps first responders manage critical incident stress. Second paragraph."
        );
        assert_eq!(record.posted_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(record.tags, vec!["first-responders", "federal", "dhs"]);
    }

    #[test]
    fn test_title_falls_back_to_link_text() {
        let html = "<html><body><main><p>Wellness resources</p></main></body></html>";
        let record = parse_article(html, &link()).unwrap();
        assert_eq!(record.title, "Peer support link");
        assert_eq!(record.posted_date, None);
    }

    #[test]
    fn test_irrelevant_article_dropped() {
        let html = "<html><body><h1>Border Technology</h1><main><p>Sensors.</p></main></body></html>";
        let off_topic = ArticleLink {
            url: "https://www.dhs.gov/x".into(),
            text: "x".into(),
        };
        assert!(parse_article(html, &off_topic).is_none());
    }

    #[test]
    fn test_only_first_six_paragraphs_used() {
        let paragraphs: String = (1..=8).map(|i| format!("<p>p{i}</p>")).collect();
        let html = format!("<html><body><h1>Wellness</h1><main>{paragraphs}</main></body></html>");
        let record = parse_article(&html, &link()).unwrap();
        assert_eq!(record.description, "p1 p2 p3 p4 p5 p6");
    }
}
