//! Helpers shared by every source: text cleanup, relevance filtering,
//! lenient date parsing and HTTP plumbing.
//!
//! This module is not a fetcher and is never registered.

use std::sync::LazyLock;
use std::time::Duration;

use aggregation::{FetchError, FetchResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use scraper::{ElementRef, Selector};

/// Keywords most sources filter on.
pub const KEYWORDS: &[&str] = &[
    "grant",
    "funding",
    "first responder",
    "wellness",
    "mental health",
    "behavioral health",
    "psychological",
    "fitness for duty",
    "critical incident",
    "stress",
    "peer support",
    "cisd",
];

static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex"));

const MONTHS: &str = "jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec";

static RE_DATE_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{4}}-\d{{2}}-\d{{2}}|\d{{1,2}}/\d{{1,2}}/\d{{2,4}}|(?:{m})[a-z]*\.?\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}|\d{{1,2}}\s+(?:{m})[a-z]*\.?,?\s+\d{{4}})\b",
        m = MONTHS
    ))
    .expect("date regex")
});

static RE_ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d)(st|nd|rd|th)\b").expect("ordinal regex"));

/// Collapse whitespace runs and trim.
pub fn clean(text: &str) -> String {
    RE_WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Drop markup, keeping the text.
pub fn strip_tags(html: &str) -> String {
    let text = RE_TAG.replace_all(html, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    clean(&text)
}

/// Case-insensitive match of any keyword.
pub fn is_relevant(text: &str, keywords: &[&str]) -> bool {
    let text = text.to_lowercase();
    keywords.iter().any(|k| text.contains(&k.to_lowercase()))
}

/// Lenient date parsing.
///
/// Accepts the common machine formats first, then falls back to the first
/// date-looking substring.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    parse_exact(text).or_else(|| find_date_in_text(text))
}

/// First parseable date appearing anywhere in free text.
pub fn find_date_in_text(text: &str) -> Option<NaiveDate> {
    RE_DATE_IN_TEXT
        .find_iter(text)
        .find_map(|m| parse_exact(m.as_str()))
}

fn parse_exact(text: &str) -> Option<NaiveDate> {
    let s = text.trim().trim_end_matches(['.', ',']);
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let (y, m, d) = (s[..4].parse().ok()?, s[4..6].parse().ok()?, s[6..].parse().ok()?);
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    if s.contains('/') {
        return parse_slashed(s);
    }

    // Month names: normalize punctuation so "Mar. 5, 2024" and "5 March 2024" both fit.
    let normalized = RE_ORDINAL.replace_all(s, "$1");
    let normalized = clean(&normalized.replace(['.', ','], " "));
    let normalized = normalized.replace("Sept ", "Sep ").replace("sept ", "sep ");
    ["%B %d %Y", "%d %B %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok())
}

/// `MM/DD/YYYY` or `MM/DD/YY`.
fn parse_slashed(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('/').map(str::trim).collect();
    let [m, d, y] = parts.as_slice() else {
        return None;
    };
    let month: u32 = m.parse().ok()?;
    let day: u32 = d.parse().ok()?;
    let year: i32 = match y.len() {
        4 => y.parse().ok()?,
        // Two-digit years pivot like POSIX strptime.
        2 => {
            let yy: i32 = y.parse().ok()?;
            if yy < 69 { 2000 + yy } else { 1900 + yy }
        }
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Compile a CSS selector, reporting bad ones as configuration errors.
pub fn selector(css: &str) -> FetchResult<Selector> {
    Selector::parse(css).map_err(|e| FetchError::Config(format!("invalid selector {css:?}: {e}")))
}

/// Cleaned text content of an element.
pub fn element_text(el: ElementRef<'_>) -> String {
    clean(&el.text().collect::<Vec<_>>().join(" "))
}

/// HTTP client for scraping sources.
pub fn http_client(user_agent: &str, timeout: Duration) -> FetchResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(FetchError::http)
}

/// GET a page body, treating non-2xx as an error.
pub async fn get_text(client: &reqwest::Client, url: &str) -> FetchResult<String> {
    let resp = client.get(url).send().await.map_err(FetchError::http)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    resp.text().await.map_err(FetchError::http)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_clean_collapses_whitespace() {
        assert_eq!(clean("  Peer \n\t support   grant "), "Peer support grant");
        assert_eq!(clean(""), "");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<p>Supports <b>wellness</b>&nbsp;programs</p>"),
            "Supports wellness programs"
        );
    }

    #[test]
    fn test_is_relevant_is_case_insensitive() {
        assert!(is_relevant("CISD Training Funds", KEYWORDS));
        assert!(is_relevant("Firefighter Mental Health Initiative", KEYWORDS));
        assert!(!is_relevant("Highway resurfacing", KEYWORDS));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-15"), ymd(2024, 3, 15));
        assert_eq!(parse_date("2024-03-15T12:30:00Z"), ymd(2024, 3, 15));
        assert_eq!(parse_date("2024-03-15T12:30:00-04:00"), ymd(2024, 3, 15));
        assert_eq!(parse_date("2024-03-15T12:30:00"), ymd(2024, 3, 15));
        assert_eq!(parse_date("03/15/2024"), ymd(2024, 3, 15));
        assert_eq!(parse_date("3/5/24"), ymd(2024, 3, 5));
        assert_eq!(parse_date("March 15, 2024"), ymd(2024, 3, 15));
        assert_eq!(parse_date("Mar. 5, 2024"), ymd(2024, 3, 5));
        assert_eq!(parse_date("Sept 5, 2024"), ymd(2024, 9, 5));
        assert_eq!(parse_date("15 March 2024"), ymd(2024, 3, 15));
        assert_eq!(parse_date("20240315"), ymd(2024, 3, 15));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("rolling"), None);
        assert_eq!(parse_date("13/45/2024"), None);
    }

    #[test]
    fn test_parse_date_with_trailing_time() {
        assert_eq!(parse_date("Mar 15, 2024 12:00:00 AM EST"), ymd(2024, 3, 15));
    }

    #[test]
    fn test_find_date_in_text() {
        assert_eq!(
            find_date_in_text("Posted on April 2nd, 2025 by the program office"),
            ymd(2025, 4, 2)
        );
        assert_eq!(find_date_in_text("Deadline: 06/30/2025."), ymd(2025, 6, 30));
        assert_eq!(find_date_in_text("No dates here, just 2025 plans"), None);
    }

    #[test]
    fn test_element_text_and_selector() {
        let doc = Html::parse_fragment("<div><h2>  Peer\n Support </h2></div>");
        let sel = selector("h2").unwrap();
        let h2 = doc.select(&sel).next().unwrap();
        assert_eq!(element_text(h2), "Peer Support");
        assert!(matches!(selector("h2[["), Err(FetchError::Config(_))));
    }
}
