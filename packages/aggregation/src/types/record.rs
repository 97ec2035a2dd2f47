//! Listing records - the unit of data produced by fetchers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Descriptions longer than this many characters are truncated.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Tags applied when a source supplies none.
pub const DEFAULT_TAGS: [&str; 2] = ["first-responders", "wellness"];

/// Serialized names of the core fields. Extension fields may not reuse them.
pub const RESERVED_FIELDS: [&str; 8] = [
    "title",
    "url",
    "source",
    "description",
    "posted_date",
    "deadline_date",
    "tags",
    "id",
];

fn default_tags() -> Vec<String> {
    DEFAULT_TAGS.iter().map(|t| t.to_string()).collect()
}

/// A single funding-opportunity listing.
///
/// Fetchers build these with [`ListingRecord::new`] and the `with_*`
/// builders. Anything source-specific (agency, opportunity number, funding
/// categories, ...) goes into `extra` and is written out next to the core
/// fields untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Display title (may be empty)
    #[serde(default)]
    pub title: String,

    /// Link to the opportunity; records without one are dropped
    #[serde(default)]
    pub url: String,

    /// Slug of the fetcher that produced this record
    #[serde(default)]
    pub source: String,

    /// Free text, at most [`MAX_DESCRIPTION_CHARS`] characters
    #[serde(default)]
    pub description: String,

    /// When the opportunity was posted
    #[serde(default)]
    pub posted_date: Option<NaiveDate>,

    /// Application deadline
    #[serde(default)]
    pub deadline_date: Option<NaiveDate>,

    /// Free-form labels, display order preserved
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,

    /// Source-specific extension fields, passed through unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Canonical ID, assigned by the pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ListingRecord {
    /// Create a record with the baseline tags and no dates.
    pub fn new(title: impl Into<String>, url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source: source.into(),
            description: String::new(),
            posted_date: None,
            deadline_date: None,
            tags: default_tags(),
            extra: Map::new(),
            id: None,
        }
    }

    /// Set the description, truncated to [`MAX_DESCRIPTION_CHARS`].
    pub fn with_description(mut self, description: impl AsRef<str>) -> Self {
        self.description = truncate_chars(description.as_ref(), MAX_DESCRIPTION_CHARS).to_string();
        self
    }

    /// Set the posted date.
    pub fn with_posted_date(mut self, date: Option<NaiveDate>) -> Self {
        self.posted_date = date;
        self
    }

    /// Set the deadline date.
    pub fn with_deadline_date(mut self, date: Option<NaiveDate>) -> Self {
        self.deadline_date = date;
        self
    }

    /// Replace the tags. An empty list keeps the baseline tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        if !tags.is_empty() {
            self.tags = tags;
        }
        self
    }

    /// Attach a source-specific extension field.
    ///
    /// A key that collides with a core field is stored as `extra_<key>`.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let key = if RESERVED_FIELDS.contains(&key.as_str()) {
            format!("extra_{key}")
        } else {
            key
        };
        self.extra.insert(key, value.into());
        self
    }

    /// Cut the description back to [`MAX_DESCRIPTION_CHARS`].
    pub fn truncate_description(&mut self) {
        let len = truncate_chars(&self.description, MAX_DESCRIPTION_CHARS).len();
        self.description.truncate(len);
    }

    /// Whether the record carries a usable URL.
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Read an extension field as a string, if it is one.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// Truncate to at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
