//! The run artifact - the single aggregated document written per run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::record::ListingRecord;

/// Timestamp layout used for `generated_at`.
pub const GENERATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Aggregated output of one pipeline run.
///
/// Built fresh every run; nothing is carried over from earlier artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunArtifact {
    /// When the artifact was assembled (UTC, second precision)
    #[serde(serialize_with = "serialize_generated_at")]
    pub generated_at: DateTime<Utc>,

    /// Number of items
    pub count: usize,

    /// Records per source slug
    pub source_counts: BTreeMap<String, usize>,

    /// Fetcher-declared metadata
    pub meta: ArtifactMeta,

    /// Final, deduplicated and sorted records
    pub items: Vec<ListingRecord>,
}

/// Metadata section of the artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    /// Declared keyword list per fetcher slug
    #[serde(default)]
    pub keywords: BTreeMap<String, Vec<String>>,
}

impl ArtifactMeta {
    /// One `(slug, "kw1, kw2")` line per fetcher with declared keywords.
    pub fn keyword_lines(&self) -> Vec<(&str, String)> {
        self.keywords
            .iter()
            .map(|(slug, keywords)| (slug.as_str(), keywords.join(", ")))
            .collect()
    }
}

impl RunArtifact {
    /// `generated_at` rendered the way it is written to disk.
    pub fn generated_at_string(&self) -> String {
        self.generated_at.format(GENERATED_AT_FORMAT).to_string()
    }

    /// Whether the artifact holds no records.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn serialize_generated_at<S>(ts: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&ts.format(GENERATED_AT_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generated_at_second_precision() {
        let artifact = RunArtifact {
            generated_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
            count: 0,
            source_counts: BTreeMap::new(),
            meta: ArtifactMeta::default(),
            items: vec![],
        };

        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["generated_at"], "2025-01-02T03:04:05Z");
        assert_eq!(json["count"], 0);
        assert_eq!(json["source_counts"], serde_json::json!({}));
        assert_eq!(json["meta"]["keywords"], serde_json::json!({}));
        assert_eq!(json["items"], serde_json::json!([]));
    }

    #[test]
    fn test_round_trips_from_disk_format() {
        let raw = r#"{
            "generated_at": "2025-01-02T03:04:05Z",
            "count": 0,
            "source_counts": {},
            "meta": {"keywords": {}},
            "items": []
        }"#;

        let artifact: RunArtifact = serde_json::from_str(raw).unwrap();
        assert_eq!(artifact.generated_at_string(), "2025-01-02T03:04:05Z");
        assert!(artifact.is_empty());
    }

    #[test]
    fn test_keyword_lines_one_per_source() {
        let mut meta = ArtifactMeta::default();
        meta.keywords.insert(
            "grants.gov".into(),
            vec!["first responder".into(), "peer support".into()],
        );
        meta.keywords.insert("dhs.gov".into(), vec!["resilience".into()]);

        assert_eq!(
            meta.keyword_lines(),
            vec![
                ("dhs.gov", "resilience".to_string()),
                ("grants.gov", "first responder, peer support".to_string()),
            ]
        );
    }
}
