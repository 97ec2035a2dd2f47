//! Aggregation - summary statistics and artifact assembly.

use std::collections::BTreeMap;

use chrono::{SubsecRound, Utc};

use crate::pipeline::orchestrate::FetchOutcome;
use crate::types::artifact::{ArtifactMeta, RunArtifact};
use crate::types::record::ListingRecord;

/// Count final records per `source`.
pub fn source_counts(records: &[ListingRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.source.clone()).or_insert(0) += 1;
    }
    counts
}

/// Declared keyword lists of every invoked fetcher, keyed by slug.
///
/// Fetchers that declare no list are left out. When two fetchers share a
/// key, the first one in discovery order wins.
pub fn declared_keywords(outcomes: &[FetchOutcome]) -> BTreeMap<String, Vec<String>> {
    let mut keywords = BTreeMap::new();
    for outcome in outcomes {
        if let Some(list) = outcome.metadata.unique_keywords() {
            keywords
                .entry(outcome.metadata.key().to_string())
                .or_insert(list);
        }
    }
    keywords
}

/// Build the artifact from final records and the orchestration outcomes.
///
/// `records` must already be deduplicated and sorted; they are stored as-is.
pub fn assemble(records: Vec<ListingRecord>, outcomes: &[FetchOutcome]) -> RunArtifact {
    RunArtifact {
        generated_at: Utc::now().trunc_subsecs(0),
        count: records.len(),
        source_counts: source_counts(&records),
        meta: ArtifactMeta {
            keywords: declared_keywords(outcomes),
        },
        items: records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::orchestrate::FetchStatus;
    use crate::testing::listing;
    use crate::traits::fetcher::FetcherMetadata;
    use std::time::Duration;

    fn outcome(name: &str, slug: Option<&str>, keywords: Option<&[&str]>, ok: bool) -> FetchOutcome {
        FetchOutcome {
            metadata: FetcherMetadata {
                name: name.to_string(),
                slug: slug.map(str::to_string),
                keywords: keywords.map(|k| k.iter().map(|s| s.to_string()).collect()),
            },
            loaded: true,
            callable: true,
            status: if ok {
                FetchStatus::Succeeded { records: 0 }
            } else {
                FetchStatus::Failed { reason: "boom".to_string() }
            },
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_source_counts() {
        let counts = source_counts(&[
            listing("A", "https://x/1", "grants.gov", None),
            listing("B", "https://x/2", "dhs_frg", None),
            listing("C", "https://x/3", "grants.gov", None),
        ]);
        assert_eq!(counts.get("grants.gov"), Some(&2));
        assert_eq!(counts.get("dhs_frg"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_keywords_keyed_by_slug_and_deduped() {
        let outcomes = vec![
            outcome("grants_gov", Some("grants.gov"), Some(&["cisd", "stress", "cisd"]), true),
            outcome("dhs_frg", None, Some(&["peer"]), false),
            outcome("quiet", None, None, true),
        ];

        let keywords = declared_keywords(&outcomes);
        assert_eq!(keywords["grants.gov"], vec!["cisd", "stress"]);
        // Failed fetchers were still invoked, so their keywords are reported.
        assert_eq!(keywords["dhs_frg"], vec!["peer"]);
        assert!(!keywords.contains_key("quiet"));
    }

    #[test]
    fn test_empty_artifact_shape() {
        let artifact = assemble(vec![], &[]);
        assert_eq!(artifact.count, 0);
        assert!(artifact.items.is_empty());
        assert!(artifact.source_counts.is_empty());
        assert!(artifact.meta.keywords.is_empty());
        assert_eq!(artifact.generated_at.timestamp_subsec_nanos(), 0);
        assert_eq!(artifact.generated_at_string().len(), "2025-01-01T00:00:00Z".len());
    }

    #[test]
    fn test_assemble_keeps_order() {
        let records = vec![
            listing("B", "https://x/2", "s", Some("2025-01-01")),
            listing("A", "https://x/1", "s", Some("2024-01-01")),
        ];
        let artifact = assemble(records.clone(), &[]);
        assert_eq!(artifact.items, records);
        assert_eq!(artifact.count, 2);
    }
}
