//! Deduplication - first-seen record wins.

use std::collections::HashSet;

use crate::pipeline::canonical::canonical_id;
use crate::types::config::DedupKey;
use crate::types::record::ListingRecord;

/// Identity of a record under `key`.
fn identity(record: &ListingRecord, key: &DedupKey) -> String {
    match key {
        DedupKey::Url => record.url.clone(),
        DedupKey::Id => record
            .id
            .clone()
            .unwrap_or_else(|| canonical_id(&record.title, &record.url)),
        DedupKey::Field(name) => record
            .extra_str(name)
            .filter(|v| !v.is_empty())
            .map(|v| format!("{}={}", name, v))
            .unwrap_or_else(|| record.url.clone()),
    }
}

/// Drop URL-less records and every later duplicate, keeping arrival order.
///
/// Later duplicates are discarded whole; fields are never merged.
pub fn dedupe(records: Vec<ListingRecord>, key: &DedupKey) -> Vec<ListingRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| record.has_url() && seen.insert(identity(record, key)))
        .collect()
}
