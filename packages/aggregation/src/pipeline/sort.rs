//! Deterministic ordering of the final record set.

use std::cmp::Ordering;

use crate::types::record::ListingRecord;

/// Newest first, then title (case-insensitive), both descending.
///
/// A missing posted date orders below every real date. Ties beyond the key
/// keep their arrival order.
pub fn compare_records(a: &ListingRecord, b: &ListingRecord) -> Ordering {
    b.posted_date
        .cmp(&a.posted_date)
        .then_with(|| b.title.to_lowercase().cmp(&a.title.to_lowercase()))
}

/// Sort records in place.
pub fn sort_records(records: &mut [ListingRecord]) {
    records.sort_by(compare_records);
}
