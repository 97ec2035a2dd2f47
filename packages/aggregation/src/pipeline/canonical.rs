//! Canonical IDs - stable, content-derived record identifiers.

use sha2::{Digest, Sha256};

use crate::types::record::ListingRecord;

/// Length of a canonical ID in hex characters.
pub const CANONICAL_ID_LEN: usize = 16;

/// Digest of `title` followed directly by `url`, truncated to 16 hex chars.
///
/// The concatenation order and lack of separator match IDs already
/// published in earlier artifacts.
pub fn canonical_id(title: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(url.as_bytes());
    let mut id = format!("{:x}", hasher.finalize());
    id.truncate(CANONICAL_ID_LEN);
    id
}

/// Set the record's `id` from its title and URL and enforce the
/// description length limit.
pub fn assign_id(mut record: ListingRecord) -> ListingRecord {
    record.truncate_description();
    record.id = Some(canonical_id(&record.title, &record.url));
    record
}

/// Assign IDs to every record.
pub fn canonicalize(records: Vec<ListingRecord>) -> Vec<ListingRecord> {
    records.into_iter().map(assign_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::MAX_DESCRIPTION_CHARS;

    #[test]
    fn test_id_is_stable() {
        let a = canonical_id("Grant A", "https://x/1");
        let b = canonical_id("Grant A", "https://x/1");
        assert_eq!(a, b);
        assert_eq!(a.len(), CANONICAL_ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_known_digest_prefix() {
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb924...
        assert_eq!(canonical_id("", ""), "e3b0c44298fc1c14");
    }

    #[test]
    fn test_title_changes_id() {
        assert_ne!(
            canonical_id("Grant A", "https://x/1"),
            canonical_id("Grant B", "https://x/1")
        );
    }

    #[test]
    fn test_concatenation_without_separator() {
        // Same bytes after concatenation, same ID.
        assert_eq!(canonical_id("ab", "c"), canonical_id("a", "bc"));
    }

    #[test]
    fn test_assign_id_is_idempotent() {
        let record = ListingRecord::new("Grant A", "https://x/1", "s");
        let once = assign_id(record);
        let twice = assign_id(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.id.as_deref(), Some(canonical_id("Grant A", "https://x/1").as_str()));
    }

    #[test]
    fn test_canonicalize_truncates_oversized_description() {
        let mut record = ListingRecord::new("Grant A", "https://x/1", "s");
        record.description = "é".repeat(MAX_DESCRIPTION_CHARS * 2);

        let records = canonicalize(vec![record]);
        assert_eq!(records[0].description.chars().count(), MAX_DESCRIPTION_CHARS);
        assert!(records[0].id.is_some());
    }
}
