//! AU item repository.

use crate::error::MetadataResult;
use async_trait::async_trait;
use aumeta_core::ItemMetadata;

/// Repository for AU metadata items.
///
/// Items are ordered by their store-assigned id. Ids are never reused, so the
/// order of an AU's items is stable for as long as its generation is.
#[async_trait]
pub trait ItemRepo: Send + Sync {
    /// Get the current extraction generation of an AU.
    ///
    /// Returns `None` when the AU is unknown or its metadata has been deleted.
    async fn current_generation(&self, au_id: &str) -> MetadataResult<Option<i64>>;

    /// Fetch up to `limit` items of an AU with id greater than `after_id`,
    /// ascending by id. `None` starts from the first item.
    async fn scan_items(
        &self,
        au_id: &str,
        after_id: Option<i64>,
        limit: u32,
    ) -> MetadataResult<Vec<ItemMetadata>>;

    /// Delete all items of an AU and retire its generation.
    ///
    /// Returns the number of deleted items, or `None` when the AU is unknown.
    async fn delete_au(&self, au_id: &str) -> MetadataResult<Option<u64>>;

    /// Insert an item and return its assigned id.
    ///
    /// Inserting into an AU that is unknown or deleted begins a new extraction
    /// with a generation greater than any earlier one for that AU.
    async fn insert_item(&self, item: &ItemMetadata) -> MetadataResult<i64>;
}

/// Mint the generation for a new extraction.
///
/// Generations are Unix milliseconds, bumped past `previous` when the clock has
/// not advanced (or has gone backwards).
pub fn next_generation(previous: Option<i64>, now_millis: i64) -> i64 {
    match previous {
        Some(prev) if prev >= now_millis => prev.saturating_add(1),
        _ => now_millis.max(1),
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_generation_uses_clock() {
        assert_eq!(next_generation(None, 1_000), 1_000);
        assert_eq!(next_generation(Some(500), 1_000), 1_000);
    }

    #[test]
    fn test_next_generation_strictly_increases() {
        assert_eq!(next_generation(Some(1_000), 1_000), 1_001);
        assert_eq!(next_generation(Some(2_000), 1_000), 2_001);
    }

    #[test]
    fn test_next_generation_is_positive() {
        assert_eq!(next_generation(None, 0), 1);
        assert_eq!(next_generation(None, -5), 1);
    }
}
