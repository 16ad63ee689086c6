use crate::{Query, Record, StoreError};
use async_trait::async_trait;

/// Minimal query/mutation surface of the judicial-records store.
///
/// Implementations are expected to apply their own timeout discipline; no
/// call here blocks indefinitely on the caller's side.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Rows of `query.table` matching every filter, ordered and limited.
    async fn select(&self, query: &Query) -> Result<Vec<Record>, StoreError>;

    /// Number of rows matching the filters. `limit` and ordering are ignored.
    async fn count(&self, query: &Query) -> Result<u64, StoreError>;

    /// Insert one record and return it as stored (with its `id`).
    async fn insert(&self, table: &str, record: Record) -> Result<Record, StoreError>;

    /// Merge `patch` into every matching row. Returns the number of rows changed.
    async fn update(&self, query: &Query, patch: &Record) -> Result<u64, StoreError>;

    /// Remove every matching row. Returns the number of rows removed.
    async fn delete(&self, query: &Query) -> Result<u64, StoreError>;

    /// First row of the query, if any.
    async fn select_one(&self, query: &Query) -> Result<Option<Record>, StoreError> {
        let limited = query.clone().limit(1);
        Ok(self.select(&limited).await?.into_iter().next())
    }
}
