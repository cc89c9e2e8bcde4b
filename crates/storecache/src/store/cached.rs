//! Cached table decorator.
//!
//! Wraps a [`Backend`] with the cache-aside pattern for a single table.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use storecache_core::cache::{generate, generate_from};
use storecache_core::retry::RetryOptions;
use storecache_core::store::{Backend, BackendError, Query, Result, Row, ID_COLUMN};

use crate::cache::MemoryCache;
use crate::retry::with_retry;

/// Suffix that keeps point-read keys apart from `list` keys, which share
/// the same table prefix.
const ROW_KEY_SUFFIX: &str = ":row";

/// Cache-aside access to one backend table.
///
/// - **Reads**: served from the cache when fresh; on a miss the backend is
///   queried under the retry policy and the rows are cached.
/// - **Writes**: go straight to the backend (never retried), then every
///   cached read whose key contains the table name is invalidated.
///
/// # Type Parameters
///
/// * `B` - The underlying backend implementation
pub struct CachedTable<B>
where
    B: Backend,
{
    backend: Arc<B>,
    cache: MemoryCache,
    table: String,
    ttl: Option<Duration>,
    retry: RetryOptions<BackendError>,
}

impl<B> CachedTable<B>
where
    B: Backend,
{
    /// Creates a cached view of `table`.
    ///
    /// Reads use the cache's default TTL and the default retry policy until
    /// overridden with [`with_ttl`](Self::with_ttl) and
    /// [`with_retry`](Self::with_retry).
    pub fn new(backend: Arc<B>, cache: MemoryCache, table: impl Into<String>) -> Self {
        Self {
            backend,
            cache,
            table: table.into(),
            ttl: None,
            retry: RetryOptions::default(),
        }
    }

    /// Sets the TTL applied to cached reads.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the retry policy applied to backend reads.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryOptions<BackendError>) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the cache shared by this table.
    pub fn cache(&self) -> &MemoryCache {
        &self.cache
    }

    /// Returns the rows matching `query`.
    pub async fn list(&self, query: &Query) -> Result<Arc<Vec<Row>>> {
        let key = generate_from(&self.table, query);

        self.cache
            .get(
                &key,
                || async {
                    let rows = with_retry(|| self.backend.select(&self.table, query), &self.retry)
                        .await
                        .into_result()?;
                    tracing::debug!(table = %self.table, rows = rows.len(), "Loaded rows from backend");
                    Ok::<_, BackendError>(Arc::new(rows))
                },
                self.ttl,
            )
            .await
    }

    /// Returns the row with primary key `id`, if it exists.
    pub async fn get(&self, id: &str) -> Result<Option<Row>> {
        let mut params = Map::new();
        params.insert(ID_COLUMN.to_string(), Value::String(id.to_string()));
        let key = generate(&format!("{}{ROW_KEY_SUFFIX}", self.table), &params);

        self.cache
            .get(
                &key,
                || async {
                    let query = Query::new().filter(ID_COLUMN, id);
                    let rows = with_retry(|| self.backend.select(&self.table, &query), &self.retry)
                        .await
                        .into_result()?;
                    Ok::<_, BackendError>(rows.into_iter().next())
                },
                self.ttl,
            )
            .await
    }

    /// Inserts `row` and invalidates cached reads of this table.
    pub async fn insert(&self, row: Row) -> Result<Row> {
        let stored = self.backend.insert(&self.table, row).await?;
        self.invalidate().await;
        Ok(stored)
    }

    /// Applies `changes` to the row with primary key `id` and invalidates
    /// cached reads of this table.
    pub async fn update(&self, id: &str, changes: Row) -> Result<Row> {
        let updated = self.backend.update(&self.table, id, changes).await?;
        self.invalidate().await;
        Ok(updated)
    }

    /// Deletes the row with primary key `id` and invalidates cached reads of
    /// this table.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.backend.delete(&self.table, id).await?;
        self.invalidate().await;
        Ok(())
    }

    async fn invalidate(&self) {
        let removed = self.cache.invalidate_pattern(&self.table).await;
        tracing::debug!(table = %self.table, removed, "Invalidated cached reads after write");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use storecache_core::cache::key_matches;
    use tokio::time::Instant;

    use crate::store::InMemoryBackend;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    async fn products() -> (Arc<InMemoryBackend>, CachedTable<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::with_demo_data().await);
        let table = CachedTable::new(backend.clone(), MemoryCache::default(), "products");
        (backend, table)
    }

    #[tokio::test]
    async fn test_list_cache_miss_then_hit() {
        let (backend, table) = products().await;
        let query = Query::new().paginate(1, 20);

        let first = table.list(&query).await.unwrap();
        assert_eq!(first.len(), 5);
        assert_eq!(backend.select_calls(), 1);
        assert!(table.cache().has("products:limit:20|page:1").await);

        // Second call - served from the cache
        let second = table.list(&query).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(backend.select_calls(), 1);
    }

    #[tokio::test]
    async fn test_distinct_queries_have_distinct_entries() {
        let (backend, table) = products().await;

        table.list(&Query::new().paginate(1, 2)).await.unwrap();
        table.list(&Query::new().paginate(2, 2)).await.unwrap();
        table
            .list(&Query::new().filter("category", "shoes"))
            .await
            .unwrap();

        assert_eq!(backend.select_calls(), 3);
        assert_eq!(table.cache().len().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_retries_transient_failures() {
        let (backend, table) = products().await;
        backend.fail_next(BackendError::status(503, "busy")).await;

        let started = Instant::now();
        let rows = table.list(&Query::new()).await.unwrap();

        assert_eq!(rows.len(), 5);
        assert_eq!(backend.select_calls(), 2);
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_failure_is_not_cached() {
        let (backend, table) = products().await;
        let table = table.with_retry(RetryOptions::default().max_attempts(2));
        backend.fail_next(BackendError::Network("down".into())).await;
        backend.fail_next(BackendError::Network("down".into())).await;

        let result = table.list(&Query::new()).await;
        assert_eq!(result, Err(BackendError::Network("down".into())));
        assert!(table.cache().is_empty().await);

        // Recovered backend is queried again
        let rows = table.list(&Query::new()).await.unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(backend.select_calls(), 3);
    }

    #[tokio::test]
    async fn test_list_client_error_is_not_retried() {
        let (backend, table) = products().await;
        backend.fail_next(BackendError::status(401, "jwt expired")).await;

        let result = table.list(&Query::new()).await;

        assert_eq!(result, Err(BackendError::status(401, "jwt expired")));
        assert_eq!(backend.select_calls(), 1);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let (backend, table) = products().await;

        let socks = table.get("p-3").await.unwrap();
        assert_eq!(socks.map(|r| r["name"].clone()), Some(json!("Wool Socks")));

        let again = table.get("p-3").await.unwrap();
        assert!(again.is_some());
        assert_eq!(backend.select_calls(), 1);

        assert_eq!(table.get("p-99").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_invalidates_table_reads() {
        let (backend, table) = products().await;
        table.list(&Query::new().paginate(1, 20)).await.unwrap();
        table.get("p-1").await.unwrap();
        table.cache().set("orders:page:1", 1u8, None).await;

        table
            .insert(row(json!({ "name": "Trail Gaiters", "category": "accessories" })))
            .await
            .unwrap();

        // Only the products keys are gone
        assert_eq!(table.cache().len().await, 1);
        assert!(table.cache().has("orders:page:1").await);

        let rows = table.list(&Query::new().paginate(1, 20)).await.unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(backend.select_calls(), 3);
    }

    #[tokio::test]
    async fn test_update_invalidates_table_reads() {
        let (_, table) = products().await;
        table.get("p-2").await.unwrap();

        table
            .update("p-2", row(json!({ "price_cents": 9_900 })))
            .await
            .unwrap();

        let updated = table.get("p-2").await.unwrap().unwrap();
        assert_eq!(updated["price_cents"], json!(9_900));
    }

    #[tokio::test]
    async fn test_delete_invalidates_table_reads() {
        let (_, table) = products().await;
        table.list(&Query::new()).await.unwrap();

        table.delete("p-5").await.unwrap();

        let rows = table.list(&Query::new()).await.unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_cache() {
        let (backend, table) = products().await;
        table.list(&Query::new()).await.unwrap();
        backend.fail_next(BackendError::status(503, "busy")).await;

        let result = table.delete("p-1").await;

        assert_eq!(result, Err(BackendError::status(503, "busy")));
        assert_eq!(table.cache().len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_ttl_expires_reads() {
        let (backend, table) = products().await;
        let table = table.with_ttl(Duration::from_secs(60));

        table.list(&Query::new()).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        table.list(&Query::new()).await.unwrap();

        assert_eq!(backend.select_calls(), 2);
    }

    #[tokio::test]
    async fn test_read_keys_contain_table_name() {
        let (_, table) = products().await;
        table.list(&Query::new().filter("category", "shoes")).await.unwrap();
        table.get("p-1").await.unwrap();

        let key = generate_from("products", &Query::new().filter("category", "shoes"));
        assert!(key_matches("products", &key));
        assert!(table.cache().has(&key).await);
        assert!(table.cache().has(r#"products:row:id:"p-1""#).await);
    }

    #[tokio::test]
    async fn test_point_reads_and_id_lists_are_cached_separately() {
        let (backend, table) = products().await;
        let by_id = Query::new().filter(ID_COLUMN, "p-1");

        for _ in 0..3 {
            let row = table.get("p-1").await.unwrap();
            let rows = table.list(&by_id).await.unwrap();

            assert_eq!(row.and_then(|r| r.get("name").cloned()), Some(json!("Trail Runner")));
            assert_eq!(rows.len(), 1);
        }

        assert_eq!(backend.select_calls(), 2);
        assert_eq!(table.cache().len().await, 2);

        // Both entries are dropped by a write to the table
        table.delete("p-2").await.unwrap();
        assert!(table.cache().is_empty().await);
    }
}
