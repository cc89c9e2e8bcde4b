//! In-memory request cache with TTL expiry.
//!
//! Wraps asynchronous producers: a fresh entry short-circuits the producer,
//! a missing or stale one runs it and memoizes the result. Failed producers
//! are never cached.
//!
//! Expired entries are evicted lazily when `get` or `has` touches them, and
//! in bulk by [`MemoryCache::cleanup`], which a host may drive from a timer
//! (see [`CacheSweeper`](super::CacheSweeper)).

use std::any::Any;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use tokio::sync::RwLock;
use tokio::time::Instant;

use storecache_core::cache::{
    matching_keys, CacheEntry, CacheStats, TtlClass, DEFAULT_TTL, LONG_TTL, SHORT_TTL,
};

/// Type-erased cached value.
type StoredValue = Arc<dyn Any + Send + Sync>;

/// Settings for a [`MemoryCache`] instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// TTL used when a caller does not pass one.
    pub default_ttl: Duration,
    /// TTL for [`TtlClass::Short`].
    pub short_ttl: Duration,
    /// TTL for [`TtlClass::Long`].
    pub long_ttl: Duration,
    /// Optional capacity bound; the least recently used entry is evicted
    /// beyond it. `None` keeps every entry until it is invalidated, swept
    /// or cleared.
    pub max_entries: Option<NonZeroUsize>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            short_ttl: SHORT_TTL,
            long_ttl: LONG_TTL,
            max_entries: None,
        }
    }
}

/// Session-scoped request cache.
///
/// Cloning is cheap and every clone shares the same store; separately
/// constructed caches are fully independent.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<LruCache<String, CacheEntry<StoredValue>>>>,
    settings: Arc<CacheSettings>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new(settings: CacheSettings) -> Self {
        let store = match settings.max_entries {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };

        Self {
            store: Arc::new(RwLock::new(store)),
            settings: Arc::new(settings),
        }
    }

    /// Returns the TTL applied when callers pass `None`.
    pub fn default_ttl(&self) -> Duration {
        self.settings.default_ttl
    }

    /// Returns the configured duration for a TTL preset.
    pub fn ttl_for(&self, class: TtlClass) -> Duration {
        match class {
            TtlClass::Short => self.settings.short_ttl,
            TtlClass::Default => self.settings.default_ttl,
            TtlClass::Long => self.settings.long_ttl,
        }
    }

    /// Returns the cached value for `key`, or runs `producer` and caches
    /// its result for `ttl` (the default TTL when `None`).
    ///
    /// Producer errors are returned untouched and leave the store as it
    /// was. Concurrent misses on the same key each run their own producer;
    /// the last one to finish wins.
    pub async fn get<T, F, Fut, E>(
        &self,
        key: &str,
        producer: F,
        ttl: Option<Duration>,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.lookup::<T>(key).await {
            tracing::trace!(key = %key, "Cache hit");
            return Ok(value);
        }

        tracing::trace!(key = %key, "Cache miss");
        let value = producer().await?;

        let ttl = ttl.unwrap_or(self.settings.default_ttl);
        self.insert(key, Arc::new(value.clone()), ttl).await;

        Ok(value)
    }

    /// Like [`get`](Self::get) with the TTL taken from a preset.
    pub async fn get_with_class<T, F, Fut, E>(
        &self,
        key: &str,
        producer: F,
        class: TtlClass,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get(key, producer, Some(self.ttl_for(class))).await
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub async fn set<T>(&self, key: &str, value: T, ttl: Option<Duration>)
    where
        T: Send + Sync + 'static,
    {
        let ttl = ttl.unwrap_or(self.settings.default_ttl);
        self.insert(key, Arc::new(value), ttl).await;
    }

    /// Removes the entry for `key`, if any.
    pub async fn invalidate(&self, key: &str) {
        let mut store = self.store.write().await;
        if store.pop(key).is_some() {
            tracing::debug!(key = %key, "Cache entry invalidated");
        }
    }

    /// Removes every entry whose key contains `pattern` and returns how
    /// many were removed.
    pub async fn invalidate_pattern(&self, pattern: &str) -> usize {
        let mut store = self.store.write().await;

        let keys_to_delete = matching_keys(pattern, store.iter().map(|(key, _)| key));
        for key in &keys_to_delete {
            store.pop(key);
        }

        tracing::debug!(
            pattern = %pattern,
            removed = keys_to_delete.len(),
            "Cache pattern invalidated"
        );
        keys_to_delete.len()
    }

    /// Returns true if a fresh entry exists for `key`.
    ///
    /// A stale entry found here is evicted on the spot.
    pub async fn has(&self, key: &str) -> bool {
        let mut store = self.store.write().await;
        let now = Instant::now();

        let expired = match store.peek(key) {
            Some(entry) => entry.is_expired_at(now),
            None => return false,
        };

        if expired {
            store.pop(key);
            tracing::trace!(key = %key, "Evicted expired entry");
        }
        !expired
    }

    /// Removes every entry.
    pub async fn clear(&self) {
        let mut store = self.store.write().await;
        let removed = store.len();
        store.clear();
        tracing::debug!(removed, "Cache cleared");
    }

    /// Counts entries by freshness without evicting anything.
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        CacheStats::tally(store.iter().map(|(_, entry)| entry), Instant::now())
    }

    /// Evicts every expired entry and returns how many were removed.
    ///
    /// Each candidate is re-checked against the clock right before it is
    /// removed, so an entry refreshed after the scan is kept.
    pub async fn cleanup(&self) -> usize {
        let candidates = self.expired_keys().await;
        if candidates.is_empty() {
            return 0;
        }

        let removed = self.evict_expired(&candidates).await;
        tracing::debug!(removed, "Expired cache entries swept");
        removed
    }

    /// Snapshots the keys whose entries are expired right now.
    async fn expired_keys(&self) -> Vec<String> {
        let store = self.store.read().await;
        let now = Instant::now();
        store
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Removes those `candidates` that are still expired.
    async fn evict_expired(&self, candidates: &[String]) -> usize {
        let mut store = self.store.write().await;
        let now = Instant::now();
        let mut removed = 0;
        for key in candidates {
            let still_expired = store
                .peek(key)
                .is_some_and(|entry| entry.is_expired_at(now));
            if still_expired {
                store.pop(key);
                removed += 1;
            }
        }
        removed
    }

    /// Returns the number of stored entries, fresh or stale.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    /// Returns the fresh value stored under `key` if it has type `T`.
    ///
    /// Stale entries are evicted. A type mismatch counts as a miss; the
    /// entry stays until the caller's producer replaces it.
    async fn lookup<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + 'static,
    {
        let mut store = self.store.write().await;
        let now = Instant::now();

        // `get` (rather than `peek`) marks the entry as recently used.
        if store.get(key)?.is_expired_at(now) {
            store.pop(key);
            tracing::trace!(key = %key, "Evicted expired entry");
            return None;
        }

        let cached = store
            .peek(key)
            .and_then(|entry| entry.value.downcast_ref::<T>());
        match cached {
            Some(value) => Some(value.clone()),
            None => {
                tracing::warn!(
                    key = %key,
                    expected = std::any::type_name::<T>(),
                    "Cached value has a different type, treating as miss"
                );
                None
            }
        }
    }

    async fn insert(&self, key: &str, value: StoredValue, ttl: Duration) {
        let entry = CacheEntry::new(value, ttl, Instant::now());
        let mut store = self.store.write().await;
        if let Some((evicted, _)) = store.push(key.to_string(), entry) {
            if evicted != key {
                tracing::trace!(key = %evicted, "Evicted least recently used entry");
            }
        }
    }
}
