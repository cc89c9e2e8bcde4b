//! Session-scoped request cache and retry-with-backoff for storefront data
//! access.
//!
//! The stateful half of the crate pair: the pure key, TTL, backoff and
//! classification rules live in `storecache_core`; this crate owns the
//! shared cache store, the async retry loop, the background sweeper and the
//! cache-aside table decorator.

pub mod cache;
pub mod config;
pub mod retry;
pub mod store;

pub use cache::{CacheSettings, CacheSweeper, MemoryCache};
pub use config::Config;
pub use retry::{with_retry, wrap_with_retry};
pub use store::{CachedTable, InMemoryBackend};
