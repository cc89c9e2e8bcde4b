//! Request cache backends.
//!
//! The cache is a plain in-process store: [`MemoryCache`] memoizes producer
//! results under string keys with a per-entry TTL, and [`CacheSweeper`]
//! optionally drives its periodic cleanup from a tokio interval.
//!
//! Keys come from `storecache_core::cache::generate`, which makes them
//! independent of parameter order.

mod memory;
mod sweeper;

pub use memory::{CacheSettings, MemoryCache};
pub use sweeper::CacheSweeper;
