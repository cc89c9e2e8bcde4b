//! Cached access to the hosted relational backend.

mod cached;
mod inmemory;

pub use cached::CachedTable;
pub use inmemory::InMemoryBackend;

pub use storecache_core::store::{Backend, BackendError, Query, Row};
