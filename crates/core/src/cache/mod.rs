mod entry;
mod keys;
mod patterns;
mod stats;
mod ttl;

pub use entry::CacheEntry;
pub use keys::{generate, generate_from};
pub use patterns::{key_matches, matching_keys};
pub use stats::CacheStats;
pub use ttl::{TtlClass, DEFAULT_TTL, LONG_TTL, SHORT_TTL, SWEEP_INTERVAL};
