use serde::Serialize;
use tokio::time::Instant;

use super::CacheEntry;

/// Snapshot of how many entries a cache holds, split by freshness.
///
/// `total` always equals `valid + expired`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
}

impl CacheStats {
    /// Counts entries by freshness at `now` without touching them.
    pub fn tally<'a, V, I>(entries: I, now: Instant) -> Self
    where
        V: 'a,
        I: IntoIterator<Item = &'a CacheEntry<V>>,
    {
        entries
            .into_iter()
            .fold(Self::default(), |mut stats, entry| {
                stats.total += 1;
                if entry.is_expired_at(now) {
                    stats.expired += 1;
                } else {
                    stats.valid += 1;
                }
                stats
            })
    }
}
