use std::time::Duration;

use tokio::time::Instant;

/// A single memoized value together with its freshness window.
///
/// Timestamps come from the tokio clock so that paused-time tests can move
/// entries across their expiry deterministically.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Creates an entry that was produced at `now` and lives for `ttl`.
    pub fn new(value: V, ttl: Duration, now: Instant) -> Self {
        Self {
            value,
            created_at: now,
            expires_at: expiry_for(now, ttl),
        }
    }

    /// Returns true once `now` has reached the entry's expiry instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Returns the remaining lifetime, or zero if already expired.
    pub fn time_to_live(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

/// Computes `now + ttl`, clamping absurdly large TTLs instead of panicking.
fn expiry_for(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        // Roughly thirty years; far beyond any session lifetime.
        .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365 * 30))
}
