use std::{env, num::NonZeroUsize, str::FromStr, time::Duration};

use storecache_core::cache::{DEFAULT_TTL, LONG_TTL, SHORT_TTL, SWEEP_INTERVAL};
use storecache_core::retry::{
    BackoffStrategy, Classify, RetryOptions, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS,
};

use crate::cache::CacheSettings;
use crate::retry::saturating_millis;

/// Cache and retry configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Default cache TTL in seconds (default: 300)
    pub cache_ttl_seconds: u64,
    /// Short TTL preset in seconds (default: 60)
    pub cache_short_ttl_seconds: u64,
    /// Long TTL preset in seconds (default: 1800)
    pub cache_long_ttl_seconds: u64,
    /// Interval between expired-entry sweeps in seconds (default: 300)
    pub sweep_interval_seconds: u64,
    /// Optional cache capacity bound (default: unbounded)
    pub cache_max_entries: Option<NonZeroUsize>,
    /// Maximum attempts per retried operation (default: 3)
    pub retry_max_attempts: u32,
    /// Base backoff delay in milliseconds (default: 1000)
    pub retry_base_delay_ms: u64,
    /// Backoff strategy (default: exponential)
    pub retry_backoff: BackoffStrategy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CACHE_TTL_SECONDS` - Default cache TTL in seconds (default: 300)
    /// - `CACHE_SHORT_TTL_SECONDS` - Short TTL preset (default: 60)
    /// - `CACHE_LONG_TTL_SECONDS` - Long TTL preset (default: 1800)
    /// - `CACHE_SWEEP_INTERVAL_SECONDS` - Sweep interval (default: 300)
    /// - `CACHE_MAX_ENTRIES` - Capacity bound, unset or 0 for unbounded
    /// - `RETRY_MAX_ATTEMPTS` - Attempts per operation (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - Base backoff delay (default: 1000)
    /// - `RETRY_BACKOFF` - `linear` or `exponential` (default: exponential)
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            cache_ttl_seconds: parse_var(&lookup, "CACHE_TTL_SECONDS")
                .unwrap_or(DEFAULT_TTL.as_secs()),
            cache_short_ttl_seconds: parse_var(&lookup, "CACHE_SHORT_TTL_SECONDS")
                .unwrap_or(SHORT_TTL.as_secs()),
            cache_long_ttl_seconds: parse_var(&lookup, "CACHE_LONG_TTL_SECONDS")
                .unwrap_or(LONG_TTL.as_secs()),
            sweep_interval_seconds: parse_var(&lookup, "CACHE_SWEEP_INTERVAL_SECONDS")
                .unwrap_or(SWEEP_INTERVAL.as_secs()),
            cache_max_entries: parse_var(&lookup, "CACHE_MAX_ENTRIES")
                .and_then(NonZeroUsize::new),
            retry_max_attempts: parse_var(&lookup, "RETRY_MAX_ATTEMPTS")
                .unwrap_or(DEFAULT_MAX_ATTEMPTS)
                .max(1),
            retry_base_delay_ms: parse_var(&lookup, "RETRY_BASE_DELAY_MS")
                .unwrap_or_else(|| saturating_millis(DEFAULT_BASE_DELAY)),
            retry_backoff: parse_var(&lookup, "RETRY_BACKOFF").unwrap_or_default(),
        }
    }

    /// Get the default cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Get the sweep interval as a Duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    /// Build the settings for a [`MemoryCache`](crate::cache::MemoryCache).
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            default_ttl: self.cache_ttl(),
            short_ttl: Duration::from_secs(self.cache_short_ttl_seconds),
            long_ttl: Duration::from_secs(self.cache_long_ttl_seconds),
            max_entries: self.cache_max_entries,
        }
    }

    /// Build retry options with the configured limits and the default
    /// classifier.
    pub fn retry_options<E>(&self) -> RetryOptions<E>
    where
        E: Classify + 'static,
    {
        RetryOptions::default()
            .max_attempts(self.retry_max_attempts)
            .base_delay(Duration::from_millis(self.retry_base_delay_ms))
            .backoff(self.retry_backoff)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|value| value.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
