//! Periodic sweep of expired cache entries.
//!
//! The cache stays correct without a sweeper (stale entries are evicted
//! lazily on access); the sweeper only bounds how long unused stale entries
//! linger in memory.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::MemoryCache;
use crate::retry::saturating_millis;

/// Shortest interval the sweeper accepts.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a background task that calls [`MemoryCache::cleanup`] on a
/// fixed interval.
///
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct CacheSweeper {
    shutdown_tx: broadcast::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl CacheSweeper {
    /// Spawns the sweep loop on the current tokio runtime.
    ///
    /// The first sweep runs one full `interval` after spawning.
    pub fn spawn(cache: MemoryCache, interval: Duration) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::debug!(interval_ms = saturating_millis(interval), "Cache sweeper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = cache.cleanup().await;
                        if removed > 0 {
                            tracing::debug!(removed, "Cache sweep finished");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::debug!("Cache sweeper stopped");
                        break;
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// Stops the sweep loop and waits for it to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "Cache sweeper task failed");
            }
        }
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
