//! Periodic expiry sweep for the local cache.
//!
//! Expired entries are already invisible to readers; the sweep exists so
//! they stop occupying capacity between reads. Runs as a cancellable tokio
//! task so shutdown is deterministic rather than fire-and-forget.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::local::LocalCache;

/// Handle to a running sweep task.
pub struct CleanupHandle {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl CleanupHandle {
    /// Signals the task to stop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.handle.await;
    }
}

/// Spawns a background task sweeping expired entries on the given interval.
pub fn spawn_cleanup_task<V>(cache: Arc<LocalCache<V>>, interval: Duration) -> CleanupHandle
where
    V: Clone + Send + Sync + 'static,
{
    let (stop, mut stopped) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a fresh cache is not
        // swept at startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = cache.cleanup_expired().await;
                    if removed > 0 {
                        debug!(removed, "cache cleanup pass finished");
                    }
                }
                _ = stopped.changed() => {
                    debug!("cache cleanup task stopping");
                    return;
                }
            }
        }
    });

    CleanupHandle { stop, handle }
}
