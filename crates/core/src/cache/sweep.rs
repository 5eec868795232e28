//! Background TTL sweep.
//!
//! Runs independently of request traffic until the owning process signals
//! shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::CacheStore;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to a running sweeper task.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for its task to finish.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        if let Err(e) = self.task.await {
            tracing::warn!("cache sweeper task failed: {e}");
        }
    }
}

/// Spawn a task that calls [`CacheStore::sweep`] every `every`.
///
/// The first sweep happens one full interval after spawning.
pub fn spawn_sweeper(store: Arc<CacheStore>, every: Duration) -> SweeperHandle {
    let shutdown = Arc::new(Notify::new());
    let signal = Arc::clone(&shutdown);

    let task = tokio::spawn(async move {
        tracing::info!(interval_secs = every.as_secs(), "cache sweeper started");
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = signal.notified() => {
                    tracing::info!("cache sweeper stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = store.sweep(Instant::now());
                    if removed > 0 {
                        tracing::debug!(removed, remaining = store.len(), "swept expired cache entries");
                    }
                }
            }
        }
    });

    SweeperHandle { shutdown, task }
}
