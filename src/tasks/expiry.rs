//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache items. Reads check
//! expiry on their own, so the sweep only reclaims memory held by items
//! nobody asks for again.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::MemoryStore;

// == Expiry Manager ==
/// Handle to a running expiry sweep.
///
/// [`ExpiryManager::stop`] consumes the handle, so the stop signal can only be
/// sent once. Dropping the handle without stopping also ends the loop, since
/// the shutdown channel closes.
#[derive(Debug)]
pub struct ExpiryManager {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ExpiryManager {
    /// Signals the loop to stop and waits for it to finish.
    pub async fn stop(self) {
        // The loop may already be gone if the runtime is shutting down.
        let _ = self.shutdown.send(());
        if let Err(err) = self.handle.await {
            warn!("expiry task ended abnormally: {}", err);
        }
        info!("Expiry sweep stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawns a background task that sweeps expired items from `store`.
///
/// The first sweep runs one full `interval` after start. Each sweep takes the
/// store's write lock for its duration.
///
/// # Example
/// ```ignore
/// let store = MemoryStore::new(MemoryConfig::default())?;
/// let expiry = spawn_expiry_task(store.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// expiry.stop().await;
/// ```
pub fn spawn_expiry_task(store: MemoryStore, interval: Duration) -> ExpiryManager {
    let (shutdown, mut shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        info!("Starting expiry sweep with interval of {:?}", interval);

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Fires on an explicit stop and when the manager is dropped
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {
                    let removed = store.sweep_expired().await;
                    if removed > 0 {
                        info!("Expiry sweep: removed {} expired items", removed);
                    } else {
                        debug!("Expiry sweep: no expired items found");
                    }
                }
            }
        }
    });

    ExpiryManager { shutdown, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Value;
    use crate::config::MemoryConfig;
    use crate::contract::{Observable, Store, TaggedStore};

    fn store() -> MemoryStore {
        MemoryStore::new(
            MemoryConfig::default()
                .with_cleanup_interval(Duration::from_millis(100))
                .with_metrics(true),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_items() {
        let store = store();
        store
            .tags(&["session"])
            .put("expire_soon", Value::from("value"), Some(Duration::from_millis(150)))
            .await
            .unwrap();

        let expiry = store.start_expiry();

        tokio::time::sleep(Duration::from_millis(500)).await;

        // Removed by the sweep, not by a read
        assert_eq!(store.len().await, 0);
        assert!(store.tags_of("expire_soon").await.is_empty());
        assert_eq!(store.stats().await.expirations, 1);

        expiry.stop().await;
    }

    #[tokio::test]
    async fn test_sweep_preserves_valid_items() {
        let store = store();
        store
            .put("long_lived", Value::from("value"), Some(Duration::from_secs(3600)))
            .await
            .unwrap();
        store.forever("forever", Value::from(1i64)).await.unwrap();

        let expiry = store.start_expiry();
        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_eq!(store.get("long_lived").await.unwrap(), Value::from("value"));
        assert!(store.has("forever").await.unwrap());

        expiry.stop().await;
    }

    #[tokio::test]
    async fn test_stop_terminates_loop() {
        let store = store();
        let expiry = spawn_expiry_task(store, Duration::from_secs(3600));

        assert!(!expiry.is_finished());
        tokio::time::timeout(Duration::from_secs(1), expiry.stop())
            .await
            .expect("stop should return promptly");
    }

    #[tokio::test]
    async fn test_drop_closes_loop() {
        let store = store();
        let expiry = spawn_expiry_task(store.clone(), Duration::from_secs(3600));
        drop(expiry);

        tokio::time::sleep(Duration::from_millis(50)).await;

        // The task held the only other clone of the store
        assert_eq!(std::sync::Arc::strong_count(&store.inner), 1);
    }
}
