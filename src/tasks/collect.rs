//! Expired Collection Task
//!
//! Background task that periodically removes expired entries from the store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::store::BoundedIndexStore;

/// Spawns a background task that periodically collects expired entries.
///
/// The task sleeps for `interval_secs` between runs and holds the write lock
/// only for the duration of one collection. A failed run is logged and the
/// task carries on with the next tick.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_collect_task(state.store.clone(), 1);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_collect_task(
    store: Arc<RwLock<BoundedIndexStore>>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting expired collection task with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let result = {
                let mut guard = store.write().await;
                guard.collect_expired(false)
            };

            match result {
                Ok(0) => debug!("Expired collection: nothing to remove"),
                Ok(removed) => info!("Expired collection: removed {} entries", removed),
                Err(e) => warn!("Expired collection failed: {}", e),
            }
        }
    })
}
