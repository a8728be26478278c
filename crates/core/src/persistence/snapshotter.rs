//! Periodic queue snapshots.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::{JobStore, PersistenceError};
use crate::metrics;
use crate::queue::JobQueue;

/// Saves `queue.snapshot()` on a fixed interval and once more on shutdown.
///
/// A failed save is logged and counted; it never affects running jobs.
pub struct Snapshotter {
    queue: Arc<JobQueue>,
    store: Arc<dyn JobStore>,
    interval: Duration,
    running: Arc<RwLock<bool>>,
    shutdown_tx: broadcast::Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Snapshotter {
    pub fn new(queue: Arc<JobQueue>, store: Arc<dyn JobStore>, interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            queue,
            store,
            interval,
            running: Arc::new(RwLock::new(false)),
            shutdown_tx,
            handle: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Start the background loop. Calling it twice is a no-op.
    pub async fn start(&self) {
        let mut running = self.running.write().await;
        if *running {
            return;
        }
        *running = true;
        drop(running);

        let queue = Arc::clone(&self.queue);
        let store = Arc::clone(&self.store);
        let interval = self.interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip it.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = save(&queue, &store).await {
                            error!("Periodic snapshot failed: {}", e);
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Snapshotter loop stopping");
                        break;
                    }
                }
            }
        });

        *self.handle.lock().await = Some(handle);
        info!(
            interval_secs = self.interval.as_secs(),
            backend = self.store.name(),
            "Snapshotter started"
        );
    }

    /// Save the current queue state immediately.
    pub async fn save_now(&self) -> Result<usize, PersistenceError> {
        save(&self.queue, &self.store).await
    }

    /// Stop the loop and write one final snapshot.
    pub async fn shutdown(&self) -> Result<usize, PersistenceError> {
        let was_running = {
            let mut running = self.running.write().await;
            std::mem::replace(&mut *running, false)
        };
        if was_running {
            let _ = self.shutdown_tx.send(());
            if let Some(handle) = self.handle.lock().await.take() {
                let _ = handle.await;
            }
        }

        let saved = self.save_now().await;
        match &saved {
            Ok(jobs) => info!(jobs, "Final snapshot saved"),
            Err(e) => error!("Final snapshot failed: {}", e),
        }
        saved
    }
}

async fn save(queue: &Arc<JobQueue>, store: &Arc<dyn JobStore>) -> Result<usize, PersistenceError> {
    let state = queue.snapshot();
    let jobs = state.jobs.len();
    let store = Arc::clone(store);

    let result = tokio::task::spawn_blocking(move || store.save(&state))
        .await
        .map_err(|e| PersistenceError::TaskFailed(e.to_string()))
        .and_then(|r| r);

    match &result {
        Ok(()) => {
            metrics::PERSISTENCE_SAVES.with_label_values(&["ok"]).inc();
            debug!(jobs, "Snapshot saved");
        }
        Err(_) => metrics::PERSISTENCE_SAVES.with_label_values(&["failed"]).inc(),
    }
    result.map(|_| jobs)
}
