//! Periodic polling of the order service.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{IntakeError, OrderInbox, OrderIntake};
use crate::metrics;

/// Fetches pending orders on an interval and hands new ones to the inbox.
pub struct OrderPoller {
    intake: Arc<dyn OrderIntake>,
    inbox: Arc<OrderInbox>,
    interval: Duration,
    running: Arc<RwLock<bool>>,
    shutdown_tx: broadcast::Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl OrderPoller {
    pub fn new(intake: Arc<dyn OrderIntake>, inbox: Arc<OrderInbox>, interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            intake,
            inbox,
            interval,
            running: Arc::new(RwLock::new(false)),
            shutdown_tx,
            handle: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Fetch once. Returns how many orders were new.
    pub async fn poll_once(&self) -> Result<usize, IntakeError> {
        poll(&self.intake, &self.inbox).await
    }

    /// Start polling in the background; the first poll happens immediately.
    pub async fn start(&self) {
        let mut running = self.running.write().await;
        if *running {
            return;
        }
        *running = true;
        drop(running);

        let intake = Arc::clone(&self.intake);
        let inbox = Arc::clone(&self.inbox);
        let interval = self.interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = poll(&intake, &inbox).await {
                            warn!("Order poll failed: {}", e);
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Order poller stopping");
                        break;
                    }
                }
            }
        });

        *self.handle.lock().await = Some(handle);
        info!(
            interval_secs = self.interval.as_secs(),
            intake = self.intake.name(),
            "Order poller started"
        );
    }

    pub async fn stop(&self) {
        let was_running = {
            let mut running = self.running.write().await;
            std::mem::replace(&mut *running, false)
        };
        if !was_running {
            return;
        }
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.lock().await.take() {
            let _ = handle.await;
        }
        info!("Order poller stopped");
    }
}

async fn poll(intake: &Arc<dyn OrderIntake>, inbox: &OrderInbox) -> Result<usize, IntakeError> {
    let orders = intake.fetch_pending_orders().await?;
    let fetched = orders.len();
    let mut new = 0;
    for order in orders {
        let order_id = order.order_id.clone();
        if inbox.offer(order) {
            info!(order_id = %order_id, "New order received");
            new += 1;
        }
    }
    metrics::ORDERS_RECEIVED.inc_by(new as u64);
    debug!(fetched, new, "Order poll complete");
    Ok(new)
}
