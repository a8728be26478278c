//! Reports job lifecycle changes back to the order service.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::OrderIntake;
use crate::job::JobStatus;
use crate::queue::{JobEvent, JobQueue};

/// Jobs whose notifications went out, so a replay never repeats one.
#[derive(Default)]
struct Sent {
    started: HashSet<String>,
    finished: HashSet<String>,
}

enum Notice<'a> {
    Start,
    Complete,
    Failed(&'a str),
}

/// Translates queue status changes of order-backed jobs into
/// start/complete/failed notifications. Failures are logged only; they
/// never affect the job.
///
/// Each job is notified at most once per kind. When the event stream lags,
/// the queue is scanned for transitions the dropped events carried.
pub struct LifecycleNotifier {
    intake: Arc<dyn OrderIntake>,
    sent: Mutex<Sent>,
}

impl LifecycleNotifier {
    pub fn new(intake: Arc<dyn OrderIntake>) -> Self {
        Self {
            intake,
            sent: Mutex::new(Sent::default()),
        }
    }

    /// Follow `queue` until it is dropped. Subscribes before returning, so
    /// no event after this call is missed.
    pub fn spawn(self, queue: &Arc<JobQueue>) -> JoinHandle<()> {
        let mut events = queue.subscribe();
        let queue: Weak<JobQueue> = Arc::downgrade(queue);
        tokio::spawn(async move {
            info!(intake = self.intake.name(), "Lifecycle notifier started");
            loop {
                match events.recv().await {
                    Ok(event) => self.handle(&event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Lifecycle notifier fell behind, rescanning jobs");
                        if let Some(queue) = queue.upgrade() {
                            self.reconcile(&queue).await;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Lifecycle notifier stopped");
        })
    }

    /// Send the notification for one event, if it calls for one.
    pub async fn handle(&self, event: &JobEvent) {
        let JobEvent::StatusChanged {
            job_id,
            order_id: Some(order_id),
            from,
            to,
            error,
        } = event
        else {
            return;
        };

        let notice = match (from, to) {
            (JobStatus::Pending, JobStatus::Running) => Notice::Start,
            (_, JobStatus::Completed) => Notice::Complete,
            (_, JobStatus::Error) => Notice::Failed(error.as_deref().unwrap_or("copy job failed")),
            _ => return,
        };
        self.send(job_id, order_id, *to, notice).await;
    }

    /// Catch up on jobs whose events were dropped: every job past `Pending`
    /// has started, and terminal jobs have finished.
    pub async fn reconcile(&self, queue: &JobQueue) {
        for view in queue.list() {
            let Some(order_id) = view.order_id.as_deref() else {
                continue;
            };
            if view.status != JobStatus::Pending {
                self.send(&view.id, order_id, view.status, Notice::Start).await;
            }
            match view.status {
                JobStatus::Completed => {
                    self.send(&view.id, order_id, view.status, Notice::Complete).await
                }
                JobStatus::Error => {
                    let reason = view.last_error.as_deref().unwrap_or("copy job failed");
                    self.send(&view.id, order_id, view.status, Notice::Failed(reason)).await
                }
                _ => {}
            }
        }
    }

    async fn send(&self, job_id: &str, order_id: &str, status: JobStatus, notice: Notice<'_>) {
        let first = {
            let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
            match notice {
                Notice::Start => sent.started.insert(job_id.to_string()),
                Notice::Complete | Notice::Failed(_) => {
                    sent.started.insert(job_id.to_string());
                    sent.finished.insert(job_id.to_string())
                }
            }
        };
        if !first {
            return;
        }

        let result = match notice {
            Notice::Start => self.intake.notify_start(order_id).await,
            Notice::Complete => self.intake.notify_complete(order_id).await,
            Notice::Failed(reason) => self.intake.notify_failed(order_id, reason).await,
        };

        match result {
            Ok(()) => debug!(
                job_id = %job_id,
                order_id = %order_id,
                status = %status,
                "Order service notified"
            ),
            Err(e) => warn!(
                job_id = %job_id,
                order_id = %order_id,
                status = %status,
                "Failed to notify order service: {}", e
            ),
        }
    }
}
