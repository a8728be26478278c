//! The job queue: sole owner of job state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{ControlSignal, JobEvent, QueueError};
use crate::job::{FileOperation, ItemOutcome, Job, JobStatus, JobView};
use crate::metrics;
use crate::persistence::PersistedState;

const DEFAULT_EVENT_CAPACITY: usize = 256;

struct JobSlot {
    job: Mutex<Job>,
    control: watch::Sender<ControlSignal>,
}

impl JobSlot {
    fn new(job: Job) -> Arc<Self> {
        let (control, _) = watch::channel(ControlSignal::Continue);
        Arc::new(Self {
            job: Mutex::new(job),
            control,
        })
    }
}

#[derive(Default)]
struct Registry {
    order: Vec<String>,
    slots: HashMap<String, Arc<JobSlot>>,
}

/// Owns every job and serializes its state transitions.
///
/// Each job sits behind its own mutex, so transitions on one job never wait
/// on another beyond a registry lookup. Destinations with a running job are
/// tracked in a separate map; lock order is always job, then destinations.
///
/// Callers receive [`JobView`] or cloned [`Job`] values and change state only
/// through the methods below.
pub struct JobQueue {
    registry: RwLock<Registry>,
    active: Mutex<HashMap<PathBuf, String>>,
    events: broadcast::Sender<JobEvent>,
    accepted: AtomicBool,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            registry: RwLock::new(Registry::default()),
            active: Mutex::new(HashMap::new()),
            events,
            accepted: AtomicBool::new(false),
        }
    }

    /// Subscribe to job change events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Load saved jobs. Only valid before any job has been accepted.
    ///
    /// Jobs saved while running come back as `Pending` with their checkpoint
    /// reset; completed and errored jobs are never restored.
    pub fn restore(&self, state: PersistedState) -> Result<usize, QueueError> {
        if self.accepted.swap(true, Ordering::SeqCst) || !self.read_registry().order.is_empty() {
            return Err(QueueError::AlreadyInitialized);
        }

        let mut restored = 0;
        for mut job in state.jobs {
            if !job.status.is_persistable() {
                debug!(job_id = %job.id, status = %job.status, "Skipping non-restorable job");
                continue;
            }
            if job.status == JobStatus::Running {
                job.status = JobStatus::Pending;
                job.next_item = 0;
                job.progress = 0;
                job.summary = Default::default();
                job.operations.clear();
            }
            let job_id = job.id.clone();
            match self.insert(job) {
                Ok(_) => restored += 1,
                Err(e) => warn!(job_id = %job_id, error = %e, "Failed to restore job"),
            }
        }

        info!(restored, "Restored saved jobs");
        Ok(restored)
    }

    /// Add a new `Pending` job.
    pub fn add(&self, job: Job) -> Result<JobView, QueueError> {
        if job.status != JobStatus::Pending {
            return Err(QueueError::InvalidTransition {
                job_id: job.id,
                from: job.status,
                to: JobStatus::Pending,
            });
        }
        self.accepted.store(true, Ordering::SeqCst);
        let view = self.insert(job)?;
        metrics::JOBS_CREATED.inc();
        info!(job_id = %view.id, name = %view.name, items = view.total_items, "Job added");
        Ok(view)
    }

    /// All jobs in insertion order.
    pub fn list(&self) -> Vec<JobView> {
        self.slots()
            .iter()
            .map(|slot| JobView::from(&*lock(&slot.job)))
            .collect()
    }

    /// Full copy of one job.
    pub fn get(&self, id: &str) -> Option<Job> {
        self.slot(id).ok().map(|slot| lock(&slot.job).clone())
    }

    pub fn view(&self, id: &str) -> Option<JobView> {
        self.slot(id).ok().map(|slot| JobView::from(&*lock(&slot.job)))
    }

    pub fn len(&self) -> usize {
        self.read_registry().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts_by_status(&self) -> HashMap<JobStatus, usize> {
        let mut counts = HashMap::new();
        for slot in self.slots() {
            *counts.entry(lock(&slot.job).status).or_insert(0) += 1;
        }
        counts
    }

    /// Id of the job currently running against `destination`, if any.
    pub fn running_at(&self, destination: &Path) -> Option<String> {
        lock(&self.active).get(&destination_key(destination)).cloned()
    }

    /// `Pending -> Running`. Returns the control receiver the executor must
    /// observe between items.
    pub fn start(&self, id: &str) -> Result<(JobView, watch::Receiver<ControlSignal>), QueueError> {
        self.admit(id, JobStatus::Pending)
    }

    /// `Paused -> Running`, continuing from the job's checkpoint.
    pub fn resume(
        &self,
        id: &str,
    ) -> Result<(JobView, watch::Receiver<ControlSignal>), QueueError> {
        self.admit(id, JobStatus::Paused)
    }

    /// Ask a running job to pause at its next checkpoint.
    pub fn request_pause(&self, id: &str) -> Result<JobView, QueueError> {
        self.signal(id, ControlSignal::Pause, JobStatus::Paused)
    }

    /// Ask a running job to stop at its next checkpoint.
    pub fn request_stop(&self, id: &str) -> Result<JobView, QueueError> {
        self.signal(id, ControlSignal::Stop, JobStatus::Stopped)
    }

    /// Leave `Running` for `Paused`, `Stopped`, `Completed` or `Error` and
    /// release the destination.
    pub fn settle(
        &self,
        id: &str,
        to: JobStatus,
        error: Option<String>,
    ) -> Result<JobView, QueueError> {
        let slot = self.slot(id)?;
        let mut job = lock(&slot.job);
        if job.status != JobStatus::Running || !job.status.can_transition_to(to) {
            return Err(QueueError::InvalidTransition {
                job_id: id.to_string(),
                from: job.status,
                to,
            });
        }

        let from = job.status;
        job.status = to;
        if error.is_some() {
            job.last_error = error.clone();
        }
        job.updated_at = Utc::now();
        self.release(&job.destination, id);

        let view = JobView::from(&*job);
        drop(job);

        self.emit_status(&view, from, error);
        Ok(view)
    }

    /// Record the outcome of item `index` of a running job and advance its
    /// checkpoint.
    pub fn record_item(
        &self,
        id: &str,
        index: usize,
        outcome: ItemOutcome,
    ) -> Result<JobView, QueueError> {
        let slot = self.slot(id)?;
        let mut job = lock(&slot.job);
        if job.status != JobStatus::Running {
            return Err(QueueError::InvalidTransition {
                job_id: id.to_string(),
                from: job.status,
                to: JobStatus::Running,
            });
        }

        if let Some(item) = job.payload.item(index) {
            job.operations.push(FileOperation::new(index, &item, &outcome));
        }
        job.summary.record(outcome);
        job.next_item = index + 1;
        job.progress = job.progress_for(job.next_item);
        job.updated_at = Utc::now();

        let view = JobView::from(&*job);
        drop(job);

        let _ = self.events.send(JobEvent::Progress {
            job_id: view.id.clone(),
            progress: view.progress,
            next_item: view.next_item,
        });
        Ok(view)
    }

    /// Remove a job in any state.
    ///
    /// A running job is told to abort. Its destination stays reserved until
    /// the executor calls [`JobQueue::release_removed`], so no other job can
    /// start writing there while the in-flight item is torn down.
    pub fn remove(&self, id: &str) -> Result<JobView, QueueError> {
        let slot = {
            let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            let slot = registry
                .slots
                .remove(id)
                .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
            registry.order.retain(|existing| existing != id);
            slot
        };

        let job = lock(&slot.job);
        if job.status == JobStatus::Running {
            slot.control.send_replace(ControlSignal::Abort);
        }
        let view = JobView::from(&*job);
        drop(job);

        info!(job_id = %id, status = %view.status, "Job removed");
        let _ = self.events.send(JobEvent::Removed {
            job_id: id.to_string(),
        });
        Ok(view)
    }

    /// Free the destination held by a job that was removed while running.
    /// Does nothing while the job is still registered.
    pub fn release_removed(&self, id: &str) {
        if self.read_registry().slots.contains_key(id) {
            return;
        }
        let mut active = lock(&self.active);
        let held = active.len();
        active.retain(|_, running| running != id);
        if active.len() < held {
            debug!(job_id = %id, "Released destination of removed job");
        }
    }

    /// Copy of every restorable job, for persistence.
    pub fn snapshot(&self) -> PersistedState {
        let jobs = self
            .slots()
            .iter()
            .filter_map(|slot| {
                let job = lock(&slot.job);
                job.status.is_persistable().then(|| job.clone())
            })
            .collect();
        PersistedState::new(jobs)
    }

    fn admit(
        &self,
        id: &str,
        expected: JobStatus,
    ) -> Result<(JobView, watch::Receiver<ControlSignal>), QueueError> {
        let slot = self.slot(id)?;
        let mut job = lock(&slot.job);
        if job.status != expected {
            return Err(QueueError::InvalidTransition {
                job_id: id.to_string(),
                from: job.status,
                to: JobStatus::Running,
            });
        }

        let key = destination_key(&job.destination);
        {
            let mut active = lock(&self.active);
            if let Some(running) = active.get(&key) {
                return Err(QueueError::Concurrency {
                    destination: job.destination.clone(),
                    running_job: running.clone(),
                });
            }
            active.insert(key, id.to_string());
        }

        let from = job.status;
        job.status = JobStatus::Running;
        job.last_error = None;
        job.updated_at = Utc::now();
        slot.control.send_replace(ControlSignal::Continue);
        let control = slot.control.subscribe();

        let view = JobView::from(&*job);
        drop(job);

        self.emit_status(&view, from, None);
        Ok((view, control))
    }

    fn signal(
        &self,
        id: &str,
        signal: ControlSignal,
        target: JobStatus,
    ) -> Result<JobView, QueueError> {
        let slot = self.slot(id)?;
        let job = lock(&slot.job);
        if job.status != JobStatus::Running {
            return Err(QueueError::InvalidTransition {
                job_id: id.to_string(),
                from: job.status,
                to: target,
            });
        }
        slot.control.send_replace(signal);
        info!(job_id = %id, signal = ?signal, "Control signal sent");
        Ok(JobView::from(&*job))
    }

    fn insert(&self, job: Job) -> Result<JobView, QueueError> {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if registry.slots.contains_key(&job.id) {
            return Err(QueueError::Duplicate(job.id));
        }
        let view = JobView::from(&job);
        registry.order.push(job.id.clone());
        registry.slots.insert(job.id.clone(), JobSlot::new(job));
        drop(registry);

        let _ = self.events.send(JobEvent::Created {
            job_id: view.id.clone(),
        });
        Ok(view)
    }

    fn release(&self, destination: &Path, id: &str) {
        let key = destination_key(destination);
        let mut active = lock(&self.active);
        if active.get(&key).map(String::as_str) == Some(id) {
            active.remove(&key);
        }
    }

    fn emit_status(&self, view: &JobView, from: JobStatus, error: Option<String>) {
        metrics::JOB_TRANSITIONS
            .with_label_values(&[from.as_str(), view.status.as_str()])
            .inc();
        info!(job_id = %view.id, from = %from, to = %view.status, "Job status changed");
        let _ = self.events.send(JobEvent::StatusChanged {
            job_id: view.id.clone(),
            order_id: view.order_id.clone(),
            from,
            to: view.status,
            error,
        });
    }

    fn slot(&self, id: &str) -> Result<Arc<JobSlot>, QueueError> {
        self.read_registry()
            .slots
            .get(id)
            .cloned()
            .ok_or_else(|| QueueError::NotFound(id.to_string()))
    }

    fn slots(&self) -> Vec<Arc<JobSlot>> {
        let registry = self.read_registry();
        registry
            .order
            .iter()
            .filter_map(|id| registry.slots.get(id).cloned())
            .collect()
    }

    fn read_registry(&self) -> std::sync::RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Two spellings of the same directory must map to the same key.
fn destination_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
