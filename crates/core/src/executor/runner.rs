//! Runs admitted jobs item by item.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::fs;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::copy::copy_file;
use super::space::{FreeSpace, StatvfsFreeSpace};
use super::{ExecutionError, ExecutorConfig};
use crate::job::{
    normalized_name, numbered_name, CollisionStrategy, CopyItem, ItemFailure, ItemOutcome, Job,
    JobReport, JobStatus, OperationStatus, SkipReason,
};
use crate::metrics;
use crate::queue::{ControlSignal, JobQueue, QueueError};
use crate::validation::{resolve_within, DestinationValidator, FsPathValidator};
use crate::verifier::Verifier;

/// Numbered names tried before a colliding item is given up on.
const MAX_RENAME_ATTEMPTS: u32 = 9_999;

/// Where an item will be written, or why it is not.
enum Target {
    Write {
        path: PathBuf,
        /// Relative destination when it differs from the planned one.
        renamed_to: Option<PathBuf>,
    },
    Skip(SkipReason),
}

/// Executes running jobs against the filesystem.
///
/// The executor never changes job state directly: every outcome goes
/// through the [`JobQueue`]. Control signals are observed between items,
/// so a pause or stop takes effect after the item in flight. Removal is
/// the exception: it aborts the item being copied.
pub struct JobExecutor {
    queue: Arc<JobQueue>,
    config: ExecutorConfig,
    verifier: Verifier,
    space: Arc<dyn FreeSpace>,
    validator: Arc<dyn DestinationValidator>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl JobExecutor {
    pub fn new(queue: Arc<JobQueue>, config: ExecutorConfig) -> Self {
        let verifier = Verifier::new(config.chunk_size, config.checksum);
        Self {
            queue,
            config,
            verifier,
            space: Arc::new(StatvfsFreeSpace),
            validator: Arc::new(FsPathValidator),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn with_free_space(mut self, space: Arc<dyn FreeSpace>) -> Self {
        self.space = space;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn DestinationValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run a job that the queue has just admitted, in the background.
    pub fn spawn(self: &Arc<Self>, job_id: String, control: watch::Receiver<ControlSignal>) {
        let executor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            match executor.run_job(&job_id, control).await {
                Ok(status) => debug!(job_id = %job_id, status = %status, "Job run finished"),
                Err(QueueError::NotFound(_)) => {
                    info!(job_id = %job_id, "Job removed while running")
                }
                Err(e) => error!(job_id = %job_id, error = %e, "Job run aborted"),
            }
        });

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    /// Wait until every spawned job run has returned.
    pub async fn wait_idle(&self) {
        let handles: Vec<_> = {
            let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            tasks.drain(..).collect()
        };
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                error!("Job task panicked: {}", e);
            }
        }
    }

    /// Process a running job from its checkpoint until it completes, fails,
    /// or is paused or stopped. Returns the status the job settled in.
    ///
    /// A job removed mid-run yields [`QueueError::NotFound`]; its
    /// destination is released only then.
    pub async fn run_job(
        &self,
        job_id: &str,
        control: watch::Receiver<ControlSignal>,
    ) -> Result<JobStatus, QueueError> {
        let result = self.execute(job_id, &control).await;
        match &result {
            Ok(JobStatus::Paused) => {}
            Ok(_) => self.write_report(job_id).await,
            Err(QueueError::NotFound(_)) => self.queue.release_removed(job_id),
            Err(_) => {}
        }
        result
    }

    async fn execute(
        &self,
        job_id: &str,
        control: &watch::Receiver<ControlSignal>,
    ) -> Result<JobStatus, QueueError> {
        let job = self
            .queue
            .get(job_id)
            .ok_or_else(|| QueueError::NotFound(job_id.to_string()))?;

        if !self.validator.validate_path(&job.destination, true, true) {
            let reason = format!("Destination {} is not writable", job.destination.display());
            return self.settle(job_id, JobStatus::Error, Some(reason));
        }

        let items = job.payload.copy_items();
        let total = items.len();
        info!(
            job_id = %job_id,
            total,
            from_item = job.next_item,
            destination = %job.destination.display(),
            "Executing job"
        );

        // Names already claimed by earlier runs of this job.
        let mut seen: HashSet<String> = job
            .operations
            .iter()
            .filter(|op| op.status != OperationStatus::Filtered)
            .map(|op| normalized_name(&op.source))
            .filter(|name| !name.is_empty())
            .collect();

        for (index, item) in items.iter().enumerate().skip(job.next_item) {
            let signal = *control.borrow();
            match signal {
                ControlSignal::Continue => {}
                ControlSignal::Pause => return self.settle(job_id, JobStatus::Paused, None),
                ControlSignal::Stop => return self.settle(job_id, JobStatus::Stopped, None),
                ControlSignal::Abort => return Err(QueueError::NotFound(job_id.to_string())),
            }

            if !is_dir(&job.destination).await {
                let err = ExecutionError::DestinationUnavailable(job.destination.clone());
                return self.settle(job_id, JobStatus::Error, Some(err.to_string()));
            }

            let started = Instant::now();
            let outcome = match self.process_item(&job, item, control, &mut seen).await {
                Ok(outcome) => outcome,
                Err(ExecutionError::Aborted) => {
                    return Err(QueueError::NotFound(job_id.to_string()));
                }
                Err(e) if e.is_fatal() => {
                    return self.settle(job_id, JobStatus::Error, Some(e.to_string()));
                }
                Err(e) => {
                    warn!(
                        job_id = %job_id,
                        index,
                        source = %item.source.display(),
                        "Item failed: {}", e
                    );
                    ItemOutcome::Failed(ItemFailure {
                        index,
                        source: item.source.clone(),
                        destination: item.destination.clone(),
                        kind: e.kind(),
                        message: e.to_string(),
                    })
                }
            };

            metrics::ITEMS_PROCESSED
                .with_label_values(&[outcome.label()])
                .inc();
            if let ItemOutcome::Copied { bytes, .. } = outcome {
                metrics::BYTES_COPIED.inc_by(bytes);
                metrics::COPY_DURATION.observe(started.elapsed().as_secs_f64());
            }

            let view = self.queue.record_item(job_id, index, outcome)?;

            let failed = view.summary.failed_total();
            if failed as f64 / total as f64 > job.rules.max_failure_ratio {
                let reason = format!(
                    "{} of {} items failed, above the allowed ratio {}",
                    failed, total, job.rules.max_failure_ratio
                );
                return self.settle(job_id, JobStatus::Error, Some(reason));
            }
        }

        self.settle(job_id, JobStatus::Completed, None)
    }

    async fn process_item(
        &self,
        job: &Job,
        item: &CopyItem,
        control: &watch::Receiver<ControlSignal>,
        seen: &mut HashSet<String>,
    ) -> Result<ItemOutcome, ExecutionError> {
        if let Err(reason) = job.rules.copy.filter(&item.source, item.size_bytes, seen) {
            debug!(source = %item.source.display(), reason = %reason, "Item filtered");
            return Ok(ItemOutcome::Filtered { reason });
        }

        let planned = resolve_within(&job.destination, &item.destination)?;

        let source_meta =
            fs::metadata(&item.source)
                .await
                .map_err(|e| ExecutionError::SourceMissing {
                    path: item.source.clone(),
                    source: e,
                })?;
        if !source_meta.is_file() {
            return Err(ExecutionError::SourceMissing {
                path: item.source.clone(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }

        let (target, renamed_to) = match self
            .claim_target(job.rules.copy.collision, item, &planned, source_meta.len())
            .await?
        {
            Target::Write { path, renamed_to } => (path, renamed_to),
            Target::Skip(reason) => {
                debug!(target = %planned.display(), reason = %reason, "Destination kept");
                return Ok(ItemOutcome::Skipped { reason });
            }
        };

        let needed = source_meta.len();
        let available = self
            .space
            .available_bytes(&job.destination)
            .map_err(|_| ExecutionError::DestinationUnavailable(job.destination.clone()))?;
        if available < needed {
            return Err(ExecutionError::InsufficientSpace { needed, available });
        }

        let attempts = if job.rules.verify {
            1 + job.rules.verify_retries
        } else {
            1
        };

        for attempt in 1..=attempts {
            let copied = copy_file(&item.source, &target, self.config.chunk_size, control).await;
            let bytes = match copied {
                Ok(bytes) => bytes,
                Err(e) => {
                    return Err(self.classify_copy_error(job, item, &target, control, e).await);
                }
            };

            // Removed while the last chunk was written: the file must not stay.
            if *control.borrow() == ControlSignal::Abort {
                let _ = fs::remove_file(&target).await;
                return Err(ExecutionError::Aborted);
            }

            if !job.rules.verify {
                return Ok(ItemOutcome::Copied { bytes, renamed_to });
            }

            match self.verifier.verify(&item.source, &target).await {
                Ok(true) => return Ok(ItemOutcome::Copied { bytes, renamed_to }),
                Ok(false) => warn!(
                    target = %target.display(),
                    attempt,
                    attempts,
                    "Copy does not match source"
                ),
                Err(e) => warn!(
                    target = %target.display(),
                    attempt,
                    attempts,
                    "Verification error: {}", e
                ),
            }
            // The path was free when claimed, so this only removes our copy.
            let _ = fs::remove_file(&target).await;
        }

        Err(ExecutionError::VerificationFailed {
            destination: target,
            attempts,
        })
    }

    /// Apply the collision strategy to `planned`. An existing file is never
    /// written over.
    async fn claim_target(
        &self,
        strategy: CollisionStrategy,
        item: &CopyItem,
        planned: &Path,
        source_len: u64,
    ) -> Result<Target, ExecutionError> {
        let Some(existing) = entry_metadata(planned).await else {
            return Ok(Target::Write {
                path: planned.to_path_buf(),
                renamed_to: None,
            });
        };

        let skip = match strategy {
            CollisionStrategy::Skip => Some(SkipReason::Exists),
            CollisionStrategy::Rename => None,
            CollisionStrategy::CompareSize => {
                (existing.is_file() && existing.len() == source_len).then_some(SkipReason::SameSize)
            }
            CollisionStrategy::CompareHash => {
                let identical = existing.is_file()
                    && self
                        .verifier
                        .verify(&item.source, planned)
                        .await
                        .unwrap_or(false);
                identical.then_some(SkipReason::Identical)
            }
        };
        if let Some(reason) = skip {
            return Ok(Target::Skip(reason));
        }

        let file_name = planned
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_default();
        for n in 1..=MAX_RENAME_ATTEMPTS {
            let name = numbered_name(&file_name, n);
            let candidate = planned.with_file_name(&name);
            if entry_metadata(&candidate).await.is_none() {
                debug!(planned = %planned.display(), target = %candidate.display(), "Renamed copy");
                return Ok(Target::Write {
                    path: candidate,
                    renamed_to: Some(item.destination.with_file_name(&name)),
                });
            }
        }

        Err(ExecutionError::copy_failed(
            item.source.clone(),
            planned.to_path_buf(),
            io::Error::new(io::ErrorKind::AlreadyExists, "no free numbered name left"),
        ))
    }

    async fn classify_copy_error(
        &self,
        job: &Job,
        item: &CopyItem,
        target: &Path,
        control: &watch::Receiver<ControlSignal>,
        err: io::Error,
    ) -> ExecutionError {
        if err.kind() == io::ErrorKind::Interrupted && *control.borrow() == ControlSignal::Abort {
            ExecutionError::Aborted
        } else if entry_metadata(&item.source).await.is_none() {
            ExecutionError::SourceMissing {
                path: item.source.clone(),
                source: err,
            }
        } else if !is_dir(&job.destination).await {
            ExecutionError::DestinationUnavailable(job.destination.clone())
        } else {
            ExecutionError::copy_failed(item.source.clone(), target.to_path_buf(), err)
        }
    }

    fn settle(
        &self,
        job_id: &str,
        to: JobStatus,
        error: Option<String>,
    ) -> Result<JobStatus, QueueError> {
        if let Some(reason) = &error {
            warn!(job_id = %job_id, "Job failed: {}", reason);
        }
        self.queue.settle(job_id, to, error).map(|view| view.status)
    }

    async fn write_report(&self, job_id: &str) {
        let Some(dir) = &self.config.report_dir else {
            return;
        };
        let Some(job) = self.queue.get(job_id) else {
            return;
        };
        match JobReport::from_job(&job).write_to(dir).await {
            Ok(path) => info!(job_id = %job_id, path = %path.display(), "Job report written"),
            Err(e) => warn!(job_id = %job_id, "Failed to write job report: {}", e),
        }
    }
}

async fn entry_metadata(path: &Path) -> Option<std::fs::Metadata> {
    fs::symlink_metadata(path).await.ok()
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}
