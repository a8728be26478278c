//! Queue events, control signals and errors.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::job::JobStatus;

/// Cooperative control signal observed by the executor between items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Continue,
    Pause,
    Stop,
    /// The job was removed. Unlike the others this also interrupts the item
    /// being copied.
    Abort,
}

/// Change notification published by the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    Created {
        job_id: String,
    },
    StatusChanged {
        job_id: String,
        order_id: Option<String>,
        from: JobStatus,
        to: JobStatus,
        error: Option<String>,
    },
    Progress {
        job_id: String,
        progress: u8,
        next_item: usize,
    },
    Removed {
        job_id: String,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> &str {
        match self {
            JobEvent::Created { job_id }
            | JobEvent::StatusChanged { job_id, .. }
            | JobEvent::Progress { job_id, .. }
            | JobEvent::Removed { job_id } => job_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueueError {
    #[error("Job not found: {0}")]
    NotFound(String),

    /// Another job is already running against the same destination.
    #[error("Destination {destination} is in use by running job {running_job}")]
    Concurrency {
        destination: PathBuf,
        running_job: String,
    },

    #[error("Cannot move job {job_id} from {from} to {to}")]
    InvalidTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Job {0} already exists")]
    Duplicate(String),

    #[error("Saved state can only be restored into an empty queue before any job is accepted")]
    AlreadyInitialized,
}
