use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::Job;

/// Format version written into every snapshot.
pub const STATE_VERSION: u32 = 1;

/// Restorable queue contents: jobs that are pending, running, paused or
/// stopped, in queue order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default = "default_version")]
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

impl PersistedState {
    /// Snapshot of `jobs`, dropping any that are not restorable.
    pub fn new(jobs: Vec<Job>) -> Self {
        Self {
            version: STATE_VERSION,
            saved_at: Utc::now(),
            jobs: jobs
                .into_iter()
                .filter(|job| job.status.is_persistable())
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
