//! Job types: status, payload, rules snapshot and per-item outcomes.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::report::FileOperation;
use super::rules::{CopyRules, FilterReason, SkipReason};
use crate::matcher::MatchWeights;
use crate::planner::{OrganizationMode, Plan};

/// Lifecycle status of a job.
///
/// ```text
/// Pending -> Running -> Completed
///               |  \-> Error
///               |  \-> Stopped
///               v
///             Paused -> Running
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Paused,
    Stopped,
    Completed,
    Error,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Paused,
        JobStatus::Stopped,
        JobStatus::Completed,
        JobStatus::Error,
    ];

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Returns true if `next` is a legal transition from this status.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Running, Paused)
                | (Paused, Running)
                | (Running, Stopped)
                | (Running, Completed)
                | (Running, Error)
        )
    }

    /// Statuses kept in a persisted snapshot.
    pub fn is_persistable(&self) -> bool {
        matches!(
            self,
            JobStatus::Pending | JobStatus::Running | JobStatus::Paused | JobStatus::Stopped
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Paused => "paused",
            JobStatus::Stopped => "stopped",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single source-to-destination copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyItem {
    pub source: PathBuf,
    /// Relative to the job's destination root.
    pub destination: PathBuf,
    pub size_bytes: u64,
}

/// What a job copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobPayload {
    /// Built by the plan builder for an order.
    Plan { plan: Plan },
    /// Assembled by hand from explicit source files.
    Manual { items: Vec<CopyItem> },
}

impl JobPayload {
    /// Items in execution order.
    pub fn copy_items(&self) -> Vec<CopyItem> {
        match self {
            JobPayload::Plan { plan } => plan
                .entries
                .iter()
                .map(|entry| CopyItem {
                    source: entry.item.source_path.clone(),
                    destination: entry.destination.clone(),
                    size_bytes: entry.item.size_bytes,
                })
                .collect(),
            JobPayload::Manual { items } => items.clone(),
        }
    }

    /// The item at `index`, without cloning the whole list.
    pub fn item(&self, index: usize) -> Option<CopyItem> {
        match self {
            JobPayload::Plan { plan } => plan.entries.get(index).map(|entry| CopyItem {
                source: entry.item.source_path.clone(),
                destination: entry.destination.clone(),
                size_bytes: entry.item.size_bytes,
            }),
            JobPayload::Manual { items } => items.get(index).cloned(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            JobPayload::Plan { plan } => plan.len(),
            JobPayload::Manual { items } => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_bytes(&self) -> u64 {
        match self {
            JobPayload::Plan { plan } => plan.total_bytes,
            JobPayload::Manual { items } => items.iter().map(|i| i.size_bytes).sum(),
        }
    }
}

/// Rules captured when the job was created. Later config changes do not
/// affect existing jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRules {
    pub match_weights: MatchWeights,
    pub reserve_fraction: f64,
    /// Job fails once `failed / total` exceeds this ratio.
    pub max_failure_ratio: f64,
    pub verify: bool,
    pub verify_retries: u32,
    #[serde(default)]
    pub copy: CopyRules,
}

impl Default for JobRules {
    fn default() -> Self {
        Self {
            match_weights: MatchWeights::default(),
            reserve_fraction: 0.02,
            max_failure_ratio: 0.5,
            verify: true,
            verify_retries: 1,
            copy: CopyRules::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemFailureKind {
    PathRejected,
    SourceMissing,
    InsufficientSpace,
    CopyFailed,
    Verification,
}

impl ItemFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemFailureKind::PathRejected => "path_rejected",
            ItemFailureKind::SourceMissing => "source_missing",
            ItemFailureKind::InsufficientSpace => "insufficient_space",
            ItemFailureKind::CopyFailed => "copy_failed",
            ItemFailureKind::Verification => "verification",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub index: usize,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: ItemFailureKind,
    pub message: String,
}

/// Result of processing one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// `renamed_to` holds the path actually written, relative to the job
    /// destination, when a collision moved the copy aside.
    Copied {
        bytes: u64,
        renamed_to: Option<PathBuf>,
    },
    /// An existing destination file was left in place.
    Skipped { reason: SkipReason },
    /// A copy rule excluded the item.
    Filtered { reason: FilterReason },
    Failed(ItemFailure),
}

impl ItemOutcome {
    pub fn copied(bytes: u64) -> Self {
        ItemOutcome::Copied {
            bytes,
            renamed_to: None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemOutcome::Copied { .. } => "copied",
            ItemOutcome::Skipped { .. } => "skipped",
            ItemOutcome::Filtered { .. } => "filtered",
            ItemOutcome::Failed(f) if f.kind == ItemFailureKind::Verification => {
                "verification_failed"
            }
            ItemOutcome::Failed(_) => "failed",
        }
    }
}

/// Per-item accounting of a job run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub copied: usize,
    pub skipped: usize,
    #[serde(default)]
    pub filtered: usize,
    pub failed: usize,
    pub verification_failed: usize,
    pub bytes_copied: u64,
    /// Copies written under a numbered name to avoid an existing file.
    #[serde(default)]
    pub renamed: usize,
    #[serde(default)]
    pub failures: Vec<ItemFailure>,
}

impl JobSummary {
    pub fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Copied { bytes, renamed_to } => {
                self.copied += 1;
                self.bytes_copied += bytes;
                if renamed_to.is_some() {
                    self.renamed += 1;
                }
            }
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Filtered { .. } => self.filtered += 1,
            ItemOutcome::Failed(failure) => {
                if failure.kind == ItemFailureKind::Verification {
                    self.verification_failed += 1;
                } else {
                    self.failed += 1;
                }
                self.failures.push(failure);
            }
        }
    }

    /// Failures of any kind.
    pub fn failed_total(&self) -> usize {
        self.failed + self.verification_failed
    }

    pub fn processed(&self) -> usize {
        self.copied + self.skipped + self.filtered + self.failed_total()
    }
}

/// A unit of copy work with a lifecycle status.
///
/// Jobs are owned by the [`crate::queue::JobQueue`]; everything outside the
/// queue works on clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub destination: PathBuf,
    pub payload: JobPayload,
    pub organization_mode: OrganizationMode,
    pub rules: JobRules,
    pub status: JobStatus,
    /// Percentage of items processed, 0-100.
    pub progress: u8,
    /// Index of the next unprocessed item.
    pub next_item: usize,
    #[serde(default)]
    pub summary: JobSummary,
    /// One entry per processed item, in processing order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<FileOperation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(
        name: impl Into<String>,
        destination: impl Into<PathBuf>,
        payload: JobPayload,
        organization_mode: OrganizationMode,
        rules: JobRules,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            order_id: None,
            destination: destination.into(),
            payload,
            organization_mode,
            rules,
            status: JobStatus::Pending,
            progress: 0,
            next_item: 0,
            summary: JobSummary::default(),
            operations: Vec::new(),
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Job for a plan; the layout comes from the plan.
    pub fn from_plan(
        name: impl Into<String>,
        destination: impl Into<PathBuf>,
        plan: Plan,
        rules: JobRules,
    ) -> Self {
        let mode = plan.organization_mode;
        Self::new(name, destination, JobPayload::Plan { plan }, mode, rules)
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn total_items(&self) -> usize {
        self.payload.len()
    }

    /// Progress after `processed` of the job's items.
    pub fn progress_for(&self, processed: usize) -> u8 {
        let total = self.total_items();
        if total == 0 {
            return 100;
        }
        ((processed.min(total) * 100) / total) as u8
    }
}

/// Read-only summary of a job handed to callers outside the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobView {
    pub id: String,
    pub name: String,
    pub order_id: Option<String>,
    pub destination: PathBuf,
    pub status: JobStatus,
    pub progress: u8,
    pub total_items: usize,
    pub total_bytes: u64,
    pub next_item: usize,
    pub organization_mode: OrganizationMode,
    pub summary: JobSummary,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            name: job.name.clone(),
            order_id: job.order_id.clone(),
            destination: job.destination.clone(),
            status: job.status,
            progress: job.progress,
            total_items: job.total_items(),
            total_bytes: job.payload.total_bytes(),
            next_item: job.next_item,
            organization_mode: job.organization_mode,
            summary: job.summary.clone(),
            last_error: job.last_error.clone(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_job(n: usize) -> Job {
        let items = (0..n)
            .map(|i| CopyItem {
                source: PathBuf::from(format!("/src/{}.mp3", i)),
                destination: PathBuf::from(format!("{}.mp3", i)),
                size_bytes: 10,
            })
            .collect();
        Job::new(
            "manual",
            "/mnt/usb",
            JobPayload::Manual { items },
            OrganizationMode::SingleFolder,
            JobRules::default(),
        )
    }

    #[test]
    fn test_transitions() {
        use JobStatus::*;
        assert!(Pending.can_transition_to(Running));
        assert!(Running.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Running));
        assert!(Running.can_transition_to(Stopped));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Error));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Paused.can_transition_to(Completed));
        assert!(!Stopped.can_transition_to(Running));
        for next in JobStatus::ALL {
            assert!(!Completed.can_transition_to(next));
            assert!(!Error.can_transition_to(next));
        }
    }

    #[test]
    fn test_terminal_and_persistable() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(!JobStatus::Stopped.is_terminal());
        assert!(JobStatus::Stopped.is_persistable());
        assert!(!JobStatus::Completed.is_persistable());
        assert!(!JobStatus::Error.is_persistable());
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_string(&JobStatus::Paused).unwrap(), "\"paused\"");
        let status: JobStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(status, JobStatus::Error);
    }

    #[test]
    fn test_progress_for() {
        let job = manual_job(3);
        assert_eq!(job.progress_for(0), 0);
        assert_eq!(job.progress_for(1), 33);
        assert_eq!(job.progress_for(3), 100);
        assert_eq!(manual_job(0).progress_for(0), 100);
    }

    #[test]
    fn test_summary_record() {
        let mut summary = JobSummary::default();
        summary.record(ItemOutcome::copied(5));
        summary.record(ItemOutcome::Copied {
            bytes: 7,
            renamed_to: Some(PathBuf::from("a_1.mp3")),
        });
        summary.record(ItemOutcome::Skipped {
            reason: SkipReason::Identical,
        });
        summary.record(ItemOutcome::Filtered {
            reason: FilterReason::Duplicate {
                name: "a".to_string(),
            },
        });
        summary.record(ItemOutcome::Failed(ItemFailure {
            index: 2,
            source: PathBuf::from("/src/a"),
            destination: PathBuf::from("a"),
            kind: ItemFailureKind::Verification,
            message: "checksum mismatch".to_string(),
        }));
        assert_eq!(summary.copied, 2);
        assert_eq!(summary.renamed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.filtered, 1);
        assert_eq!(summary.verification_failed, 1);
        assert_eq!(summary.failed_total(), 1);
        assert_eq!(summary.processed(), 5);
        assert_eq!(summary.bytes_copied, 12);
    }

    #[test]
    fn test_job_serde_roundtrip_keeps_payload() {
        let job = manual_job(2).with_order_id("order-1");
        let json = serde_json::to_string(&job).unwrap();
        let parsed: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, job);
        assert_eq!(parsed.payload.copy_items().len(), 2);
        assert_eq!(parsed.payload.item(1), Some(parsed.payload.copy_items()[1].clone()));
        assert_eq!(parsed.payload.item(2), None);
    }

    #[test]
    fn test_rules_without_copy_section_load_defaults() {
        let mut value = serde_json::to_value(JobRules::default()).unwrap();
        value.as_object_mut().unwrap().remove("copy");
        let rules: JobRules = serde_json::from_value(value).unwrap();
        assert_eq!(rules.copy, CopyRules::default());
    }
}
