//! Per-item operation log and the JSON report built from it.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rules::CollisionStrategy;
use super::types::{CopyItem, ItemOutcome, Job, JobStatus};
use crate::planner::OrganizationMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Copied,
    Skipped,
    Filtered,
    Failed,
}

/// What happened to one item of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOperation {
    pub index: usize,
    pub source: PathBuf,
    /// Relative to the job destination. Absent when nothing was written
    /// and no existing file was involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    pub status: OperationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub size_bytes: u64,
}

impl FileOperation {
    pub fn new(index: usize, item: &CopyItem, outcome: &ItemOutcome) -> Self {
        let (status, destination, reason) = match outcome {
            ItemOutcome::Copied { renamed_to, .. } => (
                OperationStatus::Copied,
                Some(renamed_to.clone().unwrap_or_else(|| item.destination.clone())),
                renamed_to
                    .as_ref()
                    .map(|_| "renamed to avoid an existing file".to_string()),
            ),
            ItemOutcome::Skipped { reason } => (
                OperationStatus::Skipped,
                Some(item.destination.clone()),
                Some(reason.to_string()),
            ),
            ItemOutcome::Filtered { reason } => {
                (OperationStatus::Filtered, None, Some(reason.to_string()))
            }
            ItemOutcome::Failed(failure) => (
                OperationStatus::Failed,
                Some(item.destination.clone()),
                Some(failure.message.clone()),
            ),
        };
        Self {
            index,
            source: item.source.clone(),
            destination,
            status,
            reason,
            size_bytes: item.size_bytes,
        }
    }
}

/// Operation counts by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ReportSummary {
    pub copied: usize,
    pub skipped: usize,
    pub filtered: usize,
    pub failed: usize,
    pub total: usize,
}

impl ReportSummary {
    fn from_operations(operations: &[FileOperation]) -> Self {
        let mut summary = Self {
            total: operations.len(),
            ..Self::default()
        };
        for op in operations {
            match op.status {
                OperationStatus::Copied => summary.copied += 1,
                OperationStatus::Skipped => summary.skipped += 1,
                OperationStatus::Filtered => summary.filtered += 1,
                OperationStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }
}

/// Exportable record of a job run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub job_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub destination: PathBuf,
    pub organization_mode: OrganizationMode,
    pub collision: CollisionStrategy,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Items in the job, processed or not.
    pub planned_items: usize,
    pub operations: Vec<FileOperation>,
    pub summary: ReportSummary,
    pub total_bytes_copied: u64,
    pub errors: Vec<String>,
}

impl JobReport {
    pub fn from_job(job: &Job) -> Self {
        let mut errors: Vec<String> = job
            .summary
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.source.display(), f.message))
            .collect();
        if let Some(error) = &job.last_error {
            errors.push(error.clone());
        }

        Self {
            job_id: job.id.clone(),
            job_name: job.name.clone(),
            order_id: job.order_id.clone(),
            destination: job.destination.clone(),
            organization_mode: job.organization_mode,
            collision: job.rules.copy.collision,
            status: job.status,
            created_at: job.created_at,
            updated_at: job.updated_at,
            planned_items: job.total_items(),
            summary: ReportSummary::from_operations(&job.operations),
            operations: job.operations.clone(),
            total_bytes_copied: job.summary.bytes_copied,
            errors,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report to `<dir>/<job_id>.json`, creating `dir` if needed.
    pub async fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        let json = self.to_json().map_err(io::Error::other)?;
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}.json", self.job_id));
        tokio::fs::write(&path, json).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{FilterReason, ItemFailure, ItemFailureKind, JobPayload, JobRules, SkipReason};

    fn item(name: &str) -> CopyItem {
        CopyItem {
            source: PathBuf::from(format!("/src/{}", name)),
            destination: PathBuf::from(name),
            size_bytes: 10,
        }
    }

    fn job_with_operations() -> Job {
        let items = vec![item("a.mp3"), item("b.mp3"), item("c.mp3"), item("d.mp3")];
        let mut job = Job::new(
            "Order 7",
            "/mnt/usb",
            JobPayload::Manual {
                items: items.clone(),
            },
            OrganizationMode::SingleFolder,
            JobRules::default(),
        );
        let failure = ItemFailure {
            index: 3,
            source: items[3].source.clone(),
            destination: items[3].destination.clone(),
            kind: ItemFailureKind::CopyFailed,
            message: "device busy".to_string(),
        };
        let outcomes = [
            ItemOutcome::Copied {
                bytes: 10,
                renamed_to: Some(PathBuf::from("a_1.mp3")),
            },
            ItemOutcome::Skipped {
                reason: SkipReason::Exists,
            },
            ItemOutcome::Filtered {
                reason: FilterReason::ExcludedWord {
                    word: "live".to_string(),
                },
            },
            ItemOutcome::Failed(failure),
        ];
        for (index, outcome) in outcomes.into_iter().enumerate() {
            job.operations.push(FileOperation::new(index, &items[index], &outcome));
            job.summary.record(outcome);
        }
        job
    }

    #[test]
    fn test_report_categories() {
        let report = JobReport::from_job(&job_with_operations());
        assert_eq!(
            report.summary,
            ReportSummary {
                copied: 1,
                skipped: 1,
                filtered: 1,
                failed: 1,
                total: 4,
            }
        );
        assert_eq!(report.planned_items, 4);
        assert_eq!(report.total_bytes_copied, 10);
        assert_eq!(report.errors, vec!["/src/d.mp3: device busy".to_string()]);
        assert_eq!(report.operations[0].destination, Some(PathBuf::from("a_1.mp3")));
        assert_eq!(report.operations[2].destination, None);
        assert_eq!(report.operations[2].reason.as_deref(), Some("name contains 'live'"));
    }

    #[test]
    fn test_report_json_shape() {
        let json = JobReport::from_job(&job_with_operations()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["job_name"], "Order 7");
        assert_eq!(value["collision"], "skip");
        assert_eq!(value["summary"]["COPIED"], 1);
        assert_eq!(value["summary"]["FILTERED"], 1);
        assert_eq!(value["summary"]["TOTAL"], 4);
        assert_eq!(value["operations"][1]["status"], "SKIPPED");
        assert_eq!(value["operations"][3]["status"], "FAILED");
    }

    #[tokio::test]
    async fn test_write_to_creates_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let report = JobReport::from_job(&job_with_operations());

        let path = report.write_to(&dir.path().join("reports")).await.unwrap();
        assert_eq!(path, dir.path().join("reports").join(format!("{}.json", report.job_id)));

        let parsed: JobReport = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed, report);
    }
}
