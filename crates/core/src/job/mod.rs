//! Copy jobs.
//!
//! A [`Job`] wraps a plan (or a hand-assembled item list) with a destination,
//! a rules snapshot and a [`JobStatus`]. Status changes only happen through
//! the job queue.

mod report;
mod rules;
mod types;

pub use report::{FileOperation, JobReport, OperationStatus, ReportSummary};
pub use rules::{
    normalized_name, numbered_name, CollisionStrategy, CopyRules, FilterReason, SkipReason,
};
pub use types::{
    CopyItem, ItemFailure, ItemFailureKind, ItemOutcome, Job, JobPayload, JobRules, JobStatus,
    JobSummary, JobView,
};
