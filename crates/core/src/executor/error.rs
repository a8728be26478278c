//! Per-item execution errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::job::ItemFailureKind;
use crate::validation::ValidationError;

/// Why one plan item could not be copied. These are recorded in the job
/// summary; only [`ExecutionError::DestinationUnavailable`] and
/// [`ExecutionError::Aborted`] end the job.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Destination path rejected: {0}")]
    PathRejected(#[from] ValidationError),

    #[error("Source file not available: {path}: {source}")]
    SourceMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not enough free space: need {needed} bytes, {available} available")]
    InsufficientSpace { needed: u64, available: u64 },

    #[error("Copy from {source_path} to {destination} failed: {source}")]
    CopyFailed {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy of {destination} failed verification after {attempts} attempts")]
    VerificationFailed { destination: PathBuf, attempts: u32 },

    #[error("Destination is no longer available: {0}")]
    DestinationUnavailable(PathBuf),

    /// The job was removed while the item was being copied.
    #[error("Copy aborted")]
    Aborted,
}

impl ExecutionError {
    pub fn copy_failed(source: PathBuf, destination: PathBuf, err: std::io::Error) -> Self {
        ExecutionError::CopyFailed {
            source_path: source,
            destination,
            source: err,
        }
    }

    pub fn kind(&self) -> ItemFailureKind {
        match self {
            ExecutionError::PathRejected(_) => ItemFailureKind::PathRejected,
            ExecutionError::SourceMissing { .. } => ItemFailureKind::SourceMissing,
            ExecutionError::InsufficientSpace { .. } => ItemFailureKind::InsufficientSpace,
            ExecutionError::CopyFailed { .. }
            | ExecutionError::DestinationUnavailable(_)
            | ExecutionError::Aborted => ItemFailureKind::CopyFailed,
            ExecutionError::VerificationFailed { .. } => ItemFailureKind::Verification,
        }
    }

    /// Whether the job cannot continue at all.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExecutionError::DestinationUnavailable(_) | ExecutionError::Aborted
        )
    }
}
