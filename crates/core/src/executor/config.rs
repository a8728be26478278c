//! Configuration for the copy executor.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::verifier::ChecksumType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Read/write chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// A job fails once `failed / total` exceeds this ratio.
    #[serde(default = "default_max_failure_ratio")]
    pub max_failure_ratio: f64,

    /// Verify every copy against its source.
    #[serde(default = "default_true")]
    pub verify: bool,

    /// Extra copy attempts after a verification mismatch.
    #[serde(default = "default_verify_retries")]
    pub verify_retries: u32,

    #[serde(default)]
    pub checksum: ChecksumType,

    /// Write a JSON report per finished job into this directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<PathBuf>,
}

fn default_chunk_size() -> usize {
    1024 * 1024 // 1 MiB
}

fn default_max_failure_ratio() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

fn default_verify_retries() -> u32 {
    1
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_failure_ratio: default_max_failure_ratio(),
            verify: true,
            verify_retries: default_verify_retries(),
            checksum: ChecksumType::default(),
            report_dir: None,
        }
    }
}

impl ExecutorConfig {
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn with_max_failure_ratio(mut self, ratio: f64) -> Self {
        self.max_failure_ratio = ratio;
        self
    }

    pub fn with_verify(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }

    pub fn with_checksum(mut self, checksum: ChecksumType) -> Self {
        self.checksum = checksum;
        self
    }

    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(dir.into());
        self
    }
}
