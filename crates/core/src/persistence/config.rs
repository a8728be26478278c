//! Configuration for job persistence.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceBackend {
    /// `pending_jobs.json` in the data directory.
    #[default]
    Json,
    /// `mediacopier.db` in the data directory.
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub backend: PersistenceBackend,

    /// Directory holding the store file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Seconds between periodic snapshots.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_interval_secs() -> u64 {
    60
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: PersistenceBackend::default(),
            data_dir: default_data_dir(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl PersistenceConfig {
    pub fn with_backend(mut self, backend: PersistenceBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Path of the store file for the configured backend.
    pub fn store_path(&self) -> PathBuf {
        match self.backend {
            PersistenceBackend::Json => self.data_dir.join("pending_jobs.json"),
            PersistenceBackend::Sqlite => self.data_dir.join("mediacopier.db"),
        }
    }
}
