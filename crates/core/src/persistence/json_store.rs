//! JSON file job store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{JobStore, PersistedState, PersistenceError};

/// Stores the queue snapshot as pretty-printed JSON.
///
/// Writes go to a temporary sibling file that is then renamed over the
/// target, so a reader never sees a half-written snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "pending_jobs.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl JobStore for JsonFileStore {
    fn save(&self, state: &PersistedState) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
            }
        }

        let json = serde_json::to_vec_pretty(state)?;
        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp).map_err(|e| PersistenceError::io(&temp, e))?;
            file.write_all(&json)
                .and_then(|_| file.sync_all())
                .map_err(|e| PersistenceError::io(&temp, e))?;
        }
        fs::rename(&temp, &self.path).map_err(|e| PersistenceError::io(&self.path, e))?;
        Ok(())
    }

    fn load(&self) -> Result<PersistedState, PersistenceError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PersistedState::empty())
            }
            Err(e) => return Err(PersistenceError::io(&self.path, e)),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{CopyItem, Job, JobPayload, JobRules, JobStatus};
    use crate::planner::OrganizationMode;
    use tempfile::TempDir;

    fn job(status: JobStatus) -> Job {
        let mut job = Job::new(
            "persisted",
            "/mnt/usb",
            JobPayload::Manual {
                items: vec![CopyItem {
                    source: PathBuf::from("/src/a.mp3"),
                    destination: PathBuf::from("a.mp3"),
                    size_bytes: 3,
                }],
            },
            OrganizationMode::SingleFolder,
            JobRules::default(),
        );
        job.status = status;
        job
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("pending_jobs.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/pending_jobs.json"));
        let state = PersistedState::new(vec![job(JobStatus::Paused), job(JobStatus::Stopped)]);

        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pending_jobs.json");
        fs::write(&path, b"{ not json").unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(
            store.load(),
            Err(PersistenceError::Serialization(_))
        ));
    }
}
