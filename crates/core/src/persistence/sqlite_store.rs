//! SQLite-backed job store.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{JobStore, PersistedState, PersistenceError, STATE_VERSION};
use crate::job::Job;

/// SQLite-backed job store. Each save rewrites the job table in one
/// transaction.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
            }
        }
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), PersistenceError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS persisted_jobs (
                position INTEGER PRIMARY KEY,
                job_id TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL,
                job TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS persistence_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, PersistenceError> {
        self.conn
            .lock()
            .map_err(|e| PersistenceError::Database(format!("Lock poisoned: {}", e)))
    }
}

impl JobStore for SqliteJobStore {
    fn save(&self, state: &PersistedState) -> Result<(), PersistenceError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM persisted_jobs", [])?;
        for (position, job) in state.jobs.iter().enumerate() {
            let json = serde_json::to_string(job)?;
            tx.execute(
                "INSERT INTO persisted_jobs (position, job_id, status, job) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![position as i64, job.id, job.status.as_str(), json],
            )?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO persistence_meta (key, value) VALUES ('saved_at', ?1)",
            params![state.saved_at.to_rfc3339()],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO persistence_meta (key, value) VALUES ('version', ?1)",
            params![state.version.to_string()],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn load(&self) -> Result<PersistedState, PersistenceError> {
        let conn = self.lock()?;

        let saved_at: Option<String> = conn
            .query_row(
                "SELECT value FROM persistence_meta WHERE key = 'saved_at'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let Some(saved_at) = saved_at else {
            return Ok(PersistedState::empty());
        };
        let saved_at = DateTime::parse_from_rfc3339(&saved_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        let version: u32 = conn
            .query_row(
                "SELECT value FROM persistence_meta WHERE key = 'version'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .and_then(|v| v.parse().ok())
            .unwrap_or(STATE_VERSION);

        let mut stmt = conn.prepare("SELECT job FROM persisted_jobs ORDER BY position")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut jobs = Vec::new();
        for row in rows {
            let job: Job = serde_json::from_str(&row?)?;
            jobs.push(job);
        }

        Ok(PersistedState {
            version,
            saved_at,
            jobs,
        })
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{CopyItem, JobPayload, JobRules, JobStatus};
    use crate::planner::OrganizationMode;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn job(name: &str, status: JobStatus) -> Job {
        let mut job = Job::new(
            name,
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
    fn test_empty_store_loads_empty() {
        let store = SqliteJobStore::in_memory().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_replaces_previous_state() {
        let store = SqliteJobStore::in_memory().unwrap();
        let first =
            PersistedState::new(vec![job("a", JobStatus::Pending), job("b", JobStatus::Paused)]);
        store.save(&first).unwrap();
        assert_eq!(store.load().unwrap(), first);

        let second = PersistedState::new(vec![job("c", JobStatus::Stopped)]);
        store.save(&second).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.jobs.len(), 1);
        assert_eq!(loaded.jobs[0].name, "c");
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data/mediacopier.db");
        let state = PersistedState::new(vec![job("a", JobStatus::Running)]);

        SqliteJobStore::new(&path).unwrap().save(&state).unwrap();
        let loaded = SqliteJobStore::new(&path).unwrap().load().unwrap();
        assert_eq!(loaded.jobs, state.jobs);
    }
}
