//! Job persistence.
//!
//! The restorable part of the queue (pending, running, paused and stopped
//! jobs) is saved through a [`JobStore`]: periodically by the
//! [`Snapshotter`] and once more at controlled shutdown. On startup the
//! saved state is loaded before any new job is accepted.

mod config;
mod error;
mod json_store;
mod snapshotter;
mod sqlite_store;
mod traits;
mod types;

pub use config::{PersistenceBackend, PersistenceConfig};
pub use error::PersistenceError;
pub use json_store::JsonFileStore;
pub use snapshotter::Snapshotter;
pub use sqlite_store::SqliteJobStore;
pub use traits::JobStore;
pub use types::{PersistedState, STATE_VERSION};

use std::sync::Arc;

use tracing::{info, warn};

/// Open the store selected by `config`.
pub fn create_store(config: &PersistenceConfig) -> Result<Arc<dyn JobStore>, PersistenceError> {
    let path = config.store_path();
    let store: Arc<dyn JobStore> = match config.backend {
        PersistenceBackend::Json => Arc::new(JsonFileStore::new(path)),
        PersistenceBackend::Sqlite => Arc::new(SqliteJobStore::new(&path)?),
    };
    Ok(store)
}

/// Load saved state for startup. A missing or unreadable store yields an
/// empty state so the service can always start.
pub fn load_or_empty(store: &dyn JobStore) -> PersistedState {
    match store.load() {
        Ok(state) => {
            info!(
                jobs = state.jobs.len(),
                backend = store.name(),
                "Loaded saved jobs"
            );
            state
        }
        Err(e) => {
            warn!(
                backend = store.name(),
                "Saved jobs could not be loaded, starting empty: {}", e
            );
            PersistedState::empty()
        }
    }
}
