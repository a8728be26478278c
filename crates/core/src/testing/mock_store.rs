//! In-memory job store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::persistence::{JobStore, PersistedState, PersistenceError};

/// [`JobStore`] kept in memory, with a switch to make saves fail.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    state: Mutex<Option<PersistedState>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with `state`, as if saved by an earlier run.
    pub fn with_state(state: PersistedState) -> Self {
        let store = Self::new();
        *store.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state);
        store
    }

    /// Successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl JobStore for MemoryJobStore {
    fn save(&self, state: &PersistedState) -> Result<(), PersistenceError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Database("simulated save failure".to_string()));
        }
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load(&self) -> Result<PersistedState, PersistenceError> {
        Ok(self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(PersistedState::empty))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
