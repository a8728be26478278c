use super::{PersistedState, PersistenceError};

/// Durable storage for the restorable part of the job queue.
///
/// Implementations are synchronous; async callers go through
/// `spawn_blocking`.
pub trait JobStore: Send + Sync {
    /// Replace the stored state with `state`.
    fn save(&self, state: &PersistedState) -> Result<(), PersistenceError>;

    /// Load the stored state. A store that was never written loads as empty.
    fn load(&self) -> Result<PersistedState, PersistenceError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
