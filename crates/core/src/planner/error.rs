//! Plan builder errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// Nothing among the candidates fits the budget.
    #[error("No item fits the capacity budget of {budget_bytes} bytes ({candidates} candidates)")]
    Capacity { candidates: usize, budget_bytes: u64 },

    #[error("Destination is not a writable directory: {0}")]
    InvalidDestination(PathBuf),

    #[error("Reserve fraction must be within [0, 1): {0}")]
    InvalidReserve(f64),
}
