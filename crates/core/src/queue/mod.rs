//! Job queue.
//!
//! Owns all jobs, enforces at most one running job per destination and
//! publishes a [`JobEvent`] for every change. Pause and stop requests reach
//! the executor as a [`ControlSignal`] it checks between items.

mod job_queue;
mod types;

pub use job_queue::JobQueue;
pub use types::{ControlSignal, JobEvent, QueueError};
