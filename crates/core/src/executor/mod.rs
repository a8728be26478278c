//! Copy execution.
//!
//! The [`JobExecutor`] walks a running job's items from its checkpoint,
//! copying each file in chunks through a temporary name and verifying the
//! result. Per-item problems are recorded in the job summary; a vanished
//! destination or too many failures end the job in `Error`.

mod config;
mod copy;
mod error;
mod runner;
mod space;

pub use config::ExecutorConfig;
pub use copy::copy_file;
pub use error::ExecutionError;
pub use runner::JobExecutor;
pub use space::{FreeSpace, StatvfsFreeSpace};
