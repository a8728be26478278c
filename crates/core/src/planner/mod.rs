//! Plan builder.
//!
//! Turns ranked candidates into a [`Plan`]: an ordered, capacity-bounded
//! selection with a destination path for every item. The usable budget is
//! `floor(capacity * (1 - reserve_fraction))`.

mod builder;
mod config;
mod error;
pub mod layout;
mod types;

pub use builder::PlanBuilder;
pub use config::PlannerConfig;
pub use error::PlanError;
pub use types::{OrganizationMode, Plan, PlanEntry, PlanOutcome, PlanRequest};
