//! Order intake from the remote order service.
//!
//! Orders arrive by polling ([`OrderPoller`]) into an operator inbox
//! ([`OrderInbox`]). Progress on order-backed jobs flows back through the
//! [`LifecycleNotifier`].

mod circuit_breaker;
mod config;
mod error;
mod http;
mod inbox;
mod notifier;
mod poller;
mod traits;
mod types;

pub use circuit_breaker::CircuitBreaker;
pub use config::IntakeConfig;
pub use error::IntakeError;
pub use http::HttpOrderIntake;
pub use inbox::OrderInbox;
pub use notifier::LifecycleNotifier;
pub use poller::OrderPoller;
pub use traits::OrderIntake;
pub use types::{parse_capacity, AckResponse, Order, PendingOrder, PendingOrdersResponse};
