//! Order intake trait.

use async_trait::async_trait;

use super::{IntakeError, Order};

/// The remote order service.
///
/// Lifecycle notifications are best effort: callers log failures and move on.
#[async_trait]
pub trait OrderIntake: Send + Sync {
    /// Orders waiting to be fulfilled.
    async fn fetch_pending_orders(&self) -> Result<Vec<Order>, IntakeError>;

    /// Fulfillment of the order has started.
    async fn notify_start(&self, order_id: &str) -> Result<(), IntakeError>;

    /// Fulfillment of the order finished successfully.
    async fn notify_complete(&self, order_id: &str) -> Result<(), IntakeError>;

    /// Fulfillment of the order failed.
    async fn notify_failed(&self, order_id: &str, reason: &str) -> Result<(), IntakeError>;

    /// Whether the service answers at all. Never errors.
    async fn check_connection(&self) -> bool;

    fn name(&self) -> &str;
}
