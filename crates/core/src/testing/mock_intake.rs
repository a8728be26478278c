//! Mock order intake for testing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::intake::{IntakeError, Order, OrderIntake};

/// A recorded notification for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Start(String),
    Complete(String),
    Failed(String, String),
}

/// Mock implementation of the OrderIntake trait.
///
/// Provides controllable behavior for testing:
/// - Serve a fixed list of pending orders
/// - Record lifecycle notifications
/// - Simulate an unreachable service
///
/// # Example
///
/// ```rust,ignore
/// use mediacopier_core::testing::MockOrderIntake;
///
/// let intake = MockOrderIntake::new();
/// intake.set_orders(vec![order]);
///
/// // ... run the poller or notifier ...
///
/// assert_eq!(intake.calls().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockOrderIntake {
    orders: Mutex<Vec<Order>>,
    calls: Mutex<Vec<RecordedCall>>,
    fail: AtomicBool,
}

impl MockOrderIntake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_orders(&self, orders: Vec<Order>) {
        *lock(&self.orders) = orders;
    }

    /// Make every call fail with a connection error.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Notifications received so far, including failed ones.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: RecordedCall) -> Result<(), IntakeError> {
        lock(&self.calls).push(call);
        self.check()
    }

    fn check(&self) -> Result<(), IntakeError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(IntakeError::Connection("mock intake unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl OrderIntake for MockOrderIntake {
    async fn fetch_pending_orders(&self) -> Result<Vec<Order>, IntakeError> {
        self.check()?;
        Ok(lock(&self.orders).clone())
    }

    async fn notify_start(&self, order_id: &str) -> Result<(), IntakeError> {
        self.record(RecordedCall::Start(order_id.to_string()))
    }

    async fn notify_complete(&self, order_id: &str) -> Result<(), IntakeError> {
        self.record(RecordedCall::Complete(order_id.to_string()))
    }

    async fn notify_failed(&self, order_id: &str, reason: &str) -> Result<(), IntakeError> {
        self.record(RecordedCall::Failed(
            order_id.to_string(),
            reason.to_string(),
        ))
    }

    async fn check_connection(&self) -> bool {
        !self.fail.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
