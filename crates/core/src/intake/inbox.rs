//! Orders received but not yet confirmed by an operator.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use super::{Order, PendingOrder};

#[derive(Default)]
struct InboxState {
    pending: Vec<PendingOrder>,
    seen: HashSet<String>,
}

/// Pending-order inbox. An order id is accepted once; after it is taken or
/// dismissed, later polls that still report it are ignored.
#[derive(Default)]
pub struct OrderInbox {
    state: Mutex<InboxState>,
}

impl OrderInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an order not seen before. Returns false for known ids.
    pub fn offer(&self, order: Order) -> bool {
        let mut state = self.lock();
        if !state.seen.insert(order.order_id.clone()) {
            return false;
        }
        state.pending.push(PendingOrder {
            order,
            received_at: Utc::now(),
        });
        true
    }

    /// Waiting orders, oldest first.
    pub fn list(&self) -> Vec<PendingOrder> {
        self.lock().pending.clone()
    }

    pub fn get(&self, order_id: &str) -> Option<PendingOrder> {
        self.lock()
            .pending
            .iter()
            .find(|p| p.order.order_id == order_id)
            .cloned()
    }

    /// Remove an order for processing.
    pub fn take(&self, order_id: &str) -> Option<PendingOrder> {
        let mut state = self.lock();
        let index = state
            .pending
            .iter()
            .position(|p| p.order.order_id == order_id)?;
        Some(state.pending.remove(index))
    }

    /// Put back an order whose processing failed.
    pub fn restore(&self, pending: PendingOrder) {
        let mut state = self.lock();
        state.seen.insert(pending.order.order_id.clone());
        if !state
            .pending
            .iter()
            .any(|p| p.order.order_id == pending.order.order_id)
        {
            state.pending.push(pending);
            state.pending.sort_by_key(|p| p.received_at);
        }
    }

    /// Drop an order without processing it.
    pub fn dismiss(&self, order_id: &str) -> Option<PendingOrder> {
        self.take(order_id)
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, InboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
