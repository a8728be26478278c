use serde::Serialize;

use crate::planner::Plan;

/// Dry-run result for an order: what would be copied and what was left out.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPreview {
    pub order_id: String,
    /// Catalog items of the order's content type.
    pub candidates: usize,
    /// Candidates sharing at least one tag with the order.
    pub matched: usize,
    pub unused_candidates: usize,
    pub plan: Plan,
}
