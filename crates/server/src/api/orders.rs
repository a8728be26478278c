//! Order API handlers: previews, direct submission and the pending-order
//! inbox fed by the order poller.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use mediacopier_core::intake::PendingOrder;
use mediacopier_core::{JobView, Order, OrderPreview, OrganizationMode};

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PreviewOrderBody {
    pub order: Order,
    /// Overrides the configured layout
    pub organization_mode: Option<OrganizationMode>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitOrderBody {
    pub order: Order,
    pub destination: PathBuf,
    pub organization_mode: Option<OrganizationMode>,
    #[serde(default)]
    pub start: bool,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmOrderBody {
    pub destination: PathBuf,
    pub organization_mode: Option<OrganizationMode>,
    #[serde(default = "default_start")]
    pub start: bool,
}

fn default_start() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct PendingOrdersResponse {
    pub orders: Vec<PendingOrder>,
    pub total: usize,
    pub intake_enabled: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/orders/preview
///
/// Match and plan an order without creating a job.
pub async fn preview_order(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PreviewOrderBody>,
) -> Result<Json<OrderPreview>, ApiError> {
    let preview = state
        .service()
        .preview_order(&body.order, body.organization_mode)?;
    Ok(Json(preview))
}

/// POST /api/v1/orders
///
/// Plan an order for a destination and queue the job.
pub async fn submit_order(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitOrderBody>,
) -> Result<(StatusCode, Json<JobView>), ApiError> {
    let service = state.service();
    let view = service.submit_order(&body.order, &body.destination, body.organization_mode)?;
    let view = if body.start {
        service.start_job(&view.id)?
    } else {
        view
    };
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/orders/pending
pub async fn list_pending(State(state): State<Arc<AppState>>) -> Json<PendingOrdersResponse> {
    let orders = state.service().pending_orders();
    let total = orders.len();
    Json(PendingOrdersResponse {
        orders,
        total,
        intake_enabled: state.intake_enabled(),
    })
}

/// POST /api/v1/orders/pending/{id}/confirm
///
/// Turn a pending order into a job, started by default.
pub async fn confirm_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ConfirmOrderBody>,
) -> Result<(StatusCode, Json<JobView>), ApiError> {
    let view = state.service().confirm_order(
        &id,
        &body.destination,
        body.organization_mode,
        body.start,
    )?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// DELETE /api/v1/orders/pending/{id}
pub async fn dismiss_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PendingOrder>, ApiError> {
    Ok(Json(state.service().dismiss_order(&id)?))
}
