//! Catalog API handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use mediacopier_core::catalog::{CatalogStats, RefreshReport};

use super::error::ApiError;
use crate::state::AppState;

/// GET /api/v1/catalog/stats
///
/// Size of the current catalog snapshot by type, genre and artist.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<CatalogStats> {
    Json(state.service().catalog().stats())
}

/// POST /api/v1/catalog/refresh
///
/// Re-index the content roots and publish a new snapshot.
pub async fn refresh(State(state): State<Arc<AppState>>) -> Result<Json<RefreshReport>, ApiError> {
    let report = state.service().refresh_catalog().await?;
    Ok(Json(report))
}
