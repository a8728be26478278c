//! Job API handlers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use mediacopier_core::{JobReport, JobStatus, JobView, OrganizationMode};

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for a manual copy job
#[derive(Debug, Deserialize)]
pub struct CreateJobBody {
    pub name: String,
    pub sources: Vec<PathBuf>,
    pub destination: PathBuf,
    #[serde(default)]
    pub organization_mode: OrganizationMode,
    /// Start immediately instead of leaving the job pending
    #[serde(default)]
    pub start: bool,
}

/// Query parameters for listing jobs
#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
    /// Filter by status
    pub status: Option<JobStatus>,
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobView>,
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/jobs
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListJobsParams>,
) -> Json<ListJobsResponse> {
    let jobs: Vec<JobView> = state
        .service()
        .jobs()
        .into_iter()
        .filter(|job| params.status.is_none_or(|s| job.status == s))
        .collect();
    let total = jobs.len();
    Json(ListJobsResponse { jobs, total })
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    Ok(Json(state.service().job(&id)?))
}

/// GET /api/v1/jobs/{id}/report
///
/// Per-item operations with COPIED/SKIPPED/FILTERED/FAILED counts.
pub async fn get_job_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobReport>, ApiError> {
    Ok(Json(state.service().job_report(&id)?))
}

/// POST /api/v1/jobs
///
/// Queue a copy of explicit source files.
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateJobBody>,
) -> Result<(StatusCode, Json<JobView>), ApiError> {
    let service = state.service();
    let view = service
        .add_manual_job(
            &body.name,
            &body.sources,
            &body.destination,
            body.organization_mode,
        )
        .await?;
    let view = if body.start {
        service.start_job(&view.id)?
    } else {
        view
    };
    Ok((StatusCode::CREATED, Json(view)))
}

/// DELETE /api/v1/jobs/{id}
pub async fn remove_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    Ok(Json(state.service().remove_job(&id)?))
}

/// POST /api/v1/jobs/{id}/start
pub async fn start_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    Ok(Json(state.service().start_job(&id)?))
}

/// POST /api/v1/jobs/{id}/pause
///
/// Takes effect after the item in flight.
pub async fn pause_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<JobView>), ApiError> {
    Ok((StatusCode::ACCEPTED, Json(state.service().pause_job(&id)?)))
}

/// POST /api/v1/jobs/{id}/resume
pub async fn resume_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    Ok(Json(state.service().resume_job(&id)?))
}

/// POST /api/v1/jobs/{id}/stop
///
/// Takes effect after the item in flight.
pub async fn stop_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<JobView>), ApiError> {
    Ok((StatusCode::ACCEPTED, Json(state.service().stop_job(&id)?)))
}
