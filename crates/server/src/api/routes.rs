use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::metrics_middleware;
use super::{catalog, handlers, jobs, orders};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Catalog
        .route("/catalog/stats", get(catalog::get_stats))
        .route("/catalog/refresh", post(catalog::refresh))
        // Jobs
        .route("/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route("/jobs/{id}", get(jobs::get_job).delete(jobs::remove_job))
        .route("/jobs/{id}/report", get(jobs::get_job_report))
        .route("/jobs/{id}/start", post(jobs::start_job))
        .route("/jobs/{id}/pause", post(jobs::pause_job))
        .route("/jobs/{id}/resume", post(jobs::resume_job))
        .route("/jobs/{id}/stop", post(jobs::stop_job))
        // Orders
        .route("/orders", post(orders::submit_order))
        .route("/orders/preview", post(orders::preview_order))
        .route("/orders/pending", get(orders::list_pending))
        .route("/orders/pending/{id}", delete(orders::dismiss_order))
        .route("/orders/pending/{id}/confirm", post(orders::confirm_order));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
