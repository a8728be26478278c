//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Catalog indexing
//! - Planning and job lifecycle
//! - Copy execution
//! - Persistence and order intake

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Catalog
// =============================================================================

/// Items in the current catalog snapshot.
pub static CATALOG_ITEMS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("mediacopier_catalog_items", "Items in the current catalog").unwrap()
});

/// Catalog refreshes by result.
pub static CATALOG_REFRESHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediacopier_catalog_refreshes_total",
            "Total catalog refreshes",
        ),
        &["result"], // "ok", "partial", "failed"
    )
    .unwrap()
});

// =============================================================================
// Planning and jobs
// =============================================================================

/// Plans built by result.
pub static PLANS_BUILT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediacopier_plans_built_total", "Total plan builds"),
        &["result"], // "ok", "capacity", "invalid_destination", "invalid_reserve"
    )
    .unwrap()
});

/// Jobs added to the queue.
pub static JOBS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("mediacopier_jobs_created_total", "Total jobs created").unwrap()
});

/// Job status transitions.
pub static JOB_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediacopier_job_transitions_total",
            "Total job status transitions",
        ),
        &["from_state", "to_state"],
    )
    .unwrap()
});

// =============================================================================
// Execution
// =============================================================================

/// Items processed by outcome.
pub static ITEMS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediacopier_items_processed_total",
            "Total copy items processed",
        ),
        &["outcome"], // "copied", "skipped", "filtered", "failed", "verification_failed"
    )
    .unwrap()
});

/// Bytes written to destinations.
pub static BYTES_COPIED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("mediacopier_bytes_copied_total", "Total bytes copied").unwrap()
});

/// Time to copy and verify one item.
pub static COPY_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "mediacopier_copy_duration_seconds",
            "Duration of a single item copy including verification",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0]),
    )
    .unwrap()
});

// =============================================================================
// Persistence and intake
// =============================================================================

/// Queue snapshot saves by result.
pub static PERSISTENCE_SAVES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediacopier_persistence_saves_total",
            "Total queue snapshot saves",
        ),
        &["result"], // "ok", "failed"
    )
    .unwrap()
});

/// Requests to the order service.
pub static INTAKE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediacopier_intake_requests_total",
            "Total requests to the order service",
        ),
        &["operation", "result"],
    )
    .unwrap()
});

/// Orders received from the order service.
pub static ORDERS_RECEIVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediacopier_orders_received_total",
        "Total new orders received from the order service",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Catalog
        Box::new(CATALOG_ITEMS.clone()),
        Box::new(CATALOG_REFRESHES.clone()),
        // Planning and jobs
        Box::new(PLANS_BUILT.clone()),
        Box::new(JOBS_CREATED.clone()),
        Box::new(JOB_TRANSITIONS.clone()),
        // Execution
        Box::new(ITEMS_PROCESSED.clone()),
        Box::new(BYTES_COPIED.clone()),
        Box::new(COPY_DURATION.clone()),
        // Persistence and intake
        Box::new(PERSISTENCE_SAVES.clone()),
        Box::new(INTAKE_REQUESTS.clone()),
        Box::new(ORDERS_RECEIVED.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        JOB_TRANSITIONS
            .with_label_values(&["pending", "running"])
            .inc();
        assert!(!registry.gather().is_empty());
    }
}
