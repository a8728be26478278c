//! In-process API tests over a real fulfillment service.
//!
//! Requests go through the full router (metrics middleware, tracing layer)
//! with `tower::ServiceExt::oneshot`; jobs copy real files between
//! temporary directories.

#[macro_use]
mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{TestFixture, MB};

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["matcher"]["artist_weight"], 2);
    assert_eq!(response.body["planner"]["reserve_fraction"], 0.02);
    assert!(response.body.get("intake").is_none());
}

#[tokio::test]
async fn test_catalog_stats_and_refresh() {
    let fixture = TestFixture::new().await;

    let stats = fixture.get("/api/v1/catalog/stats").await;
    assert_status!(stats, StatusCode::OK);
    assert_eq!(stats.body["total_items"], 4);
    assert_eq!(stats.body["by_type"]["audio"], 4);

    common::fixtures::write_file(&fixture.library, "Salsa/Celia Cruz/Quimbara.mp3", MB);
    let refresh = fixture.post_empty("/api/v1/catalog/refresh").await;
    assert_status!(refresh, StatusCode::OK);
    assert_eq!(refresh.body["items"], 5);
    assert_eq!(refresh.body["failures"], json!([]));
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_preview_uses_wire_format() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/orders/preview",
            json!({
                "order": {
                    "order_id": "ORD-1",
                    "product_type": "music",
                    "capacity": "10MB",
                    "genres": ["Salsa"]
                },
                "organization_mode": "by_genre"
            }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["order_id"], "ORD-1");
    assert_eq!(response.body["candidates"], 4);
    assert_eq!(response.body["matched"], 3);
    assert_eq!(response.body["plan"]["budget_bytes"], 9_800_000);

    let destinations: Vec<&str> = response.body["plan"]["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["destination"].as_str().unwrap())
        .collect();
    assert!(destinations.contains(&"Salsa/El Cantante.mp3"));
    assert!(destinations.contains(&"Salsa/La Vida Es Un Carnaval.mp3"));
    assert!(!destinations.contains(&"Salsa/Pedro Navaja.mp3"));

    // Nothing was queued.
    let jobs = fixture.get("/api/v1/jobs").await;
    assert_eq!(jobs.body["total"], 0);
}

#[tokio::test]
async fn test_preview_without_candidates_is_unprocessable() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post(
            "/api/v1/orders/preview",
            json!({
                "order": { "order_id": "ORD-2", "product_type": "movies", "capacity": 1000000 }
            }),
        )
        .await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["error"].as_str().unwrap().contains("ORD-2"));
}

#[tokio::test]
async fn test_submit_order_and_run_job() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/orders",
            json!({
                "order": {
                    "order_id": "ORD-3",
                    "product_type": "music",
                    "capacity": "10MB",
                    "genres": ["salsa"]
                },
                "destination": fixture.usb,
                "organization_mode": "single_folder",
                "start": true
            }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["status"], "running");
    assert_eq!(response.body["order_id"], "ORD-3");
    let id = response.body["id"].as_str().unwrap().to_string();

    fixture.service.wait_idle().await;

    let job = fixture.get(&format!("/api/v1/jobs/{}", id)).await;
    assert_status!(job, StatusCode::OK);
    assert_eq!(job.body["status"], "completed");
    assert_eq!(job.body["progress"], 100);
    assert!(fixture.usb.join("El Cantante.mp3").is_file());
    assert!(fixture.usb.join("La Vida Es Un Carnaval.mp3").is_file());

    // Finished jobs cannot be started again.
    let restart = fixture.post_empty(&format!("/api/v1/jobs/{}/start", id)).await;
    assert_status!(restart, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_pending_order_confirm_and_dismiss() {
    let fixture = TestFixture::new().await;
    let inbox = fixture.service.inbox();
    inbox.offer(common::fixtures::audio_order("ORD-4", &["salsa"], 10 * MB as u64));
    inbox.offer(common::fixtures::audio_order("ORD-5", &["rock"], 10 * MB as u64));

    let pending = fixture.get("/api/v1/orders/pending").await;
    assert_status!(pending, StatusCode::OK);
    assert_eq!(pending.body["total"], 2);
    assert_eq!(pending.body["intake_enabled"], false);

    let confirmed = fixture
        .post(
            "/api/v1/orders/pending/ORD-4/confirm",
            json!({ "destination": fixture.usb, "start": false }),
        )
        .await;
    assert_status!(confirmed, StatusCode::CREATED);
    assert_eq!(confirmed.body["status"], "pending");

    let dismissed = fixture.delete("/api/v1/orders/pending/ORD-5").await;
    assert_status!(dismissed, StatusCode::OK);
    assert_eq!(dismissed.body["order"]["order_id"], "ORD-5");

    let missing = fixture.delete("/api/v1/orders/pending/ORD-5").await;
    assert_status!(missing, StatusCode::NOT_FOUND);

    let pending = fixture.get("/api/v1/orders/pending").await;
    assert_eq!(pending.body["total"], 0);
}

// =============================================================================
// Jobs
// =============================================================================

#[tokio::test]
async fn test_manual_job_lifecycle() {
    let fixture = TestFixture::new().await;
    let source = fixture.library.join("Rock/Queen/Bohemian Rhapsody.mp3");

    let created = fixture
        .post(
            "/api/v1/jobs",
            json!({
                "name": "queen",
                "sources": [source],
                "destination": fixture.usb,
                "organization_mode": "by_artist"
            }),
        )
        .await;
    assert_status!(created, StatusCode::CREATED);
    assert_eq!(created.body["status"], "pending");
    let id = created.body["id"].as_str().unwrap().to_string();

    // Pausing a job that is not running is a conflict.
    let pause = fixture.post_empty(&format!("/api/v1/jobs/{}/pause", id)).await;
    assert_status!(pause, StatusCode::CONFLICT);

    let listed = fixture.get("/api/v1/jobs?status=pending").await;
    assert_eq!(listed.body["total"], 1);

    let started = fixture.post_empty(&format!("/api/v1/jobs/{}/start", id)).await;
    assert_status!(started, StatusCode::OK);
    fixture.service.wait_idle().await;
    assert!(fixture.usb.join("Queen/Bohemian Rhapsody.mp3").is_file());

    let report = fixture.get(&format!("/api/v1/jobs/{}/report", id)).await;
    assert_status!(report, StatusCode::OK);
    assert_eq!(report.body["summary"]["COPIED"], 1);
    assert_eq!(report.body["summary"]["TOTAL"], 1);
    assert_eq!(report.body["operations"][0]["status"], "COPIED");
    assert_eq!(report.body["operations"][0]["destination"], "Queen/Bohemian Rhapsody.mp3");

    let removed = fixture.delete(&format!("/api/v1/jobs/{}", id)).await;
    assert_status!(removed, StatusCode::OK);
    assert_eq!(removed.body["status"], "completed");

    let gone = fixture.get(&format!("/api/v1/jobs/{}", id)).await;
    assert_status!(gone, StatusCode::NOT_FOUND);
    let gone = fixture.get(&format!("/api/v1/jobs/{}/report", id)).await;
    assert_status!(gone, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manual_job_rejects_missing_source() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post(
            "/api/v1/jobs",
            json!({
                "name": "broken",
                "sources": [fixture.library.join("nope.mp3")],
                "destination": fixture.usb
            }),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("mediacopier_http_requests_total"));
    assert!(body.contains("mediacopier_jobs_by_status"));
    assert!(body.contains("mediacopier_catalog_items"));
}
