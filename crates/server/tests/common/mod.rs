//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the router over a real
//! fulfillment service with a temporary music library and destination, so
//! jobs actually copy files.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mediacopier_core::{
    catalog::{CatalogConfig, ContentType},
    Config, FulfillmentService, JobQueue,
};
use mediacopier_server::state::AppState;

/// Re-export fixtures for test convenience
pub use mediacopier_core::testing::fixtures;

pub const MB: usize = 1_000_000;

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_preview() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/orders/preview", json!({
///         "order": { "order_id": "o-1", "product_type": "music", "capacity": "10MB" }
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub service: Arc<FulfillmentService>,
    /// Music library indexed at startup
    pub library: PathBuf,
    /// Empty destination directory
    pub usb: PathBuf,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture with a salsa and rock library.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let library = temp_dir.path().join("library");
        let usb = temp_dir.path().join("usb");
        std::fs::create_dir_all(&usb).expect("Failed to create destination");

        fixtures::music_library(
            &library,
            &[
                ("Salsa", "Hector Lavoe", "El Cantante", 2 * MB),
                ("Salsa", "Celia Cruz", "La Vida Es Un Carnaval", 3 * MB),
                ("Salsa", "Ruben Blades", "Pedro Navaja", 9 * MB),
                ("Rock", "Queen", "Bohemian Rhapsody", MB),
            ],
        );

        let mut config = Config::default();
        config.server.host = std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);
        config.server.port = 0; // Not used for in-process testing
        config.catalog = CatalogConfig::default().with_root(&library, ContentType::Audio);
        config.persistence = config
            .persistence
            .clone()
            .with_data_dir(temp_dir.path().join("data"));

        let service = Arc::new(FulfillmentService::new(&config, Arc::new(JobQueue::new())));
        service
            .refresh_catalog()
            .await
            .expect("Failed to index library");

        let state = Arc::new(AppState::new(config, Arc::clone(&service)));
        let router = mediacopier_server::api::create_router(state);

        Self {
            router,
            service,
            library,
            usb,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw text body.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
