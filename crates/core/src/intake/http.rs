//! HTTP client for the order service.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::{
    AckResponse, CircuitBreaker, IntakeConfig, IntakeError, Order, OrderIntake,
    PendingOrdersResponse,
};
use crate::metrics;

/// [`OrderIntake`] over the order service's REST API.
///
/// Every call goes through [`HttpOrderIntake::request`]: transient failures
/// are retried with exponential backoff and counted by a circuit breaker
/// shared across all calls.
pub struct HttpOrderIntake {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    max_attempts: u32,
    retry_delay: Duration,
    breaker: Mutex<CircuitBreaker>,
}

impl HttpOrderIntake {
    pub fn new(config: &IntakeConfig) -> Result<Self, IntakeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            max_attempts: config.max_retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            breaker: Mutex::new(CircuitBreaker::new(
                config.breaker_threshold,
                Duration::from_secs(config.breaker_timeout_secs),
            )),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn circuit_open(&self) -> bool {
        self.breaker().is_open()
    }

    fn order_url(&self, order_id: &str, action: &str) -> String {
        format!(
            "{}/api/orders/{}/{}",
            self.base_url,
            urlencoding::encode(order_id),
            action
        )
    }

    fn breaker(&self) -> std::sync::MutexGuard<'_, CircuitBreaker> {
        self.breaker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn builder(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Send a request with retry and circuit breaking, parsing a JSON body.
    async fn request<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        url: String,
        body: Option<serde_json::Value>,
    ) -> Result<T, IntakeError> {
        let result = self.request_with_retry(method, &url, body).await;
        let label = if result.is_ok() { "ok" } else { "failed" };
        metrics::INTAKE_REQUESTS
            .with_label_values(&[operation, label])
            .inc();
        result
    }

    async fn request_with_retry<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, IntakeError> {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            if let Err(wait) = self.breaker().check() {
                return Err(IntakeError::CircuitOpen {
                    retry_in_secs: wait.as_secs().max(1),
                });
            }

            debug!(
                attempt = attempt + 1,
                max = self.max_attempts,
                %method,
                url,
                "Order service request"
            );
            match self.send_once(method.clone(), url, body.as_ref()).await {
                Ok(value) => {
                    self.breaker().record_success();
                    return Ok(value);
                }
                Err(e) if e.is_retryable() => {
                    self.breaker().record_failure();
                    let delay = self.retry_delay * 2u32.saturating_pow(attempt);
                    warn!(attempt = attempt + 1, error = %e, "Order service request failed");
                    last_error = Some(e);
                    if attempt + 1 < self.max_attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            IntakeError::Connection(format!("no attempt made for {}", url))
        }))
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, IntakeError> {
        let mut request = self.builder(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IntakeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| IntakeError::Parse(e.to_string()))
    }

    async fn acknowledge(
        &self,
        operation: &'static str,
        order_id: &str,
        action: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(), IntakeError> {
        let url = self.order_url(order_id, action);
        let ack: AckResponse = self.request(operation, Method::POST, url, body).await?;
        if ack.success {
            info!(order_id, operation, "Order service acknowledged");
            Ok(())
        } else {
            Err(IntakeError::Rejected {
                operation: operation.to_string(),
                order_id: order_id.to_string(),
            })
        }
    }
}

#[async_trait]
impl OrderIntake for HttpOrderIntake {
    async fn fetch_pending_orders(&self) -> Result<Vec<Order>, IntakeError> {
        let url = format!("{}/api/orders/pending", self.base_url);
        let response: PendingOrdersResponse = self
            .request("fetch_pending", Method::GET, url, None)
            .await?;
        debug!(orders = response.orders.len(), "Fetched pending orders");
        Ok(response.orders)
    }

    async fn notify_start(&self, order_id: &str) -> Result<(), IntakeError> {
        self.acknowledge("notify_start", order_id, "start-burning", None)
            .await
    }

    async fn notify_complete(&self, order_id: &str) -> Result<(), IntakeError> {
        self.acknowledge("notify_complete", order_id, "complete-burning", None)
            .await
    }

    async fn notify_failed(&self, order_id: &str, reason: &str) -> Result<(), IntakeError> {
        let body = serde_json::json!({ "error_message": reason });
        self.acknowledge("notify_failed", order_id, "report-error", Some(body))
            .await
    }

    async fn check_connection(&self) -> bool {
        let url = format!("{}/api/orders/pending", self.base_url);
        match self.builder(Method::GET, &url).send().await {
            Ok(response) => response.status().as_u16() < 500,
            Err(e) => {
                debug!("Order service connection check failed: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}
