//! Circuit breaker for the order service.

use std::time::{Duration, Instant};

use tracing::{error, info, warn};

/// Opens after `threshold` consecutive failures and rejects calls until
/// `timeout` has elapsed. The first call after that is let through with the
/// failure count reset; a success closes the circuit for good.
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    timeout: Duration,
    failures: u32,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, timeout: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            timeout,
            failures: 0,
            opened_at: None,
        }
    }

    /// `Ok` when a call may proceed, otherwise the time left until it may.
    pub fn check(&mut self) -> Result<(), Duration> {
        let Some(opened_at) = self.opened_at else {
            return Ok(());
        };
        let elapsed = opened_at.elapsed();
        if elapsed >= self.timeout {
            info!("Circuit breaker timeout elapsed, letting a trial request through");
            self.opened_at = None;
            self.failures = 0;
            Ok(())
        } else {
            Err(self.timeout - elapsed)
        }
    }

    pub fn record_success(&mut self) {
        if self.failures > 0 || self.opened_at.is_some() {
            info!("Request succeeded, resetting circuit breaker");
        }
        self.failures = 0;
        self.opened_at = None;
    }

    /// Returns true if this failure opened the circuit.
    pub fn record_failure(&mut self) -> bool {
        self.failures += 1;
        warn!(
            failures = self.failures,
            threshold = self.threshold,
            "Order service request failed"
        );
        if self.failures >= self.threshold && self.opened_at.is_none() {
            self.opened_at = Some(Instant::now());
            error!(
                timeout_secs = self.timeout.as_secs(),
                "Circuit breaker opened after {} failures", self.failures
            );
            return true;
        }
        false
    }

    pub fn is_open(&self) -> bool {
        self.opened_at
            .map(|at| at.elapsed() < self.timeout)
            .unwrap_or(false)
    }

    pub fn failure_count(&self) -> u32 {
        self.failures
    }
}
