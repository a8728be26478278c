//! Order intake errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Request to order service timed out: {0}")]
    Timeout(String),

    #[error("Cannot reach order service: {0}")]
    Connection(String),

    #[error("Order service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Circuit breaker is open, retry in {retry_in_secs}s")]
    CircuitOpen { retry_in_secs: u64 },

    #[error("Invalid response from order service: {0}")]
    Parse(String),

    #[error("Order service declined {operation} for order {order_id}")]
    Rejected { operation: String, order_id: String },

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl IntakeError {
    /// Transient failures worth another attempt. Client errors (4xx) are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            IntakeError::Timeout(_) | IntakeError::Connection(_) | IntakeError::Parse(_) => true,
            IntakeError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for IntakeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            IntakeError::Timeout(e.to_string())
        } else if e.is_decode() {
            IntakeError::Parse(e.to_string())
        } else if e.is_builder() {
            IntakeError::Client(e.to_string())
        } else {
            IntakeError::Connection(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(IntakeError::Timeout("t".into()).is_retryable());
        assert!(IntakeError::Parse("p".into()).is_retryable());
        assert!(IntakeError::Api {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!IntakeError::Api {
            status: 404,
            message: String::new()
        }
        .is_retryable());
        assert!(!IntakeError::CircuitOpen { retry_in_secs: 5 }.is_retryable());
    }
}
