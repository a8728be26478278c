//! Mapping of service errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use mediacopier_core::{PlanError, QueueError, ServiceError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A service error on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::Queue(QueueError::NotFound(_)) | ServiceError::OrderNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ServiceError::Queue(_) => StatusCode::CONFLICT,
            ServiceError::Plan(PlanError::Capacity { .. }) | ServiceError::NoCandidates { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServiceError::Plan(_)
            | ServiceError::NoSources
            | ServiceError::SourceUnavailable { .. } => StatusCode::BAD_REQUEST,
            ServiceError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use mediacopier_core::{ContentType, JobStatus};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ServiceError::Queue(QueueError::NotFound("j".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::Queue(QueueError::Concurrency {
                    destination: PathBuf::from("/mnt/usb"),
                    running_job: "j".into(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::Queue(QueueError::InvalidTransition {
                    job_id: "j".into(),
                    from: JobStatus::Completed,
                    to: JobStatus::Running,
                }),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::Plan(PlanError::Capacity {
                    candidates: 3,
                    budget_bytes: 10,
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServiceError::NoCandidates {
                    order_id: "o".into(),
                    content_type: ContentType::Movie,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServiceError::Plan(PlanError::InvalidDestination(PathBuf::from("/nope"))),
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::NoSources, StatusCode::BAD_REQUEST),
            (
                ServiceError::OrderNotFound("o".into()),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }
}
