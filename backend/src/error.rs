//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use crate::orchestrator::error::{PollError, UpstreamError};
use crate::services::artifacts::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// All errors that can occur while handling a request are represented by this enum.
/// Each variant implements automatic conversion to HTTP responses via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A template name is not in the catalog
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// The upstream generative service failed
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// A video job ended without output
    #[error("Video generation failed: {0}")]
    VideoJob(#[from] PollError),

    /// Artifact storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownTemplate(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::VideoJob(PollError::TimedOut { .. }) => StatusCode::GATEWAY_TIMEOUT,
            AppError::VideoJob(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Storage(StorageError::InvalidName(_)) => StatusCode::BAD_REQUEST,
            AppError::Storage(StorageError::Io { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                AppError::InvalidRequest("empty".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Upstream(UpstreamError::Status {
                    status: 500,
                    body: "boom".to_string(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::VideoJob(PollError::NoOutput("job".to_string())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::VideoJob(PollError::TimedOut {
                    job_id: "job".to_string(),
                    status: "running".to_string(),
                    attempts: 3,
                }),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                AppError::Storage(StorageError::NotFound("x.png".to_string())),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "for {}", error);
        }
    }

    #[tokio::test]
    async fn test_response_body_has_error_field() {
        let response = AppError::UnknownTemplate("Neon".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Unknown template: Neon");
        assert_eq!(body["status"], 400);
    }
}
