// crates/server/src/error.rs
//! HTTP error mapping for the API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use wavescribe_db::DbError;
use wavescribe_types::{JobId, JobStatus};

use crate::jobs::{QueueError, SubmitError, TerminateError};

/// JSON body every error response carries.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Handler-level errors, each with a fixed HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Recording not found: {0}")]
    RecordingNotFound(String),

    #[error("Job already finished: {0}")]
    AlreadyFinished(JobStatus),

    #[error("Job queue full (capacity {0})")]
    QueueFull(usize),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Duplicate(dup) => ApiError::Conflict(dup.to_string()),
            SubmitError::Queue(QueueError::Full(capacity)) => ApiError::QueueFull(capacity),
            SubmitError::Queue(QueueError::Closed) => {
                ApiError::Internal("job queue is closed".to_string())
            }
        }
    }
}

impl From<TerminateError> for ApiError {
    fn from(err: TerminateError) -> Self {
        match err {
            TerminateError::NotFound(id) => ApiError::JobNotFound(id),
            TerminateError::AlreadyFinished(status) => ApiError::AlreadyFinished(status),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::JobNotFound(id) => {
                tracing::error!(job_id = %id, "Job not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("Job not found", format!("Job ID: {}", id)),
                )
            }
            ApiError::RecordingNotFound(id) => {
                tracing::error!(recording_id = %id, "Recording not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details(
                        "Recording not found",
                        format!("Recording ID: {}", id),
                    ),
                )
            }
            ApiError::AlreadyFinished(job_status) => {
                tracing::warn!(status = %job_status, "Terminate refused for finished job");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details(
                        "Job already finished",
                        format!("Job is already {}", job_status),
                    ),
                )
            }
            ApiError::QueueFull(capacity) => {
                tracing::warn!(capacity, "Job queue full, submission rejected");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::with_details(
                        "Job queue is full",
                        format!("Queue capacity: {}", capacity),
                    ),
                )
            }
            ApiError::Database(db_err) => {
                tracing::error!(error = %db_err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Database error", db_err.to_string()),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad request", msg.clone()),
                )
            }
            ApiError::Conflict(msg) => {
                tracing::warn!(message = %msg, "Conflict");
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::with_details("Conflict", msg.clone()),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use uuid::Uuid;

    async fn extract_response(response: Response) -> (StatusCode, ErrorResponse) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error_response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        (status, error_response)
    }

    #[tokio::test]
    async fn test_job_not_found_returns_404() {
        let id = Uuid::new_v4();
        let error = ApiError::JobNotFound(id);
        let response = error.into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Job not found");
        assert!(body.details.unwrap().contains(&id.to_string()));
    }

    #[tokio::test]
    async fn test_recording_not_found_returns_404() {
        let error = ApiError::RecordingNotFound("rec-42".to_string());
        let response = error.into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Recording not found");
        assert!(body.details.unwrap().contains("rec-42"));
    }

    #[tokio::test]
    async fn test_already_finished_returns_400() {
        let error = ApiError::AlreadyFinished(JobStatus::Completed);
        let response = error.into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Job already finished");
        assert!(body.details.unwrap().contains("completed"));
    }

    #[tokio::test]
    async fn test_queue_full_returns_503() {
        let error = ApiError::QueueFull(100);
        let response = error.into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error, "Job queue is full");
        assert!(body.details.unwrap().contains("100"));
    }

    #[tokio::test]
    async fn test_bad_request_returns_400() {
        let error = ApiError::BadRequest("kind must be transcription or summarization".to_string());
        let response = error.into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Bad request");
        assert!(body.details.unwrap().contains("kind"));
    }

    #[tokio::test]
    async fn test_conflict_returns_409() {
        let error = ApiError::Conflict("transcription already active".to_string());
        let response = error.into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error, "Conflict");
        assert!(body.details.unwrap().contains("already active"));
    }

    #[tokio::test]
    async fn test_internal_error_returns_500() {
        let error = ApiError::Internal("Something went wrong".to_string());
        let response = error.into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
        // The message goes to the log, never to the client.
        assert!(body.details.is_none());
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ErrorResponse::new("Test error");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"error\":\"Test error\""));
        assert!(!json.contains("details")); // absent, not null

        let response = ErrorResponse::with_details("Test error", "More info");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"error\":\"Test error\""));
        assert!(json.contains("\"details\":\"More info\""));
    }

    #[test]
    fn test_api_error_from_submit_error() {
        let err: ApiError = SubmitError::Queue(QueueError::Full(8)).into();
        assert!(matches!(err, ApiError::QueueFull(8)));

        let err: ApiError = SubmitError::Queue(QueueError::Closed).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn test_api_error_from_terminate_error() {
        let id = Uuid::new_v4();
        let err: ApiError = TerminateError::NotFound(id).into();
        assert!(matches!(err, ApiError::JobNotFound(got) if got == id));

        let err: ApiError = TerminateError::AlreadyFinished(JobStatus::Failed).into();
        assert!(matches!(err, ApiError::AlreadyFinished(JobStatus::Failed)));
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::RecordingNotFound("rec-1".to_string());
        assert_eq!(err.to_string(), "Recording not found: rec-1");

        let err = ApiError::QueueFull(4);
        assert_eq!(err.to_string(), "Job queue full (capacity 4)");

        let err = ApiError::Internal("oops".to_string());
        assert_eq!(err.to_string(), "Internal server error: oops");
    }
}
