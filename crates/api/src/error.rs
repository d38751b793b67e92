//! Application-level error type for HTTP handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::json;

use dokuportal_core::error::CoreError;
use dokuportal_notify::jobs::JobError;
use dokuportal_notify::MailError;

/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
///
/// Implements [`IntoResponse`] with the reminder API's response contract:
/// authorization failures render `{"error": "Unauthorized"}` with 401,
/// everything else renders `{"error", "message", "timestamp"}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A reminder run aborted before completing.
    #[error(transparent)]
    Job(#[from] JobError),

    /// A diagnostic send failed.
    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Core(CoreError::Unauthorized(_)) => {
                // Per the trigger contract: terse body, no timestamp.
                let body = json!({ "error": "Unauthorized" });
                return (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response();
            }
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "Bad Request", msg.clone())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg.clone()),
            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    err.to_string(),
                )
            }
            AppError::Job(err) => {
                tracing::error!(error = %err, "Reminder job failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    err.to_string(),
                )
            }
            AppError::Mail(err) => {
                tracing::error!(error = %err, "Mail transport error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    err.to_string(),
                )
            }
        };

        let body = json!({
            "error": error,
            "message": message,
            "timestamp": Utc::now(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("valid JSON body")
    }

    #[tokio::test]
    async fn unauthorized_renders_terse_401() {
        let response =
            AppError::Core(CoreError::Unauthorized("bad token".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "error": "Unauthorized" }));
    }

    #[tokio::test]
    async fn validation_renders_400_with_message() {
        let response =
            AppError::Core(CoreError::Validation("recipient required".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Bad Request");
        assert_eq!(body["message"], "recipient required");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn job_error_renders_500_envelope() {
        let response = AppError::Job(JobError::Database(sqlx::Error::PoolClosed)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal Server Error");
        assert!(body["message"].is_string());
        assert!(body["timestamp"].is_string());
    }
}
