use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::interview::InterviewError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<InterviewError> for AppError {
    fn from(err: InterviewError) -> Self {
        match err {
            InterviewError::EmptyAnswer => AppError::Validation(
                "answer is empty: provide a transcript, written text, or both".to_string(),
            ),
            InterviewError::NotFound(id) => {
                AppError::NotFound(format!("Interview session {id} not found"))
            }
            InterviewError::SessionBusy(id) => AppError::Conflict(format!(
                "a submission is already in flight for session {id}"
            )),
            InterviewError::AlreadyCompleted(id) => {
                AppError::Conflict(format!("interview session {id} is already completed"))
            }
            InterviewError::StartFailed(_) | InterviewError::TurnFailed(_) => {
                AppError::Model(err.to_string())
            }
            InterviewError::Corrupt(id) => AppError::Internal(anyhow::anyhow!(
                "session {id} is in an inconsistent state"
            )),
            InterviewError::Storage(e) => AppError::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Model(msg) => {
                tracing::error!("Model error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "MODEL_ERROR",
                    "The interview engine could not get a usable reply from the model. Please try again."
                        .to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
