use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::drafting::sections::SectionError;
use crate::drafting::workflow::WorkflowError;
use crate::gateway::GatewayError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Data gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Writing assistant unavailable: {0}")]
    AssistantUnavailable(String),
}

impl From<SectionError> for AppError {
    fn from(err: SectionError) -> Self {
        match err {
            SectionError::NotFound(id) => AppError::NotFound(format!("Section {id} not found")),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Busy(_) => AppError::Conflict(
                "Another save or publish is already in progress for this draft".to_string(),
            ),
            WorkflowError::Gateway(e) => AppError::Gateway(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Retryable errors are flagged so clients can distinguish "try again"
        // from "fix your request".
        let (status, code, message, retryable) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), false),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), false)
            }
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
                false,
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), false),
            AppError::Gateway(e) => {
                tracing::error!("Data gateway error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GATEWAY_ERROR",
                    "A data access error occurred".to_string(),
                    false,
                )
            }
            AppError::AssistantUnavailable(msg) => {
                tracing::error!("Writing assistant unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "ASSISTANT_UNAVAILABLE",
                    "The writing assistant is temporarily unavailable. Please try again."
                        .to_string(),
                    true,
                )
            }
        };

        let body = if retryable {
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                    "retryable": true
                }
            }))
        } else {
            Json(json!({
                "error": {
                    "code": code,
                    "message": message
                }
            }))
        };

        (status, body).into_response()
    }
}
