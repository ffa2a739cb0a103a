use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::review::ReviewError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Gateway error: {0}")]
    Gateway(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::InvalidUpload(msg) => AppError::Validation(msg),
            ReviewError::EmptyResumeText => {
                AppError::UnprocessableEntity(ReviewError::EmptyResumeText.to_string())
            }
            ReviewError::MalformedFeedback(msg) => AppError::UnprocessableEntity(msg),
            ReviewError::Gateway(e) => AppError::Gateway(e),
            ReviewError::CorruptRecord { key, source } => {
                AppError::Internal(anyhow::anyhow!("Stored record {key} is corrupt: {source}"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Sign in required".to_string(),
            ),
            AppError::Gateway(e) if e.is_unavailable() => {
                tracing::warn!("Gateway unavailable ({}): {e}", e.action());
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "GATEWAY_UNAVAILABLE",
                    e.to_string(),
                )
            }
            AppError::Gateway(e) => {
                tracing::error!("Gateway call failed ({}): {e}", e.action());
                (
                    StatusCode::BAD_GATEWAY,
                    "GATEWAY_ERROR",
                    "A platform service call failed".to_string(),
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
