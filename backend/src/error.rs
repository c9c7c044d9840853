//! Error handling for the weather station
//!
//! Every failure leaves the service as a JSON `{"error": {...}}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::validation::FeedbackError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    /// Feedback submitted before any reading exists
    #[error("No reading to attach to: {0}")]
    NoTarget(String),

    /// Target reading is already labelled or no longer the latest
    #[error("Feedback conflict: {0}")]
    FeedbackConflict(String),

    // Persistence errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Threshold apply failed as a whole; the previous set is still live
    #[error("Threshold apply aborted: {0}")]
    ApplyAborted(String),

    // External service errors
    #[error("Sky sensor unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<FeedbackError> for AppError {
    fn from(err: FeedbackError) -> Self {
        match err {
            FeedbackError::Validation { field, message } => AppError::Validation { field, message },
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NoTarget(_) => StatusCode::NOT_FOUND,
            AppError::FeedbackConflict(_) => StatusCode::CONFLICT,
            AppError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::ApplyAborted(_)
            | AppError::Configuration(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_detail = match &self {
            AppError::Unauthorized(msg) => ErrorDetail::new("UNAUTHORIZED", msg.clone()),
            AppError::Validation { field, message } => ErrorDetail {
                field: Some(field.clone()),
                ..ErrorDetail::new("VALIDATION_ERROR", message.clone())
            },
            AppError::NoTarget(msg) => ErrorDetail::new("NO_TARGET", msg.clone()),
            AppError::FeedbackConflict(msg) => ErrorDetail::new("FEEDBACK_CONFLICT", msg.clone()),
            AppError::Persistence(_) => {
                ErrorDetail::new("PERSISTENCE_ERROR", "Reading storage is unavailable")
            }
            AppError::ApplyAborted(msg) => ErrorDetail::new(
                "APPLY_ABORTED",
                format!("Threshold apply aborted, previous values kept: {}", msg),
            ),
            AppError::SourceUnavailable(msg) => ErrorDetail::new("SOURCE_UNAVAILABLE", msg.clone()),
            AppError::Configuration(msg) => {
                ErrorDetail::new("CONFIGURATION_ERROR", format!("Configuration error: {}", msg))
            }
            AppError::DatabaseError(_) => {
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred")
            }
            AppError::Internal(msg) => ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
