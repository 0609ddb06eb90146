//! Error handling for the print shop back office
//!
//! Every failure is rendered as `{ "error": { code, message, field } }`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{ConsumptionFailure, ReceivingError};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Permission denied: requires {0}")]
    InsufficientPermissions(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Receiving rejected: {0}")]
    Receiving(#[from] ReceivingError),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(#[from] ConsumptionFailure),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Validation error tied to a request field
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
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
    pub(crate) fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", message.clone()),
            ),
            AppError::InsufficientPermissions(permission) => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new(
                    "INSUFFICIENT_PERMISSIONS",
                    format!("Permission denied: requires {}", permission),
                ),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", msg.clone()),
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message: format!("A record with this {} already exists", field),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail::new("INVALID_STATE_TRANSITION", msg.clone()),
            ),
            AppError::Receiving(ReceivingError::OrderNotReceivable(_)) => (
                StatusCode::CONFLICT,
                ErrorDetail::new("INVALID_STATE_TRANSITION", self.to_string()),
            ),
            AppError::Receiving(ReceivingError::UnknownItem(_)) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", self.to_string()),
            ),
            AppError::Receiving(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "RECEIVING_REJECTED".to_string(),
                    message: err.to_string(),
                    field: Some("items".to_string()),
                },
            ),
            AppError::InsufficientStock(failure) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("INSUFFICIENT_STOCK", failure.to_string()),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred"),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred"),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
