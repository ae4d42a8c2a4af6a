//! Error handling for the Weather Query service
//!
//! Validation and not-found errors carry a message meant for the caller.
//! Infrastructure failures are logged in full and answered with a generic
//! message only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // External service errors
    #[error("Weather provider error: {message}")]
    WeatherProvider { status: Option<u16>, message: String },

    #[error("AI service unavailable: {0}")]
    AiUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn weather_provider<S: Into<String>>(status: Option<u16>, message: S) -> Self {
        Self::WeatherProvider {
            status,
            message: message.into(),
        }
    }

    /// Validation and not-found errors are the caller's to fix
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. }
                | AppError::ValidationError(_)
                | AppError::LocationNotFound(_)
                | AppError::UnsupportedFormat(_)
                | AppError::NotFound(_)
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<&str> = field_errors.keys().copied().collect();
        fields.sort_unstable();
        match fields.first() {
            Some(field) => {
                let message = field_errors
                    .get(field)
                    .and_then(|errs| errs.first())
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                AppError::Validation {
                    field: (*field).to_string(),
                    message,
                }
            }
            None => AppError::ValidationError(errors.to_string()),
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

fn detail(code: &str, message: impl Into<String>, field: Option<String>) -> ErrorDetail {
    ErrorDetail {
        code: code.to_string(),
        message: message.into(),
        field,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                detail("VALIDATION_ERROR", message.clone(), Some(field.clone())),
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                detail("VALIDATION_ERROR", msg.clone(), None),
            ),
            AppError::LocationNotFound(location) => (
                StatusCode::BAD_REQUEST,
                detail(
                    "LOCATION_NOT_FOUND",
                    format!("Location '{}' could not be found", location),
                    Some("location".to_string()),
                ),
            ),
            AppError::UnsupportedFormat(format) => (
                StatusCode::BAD_REQUEST,
                detail(
                    "UNSUPPORTED_FORMAT",
                    format!(
                        "Unsupported export format '{}'; use json, csv, xml, pdf or markdown",
                        format
                    ),
                    Some("format".to_string()),
                ),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                detail("NOT_FOUND", format!("{} not found", resource), None),
            ),
            AppError::WeatherProvider { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                detail("WEATHER_PROVIDER_ERROR", "Weather data is currently unavailable", None),
            ),
            AppError::AiUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                detail("AI_UNAVAILABLE", "AI insights are currently unavailable", None),
            ),
            AppError::Configuration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                detail("CONFIGURATION_ERROR", "The service is misconfigured", None),
            ),
            AppError::Database(_) | AppError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                detail("STORAGE_ERROR", "A storage error occurred", None),
            ),
            AppError::Internal(_) | AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                detail("INTERNAL_ERROR", "An internal server error occurred", None),
            ),
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
