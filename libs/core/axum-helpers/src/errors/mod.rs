pub mod handlers;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Standard error response structure.
///
/// Returned for every error response so clients get a consistent shape:
/// - `error`: machine-readable error identifier (e.g. "BadRequest")
/// - `message`: human-readable error message
/// - `details`: optional structured details (e.g. per-field validation errors)
///
/// # JSON Example
///
/// ```json
/// {
///   "error": "BadRequest",
///   "message": "Passwords do not match",
///   "details": null
/// }
/// ```
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error identifier for programmatic handling
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional structured error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application error type that converts into HTTP responses.
///
/// Infrastructure errors (database, hashing) are logged with their original
/// cause and answered with a fixed generic message; the cause never reaches
/// the client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message, details) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            AppError::Validation(e) => {
                tracing::info!("Validation error: {:?}", e);
                (
                    StatusCode::BAD_REQUEST,
                    "BadRequest",
                    "Request validation failed".to_string(),
                    Some(serde_json::to_value(&e).unwrap_or(serde_json::Value::Null)),
                )
            }
            AppError::BadRequest(msg) => {
                tracing::info!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "BadRequest", msg, None)
            }
            AppError::Unauthorized(msg) => {
                tracing::info!("Unauthorized: {}", msg);
                (StatusCode::UNAUTHORIZED, "Unauthorized", msg, None)
            }
            AppError::Forbidden(msg) => {
                tracing::info!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, "Forbidden", msg, None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NotFound", msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", msg, None),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_maps_to_400() {
        let response = AppError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let response =
            AppError::InternalServerError("connection reset by peer".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = AppError::NotFound("User 7 not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
