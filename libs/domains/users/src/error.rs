use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("User already exists")]
    AlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("Permission denied for user {0}")]
    Forbidden(i64),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

/// Convert UserError to AppError for standardized error responses.
///
/// Both validation failures report 400 with their specific reason; the
/// internal variants collapse to a generic 500 whose cause is only logged.
impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::PasswordMismatch => {
                AppError::BadRequest("Passwords do not match".to_string())
            }
            UserError::AlreadyExists => AppError::BadRequest("User already exists".to_string()),
            UserError::InvalidCredentials => {
                AppError::Unauthorized("Invalid email or password".to_string())
            }
            UserError::InvalidToken => {
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
            UserError::NotFound(id) => AppError::NotFound(format!("User {} not found", id)),
            UserError::Forbidden(id) => {
                AppError::Forbidden(format!("No permission to operate on user {}", id))
            }
            UserError::Validation(msg) => AppError::BadRequest(msg),
            UserError::PasswordHash(msg) => AppError::InternalServerError(msg),
            UserError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_validation_failures_map_to_400() {
        assert_eq!(
            UserError::PasswordMismatch.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            UserError::AlreadyExists.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_infrastructure_failures_map_to_500() {
        assert_eq!(
            UserError::Internal("db gone".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_failures() {
        assert_eq!(
            UserError::InvalidToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            UserError::Forbidden(7).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            UserError::NotFound(7).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
