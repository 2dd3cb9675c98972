//! Numeric path parameter extractor with automatic validation.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};

/// Extractor for numeric `{id}` path parameters.
///
/// Parses the path segment as an integer and returns a structured 400
/// response when it is not numeric, before any handler or downstream
/// middleware runs.
///
/// # Example
/// ```ignore
/// use axum::Router;
/// use axum::routing::get;
/// use axum_helpers::extractors::IdPath;
///
/// async fn get_user(IdPath(id): IdPath) -> String {
///     format!("User ID: {}", id)
/// }
///
/// let app = Router::new().route("/users/{id}", get(get_user));
/// ```
pub struct IdPath(pub i64);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;

        match raw.parse::<i64>() {
            Ok(id) => Ok(IdPath(id)),
            Err(_) => {
                Err(AppError::BadRequest(format!("Invalid numeric id: {}", raw)).into_response())
            }
        }
    }
}
