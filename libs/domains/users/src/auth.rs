//! Token middleware and login endpoint.
//!
//! Sessions live in the database: login verifies credentials and issues a
//! session row; the middleware resolves bearer tokens back to an
//! [`AuthSession`] before protected operations run. The guards mirror the
//! route middleware chain: numeric-id and id-exists checks first, then token
//! validation, then the per-id permission check.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use axum_helpers::{AppError, IdPath, ValidatedJson};
use std::sync::Arc;

use crate::error::{UserError, UserResult};
use crate::models::{AuthSession, LoginRequest, LoginResponse};
use crate::repository::UserRepository;
use crate::service::UserService;

/// Extract the bearer token from the Authorization header
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer ").map(|s| s.to_string()))
}

/// Token validation middleware.
///
/// Resolves the bearer token to a live session row and inserts the
/// [`AuthSession`] into request extensions. Missing, unknown and expired
/// tokens are all rejected with 401.
pub async fn require_session<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let Some(token) = bearer_token(&headers) else {
        tracing::debug!("No token in Authorization header");
        return Err(AppError::Unauthorized("No token provided".to_string()).into_response());
    };

    let auth = service
        .authenticate(&token)
        .await
        .map_err(|e| e.into_response())?;

    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}

/// Id-exists guard for the `/{id}` routes.
///
/// The leading [`IdPath`] extraction doubles as the numeric-format check:
/// non-numeric ids are rejected with 400 before this body runs. Existence is
/// checked against rows of any status, so soft-deleted users still pass.
pub async fn require_user_exists<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    IdPath(id): IdPath,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    match service.user_exists(id).await {
        Ok(true) => Ok(next.run(request).await),
        Ok(false) => Err(UserError::NotFound(id).into_response()),
        Err(e) => Err(e.into_response()),
    }
}

/// Permission guard: a caller may only operate on its own id.
///
/// Relies on [`require_session`] having inserted the [`AuthSession`]
/// extension further out in the middleware chain.
pub async fn require_permission(
    IdPath(id): IdPath,
    Extension(auth): Extension<AuthSession>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    if auth.user_id != id {
        tracing::debug!(
            caller = auth.user_id,
            target = id,
            "Permission check failed"
        );
        return Err(UserError::Forbidden(id).into_response());
    }

    Ok(next.run(request).await)
}

/// Router exposing the login endpoint.
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/login", post(login::<R>))
        .with_state(shared_service)
}

/// Verify credentials and issue a session token
///
/// POST /auth/login
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token issued", body = LoginResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
async fn login<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> UserResult<Json<LoginResponse>> {
    let session = service.login(&input.email, &input.password).await?;

    Ok(Json(LoginResponse {
        token: session.token,
        expiration: session.expiration,
    }))
}

/// OpenAPI documentation for the auth endpoints
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(login),
    components(schemas(LoginRequest, LoginResponse)),
    tags((name = "auth", description = "Session token issuance"))
)]
pub struct AuthApiDoc;
