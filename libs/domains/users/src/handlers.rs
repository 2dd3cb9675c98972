use axum::{
    extract::{Query, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use axum_helpers::{errors::ErrorResponse, IdPath, ValidatedJson};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::auth;
use crate::error::UserResult;
use crate::models::{
    BulkCreateSummary, CreateUser, FindUsersQuery, FoundUser, MessageResponse, NewUser,
    SessionExpiration, SessionResponse, UpdateUser, UserResponse, UserWithSessions,
};
use crate::repository::UserRepository;
use crate::service::UserService;

/// OpenAPI documentation for the user endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        get_all_users,
        find_users,
        bulk_create_users,
        create_user,
        get_user,
        update_user,
        delete_user,
    ),
    components(
        schemas(
            UserResponse,
            SessionResponse,
            SessionExpiration,
            UserWithSessions,
            FoundUser,
            CreateUser,
            NewUser,
            UpdateUser,
            BulkCreateSummary,
            MessageResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "users", description = "User account management endpoints")
    )
)]
pub struct ApiDoc;

/// Create the users router with all HTTP endpoints.
///
/// Middleware chains per route group, innermost first:
/// - listing/bulk routes: token validation
/// - `/{id}` routes: permission check, token validation, id-exists check
///   (whose `IdPath` extraction is also the numeric-format check)
/// - `/create` is deliberately open for self-registration
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    let listing_routes = Router::new()
        .route("/getAllUsers", get(get_all_users::<R>))
        .route("/findUsers", get(find_users::<R>))
        .route("/bulkCreate", post(bulk_create_users::<R>))
        .route_layer(middleware::from_fn_with_state(
            shared_service.clone(),
            auth::require_session::<R>,
        ));

    let by_id_routes = Router::new()
        .route(
            "/{id}",
            get(get_user::<R>)
                .put(update_user::<R>)
                .delete(delete_user::<R>),
        )
        // The layer added last runs first: id-exists (and numeric check),
        // then token validation, then the permission check
        .route_layer(middleware::from_fn(auth::require_permission))
        .route_layer(middleware::from_fn_with_state(
            shared_service.clone(),
            auth::require_session::<R>,
        ))
        .route_layer(middleware::from_fn_with_state(
            shared_service.clone(),
            auth::require_user_exists::<R>,
        ));

    Router::new()
        .route("/create", post(create_user::<R>))
        .merge(listing_routes)
        .merge(by_id_routes)
        .with_state(shared_service)
}

/// List all active users with their sessions
///
/// GET /users/getAllUsers
#[utoipa::path(
    get,
    path = "/getAllUsers",
    tag = "users",
    responses(
        (status = 200, description = "Active users with their sessions", body = Vec<UserWithSessions>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Repository failure", body = ErrorResponse)
    )
)]
async fn get_all_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
) -> UserResult<Json<Vec<UserWithSessions>>> {
    let users = service.list_active_users().await?;
    Ok(Json(users))
}

/// Search users by status, name and session-expiration bounds
///
/// GET /users/findUsers?deleted=false&name=ada&loggedInbefore=2025-06-01T00:00:00Z
#[utoipa::path(
    get,
    path = "/findUsers",
    tag = "users",
    params(FindUsersQuery),
    responses(
        (status = 200, description = "Matching users with their in-window sessions", body = Vec<FoundUser>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Repository failure", body = ErrorResponse)
    )
)]
async fn find_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Query(filters): Query<FindUsersQuery>,
) -> UserResult<Json<Vec<FoundUser>>> {
    let users = service.find_users(filters).await?;
    Ok(Json(users))
}

/// Create users in bulk; per-candidate failures are reported as data
///
/// POST /users/bulkCreate
#[utoipa::path(
    post,
    path = "/bulkCreate",
    tag = "users",
    request_body = Vec<NewUser>,
    responses(
        (status = 200, description = "Batch outcome", body = BulkCreateSummary),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Batch machinery failure", body = ErrorResponse)
    )
)]
async fn bulk_create_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Json(candidates): Json<Vec<NewUser>>,
) -> UserResult<Json<BulkCreateSummary>> {
    let summary = service.bulk_create_users(candidates).await?;
    Ok(Json(summary))
}

/// Self-registration; the only mutating endpoint reachable without a token
///
/// POST /users/create
#[utoipa::path(
    post,
    path = "/create",
    tag = "users",
    request_body = CreateUser,
    responses(
        (status = 200, description = "User created", body = MessageResponse),
        (status = 400, description = "Password mismatch or duplicate email", body = ErrorResponse),
        (status = 500, description = "Repository failure", body = ErrorResponse)
    )
)]
async fn create_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<Json<MessageResponse>> {
    let user = service.create_user(input).await?;

    Ok(Json(MessageResponse {
        message: format!("User created successfully with ID: {}", user.id),
    }))
}

/// Get one active user by id
///
/// GET /users/{id}
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user, or null when soft-deleted", body = Option<UserResponse>),
        (status = 400, description = "Non-numeric id", body = ErrorResponse),
        (status = 404, description = "No row with that id", body = ErrorResponse),
        (status = 403, description = "Not the caller's own id", body = ErrorResponse)
    )
)]
async fn get_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    IdPath(id): IdPath,
) -> UserResult<Json<Option<UserResponse>>> {
    let user = service.get_user(id).await?;
    Ok(Json(user))
}

/// Update name/password/cellphone; omitted fields keep their current value
///
/// PUT /users/{id}
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = MessageResponse),
        (status = 400, description = "Non-numeric id", body = ErrorResponse),
        (status = 404, description = "No row with that id", body = ErrorResponse),
        (status = 403, description = "Not the caller's own id", body = ErrorResponse)
    )
)]
async fn update_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateUser>,
) -> UserResult<Json<MessageResponse>> {
    service.update_user(id, input).await?;

    Ok(Json(MessageResponse {
        message: "User updated successfully".to_string(),
    }))
}

/// Soft-delete a user; the row is kept with status=false
///
/// DELETE /users/{id}
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User soft-deleted", body = MessageResponse),
        (status = 400, description = "Non-numeric id", body = ErrorResponse),
        (status = 404, description = "No row with that id", body = ErrorResponse),
        (status = 403, description = "Not the caller's own id", body = ErrorResponse)
    )
)]
async fn delete_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    IdPath(id): IdPath,
) -> UserResult<Json<MessageResponse>> {
    service.delete_user(id).await?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
