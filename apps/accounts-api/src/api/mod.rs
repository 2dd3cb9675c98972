use axum::Router;

pub mod health;
pub mod users;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix is added by the `create_router` helper.
///
/// Domain routers apply their own state, so the returned router is stateless;
/// only cheap pool-handle clones flow into the domains.
pub fn routes(state: &crate::state::AppState) -> Router {
    Router::new()
        .nest("/auth", users::auth_router(state))
        .nest("/users", users::router(state))
}

/// Router with the /ready endpoint that performs an actual database check.
pub fn ready_router(state: crate::state::AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
