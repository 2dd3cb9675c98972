use axum::Router;
use domain_users::{auth, handlers, PgUserRepository, UserService};

fn service(state: &crate::AppState) -> UserService<PgUserRepository> {
    UserService::new(PgUserRepository::new(state.db.clone()))
}

/// User CRUD routes, mounted at /api/users
pub fn router(state: &crate::AppState) -> Router {
    handlers::router(service(state))
}

/// Login route, mounted at /api/auth
pub fn auth_router(state: &crate::AppState) -> Router {
    auth::router(service(state))
}
