use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(schemas(axum_helpers::ErrorResponse)),
    info(
        title = "Accounts API",
        version = "0.1.0",
        description = "User account management: registration, bulk import, session-aware search, update and soft delete"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/users", api = domain_users::handlers::ApiDoc),
        (path = "/auth", api = domain_users::auth::AuthApiDoc)
    )
)]
pub struct ApiDoc;
