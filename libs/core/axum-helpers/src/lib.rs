//! # Axum Helpers
//!
//! Utilities, middleware, and helpers shared by the Axum applications in this
//! workspace.
//!
//! ## Modules
//!
//! - **[`errors`]**: structured error responses (`AppError`, `ErrorResponse`)
//! - **[`extractors`]**: custom extractors (numeric path id, validated JSON)
//! - **[`http`]**: HTTP middleware (security headers)
//! - **[`server`]**: router assembly, health endpoints, graceful shutdown
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{create_app, create_router, health_router};
//! use core_config::{app_info, server::ServerConfig};
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api_routes = Router::new(); // Add your routes
//!     let router = create_router::<ApiDoc>(api_routes).await?;
//!     let app = router.merge(health_router(app_info!()));
//!
//!     create_app(app, &ServerConfig::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

// Re-export error types
pub use errors::{AppError, ErrorResponse};

// Re-export extractors
pub use extractors::{IdPath, ValidatedJson};

// Re-export HTTP middleware
pub use http::security_headers;

// Re-export server types
pub use server::{
    create_app, create_router, health_router, run_health_checks, shutdown_signal,
    HealthCheckFuture, HealthResponse,
};
