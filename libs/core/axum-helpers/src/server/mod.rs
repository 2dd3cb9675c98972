//! Server infrastructure module.
//!
//! - Router assembly with OpenAPI documentation and common middleware
//! - Health and readiness endpoints
//! - Graceful shutdown on SIGINT/SIGTERM

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_app, create_router};
pub use health::{health_router, run_health_checks, HealthCheckFuture, HealthResponse};
pub use shutdown::shutdown_signal;
