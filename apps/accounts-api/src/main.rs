use axum_helpers::server::{create_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
pub use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for readable error reports
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    init_tracing(&config.environment);

    // Connect with retry so a database that is still starting up does not
    // kill the service
    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    database::postgres::run_migrations::<migration::Migrator>(&db, "accounts_api")
        .await
        .map_err(|e| eyre::eyre!("Migrations failed: {}", e))?;

    let state = AppState { config, db };

    // Build router with API routes (state reference only; domains apply
    // their own state internally)
    let api_routes = api::routes(&state);

    // create_router adds docs/middleware to our composed routes
    let router = create_router::<openapi::ApiDoc>(api_routes).await?;

    // Merge health endpoints into the app
    // - /health: liveness check with app name/version
    // - /ready: readiness check with an actual database health check
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    info!("Starting accounts API");

    create_app(app, &state.config.server).await?;

    info!("Shutting down: closing database connection");
    match state.db.close().await {
        Ok(_) => info!("PostgreSQL connection closed successfully"),
        Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
    }

    Ok(())
}
