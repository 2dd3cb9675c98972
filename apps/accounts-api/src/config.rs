use core_config::{app_info, server::ServerConfig, AppInfo, FromEnv};
use database::postgres::PostgresConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application configuration, composed from the shared config components.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub database: PostgresConfig,
    pub server: ServerConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let database = PostgresConfig::from_env()?; // Required - fails if DATABASE_URL is unset
        let server = ServerConfig::from_env()?; // Defaults: HOST=0.0.0.0, PORT=3000

        Ok(Self {
            app: app_info!(),
            database,
            server,
            environment,
        })
    }
}
