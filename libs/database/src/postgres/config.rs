use core_config::{env_or_default, env_required, ConfigError, FromEnv};
use sea_orm::ConnectOptions;
use std::time::Duration;
use tracing::log::LevelFilter;

/// PostgreSQL connection pool configuration.
///
/// Construct manually with [`PostgresConfig::new`] or load from the
/// environment with [`FromEnv::from_env`].
#[derive(Clone, Debug)]
pub struct PostgresConfig {
    /// Database connection URL (required)
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Connection acquire timeout in seconds
    pub acquire_timeout_secs: u64,

    /// Connection idle timeout in seconds
    pub idle_timeout_secs: u64,

    /// Enable SQL query logging
    pub sqlx_logging: bool,
}

impl PostgresConfig {
    /// Create a config with default pool settings for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 20,
            min_connections: 2,
            connect_timeout_secs: 8,
            acquire_timeout_secs: 8,
            idle_timeout_secs: 8,
            sqlx_logging: true,
        }
    }

    /// Convert this config into SeaORM `ConnectOptions`.
    pub fn into_connect_options(self) -> ConnectOptions {
        let mut opt = ConnectOptions::new(&self.url);
        opt.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .sqlx_logging(self.sqlx_logging)
            .sqlx_logging_level(LevelFilter::Debug);
        opt
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    env_or_default(key, default)
        .parse()
        .map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: format!("{}", e),
        })
}

/// Environment variables:
/// - `DATABASE_URL` (required)
/// - `DB_MAX_CONNECTIONS` (default: 20)
/// - `DB_MIN_CONNECTIONS` (default: 2)
/// - `DB_CONNECT_TIMEOUT_SECS` (default: 8)
/// - `DB_ACQUIRE_TIMEOUT_SECS` (default: 8)
/// - `DB_IDLE_TIMEOUT_SECS` (default: 8)
/// - `DB_SQLX_LOGGING` (default: true)
impl FromEnv for PostgresConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_required("DATABASE_URL")?,
            max_connections: parsed_env("DB_MAX_CONNECTIONS", "20")?,
            min_connections: parsed_env("DB_MIN_CONNECTIONS", "2")?,
            connect_timeout_secs: parsed_env("DB_CONNECT_TIMEOUT_SECS", "8")?,
            acquire_timeout_secs: parsed_env("DB_ACQUIRE_TIMEOUT_SECS", "8")?,
            idle_timeout_secs: parsed_env("DB_IDLE_TIMEOUT_SECS", "8")?,
            sqlx_logging: parsed_env("DB_SQLX_LOGGING", "true")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let config = PostgresConfig::new("postgresql://localhost/accounts");
        assert_eq!(config.url, "postgresql://localhost/accounts");
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 2);
    }

    #[test]
    fn test_from_env_minimal() {
        temp_env::with_var("DATABASE_URL", Some("postgresql://localhost/accounts"), || {
            let config = PostgresConfig::from_env().unwrap();
            assert_eq!(config.url, "postgresql://localhost/accounts");
            assert_eq!(config.max_connections, 20);
        });
    }

    #[test]
    fn test_from_env_custom_pool() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/accounts")),
                ("DB_MAX_CONNECTIONS", Some("50")),
                ("DB_MIN_CONNECTIONS", Some("10")),
            ],
            || {
                let config = PostgresConfig::from_env().unwrap();
                assert_eq!(config.max_connections, 50);
                assert_eq!(config.min_connections, 10);
            },
        );
    }

    #[test]
    fn test_from_env_missing_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            let result = PostgresConfig::from_env();
            assert!(result.is_err());
            assert!(result.unwrap_err().to_string().contains("DATABASE_URL"));
        });
    }

    #[test]
    fn test_from_env_invalid_number() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/accounts")),
                ("DB_MAX_CONNECTIONS", Some("many")),
            ],
            || {
                let result = PostgresConfig::from_env();
                assert!(result.is_err());
                assert!(result
                    .unwrap_err()
                    .to_string()
                    .contains("DB_MAX_CONNECTIONS"));
            },
        );
    }
}
