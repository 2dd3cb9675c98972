//! PostgreSQL connectivity for the accounts service.
//!
//! Provides connection management on top of SeaORM: pool configuration loaded
//! from the environment, connection with retry/backoff for transient startup
//! failures, migration running, and health checks for readiness probes.
//!
//! # Example
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::postgres::{self, PostgresConfig};
//!
//! let config = PostgresConfig::from_env()?;
//! let db = postgres::connect_from_config_with_retry(config, None).await?;
//! postgres::run_migrations::<migration::Migrator>(&db, "accounts_api").await?;
//! ```

pub mod common;
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult};
