use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};
use tracing::debug;

use crate::common::DatabaseError;

/// Check PostgreSQL health by executing `SELECT 1`.
///
/// Intended for readiness and liveness probes.
///
/// # Example
/// ```ignore
/// match check_health(&db).await {
///     Ok(()) => { /* ready */ }
///     Err(e) => tracing::error!("database unhealthy: {}", e),
/// }
/// ```
pub async fn check_health(db: &DatabaseConnection) -> Result<(), DatabaseError> {
    debug!("Running PostgreSQL health check");

    let stmt = Statement::from_string(DatabaseBackend::Postgres, "SELECT 1".to_owned());
    db.query_one_raw(stmt).await.map_err(|e| {
        DatabaseError::HealthCheckFailed(format!("PostgreSQL health check failed: {}", e))
    })?;

    debug!("PostgreSQL health check passed");
    Ok(())
}
