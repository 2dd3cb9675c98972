//! Readiness handler with a real database check.

use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_helpers::server::{run_health_checks, HealthCheckFuture};

/// Readiness endpoint: verifies the database connection is usable.
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "database",
        Box::pin(async {
            database::postgres::check_health(&state.db)
                .await
                .map_err(|e| e.to_string())
        }),
    )];

    match run_health_checks(checks).await {
        Ok((status, json)) => (status, json).into_response(),
        Err((status, json)) => (status, json).into_response(),
    }
}
