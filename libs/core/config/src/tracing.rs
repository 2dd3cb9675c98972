use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install color-eyre with the project-standard configuration.
///
/// Call this early in main(), before any fallible operation, so error reports
/// carry file/line locations. Safe to call multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Initialize tracing with environment-aware output.
///
/// - **Production** (`APP_ENV=production`): JSON format for log aggregation,
///   module targets hidden.
/// - **Development** (default): pretty-printed, human-readable output.
///
/// Both modes install `tracing_error::ErrorLayer` so span traces are captured
/// when errors propagate. `RUST_LOG` overrides the default level filter.
///
/// Safe to call multiple times; re-initialization is silently skipped (common
/// in tests).
pub fn init_tracing(environment: &Environment) {
    let is_production = environment.is_production();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if is_production {
            EnvFilter::new("info,sea_orm=warn,sqlx=warn")
        } else {
            EnvFilter::new("debug,sqlx=info")
        }
    });

    let result = if is_production {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(false).pretty())
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => {
            info!("Tracing initialized. Environment: {:?}", environment);
        }
        Err(_) => {
            debug!("Tracing already initialized, skipping re-initialization");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_development() {
        init_tracing(&Environment::Development);
    }

    #[test]
    fn test_init_tracing_multiple_calls() {
        // Second call must not panic
        init_tracing(&Environment::Development);
        init_tracing(&Environment::Production);
    }

    #[test]
    fn test_init_tracing_with_rust_log_env() {
        temp_env::with_var("RUST_LOG", Some("trace"), || {
            init_tracing(&Environment::Development);
        });
    }
}
