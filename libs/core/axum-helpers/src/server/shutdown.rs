use tokio::signal;
use tracing::info;

/// Wait for a shutdown signal (SIGINT or SIGTERM).
///
/// For use with `axum::serve(...).with_graceful_shutdown(shutdown_signal())`.
/// In-flight requests are given time to complete; connection cleanup is the
/// caller's responsibility after serve returns.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully");
        },
    }
}
