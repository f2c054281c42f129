//! Commands module - CLI command implementations.

pub mod batch;
pub mod migrate;
pub mod serve;

/// Resolves on Ctrl+C. A handler that cannot be installed never resolves.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
