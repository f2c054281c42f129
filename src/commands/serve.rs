//! Serve command - Starts the HTTP server.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

use super::shutdown_signal;
use crate::api::{create_router, AppState};
use crate::cli::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;

/// Execute the serve command
pub async fn execute(args: ServeArgs, mut config: Config) -> AppResult<()> {
    if let Some(host) = args.host {
        config.app.host = host;
    }
    if let Some(port) = args.port {
        config.app.port = port;
    }

    tracing::info!("Starting server...");

    // Blocks until the database answers, the policy gives up, or Ctrl+C
    let db = Database::connect_until(&config.database, shutdown_signal()).await?;
    tracing::info!("Database connected");

    db.run_migrations().await?;

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    run(listener, Arc::new(db), shutdown_signal()).await
}

/// Serve until `shutdown` resolves, then close the database handle.
pub async fn run<S>(listener: TcpListener, db: Arc<Database>, shutdown: S) -> AppResult<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let app = create_router(AppState::from_database(db.clone()));

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)));

    // Repositories hold clones of the same pool; closing one closes it for all
    Database::clone(&db).close().await?;
    tracing::info!("Server stopped");

    served
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
    use sea_orm::SqlxPostgresConnector;

    #[tokio::test]
    async fn run_closes_database_after_shutdown() {
        let pool = PgPoolOptions::new()
            .connect_lazy_with(PgConnectOptions::new().host("127.0.0.1").port(1));
        let db = Database::from_connection(SqlxPostgresConnector::from_sqlx_postgres_pool(
            pool.clone(),
        ));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        run(listener, Arc::new(db), async {}).await.unwrap();

        assert!(pool.is_closed());
    }
}
