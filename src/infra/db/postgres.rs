//! PostgreSQL datastore used by the startup connector.

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::sqlx::postgres::{PgConnection, PgPoolOptions};
use sea_orm::sqlx::Connection;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, RuntimeErr, SqlxPostgresConnector, Statement,
};

use super::connector::Datastore;
use super::params::ConnectionParameters;
use crate::config::{DatabaseConfig, LIVENESS_PROBE_SQL};

/// Opens pooled SeaORM connections over sqlx.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    max_connections: u32,
    min_connections: u32,
    connect_timeout: Duration,
}

impl PostgresStore {
    pub fn new(max_connections: u32, min_connections: u32, connect_timeout: Duration) -> Self {
        Self {
            max_connections,
            min_connections,
            connect_timeout,
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(
            config.max_connections,
            config.min_connections,
            Duration::from_secs(config.connect_timeout_secs),
        )
    }
}

#[async_trait]
impl Datastore for PostgresStore {
    type Handle = DatabaseConnection;

    /// One driver connection attempt, so the caller sees the real failure.
    /// The pool handed back is lazy and opens its own connections on demand.
    async fn open(&self, params: &ConnectionParameters) -> Result<DatabaseConnection, DbErr> {
        let options = params.pg_options();

        let conn = tokio::time::timeout(self.connect_timeout, PgConnection::connect_with(&options))
            .await
            .map_err(|_| {
                DbErr::Conn(RuntimeErr::Internal(format!(
                    "connection timed out after {}ms",
                    self.connect_timeout.as_millis()
                )))
            })?
            .map_err(|e| DbErr::Conn(RuntimeErr::Internal(e.to_string())))?;

        if let Err(e) = conn.close().await {
            tracing::debug!("Failed to close connect check: {}", e);
        }

        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.connect_timeout)
            .connect_lazy_with(options);

        Ok(SqlxPostgresConnector::from_sqlx_postgres_pool(pool))
    }

    async fn probe(&self, handle: &DatabaseConnection) -> Result<(), DbErr> {
        handle
            .execute(Statement::from_string(
                handle.get_database_backend(),
                LIVENESS_PROBE_SQL.to_string(),
            ))
            .await?;
        Ok(())
    }

    async fn release(&self, handle: DatabaseConnection) {
        if let Err(e) = handle.close().await {
            tracing::warn!("Failed to close unverified connection: {}", e);
        }
    }
}
