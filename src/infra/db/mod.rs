//! Database connection and initialization.

use std::future::Future;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;

use crate::config::{DatabaseConfig, LIVENESS_PROBE_SQL};

mod connector;
mod error;
pub mod migrations;
mod params;
mod postgres;

pub use connector::{
    AttemptLog, AttemptOutcome, AttemptRecord, Connector, ConnectorState, Datastore, RetryPolicy,
    TracingAttemptLog,
};
pub use error::{AttemptError, AttemptStage, ConnectError};
pub use migrations::Migrator;
pub use params::{ConnectionParameters, SslMode};
pub use postgres::PostgresStore;

/// Liveness check used by the health endpoint.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), DbErr>;
}

/// Database wrapper for connection management
#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Connect with retry and backoff, blocking startup until connected or exhausted.
    ///
    /// # Errors
    /// Returns an error if the parameters are invalid or every attempt failed.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ConnectError> {
        Self::connect_until(config, std::future::pending()).await
    }

    /// Connect with retry and backoff, giving up when `shutdown` resolves.
    ///
    /// # Errors
    /// Returns [`ConnectError::Cancelled`] if `shutdown` completes first.
    pub async fn connect_until<S>(config: &DatabaseConfig, shutdown: S) -> Result<Self, ConnectError>
    where
        S: Future<Output = ()>,
    {
        let params = ConnectionParameters::try_from(config)?;
        let connector = Connector::new(PostgresStore::from_config(config))
            .with_policy(RetryPolicy::from(&config.retry));

        let connection = connector.connect_until(&params, shutdown).await?;
        Ok(Self { connection })
    }

    #[cfg(test)]
    pub(crate) fn from_connection(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    /// Get a reference to the database connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// Get a clone of the database connection.
    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    /// Run pending migrations.
    pub async fn run_migrations(&self) -> Result<(), DbErr> {
        Migrator::up(&self.connection, None).await
    }

    /// Rollback the last migration.
    pub async fn rollback_migration(&self) -> Result<(), DbErr> {
        Migrator::down(&self.connection, Some(1)).await
    }

    /// Get migration status (list all migrations with applied status).
    pub async fn migration_status(&self) -> Result<Vec<(String, bool)>, DbErr> {
        use sea_orm::{EntityTrait, QueryOrder};
        use sea_orm_migration::seaql_migrations;

        let applied: std::collections::HashSet<String> = seaql_migrations::Entity::find()
            .order_by_asc(seaql_migrations::Column::Version)
            .all(&self.connection)
            .await?
            .into_iter()
            .map(|m| m.version)
            .collect();

        let migrations: Vec<(String, bool)> = Migrator::migrations()
            .iter()
            .map(|m| {
                let name = m.name().to_string();
                let is_applied = applied.contains(&name);
                (name, is_applied)
            })
            .collect();

        Ok(migrations)
    }

    /// Reset database and run all migrations fresh.
    pub async fn fresh_migrations(&self) -> Result<(), DbErr> {
        Migrator::fresh(&self.connection).await
    }

    /// Release the handle. Ends its lifecycle.
    pub async fn close(self) -> Result<(), DbErr> {
        self.connection.close().await
    }
}

#[async_trait]
impl HealthCheck for Database {
    async fn ping(&self) -> Result<(), DbErr> {
        self.connection
            .execute(Statement::from_string(
                self.connection.get_database_backend(),
                LIVENESS_PROBE_SQL.to_string(),
            ))
            .await?;
        Ok(())
    }
}
