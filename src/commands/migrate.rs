//! Migrate command - Database migration management.

use crate::cli::{MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::Database;

/// Execute the migrate command
pub async fn execute(args: MigrateArgs, config: Config) -> AppResult<()> {
    let db = Database::connect(&config.database).await?;

    match args.action {
        MigrateAction::Up => {
            tracing::info!("Running pending migrations...");
            db.run_migrations().await?;
            tracing::info!("Migrations completed");
        }
        MigrateAction::Down => {
            tracing::info!("Rolling back last migration...");
            db.rollback_migration().await?;
            tracing::info!("Rollback completed");
        }
        MigrateAction::Status => {
            for (name, applied) in db.migration_status().await? {
                println!("{}: {}", name, if applied { "applied" } else { "pending" });
            }
        }
        MigrateAction::Fresh => {
            tracing::warn!("Dropping all tables and re-running migrations...");
            db.fresh_migrations().await?;
            tracing::info!("Fresh migrations completed");
        }
    }

    db.close().await?;
    Ok(())
}
