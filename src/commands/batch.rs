//! Batch command - Verifies database access for a business date.

use super::shutdown_signal;
use crate::cli::BatchArgs;
use crate::config::{Config, BATCH_DATE_FORMAT};
use crate::errors::AppResult;
use crate::infra::Database;

/// Execute the batch command
pub async fn execute(args: BatchArgs, config: Config) -> AppResult<()> {
    match args.date {
        Some(date) => tracing::info!(date = %date.format(BATCH_DATE_FORMAT), "Batch started"),
        None => tracing::info!("Batch started without a date"),
    }

    let db = match Database::connect_until(&config.database, shutdown_signal()).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Fail to connect database at '{}'", config.database.host);
            return Err(e.into());
        }
    };

    db.close().await?;
    tracing::info!("Batch finished");
    Ok(())
}
