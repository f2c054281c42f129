//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `serve` - Start the HTTP server
//! - `batch` - Run the batch job
//! - `migrate` - Database migrations

pub mod args;

pub use args::{BatchArgs, Cli, Commands, MigrateAction, MigrateArgs, ServeArgs};
