//! CLI argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::config::{
    BATCH_APP_NAME, BATCH_DATE_FORMAT, DEFAULT_CONFIG_DIR, DEFAULT_SERVER_ENV, SERVER_APP_NAME,
};

/// Author API - HTTP service and batch runner over PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "author-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Environment name selecting `config.<env>.yaml`
    #[arg(short, long, global = true, env = "APP_ENV")]
    pub env: Option<String>,

    /// Directory holding the YAML config files
    #[arg(long, global = true, env = "CONFIG_DIR", default_value = DEFAULT_CONFIG_DIR)]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Run the batch job
    Batch(BatchArgs),

    /// Run database migrations
    Migrate(MigrateArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    /// Host to bind to (overrides config)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the batch command
#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// Business date in yyyyMMdd form
    #[arg(short, long, value_parser = parse_batch_date)]
    pub date: Option<NaiveDate>,
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset and re-run all migrations
    Fresh,
}

fn parse_batch_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, BATCH_DATE_FORMAT)
        .map_err(|e| format!("expected yyyyMMdd, got {value:?}: {e}"))
}

impl Cli {
    /// Environment used to pick the config file.
    ///
    /// `serve` and `migrate` fall back to `dev`; `batch` reads `config.yaml`
    /// when no environment is given.
    pub fn environment(&self) -> Option<String> {
        match (&self.env, &self.command) {
            (Some(env), _) if !env.trim().is_empty() => Some(env.clone()),
            (_, Commands::Batch(_)) => None,
            _ => Some(DEFAULT_SERVER_ENV.to_string()),
        }
    }

    /// Application name used for the log directory.
    pub fn app_name(&self) -> &'static str {
        match self.command {
            Commands::Batch(_) => BATCH_APP_NAME,
            _ => SERVER_APP_NAME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults_to_dev_environment() {
        let cli = Cli::try_parse_from(["author-api", "serve"]).unwrap();
        assert_eq!(cli.environment().as_deref(), Some("dev"));
        assert_eq!(cli.app_name(), SERVER_APP_NAME);
    }

    #[test]
    fn batch_without_env_uses_plain_config() {
        let cli = Cli::try_parse_from(["author-api", "batch", "--date", "20240131"]).unwrap();
        assert_eq!(cli.environment(), None);
        assert_eq!(cli.app_name(), BATCH_APP_NAME);
        match cli.command {
            Commands::Batch(args) => {
                assert_eq!(args.date, NaiveDate::from_ymd_opt(2024, 1, 31));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn explicit_env_wins() {
        let cli = Cli::try_parse_from(["author-api", "-e", "prod", "batch"]).unwrap();
        assert_eq!(cli.environment().as_deref(), Some("prod"));
    }

    #[test]
    fn malformed_batch_date_is_rejected() {
        assert!(Cli::try_parse_from(["author-api", "batch", "--date", "2024-01-31"]).is_err());
    }

    #[test]
    fn serve_overrides_parse() {
        let cli =
            Cli::try_parse_from(["author-api", "serve", "-H", "127.0.0.1", "-p", "9000"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.host.as_deref(), Some("127.0.0.1"));
                assert_eq!(args.port, Some(9000));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
