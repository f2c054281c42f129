//! Author API - Application entry point
//!
//! CLI-based entry point that dispatches to the serve, batch, and migrate commands.

use clap::Parser;

use author_api::{
    cli::{Cli, Commands},
    commands,
    config::{Config, FALLBACK_ENV_LABEL},
    logging::{self, LogFile},
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let env = cli.environment();

    let config = match Config::load(&cli.config_dir, env.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            // No log path is known yet, so report on the console only
            if logging::init(cli.verbose, None).is_ok() {
                tracing::error!("Failed to load configuration: {}", e);
            } else {
                eprintln!("Failed to load configuration: {}", e);
            }
            std::process::exit(1);
        }
    };

    let log_file = LogFile::new(&config.log.path, cli.app_name());
    let log_guard = match logging::init(cli.verbose, Some(&log_file)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        app = cli.app_name(),
        env = env.as_deref().unwrap_or(FALLBACK_ENV_LABEL),
        "Configuration loaded"
    );
    tracing::info!(?config, "Effective configuration");

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, config).await,
        Commands::Batch(args) => commands::batch::execute(args, config).await,
        Commands::Migrate(args) => commands::migrate::execute(args, config).await,
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {}", e);
        // process::exit skips destructors; flush the file writer first
        drop(log_guard);
        std::process::exit(1);
    }
}
