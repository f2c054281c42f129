//! Author API - Author records over PostgreSQL
//!
//! An HTTP service and a batch runner sharing one startup database
//! connector that retries with exponential backoff.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: YAML configuration and constants
//! - **domain**: Core entities
//! - **services**: Application use cases
//! - **infra**: Database connector, migrations, repositories
//! - **api**: HTTP handlers, extractors, and routes
//! - **logging**: Tracing subscriber setup
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server with config/config.dev.yaml
//! cargo run -- serve
//!
//! # Run the batch job with config/config.yaml
//! cargo run -- batch --date 20240131
//!
//! # Run migrations against config/config.prod.yaml
//! cargo run -- -e prod migrate up
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod logging;
pub mod services;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::Author;
pub use errors::{AppError, AppResult};
pub use infra::Database;
