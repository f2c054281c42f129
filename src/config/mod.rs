//! Application configuration module
//!
//! Handles YAML configuration files, environment overrides and
//! application-wide constants.

mod constants;
mod settings;

pub use constants::*;
pub use settings::{
    AppConfig, Config, ConfigError, DatabaseConfig, LogConfig, RetryConfig,
};
