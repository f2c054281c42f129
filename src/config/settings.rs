//! Application settings loaded from a YAML file selected by environment name.
//!
//! `config/config.<env>.yaml` is read when an environment is given, otherwise
//! `config/config.yaml`. Environment variables (and a `.env` file) override
//! individual values after the file is parsed.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::constants::{
    CONFIG_FILE_EXTENSION, CONFIG_FILE_STEM, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_DATABASE_HOST,
    DEFAULT_DATABASE_PORT, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_LOG_PATH,
    DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_CONNECT_ATTEMPTS, DEFAULT_MIN_CONNECTIONS,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_SSL_MODE, SERVER_APP_NAME,
};

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {key}: {value:?}")]
    InvalidOverride { key: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub log: LogConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: SERVER_APP_NAME.to_string(),
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

/// Database connection settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub dbname: String,
    password: String,
    /// PostgreSQL SSL mode; empty means `disable`
    pub sslmode: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub retry: RetryConfig,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("dbname", &self.dbname)
            .field("password", &"[REDACTED]")
            .field("sslmode", &self.sslmode)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DATABASE_HOST.to_string(),
            port: DEFAULT_DATABASE_PORT,
            user: String::new(),
            dbname: String::new(),
            password: String::new(),
            sslmode: DEFAULT_SSL_MODE.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            retry: RetryConfig::default(),
        }
    }
}

impl DatabaseConfig {
    /// Get the database password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Replace the database password.
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }
}

/// Startup connection retry settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_CONNECT_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Root directory for daily log files
    pub path: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_LOG_PATH.to_string(),
        }
    }
}

impl Config {
    /// Load configuration for `env` from `dir`, then apply environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file is missing or malformed, or if an
    /// override or the resulting configuration is invalid.
    pub fn load(dir: impl AsRef<Path>, env: Option<&str>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = Self::from_file(Self::file_path(dir, env))?;
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;

        tracing::debug!("Configuration loaded");
        Ok(config)
    }

    /// Parse a single YAML configuration file without overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the configuration file for an environment name.
    ///
    /// `None` and `Some("")` both select `config.yaml`.
    pub fn file_path(dir: impl AsRef<Path>, env: Option<&str>) -> PathBuf {
        let file_name = match env.filter(|e| !e.is_empty()) {
            Some(env) => format!("{CONFIG_FILE_STEM}.{env}.{CONFIG_FILE_EXTENSION}"),
            None => format!("{CONFIG_FILE_STEM}.{CONFIG_FILE_EXTENSION}"),
        };
        dir.as_ref().join(file_name)
    }

    /// Apply overrides from a variable lookup (the process environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DATABASE_HOST") {
            self.database.host = v;
        }
        if let Some(v) = lookup("DATABASE_PORT") {
            self.database.port = parse_override("DATABASE_PORT", v)?;
        }
        if let Some(v) = lookup("DATABASE_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("DATABASE_NAME") {
            self.database.dbname = v;
        }
        if let Some(v) = lookup("DATABASE_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DATABASE_SSLMODE") {
            self.database.sslmode = v;
        }
        if let Some(v) = lookup("SERVER_HOST") {
            self.app.host = v;
        }
        if let Some(v) = lookup("SERVER_PORT") {
            self.app.port = parse_override("SERVER_PORT", v)?;
        }
        if let Some(v) = lookup("LOG_PATH") {
            self.log.path = v;
        }
        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "database.retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Invalid(
                "database.max_connections must not be below database.min_connections".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

fn parse_override<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidOverride { key, value })
}
