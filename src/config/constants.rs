//! Application-wide constants
//!
//! Centralized location for magic values to improve maintainability.

// =============================================================================
// Application
// =============================================================================

/// Name used for the HTTP server's log directory
pub const SERVER_APP_NAME: &str = "author-api";

/// Name used for the batch job's log directory
pub const BATCH_APP_NAME: &str = "batch1";

/// Environment selected by `serve` when `--env` is not given
pub const DEFAULT_SERVER_ENV: &str = "dev";

/// Label logged when no environment is selected
pub const FALLBACK_ENV_LABEL: &str = "default";

// =============================================================================
// Configuration files
// =============================================================================

/// Directory searched for `config.<env>.yaml`
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Base name of configuration files
pub const CONFIG_FILE_STEM: &str = "config";

/// Extension of configuration files
pub const CONFIG_FILE_EXTENSION: &str = "yaml";

// =============================================================================
// Server Configuration
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

// =============================================================================
// Database
// =============================================================================

/// Default database host
pub const DEFAULT_DATABASE_HOST: &str = "localhost";

/// Default database port
pub const DEFAULT_DATABASE_PORT: u16 = 5432;

/// SSL mode used when the configuration leaves it empty
pub const DEFAULT_SSL_MODE: &str = "disable";

/// Upper bound on pooled connections behind the handle
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Connections kept open while idle
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;

/// Per-attempt timeout for opening a connection, in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Statement used as the liveness probe
pub const LIVENESS_PROBE_SQL: &str = "SELECT 1";

// =============================================================================
// Connection retry
// =============================================================================

/// Connection attempts made before startup fails
pub const DEFAULT_MAX_CONNECT_ATTEMPTS: u32 = 5;

/// Wait after the first failed attempt, in milliseconds (doubles per failure)
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1_000;

/// Factor applied to the backoff after each failed attempt
pub const BACKOFF_MULTIPLIER: u32 = 2;

// =============================================================================
// Logging
// =============================================================================

/// Default root directory for log files
pub const DEFAULT_LOG_PATH: &str = "logs";

/// Log files are named `<prefix>.<yyyy-mm-dd>.<suffix>`
pub const LOG_FILE_PREFIX: &str = "log";

pub const LOG_FILE_SUFFIX: &str = "log";

/// Rotated daily files kept per application
pub const LOG_MAX_FILES: usize = 3;

// =============================================================================
// Batch
// =============================================================================

/// Format of the batch `--date` argument
pub const BATCH_DATE_FORMAT: &str = "%Y%m%d";
