//! Tracing subscriber setup: console output plus an optional rotating JSON file.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LOG_FILE_PREFIX, LOG_FILE_SUFFIX, LOG_MAX_FILES};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("failed to create log file appender: {0}")]
    Appender(#[from] InitError),

    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// File sink for one application: `<dir>/<app>/log.<yyyy-mm-dd>.log`,
/// rotated daily with the oldest files pruned.
#[derive(Debug, Clone)]
pub struct LogFile {
    pub dir: PathBuf,
    pub app: String,
}

impl LogFile {
    pub fn new(dir: impl Into<PathBuf>, app: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            app: app.into(),
        }
    }

    pub fn directory(&self) -> PathBuf {
        self.dir.join(&self.app)
    }

    /// File written on the given (UTC) day.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.directory().join(format!(
            "{LOG_FILE_PREFIX}.{}.{LOG_FILE_SUFFIX}",
            date.format("%Y-%m-%d")
        ))
    }

    fn appender(&self) -> Result<RollingFileAppender, LoggingError> {
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(LOG_MAX_FILES)
            .build(self.directory())?;
        Ok(appender)
    }
}

/// Install the global subscriber. Verbose mode forces `debug`, otherwise
/// `RUST_LOG` applies with `info` as the default.
///
/// The returned guard flushes the file writer on drop and must be held
/// until the process exits.
pub fn init(verbose: bool, file: Option<&LogFile>) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = if verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    };

    let (file_layer, guard) = match file {
        Some(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file.appender()?);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_path_is_dated_per_app() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let file = LogFile::new("logs", "batch1");
        assert_eq!(
            file.path_for(date),
            PathBuf::from("logs/batch1/log.2024-03-09.log")
        );
    }

    #[test]
    fn appender_writes_todays_file_under_app_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = LogFile::new(dir.path(), "author-api");

        let mut appender = file.appender().unwrap();
        appender.write_all(b"{\"msg\":\"hello\"}\n").unwrap();
        appender.flush().unwrap();

        let today = chrono::Utc::now().date_naive();
        let written = std::fs::read_to_string(file.path_for(today)).unwrap();
        assert!(written.contains("hello"));
    }
}
