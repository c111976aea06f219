//! Tracing subscriber setup.
//!
//! Hosts call [`init_logging`] once at startup and keep the returned
//! [`LoggingGuard`] alive until exit. `RUST_LOG` takes precedence over the
//! configured level.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

/// Default log level directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Name of the log file written inside the log directory.
pub const LOG_FILE_NAME: &str = "mapsync.log";

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `mapsync=debug`.
    pub level: String,
    /// Directory for the log file. `None` logs to stderr.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: None,
        }
    }
}

impl LoggingConfig {
    /// Set the level directive.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Log to a file in `directory` instead of stderr.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Full path of the log file, if logging to a file.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.directory.as_deref().map(|dir| dir.join(LOG_FILE_NAME))
    }

    fn filter(&self) -> Result<EnvFilter, LoggingError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.level).map_err(|e| LoggingError::InvalidLevel {
            level: self.level.clone(),
            message: e.to_string(),
        })
    }
}

/// Errors from logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The level directive does not parse.
    #[error("Invalid log level '{level}': {message}")]
    InvalidLevel { level: String, message: String },

    /// The log directory cannot be created.
    #[error("Cannot create log directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Keeps the background log writer alive. Flushes when dropped.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
    log_file: Option<PathBuf>,
}

impl LoggingGuard {
    /// Log file being written, if any.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let filter = config.filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTime::rfc_3339())
        .with_target(true);

    match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory).map_err(|source| LoggingError::Directory {
                path: directory.clone(),
                source,
            })?;
            let appender = tracing_appender::rolling::never(directory, LOG_FILE_NAME);
            let (writer, worker) = tracing_appender::non_blocking(appender);
            builder
                .with_ansi(false)
                .with_writer(writer)
                .try_init()
                .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
            Ok(LoggingGuard {
                _worker: Some(worker),
                log_file: config.log_file(),
            })
        }
        None => {
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
            Ok(LoggingGuard {
                _worker: None,
                log_file: None,
            })
        }
    }
}
