//! CLI error type.

use std::fmt;

use mapsync::config::ConfigError;
use mapsync::logging::LoggingError;
use mapsync::{MapError, SessionError};

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Reading or writing the config file failed.
    Config(ConfigError),

    /// Logging could not be set up.
    Logging(LoggingError),

    /// The map session stopped unexpectedly.
    Session(SessionError),

    /// A search or geocoding lookup failed.
    Lookup(MapError),

    /// A command line argument is out of range.
    InvalidArgument(String),

    /// A lookup produced no answer in time.
    Timeout(String),

    /// Failed to create the Tokio runtime.
    Runtime(String),

    /// Terminal setup, drawing or input failed.
    Terminal(std::io::Error),

    /// Output could not be serialized.
    Output(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::Session(e) => write!(f, "Session error: {}", e),
            CliError::Lookup(e) => write!(f, "{}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Timeout(msg) => write!(f, "Timed out: {}", msg),
            CliError::Runtime(msg) => write!(f, "Failed to create Tokio runtime: {}", msg),
            CliError::Terminal(e) => write!(f, "Terminal error: {}", e),
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Session(e) => Some(e),
            CliError::Lookup(e) => Some(e),
            CliError::Terminal(e) => Some(e),
            CliError::InvalidArgument(_)
            | CliError::Timeout(_)
            | CliError::Runtime(_)
            | CliError::Output(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Session(e)
    }
}

impl From<MapError> for CliError {
    fn from(e: MapError) -> Self {
        CliError::Lookup(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Terminal(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e.to_string())
    }
}
