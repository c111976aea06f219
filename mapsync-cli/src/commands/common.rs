//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;
use std::time::Duration;

use mapsync::config::ConfigFile;
use mapsync::logging::{init_logging, LoggingGuard};
use mapsync::map::MapSnapshot;
use mapsync::sim::SimulatedPlatform;
use mapsync::{Coordinate, MapHandle, MapSession, SessionError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::CliError;

/// How long headless commands wait for a lookup to settle.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Options accepted by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// `--config`
    pub config_path: Option<PathBuf>,
    /// `--log-level`
    pub log_level: Option<String>,
}

impl GlobalOptions {
    /// Config file path: `--config` or the default location.
    pub fn config_path(&self) -> Result<PathBuf, CliError> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(ConfigFile::default_path()?),
        }
    }

    /// Load the config file with command line overrides applied.
    pub fn load_config(&self) -> Result<ConfigFile, CliError> {
        let mut config = ConfigFile::load_from(&self.config_path()?)?;
        if let Some(level) = &self.log_level {
            config.logging = config.logging.with_level(level.clone());
        }
        Ok(config)
    }
}

/// Install logging for a command.
pub fn start_logging(config: &ConfigFile) -> Result<LoggingGuard, CliError> {
    Ok(init_logging(&config.logging)?)
}

/// Multi-threaded runtime for session tasks.
pub fn build_runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))
}

/// A map session running on the simulated platform.
pub struct RunningSession {
    pub handle: MapHandle,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl RunningSession {
    /// Spawn a session on the current runtime, walking around `start`.
    pub fn spawn(config: &ConfigFile, start: Coordinate) -> Self {
        let platform = SimulatedPlatform::new(&config.simulation, start);
        let session_config = config.session_config().with_default_location(start);

        let (session, handle) = MapSession::new(
            session_config,
            platform.location,
            platform.places.clone(),
            platform.places,
        );
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(session.run(shutdown.clone()));

        Self {
            handle,
            shutdown,
            task,
        }
    }

    /// Signal shutdown and wait for the session task to finish.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Map session task failed");
        }
    }

    /// Wait until the published map snapshot satisfies `settled`.
    ///
    /// Call after [`MapHandle::sync`] so the snapshot already reflects the
    /// command being waited on.
    pub async fn wait_for_map<F>(&self, what: &str, settled: F) -> Result<MapSnapshot, CliError>
    where
        F: FnMut(&MapSnapshot) -> bool,
    {
        let mut map = self.handle.map();
        let result = match tokio::time::timeout(LOOKUP_TIMEOUT, map.wait_for(settled)).await {
            Ok(Ok(snapshot)) => Ok(snapshot.clone()),
            Ok(Err(_)) => Err(SessionError::Closed.into()),
            Err(_) => Err(CliError::Timeout(what.to_string())),
        };
        result
    }
}

/// Validate a user-supplied coordinate.
pub fn parse_coordinate(lat: f64, lon: f64) -> Result<Coordinate, CliError> {
    Coordinate::try_new(lat, lon).map_err(|e| CliError::InvalidArgument(e.to_string()))
}
