//! INI configuration file.
//!
//! Lives at `<config_dir>/mapsync/config.ini`. A missing file means
//! defaults; unknown keys are ignored; values that do not parse are
//! reported with their section and key.
//!
//! ```ini
//! [map]
//! default_latitude = 37.7749
//! default_longitude = -122.4194
//! camera_distance = 1000
//! marker_radius = 100
//!
//! [session]
//! fix_channel_capacity = 64
//!
//! [logging]
//! level = info
//! directory = /home/me/.cache/mapsync
//!
//! [simulation]
//! fix_interval_ms = 1000
//! search_latency_ms = 150
//! grant_permission = true
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use thiserror::Error;
use tracing::debug;

use crate::coord::Coordinate;
use crate::logging::LoggingConfig;
use crate::session::SessionConfig;
use crate::surface::SurfaceConfig;

/// Directory name under the platform config directory.
pub const CONFIG_DIR_NAME: &str = "mapsync";

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default simulated search latency.
pub const DEFAULT_SEARCH_LATENCY: Duration = Duration::from_millis(150);

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform has no configuration directory.
    #[error("No configuration directory available on this platform")]
    NoConfigDir,

    /// The file exists but cannot be read or parsed.
    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// The file cannot be written.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value does not parse or is out of range.
    #[error("Invalid value '{value}' for [{section}] {key}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}

/// `[map]` settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    /// Camera fallback before any fix or selection.
    pub default_location: Coordinate,
    /// Fixed camera distance in meters.
    pub camera_distance_m: f64,
    /// Selection circle radius in meters.
    pub marker_radius_m: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            default_location: session.default_location,
            camera_distance_m: session.camera_distance_m,
            marker_radius_m: SurfaceConfig::default().marker_radius_m,
        }
    }
}

/// `[simulation]` settings for the simulated platform services.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Time between simulated fixes.
    pub fix_interval: Duration,
    /// Base latency of simulated search and geocoding.
    pub search_latency: Duration,
    /// Whether the simulated user grants location access.
    pub grant_permission: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fix_interval: crate::sim::DEFAULT_FIX_INTERVAL,
            search_latency: DEFAULT_SEARCH_LATENCY,
            grant_permission: true,
        }
    }
}

impl SimulationConfig {
    /// Set the fix interval.
    pub fn with_fix_interval(mut self, interval: Duration) -> Self {
        self.fix_interval = interval;
        self
    }

    /// Set the search latency.
    pub fn with_search_latency(mut self, latency: Duration) -> Self {
        self.search_latency = latency;
        self
    }

    /// Set whether permission is granted.
    pub fn with_grant_permission(mut self, grant: bool) -> Self {
        self.grant_permission = grant;
        self
    }
}

/// Contents of the configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// `[map]`
    pub map: MapSettings,
    /// `[session] fix_channel_capacity`
    pub fix_channel_capacity: usize,
    /// `[logging]`
    pub logging: LoggingConfig,
    /// `[simulation]`
    pub simulation: SimulationConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            map: MapSettings::default(),
            fix_channel_capacity: SessionConfig::default().fix_channel_capacity,
            logging: LoggingConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl ConfigFile {
    /// Defaults for every setting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from the default path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::new());
        }
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_ini(&ini)
    }

    /// Parse from an in-memory INI document.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Some(section) = ini.section(Some("map")) {
            let map = &mut config.map;
            let lat = parse_or(
                section,
                "map",
                "default_latitude",
                map.default_location.latitude,
            )?;
            let lon = parse_or(
                section,
                "map",
                "default_longitude",
                map.default_location.longitude,
            )?;
            map.default_location = Coordinate::try_new(lat, lon).map_err(|_| {
                invalid("map", "default_latitude/default_longitude", format!("{}, {}", lat, lon))
            })?;
            map.camera_distance_m =
                parse_or(section, "map", "camera_distance", map.camera_distance_m)?;
            if !map.camera_distance_m.is_finite() || map.camera_distance_m <= 0.0 {
                return Err(invalid(
                    "map",
                    "camera_distance",
                    map.camera_distance_m.to_string(),
                ));
            }
            map.marker_radius_m = parse_or(section, "map", "marker_radius", map.marker_radius_m)?;
            if !map.marker_radius_m.is_finite() || map.marker_radius_m < 0.0 {
                return Err(invalid("map", "marker_radius", map.marker_radius_m.to_string()));
            }
        }

        if let Some(section) = ini.section(Some("session")) {
            config.fix_channel_capacity =
                parse_or(section, "session", "fix_channel_capacity", config.fix_channel_capacity)?;
            if config.fix_channel_capacity == 0 {
                return Err(invalid("session", "fix_channel_capacity", "0".to_string()));
            }
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(level) = section.get("level").map(str::trim).filter(|l| !l.is_empty()) {
                config.logging.level = level.to_string();
            }
            config.logging.directory = section
                .get("directory")
                .map(str::trim)
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from);
        }

        if let Some(section) = ini.section(Some("simulation")) {
            let sim = &mut config.simulation;
            sim.fix_interval = Duration::from_millis(parse_or(
                section,
                "simulation",
                "fix_interval_ms",
                sim.fix_interval.as_millis() as u64,
            )?);
            if sim.fix_interval.is_zero() {
                return Err(invalid("simulation", "fix_interval_ms", "0".to_string()));
            }
            sim.search_latency = Duration::from_millis(parse_or(
                section,
                "simulation",
                "search_latency_ms",
                sim.search_latency.as_millis() as u64,
            )?);
            sim.grant_permission =
                parse_or(section, "simulation", "grant_permission", sim.grant_permission)?;
        }

        Ok(config)
    }

    /// Render every setting as an INI document.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("map"))
            .set("default_latitude", self.map.default_location.latitude.to_string())
            .set("default_longitude", self.map.default_location.longitude.to_string())
            .set("camera_distance", self.map.camera_distance_m.to_string())
            .set("marker_radius", self.map.marker_radius_m.to_string());
        ini.with_section(Some("session"))
            .set("fix_channel_capacity", self.fix_channel_capacity.to_string());
        ini.with_section(Some("logging"))
            .set("level", self.logging.level.clone())
            .set(
                "directory",
                self.logging
                    .directory
                    .as_ref()
                    .map(|dir| dir.display().to_string())
                    .unwrap_or_default(),
            );
        ini.with_section(Some("simulation"))
            .set("fix_interval_ms", self.simulation.fix_interval.as_millis().to_string())
            .set("search_latency_ms", self.simulation.search_latency.as_millis().to_string())
            .set("grant_permission", self.simulation.grant_permission.to_string());
        ini
    }

    /// Write every setting to the default path.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write every setting to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)?;
        debug!(path = %path.display(), "Saved config file");
        Ok(())
    }

    /// Session settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_default_location(self.map.default_location)
            .with_camera_distance(self.map.camera_distance_m)
            .with_fix_channel_capacity(self.fix_channel_capacity)
    }

    /// Surface settings.
    pub fn surface_config(&self) -> SurfaceConfig {
        SurfaceConfig::default().with_marker_radius(self.map.marker_radius_m)
    }
}

fn parse_or<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match section.get(key).map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| invalid(section_name, key, raw.to_string())),
    }
}

fn invalid(section: &str, key: &str, value: String) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(text: &str) -> Result<ConfigFile, ConfigError> {
        ConfigFile::from_ini(&Ini::load_from_str(text).unwrap())
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::new());
        assert_eq!(config.fix_channel_capacity, 64);
        assert_eq!(config.map.camera_distance_m, 1000.0);
        assert_eq!(config.map.marker_radius_m, 100.0);
    }

    #[test]
    fn test_parses_all_sections() {
        let config = parse(
            "[map]\n\
             default_latitude = 48.8584\n\
             default_longitude = 2.2945\n\
             camera_distance = 2500\n\
             marker_radius = 50\n\
             [session]\n\
             fix_channel_capacity = 16\n\
             [logging]\n\
             level = mapsync=debug\n\
             directory = /tmp/mapsync-logs\n\
             [simulation]\n\
             fix_interval_ms = 250\n\
             search_latency_ms = 0\n\
             grant_permission = false\n",
        )
        .unwrap();

        assert_eq!(config.map.default_location, Coordinate::new(48.8584, 2.2945));
        assert_eq!(config.map.camera_distance_m, 2500.0);
        assert_eq!(config.map.marker_radius_m, 50.0);
        assert_eq!(config.fix_channel_capacity, 16);
        assert_eq!(config.logging.level, "mapsync=debug");
        assert_eq!(
            config.logging.directory,
            Some(PathBuf::from("/tmp/mapsync-logs"))
        );
        assert_eq!(config.simulation.fix_interval, Duration::from_millis(250));
        assert_eq!(config.simulation.search_latency, Duration::ZERO);
        assert!(!config.simulation.grant_permission);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = parse("[map]\nzoom = 12\n[extras]\nfoo = bar\n").unwrap();
        assert_eq!(config, ConfigFile::new());
    }

    #[test]
    fn test_malformed_number_reported() {
        let err = parse("[map]\ncamera_distance = far\n").unwrap_err();
        match err {
            ConfigError::InvalidValue {
                section,
                key,
                value,
            } => {
                assert_eq!(section, "map");
                assert_eq!(key, "camera_distance");
                assert_eq!(value, "far");
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_latitude_rejected() {
        let err = parse("[map]\ndefault_latitude = 95\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_non_finite_distances_rejected() {
        for (key, value) in [
            ("camera_distance", "inf"),
            ("camera_distance", "NaN"),
            ("marker_radius", "inf"),
            ("marker_radius", "-inf"),
        ] {
            let err = parse(&format!("[map]\n{} = {}\n", key, value)).unwrap_err();
            match err {
                ConfigError::InvalidValue {
                    section, key: k, ..
                } => {
                    assert_eq!(section, "map");
                    assert_eq!(k, key);
                }
                other => panic!("Unexpected error for {} = {}: {:?}", key, value, other),
            }
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = parse("[session]\nfix_channel_capacity = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "fix_channel_capacity"
        ));
    }

    #[test]
    fn test_malformed_bool_reported() {
        let err = parse("[simulation]\ngrant_permission = maybe\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref value, .. } if value == "maybe"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ini");
        let mut config = ConfigFile::new();
        config.map.default_location = Coordinate::new(-33.8568, 151.2153);
        config.logging = LoggingConfig::default().with_directory(dir.path());
        config.simulation = SimulationConfig::default().with_grant_permission(false);

        config.save_to(&path).unwrap();
        let loaded = ConfigFile::load_from(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_writes_every_key() {
        let ini = ConfigFile::new().to_ini();
        for (section, key) in [
            ("map", "default_latitude"),
            ("map", "default_longitude"),
            ("map", "camera_distance"),
            ("map", "marker_radius"),
            ("session", "fix_channel_capacity"),
            ("logging", "level"),
            ("logging", "directory"),
            ("simulation", "fix_interval_ms"),
            ("simulation", "search_latency_ms"),
            ("simulation", "grant_permission"),
        ] {
            assert!(
                ini.get_from(Some(section), key).is_some(),
                "[{}] {} missing",
                section,
                key
            );
        }
    }

    #[test]
    fn test_session_and_surface_configs() {
        let mut config = ConfigFile::new();
        config.map.camera_distance_m = 750.0;
        config.map.marker_radius_m = 40.0;
        config.fix_channel_capacity = 8;

        let session = config.session_config();
        assert_eq!(session.camera_distance_m, 750.0);
        assert_eq!(session.fix_channel_capacity, 8);
        assert_eq!(config.surface_config().marker_radius_m, 40.0);
    }
}
