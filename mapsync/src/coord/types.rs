//! Coordinate value types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Errors from coordinate validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),
}

/// A WGS84 position in degrees.
///
/// Plain value type with no identity. Construction through [`Coordinate::new`]
/// is unchecked because platform services hand out whatever they have;
/// use [`Coordinate::try_new`] for user input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    /// Latitude in degrees (positive north).
    pub latitude: f64,
    /// Longitude in degrees (positive east).
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate without validation.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a coordinate, rejecting out-of-range values.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        if !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(CoordError::InvalidLatitude(latitude));
        }
        if !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(CoordError::InvalidLongitude(longitude));
        }
        Ok(Self::new(latitude, longitude))
    }

    /// Whether both components are within WGS84 range.
    pub fn is_valid(&self) -> bool {
        (MIN_LAT..=MAX_LAT).contains(&self.latitude)
            && (MIN_LON..=MAX_LON).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lat_hem = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let lon_hem = if self.longitude >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.5}°{} {:.5}°{}",
            self.latitude.abs(),
            lat_hem,
            self.longitude.abs(),
            lon_hem
        )
    }
}

/// One position reported by the location service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationFix {
    /// Reported position.
    pub coordinate: Coordinate,
    /// When the platform took the fix.
    pub timestamp: DateTime<Utc>,
    /// Horizontal accuracy radius in meters.
    pub accuracy: f64,
}

impl LocationFix {
    /// Create a fix stamped with the current time.
    pub fn new(coordinate: Coordinate, accuracy: f64) -> Self {
        Self::with_timestamp(coordinate, accuracy, Utc::now())
    }

    /// Create a fix with an explicit timestamp.
    pub fn with_timestamp(coordinate: Coordinate, accuracy: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            timestamp,
            accuracy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_new_accepts_valid() {
        let coord = Coordinate::try_new(37.7749, -122.4194).unwrap();
        assert_eq!(coord.latitude, 37.7749);
        assert_eq!(coord.longitude, -122.4194);
    }

    #[test]
    fn test_try_new_rejects_latitude() {
        assert!(matches!(
            Coordinate::try_new(100.0, 0.0),
            Err(CoordError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_try_new_rejects_longitude() {
        assert!(matches!(
            Coordinate::try_new(0.0, -200.0),
            Err(CoordError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_is_valid() {
        assert!(Coordinate::new(0.0, 0.0).is_valid());
        assert!(!Coordinate::new(100.0, -200.0).is_valid());
    }

    #[test]
    fn test_display() {
        let coord = Coordinate::new(37.7749, -122.4194);
        assert_eq!(coord.to_string(), "37.77490°N 122.41940°W");
    }
}
