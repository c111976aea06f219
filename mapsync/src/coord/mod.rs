//! Geographic coordinate helpers.
//!
//! Provides the [`Coordinate`] and [`LocationFix`] value types plus the small
//! amount of geodesy the session needs: great-circle distance and the
//! bounding box of a camera view on the ground.

mod types;

pub use types::{CoordError, Coordinate, LocationFix, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use serde::Serialize;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Meters per degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Great-circle distance between two coordinates in meters (haversine).
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Move a coordinate by a ground offset in meters.
///
/// Uses a local flat-earth approximation, which is accurate for the few
/// kilometers a map screen spans.
pub fn offset_meters(origin: &Coordinate, east_m: f64, north_m: f64) -> Coordinate {
    let lat = origin.latitude + north_m / METERS_PER_DEGREE;
    let lon = origin.longitude + east_m / meters_per_degree_lon(origin.latitude);
    Coordinate::new(lat.clamp(MIN_LAT, MAX_LAT), wrap_longitude(lon))
}

/// Meters per degree of longitude at the given latitude.
fn meters_per_degree_lon(latitude: f64) -> f64 {
    // Keep the divisor away from zero near the poles.
    (METERS_PER_DEGREE * latitude.to_radians().cos()).max(1.0)
}

fn wrap_longitude(lon: f64) -> f64 {
    if lon > MAX_LON {
        lon - 360.0
    } else if lon < MIN_LON {
        lon + 360.0
    } else {
        lon
    }
}

/// Geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoBounds {
    /// Minimum (southernmost) latitude
    pub min_lat: f64,
    /// Maximum (northernmost) latitude
    pub max_lat: f64,
    /// Minimum (westernmost) longitude
    pub min_lon: f64,
    /// Maximum (easternmost) longitude
    pub max_lon: f64,
}

impl GeoBounds {
    /// Create a new bounding box.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Bounding box of a ground rectangle centered on `center`.
    pub fn around(center: &Coordinate, width_m: f64, height_m: f64) -> Self {
        let half_lat = height_m / 2.0 / METERS_PER_DEGREE;
        let half_lon = width_m / 2.0 / meters_per_degree_lon(center.latitude);
        Self {
            min_lat: center.latitude - half_lat,
            max_lat: center.latitude + half_lat,
            min_lon: center.longitude - half_lon,
            max_lon: center.longitude + half_lon,
        }
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// Get the width of the bounds in degrees.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Get the height of the bounds in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Whether the coordinate lies inside the bounds (edges inclusive).
    pub fn contains(&self, coord: &Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&coord.latitude)
            && (self.min_lon..=self.max_lon).contains(&coord.longitude)
    }

    /// Coordinate at a fractional position inside the box.
    ///
    /// `fx` runs west to east and `fy` runs north to south, both in `0.0..=1.0`,
    /// matching screen orientation.
    pub fn coordinate_at(&self, fx: f64, fy: f64) -> Coordinate {
        let fx = fx.clamp(0.0, 1.0);
        let fy = fy.clamp(0.0, 1.0);
        Coordinate::new(
            self.max_lat - fy * self.height(),
            self.min_lon + fx * self.width(),
        )
    }
}
