//! Simulated platform services.
//!
//! Stand-ins for a device location service and a map search/geocoding
//! service, used by the command line tools and by integration tests.

mod gazetteer;
mod location;

pub use gazetteer::{Gazetteer, Place, MAX_SUGGESTIONS, REVERSE_GEOCODE_RADIUS_M};
pub use location::{
    circle_route, SimulatedLocationService, DEFAULT_FIX_INTERVAL, SIMULATED_ACCURACY_M,
};

use std::sync::Arc;

use crate::config::SimulationConfig;
use crate::coord::Coordinate;
use crate::platform::AuthorizationStatus;

/// Radius of the default simulated walk (meters).
pub const WALK_RADIUS_M: f64 = 150.0;

/// Number of points on the default simulated walk.
pub const WALK_POINTS: usize = 24;

/// Simulated services configured from a [`SimulationConfig`].
pub struct SimulatedPlatform {
    /// Device location walking a circle around the start point.
    pub location: Arc<SimulatedLocationService>,
    /// Search and geocoding.
    pub places: Arc<Gazetteer>,
}

impl SimulatedPlatform {
    /// Build the services, walking around `start`.
    pub fn new(config: &SimulationConfig, start: Coordinate) -> Self {
        let grant = if config.grant_permission {
            AuthorizationStatus::AuthorizedLimited
        } else {
            AuthorizationStatus::Denied
        };
        let route = circle_route(start, WALK_RADIUS_M, WALK_POINTS);
        let location = SimulatedLocationService::new(route)
            .with_interval(config.fix_interval)
            .with_authorization(grant);
        let places = Gazetteer::bay_area().with_latency(config.search_latency);

        Self {
            location: Arc::new(location),
            places: Arc::new(places),
        }
    }
}
