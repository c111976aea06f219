//! mapsync - location tracking and map search state for map screens.
//!
//! Keeps the camera, the selected point, the device location and the
//! search/address text of a map screen consistent while location fixes,
//! user gestures and search or geocoding replies arrive in any order.
//!
//! # Modules
//!
//! - [`platform`]: collaborator traits for location, search and geocoding
//! - [`location`]: authorization, tracking and fix fan-out
//! - [`map`]: camera, selection, suggestions and address text
//! - [`session`]: the single-writer actor that owns both states
//! - [`surface`]: frames and gestures for a presentation layer
//! - [`sim`]: simulated platform services
//! - [`config`], [`logging`]: ambient setup for hosts

pub mod config;
pub mod coord;
pub mod error;
pub mod location;
pub mod logging;
pub mod map;
pub mod platform;
pub mod session;
pub mod sim;
pub mod surface;

pub use coord::{Coordinate, LocationFix};
pub use error::{MapError, SessionError};
pub use session::{MapHandle, MapSession, SessionConfig};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
