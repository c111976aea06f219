//! Error types shared across the map session.
//!
//! Every failure the session sees is recovered locally: it is logged,
//! stored as the `last_error` of the component it affected, and the
//! component stays usable. Nothing here is raised to interrupt a caller
//! except [`SessionError`], which only means the session itself is gone.

use thiserror::Error;

/// Failures observed by the location and map state.
///
/// These never propagate out of a command. The affected field simply
/// keeps its previous value and the error is published in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// The user (or device policy) refused location access.
    #[error("Location permission denied")]
    PermissionDenied,

    /// The location service reported a failure.
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// Autocomplete or forward search failed or found nothing.
    #[error("Search failed: {0}")]
    SearchFailed(String),

    /// Forward or reverse geocoding failed or found nothing.
    #[error("Geocoding failed: {0}")]
    GeocodeFailed(String),
}

/// Errors returned when talking to a map session through a handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The session task has stopped and no longer accepts messages.
    #[error("Map session is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_error_display() {
        assert_eq!(
            MapError::PermissionDenied.to_string(),
            "Location permission denied"
        );
        assert_eq!(
            MapError::SearchFailed("no results".to_string()).to_string(),
            "Search failed: no results"
        );
        assert_eq!(
            MapError::GeocodeFailed("timeout".to_string()).to_string(),
            "Geocoding failed: timeout"
        );
    }

    #[test]
    fn test_session_error_display() {
        assert_eq!(SessionError::Closed.to_string(), "Map session is closed");
    }
}
