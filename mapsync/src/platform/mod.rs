//! Platform collaborator interfaces.
//!
//! The session never acquires fixes, ranks completions or geocodes on its
//! own. It talks to three injected collaborators:
//!
//! - [`LocationService`]: authorization, start/stop, and push-style
//!   callbacks delivered through an attached [`LocationEvents`] sink
//! - [`SearchService`]: autocomplete and forward search by suggestion
//! - [`Geocoder`]: forward and reverse geocoding
//!
//! # Dyn Compatibility
//!
//! Async methods return [`BoxFuture`] so every collaborator can be held as
//! `Arc<dyn Trait>` and swapped for a simulated or mock implementation.

mod events;
mod types;

pub use events::{LocationEvent, LocationEvents};
pub use types::{AuthorizationStatus, Placemark, PlatformError, SearchSuggestion};

use std::future::Future;
use std::pin::Pin;

use crate::coord::Coordinate;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Device location service.
///
/// Commands return immediately; their effects arrive later through the
/// [`LocationEvents`] sink handed over in [`attach`](LocationService::attach).
pub trait LocationService: Send + Sync + 'static {
    /// Register the sink that receives authorization, fix and failure callbacks.
    ///
    /// Called once by the session before any other method. A later call
    /// replaces the sink.
    fn attach(&self, events: LocationEvents);

    /// Ask the user for location authorization.
    fn request_authorization(&self);

    /// Begin delivering fixes.
    fn start(&self);

    /// Stop delivering fixes. Fixes already in flight may still arrive.
    fn stop(&self);
}

/// Map search service (autocomplete and search by completion).
pub trait SearchService: Send + Sync + 'static {
    /// Complete a free-text fragment into ranked suggestions.
    ///
    /// The order of the returned list is the service's relevance order.
    fn autocomplete(
        &self,
        fragment: String,
    ) -> BoxFuture<'_, Result<Vec<SearchSuggestion>, PlatformError>>;

    /// Resolve a suggestion to its single best-matching point.
    ///
    /// `Ok(None)` means the search ran but found nothing.
    fn lookup(
        &self,
        suggestion: SearchSuggestion,
    ) -> BoxFuture<'_, Result<Option<Coordinate>, PlatformError>>;
}

/// Geocoding service.
pub trait Geocoder: Send + Sync + 'static {
    /// Resolve a coordinate to a best-effort place description.
    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'_, Result<Option<Placemark>, PlatformError>>;

    /// Resolve a free-form address to a coordinate.
    fn forward_geocode(
        &self,
        address: String,
    ) -> BoxFuture<'_, Result<Option<Coordinate>, PlatformError>>;
}
