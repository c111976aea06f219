//! Single-writer map session.
//!
//! A [`MapSession`] owns the location and map state of one screen and is
//! the only task that mutates them. Everything else talks to it through a
//! [`MapHandle`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         MapSession                            │
//! │                                                               │
//! │  MapHandle ─── Command ────┐                                  │
//! │                            ▼                                  │
//! │  LocationService ─ Event ─► inbox ─► LocationState ─► MapState │
//! │                            ▲               │             │    │
//! │  lookup task ─ Completion ─┘        broadcast/handlers  watch │
//! │       ▲                                                  │    │
//! │       └──── spawned per request (tagged with a ticket) ◄─┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages are applied one at a time in arrival order. Snapshots are
//! published once per message, so a reply that changes several fields is
//! observed as one update.
//!
//! # Example
//!
//! ```ignore
//! let (session, handle) = MapSession::new(config, location, search, geocoder);
//! let shutdown = CancellationToken::new();
//! tokio::spawn(session.run(shutdown.clone()));
//!
//! handle.request_permission()?;
//! handle.update_search_query("Golden")?;
//! let mut map = handle.map();
//! map.changed().await?;
//! ```

mod actor;
mod handle;
mod message;

pub use actor::MapSession;
pub use handle::MapHandle;

use crate::coord::Coordinate;
use crate::location::DEFAULT_FIX_CHANNEL_CAPACITY;
use crate::map::DEFAULT_CAMERA_DISTANCE_M;

/// Default map location (San Francisco).
pub const DEFAULT_LOCATION: Coordinate = Coordinate::new(37.7749, -122.4194);

/// Configuration for a map session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Camera fallback before any fix or selection exists.
    pub default_location: Coordinate,
    /// Distance of every fixed camera the map produces, in meters.
    pub camera_distance_m: f64,
    /// Backlog kept for fix broadcast subscribers.
    pub fix_channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_location: DEFAULT_LOCATION,
            camera_distance_m: DEFAULT_CAMERA_DISTANCE_M,
            fix_channel_capacity: DEFAULT_FIX_CHANNEL_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Set the default location.
    pub fn with_default_location(mut self, coordinate: Coordinate) -> Self {
        self.default_location = coordinate;
        self
    }

    /// Set the fixed camera distance.
    pub fn with_camera_distance(mut self, distance_m: f64) -> Self {
        self.camera_distance_m = distance_m;
        self
    }

    /// Set the fix broadcast capacity.
    pub fn with_fix_channel_capacity(mut self, capacity: usize) -> Self {
        self.fix_channel_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::LocationFix;
    use crate::error::{MapError, SessionError};
    use crate::map::{AddressMode, CameraView};
    use crate::platform::{
        AuthorizationStatus, BoxFuture, Geocoder, LocationEvents, LocationService, Placemark,
        PlatformError, SearchService, SearchSuggestion,
    };
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    /// Location service that keeps the attached sink so tests can drive it.
    #[derive(Default)]
    struct ScriptedLocation {
        events: Mutex<Option<LocationEvents>>,
        starts: AtomicUsize,
        stops: AtomicUsize,
        requests: AtomicUsize,
    }

    impl ScriptedLocation {
        fn events(&self) -> LocationEvents {
            self.events.lock().clone().expect("session attaches on creation")
        }
    }

    impl LocationService for ScriptedLocation {
        fn attach(&self, events: LocationEvents) {
            *self.events.lock() = Some(events);
        }

        fn request_authorization(&self) {
            self.requests.fetch_add(1, Ordering::SeqCst);
        }

        fn start(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Search and geocoding that answer immediately.
    struct InstantPlaces;

    impl SearchService for InstantPlaces {
        fn autocomplete(
            &self,
            fragment: String,
        ) -> BoxFuture<'_, Result<Vec<SearchSuggestion>, PlatformError>> {
            Box::pin(async move {
                if fragment == "fail" {
                    return Err(PlatformError::Unavailable("offline".to_string()));
                }
                Ok(vec![SearchSuggestion::new(format!("{} Street", fragment), "Testville")])
            })
        }

        fn lookup(
            &self,
            suggestion: SearchSuggestion,
        ) -> BoxFuture<'_, Result<Option<Coordinate>, PlatformError>> {
            Box::pin(async move {
                if suggestion.title == "Nowhere" {
                    return Ok(None);
                }
                Ok(Some(Coordinate::new(10.0, 20.0)))
            })
        }
    }

    impl Geocoder for InstantPlaces {
        fn reverse_geocode(
            &self,
            _coordinate: Coordinate,
        ) -> BoxFuture<'_, Result<Option<Placemark>, PlatformError>> {
            Box::pin(async { Ok(Some(Placemark::new("Park", "City", "Country"))) })
        }

        fn forward_geocode(
            &self,
            _address: String,
        ) -> BoxFuture<'_, Result<Option<Coordinate>, PlatformError>> {
            Box::pin(async { Ok(Some(Coordinate::new(1.0, 2.0))) })
        }
    }

    fn start() -> (MapHandle, Arc<ScriptedLocation>, CancellationToken) {
        let location = Arc::new(ScriptedLocation::default());
        let places = Arc::new(InstantPlaces);
        let (session, handle) = MapSession::new(
            SessionConfig::default(),
            location.clone(),
            places.clone(),
            places,
        );
        let shutdown = CancellationToken::new();
        tokio::spawn(session.run(shutdown.clone()));
        (handle, location, shutdown)
    }

    async fn wait_for_map<F>(handle: &MapHandle, predicate: F) -> crate::map::MapSnapshot
    where
        F: FnMut(&crate::map::MapSnapshot) -> bool,
    {
        let mut rx = handle.map();
        let snapshot = tokio::time::timeout(Duration::from_secs(1), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for map snapshot")
            .expect("session closed")
            .clone();
        snapshot
    }

    mod config {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = SessionConfig::default();
            assert_eq!(config.default_location, DEFAULT_LOCATION);
            assert_eq!(config.camera_distance_m, 1000.0);
            assert_eq!(config.fix_channel_capacity, DEFAULT_FIX_CHANNEL_CAPACITY);
        }

        #[test]
        fn test_builders() {
            let config = SessionConfig::default()
                .with_default_location(Coordinate::new(1.0, 2.0))
                .with_camera_distance(500.0)
                .with_fix_channel_capacity(4);
            assert_eq!(config.default_location, Coordinate::new(1.0, 2.0));
            assert_eq!(config.camera_distance_m, 500.0);
            assert_eq!(config.fix_channel_capacity, 4);
        }
    }

    mod commands {
        use super::*;

        #[tokio::test]
        async fn test_initial_snapshot() {
            let (handle, _, _shutdown) = start();
            let snapshot = handle.map_snapshot();
            assert_eq!(
                snapshot.camera,
                CameraView::follow_user(CameraView::fixed(DEFAULT_LOCATION, 1000.0))
            );
            assert_eq!(snapshot.camera_center(), DEFAULT_LOCATION);
        }

        #[tokio::test]
        async fn test_sync_applies_preceding_commands() {
            let (handle, _, _shutdown) = start();
            let point = Coordinate::new(3.0, 4.0);
            handle.set_selected_point(Some(point)).unwrap();
            handle.set_default_location(point).unwrap();
            handle.sync().await.unwrap();

            let snapshot = handle.map_snapshot();
            assert_eq!(snapshot.selected_point, Some(point));
            assert_eq!(snapshot.camera, CameraView::fixed(point, 1000.0));
        }

        #[tokio::test]
        async fn test_tracking_commands_are_idempotent() {
            let (handle, location, _shutdown) = start();
            handle.start_tracking().unwrap();
            handle.start_tracking().unwrap();
            handle.stop_tracking().unwrap();
            handle.stop_tracking().unwrap();
            handle.sync().await.unwrap();

            assert_eq!(location.starts.load(Ordering::SeqCst), 1);
            assert_eq!(location.stops.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_request_permission_reaches_service() {
            let (handle, location, _shutdown) = start();
            handle.request_permission().unwrap();
            handle.sync().await.unwrap();
            assert_eq!(location.requests.load(Ordering::SeqCst), 1);
        }
    }

    mod location_events {
        use super::*;

        #[tokio::test]
        async fn test_authorization_starts_tracking() {
            let (handle, location, _shutdown) = start();
            location
                .events()
                .authorization_changed(AuthorizationStatus::AuthorizedLimited);
            handle.sync().await.unwrap();

            let snapshot = handle.location_snapshot();
            assert!(snapshot.tracking);
            assert_eq!(snapshot.authorization, AuthorizationStatus::AuthorizedLimited);
        }

        #[tokio::test]
        async fn test_fix_pushes_user_location() {
            let (handle, location, _shutdown) = start();
            let mut fixes = handle.subscribe_fixes();
            let fix = LocationFix::new(Coordinate::new(40.0, -74.0), 10.0);

            location.events().fixes_delivered(vec![fix]);
            handle.sync().await.unwrap();

            assert_eq!(handle.map_snapshot().user_location, Some(fix.coordinate));
            assert_eq!(handle.map_snapshot().camera_center(), fix.coordinate);
            assert_eq!(fixes.recv().await.unwrap(), fix.coordinate);
        }

        #[tokio::test]
        async fn test_registered_handlers_all_fire() {
            let (handle, location, _shutdown) = start();
            let count = Arc::new(AtomicUsize::new(0));
            for _ in 0..2 {
                let count = Arc::clone(&count);
                handle
                    .on_fix_update(move |_| {
                        count.fetch_add(1, Ordering::SeqCst);
                    })
                    .await
                    .unwrap();
            }

            location
                .events()
                .fixes_delivered(vec![LocationFix::new(Coordinate::new(1.0, 1.0), 5.0)]);
            handle.sync().await.unwrap();

            assert_eq!(count.load(Ordering::SeqCst), 2);
        }

        #[tokio::test]
        async fn test_failure_is_observable() {
            let (handle, location, _shutdown) = start();
            location
                .events()
                .failed(PlatformError::Unavailable("no signal".to_string()));
            handle.sync().await.unwrap();

            assert_eq!(
                handle.location_snapshot().last_error,
                Some(MapError::LocationUnavailable("no signal".to_string()))
            );
        }
    }

    mod lookups {
        use super::*;

        #[tokio::test]
        async fn test_autocomplete_round_trip() {
            let (handle, _, _shutdown) = start();
            handle.update_search_query("Main").unwrap();

            let snapshot = wait_for_map(&handle, |s| !s.suggestions.is_empty()).await;
            assert_eq!(snapshot.suggestions[0].title, "Main Street");
            assert!(!snapshot.searching);
        }

        #[tokio::test]
        async fn test_autocomplete_failure_recorded() {
            let (handle, _, _shutdown) = start();
            handle.update_search_query("fail").unwrap();

            let snapshot = wait_for_map(&handle, |s| s.last_error.is_some()).await;
            assert_eq!(
                snapshot.last_error,
                Some(MapError::SearchFailed(
                    "Service unavailable: offline".to_string()
                ))
            );
            assert!(snapshot.suggestions.is_empty());
        }

        #[tokio::test]
        async fn test_select_suggestion_moves_map() {
            let (handle, _, _shutdown) = start();
            handle
                .select_suggestion(SearchSuggestion::new("Main Street", "Testville"))
                .unwrap();

            let snapshot = wait_for_map(&handle, |s| s.selected_point.is_some()).await;
            let target = Coordinate::new(10.0, 20.0);
            assert_eq!(snapshot.selected_point, Some(target));
            assert_eq!(snapshot.address.text(), "Main Street");
            assert_eq!(snapshot.address.mode(), AddressMode::Display);
            assert_eq!(snapshot.camera, CameraView::fixed(target, 1000.0));
        }

        #[tokio::test]
        async fn test_select_without_result_changes_nothing() {
            let (handle, _, _shutdown) = start();
            handle
                .select_suggestion(SearchSuggestion::new("Nowhere", ""))
                .unwrap();

            let snapshot = wait_for_map(&handle, |s| s.last_error.is_some()).await;
            assert!(snapshot.selected_point.is_none());
            assert_eq!(snapshot.address.text(), "");
            assert!(matches!(snapshot.last_error, Some(MapError::SearchFailed(_))));
        }

        #[tokio::test]
        async fn test_user_tap_resolves_address() {
            let (handle, _, _shutdown) = start();
            handle.user_tap(Coordinate::new(5.0, 5.0)).unwrap();

            let snapshot = wait_for_map(&handle, |s| !s.address.text().is_empty()).await;
            assert_eq!(snapshot.selected_point, Some(Coordinate::new(5.0, 5.0)));
            assert_eq!(snapshot.address.text(), "Park, City, Country");
        }

        #[tokio::test]
        async fn test_locate_address() {
            let (handle, _, _shutdown) = start();
            handle.locate_address("1 Infinite Loop").unwrap();

            let snapshot = wait_for_map(&handle, |s| s.selected_point.is_some()).await;
            assert_eq!(snapshot.selected_point, Some(Coordinate::new(1.0, 2.0)));
            assert_eq!(snapshot.address.text(), "1 Infinite Loop");
        }
    }

    mod teardown {
        use super::*;

        #[tokio::test]
        async fn test_shutdown_releases_tracking() {
            let (handle, location, shutdown) = start();
            handle.start_tracking().unwrap();
            handle.sync().await.unwrap();

            shutdown.cancel();
            tokio::time::timeout(Duration::from_secs(1), async {
                while !handle.is_closed() {
                    tokio::task::yield_now().await;
                }
            })
            .await
            .expect("session should stop");

            assert_eq!(location.stops.load(Ordering::SeqCst), 1);
            assert_eq!(handle.start_tracking(), Err(SessionError::Closed));
        }

        #[tokio::test]
        async fn test_dropping_handles_ends_session() {
            let location = Arc::new(ScriptedLocation::default());
            let places = Arc::new(InstantPlaces);
            let (session, handle) = MapSession::new(
                SessionConfig::default(),
                location.clone(),
                places.clone(),
                places,
            );
            let task = tokio::spawn(session.run(CancellationToken::new()));

            drop(handle);
            tokio::time::timeout(Duration::from_secs(1), task)
                .await
                .expect("session should stop")
                .unwrap();

            assert!(!location
                .events()
                .authorization_changed(AuthorizationStatus::AuthorizedFull));
        }
    }
}
