//! Map screen state and reconciliation of asynchronous results.

use serde::Serialize;
use tracing::{debug, warn};

use super::address::{AddressMode, AddressText};
use super::camera::{CameraView, DEFAULT_CAMERA_DISTANCE_M};
use super::sequence::{RequestKind, RequestSequencer, RequestTicket};
use crate::coord::Coordinate;
use crate::error::MapError;
use crate::platform::{Placemark, SearchSuggestion};

/// What [`MapState::update_search_query`] decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Send the text to autocomplete under this ticket.
    Dispatch(RequestTicket),
    /// The query is blank; suggestions were cleared and nothing is sent.
    Cleared,
    /// The text is the displayed address coming back; nothing changed.
    Unchanged,
}

/// Point-in-time copy of [`MapState`] for observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSnapshot {
    /// Camera fallback used before any fix or selection.
    pub default_location: Coordinate,
    /// Last coordinate pushed from location tracking.
    pub user_location: Option<Coordinate>,
    /// Point chosen by tap or by suggestion.
    pub selected_point: Option<Coordinate>,
    /// Current camera.
    pub camera: CameraView,
    /// Latest autocomplete suggestions, in service order.
    pub suggestions: Vec<SearchSuggestion>,
    /// Query/address text and its mode.
    pub address: AddressText,
    /// Whether an autocomplete reply is outstanding.
    pub searching: bool,
    /// Whether a forward or reverse lookup reply is outstanding.
    pub resolving: bool,
    /// Most recent search or geocoding failure.
    #[serde(skip)]
    pub last_error: Option<MapError>,
}

impl MapSnapshot {
    /// Effective camera center.
    pub fn camera_center(&self) -> Coordinate {
        self.camera.center(self.user_location)
    }
}

/// Camera, selection and search state of one map screen.
///
/// Commands mutate immediately. Asynchronous work is split in two: a
/// `begin`-style call records intent and returns a [`RequestTicket`], and
/// an `apply_*` call later merges the reply if that ticket is still the
/// latest of its kind.
#[derive(Debug, Clone)]
pub struct MapState {
    default_location: Coordinate,
    camera_distance_m: f64,
    user_location: Option<Coordinate>,
    selected_point: Option<Coordinate>,
    camera: CameraView,
    suggestions: Vec<SearchSuggestion>,
    address: AddressText,
    last_error: Option<MapError>,
    requests: RequestSequencer,
}

impl MapState {
    /// Create map state with the default 1000 m camera distance.
    pub fn new(default_location: Coordinate) -> Self {
        Self::with_camera_distance(default_location, DEFAULT_CAMERA_DISTANCE_M)
    }

    /// Create map state with a custom camera distance.
    ///
    /// The camera starts following the user, falling back to a fixed view
    /// of `default_location`.
    pub fn with_camera_distance(default_location: Coordinate, camera_distance_m: f64) -> Self {
        Self {
            default_location,
            camera_distance_m,
            user_location: None,
            selected_point: None,
            camera: CameraView::follow_user(CameraView::fixed(
                default_location,
                camera_distance_m,
            )),
            suggestions: Vec::new(),
            address: AddressText::default(),
            last_error: None,
            requests: RequestSequencer::new(),
        }
    }

    // =========================================================================
    // Synchronous commands
    // =========================================================================

    /// Mirror the coordinate pushed by location tracking.
    pub fn set_user_location(&mut self, coordinate: Option<Coordinate>) {
        self.user_location = coordinate;
    }

    /// Set or clear the selected point.
    pub fn set_selected_point(&mut self, coordinate: Option<Coordinate>) {
        self.selected_point = coordinate;
    }

    /// Replace the camera.
    pub fn set_camera(&mut self, camera: CameraView) {
        self.camera = camera;
    }

    /// Make `coordinate` the default location and look at it.
    ///
    /// Always yields a fixed camera, overriding follow-user mode.
    pub fn set_default_location(&mut self, coordinate: Coordinate) {
        self.default_location = coordinate;
        self.camera = self.fixed_camera(coordinate);
    }

    /// Clear the suggestion list and drop any autocomplete still in flight.
    pub fn dismiss_suggestions(&mut self) {
        self.suggestions.clear();
        self.requests.invalidate(RequestKind::Autocomplete);
    }

    // =========================================================================
    // Asynchronous operations: issue
    // =========================================================================

    /// Record a user edit of the query text.
    pub fn update_search_query(&mut self, text: &str) -> QueryOutcome {
        if self.address.is_echo(text) {
            return QueryOutcome::Unchanged;
        }

        self.address.set_query(text.to_string());
        // An edit owns the text from now on; lookups issued earlier must not
        // put an address back over it.
        self.requests.invalidate(RequestKind::ReverseGeocode);
        self.requests.invalidate(RequestKind::ForwardLookup);

        if text.trim().is_empty() {
            self.suggestions.clear();
            self.requests.invalidate(RequestKind::Autocomplete);
            return QueryOutcome::Cleared;
        }

        QueryOutcome::Dispatch(self.requests.issue(RequestKind::Autocomplete))
    }

    /// Start a forward lookup for a chosen suggestion.
    pub fn select_suggestion(&mut self, suggestion: &SearchSuggestion) -> RequestTicket {
        debug!(title = %suggestion.title, "Suggestion selected");
        self.requests.issue(RequestKind::ForwardLookup)
    }

    /// Start a forward geocode of free text. Blank text issues nothing.
    pub fn locate_address(&mut self, text: &str) -> Option<RequestTicket> {
        if text.trim().is_empty() {
            return None;
        }
        Some(self.requests.issue(RequestKind::ForwardLookup))
    }

    /// Start a reverse geocode of a point.
    pub fn resolve_address_for_point(&mut self, coordinate: Coordinate) -> RequestTicket {
        debug!(
            lat = coordinate.latitude,
            lon = coordinate.longitude,
            "Resolving address for point"
        );
        self.requests.issue(RequestKind::ReverseGeocode)
    }

    /// Select the tapped point and start resolving its address.
    pub fn user_tap(&mut self, coordinate: Coordinate) -> RequestTicket {
        self.set_selected_point(Some(coordinate));
        self.resolve_address_for_point(coordinate)
    }

    // =========================================================================
    // Asynchronous operations: apply replies
    // =========================================================================

    /// Merge an autocomplete reply. Returns `true` if it was applied.
    ///
    /// Success replaces the list wholesale; failure leaves it untouched.
    pub fn apply_suggestions(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<SearchSuggestion>, MapError>,
    ) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        match result {
            Ok(suggestions) => {
                debug!(ticket = %ticket, count = suggestions.len(), "Suggestions updated");
                self.suggestions = suggestions;
            }
            Err(error) => self.record_failure(ticket, error),
        }
        true
    }

    /// Merge a forward lookup reply. Returns `true` if it was applied.
    ///
    /// On success the displayed address, the selected point and the camera
    /// change together; on failure nothing but `last_error` changes.
    pub fn apply_forward_lookup(
        &mut self,
        ticket: RequestTicket,
        label: &str,
        result: Result<Coordinate, MapError>,
    ) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        match result {
            Ok(coordinate) => {
                debug!(
                    ticket = %ticket,
                    label,
                    lat = coordinate.latitude,
                    lon = coordinate.longitude,
                    "Forward lookup resolved"
                );
                self.address.set_display(label.to_string());
                self.selected_point = Some(coordinate);
                self.camera = self.fixed_camera(coordinate);
            }
            Err(error) => self.record_failure(ticket, error),
        }
        true
    }

    /// Merge a reverse geocoding reply. Returns `true` if it was applied.
    pub fn apply_placemark(
        &mut self,
        ticket: RequestTicket,
        result: Result<Placemark, MapError>,
    ) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        match result {
            Ok(placemark) => {
                let address = placemark.formatted_address();
                debug!(ticket = %ticket, address = %address, "Address resolved");
                self.address.set_display(address);
            }
            Err(error) => self.record_failure(ticket, error),
        }
        true
    }

    fn accept(&mut self, ticket: RequestTicket) -> bool {
        let current = self.requests.settle(ticket);
        if !current {
            debug!(ticket = %ticket, "Discarding stale reply");
        }
        current
    }

    fn record_failure(&mut self, ticket: RequestTicket, error: MapError) {
        warn!(ticket = %ticket, error = %error, "Lookup failed");
        self.last_error = Some(error);
    }

    fn fixed_camera(&self, center: Coordinate) -> CameraView {
        CameraView::fixed(center, self.camera_distance_m)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Default location given at construction or by `set_default_location`.
    pub fn default_location(&self) -> Coordinate {
        self.default_location
    }

    /// Last coordinate from location tracking.
    pub fn user_location(&self) -> Option<Coordinate> {
        self.user_location
    }

    /// Selected point.
    pub fn selected_point(&self) -> Option<Coordinate> {
        self.selected_point
    }

    /// Current camera.
    pub fn camera(&self) -> &CameraView {
        &self.camera
    }

    /// Current suggestions.
    pub fn suggestions(&self) -> &[SearchSuggestion] {
        &self.suggestions
    }

    /// Current address text.
    pub fn address(&self) -> &AddressText {
        &self.address
    }

    /// Mode of the address text.
    pub fn address_mode(&self) -> AddressMode {
        self.address.mode()
    }

    /// Most recent lookup failure.
    pub fn last_error(&self) -> Option<&MapError> {
        self.last_error.as_ref()
    }

    /// Take a snapshot for observers.
    pub fn snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            default_location: self.default_location,
            user_location: self.user_location,
            selected_point: self.selected_point,
            camera: self.camera.clone(),
            suggestions: self.suggestions.clone(),
            address: self.address.clone(),
            searching: self.requests.is_pending(RequestKind::Autocomplete),
            resolving: self.requests.is_pending(RequestKind::ForwardLookup)
                || self.requests.is_pending(RequestKind::ReverseGeocode),
            last_error: self.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAN_FRANCISCO: Coordinate = Coordinate::new(37.7749, -122.4194);
    const GOLDEN_GATE_PARK: Coordinate = Coordinate::new(37.7689, -122.4830);

    fn state() -> MapState {
        MapState::new(SAN_FRANCISCO)
    }

    fn dispatched(outcome: QueryOutcome) -> RequestTicket {
        match outcome {
            QueryOutcome::Dispatch(ticket) => ticket,
            other => panic!("Expected dispatch, got {:?}", other),
        }
    }

    fn suggestion(title: &str) -> SearchSuggestion {
        SearchSuggestion::new(title, "San Francisco, CA")
    }

    mod construction {
        use super::*;

        #[test]
        fn test_camera_follows_user_with_default_fallback() {
            let state = state();
            assert_eq!(
                *state.camera(),
                CameraView::follow_user(CameraView::fixed(SAN_FRANCISCO, 1000.0))
            );
            assert!(state.selected_point().is_none());
            assert!(state.suggestions().is_empty());
            assert_eq!(state.address().text(), "");
        }

        #[test]
        fn test_custom_camera_distance() {
            let state = MapState::with_camera_distance(SAN_FRANCISCO, 2500.0);
            assert_eq!(state.camera().distance_m(), 2500.0);
        }
    }

    mod commands {
        use super::*;

        #[test]
        fn test_set_user_location() {
            let mut state = state();
            let nyc = Coordinate::new(40.7128, -74.0060);
            state.set_user_location(Some(nyc));
            assert_eq!(state.user_location(), Some(nyc));
            state.set_user_location(None);
            assert_eq!(state.user_location(), None);
        }

        #[test]
        fn test_set_selected_point() {
            let mut state = state();
            let la = Coordinate::new(34.0522, -118.2437);
            state.set_selected_point(Some(la));
            assert_eq!(state.selected_point(), Some(la));
        }

        #[test]
        fn test_set_camera() {
            let mut state = state();
            let camera = CameraView::fixed(SAN_FRANCISCO, 2000.0);
            state.set_camera(camera.clone());
            assert_eq!(*state.camera(), camera);
        }

        #[test]
        fn test_set_default_location_overrides_follow_user() {
            let mut state = state();
            let london = Coordinate::new(51.5074, -0.1278);
            state.set_default_location(london);
            assert_eq!(*state.camera(), CameraView::fixed(london, 1000.0));
            assert_eq!(state.default_location(), london);
        }

        #[test]
        fn test_set_default_location_overrides_fixed() {
            let mut state = state();
            state.set_camera(CameraView::fixed(GOLDEN_GATE_PARK, 5000.0));
            let london = Coordinate::new(51.5074, -0.1278);
            state.set_default_location(london);
            assert_eq!(*state.camera(), CameraView::fixed(london, 1000.0));
        }
    }

    mod search_query {
        use super::*;

        #[test]
        fn test_query_sets_text_and_dispatches() {
            let mut state = state();
            let outcome = state.update_search_query("1600 Amphitheatre Parkway");
            assert!(matches!(outcome, QueryOutcome::Dispatch(_)));
            assert_eq!(state.address().text(), "1600 Amphitheatre Parkway");
            assert_eq!(state.address_mode(), AddressMode::Query);
            assert!(state.snapshot().searching);
        }

        #[test]
        fn test_suggestions_replace_wholesale_in_service_order() {
            let mut state = state();
            let ticket = dispatched(state.update_search_query("Ma"));
            state.apply_suggestions(ticket, Ok(vec![suggestion("Old")]));

            let ticket = dispatched(state.update_search_query("Mar"));
            let applied = state.apply_suggestions(
                ticket,
                Ok(vec![suggestion("Market St"), suggestion("Marina Blvd")]),
            );

            assert!(applied);
            let titles: Vec<_> = state.suggestions().iter().map(|s| s.title.as_str()).collect();
            assert_eq!(titles, vec!["Market St", "Marina Blvd"]);
        }

        #[test]
        fn test_stale_suggestions_discarded() {
            let mut state = state();
            let older = dispatched(state.update_search_query("Ma"));
            let newer = dispatched(state.update_search_query("Market"));

            assert!(state.apply_suggestions(newer, Ok(vec![suggestion("Market St")])));
            assert!(!state.apply_suggestions(older, Ok(vec![suggestion("Mason St")])));

            assert_eq!(state.suggestions(), &[suggestion("Market St")]);
        }

        #[test]
        fn test_failure_keeps_suggestions() {
            let mut state = state();
            let ticket = dispatched(state.update_search_query("Market"));
            state.apply_suggestions(ticket, Ok(vec![suggestion("Market St")]));

            let ticket = dispatched(state.update_search_query("Market S"));
            state.apply_suggestions(ticket, Err(MapError::SearchFailed("offline".to_string())));

            assert_eq!(state.suggestions(), &[suggestion("Market St")]);
            assert_eq!(
                state.last_error(),
                Some(&MapError::SearchFailed("offline".to_string()))
            );
        }

        #[test]
        fn test_failure_from_empty_state_leaves_no_results() {
            let mut state = state();
            let ticket = dispatched(state.update_search_query("zzz"));
            state.apply_suggestions(ticket, Err(MapError::SearchFailed("mock".to_string())));
            assert!(state.suggestions().is_empty());
        }

        #[test]
        fn test_blank_query_clears_without_dispatch() {
            let mut state = state();
            let pending = dispatched(state.update_search_query("Market"));

            assert_eq!(state.update_search_query("  "), QueryOutcome::Cleared);
            assert!(state.suggestions().is_empty());
            assert!(!state.apply_suggestions(pending, Ok(vec![suggestion("Market St")])));
            assert!(state.suggestions().is_empty());
        }

        #[test]
        fn test_echo_of_resolved_address_does_not_dispatch() {
            let mut state = state();
            let ticket = state.user_tap(GOLDEN_GATE_PARK);
            state.apply_placemark(
                ticket,
                Ok(Placemark::new("Golden Gate Park", "San Francisco", "United States")),
            );

            let outcome =
                state.update_search_query("Golden Gate Park, San Francisco, United States");

            assert_eq!(outcome, QueryOutcome::Unchanged);
            assert_eq!(state.address_mode(), AddressMode::Display);
            assert!(!state.snapshot().searching);
        }

        #[test]
        fn test_edit_after_display_returns_to_query() {
            let mut state = state();
            let ticket = state.user_tap(GOLDEN_GATE_PARK);
            state.apply_placemark(ticket, Ok(Placemark::new("Park", "SF", "US")));

            let outcome = state.update_search_query("Park, SF, U");

            assert!(matches!(outcome, QueryOutcome::Dispatch(_)));
            assert_eq!(state.address_mode(), AddressMode::Query);
        }

        #[test]
        fn test_edit_supersedes_pending_tap_address() {
            let mut state = state();
            let tap = state.user_tap(GOLDEN_GATE_PARK);
            let search = dispatched(state.update_search_query("Market"));

            assert!(!state.snapshot().resolving);
            assert!(!state.apply_placemark(
                tap,
                Ok(Placemark::new("Golden Gate Park", "San Francisco", "United States")),
            ));
            assert!(state.apply_suggestions(search, Ok(vec![suggestion("Market St")])));

            assert_eq!(state.address().text(), "Market");
            assert_eq!(state.address_mode(), AddressMode::Query);
            assert_eq!(state.selected_point(), Some(GOLDEN_GATE_PARK));
            assert_eq!(state.suggestions(), &[suggestion("Market St")]);
        }

        #[test]
        fn test_edit_supersedes_pending_selection() {
            let mut state = state();
            let chosen = suggestion("Golden Gate Park");
            let lookup = state.select_suggestion(&chosen);
            state.update_search_query("Coit");

            assert!(!state.apply_forward_lookup(lookup, &chosen.title, Ok(GOLDEN_GATE_PARK)));
            assert_eq!(state.address().text(), "Coit");
            assert_eq!(state.address_mode(), AddressMode::Query);
            assert!(state.selected_point().is_none());
        }

        #[test]
        fn test_clearing_text_supersedes_pending_tap_address() {
            let mut state = state();
            let tap = state.user_tap(GOLDEN_GATE_PARK);

            assert_eq!(state.update_search_query(""), QueryOutcome::Cleared);
            assert!(!state.apply_placemark(tap, Ok(Placemark::new("Park", "SF", "US"))));
            assert_eq!(state.address().text(), "");
            assert_eq!(state.address_mode(), AddressMode::Query);
        }

        #[test]
        fn test_tap_after_edit_still_resolves() {
            let mut state = state();
            state.update_search_query("Market");
            let tap = state.user_tap(GOLDEN_GATE_PARK);

            assert!(state.apply_placemark(tap, Ok(Placemark::new("Park", "SF", "US"))));
            assert_eq!(state.address().text(), "Park, SF, US");
            assert_eq!(state.address_mode(), AddressMode::Display);
        }

        #[test]
        fn test_dismiss_clears_and_drops_pending() {
            let mut state = state();
            let ticket = dispatched(state.update_search_query("Market"));
            state.dismiss_suggestions();

            assert!(!state.apply_suggestions(ticket, Ok(vec![suggestion("Market St")])));
            assert!(state.suggestions().is_empty());
            assert_eq!(state.address().text(), "Market");
        }
    }

    mod select_suggestion {
        use super::*;

        #[test]
        fn test_success_updates_address_point_and_camera_together() {
            let mut state = state();
            let chosen = suggestion("Golden Gate Park");
            let ticket = state.select_suggestion(&chosen);

            let before = state.snapshot();
            assert!(state.apply_forward_lookup(ticket, &chosen.title, Ok(GOLDEN_GATE_PARK)));
            let after = state.snapshot();

            assert_ne!(before.selected_point, after.selected_point);
            assert_eq!(after.selected_point, Some(GOLDEN_GATE_PARK));
            assert_eq!(after.address.text(), "Golden Gate Park");
            assert_eq!(after.address.mode(), AddressMode::Display);
            assert_eq!(after.camera, CameraView::fixed(GOLDEN_GATE_PARK, 1000.0));
        }

        #[test]
        fn test_failure_leaves_state_unchanged() {
            let mut state = state();
            state.update_search_query("Golden");
            let chosen = suggestion("Golden Gate Park");
            let ticket = state.select_suggestion(&chosen);
            let before = state.snapshot();

            state.apply_forward_lookup(
                ticket,
                &chosen.title,
                Err(MapError::SearchFailed("no result".to_string())),
            );
            let after = state.snapshot();

            assert_eq!(after.selected_point, before.selected_point);
            assert_eq!(after.camera, before.camera);
            assert_eq!(after.address, before.address);
            assert!(after.last_error.is_some());
        }

        #[test]
        fn test_older_selection_cannot_override_newer() {
            let mut state = state();
            let first = state.select_suggestion(&suggestion("A"));
            let second = state.select_suggestion(&suggestion("B"));
            let b = Coordinate::new(2.0, 2.0);

            assert!(state.apply_forward_lookup(second, "B", Ok(b)));
            assert!(!state.apply_forward_lookup(first, "A", Ok(Coordinate::new(1.0, 1.0))));

            assert_eq!(state.selected_point(), Some(b));
            assert_eq!(state.address().text(), "B");
        }

        #[test]
        fn test_locate_address_blank_is_ignored() {
            let mut state = state();
            assert!(state.locate_address("   ").is_none());
            assert!(!state.snapshot().resolving);
        }
    }

    mod reverse_geocode {
        use super::*;

        #[test]
        fn test_resolved_address_format() {
            let mut state = state();
            let ticket = state.resolve_address_for_point(GOLDEN_GATE_PARK);
            state.apply_placemark(
                ticket,
                Ok(Placemark::new("Golden Gate Park", "San Francisco", "United States")),
            );
            assert_eq!(
                state.address().text(),
                "Golden Gate Park, San Francisco, United States"
            );
        }

        #[test]
        fn test_all_empty_components_keep_separators() {
            let mut state = state();
            let ticket = state.resolve_address_for_point(Coordinate::new(0.0, 0.0));
            state.apply_placemark(ticket, Ok(Placemark::default()));
            assert_eq!(state.address().text(), ", , ");
        }

        #[test]
        fn test_failure_leaves_address_unchanged() {
            let mut state = state();
            state.update_search_query("X");
            let ticket = state.resolve_address_for_point(Coordinate::new(100.0, -200.0));
            state.apply_placemark(ticket, Err(MapError::GeocodeFailed("invalid".to_string())));
            assert_eq!(state.address().text(), "X");
        }

        #[test]
        fn test_user_tap_selects_then_resolves() {
            let mut state = state();
            let ticket = state.user_tap(GOLDEN_GATE_PARK);

            assert_eq!(state.selected_point(), Some(GOLDEN_GATE_PARK));
            assert_eq!(ticket.kind(), RequestKind::ReverseGeocode);
            assert!(state.snapshot().resolving);
        }

        #[test]
        fn test_stale_tap_address_discarded() {
            let mut state = state();
            let first = state.user_tap(Coordinate::new(1.0, 1.0));
            let second = state.user_tap(Coordinate::new(2.0, 2.0));

            state.apply_placemark(second, Ok(Placemark::new("Second", "", "")));
            state.apply_placemark(first, Ok(Placemark::new("First", "", "")));

            assert_eq!(state.address().text(), "Second, , ");
        }

        #[test]
        fn test_reverse_geocode_independent_of_search() {
            let mut state = state();
            let search = dispatched(state.update_search_query("Market"));
            let reverse = state.user_tap(GOLDEN_GATE_PARK);

            assert!(state.apply_placemark(reverse, Ok(Placemark::new("Park", "SF", "US"))));
            assert!(state.apply_suggestions(search, Ok(vec![suggestion("Market St")])));
            assert_eq!(state.suggestions().len(), 1);
        }
    }
}
