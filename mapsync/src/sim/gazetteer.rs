//! In-memory place list answering search and geocoding requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use tracing::debug;

use crate::coord::{distance_meters, Coordinate};
use crate::platform::{
    BoxFuture, Geocoder, Placemark, PlatformError, SearchService, SearchSuggestion,
};

/// Places farther than this from a coordinate do not describe it (meters).
pub const REVERSE_GEOCODE_RADIUS_M: f64 = 2_000.0;

/// Maximum number of autocomplete suggestions returned.
pub const MAX_SUGGESTIONS: usize = 8;

/// Fragments shorter than this answer proportionally slower.
const FAST_FRAGMENT_LEN: usize = 5;

/// A named place.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    /// Place name.
    pub name: String,
    /// City or town.
    pub locality: String,
    /// Country.
    pub country: String,
    /// Location.
    pub coordinate: Coordinate,
}

impl Place {
    /// Create a place.
    pub fn new(
        name: impl Into<String>,
        locality: impl Into<String>,
        country: impl Into<String>,
        coordinate: Coordinate,
    ) -> Self {
        Self {
            name: name.into(),
            locality: locality.into(),
            country: country.into(),
            coordinate,
        }
    }

    fn subtitle(&self) -> String {
        format!("{}, {}", self.locality, self.country)
    }

    fn suggestion(&self) -> SearchSuggestion {
        SearchSuggestion::new(self.name.clone(), self.subtitle())
    }

    fn placemark(&self) -> Placemark {
        Placemark::new(
            self.name.clone(),
            self.locality.clone(),
            self.country.clone(),
        )
    }
}

/// Search and geocoding over a fixed list of places.
///
/// Every reply waits for the configured latency first. Autocomplete for
/// short fragments waits longer, so a burst of keystrokes produces replies
/// in the opposite order from the queries.
pub struct Gazetteer {
    places: Vec<Place>,
    latency: Duration,
    offline: AtomicBool,
}

impl Gazetteer {
    /// Create a gazetteer with no latency.
    pub fn new(places: Vec<Place>) -> Self {
        Self {
            places,
            latency: Duration::ZERO,
            offline: AtomicBool::new(false),
        }
    }

    /// A handful of San Francisco landmarks plus a few world cities.
    pub fn bay_area() -> Self {
        let sf = |name: &str, lat: f64, lon: f64| {
            Place::new(name, "San Francisco", "United States", Coordinate::new(lat, lon))
        };
        Self::new(vec![
            sf("Golden Gate Park", 37.7694, -122.4862),
            sf("Golden Gate Bridge", 37.8199, -122.4783),
            sf("Ferry Building", 37.7955, -122.3937),
            sf("Coit Tower", 37.8024, -122.4058),
            sf("Alcatraz Island", 37.8267, -122.4230),
            sf("Lombard Street", 37.8021, -122.4187),
            sf("Mission Dolores Park", 37.7596, -122.4269),
            sf("Market Street", 37.7890, -122.4010),
            sf("Oracle Park", 37.7786, -122.3893),
            sf("Twin Peaks", 37.7544, -122.4477),
            sf("Palace of Fine Arts", 37.8029, -122.4484),
            sf("Union Square", 37.7880, -122.4075),
            sf("City Hall", 37.7793, -122.4193),
            Place::new("Eiffel Tower", "Paris", "France", Coordinate::new(48.8584, 2.2945)),
            Place::new("Big Ben", "London", "United Kingdom", Coordinate::new(51.5007, -0.1246)),
            Place::new(
                "Times Square",
                "New York",
                "United States",
                Coordinate::new(40.7580, -73.9855),
            ),
            Place::new(
                "Sydney Opera House",
                "Sydney",
                "Australia",
                Coordinate::new(-33.8568, 151.2153),
            ),
        ])
    }

    /// Set the base reply latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every request fail as unavailable until turned back on.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// All known places.
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// Matching places, names starting with the fragment first.
    pub fn complete(&self, fragment: &str) -> Vec<SearchSuggestion> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut prefix = Vec::new();
        let mut contains = Vec::new();
        for place in &self.places {
            let name = place.name.to_lowercase();
            if name.starts_with(&needle) {
                prefix.push(place);
            } else if name.contains(&needle) || place.locality.to_lowercase().starts_with(&needle) {
                contains.push(place);
            }
        }

        prefix
            .into_iter()
            .chain(contains)
            .take(MAX_SUGGESTIONS)
            .map(Place::suggestion)
            .collect()
    }

    /// Exact match of a suggestion against the place list.
    pub fn find(&self, suggestion: &SearchSuggestion) -> Option<Coordinate> {
        self.places
            .iter()
            .find(|p| p.name == suggestion.title && p.subtitle() == suggestion.subtitle)
            .map(|p| p.coordinate)
    }

    /// Find the place a free-form address refers to.
    pub fn locate(&self, address: &str) -> Option<Coordinate> {
        let address = address.trim().to_lowercase();
        if address.is_empty() {
            return None;
        }
        self.places
            .iter()
            .find(|p| {
                let name = p.name.to_lowercase();
                address == name
                    || address == p.placemark().formatted_address().to_lowercase()
                    || address.starts_with(&format!("{},", name))
            })
            .map(|p| p.coordinate)
    }

    /// Describe a coordinate.
    ///
    /// The nearest place within [`REVERSE_GEOCODE_RADIUS_M`] if there is
    /// one; otherwise the point is treated as open water and named after
    /// its ocean.
    pub fn describe(&self, coordinate: Coordinate) -> Result<Placemark, PlatformError> {
        if !coordinate.is_valid() {
            return Err(PlatformError::Failed(format!(
                "Invalid coordinate ({}, {})",
                coordinate.latitude, coordinate.longitude
            )));
        }

        let nearest = self
            .places
            .iter()
            .map(|p| (p, distance_meters(&coordinate, &p.coordinate)))
            .filter(|(_, d)| *d <= REVERSE_GEOCODE_RADIUS_M)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        Ok(match nearest {
            Some((place, _)) => place.placemark(),
            None => Placemark {
                name: Some(ocean_name(coordinate).to_string()),
                locality: None,
                country: None,
            },
        })
    }

    fn check_online(&self) -> Result<(), PlatformError> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(PlatformError::Unavailable("network offline".to_string()));
        }
        Ok(())
    }

    fn autocomplete_latency(&self, fragment: &str) -> Duration {
        let len = fragment.chars().count();
        let factor = FAST_FRAGMENT_LEN.saturating_sub(len).max(1) as u32;
        self.latency * factor
    }
}

impl SearchService for Gazetteer {
    fn autocomplete(
        &self,
        fragment: String,
    ) -> BoxFuture<'_, Result<Vec<SearchSuggestion>, PlatformError>> {
        async move {
            tokio::time::sleep(self.autocomplete_latency(&fragment)).await;
            self.check_online()?;
            let suggestions = self.complete(&fragment);
            debug!(fragment = %fragment, count = suggestions.len(), "Autocomplete answered");
            Ok(suggestions)
        }
        .boxed()
    }

    fn lookup(
        &self,
        suggestion: SearchSuggestion,
    ) -> BoxFuture<'_, Result<Option<Coordinate>, PlatformError>> {
        async move {
            tokio::time::sleep(self.latency).await;
            self.check_online()?;
            Ok(self.find(&suggestion))
        }
        .boxed()
    }
}

impl Geocoder for Gazetteer {
    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'_, Result<Option<Placemark>, PlatformError>> {
        async move {
            tokio::time::sleep(self.latency).await;
            self.check_online()?;
            self.describe(coordinate).map(Some)
        }
        .boxed()
    }

    fn forward_geocode(
        &self,
        address: String,
    ) -> BoxFuture<'_, Result<Option<Coordinate>, PlatformError>> {
        async move {
            tokio::time::sleep(self.latency).await;
            self.check_online()?;
            Ok(self.locate(&address))
        }
        .boxed()
    }
}

/// Coarse ocean basin for a coordinate.
fn ocean_name(coordinate: Coordinate) -> &'static str {
    let Coordinate {
        latitude: lat,
        longitude: lon,
    } = coordinate;
    let north = lat >= 0.0;

    if lat >= 66.0 {
        "Arctic Ocean"
    } else if lat <= -60.0 {
        "Southern Ocean"
    } else if (-70.0..20.0).contains(&lon) {
        if north {
            "North Atlantic Ocean"
        } else {
            "South Atlantic Ocean"
        }
    } else if (20.0..120.0).contains(&lon) && lat < 25.0 {
        "Indian Ocean"
    } else if north {
        "North Pacific Ocean"
    } else {
        "South Pacific Ocean"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod reverse {
        use super::*;

        #[test]
        fn test_golden_gate_park() {
            let placemark = Gazetteer::bay_area()
                .describe(Coordinate::new(37.7689, -122.4830))
                .unwrap();
            assert_eq!(
                placemark.formatted_address(),
                "Golden Gate Park, San Francisco, United States"
            );
        }

        #[test]
        fn test_open_water() {
            let placemark = Gazetteer::bay_area()
                .describe(Coordinate::new(0.0, 0.0))
                .unwrap();
            assert_eq!(placemark.formatted_address(), "North Atlantic Ocean, , ");
        }

        #[test]
        fn test_invalid_coordinate_fails() {
            let result = Gazetteer::bay_area().describe(Coordinate::new(100.0, -200.0));
            assert!(matches!(result, Err(PlatformError::Failed(_))));
        }

        #[test]
        fn test_ocean_basins() {
            assert_eq!(ocean_name(Coordinate::new(-20.0, -20.0)), "South Atlantic Ocean");
            assert_eq!(ocean_name(Coordinate::new(-10.0, 80.0)), "Indian Ocean");
            assert_eq!(ocean_name(Coordinate::new(30.0, -150.0)), "North Pacific Ocean");
            assert_eq!(ocean_name(Coordinate::new(80.0, 0.0)), "Arctic Ocean");
            assert_eq!(ocean_name(Coordinate::new(-70.0, 0.0)), "Southern Ocean");
        }
    }

    mod search {
        use super::*;

        #[test]
        fn test_prefix_matches_rank_first() {
            let titles: Vec<_> = Gazetteer::bay_area()
                .complete("gol")
                .into_iter()
                .map(|s| s.title)
                .collect();
            assert_eq!(titles, vec!["Golden Gate Park", "Golden Gate Bridge"]);
        }

        #[test]
        fn test_substring_matches_follow() {
            let titles: Vec<_> = Gazetteer::bay_area()
                .complete("park")
                .into_iter()
                .map(|s| s.title)
                .collect();
            assert_eq!(
                titles,
                vec!["Golden Gate Park", "Mission Dolores Park", "Oracle Park"]
            );
        }

        #[test]
        fn test_blank_fragment_has_no_suggestions() {
            assert!(Gazetteer::bay_area().complete("   ").is_empty());
        }

        #[test]
        fn test_find_round_trips_suggestion() {
            let gazetteer = Gazetteer::bay_area();
            let suggestion = gazetteer.complete("Coit").remove(0);
            assert_eq!(
                gazetteer.find(&suggestion),
                Some(Coordinate::new(37.8024, -122.4058))
            );
            assert_eq!(gazetteer.find(&SearchSuggestion::new("Coit Tower", "Paris, France")), None);
        }

        #[test]
        fn test_locate_free_text() {
            let gazetteer = Gazetteer::bay_area();
            assert_eq!(
                gazetteer.locate("eiffel tower"),
                Some(Coordinate::new(48.8584, 2.2945))
            );
            assert_eq!(
                gazetteer.locate("Big Ben, London, United Kingdom"),
                Some(Coordinate::new(51.5007, -0.1246))
            );
            assert_eq!(gazetteer.locate("Atlantis"), None);
        }

        #[test]
        fn test_short_fragments_are_slower() {
            let gazetteer = Gazetteer::new(Vec::new()).with_latency(Duration::from_millis(10));
            assert_eq!(gazetteer.autocomplete_latency("G"), Duration::from_millis(40));
            assert_eq!(gazetteer.autocomplete_latency("Golden"), Duration::from_millis(10));
        }
    }

    mod services {
        use super::*;

        #[tokio::test]
        async fn test_offline_fails_as_unavailable() {
            let gazetteer = Gazetteer::bay_area();
            gazetteer.set_offline(true);
            let result = gazetteer.autocomplete("Gol".to_string()).await;
            assert_eq!(
                result,
                Err(PlatformError::Unavailable("network offline".to_string()))
            );

            gazetteer.set_offline(false);
            assert!(!gazetteer.autocomplete("Gol".to_string()).await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_reverse_geocode_service() {
            let placemark = Gazetteer::bay_area()
                .reverse_geocode(Coordinate::new(37.8024, -122.4058))
                .await
                .unwrap();
            assert_eq!(placemark.and_then(|p| p.name), Some("Coit Tower".to_string()));
        }
    }
}
