//! Presentation layer over a map session.
//!
//! [`MapSurface`] holds no state of its own. Each [`SurfaceFrame`] is
//! derived from the latest [`MapSnapshot`], and every gesture is turned
//! into a session command.

use serde::Serialize;
use tracing::debug;

use crate::coord::{Coordinate, GeoBounds};
use crate::error::SessionError;
use crate::map::{AddressMode, MapSnapshot};
use crate::platform::SearchSuggestion;
use crate::session::MapHandle;

/// Radius of the circle drawn around the selected point (meters).
pub const DEFAULT_MARKER_RADIUS_M: f64 = 100.0;

/// Height of a terminal cell relative to its width.
pub const TERMINAL_CELL_ASPECT: f64 = 2.0;

/// Presentation options.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    /// Radius of the selection circle in meters.
    pub marker_radius_m: f64,
    /// Whether the search field and suggestion list are shown.
    pub show_search_field: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            marker_radius_m: DEFAULT_MARKER_RADIUS_M,
            show_search_field: true,
        }
    }
}

impl SurfaceConfig {
    /// Set the selection circle radius.
    pub fn with_marker_radius(mut self, radius_m: f64) -> Self {
        self.marker_radius_m = radius_m;
        self
    }

    /// Show or hide the search field.
    pub fn with_search_field(mut self, show: bool) -> Self {
        self.show_search_field = show;
        self
    }
}

/// Size of the drawable map area in cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Columns.
    pub width: u16,
    /// Rows.
    pub height: u16,
    /// Height of one cell divided by its width.
    pub cell_aspect: f64,
}

impl Viewport {
    /// A viewport of square cells.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cell_aspect: 1.0,
        }
    }

    /// A viewport of terminal cells.
    pub fn terminal(width: u16, height: u16) -> Self {
        Self::new(width, height).with_cell_aspect(TERMINAL_CELL_ASPECT)
    }

    /// Set the cell aspect ratio.
    pub fn with_cell_aspect(mut self, cell_aspect: f64) -> Self {
        self.cell_aspect = cell_aspect;
        self
    }

    /// Ground size covered by this viewport for a camera distance.
    ///
    /// The shorter side spans `distance_m`; the longer side is scaled by
    /// the physical aspect ratio.
    pub fn ground_size(&self, distance_m: f64) -> (f64, f64) {
        let physical_w = f64::from(self.width.max(1));
        let physical_h = f64::from(self.height.max(1)) * self.cell_aspect;
        if physical_w >= physical_h {
            (distance_m * physical_w / physical_h, distance_m)
        } else {
            (distance_m, distance_m * physical_h / physical_w)
        }
    }

    /// Fractional position of the center of a cell.
    fn fraction(&self, column: u16, row: u16) -> (f64, f64) {
        let fx = (f64::from(column) + 0.5) / f64::from(self.width.max(1));
        let fy = (f64::from(row) + 0.5) / f64::from(self.height.max(1));
        (fx, fy)
    }
}

/// A point drawn on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
    /// Where the marker sits.
    pub coordinate: Coordinate,
    /// Radius of the surrounding circle, if one is drawn.
    pub radius_m: Option<f64>,
}

/// One entry in the suggestion list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionRow {
    /// Position in the service's order.
    pub index: usize,
    /// Primary line.
    pub title: String,
    /// Secondary line.
    pub subtitle: String,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceFrame {
    /// Visible geographic region.
    pub region: GeoBounds,
    /// Device position.
    pub user_marker: Option<Marker>,
    /// Selected point with its radius circle.
    pub selection_marker: Option<Marker>,
    /// Contents of the search field.
    pub search_text: String,
    /// Whether the search text is a resolved address.
    pub showing_address: bool,
    /// Suggestions in service order.
    pub suggestions: Vec<SuggestionRow>,
    /// Whether the suggestion list is shown.
    pub suggestions_visible: bool,
    /// A lookup is in flight.
    pub busy: bool,
    /// Latest search or geocoding failure, for a status line.
    pub status: Option<String>,
}

impl SurfaceFrame {
    /// Derive a frame from a map snapshot.
    pub fn derive(snapshot: &MapSnapshot, config: &SurfaceConfig, viewport: Viewport) -> Self {
        let center = snapshot.camera_center();
        let (width_m, height_m) = viewport.ground_size(snapshot.camera.distance_m());

        let suggestions: Vec<SuggestionRow> = snapshot
            .suggestions
            .iter()
            .enumerate()
            .map(|(index, s)| SuggestionRow {
                index,
                title: s.title.clone(),
                subtitle: s.subtitle.clone(),
            })
            .collect();

        let suggestions_visible = config.show_search_field
            && snapshot.address.mode() == AddressMode::Query
            && !suggestions.is_empty();

        Self {
            region: GeoBounds::around(&center, width_m, height_m),
            user_marker: snapshot.user_location.map(|coordinate| Marker {
                coordinate,
                radius_m: None,
            }),
            selection_marker: snapshot.selected_point.map(|coordinate| Marker {
                coordinate,
                radius_m: Some(config.marker_radius_m),
            }),
            search_text: snapshot.address.text().to_string(),
            showing_address: snapshot.address.mode() == AddressMode::Display,
            suggestions,
            suggestions_visible,
            busy: snapshot.searching || snapshot.resolving,
            status: snapshot.last_error.as_ref().map(ToString::to_string),
        }
    }
}

/// Renders a session and forwards gestures to it.
#[derive(Debug, Clone)]
pub struct MapSurface {
    handle: MapHandle,
    config: SurfaceConfig,
}

impl MapSurface {
    /// Create a surface over a session handle.
    pub fn new(handle: MapHandle, config: SurfaceConfig) -> Self {
        Self { handle, config }
    }

    /// The underlying session handle.
    pub fn handle(&self) -> &MapHandle {
        &self.handle
    }

    /// Presentation options.
    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Derive the current frame.
    pub fn frame(&self, viewport: Viewport) -> SurfaceFrame {
        SurfaceFrame::derive(&self.handle.map_snapshot(), &self.config, viewport)
    }

    /// The surface became visible: ask for location permission.
    pub fn appear(&self) -> Result<(), SessionError> {
        self.handle.request_permission()
    }

    /// Tap at a cell. Returns the coordinate that was tapped.
    pub fn tap(
        &self,
        viewport: Viewport,
        column: u16,
        row: u16,
    ) -> Result<Coordinate, SessionError> {
        let frame = self.frame(viewport);
        let (fx, fy) = viewport.fraction(column, row);
        let coordinate = frame.region.coordinate_at(fx, fy);
        debug!(column, row, coordinate = %coordinate, "Map tapped");
        self.handle.user_tap(coordinate)?;
        Ok(coordinate)
    }

    /// Choose the suggestion at `index` in the visible list.
    ///
    /// Returns the chosen suggestion, or `None` if the list is hidden or
    /// the index is out of range.
    pub fn choose_suggestion(
        &self,
        index: usize,
    ) -> Result<Option<SearchSuggestion>, SessionError> {
        let snapshot = self.handle.map_snapshot();
        if !snapshot.address.is_query() {
            return Ok(None);
        }
        let Some(suggestion) = snapshot.suggestions.get(index).cloned() else {
            return Ok(None);
        };
        self.handle.select_suggestion(suggestion.clone())?;
        Ok(Some(suggestion))
    }

    /// The search field text changed.
    pub fn edit_search(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.handle.update_search_query(text)
    }

    /// Hide the suggestion list.
    pub fn dismiss(&self) -> Result<(), SessionError> {
        self.handle.dismiss_suggestions()
    }
}
