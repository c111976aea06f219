//! Map canvas widget.
//!
//! Plots the visible region in degrees: longitude on x, latitude on y.
//! The selected point gets a ring of its configured radius, the device
//! position a single dot.

use mapsync::coord::offset_meters;
use mapsync::surface::SurfaceFrame;
use mapsync::Coordinate;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Stylize},
    symbols,
    text::Line,
    widgets::{
        canvas::{Canvas, Points},
        Widget,
    },
};

/// Points on the selection ring.
const RING_POINTS: usize = 64;

/// The map area of the demo screen.
pub struct MapCanvas<'a> {
    frame: &'a SurfaceFrame,
}

impl<'a> MapCanvas<'a> {
    pub fn new(frame: &'a SurfaceFrame) -> Self {
        Self { frame }
    }
}

/// `(lon, lat)` pairs on a circle of `radius_m` around `center`.
fn ring(center: &Coordinate, radius_m: f64, points: usize) -> Vec<(f64, f64)> {
    (0..points)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / points as f64;
            let p = offset_meters(center, radius_m * angle.cos(), radius_m * angle.sin());
            (p.longitude, p.latitude)
        })
        .collect()
}

impl Widget for MapCanvas<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let region = self.frame.region;
        let selection = self.frame.selection_marker;
        let user = self.frame.user_marker;

        let ring_coords = selection
            .and_then(|m| m.radius_m.map(|r| ring(&m.coordinate, r, RING_POINTS)))
            .unwrap_or_default();

        Canvas::default()
            .x_bounds([region.min_lon, region.max_lon])
            .y_bounds([region.min_lat, region.max_lat])
            .marker(symbols::Marker::Braille)
            .paint(|ctx| {
                let center = region.center();
                ctx.print(
                    region.min_lon,
                    region.min_lat,
                    Line::from(center.to_string()).dark_gray(),
                );

                if !ring_coords.is_empty() {
                    ctx.draw(&Points {
                        coords: &ring_coords,
                        color: Color::Red,
                    });
                }
                ctx.layer();

                if let Some(marker) = selection {
                    let c = marker.coordinate;
                    ctx.print(c.longitude, c.latitude, Line::from("+").red().bold());
                }
                if let Some(marker) = user {
                    let c = marker.coordinate;
                    ctx.print(c.longitude, c.latitude, Line::from("@").blue().bold());
                }
            })
            .render(area, buf);
    }
}
