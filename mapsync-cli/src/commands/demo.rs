//! `mapsync demo`: interactive terminal map.
//!
//! Runs a session against the simulated platform and drives it through a
//! [`MapSurface`]. The terminal belongs to the UI, so logs go to a file.

use std::time::Duration;

use mapsync::config::CONFIG_DIR_NAME;
use mapsync::surface::{MapSurface, SurfaceFrame, Viewport};
use tracing::{info, warn};

use super::common::{build_runtime, parse_coordinate, start_logging, GlobalOptions, RunningSession};
use crate::error::CliError;
use crate::ui::{MapScreen, ScreenEvent, ScreenLayout, ScreenView};

/// Redraw interval when no input arrives.
const TICK_RATE: Duration = Duration::from_millis(100);

/// Arguments for the demo command.
#[derive(Debug, Clone, Default)]
pub struct DemoArgs {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub deny_permission: bool,
}

/// Run the demo command.
pub fn run(options: &GlobalOptions, args: DemoArgs) -> Result<(), CliError> {
    let mut config = options.load_config()?;
    if args.deny_permission {
        config.simulation.grant_permission = false;
    }
    let start = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => parse_coordinate(lat, lon)?,
        (None, None) => config.map.default_location,
        _ => {
            return Err(CliError::InvalidArgument(
                "--lat and --lon must be given together".to_string(),
            ))
        }
    };
    if config.logging.directory.is_none() {
        config.logging.directory = Some(std::env::temp_dir().join(CONFIG_DIR_NAME));
    }

    let logging = start_logging(&config)?;
    let runtime = build_runtime()?;
    let session = {
        let _enter = runtime.enter();
        RunningSession::spawn(&config, start)
    };
    info!(start = %start, grant = config.simulation.grant_permission, "Demo started");

    let surface = MapSurface::new(session.handle.clone(), config.surface_config());
    let result = surface
        .appear()
        .map_err(CliError::from)
        .and_then(|()| run_screen(&surface));

    runtime.block_on(session.stop());
    if let Some(path) = logging.log_file() {
        eprintln!("Log written to {}", path.display());
    }
    result
}

fn run_screen(surface: &MapSurface) -> Result<(), CliError> {
    let mut screen = MapScreen::new()?;
    let mut input = SearchInput::default();

    loop {
        let layout = screen.layout()?;
        let viewport = Viewport::terminal(layout.map_inner.width, layout.map_inner.height);
        let frame = surface.frame(viewport);
        let location = surface.handle().location_snapshot();
        input.sync(&frame);

        screen.draw(
            &layout,
            &ScreenView {
                frame: &frame,
                location: &location,
                input: input.text(),
                highlighted: input.highlighted(),
            },
        )?;

        let Some(event) = screen.poll_event(TICK_RATE)? else {
            continue;
        };
        if event == ScreenEvent::Quit {
            return Ok(());
        }
        handle_event(surface, &mut input, &frame, &layout, viewport, event)?;
    }
}

fn handle_event(
    surface: &MapSurface,
    input: &mut SearchInput,
    frame: &SurfaceFrame,
    layout: &ScreenLayout,
    viewport: Viewport,
    event: ScreenEvent,
) -> Result<(), CliError> {
    match event {
        ScreenEvent::Char(_) | ScreenEvent::Backspace => {
            if let Some(text) = input.edit(&event) {
                surface.edit_search(text)?;
            }
        }
        ScreenEvent::Up => input.move_highlight(-1, frame.suggestions.len()),
        ScreenEvent::Down => input.move_highlight(1, frame.suggestions.len()),
        ScreenEvent::Enter => {
            if frame.suggestions_visible {
                if let Some(chosen) = surface.choose_suggestion(input.highlighted())? {
                    info!(title = %chosen.title, "Suggestion chosen");
                }
            } else if !frame.showing_address {
                surface.handle().locate_address(input.text())?;
            }
        }
        ScreenEvent::Escape => surface.dismiss()?,
        ScreenEvent::ToggleTracking => {
            let location = surface.handle().location_snapshot();
            if location.tracking {
                surface.handle().stop_tracking()?;
            } else if location.authorization.is_authorized() {
                surface.handle().start_tracking()?;
            } else {
                warn!(authorization = ?location.authorization, "Tracking needs permission");
                surface.appear()?;
            }
        }
        ScreenEvent::Click { column, row } => {
            let covered = frame.suggestions_visible
                && layout.suggestions(frame.suggestions.len()).contains((column, row).into());
            if covered {
                return Ok(());
            }
            if let Some((x, y)) = layout.map_cell(column, row) {
                surface.tap(viewport, x, y)?;
            }
        }
        ScreenEvent::Quit | ScreenEvent::Resize => {}
    }
    Ok(())
}

/// Local copy of the search field text.
///
/// Keystrokes edit this buffer and the whole text is sent to the session,
/// so fast typing never builds on a snapshot that lags behind. A resolved
/// address replaces the buffer when it shows up.
#[derive(Debug, Default)]
struct SearchInput {
    text: String,
    highlighted: usize,
    shown_address: Option<String>,
}

impl SearchInput {
    fn text(&self) -> &str {
        &self.text
    }

    fn highlighted(&self) -> usize {
        self.highlighted
    }

    /// Adopt a newly displayed address and keep the highlight in range.
    fn sync(&mut self, frame: &SurfaceFrame) {
        if frame.showing_address {
            if self.shown_address.as_deref() != Some(frame.search_text.as_str()) {
                self.text = frame.search_text.clone();
                self.shown_address = Some(frame.search_text.clone());
                self.highlighted = 0;
            }
        } else {
            self.shown_address = None;
        }
        if self.highlighted >= frame.suggestions.len() {
            self.highlighted = frame.suggestions.len().saturating_sub(1);
        }
    }

    /// Apply a keystroke. Returns the new text if it changed.
    fn edit(&mut self, event: &ScreenEvent) -> Option<String> {
        match event {
            ScreenEvent::Char(c) => self.text.push(*c),
            ScreenEvent::Backspace => {
                self.text.pop()?;
            }
            _ => return None,
        }
        self.highlighted = 0;
        Some(self.text.clone())
    }

    fn move_highlight(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.highlighted = 0;
            return;
        }
        self.highlighted = self.highlighted.saturating_add_signed(delta).min(len - 1);
    }
}
