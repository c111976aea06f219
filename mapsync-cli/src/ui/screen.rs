//! Terminal ownership, layout and input for the map demo.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use mapsync::location::LocationSnapshot;
use mapsync::surface::SurfaceFrame;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders},
    Terminal,
};

use super::widgets::{MapCanvas, SearchField, StatusBar, SuggestionList};

/// Input the demo reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    Quit,
    Char(char),
    Backspace,
    Up,
    Down,
    Enter,
    Escape,
    ToggleTracking,
    Click { column: u16, row: u16 },
    Resize,
}

/// Screen regions for a given terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub search: Rect,
    pub map: Rect,
    /// Drawing area inside the map border; taps are relative to this.
    pub map_inner: Rect,
    pub status: Rect,
}

impl ScreenLayout {
    pub fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);
        let map = chunks[1];
        Self {
            search: chunks[0],
            map,
            map_inner: map_block().inner(map),
            status: chunks[2],
        }
    }

    /// Area of the suggestion overlay for `count` rows.
    pub fn suggestions(&self, count: usize) -> Rect {
        let wanted = (count as u16).saturating_add(2);
        Rect {
            height: wanted.min(self.map.height),
            ..self.map
        }
    }

    /// Cell inside the map drawing area, relative to its top-left corner.
    pub fn map_cell(&self, column: u16, row: u16) -> Option<(u16, u16)> {
        let inner = self.map_inner;
        let inside = column >= inner.x
            && column < inner.x + inner.width
            && row >= inner.y
            && row < inner.y + inner.height;
        inside.then(|| (column - inner.x, row - inner.y))
    }
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Map ")
}

/// Everything drawn in one frame.
pub struct ScreenView<'a> {
    pub frame: &'a SurfaceFrame,
    pub location: &'a LocationSnapshot,
    pub input: &'a str,
    pub highlighted: usize,
}

/// Owns the terminal for the lifetime of the demo.
///
/// Raw mode, the alternate screen and mouse capture are undone on drop.
pub struct MapScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl MapScreen {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }

    /// Layout for the current terminal size.
    pub fn layout(&self) -> io::Result<ScreenLayout> {
        let size = self.terminal.size()?;
        Ok(ScreenLayout::new(Rect::new(0, 0, size.width, size.height)))
    }

    pub fn draw(&mut self, layout: &ScreenLayout, view: &ScreenView<'_>) -> io::Result<()> {
        self.terminal.draw(|f| {
            let frame = view.frame;

            f.render_widget(
                SearchField::new(view.input, frame.showing_address, frame.busy),
                layout.search,
            );

            f.render_widget(map_block(), layout.map);
            f.render_widget(MapCanvas::new(frame), layout.map_inner);

            if frame.suggestions_visible {
                f.render_widget(
                    SuggestionList::new(&frame.suggestions, view.highlighted),
                    layout.suggestions(frame.suggestions.len()),
                );
            }

            f.render_widget(
                StatusBar::new(view.location, frame.busy, frame.status.as_deref()),
                layout.status,
            );
        })?;
        Ok(())
    }

    /// Wait up to `timeout` for input.
    pub fn poll_event(&self, timeout: Duration) -> io::Result<Option<ScreenEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        Ok(match event::read()? {
            Event::Key(key) => translate_key(key),
            Event::Mouse(mouse) => translate_mouse(mouse),
            Event::Resize(_, _) => Some(ScreenEvent::Resize),
            _ => None,
        })
    }
}

impl Drop for MapScreen {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

fn translate_key(key: KeyEvent) -> Option<ScreenEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(ScreenEvent::Quit);
    }
    Some(match key.code {
        KeyCode::Char(c) => ScreenEvent::Char(c),
        KeyCode::Backspace => ScreenEvent::Backspace,
        KeyCode::Up => ScreenEvent::Up,
        KeyCode::Down => ScreenEvent::Down,
        KeyCode::Enter => ScreenEvent::Enter,
        KeyCode::Esc => ScreenEvent::Escape,
        KeyCode::F(2) => ScreenEvent::ToggleTracking,
        KeyCode::F(10) => ScreenEvent::Quit,
        _ => return None,
    })
}

fn translate_mouse(mouse: MouseEvent) -> Option<ScreenEvent> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(ScreenEvent::Click {
            column: mouse.column,
            row: mouse.row,
        }),
        _ => None,
    }
}
