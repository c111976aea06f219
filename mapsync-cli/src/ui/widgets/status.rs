//! Status bar widget.

use mapsync::location::LocationSnapshot;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// One-line summary of location and lookup state.
pub struct StatusBar<'a> {
    location: &'a LocationSnapshot,
    busy: bool,
    map_error: Option<&'a str>,
}

impl<'a> StatusBar<'a> {
    pub fn new(location: &'a LocationSnapshot, busy: bool, map_error: Option<&'a str>) -> Self {
        Self {
            location,
            busy,
            map_error,
        }
    }

    fn line(&self) -> Line<'a> {
        let separator = || Span::styled(" | ", Style::default().fg(Color::DarkGray));
        let auth_color = if self.location.authorization.is_authorized() {
            Color::Green
        } else if self.location.authorization.is_refused() {
            Color::Red
        } else {
            Color::Yellow
        };

        let mut spans = vec![
            Span::styled(
                self.location.authorization.as_str(),
                Style::default().fg(auth_color),
            ),
            separator(),
            if self.location.tracking {
                Span::styled("tracking", Style::default().fg(Color::Green))
            } else {
                Span::styled("not tracking", Style::default().fg(Color::DarkGray))
            },
        ];

        if let Some(current) = self.location.current {
            spans.push(separator());
            spans.push(Span::raw(current.to_string()));
        }
        if self.busy {
            spans.push(separator());
            spans.push(Span::styled("looking up...", Style::default().fg(Color::Yellow)));
        }

        let error = self
            .map_error
            .map(str::to_string)
            .or_else(|| self.location.last_error.as_ref().map(ToString::to_string));
        if let Some(error) = error {
            spans.push(separator());
            spans.push(Span::styled(
                error,
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }

        spans.push(Span::styled(
            "   F2 tracking  Esc dismiss  Ctrl-C quit",
            Style::default().fg(Color::DarkGray),
        ));
        Line::from(spans)
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.line()).render(area, buf);
    }
}
