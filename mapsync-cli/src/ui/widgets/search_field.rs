//! Search field widget.
//!
//! One line of text that is either the user's query or the resolved
//! address of the selected point.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// The query/address field.
pub struct SearchField<'a> {
    text: &'a str,
    showing_address: bool,
    busy: bool,
}

impl<'a> SearchField<'a> {
    pub fn new(text: &'a str, showing_address: bool, busy: bool) -> Self {
        Self {
            text,
            showing_address,
            busy,
        }
    }

    fn title(&self) -> &'static str {
        match (self.showing_address, self.busy) {
            (_, true) => " Search (working...) ",
            (true, false) => " Address ",
            (false, false) => " Search ",
        }
    }
}

impl Widget for SearchField<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.showing_address {
            Color::Green
        } else {
            Color::Cyan
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(Span::styled(
                self.title(),
                Style::default().fg(border).add_modifier(Modifier::BOLD),
            ));

        let line = if self.text.is_empty() {
            Line::from(Span::styled(
                "Type to search, click the map to drop a pin",
                Style::default().fg(Color::DarkGray),
            ))
        } else if self.showing_address {
            Line::from(Span::styled(self.text, Style::default().fg(Color::White)))
        } else {
            Line::from(vec![
                Span::styled(self.text, Style::default().fg(Color::White)),
                Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ])
        };

        Paragraph::new(line).block(block).render(area, buf);
    }
}
