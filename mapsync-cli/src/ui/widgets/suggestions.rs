//! Suggestion list overlay.

use mapsync::surface::SuggestionRow;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Widget},
};

/// Autocomplete suggestions drawn over the top of the map.
pub struct SuggestionList<'a> {
    rows: &'a [SuggestionRow],
    highlighted: usize,
}

impl<'a> SuggestionList<'a> {
    pub fn new(rows: &'a [SuggestionRow], highlighted: usize) -> Self {
        Self { rows, highlighted }
    }
}

/// First row to show so that `highlighted` stays on screen.
fn scroll_offset(len: usize, highlighted: usize, visible: usize) -> usize {
    if visible == 0 || len <= visible {
        return 0;
    }
    highlighted
        .saturating_sub(visible - 1)
        .min(len - visible)
}

impl Widget for SuggestionList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let visible = area.height.saturating_sub(2) as usize;
        let offset = scroll_offset(self.rows.len(), self.highlighted, visible);

        let items: Vec<ListItem> = self
            .rows
            .iter()
            .skip(offset)
            .take(visible)
            .map(|row| {
                let style = if row.index == self.highlighted {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                let mut spans = vec![Span::styled(row.title.clone(), style)];
                if !row.subtitle.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}", row.subtitle),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Suggestions (Up/Down, Enter) ");

        Widget::render(List::new(items).block(block), area, buf);
    }
}
