//! Action menu overlay, opened with `x`.

use crate::app::ActionMenuItem;
use crate::theme;
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
    Frame,
};

/// Render the action menu overlay
#[allow(clippy::cast_possible_truncation)]
pub fn render(frame: &mut Frame, items: &[ActionMenuItem], list_state: &mut ListState, title: &str) {
    let label_width = items.iter().map(|i| i.label.len()).max().unwrap_or(20);
    let width = (label_width + 12).min(60) as u16; // marker + key + padding
    let height = (items.len() + 2).min(15) as u16;

    let area = centered_rect(width, height, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER_FOCUSED))
        .title(Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(theme::ACCENT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ));

    let rows: Vec<ListItem> = items
        .iter()
        .map(|item| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("[{}]", item.key),
                    Style::default()
                        .fg(theme::ACCENT_PRIMARY)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::styled(item.label, Style::default().fg(theme::TEXT_PRIMARY)),
            ]))
        })
        .collect();

    let list = List::new(rows)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(theme::ROW_SELECTED_BG)
                .fg(theme::ROW_SELECTED_FG)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");
    frame.render_stateful_widget(list, area, list_state);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    area
}
