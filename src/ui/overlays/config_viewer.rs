//! Config file viewer overlay

use crate::app::App;
use crate::theme;
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};
use std::fs;

/// Render the active `config.toml` read-only
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = centered_rect(85, 85, frame.area());
    frame.render_widget(Clear, area);

    let content = fs::read_to_string(&app.config_path)
        .unwrap_or_else(|e| format!("# cannot read {}: {e}", app.config_path.display()));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER_FOCUSED))
        .title(" Configuration ")
        .title_bottom(Line::from(" [Esc] Close  [↑/↓] Scroll ").centered());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [path_area, body] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(inner);

    let lines: Vec<Line> = content.lines().map(highlight_toml_line).collect();
    let total = lines.len();
    #[allow(clippy::cast_possible_truncation)]
    let max_scroll = total.saturating_sub(body.height as usize).min(u16::MAX as usize) as u16;
    app.config_scroll = app.config_scroll.min(max_scroll);

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Path: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                app.config_path.display().to_string(),
                Style::default().fg(theme::TEXT_SECONDARY),
            ),
            Span::styled(
                format!(" (line {}/{})", app.config_scroll + 1, total.max(1)),
                Style::default().fg(Color::DarkGray),
            ),
        ])),
        path_area,
    );
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().fg(theme::TEXT_PRIMARY))
            .scroll((app.config_scroll, 0)),
        body,
    );

    let mut scrollbar_state =
        ScrollbarState::new(max_scroll as usize).position(app.config_scroll as usize);
    frame.render_stateful_widget(
        Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .style(Style::default().fg(theme::NORD_POLAR_NIGHT_4))
            .thumb_style(Style::default().fg(theme::ACCENT_PRIMARY)),
        Rect {
            x: area.right().saturating_sub(1),
            y: body.y,
            width: 1,
            height: body.height,
        },
        &mut scrollbar_state,
    );
}

/// Colorize comments, `[section]` headers and `key = value` pairs.
fn highlight_toml_line(line: &str) -> Line<'static> {
    let trimmed = line.trim();

    if trimmed.starts_with('#') {
        return Line::from(Span::styled(
            line.to_string(),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        return Line::from(Span::styled(
            line.to_string(),
            Style::default()
                .fg(theme::NORD_YELLOW)
                .add_modifier(Modifier::BOLD),
        ));
    }

    if let Some((key, value)) = line.split_once('=') {
        let value_color = if value.trim_start().starts_with('"') {
            theme::NORD_GREEN
        } else {
            theme::NORD_PURPLE
        };
        return Line::from(vec![
            Span::styled(key.to_string(), Style::default().fg(theme::NORD_FROST_2)),
            Span::styled("=", Style::default().fg(Color::DarkGray)),
            Span::styled(value.to_string(), Style::default().fg(value_color)),
        ]);
    }

    Line::from(Span::styled(
        line.to_string(),
        Style::default().fg(theme::TEXT_PRIMARY),
    ))
}

/// Create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    area
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_kinds() {
        assert_eq!(highlight_toml_line("# comment").spans.len(), 1);
        assert_eq!(highlight_toml_line("[network]").spans.len(), 1);

        let pair = highlight_toml_line("local_port = 8443");
        assert_eq!(pair.spans.len(), 3);
        assert_eq!(pair.spans[0].content, "local_port ");
        assert_eq!(pair.spans[2].style.fg, Some(theme::NORD_PURPLE));

        let text = highlight_toml_line("name = \"Office VPN\"");
        assert_eq!(text.spans[2].style.fg, Some(theme::NORD_GREEN));
    }
}
