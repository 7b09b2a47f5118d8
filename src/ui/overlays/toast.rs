//! Toast notification overlay

use crate::app::App;
use crate::state::ToastType;
use crate::theme;
use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Render the active toast centered over the dashboard
pub fn render(frame: &mut Frame, app: &App) {
    let Some(toast) = &app.toast else {
        return;
    };

    let area = frame.area();
    let width = (area.width / 3).clamp(30, 60);
    let text_width = usize::from(width.saturating_sub(4)).max(1);
    #[allow(clippy::cast_possible_truncation)]
    let text_lines = toast.message.chars().count().div_ceil(text_width).max(1) as u16;
    let height = (text_lines + 4).max(5);

    let [popup] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(popup);

    let (title, color) = match toast.toast_type {
        ToastType::Info => (" INFO ", theme::ACCENT_PRIMARY),
        ToastType::Success => (" DONE ", theme::SUCCESS),
        ToastType::Warning => (" WARNING ", theme::WARNING),
        ToastType::Error => (" ERROR ", theme::ERROR),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Black)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(popup);

    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    let [_, text_area, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(text_lines),
        Constraint::Fill(1),
    ])
    .areas(inner);
    frame.render_widget(
        Paragraph::new(toast.message.as_str())
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center),
        text_area,
    );
}
