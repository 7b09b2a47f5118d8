//! Footer widget with context-aware keybinding hints

use crate::app::App;
use crate::{constants, theme};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render dashboard footer with context-aware shortcuts
pub fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    // Config overlay takes priority
    if app.show_config {
        let hints = vec![
            ("↑↓", "Scroll"),
            ("g", "Top"),
            ("G", "End"),
            ("Esc", "Close"),
        ];
        render_hints(frame, area, &hints);
        return;
    }

    if app.show_action_menu {
        let hints = vec![("↑↓", "Select"), ("Enter", "Run"), ("Esc", "Close")];
        render_hints(frame, area, &hints);
        return;
    }

    let mut hints = Vec::new();

    // Re-running only makes sense once the current run has ended
    if !app.is_running() && app.status.is_finished() {
        hints.push(("r", "Run again"));
    }

    hints.extend_from_slice(&[
        ("c", "CUPS"),
        ("v", "Config"),
        ("x", "Actions"),
        ("↑↓", "Log"),
    ]);

    hints.push(("q", "Quit"));

    render_hints(frame, area, &hints);
}

fn render_hints(frame: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    let [hints_area, version_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(18)]).areas(area);

    let separator = Style::default().fg(theme::NORD_POLAR_NIGHT_3);
    let key_style = Style::default()
        .fg(theme::ACCENT_PRIMARY)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(theme::TEXT_SECONDARY);

    // Drop trailing hints that do not fit instead of wrapping
    let budget = hints_area.width as usize;
    let mut used = 1;
    let mut spans = vec![Span::raw(" ")];
    for (i, (key, label)) in hints.iter().enumerate() {
        let sep = if i == 0 { 0 } else { 3 };
        let width = sep + key.chars().count() + 1 + label.chars().count();
        if used + width > budget {
            break;
        }
        if sep > 0 {
            spans.push(Span::styled(" │ ", separator));
        }
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(*label, label_style));
        used += width;
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), hints_area);

    let version = Span::styled(
        format!("{} v{} ", constants::APP_NAME, constants::APP_VERSION),
        Style::default().fg(theme::NORD_POLAR_NIGHT_4),
    );
    frame.render_widget(
        Paragraph::new(Line::from(version)).alignment(Alignment::Right),
        version_area,
    );
}
