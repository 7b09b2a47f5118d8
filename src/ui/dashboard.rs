//! Main dashboard: status line, progress gauge, step list and log.

use super::widgets::footer;
use crate::app::App;
use crate::constants;
use crate::state::{LogLevel, RunStatus, StepStatus};
use crate::theme;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Gauge, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState,
    },
    Frame,
};

pub fn render(frame: &mut Frame, app: &mut App) {
    let [header, gauge, body, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, app, header);
    render_gauge(frame, app, gauge);

    let [steps_area, log_area] =
        Layout::horizontal([Constraint::Length(30), Constraint::Min(20)]).areas(body);
    render_steps(frame, app, steps_area);
    render_log(frame, app, log_area);

    footer::render_dashboard(frame, app, footer_area);
}

fn status_color(status: RunStatus) -> ratatui::style::Color {
    match status {
        RunStatus::Pending => theme::TEXT_SECONDARY,
        RunStatus::Running(_) => theme::ACCENT_PRIMARY,
        RunStatus::Succeeded => theme::SUCCESS,
        RunStatus::CompletedWithWarnings => theme::WARNING,
        RunStatus::Failed(_) => theme::ERROR,
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match &app.config {
        Some(config) => format!(" {} setup ", config.printer_model),
        None => format!(" {} ", constants::APP_NAME),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER_DEFAULT))
        .title(Span::styled(
            title,
            Style::default()
                .fg(theme::ACCENT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ));

    let mut spans = vec![Span::styled(
        app.status_line.clone(),
        Style::default().fg(status_color(app.status)),
    )];
    if let Some(secs) = app.hide_countdown() {
        spans.push(Span::styled(
            format!("  (closing in {secs} s)"),
            Style::default().fg(theme::TEXT_SECONDARY),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_gauge(frame: &mut Frame, app: &App, area: Rect) {
    let ratio = app.progress().clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .gauge_style(
            Style::default()
                .fg(status_color(app.status))
                .bg(theme::NORD_POLAR_NIGHT_1),
        )
        .ratio(ratio)
        .label(format!("{}/{}", app.completed, app.steps.len()));
    frame.render_widget(gauge, area);
}

fn step_style(status: StepStatus) -> Style {
    let color = match status {
        StepStatus::NotStarted => theme::INACTIVE,
        StepStatus::Running => theme::ACCENT_PRIMARY,
        StepStatus::Ok | StepStatus::Skipped => theme::SUCCESS,
        StepStatus::Warned => theme::WARNING,
        StepStatus::Err => theme::ERROR,
    };
    let style = Style::default().fg(color);
    if status == StepStatus::Running {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

fn render_steps(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .steps
        .iter()
        .enumerate()
        .map(|(i, (id, status))| {
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} ", status.symbol()), step_style(*status)),
                Span::styled(
                    format!("{}. {}", i + 1, id.name()),
                    if status.is_done() || *status == StepStatus::Running {
                        Style::default().fg(theme::TEXT_PRIMARY)
                    } else {
                        Style::default().fg(theme::TEXT_SECONDARY)
                    },
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER_DEFAULT))
            .title(constants::TITLE_STEPS),
    );
    frame.render_widget(list, area);
}

fn log_style(level: LogLevel) -> Style {
    Style::default().fg(match level {
        LogLevel::Info => theme::TEXT_PRIMARY,
        LogLevel::Success => theme::SUCCESS,
        LogLevel::Warning => theme::WARNING,
        LogLevel::Error => theme::ERROR,
    })
}

fn render_log(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER_DEFAULT))
        .title(constants::TITLE_LOG);
    let inner = block.inner(area);

    // Lines are not wrapped so one entry is one row and scrolling stays exact.
    let visible = inner.height as usize;
    let max_scroll = app.logs.len().saturating_sub(visible);
    if app.follow_log || app.log_scroll >= max_scroll {
        app.log_scroll = max_scroll;
        app.follow_log = true;
    }

    let lines: Vec<Line> = app
        .logs
        .iter()
        .skip(app.log_scroll)
        .take(visible)
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    format!("[{}] ", entry.time),
                    Style::default().fg(theme::TEXT_SECONDARY),
                ),
                Span::styled(entry.message.clone(), log_style(entry.level)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);

    if max_scroll > 0 {
        let mut state = ScrollbarState::new(max_scroll).position(app.log_scroll);
        frame.render_stateful_widget(
            Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .style(Style::default().fg(theme::NORD_POLAR_NIGHT_4))
                .thumb_style(Style::default().fg(theme::ACCENT_PRIMARY)),
            area,
            &mut state,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ResourceLocator;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_renders_steps_and_status() {
        let dir = std::env::temp_dir();
        let mut app = App::new(dir.join("config.toml"), ResourceLocator::new(None, dir));
        app.steps[0].1 = StepStatus::Ok;
        app.completed = 1;
        app.log(LogLevel::Success, "Environment check done");

        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| render(frame, &mut app)).unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect();
        assert!(text.contains(constants::MSG_READY));
        assert!(text.contains("1. Environment check"));
        assert!(text.contains("9. Connection test"));
        assert!(text.contains("Environment check done"));
        assert!(text.contains("1/9"));
    }

    #[test]
    fn test_log_follows_tail() {
        let dir = std::env::temp_dir();
        let mut app = App::new(dir.join("config.toml"), ResourceLocator::new(None, dir));
        for i in 0..100 {
            app.log(LogLevel::Info, format!("line {i}"));
        }
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| render(frame, &mut app)).unwrap();
        assert!(app.follow_log);
        assert!(app.log_scroll > 80);
    }
}
