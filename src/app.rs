//! Application state and input handling for the dashboard.
//!
//! [`App`] owns everything the UI renders. Progress arrives from the
//! sequencer thread as [`RunEvent`]s, drained on every tick; the UI thread
//! is the only writer of this state.

use crate::config::Config;
use crate::constants;
use crate::sequencer::{NoteLevel, RunEvent, Sequencer};
use crate::state::{LogEntry, LogLevel, RunStatus, StepStatus, Toast, ToastType};
use crate::steps::{self, Context, Reporter, StepId, StepOutcome};
use crate::system::{Opener, SystemOpener, SystemShell};
use crate::utils::ResourceLocator;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};

const TOAST_TTL: Duration = Duration::from_secs(3);

/// What an action menu entry does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    OpenCups,
    Rerun,
    ViewConfig,
    DisconnectVpn,
    Quit,
}

/// One row of the action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionMenuItem {
    pub key: &'static str,
    pub label: &'static str,
    pub action: Action,
}

pub const ACTION_MENU_ITEMS: [ActionMenuItem; 5] = [
    ActionMenuItem {
        key: "c",
        label: "Open CUPS admin page",
        action: Action::OpenCups,
    },
    ActionMenuItem {
        key: "r",
        label: "Run configuration again",
        action: Action::Rerun,
    },
    ActionMenuItem {
        key: "v",
        label: "View config.toml",
        action: Action::ViewConfig,
    },
    ActionMenuItem {
        key: "d",
        label: "Disconnect VPN",
        action: Action::DisconnectVpn,
    },
    ActionMenuItem {
        key: "q",
        label: "Quit",
        action: Action::Quit,
    },
];

/// Dashboard state.
pub struct App {
    pub should_quit: bool,
    /// Set when the dashboard closed itself after a successful run.
    pub hidden: bool,
    pub config_path: PathBuf,
    pub config: Option<Config>,
    pub status: RunStatus,
    pub status_line: String,
    pub steps: Vec<(StepId, StepStatus)>,
    pub completed: usize,
    pub logs: Vec<LogEntry>,
    pub log_scroll: usize,
    pub follow_log: bool,
    pub show_config: bool,
    pub config_scroll: u16,
    pub show_action_menu: bool,
    pub action_menu_state: ListState,
    pub toast: Option<Toast>,
    locator: ResourceLocator,
    opener: Box<dyn Opener>,
    events: Option<Receiver<RunEvent>>,
    hide_at: Option<Instant>,
    last_announced: Option<u64>,
}

impl App {
    pub fn new(config_path: PathBuf, locator: ResourceLocator) -> Self {
        let steps = steps::all().iter().map(|s| (s.id, StepStatus::NotStarted)).collect();
        Self {
            should_quit: false,
            hidden: false,
            config_path,
            config: None,
            status: RunStatus::Pending,
            status_line: constants::MSG_READY.to_string(),
            steps,
            completed: 0,
            logs: Vec::new(),
            log_scroll: 0,
            follow_log: true,
            show_config: false,
            config_scroll: 0,
            show_action_menu: false,
            action_menu_state: ListState::default(),
            toast: None,
            locator,
            opener: Box::new(SystemOpener),
            events: None,
            hide_at: None,
            last_announced: None,
        }
    }

    /// Fraction of steps finished, for the progress gauge.
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        if self.steps.is_empty() {
            0.0
        } else {
            self.completed as f64 / self.steps.len() as f64
        }
    }

    /// Whether a run is in flight.
    pub fn is_running(&self) -> bool {
        self.events.is_some()
    }

    /// Seconds left before the dashboard hides, if a hide is scheduled.
    pub fn hide_countdown(&self) -> Option<u64> {
        self.hide_at
            .map(|at| at.saturating_duration_since(Instant::now()).as_secs())
    }

    /// Load the configuration and start the sequence on a background thread.
    pub fn start_run(&mut self) {
        if self.is_running() {
            return;
        }
        self.reset();

        let config = match Config::load(&self.config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(path = %self.config_path.display(), error = %e, "configuration error");
                self.status_line = constants::MSG_CONFIG_ERROR.to_string();
                self.log(LogLevel::Error, format!("Configuration error: {e}"));
                self.log(
                    LogLevel::Info,
                    format!("Edit {} and press r to retry", self.config_path.display()),
                );
                self.config = None;
                return;
            }
        };
        self.config = Some(config.clone());

        let (tx, rx) = mpsc::channel();
        let ctx = Context::system(config, self.locator.clone(), Reporter::new(tx));
        Sequencer::new(steps::all()).spawn(ctx);
        self.attach(rx);
    }

    /// Consume run events from `rx` on subsequent ticks.
    pub fn attach(&mut self, rx: Receiver<RunEvent>) {
        self.events = Some(rx);
    }

    fn reset(&mut self) {
        for (_, status) in &mut self.steps {
            *status = StepStatus::NotStarted;
        }
        self.status = RunStatus::Pending;
        self.status_line = constants::MSG_READY.to_string();
        self.completed = 0;
        self.hide_at = None;
        self.last_announced = None;
        if !self.logs.is_empty() {
            self.log(LogLevel::Info, "Restarting configuration");
        }
    }

    pub fn on_tick(&mut self) {
        self.on_tick_at(Instant::now());
    }

    /// Drain pending run events and advance timers.
    pub fn on_tick_at(&mut self, now: Instant) {
        self.drain_events(now);

        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }

        let Some(hide_at) = self.hide_at else {
            return;
        };
        if now >= hide_at {
            self.log(LogLevel::Success, constants::MSG_HIDDEN);
            tracing::info!("dashboard hidden after successful run");
            self.hide_at = None;
            self.hidden = true;
            self.should_quit = true;
            return;
        }

        let remaining = hide_at.duration_since(now).as_secs_f64().ceil();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let remaining = remaining as u64;
        if remaining <= constants::HIDE_ANNOUNCE_SECS && self.last_announced != Some(remaining) {
            self.last_announced = Some(remaining);
            self.log(LogLevel::Info, format!("Hiding in {remaining} s..."));
        }
    }

    fn drain_events(&mut self, now: Instant) {
        loop {
            let Some(rx) = &self.events else { return };
            match rx.try_recv() {
                Ok(event) => self.apply(event, now),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.events = None;
                    return;
                }
            }
        }
    }

    fn apply(&mut self, event: RunEvent, now: Instant) {
        match event {
            RunEvent::Started { total } => {
                self.log(LogLevel::Info, format!("Starting configuration ({total} steps)"));
            }
            RunEvent::StepStarted { index, id } => {
                self.status = RunStatus::Running(index);
                self.status_line = format!("{}...", id.description());
                self.set_step(index, StepStatus::Running);
                self.log(LogLevel::Info, format!("Step {}: {id}", index + 1));
            }
            RunEvent::Note { level, message } => {
                let level = match level {
                    NoteLevel::Info => LogLevel::Info,
                    NoteLevel::Warning => LogLevel::Warning,
                };
                self.log(level, format!("  {message}"));
            }
            RunEvent::StepFinished { index, id, outcome } => {
                self.completed = index + 1;
                match outcome {
                    StepOutcome::Done => {
                        self.set_step(index, StepStatus::Ok);
                        self.log(LogLevel::Success, format!("{id} done"));
                    }
                    StepOutcome::Skipped(reason) => {
                        self.set_step(index, StepStatus::Skipped);
                        self.log(LogLevel::Success, format!("{id} skipped: {reason}"));
                    }
                    StepOutcome::Warning(reason) => {
                        self.set_step(index, StepStatus::Warned);
                        self.log(LogLevel::Warning, format!("{id} completed with warning: {reason}"));
                    }
                }
            }
            RunEvent::StepFailed {
                index,
                id,
                error,
                hints,
            } => {
                self.set_step(index, StepStatus::Err);
                self.status_line = format!("{id} failed: {error}");
                self.log(LogLevel::Error, format!("{id} failed: {error}"));
                self.log(LogLevel::Info, "Suggestions:");
                for hint in hints {
                    self.log(LogLevel::Info, format!("  - {hint}"));
                }
                self.log(
                    LogLevel::Info,
                    "Fix the problem above and press r to run again; keep this log for support",
                );
            }
            RunEvent::Finished(status) => {
                self.status = status;
                match status {
                    RunStatus::Succeeded => {
                        self.status_line = constants::MSG_DONE.to_string();
                        self.log(LogLevel::Success, "All configuration steps complete");
                        self.log(
                            LogLevel::Info,
                            format!(
                                "Check that the printer produced a test page; hiding in {} s",
                                constants::HIDE_DELAY_SECS
                            ),
                        );
                        self.hide_at = Some(now + Duration::from_secs(constants::HIDE_DELAY_SECS));
                        self.show_toast(constants::MSG_DONE, ToastType::Success);
                    }
                    RunStatus::CompletedWithWarnings => {
                        self.status_line = constants::MSG_DONE_WARNINGS.to_string();
                        self.log(LogLevel::Warning, constants::MSG_DONE_WARNINGS);
                    }
                    RunStatus::Failed(_) => {
                        self.show_toast("Configuration failed", ToastType::Error);
                    }
                    RunStatus::Pending | RunStatus::Running(_) => {}
                }
            }
        }
    }

    fn set_step(&mut self, index: usize, status: StepStatus) {
        if let Some((_, slot)) = self.steps.get_mut(index) {
            *slot = status;
        }
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.logs.push(LogEntry::now(level, message));
    }

    fn show_toast(&mut self, message: impl Into<String>, toast_type: ToastType) {
        self.toast = Some(Toast::new(message, toast_type, TOAST_TTL));
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.show_action_menu {
            self.handle_menu_key(key.code);
            return;
        }

        if self.show_config {
            match key.code {
                KeyCode::Esc | KeyCode::Char('v' | 'q') => self.show_config = false,
                KeyCode::Up | KeyCode::Char('k') => {
                    self.config_scroll = self.config_scroll.saturating_sub(1);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.config_scroll = self.config_scroll.saturating_add(1);
                }
                KeyCode::Char('g') => self.config_scroll = 0,
                KeyCode::Char('G') => self.config_scroll = u16::MAX,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('x') => {
                self.show_action_menu = true;
                self.action_menu_state.select(Some(0));
            }
            KeyCode::Char(c) => {
                if let Some(item) = ACTION_MENU_ITEMS.iter().find(|i| i.key.starts_with(c)) {
                    self.perform(item.action);
                } else {
                    self.scroll_log(key.code);
                }
            }
            code => self.scroll_log(code),
        }
    }

    fn handle_menu_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc | KeyCode::Char('x') => self.show_action_menu = false,
            KeyCode::Up | KeyCode::Char('k') => {
                let i = self.action_menu_state.selected().unwrap_or(0);
                let last = ACTION_MENU_ITEMS.len() - 1;
                self.action_menu_state
                    .select(Some(if i == 0 { last } else { i - 1 }));
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let i = self.action_menu_state.selected().unwrap_or(0);
                self.action_menu_state
                    .select(Some((i + 1) % ACTION_MENU_ITEMS.len()));
            }
            KeyCode::Enter => {
                let i = self.action_menu_state.selected().unwrap_or(0);
                self.show_action_menu = false;
                if let Some(item) = ACTION_MENU_ITEMS.get(i) {
                    self.perform(item.action);
                }
            }
            KeyCode::Char(c) => {
                if let Some(item) = ACTION_MENU_ITEMS.iter().find(|i| i.key.starts_with(c)) {
                    self.show_action_menu = false;
                    self.perform(item.action);
                }
            }
            _ => {}
        }
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::ViewConfig => {
                self.show_config = true;
                self.config_scroll = 0;
            }
            Action::OpenCups => match steps::open_admin(self.opener.as_ref()) {
                Ok(()) => self.show_toast("Opened the CUPS admin page", ToastType::Info),
                Err(e) => {
                    self.log(LogLevel::Error, format!("Cannot open the CUPS admin page: {e}"));
                    self.show_toast("Cannot open the browser", ToastType::Error);
                }
            },
            Action::Rerun => {
                if self.is_running() {
                    self.show_toast("A run is already in progress", ToastType::Warning);
                } else {
                    self.start_run();
                }
            }
            Action::DisconnectVpn => self.disconnect_vpn(),
        }
    }

    fn disconnect_vpn(&mut self) {
        if self.is_running() {
            self.show_toast("Wait for the run to finish", ToastType::Warning);
            return;
        }
        let Some(name) = self.config.as_ref().map(|c| c.vpn_name.clone()) else {
            self.show_toast("No valid configuration loaded", ToastType::Warning);
            return;
        };
        match steps::disconnect(&SystemShell, &name) {
            Ok(service) => {
                self.log(LogLevel::Info, format!("Disconnected {service}"));
                self.show_toast(format!("Disconnected {service}"), ToastType::Info);
            }
            Err(e) => {
                self.log(LogLevel::Error, format!("Cannot disconnect the VPN: {e}"));
                self.show_toast("VPN disconnect failed", ToastType::Error);
            }
        }
    }

    fn scroll_log(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.follow_log = false;
                self.log_scroll = self.log_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => self.log_scroll = self.log_scroll.saturating_add(1),
            KeyCode::PageUp => {
                self.follow_log = false;
                self.log_scroll = self.log_scroll.saturating_sub(10);
            }
            KeyCode::PageDown => self.log_scroll = self.log_scroll.saturating_add(10),
            KeyCode::Home | KeyCode::Char('g') => {
                self.follow_log = false;
                self.log_scroll = 0;
            }
            KeyCode::End | KeyCode::Char('G') => self.follow_log = true,
            _ => {}
        }
    }

    #[cfg(test)]
    fn with_opener(mut self, opener: Box<dyn Opener>) -> Self {
        self.opener = opener;
        self
    }
}
