//! Log lines and transient notifications shown by the dashboard.

use std::time::{Duration, Instant};

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One timestamped line of the progress log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Wall-clock time, `HH:MM:SS`.
    pub time: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    /// Entry stamped with the current local time.
    pub fn now(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            time: chrono::Local::now().format("%H:%M:%S").to_string(),
            level,
            message: message.into(),
        }
    }

    /// `[HH:MM:SS] message`, as written to the headless output.
    pub fn line(&self) -> String {
        format!("[{}] {}", self.time, self.message)
    }
}

/// Kind of toast notification, selecting its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastType {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient message centered over the dashboard.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub toast_type: ToastType,
    /// When the toast disappears.
    pub expires: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>, toast_type: ToastType, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            toast_type,
            expires: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires
    }
}
