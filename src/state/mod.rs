//! Application state types.

mod log;
mod run;

pub use log::{LogEntry, LogLevel, Toast, ToastType};
pub use run::{RunStatus, StepStatus};
