//! File logging.
//!
//! The TUI owns the terminal, so tracing output goes to
//! `<config dir>/logs/printbridge.log` instead of stderr.

use crate::constants;
use crate::utils;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
///
/// Returns the log file path, or `None` when no log file could be opened (the
/// program then runs without a subscriber).
pub fn init() -> Option<PathBuf> {
    let path = utils::get_logs_dir().ok()?.join(constants::LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .ok()?;

    tracing::info!(version = constants::APP_VERSION, "printbridge starting");
    Some(path)
}
