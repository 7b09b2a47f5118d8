//! Handlers for the non-interactive commands.

use super::doctor;
use crate::app::App;
use crate::config::Config;
use crate::constants;
use crate::state::RunStatus;
use crate::steps;
use crate::system::{SystemOpener, SystemShell};
use crate::utils::ResourceLocator;
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Config file in effect: the explicit path, else `config.toml` next to the
/// program or in the working directory.
pub fn config_path(explicit: Option<PathBuf>, locator: &ResourceLocator) -> PathBuf {
    explicit.unwrap_or_else(|| locator.resolve(constants::CONFIG_FILE_NAME))
}

/// Write the config template to `path`.
pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("cannot create {}", parent.display()))?;
    }
    fs::write(path, Config::template())
        .wrap_err_with(|| format!("cannot write {}", path.display()))?;

    println!("Wrote {}", path.display());
    println!("Set vpn.name and network.remote_host, then run printbridge.");
    Ok(())
}

/// Print the diagnostics report.
pub fn doctor(path: &Path, locator: &ResourceLocator, json: bool) -> Result<()> {
    let report = doctor::collect(&SystemShell, locator, path);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", doctor::render_text(&report));
    }
    Ok(())
}

pub fn open_cups() -> Result<()> {
    steps::open_admin(&SystemOpener).wrap_err("cannot open the CUPS admin page")?;
    println!("Opened the CUPS admin page");
    Ok(())
}

/// Disconnect the VPN service named in the config.
pub fn disconnect_vpn(path: &Path) -> Result<()> {
    let config = Config::load(path)?;
    let service = steps::disconnect(&SystemShell, &config.vpn_name)?;
    println!("Disconnected {service}");
    Ok(())
}

/// Run the configuration without the dashboard, printing the log to stdout.
///
/// Returns the final status; a configuration error is reported as an error.
pub fn headless(path: PathBuf, locator: ResourceLocator) -> Result<RunStatus> {
    let mut app = App::new(path, locator);
    app.start_run();

    let tick = Duration::from_millis(constants::DEFAULT_TICK_RATE);
    let mut printed = 0;
    loop {
        app.on_tick();
        for entry in &app.logs[printed..] {
            println!("{}", entry.line());
        }
        printed = app.logs.len();

        if !app.is_running() {
            break;
        }
        thread::sleep(tick);
    }

    if app.config.is_none() {
        bail!(constants::MSG_CONFIG_ERROR);
    }
    Ok(app.status)
}
