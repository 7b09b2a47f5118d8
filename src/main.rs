//! printbridge - bridge a printer attached to a remote Windows machine to this
//! Mac over VPN and a local TCP tunnel.

mod app;
mod cli;
mod config;
mod constants;
mod error;
mod event;
mod logging;
mod sequencer;
mod state;
mod steps;
mod system;
mod theme;
mod ui;
mod utils;

use app::App;
use clap::Parser;
use cli::args::{Args, Commands};
use cli::commands;
use color_eyre::Result;
use event::{Event, EventHandler};
use state::RunStatus;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use utils::ResourceLocator;

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let args = Args::parse();
    let log_file = logging::init();

    let locator = ResourceLocator::from_env()?;
    let config_path = commands::config_path(args.config, &locator);

    match args.command {
        Some(Commands::Init { force }) => commands::init(&config_path, force)?,
        Some(Commands::Doctor { json }) => commands::doctor(&config_path, &locator, json)?,
        Some(Commands::OpenCups) => commands::open_cups()?,
        Some(Commands::DisconnectVpn) => commands::disconnect_vpn(&config_path)?,
        None if args.headless => {
            let status = commands::headless(config_path, locator)?;
            if matches!(status, RunStatus::Failed(_)) {
                print_log_hint(log_file.as_deref());
                return Ok(ExitCode::FAILURE);
            }
        }
        None => {
            let status = run_dashboard(config_path, locator)?;
            if matches!(status, RunStatus::Failed(_)) {
                print_log_hint(log_file.as_deref());
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_log_hint(log_file: Option<&Path>) {
    if let Some(path) = log_file {
        eprintln!("Diagnostic log: {}", path.display());
    }
}

fn run_dashboard(config_path: PathBuf, locator: ResourceLocator) -> Result<RunStatus> {
    let mut terminal = ratatui::init();
    let mut app = App::new(config_path, locator);
    let events = EventHandler::new(constants::DEFAULT_TICK_RATE);
    app.start_run();

    let result = (|| -> Result<()> {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(frame, &mut app))?;
            match events.next()? {
                Event::Key(key) => app.handle_key(key),
                Event::Resize(_, _) => {}
                Event::Tick => app.on_tick(),
            }
        }
        Ok(())
    })();

    ratatui::restore();
    if app.hidden {
        println!("{}", constants::MSG_HIDDEN);
    }
    result.map(|()| app.status)
}
