//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// printbridge - connect a remote USB printer to this Mac over VPN
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to config.toml (default: next to the executable, then the working directory)
    #[arg(short, long, env = "PRINTBRIDGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Run the configuration without the dashboard, printing progress to stdout
    #[arg(long)]
    pub headless: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Write a commented config.toml template
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show host facts and the availability of every tool the setup uses
    Doctor {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open the CUPS admin page in the default browser
    OpenCups,
    /// Disconnect the configured VPN service
    DisconnectVpn,
}
