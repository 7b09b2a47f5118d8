//! Application-wide constants and configuration values.
//!
//! This module defines all static configuration values used throughout printbridge,
//! including timing intervals, tool locations, probe endpoints, and UI messages.

use std::time::Duration;

// === Application Metadata ===

/// Application name and title (from Cargo.toml).
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
/// Current application version (from Cargo.toml).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// === Timing Configuration ===

/// UI refresh rate in milliseconds.
pub const DEFAULT_TICK_RATE: u64 = 250;
/// Pause between two steps so the operator can follow the progress.
pub const STEP_PAUSE: Duration = Duration::from_millis(500);
/// Wait before querying USB devices so the system can enumerate the printer.
pub const DETECT_SETTLE: Duration = Duration::from_secs(2);
/// Wait after restarting cupsd.
pub const CUPS_RESTART_SETTLE: Duration = Duration::from_secs(3);
/// Interval between two VPN status polls.
pub const VPN_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Maximum number of VPN status polls.
pub const VPN_POLL_ATTEMPTS: u32 = 30;
/// Zero-based poll index past which a `Disconnected` status is treated as a failure.
pub const VPN_FAIL_FAST_AFTER: u32 = 5;
/// Wait after launching the forwarder before re-probing the port.
pub const FORWARD_SETTLE: Duration = Duration::from_secs(2);
/// Local port dial timeout.
pub const LOCAL_DIAL_TIMEOUT: Duration = Duration::from_secs(5);
/// Remote endpoint dial timeout.
pub const REMOTE_DIAL_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout of a single print API probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
/// Timeout of the CUPS admin liveness probe.
pub const CUPS_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// How long the fallback test page server is given to be loaded by the browser.
pub const TEST_PAGE_LINGER: Duration = Duration::from_secs(8);
/// Seconds the dashboard stays visible after a successful run.
pub const HIDE_DELAY_SECS: u64 = 10;
/// Countdown messages start once this many seconds remain.
pub const HIDE_ANNOUNCE_SECS: u64 = 5;

// === Path Configuration ===

/// Default configuration file name, resolved next to the executable.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Name of the bundled socat binary, resolved next to the executable.
pub const BUNDLED_SOCAT_NAME: &str = "socat";
/// Name of the logs subdirectory.
pub const LOGS_DIR_NAME: &str = "logs";
/// Name of the diagnostic log file.
pub const LOG_FILE_NAME: &str = "printbridge.log";
/// File name of the generated print test page.
pub const TEST_PAGE_FILE_NAME: &str = "printbridge-test.html";
/// Directories where installed printer drivers leave their markers.
pub const DRIVER_DIRS: [&str; 3] = [
    "/Library/Printers/PPDs/Contents/Resources",
    "/usr/share/cups/drv",
    "/usr/share/cups/model",
];

// === Configuration Defaults ===

/// VPN name shipped in the configuration template.
pub const PLACEHOLDER_VPN_NAME: &str = "Your VPN connection name";
/// Required extension of the driver package.
pub const DRIVER_EXTENSION: &str = "pkg";
/// Smaller driver packages are treated as truncated downloads.
pub const DRIVER_MIN_BYTES: u64 = 200 * 1024;
/// Number of header bytes read from the driver package.
pub const DRIVER_HEADER_BYTES: usize = 512;

// === Environment Requirements ===

/// Platform identifier the steps are written for.
pub const REQUIRED_PLATFORM: &str = "macos";
/// Oldest supported macOS release.
pub const MIN_MACOS_VERSION: (u32, u32, u32) = (10, 13, 6);
/// Group whose members may authorize privileged operations.
pub const ADMIN_GROUP: &str = "admin";
/// Public address used for the reachability probe.
pub const REACHABILITY_TARGET: &str = "8.8.8.8";

// === Network Services ===

/// Substrings of network services that are never VPNs.
pub const NON_VPN_SERVICE_FRAGMENTS: [&str; 4] = ["wi-fi", "ethernet", "ax88179a", "xreal"];
/// Header line printed by `networksetup -listallnetworkservices`.
pub const NETWORKSETUP_HEADER: &str = "An asterisk";

// === CUPS ===

/// launchd label of the print-service daemon.
pub const CUPSD_LABEL: &str = "org.cups.cupsd";
/// Port of the CUPS web interface.
pub const CUPS_PORT: u16 = 631;

// === Print API Detection ===

/// Ports probed after the configured one, in priority order.
pub const CLODOP_FALLBACK_PORTS: [u16; 4] = [8443, 8000, 8080, 9000];
/// Port used by the fallback test page when detection fails.
pub const CLODOP_DEFAULT_PORT: u16 = 8443;
/// Schemes probed for every candidate port.
pub const CLODOP_SCHEMES: [&str; 2] = ["https", "http"];
/// Endpoint paths probed for every scheme.
pub const CLODOP_PATHS: [&str; 3] = [
    "/CLodopfuncs.js?priority=1",
    "/CLodopfuncs.js",
    "/c_webskt/",
];

// === Elevation ===

/// Marker printed by osascript when the operator dismisses the prompt.
pub const USER_CANCELED_MARKER: &str = "User canceled";
/// AppleScript error number of a dismissed prompt.
pub const USER_CANCELED_CODE: &str = "(-128)";

// === UI Messages ===

/// Status line before the run starts.
pub const MSG_READY: &str = "Ready to configure...";
/// Status line after a successful run.
pub const MSG_DONE: &str = "Configuration complete. The printer is ready.";
/// Status line after a run that completed with warnings.
pub const MSG_DONE_WARNINGS: &str = "Configuration complete with warnings. Check the log.";
/// Status line when the configuration file cannot be used.
pub const MSG_CONFIG_ERROR: &str = "Configuration error. Check config.toml.";
/// Closing message when the dashboard hides.
pub const MSG_HIDDEN: &str = "Forwarder keeps running in the background.";

// === UI Labels & Titles ===

pub const TITLE_STEPS: &str = " Steps ";
pub const TITLE_LOG: &str = " Log ";
pub const TITLE_ACTIONS: &str = "Actions";
