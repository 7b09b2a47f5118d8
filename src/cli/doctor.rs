//! Host diagnostics.
//!
//! Collects the facts the configuration steps depend on (OS release,
//! privileges, tools on `PATH`, config status) and prints them as a table or
//! as JSON. Nothing here changes the host.

use crate::config::Config;
use crate::constants;
use crate::system::probes::{self, MacOsVersion};
use crate::system::Shell;
use crate::utils::{self, ResourceLocator};
use serde::Serialize;
use std::path::Path;

/// Tools the steps invoke, with the arguments that print a version (if any).
const TOOLS: [(&str, Option<&str>); 10] = [
    ("sw_vers", Some("-productVersion")),
    ("osascript", None),
    ("lpinfo", None),
    ("lpstat", None),
    ("cupsctl", None),
    ("networksetup", None),
    ("scutil", None),
    ("lsof", None),
    ("brew", Some("--version")),
    ("socat", Some("-V")),
];

/// Availability of one external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
    pub name: &'static str,
    pub path: Option<String>,
    pub version: Option<String>,
}

/// Everything `printbridge doctor` reports.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    pub version: &'static str,
    pub os: String,
    pub macos_version: Option<String>,
    pub macos_supported: Option<bool>,
    pub arch: &'static str,
    pub is_root: bool,
    pub is_admin: bool,
    pub tools: Vec<ToolStatus>,
    pub bundled_socat: Option<String>,
    pub config_path: String,
    pub config_status: String,
    pub log_file: Option<String>,
}

/// Gather the report through `shell`.
pub fn collect(shell: &dyn Shell, locator: &ResourceLocator, config_path: &Path) -> DoctorReport {
    let macos = cmd_stdout(shell, "sw_vers", &["-productVersion"])
        .as_deref()
        .and_then(MacOsVersion::parse);

    let is_admin = cmd_stdout(shell, "id", &["-Gn"])
        .is_some_and(|groups| probes::is_admin(&groups));

    let bundled = locator.resolve(constants::BUNDLED_SOCAT_NAME);
    let bundled_socat = bundled
        .is_file()
        .then(|| bundled.display().to_string());

    let config_status = if config_path.is_file() {
        match Config::load(config_path) {
            Ok(_) => "valid".to_string(),
            Err(e) => format!("invalid: {e}"),
        }
    } else {
        "not found (run `printbridge init`)".to_string()
    };

    DoctorReport {
        version: constants::APP_VERSION,
        os: std::env::consts::OS.to_string(),
        macos_version: macos.map(|v| v.to_string()),
        macos_supported: macos.map(MacOsVersion::is_supported),
        arch: std::env::consts::ARCH,
        is_root: utils::is_root(),
        is_admin,
        tools: TOOLS
            .iter()
            .map(|(name, version_arg)| check_tool(shell, name, *version_arg))
            .collect(),
        bundled_socat,
        config_path: config_path.display().to_string(),
        config_status,
        log_file: utils::get_logs_dir()
            .ok()
            .map(|dir| dir.join(constants::LOG_FILE_NAME).display().to_string()),
    }
}

fn cmd_stdout(shell: &dyn Shell, program: &str, args: &[&str]) -> Option<String> {
    let output = shell.run(program, args).ok()?;
    let text = output.stdout.trim();
    (output.success && !text.is_empty()).then(|| text.to_string())
}

/// Locate a tool on `PATH` and try to read its version.
fn check_tool(shell: &dyn Shell, name: &'static str, version_arg: Option<&str>) -> ToolStatus {
    let path = cmd_stdout(shell, "which", &[name]);

    // socat -V prints a banner first and some tools exit non-zero; read both streams
    let version = match (version_arg, &path) {
        (Some(arg), Some(_)) => shell.run(name, &[arg]).ok().and_then(|output| {
            parse_version_line(&output.stdout).or_else(|| parse_version_line(&output.stderr))
        }),
        _ => None,
    };

    ToolStatus {
        name,
        path,
        version,
    }
}

/// First version-looking token ("14.5", "v1.8.0.0,") in the output.
pub fn parse_version_line(raw: &str) -> Option<String> {
    raw.lines()
        .flat_map(str::split_whitespace)
        .find_map(|token| {
            let t = token.strip_prefix('v').unwrap_or(token);
            if !t.starts_with(|c: char| c.is_ascii_digit()) || !t.contains('.') {
                return None;
            }
            let clean: String = t
                .chars()
                .take_while(|c| *c == '.' || c.is_ascii_alphanumeric())
                .collect();
            (!clean.is_empty()).then_some(clean)
        })
}

/// Human-readable rendering of the report.
pub fn render_text(report: &DoctorReport) -> String {
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    let mut out = String::new();
    out.push_str("printbridge doctor\n==================\n\n");
    out.push_str(&format!("  Version:      {}\n", report.version));
    let os = match (&report.macos_version, report.macos_supported) {
        (Some(v), Some(true)) => format!("macOS {v} (supported)"),
        (Some(v), _) => format!("macOS {v} (unsupported, 10.13.6 or newer required)"),
        (None, _) => report.os.clone(),
    };
    out.push_str(&format!("  OS:           {os} ({})\n", report.arch));
    out.push_str(&format!("  Admin group:  {}\n", yes_no(report.is_admin)));
    out.push_str(&format!("  Running as:   {}\n", if report.is_root { "root" } else { "user" }));

    out.push_str("\n  Tools:\n");
    for tool in &report.tools {
        let status = match (&tool.path, &tool.version) {
            (Some(p), Some(v)) => format!("{p} ({v})"),
            (Some(p), None) => p.clone(),
            _ => "not found".to_string(),
        };
        out.push_str(&format!("    {:<13} {status}\n", tool.name));
    }
    out.push_str(&format!(
        "    {:<13} {}\n",
        "socat (bundled)",
        report.bundled_socat.as_deref().unwrap_or("not present")
    ));

    out.push_str("\n  Config:\n");
    out.push_str(&format!("    Path:        {}\n", report.config_path));
    out.push_str(&format!("    Status:      {}\n", report.config_status));
    if let Some(log) = &report.log_file {
        out.push_str(&format!("    Log file:    {log}\n"));
    }
    out
}
