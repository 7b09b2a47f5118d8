//! Parsers over the text output of macOS tools.
//!
//! Each function takes captured stdout and answers one question
//! ("is cupsd sharing?", "which pids own the port?") so the steps only
//! decide what to do with the answer.

use crate::constants;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// A `sw_vers -productVersion` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MacOsVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl MacOsVersion {
    /// Parse `14.2.1`, `15.0` or `11`; missing components are zero.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().split('.');
        let major = parts.next()?.trim().parse().ok()?;
        let minor = match parts.next() {
            Some(p) => p.trim().parse().ok()?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(p) => p.trim().parse().ok()?,
            None => 0,
        };
        Some(Self { major, minor, patch })
    }

    /// Whether this release is at least [`constants::MIN_MACOS_VERSION`].
    pub fn is_supported(self) -> bool {
        let (major, minor, patch) = constants::MIN_MACOS_VERSION;
        self >= Self { major, minor, patch }
    }
}

impl fmt::Display for MacOsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Whether `id -Gn` output lists the admin group.
pub fn is_admin(groups_output: &str) -> bool {
    groups_output
        .split_whitespace()
        .any(|group| group == constants::ADMIN_GROUP)
}

/// VPN candidates from `networksetup -listallnetworkservices`.
///
/// Drops the header line, blank lines, and services whose name contains a
/// known non-VPN fragment.
pub fn parse_vpn_services(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(constants::NETWORKSETUP_HEADER))
        .filter(|line| {
            let lower = line.to_lowercase();
            !constants::NON_VPN_SERVICE_FRAGMENTS
                .iter()
                .any(|fragment| lower.contains(fragment))
        })
        .map(str::to_string)
        .collect()
}

/// Connection state reported by `scutil --nc status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NcStatus {
    Connected,
    Connecting,
    Disconnected,
    Disconnecting,
    Other(String),
}

impl NcStatus {
    /// State from the first line of `scutil --nc status <service>`.
    pub fn parse(output: &str) -> Self {
        let first = output.lines().next().unwrap_or_default().trim();
        match first {
            "Connected" => Self::Connected,
            "Connecting" => Self::Connecting,
            "Disconnected" => Self::Disconnected,
            "Disconnecting" => Self::Disconnecting,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Printer queue names from `lpstat -p`.
pub fn parse_lpstat_printers(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("printer "))
        .filter_map(|rest| rest.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Process ids printed by `lsof -t`.
pub fn parse_pids(output: &str) -> Vec<u32> {
    output
        .split_whitespace()
        .filter_map(|token| token.parse().ok())
        .collect()
}

/// Whether `cupsctl` reports both the web interface and printer sharing enabled.
pub fn cups_sharing_enabled(cupsctl_output: &str) -> bool {
    let mut web = false;
    let mut share = false;
    for line in cupsctl_output.lines().map(str::trim) {
        match line {
            "WebInterface=yes" => web = true,
            "_share_printers=1" => share = true,
            _ => {}
        }
    }
    web && share
}

/// Whether `brew --version` output comes from a working Homebrew.
pub fn is_homebrew_version(output: &str) -> bool {
    output.contains("Homebrew")
}

/// Case-insensitive search for the vendor fragment.
pub fn mentions_vendor(text: &str, vendor: &str) -> bool {
    !vendor.is_empty() && text.to_lowercase().contains(&vendor.to_lowercase())
}

/// First private, non-loopback IPv4 address among the interface addresses.
pub fn pick_lan_ipv4(addrs: &[(String, IpAddr)]) -> Option<Ipv4Addr> {
    addrs.iter().find_map(|(_name, ip)| match ip {
        IpAddr::V4(v4) if !v4.is_loopback() && v4.is_private() => Some(*v4),
        _ => None,
    })
}
