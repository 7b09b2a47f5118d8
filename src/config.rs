//! `config.toml` loading and validation.
//!
//! The file is read once at startup. Every field is required; validation
//! happens here so that no step ever runs against an incomplete configuration.

use crate::constants;
use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Validated configuration shared by every step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Display name of the VPN service as shown in System Settings.
    pub vpn_name: String,
    /// Local port the forwarder listens on.
    pub local_port: u16,
    /// Address of the Windows machine behind the VPN.
    pub remote_host: String,
    /// Port of the print API on the Windows machine.
    pub remote_port: u16,
    /// Printer model name.
    pub printer_model: String,
    /// Driver package, relative to the executable or working directory.
    pub driver_file: PathBuf,
    /// Fragment searched for in driver catalogs and device listings.
    vendor: Option<String>,
    /// Expected SHA-256 of the driver package, lowercase hex.
    pub driver_sha256: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    vpn: VpnSection,
    #[serde(default)]
    network: NetworkSection,
    #[serde(default)]
    printer: PrinterSection,
}

#[derive(Debug, Default, Deserialize)]
struct VpnSection {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct NetworkSection {
    local_port: Option<PortField>,
    #[serde(default)]
    remote_host: String,
    remote_port: Option<PortField>,
}

#[derive(Debug, Default, Deserialize)]
struct PrinterSection {
    #[serde(default)]
    model: String,
    #[serde(default)]
    driver_file: String,
    vendor: Option<String>,
    driver_sha256: Option<String>,
}

/// Ports are accepted both as TOML integers and as quoted strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortField {
    Number(i64),
    Text(String),
}

impl Config {
    /// Read and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, is not valid TOML,
    /// or misses a required setting.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first invalid setting.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;

        let vpn_name = required(file.vpn.name, "vpn.name")?;
        if vpn_name == constants::PLACEHOLDER_VPN_NAME {
            return Err(ConfigError::PlaceholderVpnName);
        }

        let local_port = port(file.network.local_port, "network.local_port")?;
        let remote_host = required(file.network.remote_host, "network.remote_host")?;
        let remote_port = port(file.network.remote_port, "network.remote_port")?;
        let printer_model = required(file.printer.model, "printer.model")?;
        let driver_file = PathBuf::from(required(file.printer.driver_file, "printer.driver_file")?);

        let vendor = file
            .printer
            .vendor
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty());

        let driver_sha256 = match file.printer.driver_sha256 {
            Some(sum) if !sum.trim().is_empty() => {
                let sum = sum.trim().to_lowercase();
                if sum.len() != 64 || !sum.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(ConfigError::InvalidChecksum);
                }
                Some(sum)
            }
            _ => None,
        };

        Ok(Self {
            vpn_name,
            local_port,
            remote_host,
            remote_port,
            printer_model,
            driver_file,
            vendor,
            driver_sha256,
        })
    }

    /// Lowercase vendor fragment, defaulting to the first word of the model.
    #[must_use]
    pub fn vendor(&self) -> String {
        self.vendor.clone().unwrap_or_else(|| {
            self.printer_model
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_lowercase()
        })
    }

    /// Commented template written by `printbridge init`.
    #[must_use]
    pub fn template() -> String {
        format!(
            r#"# printbridge configuration

[vpn]
# Name of the VPN service exactly as listed in System Settings > Network.
name = "{placeholder}"

[network]
# Local port the tunnel listens on.
local_port = 8443
# IP address or host name of the Windows machine the printer is attached to.
remote_host = "192.168.1.100"
# Port of the print service on the Windows machine.
remote_port = 8443

[printer]
model = "HPRT TP80"
# Driver package, relative to the program directory or the working directory.
driver_file = "HPRT_Driver.pkg"
# vendor = "hprt"
# driver_sha256 = ""
"#,
            placeholder = constants::PLACEHOLDER_VPN_NAME
        )
    }
}

fn required(value: String, field: &'static str) -> Result<String, ConfigError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ConfigError::MissingField(field));
    }
    Ok(value)
}

fn port(value: Option<PortField>, field: &'static str) -> Result<u16, ConfigError> {
    let raw = match value {
        None => return Err(ConfigError::MissingField(field)),
        Some(PortField::Text(text)) if text.trim().is_empty() => {
            return Err(ConfigError::MissingField(field))
        }
        Some(PortField::Text(text)) => text.trim().to_string(),
        Some(PortField::Number(n)) => n.to_string(),
    };

    match raw.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort { field, value: raw }),
    }
}
