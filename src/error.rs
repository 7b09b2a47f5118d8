//! Error types for configuration loading and step execution.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load or validate `config.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required setting `{0}`")]
    MissingField(&'static str),

    #[error("`vpn.name` still holds the template placeholder; set it to your VPN connection name")]
    PlaceholderVpnName,

    #[error("`{field}` must be a port number between 1 and 65535, got {value:?}")]
    InvalidPort { field: &'static str, value: String },

    #[error("`printer.driver_sha256` must be 64 hex characters")]
    InvalidChecksum,
}

/// Taxonomy class of a step failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Host state the operator must fix (OS, privileges, connectivity).
    Environment,
    /// Driver package missing, wrong type, or damaged.
    Artifact,
    /// The operator dismissed an elevation prompt.
    Cancelled,
    /// A required external tool is absent.
    MissingDependency,
    /// VPN, remote host, or print API unreachable.
    Network,
    /// A tool ran and reported failure.
    Command,
}

/// Failure returned by a configuration step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("{0}")]
    Environment(String),

    #[error("{0}")]
    Artifact(String),

    #[error("administrator authorization was cancelled by the user")]
    Cancelled,

    #[error("{0}")]
    MissingDependency(String),

    #[error("{0}")]
    Network(String),

    #[error("{context}: {detail}")]
    Command { context: String, detail: String },
}

impl StepError {
    /// Build a [`StepError::Command`] from a context line and captured output.
    pub fn command(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Command {
            context: context.into(),
            detail: detail.into(),
        }
    }

    /// Taxonomy class of this failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Environment(_) => ErrorKind::Environment,
            Self::Artifact(_) => ErrorKind::Artifact,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::MissingDependency(_) => ErrorKind::MissingDependency,
            Self::Network(_) => ErrorKind::Network,
            Self::Command { .. } => ErrorKind::Command,
        }
    }
}
