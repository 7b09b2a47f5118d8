//! Adapters over the host: external commands, HTTP probes and the browser.
//!
//! Steps never call `std::process::Command` or the network stack for
//! inspection directly; they go through these traits so the parsing logic
//! in [`probes`] can be exercised against captured output.

pub mod elevation;
pub mod probes;
#[cfg(test)]
pub mod testing;

use std::io;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

/// Captured result of an external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given stderr.
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Stdout followed by stderr, for error messages.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.trim().to_string();
        let err = self.stderr.trim();
        if !err.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(err);
        }
        text
    }
}

/// Runs external programs.
pub trait Shell: Send + Sync {
    /// Run a program to completion and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started (usually: not installed).
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;

    /// Start a program that outlives the step, returning its pid.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started.
    fn spawn_detached(&self, program: &str, args: &[&str]) -> io::Result<u32>;
}

/// [`Shell`] backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

impl Shell for SystemShell {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        tracing::debug!(program, ?args, "running command");
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    fn spawn_detached(&self, program: &str, args: &[&str]) -> io::Result<u32> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn()?;
        let pid = child.id();
        tracing::info!(program, ?args, pid, "spawned background process");

        // Reap the child whenever it exits so it never lingers as a zombie.
        thread::spawn(move || {
            let _ = child.wait();
        });

        Ok(pid)
    }
}

/// Issues HTTP(S) GET requests and reports the status code.
pub trait HttpProbe: Send + Sync {
    /// Status code of `GET url`, or `None` on any transport error.
    fn status(&self, url: &str, timeout: Duration) -> Option<u16>;
}

/// [`HttpProbe`] backed by a blocking reqwest client.
///
/// Certificate verification is disabled: the remote print API serves a
/// self-signed certificate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReqwestProbe;

impl HttpProbe for ReqwestProbe {
    fn status(&self, url: &str, timeout: Duration) -> Option<u16> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .user_agent(format!(
                "{}/{}",
                crate::constants::APP_NAME,
                crate::constants::APP_VERSION
            ))
            .build()
            .ok()?;

        match client.get(url).send() {
            Ok(response) => Some(response.status().as_u16()),
            Err(e) => {
                tracing::debug!(url, error = %e, "probe failed");
                None
            }
        }
    }
}

/// Opens files and URLs with the operator's default application.
pub trait Opener: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if no handler could be launched.
    fn open(&self, target: &str) -> io::Result<()>;
}

/// [`Opener`] backed by the `open` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl Opener for SystemOpener {
    fn open(&self, target: &str) -> io::Result<()> {
        tracing::info!(target, "opening in default browser");
        open::that(target)
    }
}
