//! Everything a step may touch: configuration, host adapters, and timings.

use crate::config::Config;
use crate::constants;
use crate::sequencer::{NoteLevel, RunEvent};
use crate::system::{HttpProbe, Opener, ReqwestProbe, Shell, SystemOpener, SystemShell};
use crate::utils::ResourceLocator;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

/// Fixed waits and poll counts used by the steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub step_pause: Duration,
    pub detect_settle: Duration,
    pub cups_restart_settle: Duration,
    pub vpn_poll_interval: Duration,
    pub vpn_poll_attempts: u32,
    pub forward_settle: Duration,
    pub local_dial_timeout: Duration,
    pub remote_dial_timeout: Duration,
    pub probe_timeout: Duration,
    pub test_page_linger: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            step_pause: constants::STEP_PAUSE,
            detect_settle: constants::DETECT_SETTLE,
            cups_restart_settle: constants::CUPS_RESTART_SETTLE,
            vpn_poll_interval: constants::VPN_POLL_INTERVAL,
            vpn_poll_attempts: constants::VPN_POLL_ATTEMPTS,
            forward_settle: constants::FORWARD_SETTLE,
            local_dial_timeout: constants::LOCAL_DIAL_TIMEOUT,
            remote_dial_timeout: constants::REMOTE_DIAL_TIMEOUT,
            probe_timeout: constants::PROBE_TIMEOUT,
            test_page_linger: constants::TEST_PAGE_LINGER,
        }
    }
}

#[cfg(test)]
impl Timings {
    /// No waiting at all; dial timeouts stay short but non-zero.
    pub fn immediate() -> Self {
        Self {
            step_pause: Duration::ZERO,
            detect_settle: Duration::ZERO,
            cups_restart_settle: Duration::ZERO,
            vpn_poll_interval: Duration::ZERO,
            vpn_poll_attempts: constants::VPN_POLL_ATTEMPTS,
            forward_settle: Duration::ZERO,
            local_dial_timeout: Duration::from_millis(500),
            remote_dial_timeout: Duration::from_millis(500),
            probe_timeout: Duration::from_millis(500),
            test_page_linger: Duration::ZERO,
        }
    }
}

/// Forwards step notes to the presentation layer and the diagnostic log.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: Sender<RunEvent>,
}

impl Reporter {
    pub fn new(tx: Sender<RunEvent>) -> Self {
        Self { tx }
    }

    /// Deliver an event; a closed receiver means the UI is gone and is ignored.
    pub fn send(&self, event: RunEvent) {
        let _ = self.tx.send(event);
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "printbridge::step", "{message}");
        self.send(RunEvent::Note {
            level: NoteLevel::Info,
            message,
        });
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(target: "printbridge::step", "{message}");
        self.send(RunEvent::Note {
            level: NoteLevel::Warning,
            message,
        });
    }
}

/// Execution context handed to every step.
pub struct Context {
    pub config: Config,
    pub shell: Arc<dyn Shell>,
    pub http: Arc<dyn HttpProbe>,
    pub opener: Arc<dyn Opener>,
    /// `std::env::consts::OS` of the host.
    pub platform: String,
    pub locator: ResourceLocator,
    pub temp_dir: PathBuf,
    pub driver_dirs: Vec<PathBuf>,
    pub timings: Timings,
    reporter: Reporter,
    socat: OnceLock<PathBuf>,
}

impl Context {
    /// Context wired to the real host.
    pub fn system(config: Config, locator: ResourceLocator, reporter: Reporter) -> Self {
        Self {
            config,
            shell: Arc::new(SystemShell),
            http: Arc::new(ReqwestProbe),
            opener: Arc::new(SystemOpener),
            platform: std::env::consts::OS.to_string(),
            locator,
            temp_dir: std::env::temp_dir(),
            driver_dirs: constants::DRIVER_DIRS.iter().map(PathBuf::from).collect(),
            timings: Timings::default(),
            reporter,
            socat: OnceLock::new(),
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn work_dir(&self) -> &Path {
        self.locator.work_dir()
    }

    /// socat path resolved earlier in this run, if any.
    pub fn socat_path(&self) -> Option<&Path> {
        self.socat.get().map(PathBuf::as_path)
    }

    /// Memoize the resolved socat path for the forwarding step.
    pub fn remember_socat(&self, path: PathBuf) -> &Path {
        self.socat.get_or_init(|| path)
    }

    /// Sleep for a fixed settle time; zero durations return immediately.
    pub fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::sequencer::RunEvent;
    use crate::system::testing::{FakeHttp, FakeOpener, FakeShell};
    use std::sync::mpsc::{self, Receiver};

    pub const CONFIG: &str = r#"
[vpn]
name = "Office VPN"

[network]
local_port = 18443
remote_host = "127.0.0.1"
remote_port = 18443

[printer]
model = "HPRT TP80"
driver_file = "HPRT_Driver.pkg"
"#;

    /// A context over fakes, rooted in `work_dir`, plus the event receiver.
    pub fn context(
        shell: Arc<FakeShell>,
        http: Arc<FakeHttp>,
        opener: Arc<FakeOpener>,
        work_dir: &Path,
    ) -> (Context, Receiver<RunEvent>) {
        context_with(
            Config::from_toml(CONFIG).expect("fixture config"),
            shell,
            http,
            opener,
            work_dir,
        )
    }

    pub fn context_with(
        config: Config,
        shell: Arc<FakeShell>,
        http: Arc<FakeHttp>,
        opener: Arc<FakeOpener>,
        work_dir: &Path,
    ) -> (Context, Receiver<RunEvent>) {
        let (tx, rx) = mpsc::channel();
        let ctx = Context {
            config,
            shell,
            http,
            opener,
            platform: "macos".to_string(),
            locator: ResourceLocator::new(None, work_dir.to_path_buf()),
            temp_dir: work_dir.to_path_buf(),
            driver_dirs: vec![work_dir.join("drivers")],
            timings: Timings::immediate(),
            reporter: Reporter::new(tx),
            socat: OnceLock::new(),
        };
        (ctx, rx)
    }

    /// Messages of every note received so far.
    pub fn notes(rx: &Receiver<RunEvent>) -> Vec<String> {
        rx.try_iter()
            .filter_map(|event| match event {
                RunEvent::Note { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }
}
