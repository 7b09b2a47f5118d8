//! The nine configuration steps.
//!
//! Each step is a plain function of the [`Context`]. Steps share nothing in
//! memory except the memoized socat path; everything else is re-derived
//! from the host so a restarted run can pick up where the last one failed.

mod connection;
pub(crate) mod context;
mod cups;
mod driver;
mod environment;
mod forward;
mod printer;
mod socat;
mod test_page;
mod vpn;

pub use context::{Context, Reporter};
pub use cups::open_admin;
pub use vpn::disconnect;

use crate::error::StepError;
use std::fmt;

/// Identity of a step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    Environment,
    VerifyDriver,
    InstallDriver,
    DetectPrinter,
    InstallSocat,
    ConfigureCups,
    ConnectVpn,
    PortForward,
    TestConnection,
}

impl StepId {
    /// Short name used in the log and the step list.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Environment => "Environment check",
            Self::VerifyDriver => "Verify driver",
            Self::InstallDriver => "Install driver",
            Self::DetectPrinter => "Detect printer",
            Self::InstallSocat => "Install socat",
            Self::ConfigureCups => "Configure CUPS",
            Self::ConnectVpn => "Connect VPN",
            Self::PortForward => "Port forwarding",
            Self::TestConnection => "Connection test",
        }
    }

    /// Status line shown while the step runs.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Environment => "Checking system version and permissions",
            Self::VerifyDriver => "Checking driver package integrity",
            Self::InstallDriver => "Installing printer driver",
            Self::DetectPrinter => "Detecting printer connection",
            Self::InstallSocat => "Installing socat network tool",
            Self::ConfigureCups => "Configuring CUPS print service",
            Self::ConnectVpn => "Connecting to VPN",
            Self::PortForward => "Starting port forwarding",
            Self::TestConnection => "Testing printer connection",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a failing step stops the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Failure halts the sequence.
    Required,
    /// Findings are informational; failures are logged as warnings.
    Advisory,
}

/// Terminal state of a step that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Work performed.
    Done,
    /// Host already in the desired state.
    Skipped(String),
    /// Completed through a best-effort path.
    Warning(String),
}

pub type StepResult = Result<StepOutcome, StepError>;

type StepFn = dyn Fn(&Context) -> StepResult + Send + Sync;

/// A named, executable step.
pub struct Step {
    pub id: StepId,
    pub kind: StepKind,
    run: Box<StepFn>,
}

impl Step {
    pub fn new(
        id: StepId,
        kind: StepKind,
        run: impl Fn(&Context) -> StepResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            kind,
            run: Box::new(run),
        }
    }

    /// Execute the step.
    ///
    /// # Errors
    ///
    /// Returns the step's failure reason.
    pub fn execute(&self, ctx: &Context) -> StepResult {
        (self.run)(ctx)
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// The full configuration sequence.
pub fn all() -> Vec<Step> {
    vec![
        Step::new(StepId::Environment, StepKind::Required, environment::check),
        Step::new(StepId::VerifyDriver, StepKind::Required, driver::verify),
        Step::new(StepId::InstallDriver, StepKind::Required, driver::install),
        Step::new(StepId::DetectPrinter, StepKind::Advisory, printer::detect),
        Step::new(StepId::InstallSocat, StepKind::Required, socat::install),
        Step::new(StepId::ConfigureCups, StepKind::Required, cups::configure),
        Step::new(StepId::ConnectVpn, StepKind::Required, vpn::connect),
        Step::new(StepId::PortForward, StepKind::Required, forward::start),
        Step::new(StepId::TestConnection, StepKind::Required, connection::test),
    ]
}
