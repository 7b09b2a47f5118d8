//! Ordered execution of the configuration steps.
//!
//! The sequencer runs on a background thread and reports progress as
//! [`RunEvent`]s through the context's reporter. It never retries and never
//! continues past a failed required step.

use crate::state::RunStatus;
use crate::steps::{Context, Step, StepId, StepKind, StepOutcome};
use std::thread;

/// Severity of a note emitted by a running step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteLevel {
    Info,
    Warning,
}

/// Progress notifications consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Started {
        total: usize,
    },
    StepStarted {
        index: usize,
        id: StepId,
    },
    Note {
        level: NoteLevel,
        message: String,
    },
    StepFinished {
        index: usize,
        id: StepId,
        outcome: StepOutcome,
    },
    StepFailed {
        index: usize,
        id: StepId,
        error: String,
        hints: &'static [&'static str],
    },
    Finished(RunStatus),
}

const VPN_HINTS: &[&str] = &[
    "Check the VPN settings: server address, account, password and shared secret",
    "Check that this Mac is online",
    "Check that the VPN server is reachable",
];

const CONNECTION_HINTS: &[&str] = &[
    "Make sure the print service is installed and running on the remote Windows machine",
    "Check the printer's power and USB cable",
    "Check that the VPN is still connected",
    "Check that no firewall blocks HTTPS on port 8443",
    "Run the configuration again",
];

const GENERIC_HINTS: &[&str] = &[
    "Check the network connection",
    "Make sure you can authorize administrator actions",
];

/// Remediation hints shown after a failure of `id`.
pub fn remediation(id: StepId) -> &'static [&'static str] {
    match id {
        StepId::ConnectVpn => VPN_HINTS,
        StepId::TestConnection => CONNECTION_HINTS,
        _ => GENERIC_HINTS,
    }
}

/// Runs a fixed list of steps in order.
#[derive(Debug)]
pub struct Sequencer {
    steps: Vec<Step>,
}

impl Sequencer {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Execute every step, stopping at the first failure of a required step.
    pub fn run(&self, ctx: &Context) -> RunStatus {
        let reporter = ctx.reporter();
        let total = self.steps.len();
        reporter.send(RunEvent::Started { total });
        tracing::info!(total, "configuration run started");

        let mut warned = false;
        for (index, step) in self.steps.iter().enumerate() {
            if index > 0 {
                ctx.wait(ctx.timings.step_pause);
            }

            reporter.send(RunEvent::StepStarted { index, id: step.id });
            tracing::info!(step = %step.id, index, "step started");

            let outcome = match step.execute(ctx) {
                Ok(outcome) => outcome,
                Err(error) if step.kind == StepKind::Advisory => {
                    reporter.warn(format!("{}: {error}", step.id));
                    StepOutcome::Warning(error.to_string())
                }
                Err(error) => {
                    tracing::error!(step = %step.id, kind = ?error.kind(), %error, "step failed");
                    reporter.send(RunEvent::StepFailed {
                        index,
                        id: step.id,
                        error: error.to_string(),
                        hints: remediation(step.id),
                    });
                    let status = RunStatus::Failed(index);
                    reporter.send(RunEvent::Finished(status));
                    return status;
                }
            };

            match &outcome {
                StepOutcome::Done => tracing::info!(step = %step.id, "step done"),
                StepOutcome::Skipped(reason) => {
                    tracing::info!(step = %step.id, reason, "step skipped");
                }
                StepOutcome::Warning(reason) => {
                    warned = true;
                    tracing::warn!(step = %step.id, reason, "step completed with warning");
                }
            }
            reporter.send(RunEvent::StepFinished {
                index,
                id: step.id,
                outcome,
            });
        }

        let status = if warned {
            RunStatus::CompletedWithWarnings
        } else {
            RunStatus::Succeeded
        };
        tracing::info!(?status, "configuration run finished");
        reporter.send(RunEvent::Finished(status));
        status
    }

    /// Run on a background thread; events flow through the context's reporter.
    pub fn spawn(self, ctx: Context) -> thread::JoinHandle<RunStatus> {
        thread::spawn(move || self.run(&ctx))
    }
}
