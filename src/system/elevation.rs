//! Privileged commands through the macOS administrator prompt.

use super::{CommandOutput, Shell};
use crate::constants;
use crate::error::StepError;
use crate::utils::applescript_quote;

/// AppleScript that runs `command` through `/bin/sh` as root after prompting.
pub fn privileged_script(command: &str) -> String {
    format!(
        "do shell script {} with administrator privileges",
        applescript_quote(command)
    )
}

/// Whether osascript output reports that the operator dismissed the prompt.
pub fn is_user_cancel(output: &CommandOutput) -> bool {
    let text = output.combined();
    text.contains(constants::USER_CANCELED_MARKER) || text.contains(constants::USER_CANCELED_CODE)
}

/// Run a shell command with administrator privileges.
///
/// `what` names the operation in error messages.
///
/// # Errors
///
/// Returns [`StepError::Cancelled`] when the prompt is dismissed,
/// [`StepError::MissingDependency`] when osascript cannot be started, and
/// [`StepError::Command`] for any other failure.
pub fn run_privileged(shell: &dyn Shell, command: &str, what: &str) -> Result<String, StepError> {
    let script = privileged_script(command);
    tracing::info!(command, "requesting administrator privileges");

    let output = shell.run("osascript", &["-e", &script]).map_err(|e| {
        StepError::MissingDependency(format!("cannot run osascript for {what}: {e}"))
    })?;

    if output.success {
        return Ok(output.stdout);
    }
    if is_user_cancel(&output) {
        tracing::warn!(what, "administrator prompt dismissed");
        return Err(StepError::Cancelled);
    }
    Err(StepError::command(format!("{what} failed"), output.combined()))
}
