//! Host environment check.

use super::{Context, StepOutcome, StepResult};
use crate::constants;
use crate::error::StepError;
use crate::system::probes::{self, MacOsVersion};

pub fn check(ctx: &Context) -> StepResult {
    if ctx.platform != constants::REQUIRED_PLATFORM {
        return Err(StepError::Environment(format!(
            "this tool only supports macOS, current system: {}",
            ctx.platform
        )));
    }

    let version = macos_version(ctx)?;
    if !version.is_supported() {
        let (major, minor, patch) = constants::MIN_MACOS_VERSION;
        return Err(StepError::Environment(format!(
            "macOS {major}.{minor}.{patch} or newer is required, current version: {version}"
        )));
    }
    ctx.reporter().info(format!("macOS {version}"));

    let groups = ctx
        .shell
        .run("id", &["-Gn"])
        .map_err(|e| StepError::Environment(format!("cannot check user permissions: {e}")))?;
    if !probes::is_admin(&groups.stdout) {
        return Err(StepError::Environment(
            "the current user is not an administrator and cannot change system settings"
                .to_string(),
        ));
    }

    let ping = ctx
        .shell
        .run("ping", &["-c", "1", constants::REACHABILITY_TARGET]);
    if !ping.map(|o| o.success).unwrap_or(false) {
        return Err(StepError::Environment(
            "network check failed, make sure this Mac is online".to_string(),
        ));
    }

    tempfile::Builder::new()
        .prefix(".printbridge-write-check")
        .tempfile_in(ctx.work_dir())
        .map_err(|e| {
            StepError::Environment(format!(
                "the working directory {} is not writable: {e}",
                ctx.work_dir().display()
            ))
        })?;

    Ok(StepOutcome::Done)
}

fn macos_version(ctx: &Context) -> Result<MacOsVersion, StepError> {
    let output = ctx
        .shell
        .run("sw_vers", &["-productVersion"])
        .map_err(|e| StepError::Environment(format!("cannot determine macOS version: {e}")))?;
    MacOsVersion::parse(&output.stdout).ok_or_else(|| {
        StepError::Environment(format!(
            "cannot parse macOS version {:?}",
            output.stdout.trim()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::steps::context::fixtures;
    use crate::system::testing::{FakeHttp, FakeOpener, FakeShell};
    use crate::system::CommandOutput;
    use std::sync::Arc;

    fn healthy_shell() -> FakeShell {
        FakeShell::new()
            .on("sw_vers -productVersion", CommandOutput::ok("14.5\n"))
            .on("id -Gn", CommandOutput::ok("staff everyone admin\n"))
            .on("ping -c 1 8.8.8.8", CommandOutput::ok("1 packets received"))
    }

    fn run(shell: FakeShell, platform: &str) -> StepResult {
        let dir = tempfile::tempdir().unwrap();
        let (mut ctx, _rx) = fixtures::context(
            Arc::new(shell),
            Arc::new(FakeHttp::new()),
            Arc::new(FakeOpener::default()),
            dir.path(),
        );
        ctx.platform = platform.to_string();
        check(&ctx)
    }

    #[test]
    fn test_healthy_host_passes() {
        assert_eq!(run(healthy_shell(), "macos").unwrap(), StepOutcome::Done);
    }

    #[test]
    fn test_wrong_platform() {
        let err = run(healthy_shell(), "linux").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Environment);
        assert!(err.to_string().contains("linux"));
    }

    #[test]
    fn test_old_macos_rejected() {
        let shell = FakeShell::new().on("sw_vers -productVersion", CommandOutput::ok("10.12.6"));
        let err = run(shell, "macos").unwrap_err();
        assert!(err.to_string().contains("10.13.6 or newer"));
    }

    #[test]
    fn test_future_macos_accepted() {
        let shell = FakeShell::new()
            .on("sw_vers -productVersion", CommandOutput::ok("27.0"))
            .on("id -Gn", CommandOutput::ok("admin"))
            .on("ping -c 1 8.8.8.8", CommandOutput::ok(""));
        assert!(run(shell, "macos").is_ok());
    }

    #[test]
    fn test_non_admin_rejected() {
        let shell = FakeShell::new()
            .on("sw_vers -productVersion", CommandOutput::ok("14.5"))
            .on("id -Gn", CommandOutput::ok("staff everyone"))
            .on("ping -c 1 8.8.8.8", CommandOutput::ok(""));
        let err = run(shell, "macos").unwrap_err();
        assert!(err.to_string().contains("not an administrator"));
    }

    #[test]
    fn test_offline_rejected() {
        let shell = FakeShell::new()
            .on("sw_vers -productVersion", CommandOutput::ok("14.5"))
            .on("id -Gn", CommandOutput::ok("admin"))
            .on("ping -c 1 8.8.8.8", CommandOutput::failed("Request timeout"));
        let err = run(shell, "macos").unwrap_err();
        assert!(err.to_string().contains("network check failed"));
    }
}
