//! Locating or installing the socat TCP forwarder.

use super::{Context, StepOutcome, StepResult};
use crate::constants;
use crate::error::StepError;
use crate::system::probes;
use std::fs;
use std::path::{Path, PathBuf};

const HOMEBREW_URL: &str = "https://brew.sh";

/// Use the bundled or system socat, installing it through Homebrew if absent.
pub fn install(ctx: &Context) -> StepResult {
    if let Some(path) = resolve(ctx) {
        return Ok(StepOutcome::Skipped(format!(
            "socat available at {}",
            path.display()
        )));
    }

    let brew_found = ctx
        .shell
        .run("which", &["brew"])
        .map(|o| o.success)
        .unwrap_or(false);
    let brew_works = brew_found
        && ctx
            .shell
            .run("brew", &["--version"])
            .map(|o| o.success && probes::is_homebrew_version(&o.stdout))
            .unwrap_or(false);
    if !brew_works {
        return Err(StepError::MissingDependency(format!(
            "socat is not installed and Homebrew is unavailable; install Homebrew from {HOMEBREW_URL} and run again"
        )));
    }

    ctx.reporter().info("Installing socat with Homebrew");
    let output = ctx
        .shell
        .run("brew", &["install", "socat"])
        .map_err(|e| StepError::MissingDependency(format!("cannot run brew: {e}")))?;
    if !output.success {
        return Err(StepError::command("brew install socat failed", output.combined()));
    }

    let path = resolve(ctx).ok_or_else(|| {
        StepError::MissingDependency("socat is still unavailable after installation".to_string())
    })?;
    ctx.reporter()
        .info(format!("socat installed at {}", path.display()));
    Ok(StepOutcome::Done)
}

/// Path of a working socat, memoized in the context once found.
///
/// The bundled copy next to the executable is preferred over one on `PATH`.
pub fn resolve(ctx: &Context) -> Option<PathBuf> {
    if let Some(path) = ctx.socat_path() {
        return Some(path.to_path_buf());
    }

    let bundled = ctx.locator.resolve(constants::BUNDLED_SOCAT_NAME);
    if bundled.is_file() {
        if let Err(e) = ensure_executable(&bundled) {
            ctx.reporter()
                .warn(format!("cannot mark bundled socat executable: {e}"));
        } else if runs(ctx, &bundled) {
            return Some(ctx.remember_socat(bundled).to_path_buf());
        } else {
            ctx.reporter()
                .warn("Bundled socat does not run on this Mac; looking for a system copy");
        }
    }

    let output = ctx.shell.run("which", &["socat"]).ok()?;
    if !output.success {
        return None;
    }
    let system = PathBuf::from(output.stdout.trim());
    if system.as_os_str().is_empty() || !runs(ctx, &system) {
        return None;
    }
    Some(ctx.remember_socat(system).to_path_buf())
}

fn runs(ctx: &Context, path: &Path) -> bool {
    ctx.shell
        .run(&path.to_string_lossy(), &["-V"])
        .map(|o| o.success)
        .unwrap_or(false)
}

#[cfg(unix)]
fn ensure_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    if permissions.mode() & 0o111 == 0 {
        permissions.set_mode(permissions.mode() | 0o755);
        fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_executable(path: &Path) -> std::io::Result<()> {
    fs::metadata(path).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::steps::context::fixtures;
    use crate::system::testing::{FakeHttp, FakeOpener, FakeShell};
    use crate::system::CommandOutput;
    use std::sync::Arc;

    fn context(shell: &Arc<FakeShell>, dir: &Path) -> Context {
        fixtures::context(
            Arc::clone(shell),
            Arc::new(FakeHttp::new()),
            Arc::new(FakeOpener::default()),
            dir,
        )
        .0
    }

    #[test]
    fn test_bundled_copy_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let bundled = dir.path().join("socat");
        fs::write(&bundled, "#!/bin/sh\n").unwrap();
        let shell = Arc::new(FakeShell::new().on(
            &format!("{} -V", bundled.display()),
            CommandOutput::ok("socat version 1.8.0.0"),
        ));
        let ctx = context(&shell, dir.path());

        assert!(matches!(install(&ctx).unwrap(), StepOutcome::Skipped(_)));
        assert_eq!(ctx.socat_path(), Some(bundled.as_path()));
        assert!(!shell.was_called("which"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&bundled).unwrap().permissions().mode();
            assert_ne!(mode & 0o111, 0);
        }
    }

    #[test]
    fn test_system_copy_used() {
        let dir = tempfile::tempdir().unwrap();
        let shell = Arc::new(
            FakeShell::new()
                .on("which socat", CommandOutput::ok("/opt/homebrew/bin/socat\n"))
                .on("/opt/homebrew/bin/socat -V", CommandOutput::ok("socat version 1.8")),
        );
        let ctx = context(&shell, dir.path());

        assert!(matches!(install(&ctx).unwrap(), StepOutcome::Skipped(_)));
        assert_eq!(
            ctx.socat_path(),
            Some(Path::new("/opt/homebrew/bin/socat"))
        );
    }

    #[test]
    fn test_installs_with_homebrew() {
        let dir = tempfile::tempdir().unwrap();
        let shell = Arc::new(
            FakeShell::new()
                .on("which socat", CommandOutput::failed(""))
                .on("which socat", CommandOutput::ok("/opt/homebrew/bin/socat\n"))
                .on("which brew", CommandOutput::ok("/opt/homebrew/bin/brew\n"))
                .on("brew --version", CommandOutput::ok("Homebrew 4.4.2\n"))
                .on("brew install socat", CommandOutput::ok("==> Pouring socat"))
                .on("/opt/homebrew/bin/socat -V", CommandOutput::ok("socat version 1.8")),
        );
        let ctx = context(&shell, dir.path());

        assert_eq!(install(&ctx).unwrap(), StepOutcome::Done);
        assert!(shell.was_called("brew install socat"));
        assert!(ctx.socat_path().is_some());
    }

    #[test]
    fn test_missing_homebrew() {
        let dir = tempfile::tempdir().unwrap();
        let shell = Arc::new(FakeShell::new().on("which socat", CommandOutput::failed("")));
        let ctx = context(&shell, dir.path());

        let err = install(&ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingDependency);
        assert!(err.to_string().contains("https://brew.sh"));
    }

    #[test]
    fn test_brew_install_failure() {
        let dir = tempfile::tempdir().unwrap();
        let shell = Arc::new(
            FakeShell::new()
                .on("which socat", CommandOutput::failed(""))
                .on("which brew", CommandOutput::ok("/usr/local/bin/brew"))
                .on("brew --version", CommandOutput::ok("Homebrew 4.4.2"))
                .on("brew install socat", CommandOutput::failed("Error: no bottle available")),
        );
        let ctx = context(&shell, dir.path());

        let err = install(&ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Command);
        assert!(err.to_string().contains("no bottle"));
    }
}
