//! Local TCP forwarding through socat.

use super::{socat, Context, StepOutcome, StepResult};
use crate::error::StepError;
use crate::system::probes;

/// Start a detached forwarder from the local port to the remote print API.
pub fn start(ctx: &Context) -> StepResult {
    let socat = socat::resolve(ctx).ok_or_else(|| {
        StepError::MissingDependency("socat is not available; run the sequence again".to_string())
    })?;
    let port = ctx.config.local_port.to_string();
    let selector = format!(":{port}");

    if port_in_use(ctx, &selector) {
        let pids = ctx
            .shell
            .run("lsof", &["-t", "-i", &selector])
            .map(|o| probes::parse_pids(&o.stdout))
            .unwrap_or_default();
        for pid in pids {
            ctx.reporter()
                .warn(format!("Port {port} is held by process {pid}; stopping it"));
            let pid = pid.to_string();
            match ctx.shell.run("kill", &["-9", &pid]) {
                Ok(output) if output.success => {}
                Ok(output) => ctx
                    .reporter()
                    .warn(format!("kill {pid} failed: {}", output.combined())),
                Err(e) => ctx.reporter().warn(format!("kill {pid} failed: {e}")),
            }
        }
    }

    let listen = format!("TCP-LISTEN:{port},fork,reuseaddr");
    let connect = format!(
        "TCP:{}:{}",
        ctx.config.remote_host, ctx.config.remote_port
    );
    let pid = ctx
        .shell
        .spawn_detached(&socat.to_string_lossy(), &[&listen, &connect])
        .map_err(|e| StepError::command("cannot start socat", e.to_string()))?;

    ctx.wait(ctx.timings.forward_settle);

    if !port_in_use(ctx, &selector) {
        return Err(StepError::command(
            "port forwarding failed",
            format!("socat (pid {pid}) is not listening on port {port}"),
        ));
    }

    ctx.reporter().info(format!(
        "Forwarding 127.0.0.1:{port} to {}:{} (pid {pid})",
        ctx.config.remote_host, ctx.config.remote_port
    ));
    Ok(StepOutcome::Done)
}

fn port_in_use(ctx: &Context, selector: &str) -> bool {
    ctx.shell
        .run("lsof", &["-i", selector])
        .map(|o| o.success && !o.stdout.trim().is_empty())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::steps::context::fixtures;
    use crate::system::testing::{FakeHttp, FakeOpener, FakeShell};
    use crate::system::CommandOutput;
    use std::path::PathBuf;
    use std::sync::Arc;

    const LISTENING: &str = "COMMAND  PID USER   FD   TYPE DEVICE SIZE/OFF NODE NAME\nsocat   4242 ops    5u  IPv4 0x1      0t0  TCP *:18443 (LISTEN)\n";

    fn run(shell: &Arc<FakeShell>) -> StepResult {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _rx) = fixtures::context(
            Arc::clone(shell),
            Arc::new(FakeHttp::new()),
            Arc::new(FakeOpener::default()),
            dir.path(),
        );
        ctx.remember_socat(PathBuf::from("/opt/homebrew/bin/socat"));
        start(&ctx)
    }

    #[test]
    fn test_starts_forwarder_on_free_port() {
        let shell = Arc::new(
            FakeShell::new()
                .on("lsof -i :18443", CommandOutput::failed(""))
                .on("lsof -i :18443", CommandOutput::ok(LISTENING)),
        );
        assert_eq!(run(&shell).unwrap(), StepOutcome::Done);
        assert_eq!(
            shell.spawned(),
            vec!["/opt/homebrew/bin/socat TCP-LISTEN:18443,fork,reuseaddr TCP:127.0.0.1:18443"]
        );
        assert!(!shell.was_called("kill"));
    }

    #[test]
    fn test_kills_previous_holder() {
        let shell = Arc::new(
            FakeShell::new()
                .on("lsof -i :18443", CommandOutput::ok(LISTENING))
                .on("lsof -t -i :18443", CommandOutput::ok("4242\n517\n"))
                .on_prefix("kill -9", CommandOutput::ok("")),
        );
        assert!(run(&shell).is_ok());
        assert!(shell.was_called("kill -9 4242"));
        assert!(shell.was_called("kill -9 517"));
    }

    #[test]
    fn test_fails_when_port_not_bound() {
        let shell = Arc::new(FakeShell::new().on("lsof -i :18443", CommandOutput::failed("")));
        let err = run(&shell).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Command);
        assert!(err.to_string().contains("not listening on port 18443"));
    }

    #[test]
    fn test_requires_socat() {
        let dir = tempfile::tempdir().unwrap();
        let shell = Arc::new(FakeShell::new().on("which socat", CommandOutput::failed("")));
        let (ctx, _rx) = fixtures::context(
            shell,
            Arc::new(FakeHttp::new()),
            Arc::new(FakeOpener::default()),
            dir.path(),
        );
        assert_eq!(start(&ctx).unwrap_err().kind(), ErrorKind::MissingDependency);
    }
}
