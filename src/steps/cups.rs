//! CUPS printer sharing.

use super::{Context, StepOutcome, StepResult};
use crate::constants;
use crate::system::{elevation, probes, Opener};
use std::io;
use std::net::{IpAddr, Ipv4Addr};

/// Enable the web interface and printer sharing, restarting cupsd.
pub fn configure(ctx: &Context) -> StepResult {
    if sharing_enabled(ctx) {
        report_status(ctx);
        return Ok(StepOutcome::Skipped(
            "CUPS sharing is already enabled".to_string(),
        ));
    }

    let running = ctx
        .shell
        .run("launchctl", &["list", constants::CUPSD_LABEL])
        .map(|o| o.success)
        .unwrap_or(false);
    if !running {
        ctx.reporter().info("Starting the CUPS service");
        elevation::run_privileged(
            ctx.shell.as_ref(),
            &format!("launchctl start {}", constants::CUPSD_LABEL),
            "starting CUPS",
        )?;
    }

    ctx.reporter()
        .info("Enabling the CUPS web interface and printer sharing");
    let command = format!(
        "cupsctl WebInterface=yes && cupsctl --remote-admin --remote-any --share-printers && launchctl stop {label}; launchctl start {label}",
        label = constants::CUPSD_LABEL
    );
    elevation::run_privileged(ctx.shell.as_ref(), &command, "CUPS configuration")?;

    ctx.wait(ctx.timings.cups_restart_settle);

    if !sharing_enabled(ctx) {
        ctx.reporter()
            .warn("cupsctl does not report printer sharing yet; cupsd may still be restarting");
    }
    report_status(ctx);
    Ok(StepOutcome::Done)
}

/// Open the CUPS admin page in the default browser.
///
/// # Errors
///
/// Returns an error if no browser could be launched.
pub fn open_admin(opener: &dyn Opener) -> io::Result<()> {
    opener.open(&admin_url(IpAddr::V4(Ipv4Addr::LOCALHOST)))
}

fn admin_url(ip: IpAddr) -> String {
    format!("http://{ip}:{}", constants::CUPS_PORT)
}

fn sharing_enabled(ctx: &Context) -> bool {
    ctx.shell
        .run("cupsctl", &[])
        .map(|o| o.success && probes::cups_sharing_enabled(&o.stdout))
        .unwrap_or(false)
}

fn lan_ip() -> IpAddr {
    local_ip_address::list_afinet_netifas()
        .ok()
        .and_then(|addrs| probes::pick_lan_ipv4(&addrs))
        .map_or(IpAddr::V4(Ipv4Addr::LOCALHOST), IpAddr::V4)
}

fn report_status(ctx: &Context) {
    let ip = lan_ip();
    let url = admin_url(ip);
    ctx.reporter().info(format!("CUPS admin page: {url}"));

    match ctx.http.status(&url, constants::CUPS_PROBE_TIMEOUT) {
        Some(200) => ctx.reporter().info("CUPS web interface is reachable"),
        Some(code) => ctx
            .reporter()
            .warn(format!("CUPS web interface answered with HTTP {code}")),
        None => ctx
            .reporter()
            .warn("CUPS web interface did not answer; it may still be starting"),
    }

    let printers = ctx
        .shell
        .run("lpstat", &["-p"])
        .map(|o| probes::parse_lpstat_printers(&o.stdout))
        .unwrap_or_default();
    for printer in printers {
        ctx.reporter().info(format!(
            "Shared printer: ipp://{ip}:{}/printers/{printer}",
            constants::CUPS_PORT
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::steps::context::fixtures;
    use crate::system::testing::{FakeHttp, FakeOpener, FakeShell};
    use crate::system::CommandOutput;
    use std::sync::Arc;

    const SHARING_ON: &str = "_remote_admin=1\n_remote_any=1\n_share_printers=1\nWebInterface=yes\n";
    const SHARING_OFF: &str = "_remote_admin=0\n_share_printers=0\nWebInterface=no\n";

    fn run(shell: &Arc<FakeShell>) -> (StepResult, Vec<String>) {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, rx) = fixtures::context(
            Arc::clone(shell),
            Arc::new(FakeHttp::new()),
            Arc::new(FakeOpener::default()),
            dir.path(),
        );
        let result = configure(&ctx);
        (result, fixtures::notes(&rx))
    }

    #[test]
    fn test_already_shared_is_skipped() {
        let shell = Arc::new(
            FakeShell::new()
                .on("cupsctl", CommandOutput::ok(SHARING_ON))
                .on("lpstat -p", CommandOutput::ok("printer HPRT_TP80 is idle.\n")),
        );
        let (result, notes) = run(&shell);

        assert!(matches!(result.unwrap(), StepOutcome::Skipped(_)));
        assert!(!shell.was_called("osascript"));
        assert!(notes.iter().any(|n| n.contains(":631/printers/HPRT_TP80")));
    }

    #[test]
    fn test_enables_sharing_in_one_prompt() {
        let shell = Arc::new(
            FakeShell::new()
                .on("cupsctl", CommandOutput::ok(SHARING_OFF))
                .on("cupsctl", CommandOutput::ok(SHARING_ON))
                .on("launchctl list org.cups.cupsd", CommandOutput::ok("{ \"PID\" = 312; }"))
                .on_prefix("osascript", CommandOutput::ok(""))
                .on("lpstat -p", CommandOutput::ok("")),
        );
        let (result, _notes) = run(&shell);

        assert_eq!(result.unwrap(), StepOutcome::Done);
        let prompts: Vec<String> = shell
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("osascript"))
            .collect();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("cupsctl WebInterface=yes"));
        assert!(prompts[0].contains("--remote-admin --remote-any --share-printers"));
        assert!(prompts[0].contains("launchctl stop org.cups.cupsd; launchctl start org.cups.cupsd"));
    }

    #[test]
    fn test_starts_cupsd_when_not_loaded() {
        let shell = Arc::new(
            FakeShell::new()
                .on("cupsctl", CommandOutput::ok(SHARING_OFF))
                .on("cupsctl", CommandOutput::ok(SHARING_ON))
                .on("launchctl list org.cups.cupsd", CommandOutput::failed("Could not find service"))
                .on_prefix("osascript", CommandOutput::ok("")),
        );
        let (result, _notes) = run(&shell);

        assert!(result.is_ok());
        let prompts = shell
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("osascript"))
            .count();
        assert_eq!(prompts, 2);
    }

    #[test]
    fn test_cancelled_prompt() {
        let shell = Arc::new(
            FakeShell::new()
                .on("cupsctl", CommandOutput::ok(SHARING_OFF))
                .on("launchctl list org.cups.cupsd", CommandOutput::ok(""))
                .on_prefix("osascript", CommandOutput::failed("User canceled. (-128)")),
        );
        let (result, _notes) = run(&shell);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_sharing_still_off_after_restart() {
        let shell = Arc::new(
            FakeShell::new()
                .on("cupsctl", CommandOutput::ok(SHARING_OFF))
                .on("launchctl list org.cups.cupsd", CommandOutput::ok(""))
                .on_prefix("osascript", CommandOutput::ok("")),
        );
        let (result, notes) = run(&shell);
        assert_eq!(result.unwrap(), StepOutcome::Done);
        assert!(notes.iter().any(|n| n.contains("does not report printer sharing")));
    }

    #[test]
    fn test_cupsd_not_answering_after_restart() {
        let shell = Arc::new(
            FakeShell::new()
                .on("cupsctl", CommandOutput::ok(SHARING_OFF))
                .on("cupsctl", CommandOutput::failed("cupsctl: Connection refused"))
                .on("launchctl list org.cups.cupsd", CommandOutput::ok(""))
                .on_prefix("osascript", CommandOutput::ok("")),
        );
        let (result, _notes) = run(&shell);
        assert_eq!(result.unwrap(), StepOutcome::Done);
        assert!(shell.was_called("osascript"));
    }

    #[test]
    fn test_open_admin_uses_localhost() {
        let opener = FakeOpener::default();
        open_admin(&opener).unwrap();
        assert_eq!(opener.opened(), vec!["http://127.0.0.1:631"]);
    }
}
