//! VPN service lookup and connection.

use super::{Context, StepOutcome, StepResult};
use crate::constants;
use crate::error::StepError;
use crate::system::probes::{self, NcStatus};
use crate::system::Shell;

/// How closely a service name matched the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Exact,
    CaseInsensitive,
    WhitespaceInsensitive,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpnMatch {
    pub name: String,
    pub tier: MatchTier,
}

/// Find the service best matching `target`.
///
/// Tiers are tried in order; within a tier the first candidate wins.
pub fn find_vpn(target: &str, candidates: &[String]) -> Option<VpnMatch> {
    let lower = target.to_lowercase();
    let squashed = squash(&lower);

    let tiers: [(MatchTier, &dyn Fn(&str) -> bool); 4] = [
        (MatchTier::Exact, &|c: &str| c == target),
        (MatchTier::CaseInsensitive, &|c: &str| c.to_lowercase() == lower),
        (MatchTier::WhitespaceInsensitive, &|c: &str| {
            squash(&c.to_lowercase()) == squashed
        }),
        (MatchTier::Substring, &|c: &str| {
            let c = c.to_lowercase();
            !lower.is_empty() && c.contains(&lower)
        }),
    ];

    tiers.iter().find_map(|(tier, matches)| {
        candidates.iter().find(|c| matches(c)).map(|name| VpnMatch {
            name: name.clone(),
            tier: *tier,
        })
    })
}

fn squash(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn list_services(shell: &dyn Shell) -> Result<Vec<String>, StepError> {
    let output = shell
        .run("networksetup", &["-listallnetworkservices"])
        .map_err(|e| StepError::MissingDependency(format!("cannot run networksetup: {e}")))?;
    if !output.success {
        return Err(StepError::command(
            "cannot list network services",
            output.combined(),
        ));
    }
    Ok(probes::parse_vpn_services(&output.stdout))
}

fn status(shell: &dyn Shell, service: &str) -> NcStatus {
    shell
        .run("scutil", &["--nc", "status", service])
        .map_or_else(|e| NcStatus::Other(e.to_string()), |o| NcStatus::parse(&o.stdout))
}

/// Connect the configured VPN service and wait until it reports connected.
pub fn connect(ctx: &Context) -> StepResult {
    let shell = ctx.shell.as_ref();
    let target = &ctx.config.vpn_name;

    let services = list_services(shell)?;
    if services.is_empty() {
        return Err(StepError::Network(
            "no VPN connections are configured on this Mac; add one in System Settings > VPN"
                .to_string(),
        ));
    }

    let Some(found) = find_vpn(target, &services) else {
        return Err(StepError::Network(format!(
            "VPN connection {target:?} was not found; available connections: {}",
            services.join(", ")
        )));
    };
    if found.tier != MatchTier::Exact {
        ctx.reporter().warn(format!(
            "Using VPN connection {:?} for configured name {target:?}",
            found.name
        ));
    }
    let service = found.name.as_str();

    if status(shell, service) == NcStatus::Connected {
        return Ok(StepOutcome::Skipped(format!("{service} is already connected")));
    }

    ctx.reporter().info(format!("Connecting {service}"));
    let output = shell
        .run("networksetup", &["-connectpppoeservice", service])
        .map_err(|e| StepError::MissingDependency(format!("cannot run networksetup: {e}")))?;
    if !output.success {
        return Err(StepError::command(
            format!("cannot start VPN connection {service}"),
            output.combined(),
        ));
    }

    // Zero-based: a drop is trusted from the seventh poll on.
    for attempt in 0..ctx.timings.vpn_poll_attempts {
        ctx.wait(ctx.timings.vpn_poll_interval);
        match status(shell, service) {
            NcStatus::Connected => {
                ctx.reporter()
                    .info(format!("{service} connected after {} s", attempt + 1));
                return Ok(StepOutcome::Done);
            }
            NcStatus::Disconnected if attempt > constants::VPN_FAIL_FAST_AFTER => {
                return Err(StepError::Network(format!(
                    "VPN connection {service} dropped; check the credentials and the server"
                )));
            }
            state => tracing::debug!(attempt, ?state, "waiting for VPN"),
        }
    }

    Err(StepError::Network(format!(
        "VPN connection {service} timed out after {} attempts",
        ctx.timings.vpn_poll_attempts
    )))
}

/// Disconnect the VPN service matching `target`.
///
/// # Errors
///
/// Returns an error if the service cannot be found or networksetup fails.
pub fn disconnect(shell: &dyn Shell, target: &str) -> Result<String, StepError> {
    let services = list_services(shell)?;
    let found = find_vpn(target, &services).ok_or_else(|| {
        StepError::Network(format!("VPN connection {target:?} was not found"))
    })?;

    let output = shell
        .run("networksetup", &["-disconnectpppoeservice", &found.name])
        .map_err(|e| StepError::MissingDependency(format!("cannot run networksetup: {e}")))?;
    if !output.success {
        return Err(StepError::command(
            format!("cannot disconnect {}", found.name),
            output.combined(),
        ));
    }
    tracing::info!(service = %found.name, "VPN disconnected");
    Ok(found.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::steps::context::fixtures;
    use crate::system::testing::{FakeHttp, FakeOpener, FakeShell};
    use crate::system::CommandOutput;
    use std::sync::Arc;

    const SERVICES: &str = "An asterisk (*) denotes that a network service is disabled.\nWi-Fi\nOffice VPN\nThunderbolt Bridge\n";

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn run(shell: &Arc<FakeShell>) -> StepResult {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _rx) = fixtures::context(
            Arc::clone(shell),
            Arc::new(FakeHttp::new()),
            Arc::new(FakeOpener::default()),
            dir.path(),
        );
        connect(&ctx)
    }

    #[test]
    fn test_match_tiers() {
        let candidates = names(&["Office VPN", "school l2tp", "Home  Lab VPN"]);

        let exact = find_vpn("Office VPN", &candidates).unwrap();
        assert_eq!(exact.tier, MatchTier::Exact);

        let case = find_vpn("School L2TP", &candidates).unwrap();
        assert_eq!((case.name.as_str(), case.tier), ("school l2tp", MatchTier::CaseInsensitive));

        let spaces = find_vpn("homelabvpn", &candidates).unwrap();
        assert_eq!(spaces.tier, MatchTier::WhitespaceInsensitive);

        let partial = find_vpn("office", &candidates).unwrap();
        assert_eq!((partial.name.as_str(), partial.tier), ("Office VPN", MatchTier::Substring));

        assert_eq!(find_vpn("Campus", &candidates), None);
    }

    #[test]
    fn test_candidate_inside_target_is_not_a_match() {
        let candidates = names(&["VPN", "Thunderbolt Bridge"]);
        assert_eq!(find_vpn("Office VPN", &candidates), None);
    }

    #[test]
    fn test_short_service_name_is_not_connected() {
        let shell = Arc::new(FakeShell::new().on(
            "networksetup -listallnetworkservices",
            CommandOutput::ok("An asterisk (*) denotes that a network service is disabled.\nVPN\nThunderbolt Bridge\n"),
        ));
        let err = run(&shell).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("available connections: VPN"));
        assert!(!shell.was_called("networksetup -connectpppoeservice"));
    }

    #[test]
    fn test_higher_tier_wins_over_earlier_candidate() {
        let candidates = names(&["Office VPN", "OfficeVPN"]);
        let found = find_vpn("officevpn", &candidates).unwrap();
        assert_eq!(found.name, "OfficeVPN");
        assert_eq!(found.tier, MatchTier::CaseInsensitive);
    }

    #[test]
    fn test_connects_and_polls() {
        let shell = Arc::new(
            FakeShell::new()
                .on("networksetup -listallnetworkservices", CommandOutput::ok(SERVICES))
                .on("scutil --nc status Office VPN", CommandOutput::ok("Disconnected\n"))
                .on("scutil --nc status Office VPN", CommandOutput::ok("Connecting\n"))
                .on("scutil --nc status Office VPN", CommandOutput::ok("Connected\n"))
                .on("networksetup -connectpppoeservice Office VPN", CommandOutput::ok("")),
        );
        assert_eq!(run(&shell).unwrap(), StepOutcome::Done);
        assert!(shell.was_called("networksetup -connectpppoeservice"));
    }

    #[test]
    fn test_already_connected_is_skipped() {
        let shell = Arc::new(
            FakeShell::new()
                .on("networksetup -listallnetworkservices", CommandOutput::ok(SERVICES))
                .on("scutil --nc status Office VPN", CommandOutput::ok("Connected\n")),
        );
        assert!(matches!(run(&shell).unwrap(), StepOutcome::Skipped(_)));
        assert!(!shell.was_called("networksetup -connectpppoeservice"));
    }

    #[test]
    fn test_unknown_name_lists_candidates() {
        let shell = Arc::new(FakeShell::new().on(
            "networksetup -listallnetworkservices",
            CommandOutput::ok("An asterisk (*) denotes that a network service is disabled.\nWi-Fi\nCampus L2TP\n"),
        ));
        let err = run(&shell).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("Campus L2TP"));
    }

    #[test]
    fn test_no_vpn_services() {
        let shell = Arc::new(FakeShell::new().on(
            "networksetup -listallnetworkservices",
            CommandOutput::ok("An asterisk (*) denotes that a network service is disabled.\nWi-Fi\nEthernet\n"),
        ));
        assert!(run(&shell).unwrap_err().to_string().contains("no VPN connections"));
    }

    #[test]
    fn test_fails_fast_when_connection_drops() {
        let shell = Arc::new(
            FakeShell::new()
                .on("networksetup -listallnetworkservices", CommandOutput::ok(SERVICES))
                .on("scutil --nc status Office VPN", CommandOutput::ok("Disconnected\n"))
                .on("networksetup -connectpppoeservice Office VPN", CommandOutput::ok("")),
        );
        let err = run(&shell).unwrap_err();
        assert!(err.to_string().contains("dropped"));
        // Initial check plus seven polls.
        let polls = shell
            .calls()
            .iter()
            .filter(|c| c.starts_with("scutil"))
            .count();
        assert_eq!(polls, 8);
    }

    #[test]
    fn test_times_out_while_connecting() {
        let shell = Arc::new(
            FakeShell::new()
                .on("networksetup -listallnetworkservices", CommandOutput::ok(SERVICES))
                .on("scutil --nc status Office VPN", CommandOutput::ok("Disconnected\n"))
                .on("scutil --nc status Office VPN", CommandOutput::ok("Connecting\n"))
                .on("networksetup -connectpppoeservice Office VPN", CommandOutput::ok("")),
        );
        assert!(run(&shell).unwrap_err().to_string().contains("timed out"));
    }

    #[test]
    fn test_disconnect() {
        let shell = FakeShell::new()
            .on("networksetup -listallnetworkservices", CommandOutput::ok(SERVICES))
            .on("networksetup -disconnectpppoeservice Office VPN", CommandOutput::ok(""));
        assert_eq!(disconnect(&shell, "office vpn").unwrap(), "Office VPN");
    }
}
