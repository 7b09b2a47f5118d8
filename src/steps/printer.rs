//! USB printer detection.
//!
//! Registration is left to the operator through the CUPS admin page, so this
//! step only reports what the host can see.

use super::{Context, StepOutcome, StepResult};
use crate::system::probes;

pub fn detect(ctx: &Context) -> StepResult {
    ctx.wait(ctx.timings.detect_settle);

    let vendor = ctx.config.vendor();
    let model = &ctx.config.printer_model;

    match ctx.shell.run("system_profiler", &["SPUSBDataType"]) {
        Ok(output) if output.success => {
            if probes::mentions_vendor(&output.stdout, &vendor) {
                ctx.reporter().info(format!("{model} is connected over USB"));
            } else {
                ctx.reporter().warn(format!(
                    "{model} not found on USB; make sure it is plugged in and powered on"
                ));
            }
        }
        Ok(output) => ctx
            .reporter()
            .warn(format!("USB device query failed: {}", output.combined())),
        Err(e) => ctx.reporter().warn(format!("USB device query failed: {e}")),
    }

    let queues = ctx
        .shell
        .run("lpstat", &["-p"])
        .map(|output| probes::parse_lpstat_printers(&output.stdout))
        .unwrap_or_default();
    match queues.iter().find(|q| probes::mentions_vendor(q, &vendor)) {
        Some(queue) => ctx
            .reporter()
            .info(format!("Printer queue {queue} is registered")),
        None => ctx.reporter().info(format!(
            "No print queue for {model} yet; add it from the CUPS admin page"
        )),
    }

    Ok(StepOutcome::Done)
}
