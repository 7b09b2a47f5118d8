//! Driver package verification and installation.

use super::{Context, StepOutcome, StepResult};
use crate::constants;
use crate::error::StepError;
use crate::system::elevation;
use crate::system::probes;
use crate::utils::shell_quote;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Check that the driver package exists and looks like an installer package.
pub fn verify(ctx: &Context) -> StepResult {
    let path = ctx.locator.resolve(&ctx.config.driver_file);

    let metadata = fs::metadata(&path).map_err(|_| {
        StepError::Artifact(format!("driver file not found: {}", path.display()))
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != constants::DRIVER_EXTENSION {
        return Err(StepError::Artifact(format!(
            "driver file must be a .{} package: {}",
            constants::DRIVER_EXTENSION,
            path.display()
        )));
    }

    if metadata.len() < constants::DRIVER_MIN_BYTES {
        return Err(StepError::Artifact(format!(
            "driver file is too small ({} bytes), the download may be damaged",
            metadata.len()
        )));
    }

    let header = read_header(&path)
        .map_err(|e| StepError::Artifact(format!("cannot read driver file: {e}")))?;
    if header.is_empty() {
        return Err(StepError::Artifact(
            "driver file is not a valid installer package".to_string(),
        ));
    }
    if !header.starts_with(b"xar!") {
        tracing::debug!(path = %path.display(), "driver package has no xar header");
    }

    let digest = sha256_file(&path)
        .map_err(|e| StepError::Artifact(format!("cannot checksum driver file: {e}")))?;
    match &ctx.config.driver_sha256 {
        Some(expected) if *expected != digest => {
            return Err(StepError::Artifact(format!(
                "driver checksum mismatch: expected {expected}, got {digest}"
            )));
        }
        Some(_) => ctx.reporter().info("Driver checksum matches"),
        None => ctx.reporter().info(format!("Driver SHA-256: {digest}")),
    }

    Ok(StepOutcome::Done)
}

/// Install the driver package unless the vendor's driver is already present.
pub fn install(ctx: &Context) -> StepResult {
    let vendor = ctx.config.vendor();
    if let Some(evidence) = installed_driver(ctx, &vendor) {
        return Ok(StepOutcome::Skipped(format!(
            "{} driver already installed ({evidence})",
            ctx.config.printer_model
        )));
    }

    let path = ctx.locator.resolve(&ctx.config.driver_file);
    if !path.exists() {
        return Err(StepError::Artifact(format!(
            "driver file not found: {}",
            path.display()
        )));
    }
    let path = absolute(&path)
        .map_err(|e| StepError::Artifact(format!("cannot resolve driver path: {e}")))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    ctx.reporter().info(format!("Installing driver {file_name}"));

    let command = format!(
        "installer -pkg {} -target /",
        shell_quote(&path.to_string_lossy())
    );
    elevation::run_privileged(ctx.shell.as_ref(), &command, "driver install")?;

    // Advisory only: lpinfo may need privileges the operator does not have.
    match ctx.shell.run("lpinfo", &["-m"]) {
        Ok(output) if output.success && probes::mentions_vendor(&output.stdout, &vendor) => {
            ctx.reporter().info("Driver registered with CUPS");
        }
        Ok(_) | Err(_) => {
            ctx.reporter()
                .warn("Could not confirm the driver in the CUPS catalog; continuing");
        }
    }

    Ok(StepOutcome::Done)
}

/// Where an installed driver was found, if anywhere.
fn installed_driver(ctx: &Context, vendor: &str) -> Option<String> {
    if let Ok(output) = ctx.shell.run("lpinfo", &["-m"]) {
        if output.success && probes::mentions_vendor(&output.stdout, vendor) {
            return Some("listed by lpinfo".to_string());
        }
    }

    ctx.driver_dirs.iter().find_map(|dir| {
        let entries = fs::read_dir(dir).ok()?;
        entries
            .flatten()
            .find(|entry| probes::mentions_vendor(&entry.file_name().to_string_lossy(), vendor))
            .map(|entry| entry.path().display().to_string())
    })
}

fn read_header(path: &Path) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(constants::DRIVER_HEADER_BYTES);
    File::open(path)?
        .take(constants::DRIVER_HEADER_BYTES as u64)
        .read_to_end(&mut buffer)?;
    Ok(buffer)
}

fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
