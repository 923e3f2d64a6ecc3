//! Pre-flight checks for symres
//!
//! Validates the target image and the external tool before the first engine
//! opens. The DWARF engine reports missing debug info itself when it loads.
//! Provides clear, actionable error messages when requirements aren't met.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::cli::{EngineKind, RunConfig};

/// Run all pre-flight checks for the configured engine
///
/// # Errors
/// Returns an error if the image is missing or the engine cannot run
pub fn run_preflight_checks(config: &RunConfig) -> Result<()> {
    check_image_exists(&config.image)?;
    if config.engine == EngineKind::Binutils {
        check_tool_runs(&config.addr2line)?;
    }
    Ok(())
}

/// Check if the target image exists and is a regular file
fn check_image_exists(image: &Path) -> Result<()> {
    if !image.exists() {
        bail!(
            "Image not found: {}\n\n\
             Pass the binary to resolve against with --image <PATH>.",
            image.display()
        );
    }
    if !image.is_file() {
        bail!(
            "Not a file: {}\n\n\
             --image must point to a binary, not a directory.",
            image.display()
        );
    }
    Ok(())
}

/// Check that the external tool can be started
fn check_tool_runs(program: &Path) -> Result<()> {
    let status = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| {
            format!(
                "Cannot run {}\n\n\
                 Install binutils or pass --addr2line <PATH>.",
                program.display()
            )
        })?;

    if !status.success() {
        bail!("{} --version exited with {status}", program.display());
    }
    Ok(())
}
