//! Standalone applications, each in its own pipx venv.

use crate::error::{ProvisionError, Result};
use crate::process::Cmd;

use super::{Stage, StageContext};

/// (pipx package, what it is). freedvtnc2 needs the codec2 built earlier.
pub const APPLICATIONS: &[(&str, &str)] = &[
    ("freedvtnc2", "FreeDV TNC2 data modem"),
    ("rns", "Reticulum network stack"),
];

pub struct Applications;

impl Stage for Applications {
    fn description(&self) -> &'static str {
        "Installing freedvtnc2 and Reticulum..."
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<()> {
        for &(package, what) in APPLICATIONS {
            println!("  {} ({})", package, what);
            // pipx exits 0 when the package is already installed.
            ctx.runner
                .stream(
                    Cmd::new("pipx")
                        .args(["install", package])
                        .error_msg(format!("pipx install {} failed", package)),
                )
                .map_err(|source| ProvisionError::PackageManager {
                    stage: "pipx install",
                    source,
                })?;
        }
        Ok(())
    }
}
