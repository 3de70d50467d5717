//! System packages via apt.

use crate::error::{ProvisionError, Result};
use crate::process::Cmd;

use super::{Stage, StageContext};

/// Installed in one batch, in this order.
pub const SYSTEM_PACKAGES: &[&str] = &[
    "git",
    "build-essential",
    "cmake",
    "pkg-config",
    "python3",
    "python3-pip",
    "python3-venv",
    "pipx",
    "direwolf",
    "libhamlib-utils",
    "alsa-utils",
    "portaudio19-dev",
    "libasound2-dev",
];

pub struct SystemPackages;

impl Stage for SystemPackages {
    fn description(&self) -> &'static str {
        "Installing system packages..."
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<()> {
        let fail = |source| ProvisionError::PackageManager {
            stage: "apt-get",
            source,
        };

        ctx.runner
            .stream(ctx.privileged(
                Cmd::new("apt-get")
                    .arg("update")
                    .error_msg("apt-get update failed"),
            ))
            .map_err(fail)?;

        ctx.runner
            .stream(ctx.privileged(
                Cmd::new("apt-get")
                    .args(["install", "-y"])
                    .args(SYSTEM_PACKAGES)
                    .error_msg("apt-get install failed"),
            ))
            .map_err(fail)?;

        Ok(())
    }
}
