//! Install command - runs every provisioning stage.

use anyhow::Result;

use crate::config::Config;
use crate::invocation::InvocationContext;
use crate::pipeline::Pipeline;
use crate::process::SystemRunner;
use crate::stages::{self, StageContext};

/// Execute the full install.
///
/// `invocation` must have been captured before anything else ran.
pub fn cmd_install(
    invocation: &InvocationContext,
    config: &Config,
    include_optional: bool,
) -> Result<()> {
    println!("=== Reticulum node setup ===");

    let runner = SystemRunner;
    let ctx = StageContext {
        config,
        invocation,
        runner: &runner,
        include_optional,
    };

    Pipeline::new(stages::default_stages()).run(&ctx)?;
    Ok(())
}
