//! Provisioning stages.
//!
//! Each submodule is one step of the install, in run order:
//! - `packages` - apt packages
//! - `user_env` - PATH and pip configuration
//! - `codec2` - codec2 built from source and registered with the linker
//! - `apps` - freedvtnc2 and rns via pipx
//! - `project` - the node manager itself, from the local checkout
//! - `verify` - presence check of every installed entry point

pub mod apps;
pub mod codec2;
pub mod packages;
pub mod project;
pub mod user_env;
pub mod verify;

use crate::config::Config;
use crate::error::Result;
use crate::invocation::InvocationContext;
use crate::process::{Cmd, Runner};

/// Everything a stage may read. Stages never share mutable state other than
/// the filesystem and the process environment.
pub struct StageContext<'a> {
    pub config: &'a Config,
    pub invocation: &'a InvocationContext,
    pub runner: &'a dyn Runner,
    /// Include optional components in verification.
    pub include_optional: bool,
}

impl StageContext<'_> {
    /// Wrap `cmd` in the configured privilege program.
    pub fn privileged(&self, cmd: Cmd) -> Cmd {
        cmd.elevated(self.config.privilege())
    }
}

/// One step of the provisioning pipeline.
pub trait Stage {
    /// Progress line shown as `[n/total] <description>`.
    fn description(&self) -> &'static str;

    fn run(&self, ctx: &StageContext<'_>) -> Result<()>;
}

/// The full install, in order.
pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(packages::SystemPackages),
        Box::new(user_env::UserEnvironment),
        Box::new(codec2::Codec2Build),
        Box::new(apps::Applications),
        Box::new(project::LocalProject),
        Box::new(verify::Verification),
    ]
}
