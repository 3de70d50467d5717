//! PATH and pip configuration for the invoking user.

use crate::env_mutation::{write_file_with_dirs, EnvironmentMutation, MutationOutcome};
use crate::error::{ProvisionError, Result};
use crate::process::Cmd;

use super::{Stage, StageContext};

/// Line appended to the shell startup file.
pub const PATH_EXPORT_LINE: &str = r#"export PATH="$HOME/.local/bin:$PATH""#;

/// Lets `pip install --user` through the distro's externally-managed guard.
pub const PIP_CONF: &str = "[global]\nbreak-system-packages = true\n";

pub struct UserEnvironment;

impl Stage for UserEnvironment {
    fn description(&self) -> &'static str {
        "Configuring user environment..."
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<()> {
        ctx.runner
            .capture(Cmd::new("pipx").arg("ensurepath"))
            .map_err(|source| ProvisionError::PackageManager {
                stage: "pipx ensurepath",
                source,
            })?;

        let rc = &ctx.config.shell_rc;
        match EnvironmentMutation::line_present(rc, PATH_EXPORT_LINE).apply()? {
            MutationOutcome::Applied => {
                println!("  Added ~/.local/bin to PATH in {}", rc.display())
            }
            MutationOutcome::AlreadyPresent => {
                println!("  PATH already configured in {}", rc.display())
            }
        }

        EnvironmentMutation::path_prepend(ctx.config.user_bin_dir()).apply()?;

        let pip_conf = ctx.config.pip_conf();
        write_file_with_dirs(&pip_conf, PIP_CONF)?;
        println!("  Wrote {}", pip_conf.display());

        Ok(())
    }
}
