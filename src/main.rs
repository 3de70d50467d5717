//! rnm-setup - provisions a host for a Reticulum radio mesh node.
//!
//! Installs system packages, builds codec2 from source, installs freedvtnc2,
//! Reticulum and the node manager with pipx, then verifies every entry point.

use anyhow::Result;
use clap::Parser;

use rnm_setup::commands;
use rnm_setup::config::Config;
use rnm_setup::invocation::InvocationContext;
use rnm_setup::logging;

#[derive(Parser)]
#[command(name = "rnm-setup")]
#[command(about = "Provision this host for a Reticulum radio mesh node")]
#[command(after_help = concat!(
    "Run from inside the rnm checkout. Safe to re-run: every step is idempotent.\n\n",
    "CONFIGURATION (.env or environment):\n",
    "  RNM_SETUP_PRIVILEGE  CODEC2_GIT_URL  CODEC2_SRC_DIR\n",
    "  RNM_SETUP_SHELL_RC   RNM_SETUP_LIB_DIR  RNM_SETUP_LD_CONF",
))]
struct Cli {
    /// Only check what is installed; change nothing
    #[arg(long)]
    verify_only: bool,

    /// Also check optional components (nomadnet, lxmd)
    #[arg(long)]
    all: bool,

    /// Print the verification report as JSON (with --verify-only)
    #[arg(long, requires = "verify_only")]
    json: bool,

    /// Show the effective configuration and exit
    #[arg(long)]
    show_config: bool,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Before anything can change the working directory.
    let invocation = InvocationContext::capture()?;

    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = Config::load()?;

    if cli.show_config {
        config.print();
        return Ok(());
    }

    if cli.verify_only {
        return commands::cmd_verify(cli.all, cli.json);
    }

    commands::cmd_install(&invocation, &config, cli.all)
}
