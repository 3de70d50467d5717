//! CLI command handlers.
//!
//! - `install` - the full provisioning pipeline
//! - `verify` - only the verification report

mod install;
mod verify;

pub use install::cmd_install;
pub use verify::cmd_verify;
