//! Verify command - checks what is installed without changing anything.

use anyhow::{bail, Result};

use crate::process::SystemRunner;
use crate::stages::verify;

/// Execute the verification report on its own.
pub fn cmd_verify(include_optional: bool, json: bool) -> Result<()> {
    let runner = SystemRunner;
    let report = verify::run_verification(&runner, &verify::items(include_optional));

    if json {
        println!("{}", report.to_json()?);
        if !report.all_found() {
            bail!("{} required component(s) missing", report.missing().len());
        }
        return Ok(());
    }

    report.print();
    verify::conclude(&runner, &report)?;
    Ok(())
}
