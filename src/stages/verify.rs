//! Post-install verification.
//!
//! Every expected entry point is probed, even after one is found missing,
//! so the operator gets the whole picture in one run.

use std::path::PathBuf;

use serde::Serialize;

use crate::audio;
use crate::error::{ProvisionError, Result};
use crate::process::{Cmd, Runner};

use super::{Stage, StageContext};

/// Substituted when a found command has no usable version output.
pub const VERSION_FALLBACK: &str = "installed";

/// A command the node needs on PATH.
#[derive(Debug, Clone, Copy)]
pub struct VerificationItem {
    pub command: &'static str,
    pub description: &'static str,
    /// Missing required items fail the run; missing optional ones are skipped.
    pub required: bool,
}

impl VerificationItem {
    const fn required(command: &'static str, description: &'static str) -> Self {
        Self {
            command,
            description,
            required: true,
        }
    }

    const fn optional(command: &'static str, description: &'static str) -> Self {
        Self {
            command,
            description,
            required: false,
        }
    }
}

pub const REQUIRED_ITEMS: &[VerificationItem] = &[
    VerificationItem::required("freedvtnc2", "FreeDV TNC2 (HF data modem)"),
    VerificationItem::required("rnsd", "Reticulum network daemon"),
    VerificationItem::required("rigctld", "Hamlib rigctld (PTT/CAT control)"),
    VerificationItem::required("direwolf", "Direwolf (VHF/UHF software TNC)"),
    VerificationItem::required("rnm", "Reticulum Node Manager"),
    VerificationItem::required("aplay", "ALSA audio device lister"),
];

pub const OPTIONAL_ITEMS: &[VerificationItem] = &[
    VerificationItem::optional("nomadnet", "NomadNet (mesh messaging)"),
    VerificationItem::optional("lxmd", "LXMF propagation daemon"),
];

/// Printed in order after a fully successful run.
pub const NEXT_STEPS: &[&str] = &[
    "Open a new shell (or `source ~/.bashrc`) so PATH changes take effect",
    "Create a configuration:      rnm setup",
    "Validate it:                 rnm validate",
    "Start the node:              rnm start",
    "Optionally start on boot:    rnm install-service",
];

/// Outcome of probing one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationRecord {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub found: bool,
    /// Resolved executable, when found.
    pub path: Option<PathBuf>,
    /// First line of `--version`, or [`VERSION_FALLBACK`]. `None` when missing.
    pub version: Option<String>,
}

/// All verification records, in probe order.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub records: Vec<VerificationRecord>,
}

impl VerificationReport {
    /// True when no required item is missing.
    pub fn all_found(&self) -> bool {
        self.records.iter().all(|r| r.found || !r.required)
    }

    /// Names of missing required items.
    pub fn missing(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.required && !r.found)
            .map(|r| r.name.clone())
            .collect()
    }

    /// Print one status line per item, then a summary.
    pub fn print(&self) {
        println!("=== Verification ===\n");

        for record in &self.records {
            let status = match (record.found, record.required) {
                (true, _) => "  OK ",
                (false, true) => " MISS",
                (false, false) => " SKIP",
            };
            let detail = match (&record.version, &record.path) {
                (Some(version), Some(path)) => format!(": {} ({})", version, path.display()),
                (Some(version), None) => format!(": {}", version),
                _ => String::new(),
            };
            println!(
                "  [{}] {} - {}{}",
                status, record.name, record.description, detail
            );
        }

        println!();
        let found = self.records.iter().filter(|r| r.found).count();
        println!("Summary: {}/{} found", found, self.records.len());
        let missing = self.missing();
        if !missing.is_empty() {
            println!("         {} required MISSING", missing.len());
        }
    }

    /// The report as pretty JSON.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Probe every item. Never stops early.
pub fn run_verification(runner: &dyn Runner, items: &[VerificationItem]) -> VerificationReport {
    let records = items.iter().map(|item| probe(runner, item)).collect();
    VerificationReport { records }
}

fn probe(runner: &dyn Runner, item: &VerificationItem) -> VerificationRecord {
    let path = runner.which(item.command);
    let version = path.as_ref().map(|_| probe_version(runner, item.command));
    tracing::debug!(command = item.command, found = path.is_some(), "probed");

    VerificationRecord {
        name: item.command.to_string(),
        description: item.description.to_string(),
        required: item.required,
        found: path.is_some(),
        path,
        version,
    }
}

/// First line of `<command> --version`; a failing or silent probe yields
/// [`VERSION_FALLBACK`].
pub fn probe_version(runner: &dyn Runner, command: &str) -> String {
    runner
        .capture(Cmd::new(command).arg("--version").allow_fail())
        .ok()
        .filter(|r| r.success())
        .and_then(|r| r.first_line().map(str::to_string))
        .unwrap_or_else(|| VERSION_FALLBACK.to_string())
}

/// Items checked in this run.
pub fn items(include_optional: bool) -> Vec<VerificationItem> {
    let mut items = REQUIRED_ITEMS.to_vec();
    if include_optional {
        items.extend_from_slice(OPTIONAL_ITEMS);
    }
    items
}

pub struct Verification;

impl Stage for Verification {
    fn description(&self) -> &'static str {
        "Verifying installation..."
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<()> {
        let report = run_verification(ctx.runner, &items(ctx.include_optional));
        report.print();
        conclude(ctx.runner, &report)
    }
}

/// Print the guidance block (or the failure diagnostic) and turn the report
/// into the run's verdict.
pub fn conclude(runner: &dyn Runner, report: &VerificationReport) -> Result<()> {
    if !report.all_found() {
        println!("Some components are missing. Review the output above, fix the cause");
        println!("and re-run the installer; completed steps are skipped or repeated safely.");
        return Err(ProvisionError::Verification {
            missing: report.missing(),
        });
    }

    println!("All components installed.\n");
    println!("Next steps:");
    for (i, step) in NEXT_STEPS.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }

    let devices = audio::detect_audio_devices(runner);
    if !devices.is_empty() {
        println!("\nDetected audio devices (for modem input/output settings):");
        for dev in &devices {
            let usb = if dev.is_usb { " [USB]" } else { "" };
            println!("  {}  {}{}", dev.alsa_name, dev.name, usb);
        }
    }
    println!();

    Ok(())
}
