//! The node manager itself, installed from the local checkout.

use std::path::{Path, PathBuf};

use crate::error::{ProvisionError, Result};
use crate::invocation::InvocationContext;
use crate::process::Cmd;

use super::{Stage, StageContext};

/// A directory holding this file is the project root.
pub const MANIFEST_MARKER: &str = "pyproject.toml";

/// A candidate base for the project root, given the invocation context.
type Candidate = fn(&InvocationContext) -> PathBuf;

/// Tried in order; first directory with the marker wins.
const CANDIDATES: &[Candidate] = &[anchor_parent, working_dir];

/// Installer shipped inside the checkout (`<root>/scripts/`, `<root>/bin/`).
fn anchor_parent(ctx: &InvocationContext) -> PathBuf {
    ctx.script_anchor_dir().join("..")
}

fn working_dir(ctx: &InvocationContext) -> PathBuf {
    ctx.current_working_dir().to_path_buf()
}

pub struct LocalProject;

impl Stage for LocalProject {
    fn description(&self) -> &'static str {
        "Installing rnm..."
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<()> {
        let root = resolve_project_root(ctx.invocation)?;
        println!("  Project root: {}", root.display());

        ctx.runner
            .stream(
                Cmd::new("pipx")
                    .arg("install")
                    .arg_path(&root)
                    .error_msg("pipx install of the project failed"),
            )
            .map_err(|source| ProvisionError::PackageManager {
                stage: "pipx install (project)",
                source,
            })
    }
}

/// Resolve the project root through the candidate chain.
pub fn resolve_project_root(invocation: &InvocationContext) -> Result<PathBuf> {
    let candidates: Vec<PathBuf> = CANDIDATES.iter().map(|c| c(invocation)).collect();

    for candidate in &candidates {
        if let Some(root) = validated_root(candidate) {
            tracing::debug!(root = %root.display(), "project root resolved");
            return Ok(root);
        }
        tracing::debug!(candidate = %candidate.display(), "no {} here", MANIFEST_MARKER);
    }

    Err(ProvisionError::root_resolution(MANIFEST_MARKER, &candidates))
}

/// `dir`, made absolute, if it holds the manifest marker.
fn validated_root(dir: &Path) -> Option<PathBuf> {
    if !dir.join(MANIFEST_MARKER).is_file() {
        return None;
    }
    dir.canonicalize().ok()
}
