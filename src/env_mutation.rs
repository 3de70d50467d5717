//! Idempotent mutations of the user's environment.
//!
//! Shell startup files and the process PATH are global state shared with
//! every later run. All edits go through [`EnvironmentMutation::apply`],
//! which checks before it writes.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{ProvisionError, Result};

/// What an [`EnvironmentMutation`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    AlreadyPresent,
}

/// A single change to persistent or in-process environment state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentMutation {
    /// `line` must appear verbatim in `file`. Appended only if absent.
    LinePresent { file: PathBuf, line: String },
    /// `dir` must lead the current process's PATH.
    ProcessPathPrepend { dir: PathBuf },
}

impl EnvironmentMutation {
    pub fn line_present(file: impl Into<PathBuf>, line: impl Into<String>) -> Self {
        Self::LinePresent {
            file: file.into(),
            line: line.into(),
        }
    }

    pub fn path_prepend(dir: impl Into<PathBuf>) -> Self {
        Self::ProcessPathPrepend { dir: dir.into() }
    }

    pub fn apply(&self) -> Result<MutationOutcome> {
        match self {
            Self::LinePresent { file, line } => {
                ensure_line_present(file, line).map_err(|e| ProvisionError::io(file, e))
            }
            Self::ProcessPathPrepend { dir } => Ok(prepend_process_path(dir)),
        }
    }
}

/// Append `line` to `file` unless an identical line is already there.
///
/// A missing file counts as "not present" and is created by the append.
/// Comparison is by exact line, so a commented-out copy does not count.
/// Lines are compared as raw bytes; the file need not be UTF-8.
pub fn ensure_line_present(file: &Path, line: &str) -> io::Result<MutationOutcome> {
    let existing = match fs::read(file) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e),
    };

    let wanted = line.as_bytes();
    let present = existing
        .split(|b| *b == b'\n')
        .map(|l| l.strip_suffix(b"\r").unwrap_or(l))
        .any(|l| l == wanted);
    if present {
        tracing::debug!(file = %file.display(), "line already present");
        return Ok(MutationOutcome::AlreadyPresent);
    }

    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = OpenOptions::new().create(true).append(true).open(file)?;
    if !existing.is_empty() && existing.last() != Some(&b'\n') {
        out.write_all(b"\n")?;
    }
    writeln!(out, "{}", line)?;

    tracing::info!(file = %file.display(), line, "appended line");
    Ok(MutationOutcome::Applied)
}

/// Put `dir` at the front of this process's PATH if it isn't on it yet.
///
/// Children spawned afterwards inherit the new PATH, and PATH lookups
/// through [`crate::process::which`] see it immediately.
pub fn prepend_process_path(dir: &Path) -> MutationOutcome {
    let current = std::env::var_os("PATH").unwrap_or_default();
    match prepended_path(&current, dir) {
        Some(new_path) => {
            std::env::set_var("PATH", &new_path);
            tracing::debug!(dir = %dir.display(), "prepended to PATH");
            MutationOutcome::Applied
        }
        None => MutationOutcome::AlreadyPresent,
    }
}

/// The PATH value with `dir` in front, or `None` if `dir` is already an entry.
pub fn prepended_path(current: &OsString, dir: &Path) -> Option<OsString> {
    if std::env::split_paths(current).any(|p| p == dir) {
        return None;
    }
    let entries = std::iter::once(dir.to_path_buf()).chain(std::env::split_paths(current));
    std::env::join_paths(entries).ok()
}

/// Write `content` to `path`, creating parent directories as needed.
pub fn write_file_with_dirs(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ProvisionError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| ProvisionError::io(path, e))
}
