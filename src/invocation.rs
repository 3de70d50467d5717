//! Where the installer was started from.

use std::path::{Path, PathBuf};

use crate::error::{ProvisionError, Result};

/// The two candidate bases for locating the project root.
///
/// Captured once at startup, before any stage runs a command in another
/// directory, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    script_anchor_dir: PathBuf,
    current_working_dir: PathBuf,
}

impl InvocationContext {
    pub fn new(script_anchor_dir: PathBuf, current_working_dir: PathBuf) -> Self {
        Self {
            script_anchor_dir,
            current_working_dir,
        }
    }

    /// Capture the running executable's directory (symlinks followed) and the
    /// current working directory.
    pub fn capture() -> Result<Self> {
        let exe = std::env::current_exe()
            .map_err(|e| ProvisionError::Environment(format!("current executable: {}", e)))?;
        let exe = exe.canonicalize().map_err(|e| {
            ProvisionError::Environment(format!("resolving {}: {}", exe.display(), e))
        })?;
        let script_anchor_dir = exe
            .parent()
            .ok_or_else(|| {
                ProvisionError::Environment(format!("{} has no parent directory", exe.display()))
            })?
            .to_path_buf();
        let current_working_dir = std::env::current_dir()
            .map_err(|e| ProvisionError::Environment(format!("working directory: {}", e)))?;

        tracing::debug!(
            anchor = %script_anchor_dir.display(),
            cwd = %current_working_dir.display(),
            "captured invocation context"
        );

        Ok(Self::new(script_anchor_dir, current_working_dir))
    }

    pub fn script_anchor_dir(&self) -> &Path {
        &self.script_anchor_dir
    }

    pub fn current_working_dir(&self) -> &Path {
        &self.current_working_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_resolves_absolute_dirs() {
        let ctx = InvocationContext::capture().unwrap();
        assert!(ctx.script_anchor_dir().is_absolute());
        assert!(ctx.script_anchor_dir().is_dir());
        assert_eq!(ctx.current_working_dir(), std::env::current_dir().unwrap());
    }
}
