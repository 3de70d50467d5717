//! Typed failures reported by the provisioning stages.

use std::path::PathBuf;

use thiserror::Error;

/// Why a provisioning run stopped.
///
/// Every stage before verification fails fast with one of these; the
/// verification stage collects all misses first and then returns
/// [`ProvisionError::Verification`].
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The program's own location or the working directory could not be read.
    #[error("cannot resolve invocation environment: {0}")]
    Environment(String),

    /// apt-get, pipx or another installer exited non-zero.
    #[error("package installation failed ({stage})")]
    PackageManager {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Fetching, configuring, compiling or registering the codec library failed.
    #[error("codec2 build failed during {step}")]
    Build {
        step: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// No candidate directory contains the project manifest.
    #[error(
        "could not find the project root ({marker} not found in any of: {searched})\n\
         Clone the full repository and run the installer from inside it."
    )]
    RootResolution { marker: String, searched: String },

    /// One or more required commands are missing after installation.
    #[error("{} required component(s) missing: {}", missing.len(), missing.join(", "))]
    Verification { missing: Vec<String> },

    /// A local file mutation (shell rc, pip config) failed.
    #[error("cannot update {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProvisionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn root_resolution(marker: &str, candidates: &[PathBuf]) -> Self {
        let searched = candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self::RootResolution {
            marker: marker.to_string(),
            searched,
        }
    }
}

pub type Result<T, E = ProvisionError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_resolution_lists_candidates() {
        let err = ProvisionError::root_resolution(
            "pyproject.toml",
            &[PathBuf::from("/opt/rnm"), PathBuf::from("/home/op")],
        );
        let msg = err.to_string();
        assert!(msg.contains("pyproject.toml not found in any of: /opt/rnm, /home/op"));
        assert!(msg.contains("Clone the full repository"));
    }

    #[test]
    fn verification_counts_missing() {
        let err = ProvisionError::Verification {
            missing: vec!["rnsd".into(), "direwolf".into()],
        };
        assert_eq!(
            err.to_string(),
            "2 required component(s) missing: rnsd, direwolf"
        );
    }
}
