//! Configuration management for rnm-setup.
//!
//! Reads configuration from an optional .env file and environment variables.
//! Environment variables take precedence over .env file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Upstream codec2 repository. The distro package predates the FreeDV data
/// modes freedvtnc2 needs.
pub const DEFAULT_CODEC2_GIT_URL: &str = "https://github.com/drowe67/codec2.git";

/// Where `make install` puts libcodec2.
pub const DEFAULT_LIB_DIR: &str = "/usr/local/lib";

/// Linker fragment written only when libcodec2 is not already discoverable.
pub const DEFAULT_LD_CONF: &str = "/etc/ld.so.conf.d/codec2.conf";

pub const DEFAULT_PRIVILEGE: &str = "sudo";

/// rnm-setup configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Home directory of the invoking user.
    pub home: PathBuf,
    /// Program used to run privileged commands; `None` runs them directly.
    pub privilege: Option<String>,
    /// Git URL for codec2.
    pub codec2_git_url: String,
    /// Local codec2 clone (default: ~/codec2).
    pub codec2_src_dir: PathBuf,
    /// Shell startup file that receives the PATH export (default: ~/.bashrc).
    pub shell_rc: PathBuf,
    /// Directory libcodec2 is installed into.
    pub lib_dir: PathBuf,
    /// Dynamic linker config fragment for `lib_dir`.
    pub ld_conf: PathBuf,
}

impl Config {
    /// Load configuration from .env file and environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let home = dirs::home_dir().context("Cannot determine home directory")?;
        let vars: HashMap<String, String> = std::env::vars().collect();
        Ok(Self::from_vars(home, &vars))
    }

    /// Build a configuration from a variable map, falling back to defaults.
    pub fn from_vars(home: PathBuf, vars: &HashMap<String, String>) -> Self {
        let get = |key: &str| vars.get(key).map(|s| s.trim()).filter(|s| !s.is_empty());

        // Empty string is meaningful here: "already root, don't wrap".
        let privilege = match vars.get("RNM_SETUP_PRIVILEGE") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v.trim().to_string()),
            None => Some(DEFAULT_PRIVILEGE.to_string()),
        };

        let codec2_git_url = get("CODEC2_GIT_URL")
            .unwrap_or(DEFAULT_CODEC2_GIT_URL)
            .to_string();

        let codec2_src_dir = get("CODEC2_SRC_DIR")
            .map(|s| under_home(&home, s))
            .unwrap_or_else(|| home.join("codec2"));

        let shell_rc = get("RNM_SETUP_SHELL_RC")
            .map(|s| under_home(&home, s))
            .unwrap_or_else(|| home.join(".bashrc"));

        let lib_dir = PathBuf::from(get("RNM_SETUP_LIB_DIR").unwrap_or(DEFAULT_LIB_DIR));
        let ld_conf = PathBuf::from(get("RNM_SETUP_LD_CONF").unwrap_or(DEFAULT_LD_CONF));

        Self {
            home,
            privilege,
            codec2_git_url,
            codec2_src_dir,
            shell_rc,
            lib_dir,
            ld_conf,
        }
    }

    /// User-local bin directory pipx installs entry points into.
    pub fn user_bin_dir(&self) -> PathBuf {
        self.home.join(".local/bin")
    }

    /// pip's per-user configuration file.
    pub fn pip_conf(&self) -> PathBuf {
        self.home.join(".config/pip/pip.conf")
    }

    /// Out-of-tree build directory inside the codec2 clone.
    pub fn codec2_build_dir(&self) -> PathBuf {
        self.codec2_src_dir.join("build_linux")
    }

    pub fn privilege(&self) -> Option<&str> {
        self.privilege.as_deref()
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!(
            "  RNM_SETUP_PRIVILEGE: {}",
            self.privilege().unwrap_or("(none)")
        );
        println!("  CODEC2_GIT_URL: {}", self.codec2_git_url);
        println!("  CODEC2_SRC_DIR: {}", self.codec2_src_dir.display());
        println!("  RNM_SETUP_SHELL_RC: {}", self.shell_rc.display());
        println!("  RNM_SETUP_LIB_DIR: {}", self.lib_dir.display());
        println!("  RNM_SETUP_LD_CONF: {}", self.ld_conf.display());
        println!("  pip config: {}", self.pip_conf().display());
        if self.codec2_src_dir.join(".git").exists() {
            println!("  codec2 clone: FOUND (will be updated)");
        } else {
            println!("  codec2 clone: NOT FOUND (will be cloned)");
        }
    }
}

fn under_home(home: &Path, value: &str) -> PathBuf {
    let value = value.strip_prefix("~/").unwrap_or(value);
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        home.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_derive_from_home() {
        let cfg = Config::from_vars(PathBuf::from("/home/op"), &HashMap::new());
        assert_eq!(cfg.privilege(), Some("sudo"));
        assert_eq!(cfg.codec2_git_url, DEFAULT_CODEC2_GIT_URL);
        assert_eq!(cfg.codec2_src_dir, PathBuf::from("/home/op/codec2"));
        assert_eq!(cfg.codec2_build_dir(), PathBuf::from("/home/op/codec2/build_linux"));
        assert_eq!(cfg.shell_rc, PathBuf::from("/home/op/.bashrc"));
        assert_eq!(cfg.user_bin_dir(), PathBuf::from("/home/op/.local/bin"));
        assert_eq!(cfg.pip_conf(), PathBuf::from("/home/op/.config/pip/pip.conf"));
        assert_eq!(cfg.ld_conf, PathBuf::from(DEFAULT_LD_CONF));
    }

    #[test]
    fn empty_privilege_disables_wrapping() {
        let cfg = Config::from_vars(
            PathBuf::from("/root"),
            &vars(&[("RNM_SETUP_PRIVILEGE", "")]),
        );
        assert_eq!(cfg.privilege(), None);
    }

    #[test]
    fn relative_paths_join_home() {
        let cfg = Config::from_vars(
            PathBuf::from("/home/op"),
            &vars(&[
                ("CODEC2_SRC_DIR", "src/codec2"),
                ("RNM_SETUP_SHELL_RC", "~/.zshrc"),
            ]),
        );
        assert_eq!(cfg.codec2_src_dir, PathBuf::from("/home/op/src/codec2"));
        assert_eq!(cfg.shell_rc, PathBuf::from("/home/op/.zshrc"));
    }

    #[test]
    fn absolute_paths_kept() {
        let cfg = Config::from_vars(
            PathBuf::from("/home/op"),
            &vars(&[("CODEC2_SRC_DIR", "/opt/codec2")]),
        );
        assert_eq!(cfg.codec2_src_dir, PathBuf::from("/opt/codec2"));
    }
}
