//! Centralized command execution with consistent error handling.
//!
//! Every external tool the installer touches (apt-get, git, cmake, pipx,
//! ldconfig, the probed applications) is spawned through a [`Cmd`] and a
//! [`Runner`]. The runner is the seam the pipeline is tested through.

use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl CommandResult {
    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// First non-empty line of stdout, falling back to stderr.
    ///
    /// Several radio tools print their banner on stderr.
    pub fn first_line(&self) -> Option<&str> {
        fn first(s: &str) -> Option<&str> {
            s.lines().map(str::trim).find(|l| !l.is_empty())
        }
        first(&self.stdout).or_else(|| first(&self.stderr))
    }
}

/// Builder for configuring command execution.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    /// If true, don't fail on non-zero exit.
    allow_fail: bool,
    /// Custom error message prefix.
    error_prefix: Option<String>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            current_dir: None,
            allow_fail: false,
            error_prefix: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Allow non-zero exit codes without failing.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Set a custom error message prefix.
    pub fn error_msg(mut self, msg: impl AsRef<str>) -> Self {
        self.error_prefix = Some(msg.as_ref().to_string());
        self
    }

    /// Wrap the command in a privilege program (`sudo apt-get ...`).
    ///
    /// `None` leaves the command untouched, which is what a root shell wants.
    pub fn elevated(self, wrapper: Option<&str>) -> Self {
        let Some(wrapper) = wrapper else {
            return self;
        };
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: wrapper.to_string(),
            args,
            ..self
        }
    }

    pub fn allows_failure(&self) -> bool {
        self.allow_fail
    }

    fn failure_prefix(&self) -> String {
        self.error_prefix
            .clone()
            .unwrap_or_else(|| format!("'{}' failed", self.program))
    }

    /// Build the error for a non-zero exit, attaching stderr when there is any.
    pub fn failure(&self, code: i32, stderr: &str) -> anyhow::Error {
        let prefix = self.failure_prefix();
        let stderr = stderr.trim();
        if stderr.is_empty() {
            anyhow::anyhow!("{} (exit code {})", prefix, code)
        } else {
            anyhow::anyhow!("{} (exit code {}):\n{}", prefix, code, stderr)
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run the command and capture output.
    pub fn run(self) -> Result<CommandResult> {
        tracing::debug!(command = %self, "running (captured)");

        let output = self.command().output().with_context(|| {
            format!("Failed to execute '{}'. Is it installed?", self.program)
        })?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !self.allow_fail && !result.success() {
            return Err(self.failure(result.code(), &result.stderr));
        }

        Ok(result)
    }

    /// Run the command with inherited stdio (interactive/streaming).
    ///
    /// Output goes directly to the terminal. Use for long-running commands
    /// where the operator should see progress (package installs, compiles).
    pub fn run_interactive(self) -> Result<ExitStatus> {
        tracing::debug!(command = %self, "running (streamed)");

        let mut cmd = self.command();
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        let status = cmd.status().with_context(|| {
            format!("Failed to execute '{}'. Is it installed?", self.program)
        })?;

        if !self.allow_fail && !status.success() {
            bail!(
                "{} (exit code {})",
                self.failure_prefix(),
                status.code().unwrap_or(-1)
            );
        }

        Ok(status)
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

// =============================================================================
// Runner
// =============================================================================

/// Executes commands on behalf of the pipeline stages.
pub trait Runner {
    /// Run and capture output. Non-zero exits are errors unless the command
    /// was built with [`Cmd::allow_fail`].
    fn capture(&self, cmd: Cmd) -> Result<CommandResult>;

    /// Run with output streamed to the terminal. Non-zero exits are errors.
    fn stream(&self, cmd: Cmd) -> Result<()>;

    /// Resolve a program on the current PATH.
    fn which(&self, program: &str) -> Option<PathBuf>;
}

/// Runs commands on the real host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn capture(&self, cmd: Cmd) -> Result<CommandResult> {
        cmd.run()
    }

    fn stream(&self, cmd: Cmd) -> Result<()> {
        cmd.run_interactive().map(|_| ())
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        which(program)
    }
}

/// Check if a program exists in PATH.
///
/// Reads PATH at call time, so entries prepended earlier in the run are seen.
pub fn which(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

// =============================================================================
// Tests
// =============================================================================
