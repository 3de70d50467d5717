//! Shared test utilities for rnm-setup tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::Result;
use rnm_setup::config::Config;
use rnm_setup::invocation::InvocationContext;
use rnm_setup::process::{Cmd, CommandResult, Runner};
use rnm_setup::stages::StageContext;
use tempfile::TempDir;

/// Scripted reply to a command.
#[derive(Debug, Clone)]
pub struct Reply {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Reply {
    pub fn ok(stdout: &str) -> Self {
        Self {
            code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn fail(code: i32, stderr: &str) -> Self {
        Self {
            code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

struct Rule {
    prefix: String,
    /// Consumed front to back; the last reply repeats.
    replies: RefCell<Vec<Reply>>,
}

/// A [`Runner`] that records every command line and answers from a script.
///
/// Commands with no matching rule succeed with empty output.
#[derive(Default)]
pub struct MockRunner {
    rules: Vec<Rule>,
    on_path: HashSet<String>,
    log: RefCell<Vec<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix` with `reply`.
    pub fn on(self, prefix: &str, reply: Reply) -> Self {
        self.on_sequence(prefix, vec![reply])
    }

    /// Answer successive matching commands with `replies` in order.
    pub fn on_sequence(mut self, prefix: &str, replies: Vec<Reply>) -> Self {
        self.rules.push(Rule {
            prefix: prefix.to_string(),
            replies: RefCell::new(replies),
        });
        self
    }

    /// Make `which` resolve these programs.
    pub fn with_on_path(mut self, programs: &[&str]) -> Self {
        self.on_path.extend(programs.iter().map(|p| p.to_string()));
        self
    }

    /// Every command line run so far.
    pub fn commands(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.log.borrow().iter().any(|c| c.starts_with(prefix))
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.log.borrow().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Index of the first command starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.log.borrow().iter().position(|c| c.starts_with(prefix))
    }

    fn reply_for(&self, line: &str) -> Reply {
        for rule in &self.rules {
            if line.starts_with(&rule.prefix) {
                let mut replies = rule.replies.borrow_mut();
                return if replies.len() > 1 {
                    replies.remove(0)
                } else {
                    replies[0].clone()
                };
            }
        }
        Reply::ok("")
    }

    fn execute(&self, cmd: &Cmd) -> Result<CommandResult> {
        let line = cmd.to_string();
        self.log.borrow_mut().push(line.clone());
        let reply = self.reply_for(&line);

        let result = CommandResult {
            status: ExitStatus::from_raw(reply.code << 8),
            stdout: reply.stdout,
            stderr: reply.stderr,
        };
        if !result.success() && !cmd.allows_failure() {
            return Err(cmd.failure(result.code(), &result.stderr));
        }
        Ok(result)
    }
}

impl Runner for MockRunner {
    fn capture(&self, cmd: Cmd) -> Result<CommandResult> {
        self.execute(&cmd)
    }

    fn stream(&self, cmd: Cmd) -> Result<()> {
        self.execute(&cmd).map(|_| ())
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.on_path
            .contains(program)
            .then(|| PathBuf::from(format!("/usr/bin/{}", program)))
    }
}

/// Test environment: a fake home, a checkout with the installer in
/// `scripts/`, and an unrelated working directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub home: PathBuf,
    /// Project checkout; holds the manifest only if `with_manifest_in_repo`.
    pub repo: PathBuf,
    /// Directory of the running installer (`repo/scripts`).
    pub anchor: PathBuf,
    /// Directory the installer was started from.
    pub cwd: PathBuf,
    pub config: Config,
}

impl TestEnv {
    /// Create a new test environment. Commands run unwrapped (no sudo) and
    /// the linker fragment lives inside the temp dir.
    pub fn new() -> Self {
        Self::with_vars(&[])
    }

    pub fn with_vars(extra: &[(&str, &str)]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let home = base.join("home");
        let repo = base.join("repo");
        let anchor = repo.join("scripts");
        let cwd = base.join("cwd");
        for dir in [&home, &anchor, &cwd] {
            fs::create_dir_all(dir).expect("Failed to create test dir");
        }

        let ld_conf = base.join("ld.so.conf.d/codec2.conf");
        let mut vars: HashMap<String, String> = HashMap::new();
        vars.insert("RNM_SETUP_PRIVILEGE".into(), String::new());
        vars.insert("RNM_SETUP_LD_CONF".into(), ld_conf.display().to_string());
        for (k, v) in extra {
            vars.insert(k.to_string(), v.to_string());
        }
        let config = Config::from_vars(home.clone(), &vars);

        Self {
            _temp_dir: temp_dir,
            home,
            repo,
            anchor,
            cwd,
            config,
        }
    }

    pub fn with_manifest_in_repo(self) -> Self {
        write_manifest(&self.repo);
        self
    }

    pub fn with_manifest_in_cwd(self) -> Self {
        write_manifest(&self.cwd);
        self
    }

    pub fn invocation(&self) -> InvocationContext {
        InvocationContext::new(self.anchor.clone(), self.cwd.clone())
    }

    /// Build a stage context borrowing `invocation` and `runner`.
    pub fn context<'a>(
        &'a self,
        invocation: &'a InvocationContext,
        runner: &'a dyn Runner,
    ) -> StageContext<'a> {
        StageContext {
            config: &self.config,
            invocation,
            runner,
            include_optional: false,
        }
    }

    pub fn bashrc(&self) -> PathBuf {
        self.home.join(".bashrc")
    }
}

pub fn write_manifest(dir: &Path) {
    fs::write(
        dir.join("pyproject.toml"),
        "[project]\nname = \"rnm\"\nversion = \"0.1.0\"\n",
    )
    .expect("Failed to write pyproject.toml");
}

/// `ldconfig -p` output that lists libcodec2.
pub const LDCONFIG_WITH_CODEC2: &str = "\
2 libs found in cache `/etc/ld.so.cache'
\tlibcodec2.so.1.2 (libc6,x86-64) => /usr/local/lib/libcodec2.so.1.2
\tlibc.so.6 (libc6,x86-64) => /lib/x86_64-linux-gnu/libc.so.6
";

/// `ldconfig -p` output without libcodec2.
pub const LDCONFIG_WITHOUT_CODEC2: &str = "\
1 libs found in cache `/etc/ld.so.cache'
\tlibc.so.6 (libc6,x86-64) => /lib/x86_64-linux-gnu/libc.so.6
";

/// Every required verification command.
pub const ALL_COMMANDS: &[&str] = &["freedvtnc2", "rnsd", "rigctld", "direwolf", "rnm", "aplay"];
