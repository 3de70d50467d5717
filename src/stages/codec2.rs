//! codec2 built from source.
//!
//! The distro's codec2 predates the FreeDV data modes (DATAC1/3/4) that
//! freedvtnc2 drives, so we build upstream and install it under
//! `/usr/local`. The clone and its `build_linux/` directory are reused on
//! reruns and left in place if anything fails.

use crate::error::{ProvisionError, Result};
use crate::process::{Cmd, Runner};

use super::{Stage, StageContext};

/// Name ldconfig lists the installed library under.
pub const LIBRARY_NAME: &str = "libcodec2";

pub struct Codec2Build;

impl Stage for Codec2Build {
    fn description(&self) -> &'static str {
        "Building codec2 from source..."
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<()> {
        fetch_source(ctx)?;
        compile(ctx)?;
        install(ctx)?;
        match ensure_linker_registration(ctx)? {
            LinkerRegistration::AlreadyDiscoverable => {
                println!("  {} found in linker cache", LIBRARY_NAME)
            }
            LinkerRegistration::Registered => println!(
                "  Registered {} in {}",
                ctx.config.lib_dir.display(),
                ctx.config.ld_conf.display()
            ),
        }
        Ok(())
    }
}

fn build_err(step: &'static str) -> impl Fn(anyhow::Error) -> ProvisionError {
    move |source| ProvisionError::Build { step, source }
}

/// Clone if absent, otherwise pull in place.
fn fetch_source(ctx: &StageContext<'_>) -> Result<()> {
    let src = &ctx.config.codec2_src_dir;
    if src.exists() {
        println!("  Updating {}", src.display());
        ctx.runner
            .stream(
                Cmd::new("git")
                    .arg("-C")
                    .arg_path(src)
                    .arg("pull")
                    .error_msg("git pull failed"),
            )
            .map_err(build_err("update"))
    } else {
        println!("  Cloning {}", ctx.config.codec2_git_url);
        ctx.runner
            .stream(
                Cmd::new("git")
                    .arg("clone")
                    .arg(&ctx.config.codec2_git_url)
                    .arg_path(src)
                    .error_msg("git clone failed"),
            )
            .map_err(build_err("clone"))
    }
}

fn compile(ctx: &StageContext<'_>) -> Result<()> {
    let build_dir = ctx.config.codec2_build_dir();
    std::fs::create_dir_all(&build_dir).map_err(|e| ProvisionError::io(&build_dir, e))?;

    ctx.runner
        .stream(
            Cmd::new("cmake")
                .arg("..")
                .dir(&build_dir)
                .error_msg("cmake failed"),
        )
        .map_err(build_err("configure"))?;

    let jobs = parallel_jobs();
    tracing::debug!(jobs, "compiling codec2");
    ctx.runner
        .stream(
            Cmd::new("make")
                .arg(format!("-j{}", jobs))
                .dir(&build_dir)
                .error_msg("make failed"),
        )
        .map_err(build_err("compile"))
}

fn install(ctx: &StageContext<'_>) -> Result<()> {
    let build_dir = ctx.config.codec2_build_dir();
    ctx.runner
        .stream(ctx.privileged(
            Cmd::new("make")
                .arg("install")
                .dir(&build_dir)
                .error_msg("make install failed"),
        ))
        .map_err(build_err("install"))?;
    refresh_linker_cache(ctx)
}

/// Number of compile jobs: every available core.
pub fn parallel_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkerRegistration {
    /// ldconfig already knew the library; nothing was written.
    AlreadyDiscoverable,
    /// The linker fragment was written and the cache refreshed.
    Registered,
}

/// Make sure the dynamic linker can find libcodec2.
///
/// The fragment is only written when the library is missing from the cache,
/// so reruns never register the directory twice.
pub fn ensure_linker_registration(ctx: &StageContext<'_>) -> Result<LinkerRegistration> {
    if library_discoverable(ctx.runner, LIBRARY_NAME)? {
        return Ok(LinkerRegistration::AlreadyDiscoverable);
    }

    let lib_dir = ctx.config.lib_dir.display().to_string();
    let ld_conf = ctx.config.ld_conf.display().to_string();
    tracing::info!(
        lib_dir = %lib_dir,
        ld_conf = %ld_conf,
        "library not in linker cache, registering"
    );

    ctx.runner
        .capture(ctx.privileged(fragment_writer(&lib_dir, &ld_conf)))
        .map_err(build_err("linker registration"))?;
    refresh_linker_cache(ctx)?;

    if !library_discoverable(ctx.runner, LIBRARY_NAME)? {
        return Err(ProvisionError::Build {
            step: "linker registration",
            source: anyhow::anyhow!(
                "{} still not in linker cache after adding {} to {}",
                LIBRARY_NAME,
                lib_dir,
                ld_conf
            ),
        });
    }

    Ok(LinkerRegistration::Registered)
}

/// `sh` invocation writing `lib_dir` as the only line of `ld_conf`.
///
/// Paths travel as positional parameters, so no quoting is involved.
pub fn fragment_writer(lib_dir: &str, ld_conf: &str) -> Cmd {
    Cmd::new("sh")
        .args(["-c", r#"printf '%s\n' "$1" > "$2""#, "sh", lib_dir, ld_conf])
        .error_msg(format!("cannot write {}", ld_conf))
}

fn refresh_linker_cache(ctx: &StageContext<'_>) -> Result<()> {
    ctx.runner
        .capture(ctx.privileged(Cmd::new("ldconfig").error_msg("ldconfig failed")))
        .map(|_| ())
        .map_err(build_err("ldconfig"))
}

/// Whether `ldconfig -p` lists `library`.
pub fn library_discoverable(runner: &dyn Runner, library: &str) -> Result<bool> {
    let result = runner
        .capture(Cmd::new("ldconfig").arg("-p").error_msg("ldconfig -p failed"))
        .map_err(build_err("linker cache query"))?;
    Ok(cache_lists(&result.stdout, library))
}

/// Match `library` against the entries of `ldconfig -p` output.
///
/// Entries look like `\tlibcodec2.so.1.2 (libc6,x86-64) => /usr/local/lib/libcodec2.so.1.2`.
pub fn cache_lists(ldconfig_output: &str, library: &str) -> bool {
    ldconfig_output
        .lines()
        .filter_map(|l| l.split_whitespace().next())
        .any(|soname| {
            soname
                .strip_prefix(library)
                .is_some_and(|rest| rest.starts_with(".so"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LDCONFIG_P: &str = "\
1234 libs found in cache `/etc/ld.so.cache'
\tlibcodec2.so.1.2 (libc6,x86-64) => /usr/local/lib/libcodec2.so.1.2
\tlibc.so.6 (libc6,x86-64) => /lib/x86_64-linux-gnu/libc.so.6
";

    #[test]
    fn finds_library_in_cache_listing() {
        assert!(cache_lists(LDCONFIG_P, "libcodec2"));
        assert!(cache_lists(LDCONFIG_P, "libc"));
    }

    #[test]
    fn prefix_of_another_library_does_not_match() {
        let out = "\tlibcodec2-extra.so.1 (libc6,x86-64) => /usr/lib/libcodec2-extra.so.1\n";
        assert!(!cache_lists(out, "libcodec2"));
    }

    #[test]
    fn header_line_is_ignored() {
        assert!(!cache_lists("42 libs found in cache\n", "libcodec2"));
    }

    #[test]
    fn fragment_writer_survives_quotes_in_paths() {
        let tmp = tempfile::TempDir::new().unwrap();
        let ld_conf = tmp.path().join("it's codec2.conf");
        let ld_conf = ld_conf.to_str().unwrap();

        fragment_writer("/opt/o'brien/lib", ld_conf).run().unwrap();

        assert_eq!(
            std::fs::read_to_string(ld_conf).unwrap(),
            "/opt/o'brien/lib\n"
        );
    }

    #[test]
    fn parallel_jobs_is_at_least_one() {
        assert!(parallel_jobs() >= 1);
    }
}
