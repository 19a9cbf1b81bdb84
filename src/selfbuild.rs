//! Self-rebuild protocol: detect staleness of the running build-script
//! executable relative to its declared sources, rebuild it, and replace
//! the current process image with the rebuilt binary.

use std::path::Path;

use tracing::{error, info};

use crate::error::{CbuildError, Result};
use crate::util::fs::{current_exe, mtime, newer_than, remove_file_if_exists};
use crate::util::process::run_shell_line;

/// Check whether any of `sources` is newer than the running executable and,
/// if so, rebuild it by running `rebuild_command` (a shell line expected to
/// reproduce the executable at its original path) and replace the current
/// process image with the result, passing through the original argv
/// unchanged. Returns `Ok(())` without side effects if nothing is stale.
///
/// On Unix this is a true `exec`; nothing after a successful rebuild runs
/// in this process again. On Windows, where image substitution isn't
/// available, the rebuilt binary is spawned with inherited stdio and this
/// process exits with its status once it completes — externally
/// indistinguishable to the invoking shell.
pub fn rebuild_if_stale(sources: &[impl AsRef<Path>], rebuild_command: &str) -> Result<()> {
    let exe = current_exe()?;
    let old = old_path(&exe);
    remove_file_if_exists(&old)?;

    let exe_mtime = mtime(&exe)?;
    let stale = sources.iter().any(|s| {
        mtime(s.as_ref())
            .ok()
            .flatten()
            .map(|source_mtime| newer_than(Some(source_mtime), exe_mtime))
            .unwrap_or(false)
    });

    if !stale {
        return Ok(());
    }

    info!(rebuild_command, "build script sources changed, rebuilding");

    std::fs::rename(&exe, &old).map_err(|e| crate::error::io_err(&exe, e))?;

    match run_shell_line(rebuild_command, false) {
        Ok(outcome) if outcome.success => {}
        Ok(outcome) => {
            error!(code = outcome.code, "self-rebuild command failed");
            return Err(CbuildError::SelfRebuild(format!(
                "rebuild command exited with code {}",
                outcome.code
            )));
        }
        Err(e) => {
            error!(error = %e, "failed to spawn self-rebuild command");
            return Err(CbuildError::SelfRebuild(e.to_string()));
        }
    }

    replace_process_image(&exe)
}

fn old_path(exe: &Path) -> std::path::PathBuf {
    let mut name = exe.file_name().unwrap_or_default().to_os_string();
    name.push(".old");
    exe.with_file_name(name)
}

#[cfg(unix)]
fn replace_process_image(exe: &Path) -> Result<()> {
    use std::os::unix::process::CommandExt;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let err = std::process::Command::new(exe).args(&args).exec();
    // `exec` only returns on failure.
    Err(CbuildError::SelfRebuild(format!(
        "failed to exec rebuilt executable: {err}"
    )))
}

#[cfg(windows)]
fn replace_process_image(exe: &Path) -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let status = std::process::Command::new(exe)
        .args(&args)
        .status()
        .map_err(|e| CbuildError::SelfRebuild(e.to_string()))?;
    std::process::exit(status.code().unwrap_or(1));
}
