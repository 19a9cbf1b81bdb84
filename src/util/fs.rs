//! Path and filesystem shims: directory creation/removal, mtime reads,
//! glob expansion, and self-executable discovery.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::warn;

use crate::error::{io_err, Result};

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| io_err(path, e))?;
    }
    Ok(())
}

pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| io_err(path, e))?;
    }
    Ok(())
}

pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| io_err(path, e))?;
    }
    Ok(())
}

/// Modification time of `path`, or `None` if it does not exist.
pub fn mtime(path: &Path) -> Result<Option<SystemTime>> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.modified().map_err(|e| io_err(path, e))?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path, e)),
    }
}

/// Strictly-greater-than mtime comparison at the contract's granularity.
/// Missing `rhs` is treated as infinitely old (so `lhs` always wins);
/// missing `lhs` is treated as infinitely old as well.
pub fn newer_than(lhs: Option<SystemTime>, rhs: Option<SystemTime>) -> bool {
    match (lhs, rhs) {
        (Some(l), Some(r)) => l > r,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Expand a source pattern relative to `base` into a sorted, deduplicated
/// list of real file paths. Logs a warning (and produces nothing) if the
/// pattern matches no file.
pub fn glob_files(base: &Path, pattern: &str) -> Vec<PathBuf> {
    let full_pattern = base.join(pattern);
    let full_pattern_str = full_pattern.to_string_lossy().into_owned();

    let mut matches: Vec<PathBuf> = match glob::glob(&full_pattern_str) {
        Ok(paths) => paths
            .filter_map(|entry| match entry {
                Ok(p) if p.is_file() => Some(p),
                Ok(_) => None,
                Err(e) => {
                    warn!(pattern = %full_pattern_str, error = %e, "glob entry error");
                    None
                }
            })
            .collect(),
        Err(e) => {
            warn!(pattern = %full_pattern_str, error = %e, "invalid glob pattern");
            Vec::new()
        }
    };

    if matches.is_empty() {
        warn!(pattern = %full_pattern_str, "source pattern matched no files");
    }

    matches.sort();
    matches.dedup();
    matches
}

pub fn current_exe() -> Result<PathBuf> {
    std::env::current_exe().map_err(|e| io_err("<current_exe>", e))
}
