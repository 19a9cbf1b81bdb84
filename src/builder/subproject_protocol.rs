//! Subproject protocol: manifest query, manifest emission, and proxy
//! target creation for sibling build-script processes.

use std::path::Path;

use tracing::warn;

use crate::core::{GlobalSettings, Registry, SubprojectTarget, TargetKind};
use crate::util::process::run_shell_line_in;

/// Invoke `driver_exe` with `--manifest`, CWD set to `directory`, and parse
/// its stdout. Returns an empty list (with a warning logged) on spawn
/// failure or non-zero exit, per the "subproject manifest failure is a
/// warning" error-handling policy.
pub fn query_manifest(driver_exe: &Path, directory: &Path) -> Vec<SubprojectTarget> {
    let line = format!("\"{}\" --manifest", driver_exe.display());
    match run_shell_line_in(&line, directory, true) {
        Ok(outcome) if outcome.success => {
            parse_manifest(outcome.output.as_deref().unwrap_or_default())
        }
        Ok(outcome) => {
            warn!(
                driver = %driver_exe.display(),
                code = outcome.code,
                "subproject manifest query exited non-zero"
            );
            Vec::new()
        }
        Err(e) => {
            warn!(driver = %driver_exe.display(), error = %e, "failed to spawn subproject for manifest query");
            Vec::new()
        }
    }
}

/// Parse a manifest body: one `KIND NAME RELATIVE_PATH` record per
/// non-empty, non-`#` line. Lines with unknown tokens are skipped.
pub fn parse_manifest(text: &str) -> Vec<SubprojectTarget> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let kind_token = tokens.next()?;
            let name = tokens.next()?;
            let path = tokens.next()?;
            let kind = TargetKind::from_manifest_kind(kind_token)?;
            Some(SubprojectTarget {
                name: name.to_string(),
                kind,
                relative_output_path: path.into(),
            })
        })
        .collect()
}

/// Emit one manifest line per non-Proxy target, in registration order. Each
/// path is the target's output path relative to this process's own
/// directory, i.e. `<output_dir>/<filename>`.
pub fn emit_manifest(registry: &Registry, settings: &GlobalSettings) -> String {
    let mut out = String::new();
    for (_, target) in registry.targets_in_order() {
        if let Some(kind_token) = target.kind.manifest_kind() {
            let relative_path = settings
                .output_dir
                .join(target.output_filename(super::toolchain::host_os()));
            out.push_str(kind_token);
            out.push(' ');
            out.push_str(&target.name);
            out.push(' ');
            out.push_str(&relative_path.to_string_lossy());
            out.push('\n');
        }
    }
    out
}
