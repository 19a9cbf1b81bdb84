//! Compile-commands exporter: one entry per translation unit, written as
//! the standard IDE-consumed `compile_commands.json`.

use std::path::{Path, PathBuf};

use crate::core::{GlobalSettings, Registry};
use crate::error::Result;
use crate::util::fs::ensure_dir;

use super::toolchain::{compile_line, CompileInput};

#[derive(Debug, Clone, serde::Serialize)]
pub struct CompileCommandEntry {
    pub directory: String,
    pub command: String,
    pub file: String,
}

/// The compile-commands index: reset at the start of each `run` to avoid
/// cross-build contamination, then filled by pre-walking every non-Proxy
/// target before any build step actually happens.
#[derive(Debug, Clone, Default)]
pub struct CompileCommandsIndex {
    entries: Vec<CompileCommandEntry>,
}

impl CompileCommandsIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[CompileCommandEntry] {
        &self.entries
    }

    /// Synthesize the exact compile line for every source of every
    /// non-Proxy target, identical to what the scheduler would run.
    pub fn rebuild(&mut self, registry: &Registry, settings: &GlobalSettings, cwd: &Path) {
        self.reset();
        for (_, target) in registry.targets_in_order() {
            if target.kind.is_proxy() {
                continue;
            }
            for source in &target.sources {
                let object = target.object_path(&settings.output_dir, source);
                let input = CompileInput {
                    settings,
                    target,
                    source,
                    object: &object,
                };
                let command = compile_line(&input).render();
                self.entries.push(CompileCommandEntry {
                    directory: cwd.to_string_lossy().into_owned(),
                    command,
                    file: source.to_string_lossy().into_owned(),
                });
            }
        }
    }

    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        ensure_dir(output_dir)?;
        let path = output_dir.join("compile_commands.json");
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&path, json).map_err(|e| crate::error::io_err(&path, e))?;
        Ok(path)
    }
}
