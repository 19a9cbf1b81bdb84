//! Scheduler / driver: depth-first graph walk with cycle detection,
//! dispatching command execution, compilation, and linking.

use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, error};

use crate::core::{CommandId, GlobalSettings, Registry, TargetId, TargetKind};
use crate::util::fs::ensure_dir;
use crate::util::process::run_shell_line;

use super::freshness::{link_is_stale, source_is_stale};
use super::toolchain::{archive_line, compile_line, link_line, ArchiveInput, CompileInput, LinkInput};

/// Owns the per-run `visited`/`in_stack` bit vectors and the single
/// `error_flag` that short-circuits the walk on first failure.
pub struct Driver<'a> {
    registry: &'a mut Registry,
    settings: &'a GlobalSettings,
    visited: Vec<bool>,
    in_stack: Vec<bool>,
    error_flag: bool,
    error_message: Option<String>,
}

impl<'a> Driver<'a> {
    pub fn new(registry: &'a mut Registry, settings: &'a GlobalSettings) -> Self {
        let n = registry.target_count();
        registry.reset_command_memoization();
        rayon::ThreadPoolBuilder::new()
            .num_threads(settings.parallelism)
            .build_global()
            .ok();
        Driver {
            registry,
            settings,
            visited: vec![false; n],
            in_stack: vec![false; n],
            error_flag: false,
            error_message: None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Build every registered non-Proxy target in registration order.
    pub fn build_all(&mut self) -> bool {
        let ids: Vec<TargetId> = self
            .registry
            .targets_in_order()
            .map(|(id, _)| id)
            .collect();
        for id in ids {
            self.visit_target(id);
            if self.error_flag {
                break;
            }
        }
        !self.error_flag
    }

    /// Build only `id`'s DFS closure (used for registered-subcommand builds
    /// and for positional target-name selection).
    pub fn build_target_closure(&mut self, id: TargetId) -> bool {
        self.visit_target(id);
        !self.error_flag
    }

    fn visit_target(&mut self, id: TargetId) {
        if self.error_flag {
            return;
        }
        let idx = id.0;
        if idx >= self.visited.len() {
            return;
        }
        if self.in_stack[idx] {
            let name = self
                .registry
                .target(id)
                .map(|t| t.name.clone())
                .unwrap_or_default();
            error!(target = %name, "circular dependency detected");
            self.error_flag = true;
            self.error_message = Some(format!("circular dependency detected at target `{name}`"));
            return;
        }
        if self.visited[idx] {
            return;
        }

        self.in_stack[idx] = true;

        let pre_commands = self
            .registry
            .target(id)
            .map(|t| t.pre_commands.clone())
            .unwrap_or_default();
        for cmd in pre_commands {
            if !self.visit_command(cmd) {
                self.in_stack[idx] = false;
                return;
            }
        }

        let target_deps = self
            .registry
            .target(id)
            .map(|t| t.target_deps.clone())
            .unwrap_or_default();
        for dep in target_deps {
            self.visit_target(dep);
            if self.error_flag {
                self.in_stack[idx] = false;
                return;
            }
        }

        if !self.build_target_artifact(id) {
            self.in_stack[idx] = false;
            self.error_flag = true;
            return;
        }

        let post_commands = self
            .registry
            .target(id)
            .map(|t| t.post_commands.clone())
            .unwrap_or_default();
        for cmd in post_commands {
            if !self.visit_command(cmd) {
                self.in_stack[idx] = false;
                return;
            }
        }

        self.visited[idx] = true;
        self.in_stack[idx] = false;
    }

    /// Memoized command visitor: recurses into dependencies first (in
    /// registration order), runs the command once, and caches the result.
    fn visit_command(&mut self, id: CommandId) -> bool {
        if let Some(cmd) = self.registry.command(id) {
            if cmd.is_memoized() {
                return cmd.cached_result().unwrap_or(false);
            }
        } else {
            return true;
        }

        let deps = self
            .registry
            .command(id)
            .map(|c| c.dependencies.clone())
            .unwrap_or_default();
        for dep in deps {
            if !self.visit_command(dep) {
                return false;
            }
        }

        let (name, line) = match self.registry.command(id) {
            Some(c) => (c.name.clone(), c.command_line.clone()),
            None => return true,
        };

        debug!(command = %name, line = %line, "running command");
        let outcome = run_shell_line(&line, true);
        let success = match outcome {
            Ok(o) => {
                if !o.success {
                    if let Some(output) = &o.output {
                        error!(command = %name, output = %output, "command failed");
                    } else {
                        error!(command = %name, "command failed");
                    }
                }
                o.success
            }
            Err(e) => {
                error!(command = %name, error = %e, "failed to spawn command");
                false
            }
        };

        if let Some(cmd) = self.registry.command_mut(id) {
            cmd.executed = true;
            cmd.result = Some(success);
        }
        success
    }

    /// Compile stale sources, then archive/link if stale. No-op for Proxy
    /// targets, which have no sources and are consumed by mtime only.
    fn build_target_artifact(&mut self, id: TargetId) -> bool {
        let kind = match self.registry.target(id) {
            Some(t) => t.kind,
            None => return true,
        };
        if kind.is_proxy() {
            return true;
        }

        let output_dir = self.settings.output_dir.clone();
        let (name, sources, obj_dir) = {
            let target = self.registry.target(id).unwrap();
            (
                target.name.clone(),
                target.sources.clone(),
                target.obj_dir(&output_dir),
            )
        };

        if ensure_dir(&obj_dir).is_err() {
            error!(target = %name, "failed to create object directory");
            return false;
        }

        // Staleness is checked sequentially, up front, so `objects` keeps
        // source-registration order regardless of how compilation itself is
        // scheduled; only the actual compiler invocations run in parallel.
        let target = self.registry.target(id).unwrap();
        let objects: Vec<PathBuf> = sources
            .iter()
            .map(|source| target.object_path(&output_dir, source))
            .collect();

        let mut to_compile = Vec::with_capacity(sources.len());
        for (source, object) in sources.iter().zip(&objects) {
            let stale = match source_is_stale(source, object) {
                Ok(s) => s,
                Err(e) => {
                    error!(target = %name, source = %source.display(), error = %e, "freshness check failed");
                    return false;
                }
            };
            if stale {
                to_compile.push((source, object));
            }
        }

        if !to_compile.is_empty() {
            debug!(target = %name, count = to_compile.len(), "compiling");
            let target = self.registry.target(id).unwrap();
            let results: Vec<std::result::Result<(), String>> = to_compile
                .par_iter()
                .map(|(source, object)| {
                    let source: &std::path::Path = source.as_path();
                    let object: &std::path::Path = object.as_path();
                    let input = CompileInput {
                        settings: self.settings,
                        target,
                        source,
                        object,
                    };
                    let line = compile_line(&input).render();
                    match run_shell_line(&line, true) {
                        Ok(o) if o.success => Ok(()),
                        Ok(o) => Err(format!(
                            "compile of {} failed: {}",
                            source.display(),
                            o.output.unwrap_or_default()
                        )),
                        Err(e) => Err(format!("failed to spawn compiler for {}: {e}", source.display())),
                    }
                })
                .collect();

            for result in results {
                if let Err(detail) = result {
                    error!(target = %name, error = %detail, "compile failed");
                    return false;
                }
            }
        }

        let output_path = output_path_for(self.registry, id, &output_dir);
        let dep_artifacts: Vec<PathBuf> = {
            let target = self.registry.target(id).unwrap();
            target
                .target_deps
                .iter()
                .filter_map(|dep| {
                    let dep_target = self.registry.target(*dep)?;
                    if dep_target.kind.is_linkable() || dep_target.kind.is_proxy() {
                        Some(output_path_for(self.registry, *dep, &output_dir))
                    } else {
                        None
                    }
                })
                .collect()
        };

        let stale = match link_is_stale(&output_path, &objects, &dep_artifacts) {
            Ok(s) => s,
            Err(e) => {
                error!(target = %name, error = %e, "freshness check failed for link step");
                return false;
            }
        };
        if !stale {
            return true;
        }

        if ensure_dir(output_path.parent().unwrap_or(&output_dir)).is_err() {
            error!(target = %name, "failed to create output directory");
            return false;
        }

        let target = self.registry.target(id).unwrap();
        let line = if kind == TargetKind::StaticLibrary {
            let input = ArchiveInput {
                settings: self.settings,
                target,
                objects: &objects,
                output: &output_path,
            };
            archive_line(&input).render()
        } else {
            let input = LinkInput {
                settings: self.settings,
                target,
                objects: &objects,
                output: &output_path,
                dep_artifacts: &dep_artifacts,
            };
            link_line(&input).render()
        };

        debug!(target = %name, line = %line, "linking");
        match run_shell_line(&line, true) {
            Ok(o) if o.success => true,
            Ok(o) => {
                error!(target = %name, output = ?o.output, "link failed");
                false
            }
            Err(e) => {
                error!(target = %name, error = %e, "failed to spawn linker");
                false
            }
        }
    }
}

/// `<output_dir>/<kind.output_filename(name, os)>`, shared between the
/// linker's own output path and its dependents' references to it.
pub(crate) fn output_path_for(registry: &Registry, id: TargetId, output_dir: &std::path::Path) -> PathBuf {
    let target = registry.target(id).expect("target id must be valid");
    target.output_path(output_dir, super::toolchain::host_os())
}
