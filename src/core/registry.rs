//! The graph model: an arena of targets, commands, and subprojects with
//! stable indices standing in for owning pointers. References between
//! entities (`target_deps`, `pre_commands`, command `dependencies`) are
//! plain indices into these arenas, never owning.

use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use super::command::Command;
use super::subproject::Subproject;
use super::target::{Define, Target, TargetKind};
use crate::util::fs::glob_files;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubprojectId(pub(crate) usize);

/// Process-global ordered registry: iteration order equals registration
/// order for every arena.
#[derive(Debug, Default)]
pub struct Registry {
    targets: Vec<Target>,
    commands: Vec<Command>,
    subprojects: Vec<Subproject>,
    target_names: HashMap<String, TargetId>,
    command_names: HashMap<String, CommandId>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    // -- targets ----------------------------------------------------------

    pub fn add_target(&mut self, name: &str, kind: TargetKind) -> TargetId {
        if let Some(&id) = self.target_names.get(name) {
            return id;
        }
        let id = TargetId(self.targets.len());
        self.targets.push(Target::new(name, kind));
        self.target_names.insert(name.to_string(), id);
        id
    }

    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(id.0)
    }

    pub fn target_mut(&mut self, id: TargetId) -> Option<&mut Target> {
        self.targets.get_mut(id.0)
    }

    pub fn target_id_by_name(&self, name: &str) -> Option<TargetId> {
        self.target_names.get(name).copied()
    }

    pub fn targets_in_order(&self) -> impl Iterator<Item = (TargetId, &Target)> {
        self.targets
            .iter()
            .enumerate()
            .map(|(i, t)| (TargetId(i), t))
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    // -- commands -----------------------------------------------------------

    pub fn add_command(&mut self, name: &str, command_line: &str) -> CommandId {
        if let Some(&id) = self.command_names.get(name) {
            return id;
        }
        let id = CommandId(self.commands.len());
        self.commands.push(Command::new(name, command_line));
        self.command_names.insert(name.to_string(), id);
        id
    }

    pub fn command(&self, id: CommandId) -> Option<&Command> {
        self.commands.get(id.0)
    }

    pub fn command_mut(&mut self, id: CommandId) -> Option<&mut Command> {
        self.commands.get_mut(id.0)
    }

    pub fn command_id_by_name(&self, name: &str) -> Option<CommandId> {
        self.command_names.get(name).copied()
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Reset every command's per-run memoization. Called at the start of
    /// each `run` so a command executed in a prior run is eligible again.
    pub fn reset_command_memoization(&mut self) {
        for cmd in &mut self.commands {
            cmd.executed = false;
            cmd.result = None;
        }
    }

    // -- subprojects --------------------------------------------------------

    pub fn add_subproject(&mut self, subproject: Subproject) -> SubprojectId {
        let id = SubprojectId(self.subprojects.len());
        self.subprojects.push(subproject);
        id
    }

    pub fn subproject(&self, id: SubprojectId) -> Option<&Subproject> {
        self.subprojects.get(id.0)
    }

    pub fn subproject_mut(&mut self, id: SubprojectId) -> Option<&mut Subproject> {
        self.subprojects.get_mut(id.0)
    }

    pub fn subprojects_in_order(&self) -> impl Iterator<Item = (SubprojectId, &Subproject)> {
        self.subprojects
            .iter()
            .enumerate()
            .map(|(i, s)| (SubprojectId(i), s))
    }

    // -- mutators (§4.B) -----------------------------------------------------

    /// Append a source pattern, expanding globs immediately; literal
    /// non-existent paths also resolve to nothing and warn, since the glob
    /// crate treats a plain path as a degenerate pattern.
    pub fn target_add_source(&mut self, id: TargetId, base: &Path, pattern: &str) {
        let Some(target) = self.targets.get_mut(id.0) else {
            return;
        };
        let matches = glob_files(base, pattern);
        for path in matches {
            if !target.sources.contains(&path) {
                target.sources.push(path);
            }
        }
    }

    pub fn target_add_include_dir(&mut self, id: TargetId, dir: &str) {
        if let Some(t) = self.targets.get_mut(id.0) {
            t.include_dirs.push(dir.to_string());
        }
    }

    pub fn target_add_library_dir(&mut self, id: TargetId, dir: &str) {
        if let Some(t) = self.targets.get_mut(id.0) {
            t.library_dirs.push(dir.to_string());
        }
    }

    pub fn target_add_link_lib(&mut self, id: TargetId, lib: &str) {
        if let Some(t) = self.targets.get_mut(id.0) {
            t.link_libs.push(lib.to_string());
        }
    }

    pub fn target_add_define(&mut self, id: TargetId, name: &str) {
        if let Some(t) = self.targets.get_mut(id.0) {
            t.defines.push(Define::Flag(name.to_string()));
        }
    }

    pub fn target_add_define_value(&mut self, id: TargetId, name: &str, value: &str) {
        if let Some(t) = self.targets.get_mut(id.0) {
            t.defines
                .push(Define::KeyValue(name.to_string(), value.to_string()));
        }
    }

    /// Append to the per-target cflags override (creating it on first
    /// call). Once set, it replaces the global cflags for this target.
    pub fn target_add_cflags(&mut self, id: TargetId, flags: &str) {
        if let Some(t) = self.targets.get_mut(id.0) {
            match &mut t.cflags {
                Some(existing) => {
                    existing.push(' ');
                    existing.push_str(flags);
                }
                None => t.cflags = Some(flags.to_string()),
            }
        }
    }

    pub fn target_add_ldflags(&mut self, id: TargetId, flags: &str) {
        if let Some(t) = self.targets.get_mut(id.0) {
            match &mut t.ldflags {
                Some(existing) => {
                    existing.push(' ');
                    existing.push_str(flags);
                }
                None => t.ldflags = Some(flags.to_string()),
            }
        }
    }

    pub fn target_add_pre_command(&mut self, id: TargetId, command: CommandId) {
        if let Some(t) = self.targets.get_mut(id.0) {
            t.pre_commands.push(command);
        }
    }

    pub fn target_add_post_command(&mut self, id: TargetId, command: CommandId) {
        if let Some(t) = self.targets.get_mut(id.0) {
            t.post_commands.push(command);
        }
    }

    /// Record the externally managed output path for a `Proxy` target.
    pub fn set_proxy_output_path(&mut self, id: TargetId, path: std::path::PathBuf) {
        if let Some(t) = self.targets.get_mut(id.0) {
            t.proxy_output_path = Some(path);
        }
    }

    /// Link `dep` into `target`: `dep`'s artifact is linked and built
    /// first. Silently ignored if either id is out of range (illegal uses
    /// are no-ops per §4.I), matching the reference behavior rather than
    /// panicking.
    pub fn link_target(&mut self, target: TargetId, dep: TargetId) {
        if dep.0 >= self.targets.len() {
            warn!(dep = dep.0, "link_target: dependency id out of range");
            return;
        }
        if let Some(t) = self.targets.get_mut(target.0) {
            t.target_deps.push(dep);
        }
    }

    pub fn command_add_dependency(&mut self, command: CommandId, dep: CommandId) {
        if dep.0 >= self.commands.len() {
            warn!(dep = dep.0, "command_add_dependency: dependency id out of range");
            return;
        }
        if let Some(c) = self.commands.get_mut(command.0) {
            c.dependencies.push(dep);
        }
    }
}
