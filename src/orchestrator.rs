//! Public API surface: registration/mutation entry points and the `run`
//! entry point implementing the CLI verbs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::builder::subproject_protocol::{emit_manifest, query_manifest};
use crate::builder::{CompileCommandsIndex, Driver};
use crate::core::{
    CommandId, GlobalSettings, Registry, Subproject, SubprojectId, TargetId, TargetKind,
};
use crate::util::fs::{remove_dir_all_if_exists, remove_file_if_exists};
use crate::util::process::run_shell_line_in;

enum SubcommandAction {
    Shell(String),
    Callback(Box<dyn FnMut() -> i32>),
}

struct RegisteredSubcommand {
    target: TargetId,
    action: SubcommandAction,
}

/// The single owned handle through which all registration, mutation, and
/// `run` calls are made — this implementation's stand-in for the reference
/// design's process-global state (see design notes on global mutable
/// state). One `Orchestrator` corresponds to one process invocation.
pub struct Orchestrator {
    registry: Registry,
    settings: GlobalSettings,
    compile_commands: CompileCommandsIndex,
    subcommands: HashMap<String, RegisteredSubcommand>,
    cwd: PathBuf,
}

/// Host OS tag used for artifact naming, shared with the toolchain
/// synthesizer's own notion of the host.
fn host_os() -> &'static str {
    crate::builder::toolchain_host_os()
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Orchestrator {
            registry: Registry::new(),
            settings: GlobalSettings::default(),
            compile_commands: CompileCommandsIndex::new(),
            subcommands: HashMap::new(),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut GlobalSettings {
        &mut self.settings
    }

    // -- registration (§4.B, §4.I) -------------------------------------------

    pub fn add_executable(&mut self, name: &str) -> TargetId {
        self.registry.add_target(name, TargetKind::Executable)
    }

    pub fn add_static_library(&mut self, name: &str) -> TargetId {
        self.registry.add_target(name, TargetKind::StaticLibrary)
    }

    pub fn add_shared_library(&mut self, name: &str) -> TargetId {
        self.registry.add_target(name, TargetKind::SharedLibrary)
    }

    pub fn add_command(&mut self, name: &str, command_line: &str) -> CommandId {
        self.registry.add_command(name, command_line)
    }

    pub fn add_subproject(
        &mut self,
        alias: &str,
        directory: impl AsRef<Path>,
        driver_exe: impl AsRef<Path>,
    ) -> SubprojectId {
        let directory = directory.as_ref().to_path_buf();
        let driver_exe = driver_exe.as_ref().to_path_buf();
        let build_line = format!("\"{}\"", driver_exe.display());
        let build_command = self
            .registry
            .add_command(&format!("__subproject_build_{alias}"), &build_line);
        self.registry.add_subproject(Subproject::new(
            alias,
            directory,
            driver_exe,
            build_command,
        ))
    }

    // -- target mutators ------------------------------------------------------

    pub fn target_add_source(&mut self, target: TargetId, pattern: &str) {
        let cwd = self.cwd.clone();
        self.registry.target_add_source(target, &cwd, pattern);
    }

    pub fn target_add_include_dir(&mut self, target: TargetId, dir: &str) {
        self.registry.target_add_include_dir(target, dir);
    }

    pub fn target_add_library_dir(&mut self, target: TargetId, dir: &str) {
        self.registry.target_add_library_dir(target, dir);
    }

    pub fn target_add_link_lib(&mut self, target: TargetId, lib: &str) {
        self.registry.target_add_link_lib(target, lib);
    }

    pub fn target_add_define(&mut self, target: TargetId, name: &str) {
        self.registry.target_add_define(target, name);
    }

    pub fn target_add_define_value(&mut self, target: TargetId, name: &str, value: &str) {
        self.registry.target_add_define_value(target, name, value);
    }

    pub fn target_add_cflags(&mut self, target: TargetId, flags: &str) {
        self.registry.target_add_cflags(target, flags);
    }

    pub fn target_add_ldflags(&mut self, target: TargetId, flags: &str) {
        self.registry.target_add_ldflags(target, flags);
    }

    pub fn target_add_pre_command(&mut self, target: TargetId, command: CommandId) {
        self.registry.target_add_pre_command(target, command);
    }

    pub fn target_add_post_command(&mut self, target: TargetId, command: CommandId) {
        self.registry.target_add_post_command(target, command);
    }

    pub fn link_target(&mut self, target: TargetId, dep: TargetId) {
        self.registry.link_target(target, dep);
    }

    pub fn command_add_dependency(&mut self, command: CommandId, dep: CommandId) {
        self.registry.command_add_dependency(command, dep);
    }

    // -- subprojects (§4.G) -----------------------------------------------------

    /// Lazy-load the subproject's manifest if needed, then return a cached
    /// Proxy target for `name`, or `None` if no such target is recorded in
    /// the manifest (a warning has already been logged in that case).
    pub fn subproject_get_target(&mut self, sub: SubprojectId, name: &str) -> Option<TargetId> {
        if let Some(sub_data) = self.registry.subproject(sub) {
            if let Some(&cached) = sub_data.proxies.get(name) {
                return Some(cached);
            }
        }

        if !self
            .registry
            .subproject(sub)
            .map(|s| s.manifest_loaded())
            .unwrap_or(false)
        {
            let (driver_exe, directory) = {
                let sub_data = self.registry.subproject(sub)?;
                (sub_data.driver_exe.clone(), sub_data.directory.clone())
            };
            let targets = query_manifest(&driver_exe, &directory);
            if let Some(sub_mut) = self.registry.subproject_mut(sub) {
                sub_mut.targets = Some(targets);
            }
        }

        let (record, build_command) = {
            let sub_data = self.registry.subproject(sub)?;
            let record = sub_data
                .targets
                .as_ref()
                .and_then(|ts| ts.iter().find(|t| t.name == name))
                .cloned()?;
            (record, sub_data.build_command)
        };

        let directory = self.registry.subproject(sub)?.directory.clone();
        let proxy_name = format!("{}::{}", self.registry.subproject(sub)?.alias, name);
        let proxy_id = self.registry.add_target(&proxy_name, TargetKind::Proxy);
        self.registry
            .target_add_pre_command(proxy_id, build_command);
        self.registry
            .set_proxy_output_path(proxy_id, directory.join(&record.relative_output_path));

        if let Some(sub_mut) = self.registry.subproject_mut(sub) {
            sub_mut.proxies.insert(name.to_string(), proxy_id);
        }
        Some(proxy_id)
    }

    // -- subcommands (§4.I) -----------------------------------------------------

    pub fn add_subcommand_shell(&mut self, name: &str, target: TargetId, shell_line: impl Into<String>) {
        self.subcommands.insert(
            name.to_string(),
            RegisteredSubcommand {
                target,
                action: SubcommandAction::Shell(shell_line.into()),
            },
        );
    }

    pub fn add_subcommand_callback(
        &mut self,
        name: &str,
        target: TargetId,
        callback: impl FnMut() -> i32 + 'static,
    ) {
        self.subcommands.insert(
            name.to_string(),
            RegisteredSubcommand {
                target,
                action: SubcommandAction::Callback(Box::new(callback)),
            },
        );
    }

    // -- run (§4.E, §4.I) ---------------------------------------------------------

    pub fn run(&mut self) -> i32 {
        let args: Vec<String> = std::env::args().skip(1).collect();
        self.run_with_args(args)
    }

    pub fn run_with_args(&mut self, args: Vec<String>) -> i32 {
        self.settings.resolve_defaults();

        if self.settings.generate_compile_commands {
            self.compile_commands
                .rebuild(&self.registry, &self.settings, &self.cwd);
        }

        match args.first().map(String::as_str) {
            None => self.run_default_build(),
            Some("clean") => {
                self.run_clean();
                0
            }
            Some("--manifest") => {
                print!("{}", emit_manifest(&self.registry, &self.settings));
                0
            }
            Some(name) if self.subcommands.contains_key(name) => self.run_subcommand(name),
            Some(name) if self.registry.target_id_by_name(name).is_some() => {
                self.run_selective_build(name)
            }
            Some(_) => self.run_default_build(),
        }
    }

    fn run_default_build(&mut self) -> i32 {
        let success = Driver::new(&mut self.registry, &self.settings).build_all();
        self.finish(success)
    }

    fn run_selective_build(&mut self, name: &str) -> i32 {
        let Some(id) = self.registry.target_id_by_name(name) else {
            return self.run_default_build();
        };
        let success = Driver::new(&mut self.registry, &self.settings).build_target_closure(id);
        self.finish(success)
    }

    fn run_subcommand(&mut self, name: &str) -> i32 {
        let target = self.subcommands.get(name).map(|s| s.target);
        let Some(target) = target else {
            return self.run_default_build();
        };
        let built = Driver::new(&mut self.registry, &self.settings).build_target_closure(target);
        if !built {
            return 1;
        }

        match self.subcommands.get_mut(name) {
            Some(sub) => match &mut sub.action {
                SubcommandAction::Shell(line) => {
                    match crate::util::process::run_shell_line(line, false) {
                        Ok(outcome) => outcome.code,
                        Err(e) => {
                            warn!(subcommand = name, error = %e, "failed to spawn subcommand");
                            1
                        }
                    }
                }
                SubcommandAction::Callback(cb) => cb(),
            },
            None => 1,
        }
    }

    fn finish(&mut self, success: bool) -> i32 {
        if success {
            if self.settings.generate_compile_commands {
                if let Err(e) = self.compile_commands.write(&self.settings.output_dir) {
                    warn!(error = %e, "failed to write compile-commands index");
                }
            }
            0
        } else {
            1
        }
    }

    fn run_clean(&mut self) {
        let subprojects: Vec<(PathBuf, PathBuf)> = self
            .registry
            .subprojects_in_order()
            .map(|(_, s)| (s.driver_exe.clone(), s.directory.clone()))
            .collect();

        for (driver_exe, directory) in subprojects {
            let line = format!("\"{}\" clean", driver_exe.display());
            match run_shell_line_in(&line, &directory, true) {
                Ok(outcome) if outcome.success => {}
                Ok(outcome) => {
                    warn!(driver = %driver_exe.display(), code = outcome.code, "subproject clean failed");
                }
                Err(e) => {
                    warn!(driver = %driver_exe.display(), error = %e, "failed to spawn subproject clean");
                }
            }
        }

        let output_dir = self.settings.output_dir.clone();
        for (_, target) in self.registry.targets_in_order() {
            if target.kind.is_proxy() {
                continue;
            }
            let _ = remove_dir_all_if_exists(&target.obj_dir(&output_dir));
            let output_path = target.output_path(&output_dir, host_os());
            let _ = remove_file_if_exists(&output_path);
        }

        let _ = remove_dir_all_if_exists(&output_dir);
        info!("clean complete");
    }
}
