//! Command-line synthesizer: builds compiler/archiver/linker command lines
//! from a target plus global settings, parametrized by compiler family.

mod gcc;
mod msvc;

use std::path::{Path, PathBuf};

use crate::core::{CompilerFamily, GlobalSettings, Target, TargetKind};
use crate::util::process::CommandSpec;

/// Everything the synthesizer needs to build one compile line, gathered up
/// front so the same inputs can be reused by both the scheduler and the
/// compile-commands exporter (§8 property 8: they must be byte-identical).
pub struct CompileInput<'a> {
    pub settings: &'a GlobalSettings,
    pub target: &'a Target,
    pub source: &'a Path,
    pub object: &'a Path,
}

pub struct ArchiveInput<'a> {
    pub settings: &'a GlobalSettings,
    pub target: &'a Target,
    pub objects: &'a [PathBuf],
    pub output: &'a Path,
}

pub struct LinkInput<'a> {
    pub settings: &'a GlobalSettings,
    pub target: &'a Target,
    pub objects: &'a [PathBuf],
    pub output: &'a Path,
    /// Output artifacts of this target's static/shared target-deps, in
    /// dependency-registration order, passed to the linker as raw paths.
    pub dep_artifacts: &'a [PathBuf],
}

pub fn compile_line(input: &CompileInput) -> CommandSpec {
    match input.settings.compiler_family() {
        CompilerFamily::Msvc => msvc::compile_line(input),
        CompilerFamily::Gcc => gcc::compile_line(input),
    }
}

pub fn archive_line(input: &ArchiveInput) -> CommandSpec {
    match input.settings.compiler_family() {
        CompilerFamily::Msvc => msvc::archive_line(input),
        CompilerFamily::Gcc => gcc::archive_line(input),
    }
}

pub fn link_line(input: &LinkInput) -> CommandSpec {
    match input.settings.compiler_family() {
        CompilerFamily::Msvc => msvc::link_line(input),
        CompilerFamily::Gcc => gcc::link_line(input),
    }
}

pub(crate) fn host_os() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "macos"
    } else {
        "linux"
    }
}

pub(crate) fn is_shared(kind: TargetKind) -> bool {
    matches!(kind, TargetKind::SharedLibrary)
}
