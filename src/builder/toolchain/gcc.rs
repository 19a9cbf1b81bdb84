//! GCC-like command-line rules (gcc, clang, and anything that isn't MSVC).

use super::{is_shared, ArchiveInput, CompileInput, LinkInput};
use crate::util::process::CommandSpec;

pub(super) fn compile_line(input: &CompileInput) -> CommandSpec {
    let mut spec = CommandSpec::new(
        input
            .settings
            .compiler_exe
            .clone()
            .unwrap_or_else(|| "cc".to_string()),
    )
    .arg("-c")
    .arg("-o")
    .quoted_arg(input.object.to_string_lossy());

    spec = apply_cflags(spec, input);

    for dir in &input.target.include_dirs {
        spec = spec.arg(format!("-I{}", quote(dir)));
    }

    for define in &input.settings.defines {
        spec = spec.arg(format!("-D{}", define.to_gcc_token()));
    }
    for define in &input.target.defines {
        spec = spec.arg(format!("-D{}", define.to_gcc_token()));
    }

    spec.quoted_arg(input.source.to_string_lossy())
}

pub(super) fn archive_line(input: &ArchiveInput) -> CommandSpec {
    let mut spec = CommandSpec::new(
        input
            .settings
            .archiver_exe
            .clone()
            .unwrap_or_else(|| "ar".to_string()),
    )
    .arg("rcs")
    .quoted_arg(input.output.to_string_lossy());
    for obj in input.objects {
        spec = spec.quoted_arg(obj.to_string_lossy());
    }
    spec
}

pub(super) fn link_line(input: &LinkInput) -> CommandSpec {
    let mut spec = CommandSpec::new(
        input
            .settings
            .linker_exe
            .clone()
            .unwrap_or_else(|| "cc".to_string()),
    )
    .arg("-o")
    .quoted_arg(input.output.to_string_lossy());

    for obj in input.objects {
        spec = spec.quoted_arg(obj.to_string_lossy());
    }

    for dir in &input.target.library_dirs {
        spec = spec.arg(format!("-L{}", quote(dir)));
    }

    for lib in &input.target.link_libs {
        // REDESIGN FLAG (a): emit `-l<name>` uniformly on every Unix
        // variant; the historical macOS `-l<name>.dylib` form is a bug in
        // this system's lineage and is not reproduced.
        spec = spec.arg(format!("-l{lib}"));
    }

    for dep in input.dep_artifacts {
        spec = spec.quoted_arg(dep.to_string_lossy());
    }

    if let Some(ldflags) = &input.target.ldflags {
        spec = spec.raw(ldflags.clone());
    }
    if let Some(global_ldflags) = &input.settings.ldflags {
        spec = spec.raw(global_ldflags.clone());
    }

    if is_shared(input.target.kind) {
        spec = spec.arg("-shared");
    }

    spec
}

fn apply_cflags(spec: CommandSpec, input: &CompileInput) -> CommandSpec {
    match &input.target.cflags {
        Some(cflags) => spec.raw(cflags.clone()),
        None => match &input.settings.cflags {
            Some(cflags) => spec.raw(cflags.clone()),
            None => spec,
        },
    }
}

fn quote(s: &str) -> String {
    format!("\"{s}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Define, GlobalSettings, Target, TargetKind};
    use std::path::Path;

    #[test]
    fn compile_line_follows_gcc_order() {
        let mut settings = GlobalSettings::default();
        settings.compiler_exe = Some("cc".to_string());
        settings.defines.push(Define::Flag("GLOBAL".to_string()));

        let mut target = Target::new("math", TargetKind::StaticLibrary);
        target.include_dirs.push("include".to_string());
        target.defines.push(Define::Flag("LOCAL".to_string()));

        let input = CompileInput {
            settings: &settings,
            target: &target,
            source: Path::new("math.c"),
            object: Path::new("build/obj_math/math.o"),
        };
        let line = compile_line(&input).render();
        assert_eq!(
            line,
            "cc -c -o \"build/obj_math/math.o\" -I\"include\" -DGLOBAL -DLOCAL \"math.c\""
        );
    }

    #[test]
    fn per_target_cflags_replace_global_cflags() {
        let mut settings = GlobalSettings::default();
        settings.compiler_exe = Some("cc".to_string());
        settings.cflags = Some("-O0".to_string());
        let mut target = Target::new("math", TargetKind::StaticLibrary);
        target.cflags = Some("-O2 -Wall".to_string());

        let input = CompileInput {
            settings: &settings,
            target: &target,
            source: Path::new("math.c"),
            object: Path::new("build/obj_math/math.o"),
        };
        let line = compile_line(&input).render();
        assert!(line.contains("-O2 -Wall"));
        assert!(!line.contains("-O0"));
    }

    #[test]
    fn link_line_emits_bare_dylib_free_flag_on_all_unix() {
        let mut settings = GlobalSettings::default();
        settings.linker_exe = Some("cc".to_string());
        let mut target = Target::new("app", TargetKind::Executable);
        target.link_libs.push("m".to_string());

        let input = LinkInput {
            settings: &settings,
            target: &target,
            objects: &[],
            output: Path::new("build/app"),
            dep_artifacts: &[],
        };
        let line = link_line(&input).render();
        assert!(line.contains("-lm"));
        assert!(!line.contains(".dylib"));
    }

    #[test]
    fn shared_lib_gets_shared_flag() {
        let settings = GlobalSettings {
            linker_exe: Some("cc".to_string()),
            ..GlobalSettings::default()
        };
        let target = Target::new("math", TargetKind::SharedLibrary);
        let input = LinkInput {
            settings: &settings,
            target: &target,
            objects: &[],
            output: Path::new("build/libmath.so"),
            dep_artifacts: &[],
        };
        assert!(link_line(&input).render().ends_with("-shared"));
    }
}
