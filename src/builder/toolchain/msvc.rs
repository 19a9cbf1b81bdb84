//! MSVC-like command-line rules (`cl.exe`, `lib.exe`, `link.exe`).

use super::{is_shared, ArchiveInput, CompileInput, LinkInput};
use crate::util::process::CommandSpec;

pub(super) fn compile_line(input: &CompileInput) -> CommandSpec {
    let mut spec = CommandSpec::new(
        input
            .settings
            .compiler_exe
            .clone()
            .unwrap_or_else(|| "cl".to_string()),
    )
    .arg("/c")
    .arg("/nologo")
    .arg(format!("/Fo{}", quote(&input.object.to_string_lossy())))
    .arg("/showIncludes");

    spec = apply_cflags(spec, input);

    for dir in &input.target.include_dirs {
        spec = spec.arg("/I").quoted_arg(dir);
    }

    for define in &input.settings.defines {
        spec = spec.arg(format!("/D{}", define.to_gcc_token()));
    }
    for define in &input.target.defines {
        spec = spec.arg(format!("/D{}", define.to_gcc_token()));
    }

    spec.quoted_arg(input.source.to_string_lossy())
}

pub(super) fn archive_line(input: &ArchiveInput) -> CommandSpec {
    let mut spec = CommandSpec::new(
        input
            .settings
            .archiver_exe
            .clone()
            .unwrap_or_else(|| "lib".to_string()),
    )
    .arg("/nologo")
    .arg(format!("/OUT:{}", quote(&input.output.to_string_lossy())));
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
            .unwrap_or_else(|| "link".to_string()),
    )
    .arg("/nologo")
    .arg(format!("/OUT:{}", quote(&input.output.to_string_lossy())));

    for obj in input.objects {
        spec = spec.quoted_arg(obj.to_string_lossy());
    }

    for dir in &input.target.library_dirs {
        spec = spec.arg(format!("/LIBPATH:{}", quote(dir)));
    }

    for lib in &input.target.link_libs {
        spec = spec.arg(format!("{lib}.lib"));
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
        spec = spec.arg("/DLL");
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
    use crate::core::{GlobalSettings, Target, TargetKind};
    use std::path::Path;

    #[test]
    fn compile_line_uses_msvc_flag_forms() {
        let settings = GlobalSettings {
            compiler_exe: Some("cl".to_string()),
            ..GlobalSettings::default()
        };
        let mut target = Target::new("math", TargetKind::StaticLibrary);
        target.include_dirs.push("include".to_string());

        let input = CompileInput {
            settings: &settings,
            target: &target,
            source: Path::new("math.c"),
            object: Path::new("build\\obj_math\\math.o"),
        };
        let line = compile_line(&input).render();
        assert!(line.starts_with("cl /c /nologo /Fo\"build\\obj_math\\math.o\" /showIncludes"));
        assert!(line.contains("/I \"include\""));
        assert!(line.ends_with("\"math.c\""));
    }

    #[test]
    fn link_line_uses_dll_flag_for_shared() {
        let settings = GlobalSettings {
            linker_exe: Some("link".to_string()),
            ..GlobalSettings::default()
        };
        let target = Target::new("math", TargetKind::SharedLibrary);
        let input = LinkInput {
            settings: &settings,
            target: &target,
            objects: &[],
            output: Path::new("build\\math.dll"),
            dep_artifacts: &[],
        };
        let line = link_line(&input).render();
        assert!(line.contains("/OUT:\"build\\math.dll\""));
        assert!(line.ends_with("/DLL"));
        assert!(line.find("/OUT:").unwrap() < line.find("/DLL").unwrap());
    }

    #[test]
    fn link_libs_get_dot_lib_suffix() {
        let settings = GlobalSettings {
            linker_exe: Some("link".to_string()),
            ..GlobalSettings::default()
        };
        let mut target = Target::new("app", TargetKind::Executable);
        target.link_libs.push("ws2_32".to_string());
        let input = LinkInput {
            settings: &settings,
            target: &target,
            objects: &[],
            output: Path::new("build\\app.exe"),
            dep_artifacts: &[],
        };
        assert!(link_line(&input).render().contains("ws2_32.lib"));
    }
}
