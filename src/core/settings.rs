//! Process-wide build settings.

use std::path::PathBuf;

use crate::util::process::find_executable;

/// MSVC-like (name contains `cl` but not `clang`) or GCC-like (everything
/// else). Chosen once, from the compiler executable's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerFamily {
    Gcc,
    Msvc,
}

impl CompilerFamily {
    pub fn detect(compiler_exe: &str) -> CompilerFamily {
        let name = std::path::Path::new(compiler_exe)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(compiler_exe)
            .to_ascii_lowercase();
        if name.contains("cl") && !name.contains("clang") {
            CompilerFamily::Msvc
        } else {
            CompilerFamily::Gcc
        }
    }
}

/// Process-wide settings shared by every target. Populated purely through
/// the builder API; there is no declarative configuration language.
#[derive(Debug, Clone)]
pub struct GlobalSettings {
    pub output_dir: PathBuf,
    pub parallelism: usize,
    pub compiler_exe: Option<String>,
    pub archiver_exe: Option<String>,
    pub linker_exe: Option<String>,
    pub cflags: Option<String>,
    pub ldflags: Option<String>,
    pub defines: Vec<super::target::Define>,
    pub generate_compile_commands: bool,
    pub dep_tracking: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        GlobalSettings {
            output_dir: PathBuf::from("build"),
            parallelism: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            compiler_exe: None,
            archiver_exe: None,
            linker_exe: None,
            cflags: None,
            ldflags: None,
            defines: Vec::new(),
            generate_compile_commands: false,
            dep_tracking: true,
        }
    }
}

impl GlobalSettings {
    /// Resolve defaults for any tool that hasn't been explicitly set, per
    /// the scheduler's initialization step. Idempotent.
    pub fn resolve_defaults(&mut self) {
        if self.compiler_exe.is_none() {
            self.compiler_exe = Some(default_compiler());
        }
        if self.archiver_exe.is_none() {
            self.archiver_exe = Some(default_archiver());
        }
        if self.linker_exe.is_none() {
            self.linker_exe = Some(default_linker(self.compiler_exe.as_deref().unwrap()));
        }
        if self.parallelism == 0 {
            self.parallelism = 1;
        }
    }

    pub fn compiler_family(&self) -> CompilerFamily {
        CompilerFamily::detect(self.compiler_exe.as_deref().unwrap_or("cc"))
    }
}

fn default_compiler() -> String {
    if cfg!(windows) {
        if find_executable("cl").is_some() {
            "cl".to_string()
        } else {
            "cc".to_string()
        }
    } else {
        "cc".to_string()
    }
}

fn default_archiver() -> String {
    if cfg!(windows) {
        "lib".to_string()
    } else {
        "ar".to_string()
    }
}

fn default_linker(compiler_exe: &str) -> String {
    // On macOS and Linux the linker defaults to the compiler driver itself
    // (so it handles startup files and library search paths correctly);
    // on Windows it defaults to `ld` per the documented tooling defaults.
    if cfg!(windows) {
        "ld".to_string()
    } else {
        compiler_exe.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_msvc_like() {
        assert_eq!(CompilerFamily::detect("cl"), CompilerFamily::Msvc);
        assert_eq!(CompilerFamily::detect("cl.exe"), CompilerFamily::Msvc);
        assert_eq!(CompilerFamily::detect("clang"), CompilerFamily::Gcc);
        assert_eq!(CompilerFamily::detect("clang++"), CompilerFamily::Gcc);
        assert_eq!(CompilerFamily::detect("gcc"), CompilerFamily::Gcc);
        assert_eq!(CompilerFamily::detect("cc"), CompilerFamily::Gcc);
    }

    #[test]
    fn resolve_defaults_is_idempotent() {
        let mut settings = GlobalSettings::default();
        settings.resolve_defaults();
        let first = settings.compiler_exe.clone();
        settings.resolve_defaults();
        assert_eq!(settings.compiler_exe, first);
    }
}
