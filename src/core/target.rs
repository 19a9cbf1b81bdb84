//! Target definitions: what gets built.

use std::path::PathBuf;

use super::registry::{CommandId, TargetId};

/// What kind of artifact a target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Executable,
    StaticLibrary,
    SharedLibrary,
    /// No sources of its own; built by running its subproject pre-command
    /// and consumed by mtime only. See [`crate::core::subproject`].
    Proxy,
}

impl TargetKind {
    pub fn extension(&self, os: &str) -> &'static str {
        match self {
            TargetKind::Executable => {
                if os == "windows" {
                    "exe"
                } else {
                    ""
                }
            }
            TargetKind::StaticLibrary => {
                if os == "windows" {
                    "lib"
                } else {
                    "a"
                }
            }
            TargetKind::SharedLibrary => match os {
                "windows" => "dll",
                "macos" => "dylib",
                _ => "so",
            },
            TargetKind::Proxy => "",
        }
    }

    pub fn prefix(&self, os: &str) -> &'static str {
        match self {
            TargetKind::Executable | TargetKind::Proxy => "",
            TargetKind::StaticLibrary | TargetKind::SharedLibrary => {
                if os == "windows" {
                    ""
                } else {
                    "lib"
                }
            }
        }
    }

    pub fn output_filename(&self, name: &str, os: &str) -> String {
        let prefix = self.prefix(os);
        let ext = self.extension(os);
        if ext.is_empty() {
            format!("{prefix}{name}")
        } else {
            format!("{prefix}{name}.{ext}")
        }
    }

    pub fn is_library(&self) -> bool {
        matches!(self, TargetKind::StaticLibrary | TargetKind::SharedLibrary)
    }

    pub fn is_linkable(&self) -> bool {
        self.is_library()
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self, TargetKind::Proxy)
    }

    /// The manifest wire-format token for this kind, or `None` for `Proxy`
    /// (proxies are never emitted into a manifest of their own).
    pub fn manifest_kind(&self) -> Option<&'static str> {
        match self {
            TargetKind::Executable => Some("executable"),
            TargetKind::StaticLibrary => Some("static_lib"),
            TargetKind::SharedLibrary => Some("shared_lib"),
            TargetKind::Proxy => None,
        }
    }

    pub fn from_manifest_kind(token: &str) -> Option<TargetKind> {
        match token {
            "executable" => Some(TargetKind::Executable),
            "static_lib" => Some(TargetKind::StaticLibrary),
            "shared_lib" => Some(TargetKind::SharedLibrary),
            _ => None,
        }
    }
}

/// A preprocessor macro definition: `NAME` or `NAME=VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Define {
    Flag(String),
    KeyValue(String, String),
}

impl Define {
    pub fn name(&self) -> &str {
        match self {
            Define::Flag(n) => n,
            Define::KeyValue(n, _) => n,
        }
    }

    /// GCC-like rendering: `NAME` or `NAME=VALUE`, to be prefixed with `-D`.
    pub fn to_gcc_token(&self) -> String {
        match self {
            Define::Flag(n) => n.clone(),
            Define::KeyValue(n, v) => format!("{n}={v}"),
        }
    }
}

/// A build target with its configuration.
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub kind: TargetKind,
    pub sources: Vec<PathBuf>,
    pub include_dirs: Vec<String>,
    pub library_dirs: Vec<String>,
    pub link_libs: Vec<String>,
    pub defines: Vec<Define>,
    pub target_deps: Vec<TargetId>,
    pub pre_commands: Vec<CommandId>,
    pub post_commands: Vec<CommandId>,
    /// Per-target compile flags. When set, these *replace* the global
    /// cflags for this target's compilations rather than appending to them.
    pub cflags: Option<String>,
    pub ldflags: Option<String>,
    /// Set only for `Proxy` targets: the externally managed path under the
    /// subproject's directory that this target's artifact actually lives
    /// at. The orchestrator never writes it, only reads its mtime.
    pub proxy_output_path: Option<PathBuf>,
}

impl Target {
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Target {
            name: name.into(),
            kind,
            sources: Vec::new(),
            include_dirs: Vec::new(),
            library_dirs: Vec::new(),
            link_libs: Vec::new(),
            defines: Vec::new(),
            target_deps: Vec::new(),
            pre_commands: Vec::new(),
            post_commands: Vec::new(),
            cflags: None,
            ldflags: None,
            proxy_output_path: None,
        }
    }

    /// The path at which this target's artifact lives: the externally
    /// managed path for a `Proxy`, or `<output_dir>/<filename>` otherwise.
    pub fn output_path(&self, output_dir: &std::path::Path, os: &str) -> PathBuf {
        match &self.proxy_output_path {
            Some(p) => p.clone(),
            None => output_dir.join(self.output_filename(os)),
        }
    }

    pub fn output_filename(&self, os: &str) -> String {
        self.kind.output_filename(&self.name, os)
    }

    /// `<output_dir>/obj_<name>` per the object-directory invariant.
    pub fn obj_dir(&self, output_dir: &std::path::Path) -> PathBuf {
        output_dir.join(format!("obj_{}", self.name))
    }

    /// `<obj_dir>/<stem>.o`, where `<stem>` strips the source's final
    /// extension. Collisions between sources with the same stem are
    /// undefined, per the data model invariant.
    pub fn object_path(&self, output_dir: &std::path::Path, source: &std::path::Path) -> PathBuf {
        let stem = source.file_stem().unwrap_or_default();
        self.obj_dir(output_dir).join(stem).with_extension("o")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_filenames_match_naming_table() {
        assert_eq!(TargetKind::Executable.output_filename("app", "linux"), "app");
        assert_eq!(
            TargetKind::Executable.output_filename("app", "windows"),
            "app.exe"
        );
        assert_eq!(
            TargetKind::StaticLibrary.output_filename("math", "linux"),
            "libmath.a"
        );
        assert_eq!(
            TargetKind::StaticLibrary.output_filename("math", "windows"),
            "math.lib"
        );
        assert_eq!(
            TargetKind::SharedLibrary.output_filename("math", "macos"),
            "libmath.dylib"
        );
        assert_eq!(
            TargetKind::SharedLibrary.output_filename("math", "linux"),
            "libmath.so"
        );
    }

    #[test]
    fn object_path_strips_final_extension_only() {
        let t = Target::new("math", TargetKind::StaticLibrary);
        let out = std::path::Path::new("build");
        let obj = t.object_path(out, std::path::Path::new("src/math.c"));
        assert_eq!(obj, std::path::Path::new("build/obj_math/math.o"));
    }

    #[test]
    fn manifest_kind_round_trips() {
        for kind in [
            TargetKind::Executable,
            TargetKind::StaticLibrary,
            TargetKind::SharedLibrary,
        ] {
            let token = kind.manifest_kind().unwrap();
            assert_eq!(TargetKind::from_manifest_kind(token), Some(kind));
        }
        assert_eq!(TargetKind::Proxy.manifest_kind(), None);
    }
}
