//! Typed errors for the orchestrator's own fallible internals.
//!
//! The driver-level disposition of these (fatal, warning, silently ignored)
//! is policy implemented by the scheduler and the public API, not by this
//! type; see the error handling design notes for that mapping.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CbuildError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("circular dependency detected at target `{target}`")]
    Cycle { target: String },

    #[error("compile failed for `{source}` (target `{target}`): {detail}")]
    CompileFailed {
        target: String,
        source: PathBuf,
        detail: String,
    },

    #[error("archive failed for target `{target}`: {detail}")]
    ArchiveFailed { target: String, detail: String },

    #[error("link failed for target `{target}`: {detail}")]
    LinkFailed { target: String, detail: String },

    #[error("command `{name}` failed: {detail}")]
    CommandFailed { name: String, detail: String },

    #[error("failed to serialize compile-commands index: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("self-rebuild failed: {0}")]
    SelfRebuild(String),
}

pub type Result<T> = std::result::Result<T, CbuildError>;

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CbuildError {
    CbuildError::Io {
        path: path.into(),
        source,
    }
}
