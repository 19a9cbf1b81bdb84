//! OS-neutral process spawning.
//!
//! Commands in this crate travel as a single shell line, not an argv vector:
//! the host shell evaluates quoting, globbing and redirection, and the
//! caller is responsible for quoting tokens that need it. [`CommandSpec`] is
//! a convenience builder for assembling such a line token-by-token; the
//! actual spawn always goes through [`run_shell_line`].

use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{CbuildError, Result};

#[derive(Debug, Clone)]
enum Token {
    /// Quoted only if it needs it (plain flags like `-c` stay bare).
    Plain(String),
    /// Always double-quoted, even without whitespace (paths, per the
    /// synthesizer's quoting rules).
    Quoted(String),
    /// Inserted verbatim, not quoted at all, so a multi-flag override
    /// string (e.g. per-target cflags) keeps its shell word-splitting.
    Raw(String),
}

/// One subprocess invocation, expressed as program + ordered argument
/// tokens. Rendered to a single shell line before being spawned.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    program: String,
    tokens: Vec<Token>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            tokens: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.tokens.push(Token::Plain(arg.into()));
        self
    }

    /// Append an argument whose value is always double-quoted, even if it
    /// contains no whitespace. Used for paths, per the synthesizer's rules.
    pub fn quoted_arg(mut self, value: impl AsRef<str>) -> Self {
        self.tokens.push(Token::Quoted(value.as_ref().to_string()));
        self
    }

    /// Append a literal, unquoted fragment (a cflags/ldflags override that
    /// may itself be several shell words).
    pub fn raw(mut self, literal: impl Into<String>) -> Self {
        let literal = literal.into();
        if !literal.is_empty() {
            self.tokens.push(Token::Raw(literal));
        }
        self
    }

    pub fn render(&self) -> String {
        let mut line = shell_token(&self.program);
        for token in &self.tokens {
            line.push(' ');
            match token {
                Token::Plain(s) => line.push_str(&shell_token(s)),
                Token::Quoted(s) => {
                    line.push('"');
                    line.push_str(&s.replace('"', "\\\""));
                    line.push('"');
                }
                Token::Raw(s) => line.push_str(s),
            }
        }
        line
    }
}

fn shell_token(token: &str) -> String {
    if token.is_empty() || token.contains(char::is_whitespace) {
        format!("\"{}\"", token.replace('"', "\\\""))
    } else {
        token.to_string()
    }
}

#[derive(Debug)]
pub struct SpawnOutcome {
    pub success: bool,
    pub code: i32,
    /// Captured combined stdout (stderr inherits per the spawn contract).
    pub output: Option<String>,
}

/// Spawn a single shell line, evaluated by the host shell.
///
/// When `capture` is true, stdout is collected into `output` and, on
/// failure, the caller is expected to surface it on the diagnostic stream.
/// stderr is never captured; it inherits the parent's.
pub fn run_shell_line(line: &str, capture: bool) -> Result<SpawnOutcome> {
    debug!(line, capture, "spawning shell line");
    let (shell, flag) = host_shell();
    let mut cmd = Command::new(shell);
    cmd.arg(flag).arg(line);

    if capture {
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit());
        let output = cmd.output().map_err(|e| CbuildError::Spawn {
            command: line.to_string(),
            source: e,
        })?;
        let code = output.status.code().unwrap_or(-1);
        Ok(SpawnOutcome {
            success: output.status.success(),
            code,
            output: Some(String::from_utf8_lossy(&output.stdout).into_owned()),
        })
    } else {
        let status = cmd.status().map_err(|e| CbuildError::Spawn {
            command: line.to_string(),
            source: e,
        })?;
        Ok(SpawnOutcome {
            success: status.success(),
            code: status.code().unwrap_or(-1),
            output: None,
        })
    }
}

/// Spawn a shell line with a specific working directory.
pub fn run_shell_line_in(
    line: &str,
    cwd: &std::path::Path,
    capture: bool,
) -> Result<SpawnOutcome> {
    debug!(line, cwd = %cwd.display(), capture, "spawning shell line");
    let (shell, flag) = host_shell();
    let mut cmd = Command::new(shell);
    cmd.arg(flag).arg(line).current_dir(cwd);

    if capture {
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit());
        let output = cmd.output().map_err(|e| CbuildError::Spawn {
            command: line.to_string(),
            source: e,
        })?;
        Ok(SpawnOutcome {
            success: output.status.success(),
            code: output.status.code().unwrap_or(-1),
            output: Some(String::from_utf8_lossy(&output.stdout).into_owned()),
        })
    } else {
        let status = cmd.status().map_err(|e| CbuildError::Spawn {
            command: line.to_string(),
            source: e,
        })?;
        Ok(SpawnOutcome {
            success: status.success(),
            code: status.code().unwrap_or(-1),
            output: None,
        })
    }
}

#[cfg(unix)]
fn host_shell() -> (&'static str, &'static str) {
    ("/bin/sh", "-c")
}

#[cfg(windows)]
fn host_shell() -> (&'static str, &'static str) {
    ("cmd", "/C")
}

/// Locate an executable on `PATH`, returning its resolved path if found.
pub fn find_executable(name: &str) -> Option<std::path::PathBuf> {
    which::which(name).ok()
}
