//! Named shell-invocation nodes with their own dependency list.

use super::registry::CommandId;

/// A named shell invocation with its own dependency list. Memoized so a
/// given command runs at most once per `run`, however many paths reach it.
#[derive(Debug, Clone)]
pub struct Command {
    pub name: String,
    pub command_line: String,
    pub dependencies: Vec<CommandId>,
    pub(crate) executed: bool,
    pub(crate) result: Option<bool>,
}

impl Command {
    pub fn new(name: impl Into<String>, command_line: impl Into<String>) -> Self {
        Command {
            name: name.into(),
            command_line: command_line.into(),
            dependencies: Vec::new(),
            executed: false,
            result: None,
        }
    }

    pub fn is_memoized(&self) -> bool {
        self.executed
    }

    pub fn cached_result(&self) -> Option<bool> {
        self.result
    }
}
