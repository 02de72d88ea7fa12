//! External command execution: executable lookup, environment merge and
//! stdio passthrough for the build tool.

mod environment;
mod runner;

pub use environment::Environment;
pub use runner::{CommandRunner, ProcessRunner};

/// Failures raised while running an external command.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Refusing to run an empty command line")]
    EmptyCommand,

    #[error("Unable to locate the '{command}' command on this system")]
    NotFound {
        command: String,
        #[source]
        source: which::Error,
    },

    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command {command} exited with code {}", display_code(.code))]
    NonZeroExit { command: String, code: Option<i32> },
}

impl ExecError {
    /// Exit code reported by the child, if it ran and exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::NonZeroExit { code, .. } => *code,
            _ => None,
        }
    }

    /// Command name the failure refers to.
    pub fn command(&self) -> Option<&str> {
        match self {
            ExecError::EmptyCommand => None,
            ExecError::NotFound { command, .. }
            | ExecError::Spawn { command, .. }
            | ExecError::NonZeroExit { command, .. } => Some(command),
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none (terminated by signal)".to_string(), |c| c.to_string())
}
