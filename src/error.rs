use std::fmt;
use std::io;
use nix::errno::Errno;
use thiserror::Error;
use crate::config::ConfigError;
use crate::executor::ExecError;
use crate::logging::LoggingError;
use crate::parser::SyntaxError;
use crate::pipeline::BuildError;

/// Anything that can abandon a line or stop start-up.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("logging: {0}")]
    Logging(#[from] LoggingError),
    #[error("{}", os_message(.0))]
    Io(#[from] io::Error),
}

impl ShellError {
    /// The value `$?` takes when this error ends a line.
    pub fn status(&self) -> i32 {
        match self {
            ShellError::Syntax(e) => e.status(),
            ShellError::Build(e) => e.status(),
            ShellError::Exec(e) => e.status(),
            ShellError::Config(_) | ShellError::Logging(_) | ShellError::Io(_) => 1,
        }
    }

    /// Interruptions are silent; the prompt already moved to a new line.
    pub fn is_silent(&self) -> bool {
        matches!(self, ShellError::Build(BuildError::Interrupted))
    }
}

/// Print a diagnostic in the shell's `minishell: ...` format.
pub fn report(msg: impl fmt::Display) {
    eprintln!("minishell: {}", msg);
}

/// OS error text without the `(os error N)` suffix `io::Error` appends.
pub fn os_message(err: &io::Error) -> String {
    let text = err.to_string();
    match text.rfind(" (os error ") {
        Some(at) if err.raw_os_error().is_some() => text[..at].to_string(),
        _ => text,
    }
}

pub fn errno_message(errno: &Errno) -> String {
    os_message(&io::Error::from(*errno))
}
