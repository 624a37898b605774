use std::io;
use nix::errno::Errno;
use thiserror::Error;
use crate::error::{errno_message, os_message};
use crate::pipeline::Pipeline;
use crate::state::ShellState;

pub type ExecStatus = Result<ExecOutcome, ExecError>;

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Keep reading input; the value becomes `$?`.
    Code(i32),
    /// Leave the shell with this status.
    Exit(i32),
}

impl ExecOutcome {
    pub fn code(self) -> i32 {
        match self {
            ExecOutcome::Code(code) | ExecOutcome::Exit(code) => code,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("fork: {}", errno_message(.0))]
    Fork(#[source] Errno),
    #[error("pipe: {}", errno_message(.0))]
    Pipe(#[source] Errno),
    #[error("{}", os_message(.0))]
    Io(#[from] io::Error),
    #[error("{0}: no such builtin")]
    NoSuchBuiltin(String),
}

impl ExecError {
    pub fn status(&self) -> i32 {
        1
    }
}

pub trait Executor {
    fn exec(&mut self, pipeline: Pipeline, state: &mut ShellState) -> ExecStatus;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::pipeline::CommandDescriptor;

    /// Records argv of every stage instead of running anything.
    struct TestExecutor {
        log: Vec<String>,
    }

    impl Executor for TestExecutor {
        fn exec(&mut self, pipeline: Pipeline, state: &mut ShellState) -> ExecStatus {
            for stage in &pipeline.stages {
                self.log.push(stage.argv.join(" "));
            }
            match pipeline.stages.last().and_then(|s| s.name()) {
                Some("exit") => Ok(ExecOutcome::Exit(state.last_status)),
                Some("false") => Ok(ExecOutcome::Code(1)),
                _ => Ok(ExecOutcome::Code(0)),
            }
        }
    }

    fn stage(argv: &[&str]) -> CommandDescriptor {
        CommandDescriptor {
            argv: argv.iter().map(|s| s.to_string()).collect(),
            ..CommandDescriptor::default()
        }
    }

    #[test]
    fn test_executor_sees_every_stage() {
        let mut exec = TestExecutor { log: vec![] };
        let mut state = ShellState::new(Environment::new());
        let pipeline = Pipeline {
            stages: vec![stage(&["ls", "-l"]), stage(&["false"])],
        };
        assert_eq!(exec.exec(pipeline, &mut state).unwrap(), ExecOutcome::Code(1));
        assert_eq!(exec.log, vec!["ls -l", "false"]);
    }

    #[test]
    fn test_outcome_code() {
        assert_eq!(ExecOutcome::Code(3).code(), 3);
        assert_eq!(ExecOutcome::Exit(42).code(), 42);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ExecError::Fork(Errno::EAGAIN).to_string(), "fork: Resource temporarily unavailable");
        assert_eq!(ExecError::Pipe(Errno::EMFILE).status(), 1);
    }
}
