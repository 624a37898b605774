use std::io::{self, Write};
use log::{debug, info};
use crate::config::Config;
use crate::error::{os_message, report, ShellError};
use crate::executor::{ExecOutcome, Executor};
use crate::expander::Expander;
use crate::io::{LineReader, ReadOutcome};
use crate::lexer;
use crate::parser;
use crate::pipeline::PipelineBuilder;
use crate::signal::{self, SignalMode};
use crate::state::ShellState;

/// What the session does after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

/// One interactive session: reads lines and runs them until EOF or `exit`.
pub struct Shell<R: LineReader, E: Executor> {
    state: ShellState,
    config: Config,
    reader: R,
    executor: E,
}

impl<R: LineReader, E: Executor> Shell<R, E> {
    pub fn new(state: ShellState, config: Config, reader: R, executor: E) -> Self {
        Shell { state, config, reader, executor }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    /// Run until end of input or `exit`; returns the process exit status.
    pub fn run(&mut self) -> i32 {
        info!("session started (interactive: {})", self.state.interactive);
        loop {
            signal::enter(SignalMode::Prompt);
            let outcome = match self.reader.read_line(&self.config.prompt) {
                Ok(outcome) => outcome,
                Err(e) => {
                    report(format!("read error: {}", os_message(&e)));
                    return 1;
                }
            };

            match outcome {
                ReadOutcome::Line(line) => {
                    if let Flow::Exit(code) = self.process_line(&line) {
                        info!("exit {}", code);
                        return code;
                    }
                }
                ReadOutcome::Interrupted => {
                    self.state.last_status = 130;
                    self.newline();
                }
                ReadOutcome::Eof => {
                    if self.state.interactive {
                        eprintln!("exit");
                    }
                    info!("end of input, status {}", self.state.last_status);
                    return self.state.last_status;
                }
            }
        }
    }

    /// Run one input line and record its status.
    pub fn process_line(&mut self, line: &str) -> Flow {
        match self.execute_line(line) {
            Ok(Some(ExecOutcome::Exit(code))) => Flow::Exit(code),
            Ok(Some(ExecOutcome::Code(code))) => {
                self.state.last_status = code;
                Flow::Continue
            }
            Ok(None) => Flow::Continue,
            Err(e) => {
                if e.is_silent() {
                    self.newline();
                } else {
                    report(&e);
                }
                self.state.last_status = e.status();
                Flow::Continue
            }
        }
    }

    fn execute_line(&mut self, line: &str) -> Result<Option<ExecOutcome>, ShellError> {
        let tokens = lexer::tokenize(line);
        if tokens.is_empty() {
            return Ok(None);
        }
        parser::validate(line, &tokens)?;

        let tokens = Expander::new(&self.state).expand(tokens);
        let pipeline = PipelineBuilder::new(&self.state, &self.config, &mut self.reader).build(&tokens)?;

        signal::enter(SignalMode::Foreground);
        let outcome = self.executor.exec(pipeline, &mut self.state);
        signal::enter(SignalMode::Prompt);
        signal::clear_interrupt();

        let outcome = outcome?;
        debug!("line finished with {:?}", outcome);
        Ok(Some(outcome))
    }

    fn newline(&self) {
        if self.state.interactive {
            let _ = writeln!(io::stderr());
        }
    }
}
