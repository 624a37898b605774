use std::io::{self, IsTerminal, Write};
use std::os::fd::RawFd;
use nix::errno::Errno;
use nix::unistd;
use crate::signal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    Eof,
    Interrupted,
}

/// Source of input lines for the prompt and for here-documents.
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome>;
}

/// Reads lines from standard input one byte at a time, so nothing past the
/// current line is consumed before children inherit the descriptor.
pub struct InputHandler {
    fd: RawFd,
    interactive: bool,
}

impl InputHandler {
    pub fn stdin() -> Self {
        InputHandler {
            fd: libc::STDIN_FILENO,
            interactive: io::stdin().is_terminal(),
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }
}

impl LineReader for InputHandler {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        if self.interactive {
            let mut err = io::stderr();
            write!(err, "{}", prompt)?;
            err.flush()?;
        }

        let mut buf = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match unistd::read(self.fd, &mut byte) {
                Ok(0) if buf.is_empty() => return Ok(ReadOutcome::Eof),
                Ok(0) => break,
                Ok(_) if byte[0] == b'\n' => break,
                Ok(_) => buf.push(byte[0]),
                Err(Errno::EINTR) => {
                    if signal::take_interrupt() {
                        return Ok(ReadOutcome::Interrupted);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(ReadOutcome::Line(String::from_utf8_lossy(&buf).into_owned()))
    }
}

/// Replays a fixed list of outcomes, then reports end of input.
#[cfg(test)]
pub(crate) struct ScriptedReader {
    outcomes: std::collections::VecDeque<ReadOutcome>,
    pub prompts: Vec<String>,
}

#[cfg(test)]
impl ScriptedReader {
    pub fn lines(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|l| ReadOutcome::Line(l.to_string())).collect())
    }

    pub fn new(outcomes: Vec<ReadOutcome>) -> Self {
        ScriptedReader {
            outcomes: outcomes.into(),
            prompts: Vec::new(),
        }
    }
}

#[cfg(test)]
impl LineReader for ScriptedReader {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        self.prompts.push(prompt.to_string());
        Ok(self.outcomes.pop_front().unwrap_or(ReadOutcome::Eof))
    }
}
