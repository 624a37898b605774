pub mod heredoc;
pub mod redirect;

use std::io;
use std::os::fd::OwnedFd;
use log::debug;
use thiserror::Error;
use crate::config::Config;
use crate::error::{os_message, report};
use crate::io::LineReader;
use crate::lexer::{Token, TokenKind};
use crate::state::ShellState;
use heredoc::HereDocReader;
use redirect::{RedirectHandler, Redirection};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("here-document interrupted")]
    Interrupted,
    #[error("here-document: {}", os_message(.0))]
    HereDoc(#[source] io::Error),
}

impl BuildError {
    pub fn status(&self) -> i32 {
        match self {
            BuildError::Interrupted => 130,
            BuildError::HereDoc(_) => 1,
        }
    }
}

/// Where a stage reads from.
#[derive(Debug, Default)]
pub enum Input {
    /// The pipe from the previous stage, or the shell's stdin.
    #[default]
    Inherit,
    File(OwnedFd),
    Failed,
}

/// Where a stage writes to.
#[derive(Debug, Default)]
pub enum Output {
    /// The pipe to the next stage, or the shell's stdout.
    #[default]
    Inherit,
    File(OwnedFd),
    Failed,
}

/// One pipeline stage: its words and its resolved redirections.
#[derive(Debug, Default)]
pub struct CommandDescriptor {
    pub argv: Vec<String>,
    pub input: Input,
    pub output: Output,
}

impl CommandDescriptor {
    pub fn has_command(&self) -> bool {
        !self.argv.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn redirect_failed(&self) -> bool {
        matches!(self.input, Input::Failed) || matches!(self.output, Output::Failed)
    }

    /// Worth forking: it has a command and every redirection resolved.
    pub fn is_runnable(&self) -> bool {
        self.has_command() && !self.redirect_failed()
    }

    fn fail(&mut self, kind: TokenKind) {
        match kind {
            TokenKind::RedirectIn | TokenKind::RedirectInOut | TokenKind::HereDoc => {
                self.input = Input::Failed
            }
            _ => self.output = Output::Failed,
        }
    }
}

#[derive(Debug, Default)]
pub struct Pipeline {
    pub stages: Vec<CommandDescriptor>,
}

impl Pipeline {
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Turns an expanded token sequence into command descriptors, one per
/// segment, opening redirection targets and reading here-documents.
///
/// A redirection failure is recorded on its stage and does not stop the
/// build. Later file redirections of that stage are skipped, but its
/// here-documents are still read so the input stays in step.
pub struct PipelineBuilder<'a, R: LineReader> {
    state: &'a ShellState,
    config: &'a Config,
    reader: &'a mut R,
}

impl<'a, R: LineReader> PipelineBuilder<'a, R> {
    pub fn new(state: &'a ShellState, config: &'a Config, reader: &'a mut R) -> Self {
        PipelineBuilder { state, config, reader }
    }

    pub fn build(&mut self, tokens: &[Token]) -> Result<Pipeline, BuildError> {
        let mut pipeline = Pipeline::default();
        for segment in tokens.split(|t| t.kind == TokenKind::Pipe) {
            let stage = self.build_stage(segment)?;
            pipeline.stages.push(stage);
        }
        debug!("built pipeline with {} stage(s)", pipeline.len());
        Ok(pipeline)
    }

    fn build_stage(&mut self, segment: &[Token]) -> Result<CommandDescriptor, BuildError> {
        let mut stage = CommandDescriptor::default();
        let mut tokens = segment.iter().peekable();

        while let Some(token) = tokens.next() {
            match token.kind {
                TokenKind::Command | TokenKind::Argument => stage.argv.push(token.text.clone()),
                TokenKind::HereDoc => {
                    let Some(delimiter) = tokens.next_if(|t| t.kind == TokenKind::Delimiter) else {
                        continue;
                    };
                    let fd = HereDocReader::new(&mut *self.reader, self.config, self.state)
                        .read(&delimiter.text, delimiter.quoted)?;
                    if !stage.redirect_failed() {
                        stage.input = Input::File(fd);
                    }
                }
                kind if kind.is_file_redirect() => {
                    let target = tokens.next_if(|t| t.kind == TokenKind::FdMarker);
                    if !stage.redirect_failed() {
                        open_target(&mut stage, kind, target);
                    }
                }
                _ => {}
            }
        }
        Ok(stage)
    }
}

fn open_target(stage: &mut CommandDescriptor, kind: TokenKind, target: Option<&Token>) {
    let target = match target {
        Some(t) if !t.ambiguous => t,
        other => {
            let raw = other.map_or("", |t| t.text.as_str());
            report(format!("{}: ambiguous redirect", raw));
            stage.fail(kind);
            return;
        }
    };

    match RedirectHandler::open(kind, &target.text) {
        Ok(Redirection::Input(fd)) => stage.input = Input::File(fd),
        Ok(Redirection::Output(fd)) => stage.output = Output::File(fd),
        Err(e) => {
            debug!("{:?} {} failed: {}", kind, target.text, e);
            report(format!("{}: {}", target.text, os_message(&e)));
            stage.fail(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};
    use std::io::Read;
    use pretty_assertions::assert_eq;
    use super::*;
    use crate::environment::Environment;
    use crate::expander::Expander;
    use crate::io::input::ScriptedReader;
    use crate::lexer::tokenize;

    struct Fixture {
        dir: tempfile::TempDir,
        config: Config,
        state: ShellState,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = Config {
                heredoc_dir: dir.path().to_path_buf(),
                ..Config::default()
            };
            let mut env = Environment::new();
            env.set("TWO", "a b");
            Fixture { dir, config, state: ShellState::new(env) }
        }

        fn path(&self, name: &str) -> String {
            self.dir.path().join(name).to_str().unwrap().to_string()
        }

        fn build(&self, line: &str, reader: &mut ScriptedReader) -> Result<Pipeline, BuildError> {
            let tokens = Expander::new(&self.state).expand(tokenize(line));
            PipelineBuilder::new(&self.state, &self.config, reader).build(&tokens)
        }
    }

    fn read_all(fd: &OwnedFd) -> String {
        let mut s = String::new();
        File::from(fd.try_clone().unwrap()).read_to_string(&mut s).unwrap();
        s
    }

    #[test]
    fn test_one_stage_per_segment() {
        let fx = Fixture::new();
        let mut reader = ScriptedReader::lines(&[]);
        let pipeline = fx.build("ls -l | grep x | wc -l", &mut reader).unwrap();
        let argv: Vec<Vec<String>> = pipeline.stages.iter().map(|s| s.argv.clone()).collect();
        assert_eq!(argv, vec![vec!["ls", "-l"], vec!["grep", "x"], vec!["wc", "-l"]]);
        assert!(pipeline.stages.iter().all(CommandDescriptor::is_runnable));
    }

    #[test]
    fn test_output_redirect_opens_file() {
        let fx = Fixture::new();
        let out = fx.path("out");
        let mut reader = ScriptedReader::lines(&[]);
        let pipeline = fx.build(&format!("echo hi > {} extra", out), &mut reader).unwrap();
        let stage = &pipeline.stages[0];
        assert_eq!(stage.argv, vec!["echo", "hi", "extra"]);
        assert!(matches!(stage.output, Output::File(_)));
        assert!(fs::metadata(&out).is_ok());
    }

    #[test]
    fn test_missing_input_fails_only_its_stage() {
        let fx = Fixture::new();
        let mut reader = ScriptedReader::lines(&[]);
        let line = format!("cat < {} | wc -l", fx.path("missing"));
        let pipeline = fx.build(&line, &mut reader).unwrap();
        assert!(matches!(pipeline.stages[0].input, Input::Failed));
        assert!(!pipeline.stages[0].is_runnable());
        assert!(pipeline.stages[1].is_runnable());
    }

    #[test]
    fn test_first_failure_stops_later_redirects() {
        let fx = Fixture::new();
        let after = fx.path("after");
        let mut reader = ScriptedReader::lines(&[]);
        let line = format!("cat < {} > {}", fx.path("missing"), after);
        let pipeline = fx.build(&line, &mut reader).unwrap();
        assert!(matches!(pipeline.stages[0].output, Output::Inherit));
        assert!(fs::metadata(&after).is_err());
    }

    #[test]
    fn test_ambiguous_target() {
        let fx = Fixture::new();
        let mut reader = ScriptedReader::lines(&[]);
        let pipeline = fx.build("echo x > $TWO", &mut reader).unwrap();
        assert!(matches!(pipeline.stages[0].output, Output::Failed));
    }

    #[test]
    fn test_heredoc_becomes_input() {
        let fx = Fixture::new();
        let mut reader = ScriptedReader::lines(&["one $TWO", "END"]);
        let pipeline = fx.build("cat << END", &mut reader).unwrap();
        match &pipeline.stages[0].input {
            Input::File(fd) => assert_eq!(read_all(fd), "one a b\n"),
            other => panic!("unexpected input {:?}", other),
        }
    }

    #[test]
    fn test_heredoc_read_after_failed_redirect() {
        let fx = Fixture::new();
        let mut reader = ScriptedReader::lines(&["body", "END", "next"]);
        let line = format!("cat < {} << END", fx.path("missing"));
        let pipeline = fx.build(&line, &mut reader).unwrap();
        assert!(matches!(pipeline.stages[0].input, Input::Failed));
        assert_eq!(reader.prompts.len(), 2);
    }

    #[test]
    fn test_interrupted_heredoc_aborts_build() {
        let fx = Fixture::new();
        let mut reader = ScriptedReader::new(vec![crate::io::ReadOutcome::Interrupted]);
        let err = fx.build("cat << END | wc", &mut reader).unwrap_err();
        assert_eq!(err.status(), 130);
    }

    #[test]
    fn test_redirect_only_stage_has_no_command() {
        let fx = Fixture::new();
        let mut reader = ScriptedReader::lines(&[]);
        let pipeline = fx.build(&format!("> {}", fx.path("touched")), &mut reader).unwrap();
        assert!(!pipeline.stages[0].has_command());
        assert!(!pipeline.stages[0].redirect_failed());
    }
}
