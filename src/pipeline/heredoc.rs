use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use log::{debug, warn};
use nix::unistd;
use crate::config::Config;
use crate::error::report;
use crate::expander::Expander;
use crate::io::{LineReader, ReadOutcome};
use crate::pipeline::BuildError;
use crate::signal::{self, SignalMode};
use crate::state::ShellState;

static SEQUENCE: AtomicUsize = AtomicUsize::new(0);

/// Keeps a duplicate of fd 0 and puts it back on drop, so an interrupted
/// read leaves standard input as it found it.
///
/// This only matters for readers that close or replace fd 0 on SIGINT.
/// `InputHandler` sees the signal as `EINTR` and leaves fd 0 open, so with
/// it the restore puts back the same file.
struct StdinGuard {
    saved: Option<RawFd>,
}

impl StdinGuard {
    fn new() -> Self {
        let saved = unistd::dup(libc::STDIN_FILENO)
            .map_err(|e| warn!("could not save stdin: {}", e))
            .ok();
        StdinGuard { saved }
    }
}

impl Drop for StdinGuard {
    fn drop(&mut self) {
        if let Some(fd) = self.saved.take() {
            if let Err(e) = unistd::dup2(fd, libc::STDIN_FILENO) {
                warn!("could not restore stdin: {}", e);
            }
            let _ = unistd::close(fd);
        }
    }
}

/// Collects here-document bodies into private temporary files.
pub struct HereDocReader<'a, R: LineReader> {
    reader: &'a mut R,
    config: &'a Config,
    state: &'a ShellState,
}

impl<'a, R: LineReader> HereDocReader<'a, R> {
    pub fn new(reader: &'a mut R, config: &'a Config, state: &'a ShellState) -> Self {
        HereDocReader { reader, config, state }
    }

    /// Read lines up to `delimiter` and return the body opened for reading.
    ///
    /// The backing file is unlinked before returning; the descriptor is the
    /// only remaining reference. Lines are expanded unless the delimiter
    /// was quoted.
    pub fn read(&mut self, delimiter: &str, quoted: bool) -> Result<OwnedFd, BuildError> {
        let (path, mut file) = create_unique(&self.config.heredoc_dir).map_err(BuildError::HereDoc)?;
        debug!("here-document for {:?} buffered in {}", delimiter, path.display());

        let filled = {
            let _stdin = StdinGuard::new();
            signal::enter(SignalMode::HereDoc);
            let filled = self.fill(&mut file, delimiter, quoted);
            signal::enter(SignalMode::Prompt);
            filled
        };
        drop(file);

        let reopened = filled.and_then(|()| File::open(&path).map_err(BuildError::HereDoc));
        if let Err(e) = fs::remove_file(&path) {
            warn!("could not remove {}: {}", path.display(), e);
        }
        Ok(reopened?.into())
    }

    fn fill(&mut self, file: &mut File, delimiter: &str, quoted: bool) -> Result<(), BuildError> {
        let expander = Expander::new(self.state);
        loop {
            let outcome = self
                .reader
                .read_line(&self.config.heredoc_prompt)
                .map_err(BuildError::HereDoc)?;
            match outcome {
                ReadOutcome::Line(line) if line == delimiter => return Ok(()),
                ReadOutcome::Line(line) => {
                    let body = if quoted { line } else { expander.expand_heredoc_line(&line) };
                    writeln!(file, "{}", body).map_err(BuildError::HereDoc)?;
                }
                ReadOutcome::Eof => {
                    report(format!(
                        "warning: here-document delimited by end-of-file (wanted `{}')",
                        delimiter
                    ));
                    return Ok(());
                }
                ReadOutcome::Interrupted => return Err(BuildError::Interrupted),
            }
        }
    }
}

/// Create a fresh owner-only file in `dir`.
fn create_unique(dir: &Path) -> io::Result<(PathBuf, File)> {
    let pid = std::process::id();
    loop {
        let n = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!(".minishell-heredoc-{}-{}", pid, n));
        match OpenOptions::new().write(true).create_new(true).mode(0o600).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
}
