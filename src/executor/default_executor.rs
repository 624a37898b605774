use std::ffi::CString;
use std::fs::File;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use crate::environment::Environment;
use crate::error::{errno_message, os_message, report};
use crate::pipeline::{CommandDescriptor, Input, Output, Pipeline};
use crate::signal::{self, SignalMode};
use crate::state::ShellState;
use super::builtin::BuiltinManager;
use super::executor::{ExecError, ExecOutcome, ExecStatus, Executor};
use super::path_resolver::PathResolver;

/// Runs a pipeline with one forked process per stage. A pipeline made of a
/// single builtin runs inside the shell so it can change shell state.
pub struct DefaultExecutor {
    builtins: BuiltinManager,
    resolver: PathResolver,
}

impl Default for DefaultExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for DefaultExecutor {
    fn exec(&mut self, mut pipeline: Pipeline, state: &mut ShellState) -> ExecStatus {
        if pipeline.len() == 1
            && pipeline.stages[0].name().is_some_and(|name| self.builtins.is_builtin(name))
        {
            if let Some(stage) = pipeline.stages.pop() {
                return self.exec_builtin(stage, state);
            }
        }
        self.exec_pipeline(pipeline, state)
    }
}

impl DefaultExecutor {
    pub fn new() -> Self {
        DefaultExecutor {
            builtins: BuiltinManager::new(),
            resolver: PathResolver,
        }
    }

    fn exec_builtin(&self, stage: CommandDescriptor, state: &mut ShellState) -> ExecStatus {
        if stage.redirect_failed() {
            return Ok(ExecOutcome::Code(1));
        }
        debug!("builtin {:?} in-process", stage.argv);
        match stage.output {
            Output::File(fd) => self.run_builtin(&stage.argv, state, &mut File::from(fd)),
            Output::Inherit | Output::Failed => {
                self.run_builtin(&stage.argv, state, &mut io::stdout().lock())
            }
        }
    }

    fn run_builtin(&self, argv: &[String], state: &mut ShellState, out: &mut dyn Write) -> ExecStatus {
        let Some((name, args)) = argv.split_first() else {
            return Ok(ExecOutcome::Code(0));
        };
        let result = self
            .builtins
            .execute(name, args, state, out)
            .and_then(|outcome| {
                out.flush()?;
                Ok(outcome)
            });
        match result {
            Err(ExecError::Io(e)) => {
                report(format!("{}: write error: {}", name, os_message(&e)));
                Ok(ExecOutcome::Code(1))
            }
            other => other,
        }
    }

    fn exec_pipeline(&self, pipeline: Pipeline, state: &mut ShellState) -> ExecStatus {
        let count = pipeline.len();
        let mut children = Vec::with_capacity(count);
        let mut last_pid = None;
        let mut last_status = 0;
        let mut failure = None;
        let mut upstream: Option<OwnedFd> = None;

        // Children must not inherit unflushed output.
        if let Err(e) = io::stdout().flush() {
            warn!("flushing stdout before fork: {}", e);
        }

        for (i, stage) in pipeline.stages.into_iter().enumerate() {
            let is_last = i + 1 == count;
            let (downstream, pipe_in) = if is_last {
                (None, None)
            } else {
                match unistd::pipe() {
                    Ok((read, write)) => (Some(read), Some(write)),
                    Err(e) => {
                        failure = Some(ExecError::Pipe(e));
                        break;
                    }
                }
            };

            let stdin = upstream.take();
            if stage.is_runnable() {
                match self.spawn(stage, stdin, pipe_in, downstream.as_ref(), state) {
                    Ok(pid) => {
                        children.push(pid);
                        if is_last {
                            last_pid = Some(pid);
                        }
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            } else {
                debug!("stage {} not started: {:?}", i, stage.argv);
                if is_last {
                    last_status = if stage.redirect_failed() { 1 } else { 0 };
                }
            }
            upstream = downstream;
        }
        drop(upstream);

        let mut interrupted = false;
        let mut quit = None;
        for pid in children {
            let Some(status) = wait_child(pid) else {
                continue;
            };
            debug!("reaped {}: {:?}", pid, status);
            if let WaitStatus::Signaled(_, Signal::SIGINT, _) = status {
                interrupted = true;
            }
            if Some(pid) == last_pid {
                if let WaitStatus::Signaled(_, Signal::SIGQUIT, core) = status {
                    quit = Some(core);
                }
                last_status = status_code(status);
            }
        }

        let mut err = io::stderr();
        match quit {
            Some(true) => {
                let _ = writeln!(err, "Quit (core dumped)");
            }
            Some(false) => {
                let _ = writeln!(err, "Quit");
            }
            None if interrupted => {
                let _ = writeln!(err);
            }
            None => {}
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(ExecOutcome::Code(last_status)),
        }
    }

    fn spawn(
        &self,
        stage: CommandDescriptor,
        stdin: Option<OwnedFd>,
        stdout: Option<OwnedFd>,
        spare: Option<&OwnedFd>,
        state: &mut ShellState,
    ) -> Result<Pid, ExecError> {
        // SAFETY: the shell is single-threaded. The child only rewires
        // descriptors, then execs or runs a builtin and exits.
        match unsafe { unistd::fork() }.map_err(ExecError::Fork)? {
            ForkResult::Parent { child } => {
                debug!("forked {} for {:?}", child, stage.argv);
                Ok(child)
            }
            ForkResult::Child => {
                let code = self.run_child(stage, stdin, stdout, spare.map(AsRawFd::as_raw_fd), state);
                std::process::exit(code)
            }
        }
    }

    /// Body of a forked stage. Only returns if the command could not be
    /// started or was a builtin; the result is the child's exit status.
    fn run_child(
        &self,
        stage: CommandDescriptor,
        stdin: Option<OwnedFd>,
        stdout: Option<OwnedFd>,
        spare: Option<RawFd>,
        state: &mut ShellState,
    ) -> i32 {
        signal::enter(SignalMode::Child);
        if let Some(fd) = spare {
            let _ = unistd::close(fd);
        }

        let CommandDescriptor { argv, input, output } = stage;
        let stdin = match input {
            Input::File(fd) => {
                drop(stdin);
                Some(fd)
            }
            Input::Inherit | Input::Failed => stdin,
        };
        let stdout = match output {
            Output::File(fd) => {
                drop(stdout);
                Some(fd)
            }
            Output::Inherit | Output::Failed => stdout,
        };
        if let Err(e) = rewire(stdin, libc::STDIN_FILENO).and_then(|()| rewire(stdout, libc::STDOUT_FILENO)) {
            report(format!("dup2: {}", errno_message(&e)));
            return 1;
        }

        state.interactive = false;
        let Some(name) = argv.first() else {
            return 0;
        };
        if self.builtins.is_builtin(name) {
            return match self.run_builtin(&argv, state, &mut io::stdout().lock()) {
                Ok(outcome) => outcome.code(),
                Err(e) => {
                    report(&e);
                    e.status()
                }
            };
        }
        match self.resolver.resolve(name, state.env.get("PATH")) {
            Ok(path) => exec_program(name, &path, &argv, &state.env),
            Err(e) => {
                report(&e);
                e.status()
            }
        }
    }
}

/// Make `fd` the process's `target` descriptor, closing the original.
fn rewire(fd: Option<OwnedFd>, target: RawFd) -> nix::Result<()> {
    let Some(fd) = fd else {
        return Ok(());
    };
    if fd.as_raw_fd() == target {
        let _ = fd.into_raw_fd();
        return Ok(());
    }
    unistd::dup2(fd.as_raw_fd(), target).map(|_| ())
}

/// Replace the process image. Returns the exit status to use if that fails.
fn exec_program(name: &str, path: &Path, argv: &[String], env: &Environment) -> i32 {
    let args: Result<Vec<CString>, _> = argv.iter().map(|a| CString::new(a.as_bytes())).collect();
    let (Ok(program), Ok(args)) = (CString::new(path.as_os_str().as_bytes()), args) else {
        report(format!("{}: argument contains a NUL byte", name));
        return 127;
    };

    let errno = match unistd::execve(&program, &args, &env.to_envp()) {
        Ok(never) => match never {},
        Err(e) => e,
    };
    report(format!("{}: {}", name, errno_message(&errno)));
    if errno == Errno::EACCES { 126 } else { 127 }
}

fn wait_child(pid: Pid) -> Option<WaitStatus> {
    loop {
        match waitpid(pid, None) {
            Ok(status @ (WaitStatus::Exited(..) | WaitStatus::Signaled(..))) => return Some(status),
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(e) => {
                warn!("waitpid {}: {}", pid, e);
                return None;
            }
        }
    }
}

/// `$?` for a finished child: its exit code, or 128 plus the signal number.
fn status_code(status: WaitStatus) -> i32 {
    match status {
        WaitStatus::Exited(_, code) => code,
        WaitStatus::Signaled(_, sig, _) => 128 + sig as i32,
        _ => 1,
    }
}
