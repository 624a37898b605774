use std::sync::atomic::{AtomicBool, Ordering};
use log::warn;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// What the shell is doing when a signal arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMode {
    /// Waiting at the prompt: SIGINT abandons the line, SIGQUIT is ignored.
    Prompt,
    /// Reading a here-document: SIGINT stops the read.
    HereDoc,
    /// Waiting on foreground children: they take the signals, we only note them.
    Foreground,
    /// In a freshly forked child: default dispositions before exec.
    Child,
}

extern "C" fn on_sigint(_: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Consume a pending SIGINT notification.
pub fn take_interrupt() -> bool {
    INTERRUPTED.swap(false, Ordering::SeqCst)
}

pub fn clear_interrupt() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}

fn install(signal: Signal, handler: SigHandler, flags: SaFlags) -> nix::Result<()> {
    let action = SigAction::new(handler, flags, SigSet::empty());
    // SAFETY: the only handler installed here stores into an atomic.
    unsafe { sigaction(signal, &action) }.map(|_| ())
}

/// Switch SIGINT/SIGQUIT dispositions for the given mode.
///
/// Outside `Child`, the SIGINT handler is installed without `SA_RESTART`
/// so a blocking `read` returns `EINTR` and the caller can check the flag.
pub fn set_mode(mode: SignalMode) -> nix::Result<()> {
    match mode {
        SignalMode::Prompt | SignalMode::HereDoc => {
            install(Signal::SIGINT, SigHandler::Handler(on_sigint), SaFlags::empty())?;
            install(Signal::SIGQUIT, SigHandler::SigIgn, SaFlags::empty())
        }
        SignalMode::Foreground => {
            install(Signal::SIGINT, SigHandler::Handler(on_sigint), SaFlags::SA_RESTART)?;
            install(Signal::SIGQUIT, SigHandler::SigIgn, SaFlags::empty())
        }
        SignalMode::Child => {
            install(Signal::SIGINT, SigHandler::SigDfl, SaFlags::empty())?;
            install(Signal::SIGQUIT, SigHandler::SigDfl, SaFlags::empty())?;
            // The runtime ignores SIGPIPE; exec'd programs expect the default.
            install(Signal::SIGPIPE, SigHandler::SigDfl, SaFlags::empty())
        }
    }
}

/// `set_mode` for callers that can keep going with the previous dispositions.
pub fn enter(mode: SignalMode) {
    if let Err(e) = set_mode(mode) {
        warn!("could not switch signal mode to {:?}: {}", mode, e);
    }
}
