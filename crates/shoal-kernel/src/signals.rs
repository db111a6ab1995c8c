//! Signal disposition policy.
//!
//! The shell must survive the keystrokes it forwards to its children: Ctrl-C
//! (SIGINT) and Ctrl-Z (SIGTSTP) are meant for the foreground job, and a
//! background write to the terminal must not suspend the shell (SIGTTOU).
//! Those three are ignored for the shell itself. SIGQUIT is restored to its
//! default so a quit keystroke still terminates the shell.
//!
//! A spawned child gets the opposite treatment: immediately after fork and
//! before exec it resets the three ignored signals to their defaults, so the
//! program it becomes sees normal interactive semantics.
//!
//! Dispositions are used strictly for delivery policy. Job-state tracking
//! happens by synchronous polling in the reaper, never inside a handler.

use nix::sys::signal::{signal, SigHandler, Signal};

use crate::error::{sys, ShellResult};

/// Signals the shell ignores and every child resets to default.
const INTERACTIVE_SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGTSTP, Signal::SIGTTOU];

/// Configure the shell's own dispositions at startup.
///
/// Failure here is fatal: a shell that can be suspended by its own
/// foreground job's Ctrl-Z is not usable, so callers abort startup.
pub fn install_shell_policy() -> ShellResult<()> {
    for sig in INTERACTIVE_SIGNALS {
        // SAFETY: SigIgn/SigDfl carry no handler function, so there are no
        // async-signal-safety obligations.
        unsafe { signal(sig, SigHandler::SigIgn) }.map_err(sys("signal"))?;
    }
    unsafe { signal(Signal::SIGQUIT, SigHandler::SigDfl) }.map_err(sys("signal"))?;
    Ok(())
}

/// Restore default dispositions in a forked child, before exec.
///
/// A child that cannot reset its dispositions must not run the target
/// program with the shell's ignore-policy still in place; the launcher
/// terminates it with a non-zero status instead.
pub fn reset_child_dispositions() -> ShellResult<()> {
    for sig in INTERACTIVE_SIGNALS {
        // SAFETY: as above; only default dispositions are installed.
        unsafe { signal(sig, SigHandler::SigDfl) }.map_err(sys("signal"))?;
    }
    Ok(())
}
