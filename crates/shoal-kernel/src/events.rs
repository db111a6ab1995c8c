//! User-visible status lines.
//!
//! The exact wording of these lines is a compatibility surface; scripts and
//! tests match on them. The kernel returns events instead of printing so the
//! repl (or an embedder) decides where they go.
//!
//! ```text
//! [1] (4242)                                  background launch
//! [1] (4242) suspended by signal 20           stop
//! [1] (4242) resumed                          continue
//! [1] (4242) terminated with exit status 0    normal exit
//! [1] (4242) terminated by signal 9           signaled, tracked
//! (4242) terminated by signal 2               signaled, untracked foreground
//! ```

use std::fmt;

use nix::unistd::Pid;

use crate::jobs::JobId;

/// A status line to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// A job was launched in the background.
    Launched { id: JobId, pid: Pid },
    /// A tracked job was suspended by a stop signal.
    Suspended { id: JobId, pid: Pid, signal: i32 },
    /// A tracked job was continued.
    Resumed { id: JobId, pid: Pid },
    /// A tracked job exited normally.
    Exited { id: JobId, pid: Pid, status: i32 },
    /// A process was terminated by a signal. `id` is `None` for the
    /// untracked foreground process, which prints without a job prefix.
    Killed {
        id: Option<JobId>,
        pid: Pid,
        signal: i32,
    },
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::Launched { id, pid } => write!(f, "[{id}] ({pid})"),
            StatusEvent::Suspended { id, pid, signal } => {
                write!(f, "[{id}] ({pid}) suspended by signal {signal}")
            }
            StatusEvent::Resumed { id, pid } => write!(f, "[{id}] ({pid}) resumed"),
            StatusEvent::Exited { id, pid, status } => {
                write!(f, "[{id}] ({pid}) terminated with exit status {status}")
            }
            StatusEvent::Killed {
                id: Some(id),
                pid,
                signal,
            } => write!(f, "[{id}] ({pid}) terminated by signal {signal}"),
            StatusEvent::Killed {
                id: None,
                pid,
                signal,
            } => write!(f, "({pid}) terminated by signal {signal}"),
        }
    }
}
