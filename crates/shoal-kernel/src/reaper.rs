//! Reaper: non-blocking collection of child state changes.
//!
//! Runs once per loop iteration, before the prompt. Each `waitpid` pass
//! drains every pending notification — exit, signal, stop, continue — for
//! any child, then the scan ends on the first "nothing pending" result.
//!
//! What a notification means depends on whether the pid is already a
//! tracked job:
//!
//! - exit/signal + tracked: report with job-id prefix, remove from table
//! - signal + untracked foreground: report without a prefix
//! - stop + untracked: the job enters the table now, id minted at stop time
//! - stop/continue + tracked: state update, report
//! - anything else: already handled or superseded, discard
//!
//! `ECHILD` ends a scan benignly (no children left). Any other waitpid
//! failure is reported and ends the scan too.

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tracing::{debug, error, warn};

use crate::error::{sys, ShellResult};
use crate::events::StatusEvent;
use crate::jobs::{JobState, JobTable};

/// Placeholder labels for a process first registered at stop time. The
/// original command line is gone by then; the label records only which side
/// of the shell the process came from.
const FG_PLACEHOLDER: &str = "fg_command";
const BG_PLACEHOLDER: &str = "bg_command";

/// Drain all pending state-change notifications, updating `jobs` and
/// appending one event per user-visible change.
///
/// `foreground` is the pid of the current unwaited foreground child, if
/// any; it lets the scan tell an untracked foreground process from a
/// stranger whose notification should be discarded.
pub fn reap(jobs: &mut JobTable, foreground: Option<Pid>, events: &mut Vec<StatusEvent>) {
    let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
    loop {
        match waitpid(None, Some(flags)) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(status) => handle_status(jobs, foreground, events, status),
            Err(Errno::ECHILD) => break,
            Err(errno) => {
                warn!(%errno, "waitpid failed during reap");
                break;
            }
        }
    }
}

fn handle_status(
    jobs: &mut JobTable,
    foreground: Option<Pid>,
    events: &mut Vec<StatusEvent>,
    status: WaitStatus,
) {
    let Some(pid) = status.pid() else {
        return;
    };
    let tracked = jobs.job_for_pid(pid);

    // A pid that is neither tracked nor the foreground process was already
    // handled or superseded.
    if tracked.is_none() && foreground != Some(pid) {
        debug!(pid = pid.as_raw(), "discarding notification for unknown pid");
        return;
    }

    match status {
        WaitStatus::Exited(_, code) => {
            if let Some(id) = tracked {
                events.push(StatusEvent::Exited {
                    id,
                    pid,
                    status: code,
                });
                let _ = jobs.remove_by_pid(pid);
            }
            // Untracked foreground exit prints nothing; the launcher's own
            // wait already observed it or will.
        }
        WaitStatus::Signaled(_, signal, _) => {
            events.push(StatusEvent::Killed {
                id: tracked,
                pid,
                signal: signal as i32,
            });
            if tracked.is_some() {
                let _ = jobs.remove_by_pid(pid);
            }
        }
        WaitStatus::Stopped(_, signal) => match tracked {
            Some(id) => {
                let _ = jobs.update_state(pid, JobState::Stopped);
                events.push(StatusEvent::Suspended {
                    id,
                    pid,
                    signal: signal as i32,
                });
            }
            None => {
                let label = if foreground == Some(pid) {
                    FG_PLACEHOLDER
                } else {
                    BG_PLACEHOLDER
                };
                let id = jobs.next_id();
                match jobs.insert(id, pid, JobState::Stopped, label) {
                    Ok(()) => events.push(StatusEvent::Suspended {
                        id,
                        pid,
                        signal: signal as i32,
                    }),
                    // The process keeps running untracked; a documented gap,
                    // not a crash.
                    Err(err) => error!(%err, pid = pid.as_raw(), "failed to track stopped job"),
                }
            }
        },
        WaitStatus::Continued(_) => {
            if let Some(id) = tracked {
                let _ = jobs.update_state(pid, JobState::Running);
                events.push(StatusEvent::Resumed { id, pid });
            }
        }
        WaitStatus::StillAlive => {}
        // Ptrace notifications are not part of job control.
        #[cfg(any(target_os = "linux", target_os = "android"))]
        WaitStatus::PtraceEvent(..) | WaitStatus::PtraceSyscall(..) => {}
    }
}

/// Block until `pid` changes state: exit, signal, or stop (WUNTRACED).
/// Plain continuation does not wake this wait.
pub fn wait_blocking(pid: Pid) -> ShellResult<WaitStatus> {
    waitpid(pid, Some(WaitPidFlag::WUNTRACED)).map_err(sys("waitpid"))
}
