//! The shell context: owns the job table, the terminal arbiter, and the
//! foreground tracker, and drives one command cycle at a time.
//!
//! There are no process-wide singletons; embedders construct a [`Shell`] and
//! feed it lines. The control flow per cycle is: reap pending child state
//! changes, parse the line, then route it to a builtin, the job-control
//! handler (`fg`/`bg`), or the launcher. Only two places block on anything
//! other than input: the foreground wait after a launch, and the foreground
//! wait inside `fg`.

use nix::sys::signal::{killpg, Signal};
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use tracing::{error, warn};

use crate::builtin::{self, BuiltinOutcome};
use crate::error::{sys, ShellError, ShellResult};
use crate::events::StatusEvent;
use crate::jobs::{JobError, JobId, JobState, JobTable};
use crate::launcher;
use crate::parser::{self, Command, Input};
use crate::reaper;
use crate::terminal::Terminal;

/// The current foreground process, valid only while a foreground command is
/// running. `job` is set when the process was resumed from an existing job
/// via `fg`.
#[derive(Debug, Clone, Copy)]
struct Foreground {
    pid: Pid,
    job: Option<JobId>,
}

/// Result of running one line.
#[derive(Debug, Default)]
pub struct LineOutcome {
    /// Status lines to show the user, in order.
    pub events: Vec<StatusEvent>,
    /// Builtin output (`jobs`), if any. Already newline-terminated.
    pub output: Option<String>,
    /// True when the `exit` builtin ran; the caller should stop reading.
    pub exit: bool,
}

/// Interactive shell state and command dispatch.
pub struct Shell {
    jobs: JobTable,
    terminal: Terminal,
    foreground: Option<Foreground>,
}

impl Shell {
    pub fn new() -> Self {
        Shell {
            jobs: JobTable::new(),
            terminal: Terminal::new(),
            foreground: None,
        }
    }

    /// The job table, for listings and assertions.
    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    /// Collect pending child state changes. Call once per cycle, before
    /// reading input.
    pub fn reap(&mut self) -> Vec<StatusEvent> {
        let mut events = Vec::new();
        reaper::reap(
            &mut self.jobs,
            self.foreground.map(|fg| fg.pid),
            &mut events,
        );
        events
    }

    /// Parse and run one line of input.
    pub fn run_line(&mut self, line: &str) -> ShellResult<LineOutcome> {
        let mut outcome = LineOutcome::default();
        match parser::parse(line)? {
            Input::Empty => {}
            Input::Fg(id) => self.foreground_job(id, &mut outcome.events)?,
            Input::Bg(id) => self.background_job(id)?,
            Input::Exec(cmd) => match builtin::dispatch(&cmd, &self.jobs)? {
                BuiltinOutcome::Exit => {
                    self.teardown();
                    outcome.exit = true;
                }
                BuiltinOutcome::Output(out) => outcome.output = Some(out),
                BuiltinOutcome::Done => {}
                BuiltinOutcome::NotBuiltin => self.launch(cmd, &mut outcome.events)?,
            },
        }
        Ok(outcome)
    }

    /// Release all job-table resources. The `exit` builtin and EOF both end
    /// up here before the process terminates.
    pub fn teardown(&mut self) {
        self.jobs.clear();
    }

    /// Launch an external command, foreground or background.
    fn launch(&mut self, cmd: Command, events: &mut Vec<StatusEvent>) -> ShellResult<()> {
        let pid = launcher::spawn(&cmd, &self.terminal)?;

        if cmd.background {
            let id = self.jobs.next_id();
            match self.jobs.insert(id, pid, JobState::Running, cmd.label()) {
                Ok(()) => events.push(StatusEvent::Launched { id, pid }),
                // The process runs on untracked; reported, not fatal.
                Err(err) => error!(%err, pid = pid.as_raw(), "failed to track background job"),
            }
            return Ok(());
        }

        // Foreground: hand over the terminal (the child also claims it;
        // doing it on both sides closes the startup race), then block until
        // the child exits, is signaled, or stops.
        if let Err(err) = self.terminal.give_to(pid) {
            warn!(%err, "terminal handoff to foreground child failed");
        }
        self.foreground = Some(Foreground { pid, job: None });

        match reaper::wait_blocking(pid) {
            Ok(status) => self.settle_launched_foreground(status, &cmd, events),
            Err(err) => warn!(%err, "wait on foreground child failed"),
        }

        self.foreground = None;
        if let Err(err) = self.terminal.reclaim() {
            warn!(%err, "failed to reclaim terminal");
        }
        Ok(())
    }

    /// Translate the wait status of a freshly launched foreground command.
    /// A stop is the moment the process becomes a job: the id is minted
    /// here, not at launch.
    fn settle_launched_foreground(
        &mut self,
        status: WaitStatus,
        cmd: &Command,
        events: &mut Vec<StatusEvent>,
    ) {
        match status {
            WaitStatus::Stopped(pid, signal) => {
                let id = self.jobs.next_id();
                match self.jobs.insert(id, pid, JobState::Stopped, cmd.label()) {
                    Ok(()) => events.push(StatusEvent::Suspended {
                        id,
                        pid,
                        signal: signal as i32,
                    }),
                    Err(err) => error!(%err, pid = pid.as_raw(), "failed to track stopped job"),
                }
            }
            WaitStatus::Signaled(pid, signal, _) => {
                events.push(StatusEvent::Killed {
                    id: None,
                    pid,
                    signal: signal as i32,
                });
            }
            // Plain exit leaves no table entry and prints nothing.
            _ => {}
        }
    }

    /// `fg %id`: resume a job in the foreground and wait for its next state
    /// change. The terminal is reclaimed on every exit route.
    fn foreground_job(&mut self, id: JobId, events: &mut Vec<StatusEvent>) -> ShellResult<()> {
        let pid = self.jobs.lookup_pid(id).ok_or(JobError::NoSuchJob(id))?;

        // Every give_to below pairs with a reclaim on every exit route,
        // including the failure of give_to itself.
        if let Err(err) = self.terminal.give_to(pid) {
            let _ = self.terminal.reclaim();
            return Err(err);
        }
        if let Err(errno) = killpg(pid, Signal::SIGCONT) {
            let _ = self.terminal.reclaim();
            return Err(sys("kill")(errno));
        }

        let _ = self.jobs.update_state(pid, JobState::Running);
        let tracker = Foreground { pid, job: Some(id) };
        self.foreground = Some(tracker);

        match reaper::wait_blocking(pid) {
            Ok(WaitStatus::Stopped(_, signal)) => {
                let _ = self.jobs.update_state(pid, JobState::Stopped);
                events.push(StatusEvent::Suspended {
                    id,
                    pid,
                    signal: signal as i32,
                });
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                events.push(StatusEvent::Killed {
                    id: None,
                    pid,
                    signal: signal as i32,
                });
                if let Some(job) = tracker.job {
                    let _ = self.jobs.remove_by_id(job);
                }
            }
            Ok(_) => {
                // Normal exit: the job is simply gone.
                if let Some(job) = tracker.job {
                    let _ = self.jobs.remove_by_id(job);
                }
            }
            Err(err) => warn!(%err, "wait on resumed job failed"),
        }

        self.foreground = None;
        self.terminal.reclaim()
    }

    /// `bg %id`: continue a stopped job in the background. No wait, no
    /// terminal transfer. Continuing an already-running job is rejected.
    fn background_job(&mut self, id: JobId) -> ShellResult<()> {
        let pid = self.jobs.lookup_pid(id).ok_or(JobError::NoSuchJob(id))?;

        match self.jobs.lookup_state(pid) {
            Some(JobState::Stopped) => {}
            Some(JobState::Running) => {
                return Err(ShellError::Usage("job is already running".to_string()))
            }
            None => return Err(JobError::NoSuchJob(id).into()),
        }

        killpg(pid, Signal::SIGCONT).map_err(sys("kill"))?;
        let _ = self.jobs.update_state(pid, JobState::Running);
        Ok(())
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShellError;
    use crate::parser::ParseError;

    #[test]
    fn empty_line_is_a_quiet_no_op() {
        let mut shell = Shell::new();
        let outcome = shell.run_line("   ").unwrap();
        assert!(outcome.events.is_empty());
        assert!(!outcome.exit);
    }

    #[test]
    fn parse_errors_surface_without_mutating_state() {
        let mut shell = Shell::new();
        let err = shell.run_line("fg").unwrap_err();
        assert!(matches!(
            err,
            ShellError::Parse(ParseError::ExpectedJobId)
        ));
        assert!(shell.jobs().is_empty());
    }

    #[test]
    fn fg_on_unknown_job_fails_cleanly() {
        let mut shell = Shell::new();
        let err = shell.run_line("fg %7").unwrap_err();
        assert!(matches!(err, ShellError::Job(JobError::NoSuchJob(JobId(7)))));
        assert!(shell.foreground.is_none());
    }

    #[test]
    fn bg_on_unknown_job_fails_cleanly() {
        let mut shell = Shell::new();
        assert!(shell.run_line("bg %3").is_err());
        assert!(shell.jobs().is_empty());
    }

    #[test]
    fn exit_builtin_requests_shutdown() {
        let mut shell = Shell::new();
        let outcome = shell.run_line("exit").unwrap();
        assert!(outcome.exit);
        assert!(shell.jobs().is_empty());
    }

    #[test]
    fn jobs_builtin_returns_output() {
        let mut shell = Shell::new();
        let outcome = shell.run_line("jobs").unwrap();
        assert_eq!(outcome.output.as_deref(), Some(""));
    }
}
