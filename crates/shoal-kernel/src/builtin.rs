//! Builtin commands that do not touch job control: `cd`, `ln`, `rm`,
//! `exit`, plus the `jobs` listing. Each is a thin wrapper around one OS
//! primitive with strict argument-count validation, matching traditional
//! shell behavior: a path containing `/` is never treated as a builtin.

use std::fmt::Write as _;

use crate::error::{ShellError, ShellResult};
use crate::jobs::JobTable;
use crate::parser::Command;

/// What dispatching a command to the builtin layer produced.
#[derive(Debug, PartialEq, Eq)]
pub enum BuiltinOutcome {
    /// Not a builtin; hand the command to the launcher.
    NotBuiltin,
    /// Handled, nothing to print.
    Done,
    /// Handled, with output for the user.
    Output(String),
    /// The `exit` builtin ran; the caller should tear down and stop.
    Exit,
}

/// Try to run `cmd` as a builtin.
pub fn dispatch(cmd: &Command, jobs: &JobTable) -> ShellResult<BuiltinOutcome> {
    // An explicit path always means an external program.
    if cmd.program.contains('/') {
        return Ok(BuiltinOutcome::NotBuiltin);
    }

    let args = &cmd.argv[1..];
    match cmd.argv[0].as_str() {
        "exit" => {
            if !args.is_empty() {
                return Err(usage("exit takes no arguments"));
            }
            Ok(BuiltinOutcome::Exit)
        }
        "jobs" => Ok(BuiltinOutcome::Output(render_jobs(jobs))),
        "cd" => {
            let dir = exactly_one(args, "cd requires a directory argument", "cd takes only one argument")?;
            std::env::set_current_dir(dir).map_err(|source| ShellError::Io {
                op: "cd",
                path: dir.clone(),
                source,
            })?;
            Ok(BuiltinOutcome::Done)
        }
        "ln" => {
            let (src, dst) = match args {
                [src, dst] => (src, dst),
                [] | [_] => return Err(usage("ln requires source and destination arguments")),
                _ => return Err(usage("ln takes exactly two arguments")),
            };
            std::fs::hard_link(src, dst).map_err(|source| ShellError::Io {
                op: "ln",
                path: src.clone(),
                source,
            })?;
            Ok(BuiltinOutcome::Done)
        }
        "rm" => {
            let path = exactly_one(args, "rm requires a file argument", "rm takes only one argument")?;
            std::fs::remove_file(path).map_err(|source| ShellError::Io {
                op: "rm",
                path: path.clone(),
                source,
            })?;
            Ok(BuiltinOutcome::Done)
        }
        _ => Ok(BuiltinOutcome::NotBuiltin),
    }
}

fn usage(msg: &str) -> ShellError {
    ShellError::Usage(msg.to_string())
}

fn exactly_one<'a>(
    args: &'a [String],
    missing: &str,
    extra: &str,
) -> ShellResult<&'a String> {
    match args {
        [one] => Ok(one),
        [] => Err(usage(missing)),
        _ => Err(usage(extra)),
    }
}

/// Render the job table for the `jobs` builtin, one line per job in id
/// order.
pub fn render_jobs(jobs: &JobTable) -> String {
    let mut out = String::new();
    for record in jobs.list() {
        let _ = writeln!(
            out,
            "[{}] ({}) {} {}",
            record.id, record.pid, record.state, record.command
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobId, JobState};
    use crate::parser::{parse, Input};
    use nix::unistd::Pid;

    fn cmd(line: &str) -> Command {
        match parse(line).unwrap() {
            Input::Exec(cmd) => cmd,
            other => panic!("expected Exec, got {other:?}"),
        }
    }

    fn empty_jobs() -> JobTable {
        JobTable::new()
    }

    #[test]
    fn paths_with_slashes_are_never_builtins() {
        let outcome = dispatch(&cmd("/bin/rm file"), &empty_jobs()).unwrap();
        assert_eq!(outcome, BuiltinOutcome::NotBuiltin);
    }

    #[test]
    fn unknown_names_fall_through() {
        let outcome = dispatch(&cmd("frobnicate"), &empty_jobs()).unwrap();
        assert_eq!(outcome, BuiltinOutcome::NotBuiltin);
    }

    #[test]
    fn exit_rejects_arguments() {
        assert!(dispatch(&cmd("exit now"), &empty_jobs()).is_err());
        assert_eq!(
            dispatch(&cmd("exit"), &empty_jobs()).unwrap(),
            BuiltinOutcome::Exit
        );
    }

    #[test]
    fn cd_argument_validation() {
        assert!(dispatch(&cmd("cd"), &empty_jobs()).is_err());
        assert!(dispatch(&cmd("cd a b"), &empty_jobs()).is_err());
    }

    #[test]
    fn ln_and_rm_argument_validation() {
        assert!(dispatch(&cmd("ln one"), &empty_jobs()).is_err());
        assert!(dispatch(&cmd("ln a b c"), &empty_jobs()).is_err());
        assert!(dispatch(&cmd("rm"), &empty_jobs()).is_err());
        assert!(dispatch(&cmd("rm a b"), &empty_jobs()).is_err());
    }

    #[test]
    fn rm_reports_the_failing_operation() {
        let err = dispatch(&cmd("rm surely-missing-file-4141"), &empty_jobs()).unwrap_err();
        assert!(err.to_string().starts_with("rm "));
    }

    #[test]
    fn jobs_listing_format() {
        let mut jobs = JobTable::new();
        jobs.insert(JobId(1), Pid::from_raw(101), JobState::Running, "/bin/sleep")
            .unwrap();
        jobs.insert(JobId(2), Pid::from_raw(102), JobState::Stopped, "/bin/cat")
            .unwrap();

        let out = render_jobs(&jobs);
        assert_eq!(
            out,
            "[1] (101) running /bin/sleep\n[2] (102) suspended /bin/cat\n"
        );
    }

    #[test]
    fn jobs_listing_empty_table() {
        assert_eq!(render_jobs(&empty_jobs()), "");
    }
}
