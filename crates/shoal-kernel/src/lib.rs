//! shoal-kernel: The job-control core of the shoal shell.
//!
//! This crate provides:
//!
//! - **Parser**: Splits a command line into a command descriptor or a
//!   job-control request (`fg %n`, `bg %n`)
//! - **Job table**: Tracks background and stopped processes with
//!   monotonically assigned job ids
//! - **Signal policy**: Disposition setup for the shell and its children
//! - **Terminal arbiter**: Hands the controlling terminal between the shell
//!   and foreground process groups
//! - **Launcher**: Forks, sets up process groups / redirections, and execs
//! - **Reaper**: Non-blocking collection of child state changes
//! - **Builtins**: `cd`, `ln`, `rm`, `jobs`, `exit`
//! - **Shell**: The context object that owns all of the above
//!
//! The engine is deliberately single-threaded: one control thread alternates
//! between reaping, reading input, and blocking on the foreground job. All
//! user-visible status lines are returned to the caller as [`StatusEvent`]s
//! rather than printed here, so embedders decide where output goes.

pub mod builtin;
pub mod error;
pub mod events;
pub mod jobs;
pub mod launcher;
pub mod parser;
pub mod reaper;
pub mod shell;
pub mod signals;
pub mod terminal;

pub use error::{ShellError, ShellResult};
pub use events::StatusEvent;
pub use jobs::{JobError, JobId, JobRecord, JobState, JobTable};
pub use parser::{parse, Command, Input, OutputRedirect, ParseError};
pub use shell::{LineOutcome, Shell};
pub use signals::install_shell_policy;
