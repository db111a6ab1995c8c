//! Error types shared across the kernel.
//!
//! Syscall failures always name the failing operation, so a user staring at
//! `shoal: tcsetpgrp: EPERM` knows which transition went wrong. Job-table
//! and parse errors carry their own enums and fold into [`ShellError`] at
//! the shell boundary.

use thiserror::Error;

use crate::jobs::JobError;
use crate::parser::ParseError;

/// Result type for kernel operations.
pub type ShellResult<T> = Result<T, ShellError>;

/// Top-level error for shell operations.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A syscall failed; `op` names the operation for diagnostics.
    #[error("{op}: {errno}")]
    Sys {
        op: &'static str,
        #[source]
        errno: nix::Error,
    },

    /// A file operation performed on behalf of the user failed.
    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Job-table lookup or consistency failure.
    #[error(transparent)]
    Job(#[from] JobError),

    /// The input line could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A builtin was invoked with the wrong arguments.
    #[error("{0}")]
    Usage(String),

    /// An argument could not be passed to exec (embedded NUL byte).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Helper for mapping `nix::Error` into [`ShellError::Sys`] with the
/// operation name attached: `.map_err(sys("fork"))`.
pub(crate) fn sys(op: &'static str) -> impl FnOnce(nix::Error) -> ShellError {
    move |errno| ShellError::Sys { op, errno }
}
