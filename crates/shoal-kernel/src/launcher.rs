//! Process launcher: fork, set up the child, exec.
//!
//! Every launched command becomes the leader of a fresh process group, which
//! decouples its signal scope from the shell and from other jobs. The child
//! side runs between fork and exec and must not return: any setup failure is
//! fatal to the child only, reported on stderr and ended with `_exit` so no
//! shell-side buffers or destructors run twice.

use std::convert::Infallible;
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

use nix::errno::Errno;
use nix::unistd::{dup2, execv, fork, getpid, setpgid, ForkResult, Pid};
use tracing::warn;

use crate::error::{sys, ShellError, ShellResult};
use crate::parser::Command;
use crate::signals;
use crate::terminal::Terminal;

/// Fork and exec `cmd`, returning the child's pid.
///
/// On return the child is the leader of its own process group and, for a
/// foreground command, may already own the terminal (the child claims it
/// itself to close the race against the parent's handoff).
pub fn spawn(cmd: &Command, terminal: &Terminal) -> ShellResult<Pid> {
    let images = ExecImages::prepare(cmd)?;
    // SAFETY: the shell runs a single control thread, so the child cannot
    // inherit a lock held by another thread and may safely report setup
    // failures before exec.
    match unsafe { fork() }.map_err(sys("fork"))? {
        ForkResult::Child => run_child(cmd, terminal, &images),
        ForkResult::Parent { child } => {
            // Best-effort group confirmation. EACCES means the child already
            // execed (and set its own group); a vanished child is also fine.
            if let Err(errno) = setpgid(child, child) {
                if errno != Errno::EACCES {
                    warn!(pid = child.as_raw(), %errno, "setpgid on child failed");
                }
            }
            Ok(child)
        }
    }
}

/// Pre-built CStrings for execv, allocated before the fork.
struct ExecImages {
    program: CString,
    argv: Vec<CString>,
}

impl ExecImages {
    fn prepare(cmd: &Command) -> ShellResult<Self> {
        let program = CString::new(cmd.program.as_str())
            .map_err(|_| ShellError::InvalidArgument(cmd.program.clone()))?;
        let argv = cmd
            .argv
            .iter()
            .map(|arg| {
                CString::new(arg.as_str()).map_err(|_| ShellError::InvalidArgument(arg.clone()))
            })
            .collect::<ShellResult<Vec<_>>>()?;
        Ok(ExecImages { program, argv })
    }
}

/// Child side. Never returns: either execs or exits non-zero.
fn run_child(cmd: &Command, terminal: &Terminal, images: &ExecImages) -> ! {
    if let Err(err) = child_setup(cmd, terminal, images) {
        eprintln!("shoal: {err}");
    }
    // Reached only on failure; exec replaced the image otherwise.
    unsafe { libc::_exit(1) }
}

fn child_setup(cmd: &Command, terminal: &Terminal, images: &ExecImages) -> ShellResult<Infallible> {
    // New process group with this child as leader.
    setpgid(Pid::from_raw(0), Pid::from_raw(0)).map_err(sys("setpgid"))?;

    // The target program gets normal interactive signal semantics.
    signals::reset_child_dispositions()?;

    // Foreground children take the terminal for their new group.
    if !cmd.background {
        terminal.give_to(getpid())?;
    }

    apply_redirections(cmd)?;

    execv(&images.program, &images.argv).map_err(sys("execv"))?;
    unreachable!("execv returned without error");
}

/// Rewire fds 0/1 per the descriptor. Open failures are fatal to the child
/// only. The opened files are dropped after dup2; the numbered fds survive.
fn apply_redirections(cmd: &Command) -> ShellResult<()> {
    if let Some(path) = &cmd.stdin_from {
        let file = File::open(path).map_err(|source| ShellError::Io {
            op: "open",
            path: path.clone(),
            source,
        })?;
        dup2(file.as_raw_fd(), libc::STDIN_FILENO).map_err(sys("dup2"))?;
    }

    if let Some(redirect) = &cmd.stdout_to {
        let mut options = OpenOptions::new();
        options.write(true).create(true);
        if redirect.append {
            options.append(true);
        } else {
            options.truncate(true);
        }
        let file = options.open(&redirect.path).map_err(|source| ShellError::Io {
            op: "open",
            path: redirect.path.clone(),
            source,
        })?;
        dup2(file.as_raw_fd(), libc::STDOUT_FILENO).map_err(sys("dup2"))?;
    }

    Ok(())
}
