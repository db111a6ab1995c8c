//! Terminal arbiter.
//!
//! Exactly one process group owns the controlling terminal at a time. The
//! shell hands it to a foreground job with [`Terminal::give_to`] and takes
//! it back with [`Terminal::reclaim`]; every `give_to` on a control path is
//! paired with a `reclaim` on all of that path's exits (normal, stop,
//! signal, error), so the shell is never left reading from a terminal a
//! dead process group still owns.
//!
//! When stdin is not a terminal (scripts, CI, tests) the handoff is a no-op:
//! there is no controlling terminal to arbitrate.

use std::io::{self, IsTerminal};

use nix::unistd::{getpgrp, tcsetpgrp, Pid};

use crate::error::{sys, ShellResult};

/// Grants and revokes controlling-terminal ownership.
#[derive(Debug, Clone)]
pub struct Terminal {
    /// The shell's own process group, captured at startup.
    own_pgid: Pid,
    interactive: bool,
}

impl Terminal {
    pub fn new() -> Self {
        Terminal {
            own_pgid: getpgrp(),
            interactive: io::stdin().is_terminal(),
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Transfer terminal ownership to `pgid`.
    pub fn give_to(&self, pgid: Pid) -> ShellResult<()> {
        if !self.interactive {
            return Ok(());
        }
        tcsetpgrp(io::stdin(), pgid).map_err(sys("tcsetpgrp"))
    }

    /// Return terminal ownership to the shell's own process group.
    pub fn reclaim(&self) -> ShellResult<()> {
        if !self.interactive {
            return Ok(());
        }
        tcsetpgrp(io::stdin(), self.own_pgid).map_err(sys("tcsetpgrp"))
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_handoff_is_a_no_op() {
        // Under the test harness stdin is not a tty, so both directions
        // must succeed without touching the terminal driver.
        let term = Terminal::new();
        if !term.is_interactive() {
            term.give_to(Pid::from_raw(1)).unwrap();
            term.reclaim().unwrap();
        }
    }
}
