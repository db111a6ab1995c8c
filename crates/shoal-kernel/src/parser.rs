//! Command-line parser.
//!
//! Splits one line of input into a [`Command`] descriptor or a job-control
//! request. The grammar is deliberately small: whitespace-separated tokens,
//! `<` / `>` / `>>` redirections (at most one per stream), a trailing `&`
//! for background, and `fg %n` / `bg %n` job references. No quoting, no
//! pipelines, no expansion — those are out of scope for this shell.

use std::fmt;

use thiserror::Error;

use crate::jobs::JobId;

/// Parse failures. Each aborts the current cycle; the read loop continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid input redirection")]
    InvalidInputRedirect,
    #[error("invalid output redirection")]
    InvalidOutputRedirect,
    #[error("expected %<job-id>")]
    ExpectedJobId,
    #[error("invalid job id")]
    InvalidJobId,
    #[error("too many arguments")]
    TooManyArguments,
    #[error("no command specified")]
    NoCommand,
}

/// Output redirection target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRedirect {
    pub path: String,
    /// `>>` appends, `>` truncates.
    pub append: bool,
}

/// An external command ready to launch.
///
/// `argv[0]` is the final path component of `program`, matching execv
/// convention; the rest are the user's arguments in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Path to the executable, exactly as the user wrote it.
    pub program: String,
    pub argv: Vec<String>,
    pub stdin_from: Option<String>,
    pub stdout_to: Option<OutputRedirect>,
    pub background: bool,
}

impl Command {
    /// Label shown in job listings and status lines.
    pub fn label(&self) -> &str {
        &self.program
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)
    }
}

/// One cycle's worth of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Blank or whitespace-only line.
    Empty,
    /// Launch an external command (or a builtin, decided at dispatch).
    Exec(Command),
    /// Bring a job to the foreground.
    Fg(JobId),
    /// Continue a stopped job in the background.
    Bg(JobId),
}

/// Parse one line of input.
pub fn parse(line: &str) -> Result<Input, ParseError> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(Input::Empty);
    }

    // fg/bg take exactly one %<job-id> argument; `&` is not meaningful here.
    if tokens[0] == "fg" || tokens[0] == "bg" {
        let id = parse_job_ref(&tokens)?;
        return Ok(if tokens[0] == "fg" {
            Input::Fg(id)
        } else {
            Input::Bg(id)
        });
    }

    let mut background = false;
    if tokens.last() == Some(&"&") {
        background = true;
        tokens.pop();
    }

    let mut command = Command {
        program: String::new(),
        argv: Vec::new(),
        stdin_from: None,
        stdout_to: None,
        background,
    };

    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        match token {
            "<" => {
                if command.stdin_from.is_some() {
                    return Err(ParseError::InvalidInputRedirect);
                }
                let path = iter.next().ok_or(ParseError::InvalidInputRedirect)?;
                command.stdin_from = Some(path.to_string());
            }
            ">" | ">>" => {
                if command.stdout_to.is_some() {
                    return Err(ParseError::InvalidOutputRedirect);
                }
                let path = iter.next().ok_or(ParseError::InvalidOutputRedirect)?;
                command.stdout_to = Some(OutputRedirect {
                    path: path.to_string(),
                    append: token == ">>",
                });
            }
            word => {
                if command.program.is_empty() {
                    command.program = word.to_string();
                    command.argv.push(basename(word).to_string());
                } else {
                    command.argv.push(word.to_string());
                }
            }
        }
    }

    if command.program.is_empty() {
        return Err(ParseError::NoCommand);
    }
    Ok(Input::Exec(command))
}

/// Parse the `%<job-id>` argument of fg/bg. `tokens[0]` is the command word.
/// The leading digit run selects the job; trailing junk after it is ignored,
/// so `%1abc` means job 1.
fn parse_job_ref(tokens: &[&str]) -> Result<JobId, ParseError> {
    let arg = tokens.get(1).ok_or(ParseError::ExpectedJobId)?;
    let rest = arg.strip_prefix('%').ok_or(ParseError::ExpectedJobId)?;
    if !rest.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(ParseError::InvalidJobId);
    }
    if tokens.len() > 2 {
        return Err(ParseError::TooManyArguments);
    }
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().map_err(|_| ParseError::InvalidJobId)
}

/// Final path component, used for argv[0].
fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec(line: &str) -> Command {
        match parse(line).unwrap() {
            Input::Exec(cmd) => cmd,
            other => panic!("expected Exec, got {other:?}"),
        }
    }

    #[test]
    fn empty_and_whitespace_lines() {
        assert_eq!(parse("").unwrap(), Input::Empty);
        assert_eq!(parse("   \t  ").unwrap(), Input::Empty);
    }

    #[test]
    fn simple_command_with_args() {
        let cmd = exec("/bin/ls -l /tmp");
        assert_eq!(cmd.program, "/bin/ls");
        assert_eq!(cmd.argv, vec!["ls", "-l", "/tmp"]);
        assert!(!cmd.background);
        assert_eq!(cmd.stdin_from, None);
        assert_eq!(cmd.stdout_to, None);
    }

    #[test]
    fn argv0_is_the_basename() {
        let cmd = exec("/usr/bin/env FOO=1");
        assert_eq!(cmd.argv[0], "env");

        let cmd = exec("echo hi");
        assert_eq!(cmd.argv[0], "echo");
    }

    #[test]
    fn trailing_ampersand_sets_background() {
        let cmd = exec("/bin/sleep 5 &");
        assert!(cmd.background);
        assert_eq!(cmd.argv, vec!["sleep", "5"]);
    }

    #[test]
    fn ampersand_must_be_its_own_last_token() {
        // "&" glued to an argument is just an argument.
        let cmd = exec("/bin/echo a&");
        assert!(!cmd.background);
        assert_eq!(cmd.argv, vec!["echo", "a&"]);
    }

    #[test]
    fn input_redirection() {
        let cmd = exec("/bin/cat < notes.txt");
        assert_eq!(cmd.stdin_from.as_deref(), Some("notes.txt"));
    }

    #[test]
    fn output_redirection_truncate_and_append() {
        let cmd = exec("/bin/echo hi > out.txt");
        let redir = cmd.stdout_to.unwrap();
        assert_eq!(redir.path, "out.txt");
        assert!(!redir.append);

        let cmd = exec("/bin/echo hi >> out.txt");
        assert!(cmd.stdout_to.unwrap().append);
    }

    #[test]
    fn redirection_can_precede_the_command() {
        let cmd = exec("> out.txt /bin/echo hi");
        assert_eq!(cmd.program, "/bin/echo");
        assert_eq!(cmd.stdout_to.unwrap().path, "out.txt");
    }

    #[test]
    fn duplicate_redirection_is_rejected() {
        assert_eq!(
            parse("/bin/cat < a < b"),
            Err(ParseError::InvalidInputRedirect)
        );
        assert_eq!(
            parse("/bin/echo x > a >> b"),
            Err(ParseError::InvalidOutputRedirect)
        );
    }

    #[test]
    fn dangling_redirection_is_rejected() {
        assert_eq!(parse("/bin/cat <"), Err(ParseError::InvalidInputRedirect));
        assert_eq!(parse("/bin/echo x >"), Err(ParseError::InvalidOutputRedirect));
    }

    #[test]
    fn redirection_with_no_command_is_rejected() {
        assert_eq!(parse("< in.txt"), Err(ParseError::NoCommand));
    }

    #[test]
    fn fg_and_bg_job_references() {
        assert_eq!(parse("fg %1").unwrap(), Input::Fg(JobId(1)));
        assert_eq!(parse("bg %12").unwrap(), Input::Bg(JobId(12)));
    }

    #[test]
    fn fg_argument_validation() {
        assert_eq!(parse("fg"), Err(ParseError::ExpectedJobId));
        assert_eq!(parse("fg 1"), Err(ParseError::ExpectedJobId));
        assert_eq!(parse("fg %one"), Err(ParseError::InvalidJobId));
        assert_eq!(parse("fg %"), Err(ParseError::InvalidJobId));
        assert_eq!(parse("bg %1 extra"), Err(ParseError::TooManyArguments));
    }

    #[test]
    fn job_ref_ignores_trailing_junk_after_the_digits() {
        assert_eq!(parse("fg %1abc").unwrap(), Input::Fg(JobId(1)));
        assert_eq!(parse("bg %12x").unwrap(), Input::Bg(JobId(12)));
    }
}
