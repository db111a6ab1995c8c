//! shoal REPL — the interactive read loop.
//!
//! Each iteration: reap finished/changed jobs and print their status lines,
//! read a line via rustyline, hand it to the kernel, print what came back.
//! Ctrl-C at the prompt redraws the prompt (SIGINT is ignored by the signal
//! policy; the keystroke only ever reaches the foreground job). EOF tears
//! the shell down and exits cleanly.

use std::process::ExitCode;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

use shoal_kernel::{install_shell_policy, LineOutcome, Shell};

const PROMPT: &str = "shoal> ";

/// Run the interactive loop until `exit` or EOF.
pub fn run() -> Result<ExitCode> {
    install_shell_policy().context("failed to install signal policy")?;

    let mut shell = Shell::new();
    let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;

    loop {
        for event in shell.reap() {
            println!("{event}");
        }

        match editor.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(err) = editor.add_history_entry(line.as_str()) {
                        warn!(%err, "failed to add history entry");
                    }
                }
                match shell.run_line(&line) {
                    Ok(outcome) => {
                        print_outcome(&outcome);
                        if outcome.exit {
                            return Ok(ExitCode::SUCCESS);
                        }
                    }
                    Err(err) => eprintln!("shoal: {err}"),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                shell.teardown();
                return Ok(ExitCode::SUCCESS);
            }
            Err(err) => return Err(err).context("failed to read input"),
        }
    }
}

/// Execute a single command line (the `-c` mode) and exit.
pub fn run_command(line: &str) -> Result<ExitCode> {
    install_shell_policy().context("failed to install signal policy")?;

    let mut shell = Shell::new();
    let result = shell.run_line(line);
    let code = match result {
        Ok(outcome) => {
            print_outcome(&outcome);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("shoal: {err}");
            ExitCode::FAILURE
        }
    };

    for event in shell.reap() {
        println!("{event}");
    }
    shell.teardown();
    Ok(code)
}

fn print_outcome(outcome: &LineOutcome) {
    for event in &outcome.events {
        println!("{event}");
    }
    if let Some(output) = &outcome.output {
        print!("{output}");
    }
}
