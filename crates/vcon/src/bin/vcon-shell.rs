#![forbid(unsafe_code)]

//! Interactive demo shell running inside a vcon console.
//!
//! Commands: `help`, `args`, `echo <text>`, `key`, `raw`, `seq <n>`, `exit`.
//! Anything else is echoed back. Closing the window (Ctrl+Q) ends the loop.

use std::process::ExitCode;
use std::sync::Arc;

use vcon::prelude::*;

const HELP: &str = "\
commands:
  help        show this text
  args        print the argument vector
  echo TEXT   print TEXT
  key         read one keystroke without echo
  raw         read one raw console line
  seq N       print N numbered lines
  exit        leave the shell
";

fn main() -> ExitCode {
    if let Err(err) = vcon::logging::init() {
        eprintln!("vcon-shell: {err}");
    }

    let mut shell = Shell::new(ConsoleConfig::from_env());
    match shell.run(repl) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vcon-shell: {err}");
            ExitCode::FAILURE
        }
    }
}

fn repl(console: &Arc<ConsoleSession>, args: &[String]) {
    console.write_text("vcon demo shell. Type 'help' for commands.\n");
    loop {
        let line = match console.read_line(">>> ") {
            Ok(Some(line)) => line,
            Ok(None) => {
                console.write_text("no interactive console; exiting\n");
                return;
            }
            Err(ConsoleError::Shutdown) => return,
            Err(err) => {
                tracing::error!(error = %err, "read failed");
                return;
            }
        };
        if !run_command(console, args, line.trim()) {
            return;
        }
    }
}

/// Execute one command. Returns `false` to leave the shell.
fn run_command(console: &ConsoleSession, args: &[String], line: &str) -> bool {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "" => {}
        "help" => {
            console.write_text(HELP);
        }
        "args" => {
            for (i, arg) in args.iter().enumerate() {
                console.write_text(&format!("argv[{i}] = {arg:?}\n"));
            }
        }
        "echo" => {
            console.write_text(&format!("{rest}\n"));
        }
        "key" => {
            console.write_text("press a key...\n");
            match console.read_char(false) {
                Ok(c) => {
                    console.write_text(&format!("got {c:?}\n"));
                }
                Err(err) => return !err.is_shutdown(),
            }
        }
        "raw" => match console.read_console(256) {
            Ok(raw) => {
                console.write_text(&format!("raw: {raw:?}\n"));
            }
            Err(err) => return !err.is_shutdown(),
        },
        "seq" => {
            let count = rest.trim().parse::<usize>().unwrap_or(10);
            for i in 1..=count {
                console.write_text(&format!("{i}\n"));
            }
        }
        "exit" | "quit" => return false,
        _ => {
            console.write_text(&format!("{line}\n"));
        }
    }
    true
}
