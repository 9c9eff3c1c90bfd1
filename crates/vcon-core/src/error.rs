#![forbid(unsafe_code)]

//! Errors surfaced to program threads.

use std::fmt;
use std::io;

/// Error returned by console read primitives and the shell driver.
#[derive(Debug)]
pub enum ConsoleError {
    /// The console window was closed; the program should exit.
    Shutdown,
    /// The operation needs the interactive console, which is disabled.
    NotInteractive,
    /// The UI thread could not bring the console up.
    Startup(String),
    /// Terminal I/O failed.
    Io(io::Error),
}

impl ConsoleError {
    /// True for the shutdown result that programs translate into an exit.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Shutdown)
    }
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shutdown => write!(f, "console is shutting down"),
            Self::NotInteractive => write!(f, "interactive console is disabled"),
            Self::Startup(msg) => write!(f, "console failed to start: {msg}"),
            Self::Io(err) => write!(f, "console I/O error: {err}"),
        }
    }
}

impl std::error::Error for ConsoleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ConsoleError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
