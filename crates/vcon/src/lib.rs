#![forbid(unsafe_code)]

//! vcon public facade crate.
//!
//! Re-exports the console session API and the shell driver, and wires up
//! file logging. Most programs only need the [`prelude`]:
//!
//! ```no_run
//! use vcon::prelude::*;
//!
//! vcon::logging::init()?;
//! let mut shell = Shell::new(ConsoleConfig::from_env());
//! shell.run(|console, _args| {
//!     while let Ok(Some(line)) = console.read_line(">>> ") {
//!         console.write_text(&format!("you said: {line}\n"));
//!     }
//! })?;
//! # Ok::<(), vcon::Error>(())
//! ```

use std::fmt;

pub mod logging;

// --- Core re-exports -------------------------------------------------------

pub use vcon_core::ConsoleError;
pub use vcon_core::argv::{build_argv, split_command_line};
pub use vcon_core::event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, ScrollAction};
pub use vcon_core::history::{Direction, History};
pub use vcon_core::readline::PushError;

// --- Runtime re-exports ----------------------------------------------------

pub use vcon_runtime::{
    CellMetrics, ConsoleConfig, ConsoleEventSource, ConsoleSession, ConsoleWindow, Frame,
    HeadlessEventSource, HeadlessRenderer, Palette, Renderer, Shell, ShellState, StdStream,
    TerminalEventSource, TerminalRenderer,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for vcon programs.
#[derive(Debug)]
pub enum Error {
    /// The console failed or was closed.
    Console(ConsoleError),
    /// Logging could not be set up.
    Logging(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console(err) => write!(f, "{err}"),
            Self::Logging(msg) => write!(f, "logging: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Console(err) => Some(err),
            Self::Logging(_) => None,
        }
    }
}

impl From<ConsoleError> for Error {
    fn from(err: ConsoleError) -> Self {
        Self::Console(err)
    }
}

/// Standard result type for vcon APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ConsoleConfig, ConsoleError, ConsoleSession, Error, Result, Shell, ShellState, StdStream,
    };
}
