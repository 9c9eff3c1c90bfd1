#![forbid(unsafe_code)]

//! Runtime: the console window and the shell driver.
//!
//! # Role in vcon
//! `vcon-runtime` owns the terminal. It turns terminal events into
//! keystrokes for the shared [`ConsoleSession`], keeps the scrollback log,
//! command line and history, renders frames and runs the
//! startup/shutdown handshake with the program.
//!
//! # How it fits
//! - `vcon-core` provides the thread-shared primitives.
//! - [`window::ConsoleWindow`] is driven by one UI thread.
//! - [`shell::Shell`] spawns that thread and runs the program.
//!
//! Both the event source and the renderer are traits, so the whole window
//! runs headlessly in tests.

pub mod cmdline;
pub mod config;
pub mod event_source;
pub mod layout;
pub mod render;
pub mod session;
pub mod shell;
pub mod shell_log;
pub mod terminal_session;
pub mod window;

pub use config::{CellMetrics, ConsoleConfig, Palette};
pub use event_source::{ConsoleEventSource, HeadlessEventSource, TerminalEventSource};
pub use render::{Frame, HeadlessRenderer, Renderer, TerminalRenderer};
pub use session::{ConsoleSession, StdStream};
pub use shell::{Shell, ShellState};
pub use window::{ConsoleWindow, UiRequest};
