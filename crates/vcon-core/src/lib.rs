#![forbid(unsafe_code)]

//! Core: console events, the character relay, the read buffer, history,
//! the readline queue and lifecycle signals.
//!
//! Everything in this crate is shared between the UI thread and program
//! threads, or is pure state owned by the UI thread. Nothing here touches
//! the terminal; see `vcon-runtime` for that.

pub mod argv;
pub mod error;
pub mod event;
pub mod history;
pub mod read_buffer;
pub mod readline;
pub mod relay;
pub mod signal;

pub use error::ConsoleError;
