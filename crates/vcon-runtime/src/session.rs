#![forbid(unsafe_code)]

//! The console as seen from program threads.
//!
//! A [`ConsoleSession`] is the shared context between the UI thread and the
//! program: it owns the character relay, the readline queue and the
//! lifecycle signals, and forwards output to the UI thread over a channel.
//! The shell driver creates one per run and hands an `Arc` of it to both
//! sides; there is no process-wide console state.
//!
//! Every blocking read returns [`ConsoleError::Shutdown`] once the window
//! has been closed.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use vcon_core::ConsoleError;
use vcon_core::readline::{Popped, ReadlineQueue};
use vcon_core::relay::CharRelay;
use vcon_core::signal::LifecycleSignals;

use crate::config::ConsoleConfig;
use crate::window::UiRequest;

/// Standard stream identifiers for [`ConsoleSession::fileno`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    /// Standard input.
    Stdin,
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// Shared console context.
#[derive(Debug)]
pub struct ConsoleSession {
    interactive: bool,
    relay: CharRelay,
    queue: ReadlineQueue,
    signals: LifecycleSignals,
    exited: AtomicBool,
    input_pending: AtomicBool,
    requests: Sender<UiRequest>,
}

impl ConsoleSession {
    /// Create a session and the receiving end of its UI request channel.
    pub fn new(config: &ConsoleConfig) -> (Arc<Self>, Receiver<UiRequest>) {
        let (tx, rx) = mpsc::channel();
        let session = Arc::new(Self {
            interactive: config.interactive,
            relay: CharRelay::new(config.read_buffer_capacity),
            queue: ReadlineQueue::new(config.readline_backlog),
            signals: LifecycleSignals::new(),
            exited: AtomicBool::new(false),
            input_pending: AtomicBool::new(false),
            requests: tx,
        });
        (session, rx)
    }

    // --- Reads ---

    /// Show `prompt` and wait for the user to enter a line.
    ///
    /// The prompt, the line and a newline are echoed to the log. Returns
    /// `Ok(None)` when the console is not interactive.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::Shutdown`] once the window has been closed.
    pub fn read_line(&self, prompt: &str) -> Result<Option<String>, ConsoleError> {
        if !self.interactive {
            return Ok(None);
        }
        if self.is_exited() {
            return Err(ConsoleError::Shutdown);
        }
        self.send(UiRequest::SetPrompt(prompt.to_owned()));
        match self.queue.pop() {
            Popped::Line(line) => {
                self.send(UiRequest::Write(format!("{prompt}{line}\n")));
                Ok(Some(line))
            }
            Popped::Empty => Ok(None),
            Popped::Shutdown => Err(ConsoleError::Shutdown),
        }
    }

    /// As [`read_line`](Self::read_line), giving up with `Ok(None)` after
    /// `timeout`.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::Shutdown`] once the window has been closed.
    pub fn read_line_timeout(
        &self,
        prompt: &str,
        timeout: Duration,
    ) -> Result<Option<String>, ConsoleError> {
        if !self.interactive {
            return Ok(None);
        }
        if self.is_exited() {
            return Err(ConsoleError::Shutdown);
        }
        self.send(UiRequest::SetPrompt(prompt.to_owned()));
        match self.queue.pop_timeout(timeout) {
            Popped::Line(line) => {
                self.send(UiRequest::Write(format!("{prompt}{line}\n")));
                Ok(Some(line))
            }
            Popped::Empty => Ok(None),
            Popped::Shutdown => Err(ConsoleError::Shutdown),
        }
    }

    /// Wait for one keystroke. With `echo`, the keystroke is also shown on
    /// the command line.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::NotInteractive`] without a window,
    /// [`ConsoleError::Shutdown`] once it has been closed.
    pub fn read_char(&self, echo: bool) -> Result<char, ConsoleError> {
        self.require_interactive()?;
        self.relay.get_char(echo)
    }

    /// Narrow [`read_char`](Self::read_char); non-ASCII reads as `b'?'`.
    ///
    /// # Errors
    ///
    /// As [`read_char`](Self::read_char).
    pub fn read_byte(&self, echo: bool) -> Result<u8, ConsoleError> {
        self.require_interactive()?;
        self.relay.get_byte(echo)
    }

    /// Push back one character for the next `read_char`.
    pub fn unread_char(&self, c: char) -> bool {
        self.relay.unget_char(c)
    }

    /// Push back one byte for the next `read_byte`.
    pub fn unread_byte(&self, b: u8) -> bool {
        self.relay.unget_byte(b)
    }

    /// Wait for a line of raw keystrokes, returning at most `max` characters
    /// including the trailing newline.
    ///
    /// # Errors
    ///
    /// As [`read_char`](Self::read_char).
    pub fn read_console(&self, max: usize) -> Result<String, ConsoleError> {
        self.require_interactive()?;
        if self.is_exited() {
            return Err(ConsoleError::Shutdown);
        }
        self.relay.read_console(max)
    }

    /// True while key events are arriving.
    pub fn is_input_pending(&self) -> bool {
        self.input_pending.load(Ordering::Acquire)
    }

    // --- Writes ---

    /// Append `text` to the console, up to its first NUL.
    ///
    /// Returns the number of characters accepted. Without a window the text
    /// goes to the process stdout.
    pub fn write_text(&self, text: &str) -> usize {
        let end = text.find('\0').unwrap_or(text.len());
        let text = &text[..end];
        let count = text.chars().count();
        if !self.interactive {
            let mut out = io::stdout().lock();
            if out.write_all(text.as_bytes()).and_then(|()| out.flush()).is_err() {
                return 0;
            }
            return count;
        }
        if text.is_empty() {
            return 0;
        }
        if self.requests.send(UiRequest::Write(text.to_owned())).is_err() {
            tracing::debug!("console gone, dropping output");
            return 0;
        }
        count
    }

    /// Append one character to the console.
    pub fn write_char(&self, c: char) -> bool {
        let mut buf = [0u8; 4];
        self.write_text(c.encode_utf8(&mut buf)) == 1
    }

    /// Set the prompt shown before the command line.
    pub fn set_prompt(&self, prompt: &str) {
        self.send(UiRequest::SetPrompt(prompt.to_owned()));
    }

    /// Show a one-row notice until the next key press.
    pub fn notify(&self, message: impl Into<String>) {
        self.send(UiRequest::Notice(message.into()));
    }

    // --- Stream emulation ---

    /// Descriptor of a standard stream, or `None` without a window.
    pub fn fileno(&self, stream: StdStream) -> Option<i32> {
        if !self.interactive {
            return None;
        }
        Some(match stream {
            StdStream::Stdin => 0,
            StdStream::Stdout => 1,
            StdStream::Stderr => 2,
        })
    }

    /// True for the standard descriptors while the window is shown.
    pub fn isatty(&self, fd: i32) -> bool {
        self.interactive && (0..=2).contains(&fd)
    }

    // --- Lifecycle ---

    /// True when the console window is enabled.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// True once the console has been closed or shut down.
    pub fn is_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    /// Close the console from the program side and ask the UI thread to
    /// finish.
    pub fn request_shutdown(&self) {
        self.mark_exited();
        self.signals.finalize_requested.set();
    }

    /// Wait up to `timeout` for the UI thread to acknowledge shutdown.
    pub fn await_shutdown_complete(&self, timeout: Duration) -> bool {
        self.signals.finalize_done.wait_timeout(timeout)
    }

    /// The lifecycle signals.
    pub fn signals(&self) -> &LifecycleSignals {
        &self.signals
    }

    /// Mark the console exited and wake every blocked reader.
    pub(crate) fn mark_exited(&self) {
        if !self.exited.swap(true, Ordering::AcqRel) {
            tracing::debug!("console marked exited");
        }
        self.queue.shutdown();
        self.relay.shutdown();
    }

    pub(crate) fn relay(&self) -> &CharRelay {
        &self.relay
    }

    pub(crate) fn queue(&self) -> &ReadlineQueue {
        &self.queue
    }

    pub(crate) fn set_input_pending(&self, pending: bool) {
        self.input_pending.store(pending, Ordering::Release);
    }

    fn require_interactive(&self) -> Result<(), ConsoleError> {
        if self.interactive {
            Ok(())
        } else {
            Err(ConsoleError::NotInteractive)
        }
    }

    fn send(&self, request: UiRequest) {
        if self.requests.send(request).is_err() {
            tracing::debug!("console gone, dropping request");
        }
    }
}
