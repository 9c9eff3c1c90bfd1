#![forbid(unsafe_code)]

//! Where the console window gets its events from.
//!
//! [`ConsoleEventSource`] abstracts the terminal so the window controller
//! can be driven headlessly. [`TerminalEventSource`] reads a real terminal
//! through a [`TerminalSession`]; [`HeadlessEventSource`] replays events
//! sent over a channel.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use vcon_core::event::Event;

use crate::terminal_session::TerminalSession;

/// Source of console input events.
pub trait ConsoleEventSource {
    /// Current surface size (columns, rows).
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Wait up to `timeout` for an event. `Ok(true)` means
    /// [`read_event`](Self::read_event) will not block.
    fn poll_event(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Take the next event. `Ok(None)` for events the console ignores.
    fn read_event(&mut self) -> io::Result<Option<Event>>;
}

/// Terminal-backed event source.
#[derive(Debug)]
pub struct TerminalEventSource {
    session: TerminalSession,
    close_pending: bool,
}

impl TerminalEventSource {
    /// Wrap a terminal session.
    pub fn new(session: TerminalSession) -> Self {
        Self {
            session,
            close_pending: false,
        }
    }
}

impl ConsoleEventSource for TerminalEventSource {
    fn size(&self) -> io::Result<(u16, u16)> {
        self.session.size()
    }

    fn poll_event(&mut self, timeout: Duration) -> io::Result<bool> {
        if self.close_pending || self.session.take_close_request() {
            self.close_pending = true;
            return Ok(true);
        }
        self.session.poll_event(timeout)
    }

    fn read_event(&mut self) -> io::Result<Option<Event>> {
        if std::mem::take(&mut self.close_pending) {
            return Ok(Some(Event::Close));
        }
        self.session.read_event()
    }
}

/// Event source fed through a channel.
///
/// Dropping every [`Sender`] is treated as the window being closed: the
/// source yields one [`Event::Close`] and then stays idle.
#[derive(Debug)]
pub struct HeadlessEventSource {
    width: u16,
    height: u16,
    events: Receiver<Event>,
    pending: Option<Event>,
    disconnected: bool,
}

impl HeadlessEventSource {
    /// Create a source of the given size and the sender that feeds it.
    #[must_use]
    pub fn channel(width: u16, height: u16) -> (Self, Sender<Event>) {
        let (tx, rx) = mpsc::channel();
        let source = Self {
            width,
            height,
            events: rx,
            pending: None,
            disconnected: false,
        };
        (source, tx)
    }
}

impl ConsoleEventSource for HeadlessEventSource {
    fn size(&self) -> io::Result<(u16, u16)> {
        Ok((self.width, self.height))
    }

    fn poll_event(&mut self, timeout: Duration) -> io::Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        if self.disconnected {
            thread::sleep(timeout);
            return Ok(false);
        }
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                self.pending = Some(event);
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => {
                self.disconnected = true;
                self.pending = Some(Event::Close);
                Ok(true)
            }
        }
    }

    fn read_event(&mut self) -> io::Result<Option<Event>> {
        if let Some(Event::Resize { width, height }) = &self.pending {
            self.width = *width;
            self.height = *height;
        }
        Ok(self.pending.take())
    }
}
