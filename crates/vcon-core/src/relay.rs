#![forbid(unsafe_code)]

//! Single-slot character relay between the UI thread and blocking readers.
//!
//! The UI thread calls [`CharRelay::put_char`] for every keystroke. Program
//! threads block in [`CharRelay::get_char`] until a character arrives, or in
//! [`CharRelay::read_console`] until a whole line is staged in the
//! [`ReadBuffer`].
//!
//! The slot holds at most one unconsumed character; a second keystroke
//! before the reader wakes overwrites it. A separate unget slot lets a
//! reader push back one character, which the next `get_char` returns
//! without waiting.
//!
//! Committing a line with [`CharRelay::commit_line`] ends the keystrokes'
//! lifetime: unless a reader is waiting for them, the slot is emptied and
//! the staged line discarded, so a later read only sees new input.
//!
//! [`CharRelay::shutdown`] is terminal: every blocked and future read
//! returns [`ConsoleError::Shutdown`].

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::ConsoleError;
use crate::read_buffer::ReadBuffer;

/// End-of-input sentinel; it can never be pushed back.
pub const END_OF_INPUT: char = '\u{ffff}';

#[derive(Debug)]
struct RelayState {
    slot: Option<char>,
    unget: Option<char>,
    waiting: usize,
    echo: usize,
    console_waiting: usize,
    staged: ReadBuffer,
    shutdown: bool,
}

/// Blocking character mailbox shared by the UI thread and program threads.
#[derive(Debug)]
pub struct CharRelay {
    state: Mutex<RelayState>,
    available: Condvar,
}

impl CharRelay {
    /// Create a relay whose read buffer stages up to `capacity` characters.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(RelayState {
                slot: None,
                unget: None,
                waiting: 0,
                echo: 0,
                console_waiting: 0,
                staged: ReadBuffer::new(capacity),
                shutdown: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Publish a keystroke.
    ///
    /// Any unconsumed character in the slot is overwritten. The character is
    /// also staged for console reads.
    pub fn put_char(&self, c: char) {
        let mut state = self.lock();
        if let Some(lost) = state.slot.replace(c) {
            tracing::trace!(?lost, "relay slot overwritten");
        }
        if state.staged.push(c).is_some() {
            tracing::trace!(evicted = state.staged.evicted(), "read buffer full");
        }
        // Line readers and char readers share the condvar.
        self.available.notify_all();
    }

    /// Publish the `'\n'` that completes a line.
    ///
    /// A blocked `get_char` receives the newline and a blocked
    /// `read_console` receives the staged line. Whatever no reader was
    /// waiting for is dropped. Returns `true` when a console read will
    /// consume the line, in which case it must not be delivered elsewhere.
    pub fn commit_line(&self) -> bool {
        let mut state = self.lock();
        state.slot = Some('\n');
        state.staged.push('\n');
        let to_console = state.console_waiting > 0;
        if !to_console {
            state.staged.clear();
        }
        if state.waiting == 0 {
            state.slot = None;
        }
        self.available.notify_all();
        to_console
    }

    /// Block until a character is available and take it.
    ///
    /// A pending unget is returned first, without waiting. While blocked the
    /// relay reports [`is_waiting`](Self::is_waiting), and
    /// [`echo_requested`](Self::echo_requested) when `echo` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Shutdown`] once the relay has been shut down.
    pub fn get_char(&self, echo: bool) -> Result<char, ConsoleError> {
        let mut state = self.lock();
        if let Some(c) = state.unget.take() {
            return Ok(c);
        }
        if state.shutdown {
            return Err(ConsoleError::Shutdown);
        }

        state.waiting += 1;
        if echo {
            state.echo += 1;
        }
        while state.slot.is_none() && !state.shutdown {
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.waiting -= 1;
        if echo {
            state.echo -= 1;
        }

        if state.shutdown {
            return Err(ConsoleError::Shutdown);
        }
        state.unget = None;
        state.slot.take().ok_or(ConsoleError::Shutdown)
    }

    /// Push back one character for the next [`get_char`](Self::get_char).
    ///
    /// Fails when an unget is already pending or `c` is [`END_OF_INPUT`].
    pub fn unget_char(&self, c: char) -> bool {
        if c == END_OF_INPUT {
            return false;
        }
        let mut state = self.lock();
        if state.unget.is_some() {
            return false;
        }
        state.unget = Some(c);
        true
    }

    /// Narrow [`get_char`](Self::get_char): characters outside ASCII come
    /// back as `b'?'`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Shutdown`] once the relay has been shut down.
    pub fn get_byte(&self, echo: bool) -> Result<u8, ConsoleError> {
        self.get_char(echo).map(narrow)
    }

    /// Narrow [`unget_char`](Self::unget_char).
    pub fn unget_byte(&self, b: u8) -> bool {
        self.unget_char(char::from(b))
    }

    /// Block until a line (or `max` characters) is staged, then drain it.
    ///
    /// The returned text ends with `'\n'` when a full line was read. A zero
    /// `max` returns an empty string immediately. The pending slot is
    /// cleared so the same keystrokes are not delivered twice.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Shutdown`] once the relay has been shut down.
    pub fn read_console(&self, max: usize) -> Result<String, ConsoleError> {
        let mut state = self.lock();
        if state.shutdown {
            return Err(ConsoleError::Shutdown);
        }
        if max == 0 {
            return Ok(String::new());
        }
        let want = max.min(state.staged.capacity());
        state.console_waiting += 1;
        while !state.shutdown && !state.staged.has_line() && state.staged.len() < want {
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.console_waiting -= 1;
        if state.shutdown {
            return Err(ConsoleError::Shutdown);
        }
        let line = state.staged.drain_line(max);
        state.slot = None;
        Ok(line)
    }

    /// True while at least one reader is blocked in `get_char`.
    pub fn is_waiting(&self) -> bool {
        self.lock().waiting > 0
    }

    /// True while a blocked reader asked for its keystrokes to be echoed.
    pub fn echo_requested(&self) -> bool {
        self.lock().echo > 0
    }

    /// Number of characters staged for console reads.
    pub fn staged_len(&self) -> usize {
        self.lock().staged.len()
    }

    /// Wake every blocked reader with a shutdown result. Idempotent.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        if !state.shutdown {
            state.shutdown = true;
            tracing::debug!(waiting = state.waiting, "character relay shut down");
        }
        self.available.notify_all();
    }

    /// True once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    fn lock(&self) -> MutexGuard<'_, RelayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CharRelay {
    fn default() -> Self {
        Self::new(crate::read_buffer::DEFAULT_CAPACITY)
    }
}

fn narrow(c: char) -> u8 {
    u8::try_from(c).ok().filter(u8::is_ascii).unwrap_or(b'?')
}
