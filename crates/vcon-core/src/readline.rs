#![forbid(unsafe_code)]

//! FIFO exchange of completed input lines.
//!
//! The UI thread pushes a line each time Enter is pressed; reader threads
//! pop lines in arrival order. One mutex guards the queue and one condition
//! variable wakes readers. After [`ReadlineQueue::shutdown`] every pop,
//! blocked or not, returns [`Popped::Shutdown`] and pushes are refused.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default number of completed lines that may wait unread.
pub const DEFAULT_BACKLOG: usize = 1024;

/// Outcome of a pop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popped {
    /// The oldest queued line.
    Line(String),
    /// Nothing was queued in time.
    Empty,
    /// The console has shut down.
    Shutdown,
}

/// Why a push was refused. The queue is unchanged in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushError {
    /// The backlog bound was reached.
    Full {
        /// The configured backlog bound.
        capacity: usize,
    },
    /// The queue has shut down.
    Closed,
}

impl fmt::Display for PushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full { capacity } => {
                write!(f, "input backlog full ({capacity} lines), line dropped")
            }
            Self::Closed => write!(f, "input queue closed"),
        }
    }
}

impl std::error::Error for PushError {}

#[derive(Debug, Default)]
struct QueueState {
    lines: VecDeque<String>,
    shutdown: bool,
}

/// Blocking line queue shared by the UI thread and reader threads.
#[derive(Debug)]
pub struct ReadlineQueue {
    state: Mutex<QueueState>,
    readable: Condvar,
    backlog: usize,
}

impl ReadlineQueue {
    /// Create a queue holding up to `backlog` unread lines.
    #[must_use]
    pub fn new(backlog: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            readable: Condvar::new(),
            backlog: backlog.max(1),
        }
    }

    /// Append a completed line and wake one reader.
    ///
    /// # Errors
    ///
    /// [`PushError::Full`] when the backlog bound is reached,
    /// [`PushError::Closed`] after shutdown.
    pub fn push(&self, line: String) -> Result<(), PushError> {
        let mut state = self.lock();
        if state.shutdown {
            return Err(PushError::Closed);
        }
        if state.lines.len() >= self.backlog {
            return Err(PushError::Full {
                capacity: self.backlog,
            });
        }
        state.lines.push_back(line);
        self.readable.notify_one();
        Ok(())
    }

    /// Block until a line is queued or the queue shuts down.
    pub fn pop(&self) -> Popped {
        let mut state = self.lock();
        loop {
            if state.shutdown {
                return Popped::Shutdown;
            }
            if let Some(line) = state.lines.pop_front() {
                return Popped::Line(line);
            }
            state = self
                .readable
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// As [`pop`](Self::pop), giving up with [`Popped::Empty`] after
    /// `timeout`.
    pub fn pop_timeout(&self, timeout: Duration) -> Popped {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if state.shutdown {
                return Popped::Shutdown;
            }
            if let Some(line) = state.lines.pop_front() {
                return Popped::Line(line);
            }
            let now = Instant::now();
            if now >= deadline {
                return Popped::Empty;
            }
            let (guard, _) = self
                .readable
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }

    /// Non-blocking pop.
    pub fn try_pop(&self) -> Popped {
        self.pop_timeout(Duration::ZERO)
    }

    /// Refuse further pushes and wake every reader. Idempotent.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        if !state.shutdown {
            state.shutdown = true;
            tracing::debug!(pending = state.lines.len(), "readline queue shut down");
        }
        self.readable.notify_all();
    }

    /// True once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    /// Number of unread lines.
    pub fn len(&self) -> usize {
        self.lock().lines.len()
    }

    /// True when no line is waiting.
    pub fn is_empty(&self) -> bool {
        self.lock().lines.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ReadlineQueue {
    fn default() -> Self {
        Self::new(DEFAULT_BACKLOG)
    }
}
