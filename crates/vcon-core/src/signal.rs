#![forbid(unsafe_code)]

//! Binary lifecycle signals.
//!
//! A [`Signal`] is a manual-reset event: once [`set`](Signal::set) it stays
//! set until [`reset`](Signal::reset), and every waiter is released. The
//! console uses three of them, bundled in [`LifecycleSignals`], to hand the
//! shutdown sequence back and forth between the UI thread and the program
//! thread.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Manual-reset binary event backed by a mutex and condition variable.
#[derive(Debug, Default)]
pub struct Signal {
    state: Mutex<bool>,
    cond: Condvar,
}

impl Signal {
    /// Create an unset signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal and release all waiters.
    pub fn set(&self) {
        let mut state = self.lock();
        *state = true;
        self.cond.notify_all();
    }

    /// Clear the signal.
    pub fn reset(&self) {
        *self.lock() = false;
    }

    /// Check the signal without blocking.
    pub fn is_set(&self) -> bool {
        *self.lock()
    }

    /// Block until the signal is set.
    pub fn wait(&self) {
        let mut state = self.lock();
        while !*state {
            state = self.cond.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the signal is set or `timeout` elapses.
    ///
    /// Returns `true` if the signal was set, `false` on timeout. Spurious
    /// wakeups are absorbed by re-checking against a deadline.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        while !*state {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .cond
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The signals exchanged during shutdown.
///
/// - `closed`: set by the UI thread when the window has been closed.
/// - `finalize_requested`: set by the program side once it is done with the
///   console (normal program exit, or acknowledgment of a close).
/// - `finalize_done`: set by the UI thread after it has observed
///   `finalize_requested` and left its event loop.
#[derive(Debug, Default)]
pub struct LifecycleSignals {
    /// The console window was closed.
    pub closed: Signal,
    /// The program side asked the UI thread to finish.
    pub finalize_requested: Signal,
    /// The UI thread acknowledged finalization.
    pub finalize_done: Signal,
}

impl LifecycleSignals {
    /// Create a fresh, all-unset set of signals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
