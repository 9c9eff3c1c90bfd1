#![forbid(unsafe_code)]

//! Bounded ring of raw keystrokes awaiting a console read.
//!
//! Keystrokes are staged here until a reader drains a line. The buffer never
//! blocks the producer: when it is full the oldest character is evicted to
//! admit the newest.

use std::collections::VecDeque;

/// Default staging capacity, in characters.
pub const DEFAULT_CAPACITY: usize = 512;

/// Fixed-capacity character ring with oldest-first eviction.
#[derive(Debug, Clone)]
pub struct ReadBuffer {
    chars: VecDeque<char>,
    capacity: usize,
    evicted: u64,
}

impl ReadBuffer {
    /// Create an empty buffer holding at most `capacity` characters.
    ///
    /// A zero capacity is bumped to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            chars: VecDeque::with_capacity(capacity),
            capacity,
            evicted: 0,
        }
    }

    /// Append a character, evicting the oldest one if full.
    ///
    /// Returns the evicted character, if any.
    pub fn push(&mut self, c: char) -> Option<char> {
        let evicted = if self.chars.len() == self.capacity {
            self.evicted += 1;
            self.chars.pop_front()
        } else {
            None
        };
        self.chars.push_back(c);
        evicted
    }

    /// Number of staged characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// True when nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Maximum number of staged characters.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total characters evicted since creation.
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// True when a newline is staged.
    #[must_use]
    pub fn has_line(&self) -> bool {
        self.chars.contains(&'\n')
    }

    /// Remove and return up to `max` characters, stopping after the first
    /// newline.
    pub fn drain_line(&mut self, max: usize) -> String {
        let mut out = String::new();
        let mut taken = 0;
        while taken < max {
            let Some(c) = self.chars.pop_front() else {
                break;
            };
            out.push(c);
            taken += 1;
            if c == '\n' {
                break;
            }
        }
        out
    }

    /// Discard everything staged.
    pub fn clear(&mut self) {
        self.chars.clear();
    }

    /// Iterate over the staged characters, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }
}

impl Default for ReadBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
