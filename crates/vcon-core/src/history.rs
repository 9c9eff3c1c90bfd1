#![forbid(unsafe_code)]

//! Command history with an in-progress scratch entry.
//!
//! The store always holds at least one entry. The last entry is scratch
//! space for the line currently being edited; committed lines sit before
//! it, oldest first. The cursor `index` stays within `[0, len - 1]`.
//!
//! Navigating up from the scratch entry saves the edit in progress, so
//! coming back down restores it.

use unicode_segmentation::UnicodeSegmentation;

/// Default number of committed lines kept.
pub const DEFAULT_CAPACITY: usize = 256;

/// Default maximum stored line length, in graphemes.
pub const DEFAULT_MAX_LINE_LEN: usize = 256;

/// History navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards older entries.
    Up,
    /// Towards newer entries.
    Down,
}

/// What [`History::record_line`] did to make room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The line was appended.
    Appended,
    /// The line was appended after evicting the oldest entry.
    EvictedOldest,
}

/// Bounded command history.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<String>,
    index: usize,
    capacity: usize,
    max_line_len: usize,
}

impl History {
    /// Create a history keeping up to `capacity` committed lines, each
    /// truncated to `max_line_len` graphemes.
    #[must_use]
    pub fn new(capacity: usize, max_line_len: usize) -> Self {
        Self {
            entries: vec![String::new()],
            index: 0,
            capacity: capacity.max(1),
            max_line_len,
        }
    }

    /// Commit `text` and open a fresh scratch entry.
    pub fn record_line(&mut self, text: &str) -> RecordOutcome {
        let text = truncate_graphemes(text, self.max_line_len);
        let last = self.entries.len() - 1;
        self.entries[last] = text;

        let mut outcome = RecordOutcome::Appended;
        if self.committed() >= self.capacity || self.entries.try_reserve(1).is_err() {
            self.entries.remove(0);
            outcome = RecordOutcome::EvictedOldest;
            tracing::debug!(capacity = self.capacity, "history full, evicted oldest");
        }
        self.entries.push(String::new());
        self.index = self.entries.len() - 1;
        outcome
    }

    /// Move the cursor one entry and return the entry it lands on.
    ///
    /// `current` is the text being edited; it is saved into the scratch
    /// entry when moving up from it. Returns `None`, leaving the cursor
    /// where it was, at either end.
    pub fn navigate(&mut self, direction: Direction, current: &str) -> Option<&str> {
        let target = match direction {
            Direction::Up => self.index.checked_sub(1)?,
            Direction::Down => {
                let next = self.index + 1;
                if next >= self.entries.len() {
                    return None;
                }
                next
            }
        };
        let scratch = self.entries.len() - 1;
        if direction == Direction::Up && self.index == scratch {
            self.entries[scratch] = truncate_graphemes(current, self.max_line_len);
        }
        self.index = target;
        Some(&self.entries[target])
    }

    /// Total entries, including the scratch entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no line has been committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.committed() == 0
    }

    /// Number of committed lines.
    #[must_use]
    pub fn committed(&self) -> usize {
        self.entries.len() - 1
    }

    /// Cursor position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Committed line at `i`, oldest first.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&str> {
        if i < self.committed() {
            Some(&self.entries[i])
        } else {
            None
        }
    }

    /// Committed lines, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries[..self.committed()].iter().map(String::as_str)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_MAX_LINE_LEN)
    }
}

fn truncate_graphemes(text: &str, max: usize) -> String {
    match text.grapheme_indices(true).nth(max) {
        Some((byte, _)) => text[..byte].to_owned(),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_scratch_only() {
        let history = History::default();
        assert_eq!(history.len(), 1);
        assert_eq!(history.index(), 0);
        assert!(history.is_empty());
    }

    #[test]
    fn record_moves_cursor_to_scratch() {
        let mut history = History::default();
        assert_eq!(history.record_line("abc"), RecordOutcome::Appended);
        assert_eq!(history.len(), 2);
        assert_eq!(history.index(), 1);
        assert_eq!(history.get(0), Some("abc"));
    }

    #[test]
    fn up_returns_last_committed() {
        let mut history = History::default();
        history.record_line("abc");
        assert_eq!(history.navigate(Direction::Up, ""), Some("abc"));
        assert_eq!(history.navigate(Direction::Up, "abc"), None);
        assert_eq!(history.index(), 0);
    }

    #[test]
    fn down_restores_edit_in_progress() {
        let mut history = History::default();
        history.record_line("one");
        history.record_line("two");
        assert_eq!(history.navigate(Direction::Up, "draft"), Some("two"));
        assert_eq!(history.navigate(Direction::Up, "two"), Some("one"));
        assert_eq!(history.navigate(Direction::Down, "one"), Some("two"));
        assert_eq!(history.navigate(Direction::Down, "two"), Some("draft"));
        assert_eq!(history.navigate(Direction::Down, "draft"), None);
    }

    #[test]
    fn down_at_scratch_is_noop() {
        let mut history = History::default();
        assert_eq!(history.navigate(Direction::Down, "x"), None);
        assert_eq!(history.index(), 0);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut history = History::new(2, 16);
        history.record_line("a");
        history.record_line("b");
        assert_eq!(history.record_line("c"), RecordOutcome::EvictedOldest);
        assert_eq!(history.iter().collect::<Vec<_>>(), ["b", "c"]);
        assert_eq!(history.index(), 2);
    }

    #[test]
    fn long_lines_are_truncated_on_grapheme_boundary() {
        let mut history = History::new(8, 3);
        history.record_line("he\u{301}llo");
        assert_eq!(history.get(0), Some("he\u{301}l"));
    }
}
