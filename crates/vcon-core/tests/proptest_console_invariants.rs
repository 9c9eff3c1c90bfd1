//! Property-based invariant tests for the shared console primitives.
//!
//! 1. The readline queue pops lines in push order.
//! 2. History cursor stays within `[0, len - 1]` under any navigation.
//! 3. History never exceeds its capacity and keeps the newest lines.
//! 4. The read buffer never exceeds capacity and keeps the newest characters.
//! 5. Command line splitting never produces arguments containing unquoted
//!    whitespace.

use proptest::prelude::*;
use vcon_core::argv::split_command_line;
use vcon_core::history::{Direction, History};
use vcon_core::read_buffer::ReadBuffer;
use vcon_core::readline::{Popped, ReadlineQueue};

// ── Helpers ─────────────────────────────────────────────────────────────

fn line_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9 ]{0,12}"
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Up), Just(Direction::Down)]
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Readline FIFO
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn readline_is_fifo(lines in prop::collection::vec(line_strategy(), 0..32)) {
        let queue = ReadlineQueue::new(64);
        for line in &lines {
            queue.push(line.clone()).unwrap();
        }
        for line in &lines {
            prop_assert_eq!(queue.try_pop(), Popped::Line(line.clone()));
        }
        prop_assert_eq!(queue.try_pop(), Popped::Empty);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. History cursor bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn history_cursor_in_bounds(
        lines in prop::collection::vec(line_strategy(), 0..10),
        moves in prop::collection::vec(direction_strategy(), 0..40),
    ) {
        let mut history = History::new(16, 32);
        for line in &lines {
            history.record_line(line);
        }
        let mut current = String::new();
        for direction in moves {
            let before = history.index();
            match history.navigate(direction, &current) {
                Some(text) => {
                    current = text.to_owned();
                    prop_assert_ne!(history.index(), before);
                }
                None => prop_assert_eq!(history.index(), before),
            }
            prop_assert!(history.index() < history.len());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. History capacity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn history_keeps_newest(
        capacity in 1usize..8,
        lines in prop::collection::vec(line_strategy(), 0..24),
    ) {
        let mut history = History::new(capacity, 32);
        for line in &lines {
            history.record_line(line);
        }
        prop_assert!(history.committed() <= capacity);
        let kept: Vec<&str> = history.iter().collect();
        let start = lines.len().saturating_sub(capacity);
        let expected: Vec<&str> = lines[start..].iter().map(String::as_str).collect();
        prop_assert_eq!(kept, expected);
        prop_assert_eq!(history.index(), history.len() - 1);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Read buffer eviction
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn read_buffer_keeps_newest(
        capacity in 1usize..32,
        input in "[ -~]{0,80}",
    ) {
        let mut buf = ReadBuffer::new(capacity);
        for c in input.chars() {
            buf.push(c);
            prop_assert!(buf.len() <= capacity);
        }
        let chars: Vec<char> = input.chars().collect();
        let start = chars.len().saturating_sub(capacity);
        let expected: String = chars[start..].iter().collect();
        prop_assert_eq!(buf.iter().collect::<String>(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Command line splitting
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn unquoted_words_split_on_whitespace(words in prop::collection::vec("[a-zA-Z0-9_.-]{1,8}", 0..8)) {
        let line = words.join(" \t ");
        prop_assert_eq!(split_command_line(&line), words);
    }

    #[test]
    fn quoted_words_survive(words in prop::collection::vec("[a-z ]{0,8}", 0..6)) {
        let line = words
            .iter()
            .map(|w| format!("\"{w}\""))
            .collect::<Vec<_>>()
            .join(" ");
        prop_assert_eq!(split_command_line(&line), words);
    }
}
