#![forbid(unsafe_code)]

//! Single-line command editor.
//!
//! Grapheme-aware: the cursor is a grapheme index, so combining marks and
//! wide characters move and delete as one unit. Display width uses
//! `unicode-width`.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use vcon_core::event::{KeyCode, KeyEvent};

/// The editable command line.
#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    value: String,
    /// Cursor position (grapheme index).
    cursor: usize,
    /// Maximum length in graphemes (None = unlimited).
    max_length: Option<usize>,
}

impl CommandLine {
    /// Create an empty command line.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum length in graphemes (builder).
    #[must_use]
    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Current text.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the text and put the cursor at the end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        if let Some(max) = self.max_length {
            let end = self.grapheme_byte_offset(max);
            self.value.truncate(end);
        }
        self.cursor = self.grapheme_count();
    }

    /// Clear all text.
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Cursor position (grapheme index).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// True when there is no text.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Apply a local editing key. Returns `true` if the line changed or the
    /// cursor moved.
    ///
    /// Only cursor motion and deletion are handled here; printable input and
    /// Backspace go through [`insert_char`](Self::insert_char) and
    /// [`delete_back`](Self::delete_back) so the caller can apply its echo
    /// policy.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Delete => self.delete_forward(),
            KeyCode::Left if key.ctrl() => self.move_word_left(),
            KeyCode::Right if key.ctrl() => self.move_word_right(),
            KeyCode::Left => {
                if self.cursor == 0 {
                    return false;
                }
                self.cursor -= 1;
                true
            }
            KeyCode::Right => {
                if self.cursor >= self.grapheme_count() {
                    return false;
                }
                self.cursor += 1;
                true
            }
            KeyCode::Home => {
                self.cursor = 0;
                true
            }
            KeyCode::End => {
                self.cursor = self.grapheme_count();
                true
            }
            _ => false,
        }
    }

    // --- Editing operations ---

    /// Insert `c` at the cursor. Returns `false` at the length limit.
    pub fn insert_char(&mut self, c: char) -> bool {
        if let Some(max) = self.max_length
            && self.grapheme_count() >= max
        {
            return false;
        }
        let before = self.grapheme_count();
        let byte_offset = self.grapheme_byte_offset(self.cursor);
        self.value.insert(byte_offset, c);
        // A combining mark joins the previous grapheme instead of adding one.
        if self.grapheme_count() > before {
            self.cursor += 1;
        }
        true
    }

    /// Delete the grapheme before the cursor.
    pub fn delete_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let start = self.grapheme_byte_offset(self.cursor - 1);
        let end = self.grapheme_byte_offset(self.cursor);
        self.value.drain(start..end);
        self.cursor -= 1;
        true
    }

    fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.grapheme_count() {
            return false;
        }
        let start = self.grapheme_byte_offset(self.cursor);
        let end = self.grapheme_byte_offset(self.cursor + 1);
        self.value.drain(start..end);
        true
    }

    fn move_word_left(&mut self) -> bool {
        let graphemes: Vec<&str> = self.value.graphemes(true).collect();
        let mut pos = self.cursor;
        while pos > 0 && is_space(graphemes[pos - 1]) {
            pos -= 1;
        }
        while pos > 0 && !is_space(graphemes[pos - 1]) {
            pos -= 1;
        }
        let moved = pos != self.cursor;
        self.cursor = pos;
        moved
    }

    fn move_word_right(&mut self) -> bool {
        let graphemes: Vec<&str> = self.value.graphemes(true).collect();
        let max = graphemes.len();
        let mut pos = self.cursor;
        while pos < max && !is_space(graphemes[pos]) {
            pos += 1;
        }
        while pos < max && is_space(graphemes[pos]) {
            pos += 1;
        }
        let moved = pos != self.cursor;
        self.cursor = pos;
        moved
    }

    // --- Display ---

    /// Display width of the text before the cursor.
    pub fn cursor_column(&self) -> usize {
        self.value
            .graphemes(true)
            .take(self.cursor)
            .map(UnicodeWidthStr::width)
            .sum()
    }

    /// The slice of text visible in a field `width` columns wide, scrolled
    /// so the cursor stays inside it, and the cursor column within it.
    pub fn visible(&self, width: usize) -> (String, usize) {
        if width == 0 {
            return (String::new(), 0);
        }
        let cursor = self.cursor_column();
        let scroll = (cursor + 1).saturating_sub(width);

        let mut out = String::new();
        let mut column = 0;
        for g in self.value.graphemes(true) {
            let w = g.width();
            if column >= scroll && column + w <= scroll + width {
                out.push_str(g);
            }
            column += w;
            if column >= scroll + width {
                break;
            }
        }
        (out, cursor - scroll)
    }

    // --- Internal helpers ---

    fn grapheme_count(&self) -> usize {
        self.value.graphemes(true).count()
    }

    fn grapheme_byte_offset(&self, grapheme_idx: usize) -> usize {
        self.value
            .grapheme_indices(true)
            .nth(grapheme_idx)
            .map_or(self.value.len(), |(i, _)| i)
    }
}

fn is_space(g: &str) -> bool {
    g.chars().all(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcon_core::event::Modifiers;

    fn typed(text: &str) -> CommandLine {
        let mut line = CommandLine::new();
        for c in text.chars() {
            line.insert_char(c);
        }
        line
    }

    #[test]
    fn insert_and_backspace() {
        let mut line = typed("abc");
        assert_eq!(line.value(), "abc");
        assert_eq!(line.cursor(), 3);
        assert!(line.delete_back());
        assert_eq!(line.value(), "ab");
    }

    #[test]
    fn backspace_at_start_is_noop() {
        let mut line = CommandLine::new();
        assert!(!line.delete_back());
    }

    #[test]
    fn insert_in_middle() {
        let mut line = typed("ac");
        line.handle_key(&KeyEvent::new(KeyCode::Left));
        line.insert_char('b');
        assert_eq!(line.value(), "abc");
        assert_eq!(line.cursor(), 2);
    }

    #[test]
    fn delete_forward_and_home_end() {
        let mut line = typed("xyz");
        line.handle_key(&KeyEvent::new(KeyCode::Home));
        assert_eq!(line.cursor(), 0);
        line.handle_key(&KeyEvent::new(KeyCode::Delete));
        assert_eq!(line.value(), "yz");
        line.handle_key(&KeyEvent::new(KeyCode::End));
        assert_eq!(line.cursor(), 2);
    }

    #[test]
    fn combining_mark_stays_in_one_grapheme() {
        let mut line = typed("e\u{301}");
        assert_eq!(line.cursor(), 1);
        assert!(line.delete_back());
        assert!(line.is_empty());
    }

    #[test]
    fn max_length_is_enforced() {
        let mut line = CommandLine::new().with_max_length(2);
        assert!(line.insert_char('a'));
        assert!(line.insert_char('b'));
        assert!(!line.insert_char('c'));
        line.set_value("longer");
        assert_eq!(line.value(), "lo");
    }

    #[test]
    fn word_motion() {
        let mut line = typed("print hello");
        let ctrl_left = KeyEvent::new(KeyCode::Left).with_modifiers(Modifiers::CTRL);
        line.handle_key(&ctrl_left);
        assert_eq!(line.cursor(), 6);
        line.handle_key(&ctrl_left);
        assert_eq!(line.cursor(), 0);
        let ctrl_right = KeyEvent::new(KeyCode::Right).with_modifiers(Modifiers::CTRL);
        line.handle_key(&ctrl_right);
        assert_eq!(line.cursor(), 6);
    }

    #[test]
    fn visible_scrolls_to_cursor() {
        let line = typed("abcdefgh");
        let (text, col) = line.visible(4);
        assert_eq!(text, "fgh");
        assert_eq!(col, 3);
        let (text, col) = typed("ab").visible(4);
        assert_eq!(text, "ab");
        assert_eq!(col, 2);
    }

    #[test]
    fn wide_characters_count_two_columns() {
        let line = typed("日本");
        assert_eq!(line.cursor_column(), 4);
    }
}
