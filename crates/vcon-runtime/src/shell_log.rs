#![forbid(unsafe_code)]

//! Scrollback log of everything written to the console.
//!
//! Text is stored as logical lines; the last one is the open line that
//! subsequent writes extend. The log keeps at most `max_lines` complete
//! lines and evicts the oldest beyond that.
//!
//! Each line's wrapped row count at the current width is cached. A write
//! only touches the counts of the lines it closes, extends or evicts; the
//! whole cache is rebuilt only by [`ShellLog::set_width`]. Rows themselves
//! are produced on demand for a window of the log, at grapheme boundaries.

use std::collections::VecDeque;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Bounded, append-only console log.
#[derive(Debug, Clone)]
pub struct ShellLog {
    /// Logical lines; never empty. The back entry is the open line.
    lines: VecDeque<String>,
    /// Wrapped row count of each entry of `lines` at `width`.
    row_counts: VecDeque<usize>,
    total_rows: usize,
    /// Wrap width in columns; 0 disables wrapping.
    width: usize,
    max_lines: usize,
    evicted: u64,
}

impl ShellLog {
    /// Create an empty log keeping up to `max_lines` complete lines.
    ///
    /// Lines are not wrapped until [`ShellLog::set_width`] is called.
    #[must_use]
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::from([String::new()]),
            row_counts: VecDeque::from([0]),
            total_rows: 0,
            width: 0,
            max_lines: max_lines.max(1),
            evicted: 0,
        }
    }

    /// Append `text` up to its first NUL.
    ///
    /// Returns the number of characters accepted. `'\n'` closes the open
    /// line; `'\r'` is accepted but not stored.
    pub fn write(&mut self, text: &str) -> usize {
        let mut accepted = 0;
        for c in text.chars() {
            match c {
                '\0' => break,
                '\n' => self.close_open_line(),
                '\r' => {}
                c => {
                    if let Some(open) = self.lines.back_mut() {
                        open.push(c);
                    }
                }
            }
            accepted += 1;
        }
        self.refresh_open_line();
        self.trim_front();
        accepted
    }

    /// Rewrap at `width` columns. Returns `false` if the width is unchanged.
    pub fn set_width(&mut self, width: usize) -> bool {
        if width == self.width {
            return false;
        }
        self.width = width;
        let open = self.lines.len() - 1;
        self.row_counts = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| rows_of(line, width, i == open))
            .collect();
        self.total_rows = self.row_counts.iter().sum();
        true
    }

    /// Number of complete (newline-terminated) lines held.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len() - 1
    }

    /// Lines evicted since creation.
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Rows occupied at the current width. An empty open line takes none.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.total_rows
    }

    /// Up to `count` wrapped rows starting at row `start`.
    ///
    /// Only the lines intersecting the window are wrapped.
    #[must_use]
    pub fn rows_in(&self, start: usize, count: usize) -> Vec<String> {
        let mut out = Vec::with_capacity(count.min(self.total_rows.saturating_sub(start)));
        if count == 0 {
            return out;
        }
        let mut first = 0;
        for (line, &rows) in self.lines.iter().zip(&self.row_counts) {
            if rows == 0 {
                continue;
            }
            if first + rows <= start {
                first += rows;
                continue;
            }
            let mut wrapped = Vec::with_capacity(rows);
            wrap_into(line, self.width, &mut wrapped);
            for row in wrapped.into_iter().skip(start.saturating_sub(first)) {
                if out.len() == count {
                    return out;
                }
                out.push(row);
            }
            first += rows;
            if out.len() == count {
                break;
            }
        }
        out
    }

    fn open_line(&self) -> &str {
        self.lines.back().map_or("", String::as_str)
    }

    fn set_count(&mut self, index: usize, rows: usize) {
        if let Some(slot) = self.row_counts.get_mut(index) {
            self.total_rows = self.total_rows - *slot + rows;
            *slot = rows;
        }
    }

    fn close_open_line(&mut self) {
        let last = self.lines.len() - 1;
        let rows = rows_of(self.open_line(), self.width, false);
        self.set_count(last, rows);
        self.lines.push_back(String::new());
        self.row_counts.push_back(0);
    }

    fn refresh_open_line(&mut self) {
        let last = self.lines.len() - 1;
        let rows = rows_of(self.open_line(), self.width, true);
        self.set_count(last, rows);
    }

    fn trim_front(&mut self) {
        while self.line_count() > self.max_lines {
            self.lines.pop_front();
            if let Some(rows) = self.row_counts.pop_front() {
                self.total_rows -= rows;
            }
            self.evicted += 1;
        }
    }
}

fn rows_of(line: &str, width: usize, open: bool) -> usize {
    if open && line.is_empty() {
        0
    } else {
        wrapped_len(line, width)
    }
}

fn wrapped_len(line: &str, width: usize) -> usize {
    if width == 0 {
        return 1;
    }
    let mut rows = 1;
    let mut current = 0;
    for g in line.graphemes(true) {
        let w = g.width();
        if current + w > width && current > 0 {
            rows += 1;
            current = 0;
        }
        current += w;
    }
    rows
}

fn wrap_into(line: &str, width: usize, rows: &mut Vec<String>) {
    if width == 0 {
        rows.push(line.to_owned());
        return;
    }
    let mut current_line = String::new();
    let mut current_width = 0;
    for g in line.graphemes(true) {
        let w = g.width();
        if current_width + w > width && !current_line.is_empty() {
            rows.push(std::mem::take(&mut current_line));
            current_width = 0;
        }
        current_line.push_str(g);
        current_width += w;
    }
    rows.push(current_line);
}
