#![forbid(unsafe_code)]

//! Geometry of the console surface.
//!
//! The surface is a vertical canvas: the wrapped scrollback log on top,
//! then a single row with the prompt followed by the command line. The
//! viewport shows `visible_rows` rows of that canvas starting at the
//! scroll offset.
//!
//! # Invariants
//!
//! - `scroll` stays within `[0, total_lines]`, where `total_lines` is the
//!   wrapped row count of the log.
//! - `prompt_columns <= columns`.

use crate::config::CellMetrics;
use vcon_core::event::ScrollAction;

/// Layout state of the console window.
#[derive(Debug, Clone)]
pub struct Layout {
    width: u16,
    height: u16,
    metrics: CellMetrics,
    log_lines: usize,
    log_rows: usize,
    prompt_columns: usize,
    scroll: usize,
}

impl Layout {
    /// Layout for a surface of `width` x `height` units.
    #[must_use]
    pub fn new(width: u16, height: u16, metrics: CellMetrics) -> Self {
        Self {
            width,
            height,
            metrics,
            log_lines: 0,
            log_rows: 0,
            prompt_columns: 0,
            scroll: 0,
        }
    }

    /// Apply a new surface size. Returns `true` when the width changed, in
    /// which case the caller must re-wrap the log and call
    /// [`set_log`](Self::set_log).
    pub fn resize(&mut self, width: u16, height: u16) -> bool {
        let width_changed = width != self.width;
        self.width = width;
        self.height = height;
        self.prompt_columns = self.prompt_columns.min(self.columns());
        self.clamp();
        width_changed
    }

    /// Record the log's logical line count and wrapped row count.
    pub fn set_log(&mut self, lines: usize, rows: usize) {
        self.log_lines = lines;
        self.log_rows = rows;
        self.clamp();
    }

    /// Set the prompt width in columns, capped to the surface.
    pub fn set_prompt_columns(&mut self, columns: usize) {
        self.prompt_columns = columns.min(self.columns());
    }

    /// Move the viewport. Returns `true` if the offset changed.
    pub fn scroll_by(&mut self, action: ScrollAction, page: usize) -> bool {
        let y = self.scroll as isize;
        let total = self.total_lines() as isize;
        let page = page as isize;
        let mut dy = match action {
            ScrollAction::LineUp => -1,
            ScrollAction::LineDown => 1,
            ScrollAction::PageUp => -page,
            ScrollAction::PageDown => page,
            ScrollAction::ThumbTo(pos) => (pos as isize).saturating_sub(y),
        };
        if y + dy < 0 {
            dy = -y;
        }
        if total - (y + dy) < 0 {
            dy = total - y;
        }
        if dy == 0 {
            return false;
        }
        self.scroll = (y + dy) as usize;
        true
    }

    /// Scroll so the command row is the last visible row.
    pub fn follow_bottom(&mut self) {
        let canvas = self.total_lines() + 1;
        self.scroll = canvas
            .saturating_sub(self.visible_rows())
            .min(self.total_lines());
    }

    /// Surface width.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Surface height.
    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Text columns across the surface.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.metrics.columns_in(usize::from(self.width))
    }

    /// Text rows in the viewport (at least one).
    #[must_use]
    pub fn visible_rows(&self) -> usize {
        self.metrics.rows_in(usize::from(self.height)).max(1)
    }

    /// Logical (newline-terminated) log lines.
    #[must_use]
    pub fn log_lines(&self) -> usize {
        self.log_lines
    }

    /// Extra rows produced by wrapping.
    #[must_use]
    pub fn additional_lines(&self) -> usize {
        self.log_rows.saturating_sub(self.log_lines)
    }

    /// Wrapped log rows; the scroll range is `[0, total_lines]`.
    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.log_rows
    }

    /// First visible canvas row.
    #[must_use]
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Prompt width in columns.
    #[must_use]
    pub fn prompt_columns(&self) -> usize {
        self.prompt_columns
    }

    /// Columns left for the command line.
    #[must_use]
    pub fn input_columns(&self) -> usize {
        self.columns() - self.prompt_columns
    }

    /// Viewport row of the command line, if it is on screen.
    #[must_use]
    pub fn command_row(&self) -> Option<usize> {
        let row = self.log_rows.checked_sub(self.scroll)?;
        (row < self.visible_rows()).then_some(row)
    }

    fn clamp(&mut self) {
        self.scroll = self.scroll.min(self.total_lines());
    }
}
