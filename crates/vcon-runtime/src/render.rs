#![forbid(unsafe_code)]

//! Frame presentation.
//!
//! The window controller composes a [`Frame`] (one string per viewport row
//! plus the cursor position) and hands it to a [`Renderer`]. The terminal
//! renderer paints it with Crossterm; the headless renderer records it for
//! tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crossterm::{cursor, queue, style, terminal};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::config::Palette;

/// One composed screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Surface width in columns.
    pub width: u16,
    /// Surface height in rows.
    pub height: u16,
    /// Viewport rows, top to bottom. At most `height` entries.
    pub rows: Vec<String>,
    /// Cursor position `(column, row)`, when the command line is visible.
    pub cursor: Option<(u16, u16)>,
    /// One-row notice drawn over the bottom row.
    pub notice: Option<String>,
}

impl Frame {
    /// True when any row contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.rows.iter().any(|row| row.contains(needle))
    }

    /// Rows joined by newlines, trailing blanks trimmed.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = self
            .rows
            .iter()
            .map(|row| row.trim_end())
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = out.trim_end_matches('\n').len();
        out.truncate(trimmed);
        out
    }
}

/// Sink for composed frames.
pub trait Renderer {
    /// Paint `frame`.
    fn present(&mut self, frame: &Frame) -> io::Result<()>;
}

/// Paints frames onto a terminal.
#[derive(Debug)]
pub struct TerminalRenderer<W: Write> {
    out: W,
    palette: Palette,
}

impl<W: Write> TerminalRenderer<W> {
    /// Render into `out` with the given colours.
    pub fn new(out: W, palette: Palette) -> Self {
        Self { out, palette }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn present(&mut self, frame: &Frame) -> io::Result<()> {
        let width = usize::from(frame.width);
        queue!(
            self.out,
            cursor::Hide,
            style::SetColors(style::Colors::new(
                self.palette.foreground,
                self.palette.background
            ))
        )?;
        for y in 0..frame.height {
            let row = frame
                .rows
                .get(usize::from(y))
                .map_or("", String::as_str);
            queue!(
                self.out,
                cursor::MoveTo(0, y),
                style::Print(fit(row, width))
            )?;
        }
        if let Some(notice) = &frame.notice
            && frame.height > 0
        {
            queue!(
                self.out,
                cursor::MoveTo(0, frame.height - 1),
                style::SetAttribute(style::Attribute::Reverse),
                style::Print(fit(notice, width)),
                style::SetAttribute(style::Attribute::NoReverse)
            )?;
        }
        if let Some((x, y)) = frame.cursor {
            queue!(self.out, cursor::MoveTo(x, y), cursor::Show)?;
        }
        self.out.flush()
    }
}

/// Set the terminal window title.
pub fn set_title(out: &mut impl Write, title: &str) -> io::Result<()> {
    queue!(out, terminal::SetTitle(title))?;
    out.flush()
}

/// Records presented frames. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl HeadlessRenderer {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames presented so far.
    pub fn frame_count(&self) -> usize {
        self.lock().len()
    }

    /// The most recent frame.
    pub fn last_frame(&self) -> Option<Frame> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Frame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Renderer for HeadlessRenderer {
    fn present(&mut self, frame: &Frame) -> io::Result<()> {
        self.lock().push(frame.clone());
        Ok(())
    }
}

/// Truncate or pad `text` to exactly `width` columns.
fn fit(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0;
    for g in text.graphemes(true) {
        let w = g.width();
        if used + w > width {
            break;
        }
        out.push_str(g);
        used += w;
    }
    out.extend(std::iter::repeat_n(' ', width - used));
    out
}
