#![forbid(unsafe_code)]

//! Console configuration.
//!
//! [`ConsoleConfig`] is a plain struct with sensible defaults, builder-style
//! setters and an environment overlay ([`ConsoleConfig::from_env`]).
//!
//! # Environment Variables
//!
//! | Variable | Field | Format |
//! |----------|-------|--------|
//! | `VCON_INTERACTIVE` | `interactive` | boolean |
//! | `VCON_TITLE` | `title` | string |
//! | `VCON_HISTORY` | `history_capacity` | integer |
//! | `VCON_LINGER` | `linger_on_exit` | boolean |
//! | `VCON_ALT_SCREEN` | `alternate_screen` | boolean |
//! | `VCON_MOUSE` | `mouse_capture` | boolean |
//!
//! Booleans accept `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`,
//! case-insensitively. Unparseable values are ignored with a warning.

use std::env;
use std::time::Duration;

use crossterm::style::Color;

/// Maximum prompt width, in characters.
pub const PROMPT_MAX_LEN: usize = 64;

/// Foreground and background colours of the console surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Text colour.
    pub foreground: Color,
    /// Surface colour.
    pub background: Color,
}

impl Default for Palette {
    /// White on dark blue.
    fn default() -> Self {
        Self {
            foreground: Color::White,
            background: Color::Rgb {
                r: 0x00,
                g: 0x11,
                b: 0x33,
            },
        }
    }
}

/// Size of one character cell and the padding between cells.
///
/// Text of `n` characters spans `char_width * n + pad_x * (n - 1)` units,
/// and zero units when empty. Metrics turn a surface size into text columns
/// and rows, so they only matter for surfaces not measured in cells, such as
/// a backend passed to [`Shell::run_with`](crate::shell::Shell::run_with).
/// The terminal driven by [`Shell::run`](crate::shell::Shell::run) always
/// uses the identity metrics (one unit per cell, no padding).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    /// Width of a character.
    pub char_width: u16,
    /// Height of a character.
    pub char_height: u16,
    /// Horizontal gap between characters.
    pub pad_x: u16,
    /// Vertical gap between lines.
    pub pad_y: u16,
}

impl CellMetrics {
    /// Number of whole characters that fit in `width`.
    #[must_use]
    pub fn columns_in(&self, width: usize) -> usize {
        let step = usize::from(self.char_width.max(1)) + usize::from(self.pad_x);
        (width + usize::from(self.pad_x)) / step
    }

    /// Number of whole lines that fit in `height`.
    #[must_use]
    pub fn rows_in(&self, height: usize) -> usize {
        let step = usize::from(self.char_height.max(1)) + usize::from(self.pad_y);
        (height + usize::from(self.pad_y)) / step
    }
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            char_width: 1,
            char_height: 1,
            pad_x: 0,
            pad_y: 0,
        }
    }
}

/// Configuration for a console session and its window.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Show the console window. When disabled, `read_line` returns no data
    /// and writes go to the process stdout.
    pub interactive: bool,
    /// Window title.
    pub title: String,
    /// Committed history lines kept.
    pub history_capacity: usize,
    /// Maximum history line length, in graphemes.
    pub max_line_len: usize,
    /// Keystrokes staged for console reads.
    pub read_buffer_capacity: usize,
    /// Completed lines that may wait unread.
    pub readline_backlog: usize,
    /// Scrollback lines kept in the log.
    pub log_max_lines: usize,
    /// Prompt characters shown.
    pub prompt_max_len: usize,
    /// Lines moved by a page scroll.
    pub page_lines: usize,
    /// Input poll timeout of the UI loop.
    pub poll_timeout: Duration,
    /// How long the driver waits for the UI thread to acknowledge shutdown.
    pub finalize_timeout: Duration,
    /// Keep the window open after the program returns, until closed.
    pub linger_on_exit: bool,
    /// Use the alternate screen buffer.
    pub alternate_screen: bool,
    /// Capture the mouse (wheel scrolling).
    pub mouse_capture: bool,
    /// Surface colours.
    pub palette: Palette,
    /// Character cell metrics.
    pub metrics: CellMetrics,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            interactive: true,
            title: String::from("vcon"),
            history_capacity: vcon_core::history::DEFAULT_CAPACITY,
            max_line_len: vcon_core::history::DEFAULT_MAX_LINE_LEN,
            read_buffer_capacity: vcon_core::read_buffer::DEFAULT_CAPACITY,
            readline_backlog: vcon_core::readline::DEFAULT_BACKLOG,
            log_max_lines: 2000,
            prompt_max_len: PROMPT_MAX_LEN,
            page_lines: 10,
            poll_timeout: Duration::from_millis(50),
            finalize_timeout: Duration::from_secs(5),
            linger_on_exit: false,
            alternate_screen: true,
            mouse_capture: true,
            palette: Palette::default(),
            metrics: CellMetrics::default(),
        }
    }
}

impl ConsoleConfig {
    /// Defaults overlaid with the `VCON_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Overlay the `VCON_*` environment variables onto this configuration.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        if let Some(v) = env_bool("VCON_INTERACTIVE") {
            self.interactive = v;
        }
        if let Ok(title) = env::var("VCON_TITLE") {
            self.title = title;
        }
        if let Ok(raw) = env::var("VCON_HISTORY") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.history_capacity = n,
                _ => tracing::warn!(value = %raw, "ignoring invalid VCON_HISTORY"),
            }
        }
        if let Some(v) = env_bool("VCON_LINGER") {
            self.linger_on_exit = v;
        }
        if let Some(v) = env_bool("VCON_ALT_SCREEN") {
            self.alternate_screen = v;
        }
        if let Some(v) = env_bool("VCON_MOUSE") {
            self.mouse_capture = v;
        }
        self
    }

    /// A configuration without the console window.
    pub fn headless() -> Self {
        Self {
            interactive: false,
            ..Default::default()
        }
    }

    /// Set whether the console window is shown.
    #[must_use]
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the history bounds.
    #[must_use]
    pub fn with_history(mut self, capacity: usize, max_line_len: usize) -> Self {
        self.history_capacity = capacity;
        self.max_line_len = max_line_len;
        self
    }

    /// Set the readline backlog bound.
    #[must_use]
    pub fn with_readline_backlog(mut self, backlog: usize) -> Self {
        self.readline_backlog = backlog;
        self
    }

    /// Set the scrollback bound.
    #[must_use]
    pub fn with_log_max_lines(mut self, lines: usize) -> Self {
        self.log_max_lines = lines;
        self
    }

    /// Set the UI loop poll timeout.
    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Set the shutdown acknowledgment timeout.
    #[must_use]
    pub fn with_finalize_timeout(mut self, timeout: Duration) -> Self {
        self.finalize_timeout = timeout;
        self
    }

    /// Keep the window open after the program returns.
    #[must_use]
    pub fn with_linger(mut self, linger: bool) -> Self {
        self.linger_on_exit = linger;
        self
    }

    /// Set the surface colours.
    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Set the cell metrics.
    #[must_use]
    pub fn with_metrics(mut self, metrics: CellMetrics) -> Self {
        self.metrics = metrics;
        self
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let raw = env::var(key).ok()?;
    let parsed = parse_bool(&raw);
    if parsed.is_none() {
        tracing::warn!(key, value = %raw, "ignoring invalid boolean");
    }
    parsed
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
