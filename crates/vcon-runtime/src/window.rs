#![forbid(unsafe_code)]

//! The console window controller.
//!
//! Owns every piece of UI state (scrollback log, command line, history,
//! prompt, layout) and is driven by a single thread. Program threads reach
//! it only through the shared [`ConsoleSession`]: keystrokes flow out
//! through the relay and the readline queue, and output, prompts and
//! notices flow in as [`UiRequest`]s.
//!
//! # Key bindings
//!
//! | Key | Effect |
//! |-----|--------|
//! | printable | relayed; inserted unless a silent character read is waiting |
//! | Enter | relays `'\n'`, records history, queues the line unless a console read takes it |
//! | Backspace | relays `'\u{8}'`; deletes under the same echo rule |
//! | Up / Down | history |
//! | Shift+Up / Shift+Down | scroll one line |
//! | PageUp / PageDown | scroll one page |
//! | Ctrl+Home / Ctrl+End | scroll to top / bottom |
//! | Left, Right, Home, End, Delete | local editing |
//! | Tab | swallowed |
//! | Ctrl+Q | close |
//!
//! # Shutdown
//!
//! Closing the window marks the session exited (waking every blocked
//! reader), sets `closed`, waits for the program side to set
//! `finalize_requested` and acknowledges with `finalize_done`. When the
//! program finishes first it sets `finalize_requested`; the loop notices on
//! its next turn, flushes pending output and acknowledges.

use std::io;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use vcon_core::event::{Event, KeyCode, KeyEvent, ScrollAction};
use vcon_core::history::{Direction, History, RecordOutcome};

use crate::cmdline::CommandLine;
use crate::config::ConsoleConfig;
use crate::event_source::ConsoleEventSource;
use crate::layout::Layout;
use crate::render::{Frame, Renderer};
use crate::session::ConsoleSession;
use crate::shell_log::ShellLog;

/// Requests from program threads, applied on the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiRequest {
    /// Append text to the log.
    Write(String),
    /// Replace the prompt.
    SetPrompt(String),
    /// Show a one-row notice.
    Notice(String),
}

/// Whether the event loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep processing events.
    Continue,
    /// The window is closing.
    Close,
}

/// Console window state and event handling.
#[derive(Debug)]
pub struct ConsoleWindow {
    session: Arc<ConsoleSession>,
    requests: Receiver<UiRequest>,
    requests_open: bool,
    log: ShellLog,
    cmdline: CommandLine,
    history: History,
    prompt: String,
    prompt_max_len: usize,
    layout: Layout,
    page_lines: usize,
    notice: Option<String>,
    dirty: bool,
    poll_timeout: Duration,
}

impl ConsoleWindow {
    /// Create the controller for a surface of `size` (columns, rows).
    pub fn new(
        session: Arc<ConsoleSession>,
        requests: Receiver<UiRequest>,
        config: &ConsoleConfig,
        size: (u16, u16),
    ) -> Self {
        let layout = Layout::new(size.0, size.1, config.metrics);
        let mut log = ShellLog::new(config.log_max_lines);
        log.set_width(layout.columns());
        Self {
            session,
            requests,
            requests_open: true,
            log,
            cmdline: CommandLine::new().with_max_length(config.max_line_len),
            history: History::new(config.history_capacity, config.max_line_len),
            prompt: String::new(),
            prompt_max_len: config.prompt_max_len,
            layout,
            page_lines: config.page_lines,
            notice: None,
            dirty: true,
            poll_timeout: config.poll_timeout,
        }
    }

    // --- Event loop ---

    /// Run until the window closes or the program side finishes, then
    /// complete the shutdown handshake.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error from the event source or renderer. The
    /// handshake still completes so the program side is not left waiting.
    pub fn run<E, R>(mut self, events: &mut E, renderer: &mut R) -> io::Result<()>
    where
        E: ConsoleEventSource,
        R: Renderer,
    {
        let _span = tracing::debug_span!("console_window").entered();
        let result = self.event_loop(events, renderer);
        let signals = self.session.signals();
        if let Err(err) = &result {
            tracing::error!(error = %err, "console window failed");
            self.session.mark_exited();
            signals.closed.set();
        }
        if signals.closed.is_set() {
            signals.finalize_requested.wait();
        }
        signals.finalize_done.set();
        tracing::debug!("console window finalized");
        result
    }

    fn event_loop<E, R>(&mut self, events: &mut E, renderer: &mut R) -> io::Result<()>
    where
        E: ConsoleEventSource,
        R: Renderer,
    {
        loop {
            if self.session.signals().finalize_requested.is_set() {
                self.drain_requests();
                self.present(renderer)?;
                return Ok(());
            }
            self.drain_requests();
            self.present(renderer)?;

            if !events.poll_event(self.poll_timeout)? {
                self.session.set_input_pending(false);
                continue;
            }
            let Some(event) = events.read_event()? else {
                continue;
            };
            if matches!(event, Event::Key(_) | Event::Paste(_)) {
                self.session.set_input_pending(true);
            }
            if self.handle_event(&event) == Flow::Close {
                self.close();
                self.present(renderer)?;
                return Ok(());
            }
        }
    }

    fn present<R: Renderer>(&mut self, renderer: &mut R) -> io::Result<()> {
        if self.dirty {
            renderer.present(&self.frame())?;
            self.dirty = false;
        }
        Ok(())
    }

    /// Mark the session exited, wake blocked readers and signal `closed`.
    pub fn close(&mut self) {
        tracing::info!("console window closing");
        self.session.mark_exited();
        self.session.signals().closed.set();
    }

    // --- Events ---

    /// Apply one event.
    pub fn handle_event(&mut self, event: &Event) -> Flow {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Paste(text) => {
                for c in text.chars() {
                    match c {
                        '\n' => self.submit(),
                        '\r' => {}
                        c => self.type_char(c),
                    }
                }
                Flow::Continue
            }
            Event::Resize { width, height } => {
                self.resize(*width, *height);
                Flow::Continue
            }
            Event::Scroll(action) => {
                self.scroll(*action);
                Flow::Continue
            }
            Event::Focus(_) => Flow::Continue,
            Event::Close => Flow::Close,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Flow {
        if !key.is_down() {
            return Flow::Continue;
        }
        if self.notice.take().is_some() {
            self.dirty = true;
        }
        match key.code {
            KeyCode::Char('q') if key.ctrl() => return Flow::Close,
            KeyCode::Char(_) if key.ctrl() => {}
            KeyCode::Char(c) => self.type_char(c),
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.session.relay().put_char('\u{8}');
                if self.echo_enabled() && self.cmdline.delete_back() {
                    self.dirty = true;
                }
            }
            KeyCode::Up if key.shift() => self.scroll(ScrollAction::LineUp),
            KeyCode::Down if key.shift() => self.scroll(ScrollAction::LineDown),
            KeyCode::Up => self.recall(Direction::Up),
            KeyCode::Down => self.recall(Direction::Down),
            KeyCode::PageUp => self.scroll(ScrollAction::PageUp),
            KeyCode::PageDown => self.scroll(ScrollAction::PageDown),
            KeyCode::Home if key.ctrl() => self.scroll(ScrollAction::ThumbTo(0)),
            KeyCode::End if key.ctrl() => {
                self.layout.follow_bottom();
                self.dirty = true;
            }
            KeyCode::Tab | KeyCode::BackTab => {}
            _ => {
                if self.cmdline.handle_key(key) {
                    self.dirty = true;
                }
            }
        }
        Flow::Continue
    }

    fn type_char(&mut self, c: char) {
        self.session.relay().put_char(c);
        if self.echo_enabled() && self.cmdline.insert_char(c) {
            self.dirty = true;
        }
    }

    /// Keystrokes reach the command line unless a character read that did
    /// not ask for echo is waiting.
    fn echo_enabled(&self) -> bool {
        let relay = self.session.relay();
        !relay.is_waiting() || relay.echo_requested()
    }

    fn submit(&mut self) {
        let to_console = self.session.relay().commit_line();
        let line = self.cmdline.value().to_owned();
        if self.history.record_line(&line) == RecordOutcome::EvictedOldest {
            tracing::debug!("history evicted its oldest entry");
        }
        if to_console {
            tracing::trace!("line consumed by a console read");
        } else if let Err(err) = self.session.queue().push(line) {
            tracing::warn!(error = %err, "input line dropped");
            self.notice = Some(err.to_string());
        }
        self.cmdline.clear();
        self.dirty = true;
    }

    fn recall(&mut self, direction: Direction) {
        let recalled = self
            .history
            .navigate(direction, self.cmdline.value())
            .map(str::to_owned);
        if let Some(text) = recalled {
            self.cmdline.set_value(text);
            self.dirty = true;
        }
    }

    fn scroll(&mut self, action: ScrollAction) {
        if self.layout.scroll_by(action, self.page_lines) {
            self.dirty = true;
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        if self.layout.resize(width, height) {
            self.relayout();
        }
        self.apply_prompt_width();
        self.dirty = true;
    }

    // --- Requests ---

    /// Apply every queued request without blocking.
    pub fn drain_requests(&mut self) {
        while self.requests_open {
            match self.requests.try_recv() {
                Ok(request) => self.apply(request),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.requests_open = false,
            }
        }
    }

    /// Apply one request.
    pub fn apply(&mut self, request: UiRequest) {
        match request {
            UiRequest::Write(text) => {
                self.write_text(&text);
            }
            UiRequest::SetPrompt(prompt) => self.set_prompt(&prompt),
            UiRequest::Notice(message) => {
                tracing::warn!(%message, "console notice");
                self.notice = Some(message);
                self.dirty = true;
            }
        }
    }

    /// Append `text` to the log and follow the bottom. Returns the number of
    /// characters accepted.
    pub fn write_text(&mut self, text: &str) -> usize {
        let evicted = self.log.evicted();
        let accepted = self.log.write(text);
        if accepted == 0 {
            return 0;
        }
        if self.log.evicted() > evicted {
            tracing::trace!(evicted = self.log.evicted(), "log lines evicted");
        }
        self.relayout();
        self.layout.follow_bottom();
        self.dirty = true;
        accepted
    }

    /// Replace the prompt; at most `prompt_max_len` characters are shown.
    pub fn set_prompt(&mut self, prompt: &str) {
        let shown: String = prompt.chars().take(self.prompt_max_len).collect();
        if shown != self.prompt {
            self.prompt = shown;
            self.apply_prompt_width();
            self.dirty = true;
        }
    }

    fn apply_prompt_width(&mut self) {
        self.layout.set_prompt_columns(self.prompt.width());
    }

    fn relayout(&mut self) {
        if self.log.set_width(self.layout.columns()) {
            tracing::debug!(columns = self.layout.columns(), "log rewrapped");
        }
        self.layout
            .set_log(self.log.line_count(), self.log.row_count());
    }

    // --- Painting ---

    /// Compose the current screen.
    pub fn frame(&self) -> Frame {
        let columns = self.layout.columns();
        let visible = self.layout.visible_rows();
        let scroll = self.layout.scroll();
        let log_total = self.log.row_count();
        let mut log_rows = self.log.rows_in(scroll, visible).into_iter();

        let (input, cursor_col) = self.cmdline.visible(self.layout.input_columns());
        let prompt = self.prompt_visible();
        let mut rows = Vec::with_capacity(visible);
        for i in 0..visible {
            let r = scroll + i;
            match r.cmp(&log_total) {
                std::cmp::Ordering::Less => rows.push(log_rows.next().unwrap_or_default()),
                std::cmp::Ordering::Equal => rows.push(format!("{prompt}{input}")),
                std::cmp::Ordering::Greater => rows.push(String::new()),
            }
        }

        let cursor = self.layout.command_row().and_then(|row| {
            let x = (self.layout.prompt_columns() + cursor_col).min(columns.saturating_sub(1));
            Some((u16::try_from(x).ok()?, u16::try_from(row).ok()?))
        });

        Frame {
            width: self.layout.width(),
            height: self.layout.height(),
            rows,
            cursor,
            notice: self.notice.clone(),
        }
    }

    fn prompt_visible(&self) -> String {
        let limit = self.layout.prompt_columns();
        let mut used = 0;
        self.prompt
            .chars()
            .take_while(|&c| {
                used += UnicodeWidthChar::width(c).unwrap_or(0);
                used <= limit
            })
            .collect()
    }

    // --- Accessors ---

    /// The command line.
    pub fn cmdline(&self) -> &CommandLine {
        &self.cmdline
    }

    /// The command history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The current prompt.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The notice being shown, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcon_core::event::Modifiers;
    use vcon_core::readline::Popped;

    fn window() -> ConsoleWindow {
        window_with(ConsoleConfig::default())
    }

    fn window_with(config: ConsoleConfig) -> ConsoleWindow {
        let (session, requests) = ConsoleSession::new(&config);
        ConsoleWindow::new(session, requests, &config, (20, 5))
    }

    fn type_line(window: &mut ConsoleWindow, text: &str) {
        for c in text.chars() {
            window.handle_event(&Event::key(KeyCode::Char(c)));
        }
        window.handle_event(&Event::key(KeyCode::Enter));
    }

    #[test]
    fn enter_queues_line_and_records_history() {
        let mut w = window();
        type_line(&mut w, "abc");
        assert_eq!(w.session.queue().try_pop(), Popped::Line("abc".into()));
        assert_eq!(w.history().committed(), 1);
        assert_eq!(w.history().get(0), Some("abc"));
        assert!(w.cmdline().is_empty());
    }

    #[test]
    fn waiting_console_read_takes_the_line() {
        let mut w = window();
        let session = Arc::clone(&w.session);
        let reader = std::thread::spawn(move || session.relay().read_console(16));
        std::thread::sleep(std::time::Duration::from_millis(50));
        type_line(&mut w, "hi");
        assert_eq!(reader.join().unwrap().unwrap(), "hi\n");
        assert!(w.session.queue().is_empty());
        assert_eq!(w.history().get(0), Some("hi"));
    }

    #[test]
    fn frame_on_full_log_stays_cheap() {
        let config = ConsoleConfig::default().with_log_max_lines(2000);
        let (session, requests) = ConsoleSession::new(&config);
        let mut w = ConsoleWindow::new(session, requests, &config, (80, 24));
        for i in 0..2000 {
            w.write_text(&format!("prefill {i}\n"));
        }
        let start = std::time::Instant::now();
        for i in 0..20_000 {
            w.write_text(&format!("line {i}\n"));
            let frame = w.frame();
            assert_eq!(frame.rows.len(), 24);
        }
        assert!(start.elapsed() < std::time::Duration::from_secs(20));
        let frame = w.frame();
        assert_eq!(frame.rows[22], "line 19999");
        assert_eq!(frame.rows[0], "line 19977");
    }

    #[test]
    fn enter_discards_unread_keystrokes() {
        let mut w = window();
        type_line(&mut w, "abc");
        assert_eq!(w.session.relay().staged_len(), 0);
        assert_eq!(w.session.queue().try_pop(), Popped::Line("abc".into()));
    }

    #[test]
    fn up_recalls_previous_line() {
        let mut w = window();
        type_line(&mut w, "abc");
        w.handle_event(&Event::key(KeyCode::Up));
        assert_eq!(w.cmdline().value(), "abc");
        w.handle_event(&Event::key(KeyCode::Down));
        assert_eq!(w.cmdline().value(), "");
    }

    #[test]
    fn backspace_edits_line() {
        let mut w = window();
        w.handle_event(&Event::key(KeyCode::Char('a')));
        w.handle_event(&Event::key(KeyCode::Char('b')));
        w.handle_event(&Event::key(KeyCode::Backspace));
        assert_eq!(w.cmdline().value(), "a");
    }

    #[test]
    fn tab_is_swallowed() {
        let mut w = window();
        w.handle_event(&Event::key(KeyCode::Tab));
        assert!(w.cmdline().is_empty());
        assert_eq!(w.session.relay().staged_len(), 0);
    }

    #[test]
    fn ctrl_q_closes() {
        let mut w = window();
        let key = KeyEvent::new(KeyCode::Char('q')).with_modifiers(Modifiers::CTRL);
        assert_eq!(w.handle_event(&Event::Key(key)), Flow::Close);
        assert_eq!(w.handle_event(&Event::Close), Flow::Close);
        w.close();
        assert!(w.session.is_exited());
        assert!(w.session.signals().closed.is_set());
    }

    #[test]
    fn write_text_grows_log_and_follows_bottom() {
        let mut w = window();
        let before = w.layout().log_lines();
        assert_eq!(w.write_text("line1\nline2"), 11);
        assert_eq!(w.layout().log_lines(), before + 1);
        for i in 0..10 {
            w.write_text(&format!("row {i}\n"));
        }
        let frame = w.frame();
        assert_eq!(frame.rows.len(), 5);
        assert!(frame.contains("row 9"));
        assert_eq!(frame.cursor, Some((0, 4)));
    }

    #[test]
    fn wrapped_rows_count_as_additional_lines() {
        let mut w = window();
        w.write_text(&"x".repeat(45));
        w.write_text("\n");
        assert_eq!(w.layout().log_lines(), 1);
        assert_eq!(w.layout().additional_lines(), 2);
        w.handle_event(&Event::Resize {
            width: 50,
            height: 5,
        });
        assert_eq!(w.layout().additional_lines(), 0);
    }

    #[test]
    fn prompt_is_capped() {
        let mut w = window_with(ConsoleConfig::default());
        w.set_prompt(&">".repeat(100));
        assert_eq!(w.prompt().chars().count(), 64);
        assert_eq!(w.layout().prompt_columns(), 20);
    }

    #[test]
    fn prompt_and_input_share_command_row() {
        let mut w = window();
        w.apply(UiRequest::SetPrompt(">>> ".into()));
        w.handle_event(&Event::key(KeyCode::Char('x')));
        let frame = w.frame();
        assert_eq!(frame.rows[0], ">>> x");
        assert_eq!(frame.cursor, Some((5, 0)));
    }

    #[test]
    fn full_backlog_raises_notice() {
        let mut w = window_with(ConsoleConfig::default().with_readline_backlog(1));
        type_line(&mut w, "one");
        type_line(&mut w, "two");
        assert!(w.notice().unwrap().contains("backlog full"));
        w.handle_event(&Event::key(KeyCode::Char('a')));
        assert!(w.notice().is_none());
    }

    #[test]
    fn scroll_keys_move_view() {
        let mut w = window();
        for i in 0..20 {
            w.write_text(&format!("{i}\n"));
        }
        let bottom = w.layout().scroll();
        w.handle_event(&Event::key(KeyCode::PageUp));
        assert_eq!(w.layout().scroll(), bottom - 10);
        let shift_down = KeyEvent::new(KeyCode::Down).with_modifiers(Modifiers::SHIFT);
        w.handle_event(&Event::Key(shift_down));
        assert_eq!(w.layout().scroll(), bottom - 9);
        let ctrl_home = KeyEvent::new(KeyCode::Home).with_modifiers(Modifiers::CTRL);
        w.handle_event(&Event::Key(ctrl_home));
        assert_eq!(w.layout().scroll(), 0);
        w.handle_event(&Event::Scroll(ScrollAction::LineUp));
        assert_eq!(w.layout().scroll(), 0);
    }

    #[test]
    fn paste_types_and_submits() {
        let mut w = window();
        w.handle_event(&Event::Paste("a\r\nb".into()));
        assert_eq!(w.session.queue().try_pop(), Popped::Line("a".into()));
        assert_eq!(w.cmdline().value(), "b");
    }
}
