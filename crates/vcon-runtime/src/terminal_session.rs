#![forbid(unsafe_code)]

//! Terminal lifecycle guard for the console window.
//!
//! [`TerminalSession`] enters raw mode on creation and restores the terminal
//! when dropped, including during panic unwinding. A panic hook performs a
//! best-effort restore before the default hook prints the message, so the
//! panic text lands on a sane terminal. The same restore runs when the shell
//! driver gives up on a UI thread that still owns the session.
//!
//! # Cleanup Order
//!
//! Modes are disabled in reverse order of enabling:
//! 1. Disable bracketed paste (if enabled)
//! 2. Disable mouse capture (if enabled)
//! 3. Show cursor (always)
//! 4. Leave alternate screen (if enabled)
//! 5. Exit raw mode (always)
//! 6. Flush stdout
//!
//! # Signals
//!
//! On Unix, SIGINT and SIGTERM do not kill the process while a session is
//! alive. They raise a close request instead, which the event source turns
//! into [`Event::Close`](vcon_core::event::Event::Close) so the console can
//! run its shutdown handshake.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use vcon_core::event::Event;

#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGWINCH};
#[cfg(unix)]
use signal_hook::iterator::Signals;

/// Terminal modes to enable for the console window.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Switch to the alternate screen buffer.
    pub alternate_screen: bool,
    /// Capture the mouse so the wheel scrolls the log.
    pub mouse_capture: bool,
    /// Deliver pastes as a single event.
    pub bracketed_paste: bool,
    /// Window title to set, if any.
    pub title: Option<String>,
}

/// Owns raw mode and the enabled terminal modes; restores them on drop.
///
/// Only one session should exist at a time.
#[derive(Debug)]
pub struct TerminalSession {
    alternate_screen_enabled: bool,
    mouse_enabled: bool,
    bracketed_paste_enabled: bool,
    close_requested: Arc<AtomicBool>,
    #[cfg(unix)]
    signal_guard: Option<SignalGuard>,
}

impl TerminalSession {
    /// Enter raw mode and enable the requested modes.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode or any requested mode cannot be enabled.
    pub fn new(options: SessionOptions) -> io::Result<Self> {
        install_panic_hook();

        crossterm::terminal::enable_raw_mode()?;
        tracing::info!("terminal raw mode enabled");

        let close_requested = Arc::new(AtomicBool::new(false));
        let mut session = Self {
            alternate_screen_enabled: false,
            mouse_enabled: false,
            bracketed_paste_enabled: false,
            #[cfg(unix)]
            signal_guard: Some(SignalGuard::new(Arc::clone(&close_requested))?),
            close_requested,
        };

        let mut stdout = io::stdout();

        if options.alternate_screen {
            crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
            session.alternate_screen_enabled = true;
            tracing::info!("alternate screen enabled");
        }

        if options.mouse_capture {
            crossterm::execute!(stdout, crossterm::event::EnableMouseCapture)?;
            session.mouse_enabled = true;
            tracing::info!("mouse capture enabled");
        }

        if options.bracketed_paste {
            crossterm::execute!(stdout, crossterm::event::EnableBracketedPaste)?;
            session.bracketed_paste_enabled = true;
            tracing::info!("bracketed paste enabled");
        }

        if let Some(title) = &options.title {
            crate::render::set_title(&mut stdout, title)?;
        }

        crossterm::execute!(
            stdout,
            crossterm::terminal::Clear(crossterm::terminal::ClearType::All)
        )?;

        Ok(session)
    }

    /// Current terminal size (columns, rows).
    pub fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    /// Poll for an event with a timeout.
    pub fn poll_event(&self, timeout: Duration) -> io::Result<bool> {
        crossterm::event::poll(timeout)
    }

    /// Read the next event (blocking until available).
    ///
    /// Returns `Ok(None)` for terminal events the console ignores.
    pub fn read_event(&self) -> io::Result<Option<Event>> {
        let event = crossterm::event::read()?;
        Ok(Event::from_crossterm(event))
    }

    /// Consume a pending close request raised by a termination signal.
    pub fn take_close_request(&self) -> bool {
        self.close_requested.swap(false, Ordering::AcqRel)
    }

    fn cleanup(&mut self) {
        #[cfg(unix)]
        let _ = self.signal_guard.take();

        let mut stdout = io::stdout();

        if self.bracketed_paste_enabled {
            let _ = crossterm::execute!(stdout, crossterm::event::DisableBracketedPaste);
            self.bracketed_paste_enabled = false;
            tracing::info!("bracketed paste disabled");
        }

        if self.mouse_enabled {
            let _ = crossterm::execute!(stdout, crossterm::event::DisableMouseCapture);
            self.mouse_enabled = false;
            tracing::info!("mouse capture disabled");
        }

        let _ = crossterm::execute!(
            stdout,
            crossterm::style::ResetColor,
            crossterm::cursor::Show
        );

        if self.alternate_screen_enabled {
            let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
            self.alternate_screen_enabled = false;
            tracing::info!("alternate screen disabled");
        }

        let _ = crossterm::terminal::disable_raw_mode();
        tracing::info!("terminal raw mode disabled");

        let _ = stdout.flush();
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_terminal();
            previous(info);
        }));
    });
}

/// Undo every mode a session may have enabled, ignoring errors.
///
/// Used when no [`TerminalSession`] is left to drop: from the panic hook,
/// and by the shell driver when it detaches an unresponsive UI thread.
pub(crate) fn restore_terminal() {
    let mut stdout = io::stdout();

    let _ = crossterm::execute!(stdout, crossterm::event::DisableBracketedPaste);
    let _ = crossterm::execute!(stdout, crossterm::event::DisableMouseCapture);
    let _ = crossterm::execute!(stdout, crossterm::style::ResetColor);
    let _ = crossterm::execute!(stdout, crossterm::cursor::Show);
    let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = stdout.flush();
}

#[cfg(unix)]
#[derive(Debug)]
struct SignalGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalGuard {
    fn new(close_requested: Arc<AtomicBool>) -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM, SIGWINCH])?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name("vcon-signals".into())
            .spawn(move || {
                for signal in signals.forever() {
                    match signal {
                        SIGWINCH => tracing::debug!("SIGWINCH received"),
                        SIGINT | SIGTERM => {
                            tracing::warn!(signal, "termination signal received, closing console");
                            close_requested.store(true, Ordering::Release);
                        }
                        _ => {}
                    }
                }
            })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
