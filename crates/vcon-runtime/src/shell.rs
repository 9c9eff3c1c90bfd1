#![forbid(unsafe_code)]

//! Shell driver: runs a program inside the console.
//!
//! ```text
//! Starting ──▶ Running ──▶ Finalizing ──▶ Done
//! ```
//!
//! - **Starting**: create the [`ConsoleSession`], spawn the `vcon-ui`
//!   thread and block until it reports that the console is up.
//! - **Running**: call the program on the current thread with the session
//!   and the argument vector. A panic is caught so shutdown still happens,
//!   then resumed.
//! - **Finalizing**: optionally wait for the user to close the window, then
//!   mark the session exited, set `finalize_requested` and wait a bounded
//!   time for `finalize_done`.
//! - **Done**: join the UI thread, or detach it if it never acknowledged.
//!   A detached terminal UI still owns the terminal, so the driver restores
//!   the terminal modes itself before returning.
//!
//! A panic on the UI thread marks the session exited and closed, so a
//! program blocked in a read gets [`ConsoleError::Shutdown`] and
//! finalization does not wait for a window that is gone.
//!
//! The terminal backend measures its surface in cells, so [`Shell::run`]
//! ignores the configured [`CellMetrics`] and lays out with the identity
//! metrics. [`Shell::run_with`] passes them through to custom backends.
//!
//! # Example
//!
//! ```no_run
//! use vcon_runtime::config::ConsoleConfig;
//! use vcon_runtime::shell::Shell;
//!
//! let mut shell = Shell::new(ConsoleConfig::from_env());
//! shell.run(|console, _args| {
//!     while let Ok(Some(line)) = console.read_line(">>> ") {
//!         console.write_text(&format!("{line}\n"));
//!     }
//! })?;
//! # Ok::<(), vcon_core::ConsoleError>(())
//! ```

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use vcon_core::ConsoleError;
use vcon_core::argv;

use crate::config::{CellMetrics, ConsoleConfig};
use crate::event_source::{ConsoleEventSource, TerminalEventSource};
use crate::render::{Renderer, TerminalRenderer};
use crate::session::ConsoleSession;
use crate::terminal_session::{self, SessionOptions, TerminalSession};
use crate::window::{ConsoleWindow, UiRequest};

/// Name of the UI thread.
pub const UI_THREAD_NAME: &str = "vcon-ui";

/// Driver lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    /// Bringing the console up.
    Starting,
    /// The program is running.
    Running,
    /// Shutting the console down.
    Finalizing,
    /// Finished.
    Done,
}

/// Runs a program inside a console session.
#[derive(Debug)]
pub struct Shell {
    config: ConsoleConfig,
    args: Vec<String>,
    state: ShellState,
}

impl Shell {
    /// Create a driver. The argument vector defaults to the process
    /// arguments.
    #[must_use]
    pub fn new(config: ConsoleConfig) -> Self {
        Self {
            config,
            args: std::env::args().collect(),
            state: ShellState::Starting,
        }
    }

    /// Use an explicit argument vector.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Build the argument vector from a Windows-style command line.
    #[must_use]
    pub fn with_command_line(mut self, program: &str, command_line: &str) -> Self {
        self.args = argv::build_argv(program, command_line);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ShellState {
        self.state
    }

    /// The argument vector the program will receive.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run `program` in a terminal console.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::Startup`] if the terminal cannot be set up.
    pub fn run<F, T>(&mut self, program: F) -> Result<T, ConsoleError>
    where
        F: FnOnce(&Arc<ConsoleSession>, &[String]) -> T,
    {
        let ui_config = self.terminal_config();
        self.drive(
            terminal_backend,
            program,
            ui_config,
            terminal_session::restore_terminal,
        )
    }

    /// Run `program` with a custom backend.
    ///
    /// `backend` is called on the UI thread to create the event source and
    /// renderer.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::Startup`] if the UI thread cannot be spawned or the
    /// backend fails.
    pub fn run_with<B, E, R, F, T>(&mut self, backend: B, program: F) -> Result<T, ConsoleError>
    where
        B: FnOnce(&ConsoleConfig) -> io::Result<(E, R)> + Send + 'static,
        E: ConsoleEventSource + 'static,
        R: Renderer + 'static,
        F: FnOnce(&Arc<ConsoleSession>, &[String]) -> T,
    {
        let ui_config = self.config.clone();
        self.drive(backend, program, ui_config, || {})
    }

    /// Configuration for the terminal UI: cell metrics are the identity.
    fn terminal_config(&self) -> ConsoleConfig {
        self.config.clone().with_metrics(CellMetrics::default())
    }

    fn drive<B, E, R, F, T, D>(
        &mut self,
        backend: B,
        program: F,
        ui_config: ConsoleConfig,
        on_detach: D,
    ) -> Result<T, ConsoleError>
    where
        B: FnOnce(&ConsoleConfig) -> io::Result<(E, R)> + Send + 'static,
        E: ConsoleEventSource + 'static,
        R: Renderer + 'static,
        F: FnOnce(&Arc<ConsoleSession>, &[String]) -> T,
        D: FnOnce(),
    {
        self.transition(ShellState::Starting);
        let (session, requests) = ConsoleSession::new(&self.config);

        let ui = if self.config.interactive {
            Some(Self::start_ui(&session, requests, backend, ui_config)?)
        } else {
            drop(requests);
            None
        };

        self.transition(ShellState::Running);
        let args = std::mem::take(&mut self.args);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| program(&session, &args)));
        if outcome.is_err() {
            tracing::error!("program panicked; finalizing console");
        }

        self.transition(ShellState::Finalizing);
        if let Some(ui) = ui {
            self.finalize(&session, ui, on_detach);
        } else {
            session.request_shutdown();
        }
        drop(args);

        self.transition(ShellState::Done);
        match outcome {
            Ok(value) => Ok(value),
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    fn start_ui<B, E, R>(
        session: &Arc<ConsoleSession>,
        requests: mpsc::Receiver<UiRequest>,
        backend: B,
        config: ConsoleConfig,
    ) -> Result<JoinHandle<io::Result<()>>, ConsoleError>
    where
        B: FnOnce(&ConsoleConfig) -> io::Result<(E, R)> + Send + 'static,
        E: ConsoleEventSource + 'static,
        R: Renderer + 'static,
    {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<io::Result<()>>(1);
        let ui_session = Arc::clone(session);

        let handle = thread::Builder::new()
            .name(UI_THREAD_NAME.into())
            .spawn(move || {
                let started = backend(&config)
                    .and_then(|(events, renderer)| Ok((events.size()?, events, renderer)));
                let (size, mut events, mut renderer) = match started {
                    Ok(parts) => parts,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return Ok(());
                    }
                };
                let window = ConsoleWindow::new(Arc::clone(&ui_session), requests, &config, size);
                let _ = ready_tx.send(Ok(()));
                let ran = panic::catch_unwind(AssertUnwindSafe(|| {
                    window.run(&mut events, &mut renderer)
                }));
                ran.unwrap_or_else(|_| {
                    tracing::error!("console window panicked; closing session");
                    ui_session.mark_exited();
                    let signals = ui_session.signals();
                    signals.closed.set();
                    signals.finalize_done.set();
                    Err(io::Error::other("console window panicked"))
                })
            })
            .map_err(|err| ConsoleError::Startup(err.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                tracing::info!("console ready");
                Ok(handle)
            }
            Ok(Err(err)) => {
                let _ = handle.join();
                Err(ConsoleError::Startup(err.to_string()))
            }
            Err(_) => {
                let _ = handle.join();
                Err(ConsoleError::Startup(
                    "UI thread exited before the console was ready".into(),
                ))
            }
        }
    }

    fn finalize(
        &self,
        session: &ConsoleSession,
        ui: JoinHandle<io::Result<()>>,
        on_detach: impl FnOnce(),
    ) {
        let signals = session.signals();
        if self.config.linger_on_exit && !signals.closed.is_set() {
            session.notify("Program finished. Press Ctrl+Q to close.");
            signals.closed.wait();
        }

        session.request_shutdown();
        if !session.await_shutdown_complete(self.config.finalize_timeout) {
            tracing::warn!(
                timeout = ?self.config.finalize_timeout,
                "UI thread did not acknowledge shutdown, detaching"
            );
            on_detach();
            return;
        }

        match ui.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "console window ended with an error"),
            Err(_) => tracing::warn!("UI thread panicked"),
        }
    }

    fn transition(&mut self, next: ShellState) {
        tracing::debug!(from = ?self.state, to = ?next, "shell state");
        self.state = next;
    }
}

fn terminal_backend(
    config: &ConsoleConfig,
) -> io::Result<(TerminalEventSource, TerminalRenderer<io::Stdout>)> {
    let session = TerminalSession::new(SessionOptions {
        alternate_screen: config.alternate_screen,
        mouse_capture: config.mouse_capture,
        bracketed_paste: true,
        title: Some(config.title.clone()),
    })?;
    Ok((
        TerminalEventSource::new(session),
        TerminalRenderer::new(io::stdout(), config.palette),
    ))
}
