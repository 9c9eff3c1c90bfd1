#![forbid(unsafe_code)]

//! End-to-end console sessions driven through a headless backend.
//!
//! Each test runs a program under [`Shell::run_with`] with keystrokes fed
//! over a channel and every presented frame recorded.

use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

use vcon_core::ConsoleError;
use vcon_core::event::{Event, KeyCode, KeyEvent, Modifiers};
use vcon_runtime::{
    ConsoleConfig, ConsoleSession, HeadlessEventSource, HeadlessRenderer, Shell, ShellState,
};

// ── Helpers ──────────────────────────────────────────────────────────────

type Backend = Box<
    dyn FnOnce(&ConsoleConfig) -> io::Result<(HeadlessEventSource, HeadlessRenderer)> + Send,
>;

struct Harness {
    backend: Backend,
    keys: Sender<Event>,
    renderer: HeadlessRenderer,
}

fn harness(width: u16, height: u16) -> Harness {
    let (source, keys) = HeadlessEventSource::channel(width, height);
    let renderer = HeadlessRenderer::new();
    let shared = renderer.clone();
    Harness {
        backend: Box::new(move |_| Ok((source, shared))),
        keys,
        renderer,
    }
}

fn config() -> ConsoleConfig {
    ConsoleConfig::default()
        .with_poll_timeout(Duration::from_millis(5))
        .with_finalize_timeout(Duration::from_secs(5))
}

fn type_text(keys: &Sender<Event>, text: &str) {
    for c in text.chars() {
        keys.send(Event::key(KeyCode::Char(c))).unwrap();
    }
}

fn press(keys: &Sender<Event>, code: KeyCode) {
    keys.send(Event::key(code)).unwrap();
}

fn ctrl_q() -> Event {
    Event::Key(KeyEvent::new(KeyCode::Char('q')).with_modifiers(Modifiers::CTRL))
}

// ══════════════════════════════════════════════════════════════════════════
// Line input
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn typed_line_is_returned_and_echoed() {
    let h = harness(40, 10);
    type_text(&h.keys, "abc");
    press(&h.keys, KeyCode::Enter);

    let mut shell = Shell::new(config()).with_args(["prog"]);
    let line = shell
        .run_with(h.backend, |console, _| console.read_line("> "))
        .unwrap();

    assert_eq!(line.unwrap().as_deref(), Some("abc"));
    assert_eq!(shell.state(), ShellState::Done);
    let frame = h.renderer.last_frame().unwrap();
    assert!(frame.contains("> abc"), "frame was:\n{}", frame.text());
}

#[test]
fn history_recall_resubmits_previous_line() {
    let h = harness(40, 10);
    type_text(&h.keys, "first");
    press(&h.keys, KeyCode::Enter);
    press(&h.keys, KeyCode::Up);
    press(&h.keys, KeyCode::Enter);

    let mut shell = Shell::new(config());
    let lines = shell
        .run_with(h.backend, |console, _| {
            let a = console.read_line("> ").unwrap();
            let b = console.read_line("> ").unwrap();
            (a, b)
        })
        .unwrap();

    assert_eq!(lines.0.as_deref(), Some("first"));
    assert_eq!(lines.1.as_deref(), Some("first"));
}

#[test]
fn one_line_wakes_exactly_one_reader() {
    let h = harness(40, 10);
    type_text(&h.keys, "x");
    press(&h.keys, KeyCode::Enter);

    let (results_tx, results) = mpsc::channel();
    let mut shell = Shell::new(config());
    let first = shell
        .run_with(h.backend, |console, _| {
            for _ in 0..2 {
                let console = Arc::clone(console);
                let tx = results_tx.clone();
                thread::spawn(move || {
                    let _ = tx.send(console.read_line("> "));
                });
            }
            // The other reader stays blocked until shutdown.
            results.recv_timeout(Duration::from_secs(5)).unwrap()
        })
        .unwrap();
    assert_eq!(first.unwrap().as_deref(), Some("x"));

    let second = results.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(matches!(second, Err(ConsoleError::Shutdown)));
}

#[test]
fn read_console_returns_raw_line() {
    let h = harness(40, 10);
    let keys = h.keys.clone();
    let typist = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        type_text(&keys, "hi");
        press(&keys, KeyCode::Enter);
    });

    let mut shell = Shell::new(config());
    let (raw, queued) = shell
        .run_with(h.backend, |console, _| {
            let raw = console.read_console(80);
            let queued = console.read_line_timeout("> ", Duration::from_millis(50));
            (raw, queued)
        })
        .unwrap();
    typist.join().unwrap();

    assert_eq!(raw.unwrap(), "hi\n");
    assert_eq!(queued.unwrap(), None);
}

#[test]
fn read_console_skips_lines_already_read() {
    let h = harness(40, 10);
    type_text(&h.keys, "help");
    press(&h.keys, KeyCode::Enter);

    let mut shell = Shell::new(config());
    let keys = h.keys.clone();
    let (line, raw) = shell
        .run_with(h.backend, move |console, _| {
            let line = console.read_line("> ");
            let typist = thread::spawn(move || {
                thread::sleep(Duration::from_millis(200));
                type_text(&keys, "new");
                press(&keys, KeyCode::Enter);
            });
            let raw = console.read_console(256);
            typist.join().unwrap();
            (line, raw)
        })
        .unwrap();

    assert_eq!(line.unwrap().as_deref(), Some("help"));
    assert_eq!(raw.unwrap(), "new\n");
}

#[test]
fn read_char_after_read_line_waits_for_a_new_key() {
    let h = harness(40, 10);
    type_text(&h.keys, "key");
    press(&h.keys, KeyCode::Enter);

    let mut shell = Shell::new(config());
    let keys = h.keys.clone();
    let (line, ch) = shell
        .run_with(h.backend, move |console, _| {
            let line = console.read_line("> ");
            let typist = thread::spawn(move || {
                thread::sleep(Duration::from_millis(100));
                type_text(&keys, "z");
            });
            let ch = console.read_char(false);
            typist.join().unwrap();
            (line, ch)
        })
        .unwrap();

    assert_eq!(line.unwrap().as_deref(), Some("key"));
    assert_eq!(ch.unwrap(), 'z');
}

// ══════════════════════════════════════════════════════════════════════════
// Output
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn write_text_reaches_the_log() {
    let h = harness(40, 10);
    let mut shell = Shell::new(config());
    let written = shell
        .run_with(h.backend, |console, _| console.write_text("line1\nline2"))
        .unwrap();

    assert_eq!(written, 11);
    let frame = h.renderer.last_frame().unwrap();
    assert!(frame.contains("line1"));
    assert!(frame.contains("line2"));
    drop(h.keys);
}

#[test]
fn long_output_scrolls_to_bottom() {
    let h = harness(20, 5);
    let mut shell = Shell::new(config());
    shell
        .run_with(h.backend, |console, _| {
            for i in 0..50 {
                console.write_text(&format!("row {i}\n"));
            }
        })
        .unwrap();

    let frame = h.renderer.last_frame().unwrap();
    assert!(frame.contains("row 49"));
    assert!(!frame.rows.iter().any(|r| r.trim_end() == "row 0"));
    drop(h.keys);
}

// ══════════════════════════════════════════════════════════════════════════
// Shutdown
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn closing_the_window_wakes_readers() {
    let h = harness(40, 10);
    h.keys.send(ctrl_q()).unwrap();

    let mut shell = Shell::new(config());
    let (line, ch, closed) = shell
        .run_with(h.backend, |console, _| {
            let line = console.read_line("> ");
            let ch = console.read_char(false);
            (line, ch, console.signals().closed.is_set())
        })
        .unwrap();

    assert!(matches!(line, Err(ConsoleError::Shutdown)));
    assert!(matches!(ch, Err(ConsoleError::Shutdown)));
    assert!(closed);
    assert_eq!(shell.state(), ShellState::Done);
}

#[test]
fn dropped_feeder_closes_the_window() {
    let h = harness(40, 10);
    drop(h.keys);

    let mut shell = Shell::new(config());
    let result = shell
        .run_with(h.backend, |console: &Arc<ConsoleSession>, _| {
            console.read_line("> ")
        })
        .unwrap();
    assert!(result.unwrap_err().is_shutdown());
}

#[test]
fn linger_waits_for_the_user() {
    let h = harness(40, 10);
    let keys = h.keys.clone();
    let closer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        keys.send(ctrl_q()).unwrap();
    });

    let mut shell = Shell::new(config().with_linger(true));
    shell
        .run_with(h.backend, |console, _| {
            console.write_text("done\n");
        })
        .unwrap();
    closer.join().unwrap();

    assert_eq!(shell.state(), ShellState::Done);
    assert!(h.renderer.frame_count() > 0);
    assert!(h.renderer.last_frame().unwrap().contains("done"));
}
