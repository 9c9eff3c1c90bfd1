#![forbid(unsafe_code)]

//! The facade exposes everything a program needs to run headlessly.

use std::time::Duration;

use vcon::prelude::*;
use vcon::{Event, HeadlessEventSource, HeadlessRenderer, KeyCode};

#[test]
fn prelude_runs_a_headless_session() {
    let (source, keys) = HeadlessEventSource::channel(60, 12);
    let renderer = HeadlessRenderer::new();
    let recorded = renderer.clone();
    for c in "hello".chars() {
        keys.send(Event::key(KeyCode::Char(c))).unwrap();
    }
    keys.send(Event::key(KeyCode::Enter)).unwrap();

    let config = ConsoleConfig::default().with_poll_timeout(Duration::from_millis(5));
    let mut shell = Shell::new(config).with_command_line("demo", r#"one "two three""#);
    let (line, args) = shell
        .run_with(
            move |_| Ok((source, renderer)),
            |console, args| (console.read_line("$ "), args.to_vec()),
        )
        .unwrap();

    assert_eq!(line.unwrap().as_deref(), Some("hello"));
    assert_eq!(args, ["demo", "one", "two three"]);
    assert!(recorded.last_frame().unwrap().contains("$ hello"));
    drop(keys);
}

#[test]
fn console_error_converts_into_facade_error() {
    let err: vcon::Error = ConsoleError::Shutdown.into();
    assert!(matches!(err, vcon::Error::Console(ConsoleError::Shutdown)));
    assert!(std::error::Error::source(&err).is_some());
}
