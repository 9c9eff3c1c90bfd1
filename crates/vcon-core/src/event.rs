#![forbid(unsafe_code)]

//! Console input events.
//!
//! The console window reacts to a small vocabulary: key presses, resizes,
//! scroll requests, pastes and the close request. Terminal events from
//! Crossterm are mapped into this vocabulary by [`Event::from_crossterm`];
//! anything the console has no use for maps to `None`.
//!
//! # Design Notes
//!
//! - `KeyEventKind` defaults to `Press` when the terminal does not report it
//! - Mouse wheel motion becomes [`ScrollAction::LineUp`]/[`ScrollAction::LineDown`]
//! - [`Event::Close`] is synthesized (Ctrl+Q, termination signals, a dropped
//!   headless feeder); no terminal sends it directly

use bitflags::bitflags;
use crossterm::event as cte;

/// Canonical console event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// The console surface was resized.
    Resize {
        /// New width in columns.
        width: u16,
        /// New height in rows.
        height: u16,
    },

    /// A request to move the scrollback view.
    Scroll(ScrollAction),

    /// Pasted text, delivered as one unit.
    Paste(String),

    /// Focus gained (`true`) or lost (`false`).
    Focus(bool),

    /// The console window is being closed.
    Close,
}

impl Event {
    /// Convert a Crossterm event into a console [`Event`].
    #[must_use]
    pub fn from_crossterm(event: cte::Event) -> Option<Self> {
        match event {
            cte::Event::Key(key) => map_key_event(key).map(Event::Key),
            cte::Event::Mouse(mouse) => map_mouse_event(mouse),
            cte::Event::Resize(width, height) => Some(Event::Resize { width, height }),
            cte::Event::Paste(text) => Some(Event::Paste(text)),
            cte::Event::FocusGained => Some(Event::Focus(true)),
            cte::Event::FocusLost => Some(Event::Focus(false)),
        }
    }

    /// Shorthand for a plain key press.
    #[must_use]
    pub const fn key(code: KeyCode) -> Self {
        Event::Key(KeyEvent::new(code))
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// True for presses and auto-repeats, false for releases.
    #[must_use]
    pub const fn is_down(&self) -> bool {
        !matches!(self.kind, KeyEventKind::Release)
    }
}

/// Key codes the console distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Escape key.
    Escape,
    /// Backspace key.
    Backspace,
    /// Tab key.
    Tab,
    /// Shift+Tab.
    BackTab,
    /// Delete key.
    Delete,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Page Up key.
    PageUp,
    /// Page Down key.
    PageDown,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Function key (F1-F24).
    F(u8),
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Scrollback movement, in the units of a vertical scroll bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollAction {
    /// One line towards the top.
    LineUp,
    /// One line towards the bottom.
    LineDown,
    /// One page towards the top.
    PageUp,
    /// One page towards the bottom.
    PageDown,
    /// Jump so that the given line is the first visible one.
    ThumbTo(usize),
}

fn map_key_event(event: cte::KeyEvent) -> Option<KeyEvent> {
    let code = map_key_code(event.code)?;
    Some(KeyEvent {
        code,
        modifiers: map_modifiers(event.modifiers),
        kind: map_key_kind(event.kind),
    })
}

fn map_key_kind(kind: cte::KeyEventKind) -> KeyEventKind {
    match kind {
        cte::KeyEventKind::Press => KeyEventKind::Press,
        cte::KeyEventKind::Repeat => KeyEventKind::Repeat,
        cte::KeyEventKind::Release => KeyEventKind::Release,
    }
}

fn map_key_code(code: cte::KeyCode) -> Option<KeyCode> {
    match code {
        cte::KeyCode::Backspace => Some(KeyCode::Backspace),
        cte::KeyCode::Enter => Some(KeyCode::Enter),
        cte::KeyCode::Left => Some(KeyCode::Left),
        cte::KeyCode::Right => Some(KeyCode::Right),
        cte::KeyCode::Up => Some(KeyCode::Up),
        cte::KeyCode::Down => Some(KeyCode::Down),
        cte::KeyCode::Home => Some(KeyCode::Home),
        cte::KeyCode::End => Some(KeyCode::End),
        cte::KeyCode::PageUp => Some(KeyCode::PageUp),
        cte::KeyCode::PageDown => Some(KeyCode::PageDown),
        cte::KeyCode::Tab => Some(KeyCode::Tab),
        cte::KeyCode::BackTab => Some(KeyCode::BackTab),
        cte::KeyCode::Delete => Some(KeyCode::Delete),
        cte::KeyCode::F(n) => Some(KeyCode::F(n)),
        cte::KeyCode::Char(c) => Some(KeyCode::Char(c)),
        cte::KeyCode::Esc => Some(KeyCode::Escape),
        _ => None,
    }
}

fn map_modifiers(modifiers: cte::KeyModifiers) -> Modifiers {
    let mut mapped = Modifiers::NONE;
    if modifiers.contains(cte::KeyModifiers::SHIFT) {
        mapped |= Modifiers::SHIFT;
    }
    if modifiers.contains(cte::KeyModifiers::ALT) {
        mapped |= Modifiers::ALT;
    }
    if modifiers.contains(cte::KeyModifiers::CONTROL) {
        mapped |= Modifiers::CTRL;
    }
    if modifiers.contains(cte::KeyModifiers::SUPER)
        || modifiers.contains(cte::KeyModifiers::HYPER)
        || modifiers.contains(cte::KeyModifiers::META)
    {
        mapped |= Modifiers::SUPER;
    }
    mapped
}

fn map_mouse_event(event: cte::MouseEvent) -> Option<Event> {
    match event.kind {
        cte::MouseEventKind::ScrollUp => Some(Event::Scroll(ScrollAction::LineUp)),
        cte::MouseEventKind::ScrollDown => Some(Event::Scroll(ScrollAction::LineDown)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ct_key(code: cte::KeyCode, modifiers: cte::KeyModifiers) -> cte::Event {
        cte::Event::Key(cte::KeyEvent::new(code, modifiers))
    }

    #[test]
    fn maps_plain_char() {
        let event = Event::from_crossterm(ct_key(cte::KeyCode::Char('a'), cte::KeyModifiers::NONE));
        assert_eq!(event, Some(Event::key(KeyCode::Char('a'))));
    }

    #[test]
    fn maps_ctrl_modifier() {
        let event = Event::from_crossterm(ct_key(
            cte::KeyCode::Char('q'),
            cte::KeyModifiers::CONTROL,
        ));
        match event {
            Some(Event::Key(key)) => {
                assert!(key.ctrl());
                assert!(!key.shift());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn maps_super_variants() {
        for m in [
            cte::KeyModifiers::SUPER,
            cte::KeyModifiers::HYPER,
            cte::KeyModifiers::META,
        ] {
            assert_eq!(map_modifiers(m), Modifiers::SUPER);
        }
    }

    #[test]
    fn esc_maps_to_escape() {
        assert_eq!(map_key_code(cte::KeyCode::Esc), Some(KeyCode::Escape));
    }

    #[test]
    fn unsupported_key_is_dropped() {
        let event = Event::from_crossterm(ct_key(cte::KeyCode::CapsLock, cte::KeyModifiers::NONE));
        assert_eq!(event, None);
    }

    #[test]
    fn wheel_maps_to_line_scroll() {
        let wheel = |kind| {
            cte::Event::Mouse(cte::MouseEvent {
                kind,
                column: 0,
                row: 0,
                modifiers: cte::KeyModifiers::NONE,
            })
        };
        assert_eq!(
            Event::from_crossterm(wheel(cte::MouseEventKind::ScrollUp)),
            Some(Event::Scroll(ScrollAction::LineUp))
        );
        assert_eq!(
            Event::from_crossterm(wheel(cte::MouseEventKind::ScrollDown)),
            Some(Event::Scroll(ScrollAction::LineDown))
        );
        assert_eq!(
            Event::from_crossterm(wheel(cte::MouseEventKind::Moved)),
            None
        );
    }

    #[test]
    fn resize_and_paste_pass_through() {
        assert_eq!(
            Event::from_crossterm(cte::Event::Resize(80, 24)),
            Some(Event::Resize {
                width: 80,
                height: 24
            })
        );
        assert_eq!(
            Event::from_crossterm(cte::Event::Paste("hi".into())),
            Some(Event::Paste("hi".into()))
        );
    }

    #[test]
    fn release_is_not_down() {
        let key = KeyEvent::new(KeyCode::Enter).with_kind(KeyEventKind::Release);
        assert!(!key.is_down());
        assert!(KeyEvent::new(KeyCode::Enter).is_down());
    }
}
