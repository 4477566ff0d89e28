//! Input handling
//!
//! Translates terminal events into the vocabulary the overlay understands:
//! editing actions for the prompt and panel inputs, plus pointer gestures
//! for region drags and outside-click detection.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

/// Processed keyboard action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Regular character input
    Char(char),
    /// Enter without a modifier: submit
    Submit,
    /// Enter with a modifier held: insert a newline instead
    Newline,
    /// Backspace
    Backspace,
    /// Delete
    Delete,
    /// Move cursor left
    Left,
    /// Move cursor right
    Right,
    /// Move to start of line
    Home,
    /// Move to end of line
    End,
    /// Escape (dismiss menu, cancel drag)
    Escape,
    /// Ctrl+U (clear line)
    ClearLine,
    /// Ctrl+W (delete word)
    DeleteWord,
    /// Paste (from clipboard or bracketed paste)
    Paste(String),
    /// Quit the host
    Quit,
    /// Unknown/unhandled
    Unknown,
}

/// A pointer gesture at a cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// Right button pressed: selection menu or start of a region drag
    RightDown,
    /// Pointer moved with the right button held
    RightDrag,
    /// Right button released: region finished
    RightUp,
    /// Left button pressed: open, dismiss, or outside-click
    LeftDown,
}

/// A pointer event in cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pointer {
    pub x: u16,
    pub y: u16,
    pub kind: PointerKind,
}

/// Everything the host loop reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Key(Action),
    Pointer(Pointer),
}

/// Convert a crossterm key event to an action
pub fn key_to_action(event: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') | KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('u') => Action::ClearLine,
            KeyCode::Char('w') => Action::DeleteWord,
            _ => Action::Unknown,
        };
    }

    match code {
        KeyCode::Enter => {
            if modifiers.contains(KeyModifiers::SHIFT) || modifiers.contains(KeyModifiers::ALT) {
                Action::Newline
            } else {
                Action::Submit
            }
        }
        KeyCode::Char(c) => Action::Char(c),
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Delete => Action::Delete,
        KeyCode::Left => Action::Left,
        KeyCode::Right => Action::Right,
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        KeyCode::Esc => Action::Escape,
        _ => Action::Unknown,
    }
}

/// Convert a crossterm mouse event to a pointer gesture, if it is one the
/// overlay cares about
pub fn mouse_to_pointer(event: MouseEvent) -> Option<Pointer> {
    let kind = match event.kind {
        MouseEventKind::Down(MouseButton::Right) => PointerKind::RightDown,
        MouseEventKind::Drag(MouseButton::Right) => PointerKind::RightDrag,
        MouseEventKind::Up(MouseButton::Right) => PointerKind::RightUp,
        MouseEventKind::Down(MouseButton::Left) => PointerKind::LeftDown,
        _ => return None,
    };
    Some(Pointer {
        x: event.column,
        y: event.row,
        kind,
    })
}

/// Convert any terminal event into a UI event, if relevant
pub fn event_to_ui_event(event: Event) -> Option<UiEvent> {
    match event {
        Event::Key(key) => Some(UiEvent::Key(key_to_action(key))),
        Event::Paste(text) => Some(UiEvent::Key(Action::Paste(text))),
        Event::Mouse(mouse) => mouse_to_pointer(mouse).map(UiEvent::Pointer),
        _ => None,
    }
}
