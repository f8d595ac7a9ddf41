//! Key and mouse bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Logical action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    HardDrop,
    Pause,
    Restart,
    Quit,
    None,
}

/// A key press, split the way the game handles it: character keys and special (arrow) keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(Action),
    Special(Action),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// A mouse button press or release at a terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Click {
    pub button: PointerButton,
    pub pressed: bool,
    pub column: u16,
    pub row: u16,
}

/// Character bindings, case-insensitive: WASD, space, P, R, Q.
pub fn char_action(c: char) -> Action {
    match c.to_ascii_lowercase() {
        'a' => Action::MoveLeft,
        'd' => Action::MoveRight,
        's' => Action::SoftDrop,
        'w' => Action::Rotate,
        ' ' => Action::HardDrop,
        'p' => Action::Pause,
        'r' => Action::Restart,
        'q' => Action::Quit,
        _ => Action::None,
    }
}

/// Arrow keys.
pub fn special_action(code: KeyCode) -> Action {
    match code {
        KeyCode::Left => Action::MoveLeft,
        KeyCode::Right => Action::MoveRight,
        KeyCode::Down => Action::SoftDrop,
        KeyCode::Up => Action::Rotate,
        _ => Action::None,
    }
}

/// Map a key event to character or special input. Esc and Ctrl-C quit like `q`.
pub fn key_to_input(key: KeyEvent) -> KeyInput {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL {
        return match code {
            KeyCode::Char('c') => KeyInput::Char(Action::Quit),
            _ => KeyInput::Char(Action::None),
        };
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return KeyInput::Char(Action::None);
    }
    match code {
        KeyCode::Char(c) => KeyInput::Char(char_action(c)),
        KeyCode::Esc => KeyInput::Char(Action::Quit),
        other => KeyInput::Special(special_action(other)),
    }
}

/// Button presses and releases; drags, moves and scrolls are dropped.
pub fn mouse_to_click(event: MouseEvent) -> Option<Click> {
    let (button, pressed) = match event.kind {
        MouseEventKind::Down(b) => (b, true),
        MouseEventKind::Up(b) => (b, false),
        _ => return None,
    };
    let button = match button {
        MouseButton::Left => PointerButton::Left,
        MouseButton::Right => PointerButton::Right,
        MouseButton::Middle => PointerButton::Middle,
    };
    Some(Click {
        button,
        pressed,
        column: event.column,
        row: event.row,
    })
}
