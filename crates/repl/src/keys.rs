//! Key conversion from crossterm to line-edit.

use crossterm::event::{KeyCode as CtKeyCode, KeyEvent, KeyModifiers};
use line_edit::{Key, KeyCode};

/// Convert a crossterm key event; keys the session has no use for map to `None`.
pub fn convert_key(event: KeyEvent) -> Option<Key> {
    let code = match event.code {
        CtKeyCode::Char(c) => KeyCode::Char(c),
        CtKeyCode::Esc => KeyCode::Escape,
        CtKeyCode::Backspace => KeyCode::Backspace,
        CtKeyCode::Delete => KeyCode::Delete,
        CtKeyCode::Left => KeyCode::Left,
        CtKeyCode::Right => KeyCode::Right,
        CtKeyCode::Up => KeyCode::Up,
        CtKeyCode::Down => KeyCode::Down,
        CtKeyCode::Home => KeyCode::Home,
        CtKeyCode::End => KeyCode::End,
        CtKeyCode::Tab if event.modifiers.contains(KeyModifiers::SHIFT) => KeyCode::BackTab,
        CtKeyCode::Tab => KeyCode::Tab,
        CtKeyCode::BackTab => KeyCode::BackTab,
        CtKeyCode::Enter => KeyCode::Enter,
        _ => return None,
    };

    Some(Key {
        code,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_carry_over() {
        let event = KeyEvent::new(CtKeyCode::Up, KeyModifiers::CONTROL | KeyModifiers::ALT);
        assert_eq!(convert_key(event), Some(Key::code(KeyCode::Up).ctrl().alt()));
    }

    #[test]
    fn test_shift_tab_is_backtab() {
        let event = KeyEvent::new(CtKeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(convert_key(event).map(|k| k.code), Some(KeyCode::BackTab));
    }

    #[test]
    fn test_unmapped_keys_are_dropped() {
        let event = KeyEvent::new(CtKeyCode::F(5), KeyModifiers::NONE);
        assert_eq!(convert_key(event), None);
    }
}
