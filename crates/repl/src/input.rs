//! The single-line input: owned text plus a readline editor.

use line_edit::{Action, Key, LineEditor, ReadlineEditor, TextEdit};

/// How a key changed the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    None,
    Moved,
    Inserted,
    Deleted,
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    value: String,
    editor: ReadlineEditor,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.editor.cursor()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Replace the text and place the cursor (clamped to a char boundary).
    pub fn set(&mut self, value: impl Into<String>, cursor: usize) {
        self.value = value.into();
        self.editor.set_cursor(cursor, &self.value);
    }

    /// Replace the text with the cursor at its end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        let end = value.len();
        self.set(value, end);
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.editor.reset();
    }

    /// Replace `start..end` and leave the cursor after the replacement.
    pub fn replace_range(&mut self, start: usize, end: usize, text: &str) {
        self.value.replace_range(start..end, text);
        let cursor = start + text.len();
        self.editor.set_cursor(cursor, &self.value);
    }

    /// Feed a key to the editor and apply the resulting edits.
    pub fn handle_key(&mut self, key: Key) -> (Change, Option<Action>) {
        let before = self.editor.cursor();
        let result = self.editor.handle_key(key, &self.value);
        let mut change = Change::None;
        for edit in &result.edits {
            change = match edit {
                TextEdit::Insert { .. } => Change::Inserted,
                TextEdit::Delete { .. } => Change::Deleted,
            };
            edit.apply(&mut self.value);
        }
        if change == Change::None && self.editor.cursor() != before {
            change = Change::Moved;
        }
        (change, result.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use line_edit::KeyCode;

    #[test]
    fn test_typing_reports_insert() {
        let mut input = InputState::new();
        assert_eq!(input.handle_key(Key::char('a')), (Change::Inserted, None));
        assert_eq!(input.value(), "a");
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    fn test_backspace_and_motion() {
        let mut input = InputState::new();
        input.set_value("abc");
        assert_eq!(
            input.handle_key(Key::code(KeyCode::Backspace)),
            (Change::Deleted, None)
        );
        assert_eq!(input.handle_key(Key::code(KeyCode::Home)), (Change::Moved, None));
        assert_eq!(input.handle_key(Key::code(KeyCode::Home)), (Change::None, None));
        assert_eq!(input.value(), "ab");
    }

    #[test]
    fn test_actions_pass_through() {
        let mut input = InputState::new();
        assert_eq!(
            input.handle_key(Key::code(KeyCode::Enter)),
            (Change::None, Some(Action::Submit))
        );
    }

    #[test]
    fn test_replace_range_moves_cursor() {
        let mut input = InputState::new();
        input.set("nested.mu + 1", 9);
        input.replace_range(7, 9, "multiply");
        assert_eq!(input.value(), "nested.multiply + 1");
        assert_eq!(input.cursor(), 15);
    }
}
