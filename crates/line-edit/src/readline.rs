//! Emacs/readline-style editor implementation.

use crate::{Action, EditResult, Key, KeyCode, LineEditor, TextEdit};

/// A modeless line editor with readline keybindings.
///
/// | Key              | Effect                          |
/// |------------------|---------------------------------|
/// | Ctrl+A / Home    | start of line                   |
/// | Ctrl+E / End     | end of line                     |
/// | Ctrl+B / Left    | back one character              |
/// | Ctrl+F / Right   | forward one character           |
/// | Alt+B / Alt+F    | back / forward one word         |
/// | Ctrl+K           | kill to end of line             |
/// | Ctrl+U           | kill to start of line           |
/// | Ctrl+W           | kill previous word              |
/// | Ctrl+Y           | yank last kill                  |
/// | Ctrl+D           | delete forward                  |
///
/// History keys (Up, Down, Ctrl+P, Ctrl+N) are left to the host.
#[derive(Debug, Clone, Default)]
pub struct ReadlineEditor {
    cursor: usize,
    /// Last killed text (for Ctrl+Y).
    kill_buffer: String,
}

impl ReadlineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    fn prev_boundary(&self, text: &str) -> usize {
        let mut pos = self.cursor.saturating_sub(1);
        while pos > 0 && !text.is_char_boundary(pos) {
            pos -= 1;
        }
        pos
    }

    fn next_boundary(&self, text: &str) -> usize {
        let mut pos = (self.cursor + 1).min(text.len());
        while pos < text.len() && !text.is_char_boundary(pos) {
            pos += 1;
        }
        pos
    }

    /// Start of the word before the cursor.
    fn word_start_before(&self, text: &str) -> usize {
        let head = &text[..self.cursor];
        let trimmed = head.trim_end_matches(|c: char| !c.is_alphanumeric());
        trimmed
            .rfind(|c: char| !c.is_alphanumeric())
            .map(|i| i + trimmed[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0)
    }

    /// End of the word after the cursor.
    fn word_end_after(&self, text: &str) -> usize {
        let tail = &text[self.cursor..];
        let skip = tail
            .find(|c: char| c.is_alphanumeric())
            .unwrap_or(tail.len());
        let rest = &tail[skip..];
        let word = rest
            .find(|c: char| !c.is_alphanumeric())
            .unwrap_or(rest.len());
        self.cursor + skip + word
    }

    /// Start of the whitespace-delimited word before the cursor (Ctrl+W).
    fn big_word_start_before(&self, text: &str) -> usize {
        let head = text[..self.cursor].trim_end();
        head.rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    fn kill(&mut self, start: usize, end: usize, text: &str) -> EditResult {
        if start >= end {
            return EditResult::none();
        }
        self.kill_buffer = text[start..end].to_string();
        self.cursor = start;
        EditResult::edit(TextEdit::Delete { start, end })
    }

    fn insert(&mut self, s: String) -> EditResult {
        let at = self.cursor;
        self.cursor += s.len();
        EditResult::edit(TextEdit::Insert { at, text: s })
    }

    fn handle_ctrl(&mut self, c: char, text: &str) -> EditResult {
        match c {
            'a' => self.cursor = 0,
            'e' => self.cursor = text.len(),
            'b' => self.cursor = self.prev_boundary(text),
            'f' => self.cursor = self.next_boundary(text),
            'k' => return self.kill(self.cursor, text.len(), text),
            'u' => return self.kill(0, self.cursor, text),
            'w' => return self.kill(self.big_word_start_before(text), self.cursor, text),
            'y' if !self.kill_buffer.is_empty() => return self.insert(self.kill_buffer.clone()),
            'd' => return self.delete_forward(text),
            'c' => return EditResult::action(Action::Cancel),
            _ => {}
        }
        EditResult::none()
    }

    fn delete_forward(&mut self, text: &str) -> EditResult {
        if self.cursor >= text.len() {
            return EditResult::none();
        }
        let end = self.next_boundary(text);
        EditResult::edit(TextEdit::Delete {
            start: self.cursor,
            end,
        })
    }
}

impl LineEditor for ReadlineEditor {
    fn handle_key(&mut self, key: Key, text: &str) -> EditResult {
        self.cursor = self.cursor.min(text.len());

        match key.code {
            KeyCode::Char(c) if key.ctrl => self.handle_ctrl(c, text),
            KeyCode::Char('b') if key.alt => {
                self.cursor = self.word_start_before(text);
                EditResult::none()
            }
            KeyCode::Char('f') if key.alt => {
                self.cursor = self.word_end_after(text);
                EditResult::none()
            }
            KeyCode::Char('d') if key.alt => {
                let end = self.word_end_after(text);
                self.kill(self.cursor, end, text)
            }
            KeyCode::Char(c) if !key.alt => self.insert(c.to_string()),
            KeyCode::Backspace if key.alt => {
                self.kill(self.word_start_before(text), self.cursor, text)
            }
            KeyCode::Backspace => {
                if self.cursor == 0 {
                    return EditResult::none();
                }
                let start = self.prev_boundary(text);
                let end = self.cursor;
                self.cursor = start;
                EditResult::edit(TextEdit::Delete { start, end })
            }
            KeyCode::Delete => self.delete_forward(text),
            KeyCode::Left if key.ctrl || key.alt => {
                self.cursor = self.word_start_before(text);
                EditResult::none()
            }
            KeyCode::Right if key.ctrl || key.alt => {
                self.cursor = self.word_end_after(text);
                EditResult::none()
            }
            KeyCode::Left => {
                self.cursor = self.prev_boundary(text);
                EditResult::none()
            }
            KeyCode::Right => {
                self.cursor = self.next_boundary(text);
                EditResult::none()
            }
            KeyCode::Home => {
                self.cursor = 0;
                EditResult::none()
            }
            KeyCode::End => {
                self.cursor = text.len();
                EditResult::none()
            }
            KeyCode::Enter => EditResult::action(Action::Submit),
            KeyCode::Escape => EditResult::action(Action::Cancel),
            _ => EditResult::none(),
        }
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn reset(&mut self) {
        self.cursor = 0;
        // Keep the kill buffer across resets
    }

    fn set_cursor(&mut self, pos: usize, text: &str) {
        let mut pos = pos.min(text.len());
        while pos > 0 && !text.is_char_boundary(pos) {
            pos -= 1;
        }
        self.cursor = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(result: &EditResult, text: &mut String) {
        for edit in &result.edits {
            edit.apply(text);
        }
    }

    fn type_str(editor: &mut ReadlineEditor, text: &mut String, s: &str) {
        for c in s.chars() {
            let result = editor.handle_key(Key::char(c), text);
            apply(&result, text);
        }
    }

    #[test]
    fn test_insert_and_cursor() {
        let mut editor = ReadlineEditor::new();
        let mut text = String::new();
        type_str(&mut editor, &mut text, "add(1");
        assert_eq!(text, "add(1");
        assert_eq!(editor.cursor(), 5);

        editor.handle_key(Key::code(KeyCode::Home), &text);
        type_str(&mut editor, &mut text, "x");
        assert_eq!(text, "xadd(1");
        assert_eq!(editor.cursor(), 1);
    }

    #[test]
    fn test_backspace_unicode() {
        let mut editor = ReadlineEditor::new();
        let mut text = String::from("a😀b");
        editor.set_cursor(5, &text);

        let result = editor.handle_key(Key::code(KeyCode::Backspace), &text);
        apply(&result, &mut text);
        assert_eq!(text, "ab");
        assert_eq!(editor.cursor(), 1);
    }

    #[test]
    fn test_set_cursor_clamps_to_boundary() {
        let mut editor = ReadlineEditor::new();
        let text = "a😀";
        editor.set_cursor(3, text);
        assert_eq!(editor.cursor(), 1);
        editor.set_cursor(99, text);
        assert_eq!(editor.cursor(), text.len());
    }

    #[test]
    fn test_kill_and_yank() {
        let mut editor = ReadlineEditor::new();
        let mut text = String::from("nested.multiply(5, 6)");
        editor.set_cursor(15, &text);

        let result = editor.handle_key(Key::char('k').ctrl(), &text);
        apply(&result, &mut text);
        assert_eq!(text, "nested.multiply");

        editor.handle_key(Key::char('a').ctrl(), &text);
        let result = editor.handle_key(Key::char('y').ctrl(), &text);
        apply(&result, &mut text);
        assert_eq!(text, "(5, 6)nested.multiply");
        assert_eq!(editor.cursor(), 6);
    }

    #[test]
    fn test_ctrl_u_kills_to_start() {
        let mut editor = ReadlineEditor::new();
        let mut text = String::from("hello world");
        editor.set_cursor(6, &text);
        let result = editor.handle_key(Key::char('u').ctrl(), &text);
        apply(&result, &mut text);
        assert_eq!(text, "world");
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn test_word_motions() {
        let mut editor = ReadlineEditor::new();
        let text = "nested.multiply(5)";
        editor.set_cursor(text.len(), text);

        editor.handle_key(Key::char('b').alt(), text);
        assert_eq!(editor.cursor(), 16);
        editor.handle_key(Key::char('b').alt(), text);
        assert_eq!(editor.cursor(), 7);
        editor.handle_key(Key::char('f').alt(), text);
        assert_eq!(editor.cursor(), 15);
    }

    #[test]
    fn test_actions() {
        let mut editor = ReadlineEditor::new();
        assert_eq!(
            editor.handle_key(Key::code(KeyCode::Enter), "x").action,
            Some(Action::Submit)
        );
        assert_eq!(
            editor.handle_key(Key::code(KeyCode::Escape), "x"),
            EditResult::action(Action::Cancel)
        );
        assert_eq!(editor.handle_key(Key::code(KeyCode::Up), "x"), EditResult::none());
        assert_eq!(editor.handle_key(Key::char('d').ctrl(), ""), EditResult::none());
    }
}
