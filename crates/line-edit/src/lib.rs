//! line-edit: a single-line editor for TUI prompts
//!
//! The editor interprets keys and tracks the cursor; the host owns the text
//! and applies the returned [`TextEdit`]s. Nothing here knows about terminals
//! or rendering.
//!
//! # Example
//!
//! ```
//! use line_edit::{Key, KeyCode, LineEditor, ReadlineEditor};
//!
//! let mut editor = ReadlineEditor::new();
//! let mut text = String::from("hello world");
//! editor.set_cursor(text.len(), &text);
//!
//! // Ctrl+W kills the word before the cursor
//! let result = editor.handle_key(Key::char('w').ctrl(), &text);
//! for edit in &result.edits {
//!     edit.apply(&mut text);
//! }
//! assert_eq!(text, "hello ");
//! ```

mod readline;

pub use readline::ReadlineEditor;

/// The contract between a line editor and its host application.
pub trait LineEditor {
    /// Process a key event, returning edits to apply and any action requested.
    ///
    /// `text` is the current content. The editor reads it to compute motions
    /// but never modifies it.
    fn handle_key(&mut self, key: Key, text: &str) -> EditResult;

    /// Current cursor position as a byte offset into the text.
    fn cursor(&self) -> usize;

    /// Reset editor state after submitting or clearing input.
    fn reset(&mut self);

    /// Set cursor position, clamped to a char boundary within text.
    fn set_cursor(&mut self, pos: usize, text: &str);
}

/// Result of processing a key event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditResult {
    /// Text mutations to apply, in order.
    pub edits: Vec<TextEdit>,
    /// Action requested by the editor.
    pub action: Option<Action>,
}

impl EditResult {
    /// No change.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn action(action: Action) -> Self {
        Self {
            action: Some(action),
            ..Default::default()
        }
    }

    pub fn edit(edit: TextEdit) -> Self {
        Self {
            edits: vec![edit],
            ..Default::default()
        }
    }
}

/// Actions the editor can request from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Submit the current input.
    Submit,
    /// Abandon the current input.
    Cancel,
}

/// A single text mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEdit {
    /// Delete text in the given byte range.
    Delete { start: usize, end: usize },
    /// Insert text at the given byte position.
    Insert { at: usize, text: String },
}

impl TextEdit {
    /// Apply this edit to a string.
    pub fn apply(&self, s: &mut String) {
        match self {
            TextEdit::Delete { start, end } => {
                s.replace_range(*start..*end, "");
            }
            TextEdit::Insert { at, text } => {
                s.insert_str(*at, text);
            }
        }
    }
}

/// A key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub code: KeyCode,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Key {
    /// A plain character key.
    pub fn char(c: char) -> Self {
        Self::code(KeyCode::Char(c))
    }

    /// A key with just a code (no modifiers).
    pub fn code(code: KeyCode) -> Self {
        Self {
            code,
            ctrl: false,
            alt: false,
            shift: false,
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// True when no modifier is held (shift is ignored for characters).
    pub fn is_plain(&self) -> bool {
        !self.ctrl && !self.alt
    }
}

/// Key codes for non-character keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Escape,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Tab,
    BackTab,
    Enter,
}
