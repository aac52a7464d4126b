//! Screen layout: transcript on top, then the candidate bar and status line.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use unicode_width::UnicodeWidthStr;

/// The computed layout areas
#[derive(Debug, Clone, Copy)]
pub struct ComputedLayout {
    pub transcript: Rect,
    /// Candidates or the signature hint.
    pub bar: Rect,
    pub status: Rect,
}

impl ComputedLayout {
    pub fn compute(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        Self {
            transcript: chunks[0],
            bar: chunks[1],
            status: chunks[2],
        }
    }
}

/// Status bar content
#[derive(Debug, Clone, Default)]
pub struct StatusContent {
    pub filename: String,
    pub mode: String,
    pub message: Option<String>,
}

impl StatusContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filename(mut self, name: impl Into<String>) -> Self {
        self.filename = name.into();
        self
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Format for display: filename left, message centered, mode right.
    pub fn format(&self, width: u16) -> String {
        let left = format!(" {} ", self.filename);
        let middle = self.message.clone().unwrap_or_default();
        let right = format!(" {} ", self.mode);

        let padding_needed = (width as usize)
            .saturating_sub(left.width())
            .saturating_sub(middle.width())
            .saturating_sub(right.width());

        let left_pad = padding_needed / 2;
        let right_pad = padding_needed - left_pad;

        format!(
            "{}{}{}{}{}",
            left,
            " ".repeat(left_pad),
            middle,
            " ".repeat(right_pad),
            right
        )
    }
}
