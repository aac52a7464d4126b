//! Transcript and input line.
//!
//! Past submissions with their results scroll above the live input, which
//! always sits on the last line with a block cursor.

use crate::history::Mode;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

pub const EVAL_PROMPT: &str = "tether> ";
pub const COMMAND_PROMPT: &str = "tether: ";

pub fn prompt(mode: Mode) -> &'static str {
    match mode {
        Mode::Eval => EVAL_PROMPT,
        Mode::Ctrl => COMMAND_PROMPT,
    }
}

/// One submission and what came back, or a standalone note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// The submitted line with the mode it ran in. Notes have none.
    pub input: Option<(Mode, String)>,
    pub output: Option<String>,
    pub is_error: bool,
}

impl TranscriptEntry {
    pub fn new(mode: Mode, input: impl Into<String>) -> Self {
        Self {
            input: Some((mode, input.into())),
            output: None,
            is_error: false,
        }
    }

    /// A message not tied to any input.
    pub fn note(text: impl Into<String>) -> Self {
        Self {
            input: None,
            output: Some(text.into()),
            is_error: false,
        }
    }

    /// An error not tied to any input.
    pub fn error(text: impl Into<String>) -> Self {
        Self::note(text).with_error_flag()
    }

    fn with_error_flag(mut self) -> Self {
        self.is_error = true;
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.output = Some(error.into());
        self.is_error = true;
        self
    }
}

pub struct TranscriptPane<'a> {
    entries: &'a [TranscriptEntry],
    mode: Mode,
    input: &'a str,
    cursor: usize,
}

impl<'a> TranscriptPane<'a> {
    pub fn new(entries: &'a [TranscriptEntry], mode: Mode, input: &'a str, cursor: usize) -> Self {
        Self {
            entries,
            mode,
            input,
            cursor,
        }
    }

    fn prompt_span(mode: Mode) -> Span<'static> {
        let color = match mode {
            Mode::Eval => Color::Green,
            Mode::Ctrl => Color::Yellow,
        };
        Span::styled(prompt(mode), Style::default().fg(color))
    }

    fn build_lines(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();

        for entry in self.entries {
            if let Some((mode, input)) = &entry.input {
                lines.push(Line::from(vec![
                    Self::prompt_span(*mode),
                    Span::raw(input.clone()),
                ]));
            }
            if let Some(output) = &entry.output {
                let style = if entry.is_error {
                    Style::default().fg(Color::Red)
                } else if entry.input.is_none() {
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC)
                } else {
                    Style::default().fg(Color::White)
                };
                for line in output.lines() {
                    lines.push(Line::from(Span::styled(format!("  {}", line), style)));
                }
            }
        }

        let mut spans = vec![Self::prompt_span(self.mode)];
        let cursor = self.cursor.min(self.input.len());
        let (before, after) = self.input.split_at(cursor);
        if !before.is_empty() {
            spans.push(Span::raw(before));
        }
        let cursor_len = after.chars().next().map_or(0, char::len_utf8);
        let cursor_char = if cursor_len == 0 { " " } else { &after[..cursor_len] };
        spans.push(Span::styled(
            cursor_char,
            Style::default().bg(Color::White).fg(Color::Black),
        ));
        if after.len() > cursor_len {
            spans.push(Span::raw(&after[cursor_len..]));
        }
        lines.push(Line::from(spans));

        lines
    }
}

impl Widget for &TranscriptPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self.build_lines();

        // Scroll so the input line stays visible
        let width = area.width.max(1) as usize;
        let wrapped_height: u16 = lines
            .iter()
            .map(|line| {
                let line_width: usize = line.spans.iter().map(|s| s.content.width()).sum();
                line_width.max(1).div_ceil(width) as u16
            })
            .sum();
        let scroll = wrapped_height.saturating_sub(area.height);

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn test_entry_builders() {
        let entry = TranscriptEntry::new(Mode::Eval, "add(1, 2)").with_output("3");
        assert_eq!(entry.output.as_deref(), Some("3"));
        assert!(!entry.is_error);

        let error = TranscriptEntry::new(Mode::Eval, "nope").with_error("unknown name `nope`");
        assert!(error.is_error);

        assert!(TranscriptEntry::note("bindings updated").input.is_none());
    }

    #[test]
    fn test_render_entries_and_input() {
        let entries = vec![
            TranscriptEntry::new(Mode::Eval, "add(1, 2)").with_output("3"),
            TranscriptEntry::new(Mode::Ctrl, "bogus").with_error("unknown command"),
        ];
        let pane = TranscriptPane::new(&entries, Mode::Eval, "gree", 4);
        let area = Rect::new(0, 0, 40, 6);
        let mut buf = Buffer::empty(area);
        (&pane).render(area, &mut buf);

        assert_eq!(row(&buf, 0), "tether> add(1, 2)");
        assert_eq!(row(&buf, 1), "  3");
        assert_eq!(row(&buf, 2), "tether: bogus");
        assert_eq!(row(&buf, 3), "  unknown command");
        assert_eq!(row(&buf, 4), "tether> gree");
        assert_eq!(buf[(4, 3)].fg, Color::Red);
        assert_eq!(buf[(12, 4)].bg, Color::White);
    }

    #[test]
    fn test_input_stays_visible_when_scrolled() {
        let entries: Vec<_> = (0..10)
            .map(|i| TranscriptEntry::new(Mode::Eval, i.to_string()).with_output(i.to_string()))
            .collect();
        let pane = TranscriptPane::new(&entries, Mode::Ctrl, "li", 2);
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        (&pane).render(area, &mut buf);
        assert_eq!(row(&buf, 2), "tether: li");
    }
}
