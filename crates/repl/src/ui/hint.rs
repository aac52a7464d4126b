//! Signature hint shown while the cursor is inside a call.

use crate::signature::Signature;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

pub struct SignatureHint<'a> {
    signature: &'a Signature,
    active: Option<usize>,
}

impl<'a> SignatureHint<'a> {
    pub fn new(signature: &'a Signature, arg_index: usize) -> Self {
        Self {
            signature,
            active: signature.active_param(arg_index),
        }
    }

    pub fn line(&self) -> Line<'a> {
        let plain = Style::default().fg(Color::DarkGray);
        let active = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);

        let mut spans = vec![
            Span::styled(self.signature.name.as_str(), plain),
            Span::styled("(", plain),
        ];
        for (i, param) in self.signature.params.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(", ", plain));
            }
            let style = if self.active == Some(i) { active } else { plain };
            spans.push(Span::styled(param.as_str(), style));
        }
        spans.push(Span::styled(")", plain));
        Line::from(spans)
    }
}

impl Widget for &SignatureHint<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_line(area.x, area.y, &self.line(), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlighted(hint: &SignatureHint<'_>) -> Vec<String> {
        hint.line()
            .spans
            .iter()
            .filter(|s| s.style.fg == Some(Color::Yellow))
            .map(|s| s.content.to_string())
            .collect()
    }

    #[test]
    fn test_renders_display_text() {
        let sig = Signature::new("add", vec!["a".into(), "b".into()]);
        let line = SignatureHint::new(&sig, 1).line();
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, sig.display);
    }

    #[test]
    fn test_active_parameter() {
        let sig = Signature::new("join", vec!["array".into(), "separator".into()]);
        assert_eq!(highlighted(&SignatureHint::new(&sig, 0)), vec!["array"]);
        assert_eq!(highlighted(&SignatureHint::new(&sig, 1)), vec!["separator"]);
        assert!(highlighted(&SignatureHint::new(&sig, 2)).is_empty());
    }

    #[test]
    fn test_variadic_stays_active() {
        let sig = Signature::new("concat", vec!["...parts".into()]);
        assert_eq!(highlighted(&SignatureHint::new(&sig, 3)), vec!["...parts"]);
    }
}
