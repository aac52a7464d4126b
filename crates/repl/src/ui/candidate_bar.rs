//! One-line candidate strip that scrolls to keep the selection visible.

use crate::matcher::Match;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

pub const SEPARATOR: &str = "  ";
pub const LEFT_INDICATOR: &str = "< ";
pub const RIGHT_INDICATOR: &str = " >";
const CALL_SUFFIX: &str = "()";

/// Inclusive range of entries that fit the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

fn span_width(widths: &[usize]) -> usize {
    widths.iter().sum::<usize>() + SEPARATOR.width() * widths.len().saturating_sub(1)
}

/// Pick the visible entries for `widths` so that `selected` is shown.
pub fn window(widths: &[usize], selected: usize, budget: usize) -> Window {
    let Some(last) = widths.len().checked_sub(1) else {
        return Window { start: 0, end: 0 };
    };
    if span_width(widths) <= budget {
        return Window { start: 0, end: last };
    }

    let selected = selected.min(last);
    let left = LEFT_INDICATOR.width();
    let right = RIGHT_INDICATOR.width();
    let sep = SEPARATOR.width();

    let start = (0..=selected)
        .find(|&s| {
            let left_cost = if s > 0 { left } else { 0 };
            let right_cost = if selected < last { right } else { 0 };
            span_width(&widths[s..=selected]) + left_cost + right_cost <= budget
        })
        .unwrap_or(selected);

    let remaining = budget.saturating_sub(if start > 0 { left } else { 0 });
    let mut used = 0;
    let mut end = start;
    for (i, width) in widths.iter().enumerate().skip(start) {
        let need = width + if i > start { sep } else { 0 };
        let reserve = if i < last { right } else { 0 };
        if used + need + reserve > remaining {
            break;
        }
        used += need;
        end = i;
    }

    Window { start, end }
}

/// Display width of a rendered entry.
pub fn entry_width(m: &Match) -> usize {
    let suffix = if m.candidate.callable {
        CALL_SUFFIX.width()
    } else {
        0
    };
    m.name().width() + suffix
}

pub struct CandidateBar<'a> {
    matches: &'a [Match],
    selected: Option<usize>,
    budget: Option<usize>,
}

impl<'a> CandidateBar<'a> {
    pub fn new(matches: &'a [Match]) -> Self {
        Self {
            matches,
            selected: None,
            budget: None,
        }
    }

    /// Highlight the entry being cycled through.
    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    /// Column budget, capped by the render area.
    pub fn budget(mut self, budget: usize) -> Self {
        self.budget = Some(budget);
        self
    }

    fn entry_spans(m: &Match, selected: bool) -> Vec<Span<'static>> {
        let base = if selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        let matched = base
            .fg(if selected { Color::Black } else { Color::Yellow })
            .add_modifier(Modifier::BOLD);

        let mut spans: Vec<Span<'static>> = m
            .name()
            .char_indices()
            .map(|(i, c)| {
                let style = if m.positions.contains(&i) { matched } else { base };
                Span::styled(c.to_string(), style)
            })
            .collect();
        if m.candidate.callable {
            spans.push(Span::styled(CALL_SUFFIX, base.add_modifier(Modifier::DIM)));
        }
        spans
    }

    pub fn line(&self, width: usize) -> Line<'static> {
        let budget = self.budget.map_or(width, |b| b.min(width));
        let widths: Vec<usize> = self.matches.iter().map(entry_width).collect();
        if widths.is_empty() {
            return Line::default();
        }
        let Window { start, end } = window(&widths, self.selected.unwrap_or(0), budget);
        let indicator = Style::default().fg(Color::DarkGray);

        let mut spans = Vec::new();
        if start > 0 {
            spans.push(Span::styled(LEFT_INDICATOR, indicator));
        }
        for i in start..=end {
            if i > start {
                spans.push(Span::raw(SEPARATOR));
            }
            spans.extend(Self::entry_spans(&self.matches[i], self.selected == Some(i)));
        }
        if end < widths.len() - 1 {
            spans.push(Span::styled(RIGHT_INDICATOR, indicator));
        }
        Line::from(spans)
    }
}

impl Widget for &CandidateBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = self.line(area.width as usize);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::{Candidate, CandidateKind};

    fn matches(names: &[&str]) -> Vec<Match> {
        names
            .iter()
            .map(|name| Match {
                candidate: Candidate {
                    name: (*name).to_string(),
                    kind: CandidateKind::Binding,
                    callable: false,
                },
                score: 0,
                positions: Vec::new(),
            })
            .collect()
    }

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_everything_fits() {
        assert_eq!(window(&[3, 3, 3], 2, 13), Window { start: 0, end: 2 });

        let all = matches(&["abc", "def", "ghi"]);
        let line = CandidateBar::new(&all).selected(Some(2)).line(13);
        assert_eq!(text(&line), "abc  def  ghi");
    }

    #[test]
    fn test_window_scrolls_to_selection() {
        let widths = [5; 6];
        let w = window(&widths, 4, 20);
        assert!(w.start > 0 && w.start <= 4 && w.end >= 4);
        // left + entries + separators + right
        let used = 2 + span_width(&widths[w.start..=w.end]) + 2;
        assert!(used <= 20);
    }

    #[test]
    fn test_window_at_last_needs_no_right_indicator() {
        let w = window(&[5, 5, 5, 5], 3, 14);
        assert_eq!(w, Window { start: 2, end: 3 });
    }

    #[test]
    fn test_oversized_entry_still_shown() {
        let w = window(&[30, 3], 0, 10);
        assert_eq!(w, Window { start: 0, end: 0 });
    }

    #[test]
    fn test_indicators_and_selection_present() {
        let names = ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot"];
        let all = matches(&names);
        for selected in 0..names.len() {
            let line = CandidateBar::new(&all).selected(Some(selected)).line(24);
            let rendered = text(&line);
            assert!(rendered.contains(names[selected]), "{rendered}");
            assert!(rendered.width() <= 24, "{rendered}");
            assert_eq!(rendered.starts_with(LEFT_INDICATOR), selected >= 3, "{rendered}");
        }
        let first = text(&CandidateBar::new(&all).line(24));
        assert!(first.ends_with(RIGHT_INDICATOR));
    }

    #[test]
    fn test_callable_suffix_and_highlight() {
        let mut all = matches(&["add"]);
        all[0].candidate.callable = true;
        all[0].positions = vec![0];
        let bar = CandidateBar::new(&all);
        let line = bar.line(20);
        assert_eq!(text(&line), "add()");
        assert_eq!(line.spans[0].style.fg, Some(Color::Yellow));

        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        (&bar).render(area, &mut buf);
        assert_eq!(buf[(3, 0)].symbol(), "(");
    }
}
