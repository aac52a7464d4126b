//! Rendering for the session screen.

pub mod candidate_bar;
pub mod hint;
pub mod layout;
pub mod transcript;

use crate::session::Session;
use candidate_bar::CandidateBar;
use hint::SignatureHint;
use layout::{ComputedLayout, StatusContent};
use ratatui::{
    Frame,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use transcript::TranscriptPane;

pub fn render(frame: &mut Frame, session: &Session) {
    let layout = ComputedLayout::compute(frame.area());

    let input = session.input();
    let pane = TranscriptPane::new(
        session.transcript(),
        session.mode(),
        input.value(),
        input.cursor(),
    );
    frame.render_widget(&pane, layout.transcript);

    if !session.matches().is_empty() {
        let bar = CandidateBar::new(session.matches())
            .selected(session.tab_selected())
            .budget(session.width() as usize);
        frame.render_widget(&bar, layout.bar);
    } else if let Some(call) = session.active_call() {
        let hint = SignatureHint::new(&call.signature, call.arg_index);
        frame.render_widget(&hint, layout.bar);
    }

    let mut status = StatusContent::new()
        .filename(session.source_name())
        .mode(session.mode().name());
    if session.is_alt_navigating() {
        status = status.message("command history");
    }
    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let paragraph = Paragraph::new(Line::from(Span::styled(
        status.format(layout.status.width),
        style,
    )));
    frame.render_widget(paragraph, layout.status);
}
