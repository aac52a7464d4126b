//! tether-repl: an interactive session for Tether bindings
//!
//! The session completes names from the binding tree and both builtin
//! registries, shows call signatures while typing arguments, keeps a
//! mode-tagged history, and hands the bindings to `$EDITOR` on request.
//!
//! [`session::Session`] is a pure state machine; [`run`] drives it on a
//! crossterm terminal.

pub mod call;
pub mod candidates;
pub mod config;
pub mod editor;
pub mod error;
pub mod history;
pub mod input;
pub mod keys;
pub mod matcher;
pub mod session;
pub mod signature;
pub mod ui;
pub mod word;

pub use config::{Config, SourceSpec};
pub use error::{HistoryError, ReplError};
pub use session::{Command, Msg, Session};

use crate::editor::{EditOutcome, EditorCommand, StdioPrompt, edit_loop};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::collections::VecDeque;
use std::io::{self, Stdout, stdout};
use std::time::Duration;
use tether_lang::Engine;
use tracing::info;

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Load and validate the program, open history, and build the session.
pub fn start_session(config: &Config, width: u16) -> Result<Session, ReplError> {
    let (name, src) = config.load_source()?;
    let engine = Engine::from_source(&src)?;
    engine.validate()?;
    let history = config.open_history();
    info!(
        source = %name,
        bindings = engine.document().root.entries.len(),
        history = history.len(),
        "session started"
    );
    Ok(Session::new(engine, history, name, width))
}

/// Run an interactive session until the user quits.
pub fn run(config: Config) -> Result<(), ReplError> {
    // Startup errors are reported before the terminal changes mode
    let mut session = start_session(&config, 80)?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = terminal
        .size()
        .map_err(ReplError::from)
        .and_then(|size| {
            session.update(Msg::Resize(size.width));
            run_app(&mut terminal, &mut session)
        });

    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();

    result
}

fn run_app(terminal: &mut Term, session: &mut Session) -> Result<(), ReplError> {
    loop {
        terminal.draw(|frame| ui::render(frame, session))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let msg = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match keys::convert_key(key) {
                Some(key) => Msg::Key(key),
                None => continue,
            },
            Event::Resize(width, _) => Msg::Resize(width),
            _ => continue,
        };

        let mut pending: VecDeque<Command> = session.update(msg).into();
        while let Some(command) = pending.pop_front() {
            match command {
                Command::Quit => return Ok(()),
                Command::Edit => {
                    let result = run_editor(terminal, session)?;
                    pending.extend(session.update(Msg::EditorFinished(result)));
                }
            }
        }
    }
}

/// Hand the terminal to the editor loop and take it back afterwards.
///
/// The outer `Result` carries terminal failures; the inner one is the edit
/// outcome reported to the session.
fn run_editor(
    terminal: &mut Term,
    session: &Session,
) -> io::Result<Result<EditOutcome, ReplError>> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let result = edit_loop(
        session.engine().document(),
        &mut EditorCommand::from_env(),
        &mut StdioPrompt,
    );

    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.hide_cursor()?;
    terminal.clear()?;

    Ok(result)
}
