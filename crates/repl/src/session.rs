//! The REPL session state machine.
//!
//! [`Session::update`] consumes one [`Msg`] at a time and returns the
//! [`Command`]s the driver has to carry out. Nothing in here touches the
//! terminal, so every transition can be exercised directly in tests.

use crate::call::detect_function_call;
use crate::candidates::{Candidate, candidates};
use crate::editor::EditOutcome;
use crate::error::ReplError;
use crate::history::{History, Mode};
use crate::input::{Change, InputState};
use crate::matcher::{Match, MatchEngine, command_candidates};
use crate::signature::{Signature, SignatureCache};
use crate::ui::transcript::TranscriptEntry;
use crate::word::{parent_path, word_bounds};
use line_edit::{Action, Key, KeyCode};
use tether_lang::{Binding, Block, Engine, Value};
use tracing::{info, warn};

const HELP: &str = "\
Commands (type `:` on an empty line, or Ctrl+T):
  help    show this message
  list    list every binding
  edit    edit the bindings in $EDITOR
  clear   clear the transcript
  quit    leave the session
Keys:
  Tab / Shift+Tab      cycle completions (Esc restores)
  Up / Down            history, all modes
  Ctrl+Up / Ctrl+Down  history, current mode only (also Ctrl+P / Ctrl+N)
  Alt+Up / Alt+Down    browse command history from any mode
  Ctrl+C               clear input, or quit on an empty line
  Ctrl+D               quit on an empty line
  Ctrl+L               clear the transcript";

#[derive(Debug)]
pub enum Msg {
    Key(Key),
    Resize(u16),
    EditorFinished(Result<EditOutcome, ReplError>),
}

/// Work the driver performs on behalf of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// Suspend the UI, run the edit loop, and report back with
    /// [`Msg::EditorFinished`].
    Edit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Snapshot {
    text: String,
    cursor: usize,
}

impl Snapshot {
    fn capture(input: &InputState) -> Self {
        Self {
            text: input.value().to_string(),
            cursor: input.cursor(),
        }
    }
}

/// Tab cycling over a frozen match list.
#[derive(Debug)]
struct TabCycle {
    snapshot: Snapshot,
    start: usize,
    end: usize,
    selected: usize,
}

/// Command-history browsing entered with Alt+Up.
#[derive(Debug)]
struct AltNav {
    mode: Mode,
    snapshot: Snapshot,
    index: usize,
}

/// The call surrounding the cursor and its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCall {
    pub signature: Signature,
    pub arg_index: usize,
}

pub struct Session {
    engine: Engine,
    history: History,
    signatures: SignatureCache,
    matcher: MatchEngine,
    mode: Mode,
    input: InputState,
    saved_eval: Snapshot,
    saved_ctrl: Snapshot,
    tab: Option<TabCycle>,
    alt_nav: Option<AltNav>,
    width: u16,
    candidates: Vec<Candidate>,
    matches: Vec<Match>,
    word: (usize, usize),
    call: Option<ActiveCall>,
    /// `history.len()` while showing live input.
    history_index: usize,
    /// Mode and input from before history browsing started.
    live: Option<(Mode, Snapshot)>,
    transcript: Vec<TranscriptEntry>,
    source_name: String,
}

impl Session {
    pub fn new(
        engine: Engine,
        history: History,
        source_name: impl Into<String>,
        width: u16,
    ) -> Self {
        let history_index = history.len();
        Self {
            engine,
            history,
            signatures: SignatureCache::new(),
            matcher: MatchEngine::new(),
            mode: Mode::Eval,
            input: InputState::new(),
            saved_eval: Snapshot::default(),
            saved_ctrl: Snapshot::default(),
            tab: None,
            alt_nav: None,
            width,
            candidates: Vec::new(),
            matches: Vec::new(),
            word: (0, 0),
            call: None,
            history_index,
            live: None,
            transcript: Vec::new(),
            source_name: source_name.into(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Bounds of the word under the cursor as of the last refresh.
    pub fn word(&self) -> (usize, usize) {
        self.word
    }

    /// Selected entry while tab cycling.
    pub fn tab_selected(&self) -> Option<usize> {
        self.tab.as_ref().map(|tab| tab.selected)
    }

    pub fn active_call(&self) -> Option<&ActiveCall> {
        self.call.as_ref()
    }

    pub fn history_index(&self) -> usize {
        self.history_index
    }

    pub fn is_alt_navigating(&self) -> bool {
        self.alt_nav.is_some()
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::Key(key) => self.handle_key(key),
            Msg::Resize(width) => {
                self.width = width;
                Vec::new()
            }
            Msg::EditorFinished(result) => {
                self.finish_edit(result);
                Vec::new()
            }
        }
    }

    fn handle_key(&mut self, key: Key) -> Vec<Command> {
        if self.tab.is_some() {
            match key.code {
                KeyCode::Tab => {
                    self.cycle(true);
                    return Vec::new();
                }
                KeyCode::BackTab => {
                    self.cycle(false);
                    return Vec::new();
                }
                KeyCode::Escape => {
                    self.cancel_tab();
                    return Vec::new();
                }
                _ => self.commit_tab(),
            }
        }

        let alt_arrow = key.alt && matches!(key.code, KeyCode::Up | KeyCode::Down);
        if self.alt_nav.is_some() && !alt_arrow {
            self.commit_alt_nav();
        }

        if key.ctrl {
            match key.code {
                KeyCode::Char('c') => return self.interrupt(),
                KeyCode::Char('d') if self.input.is_empty() => return vec![Command::Quit],
                KeyCode::Char('l') => {
                    self.transcript.clear();
                    return Vec::new();
                }
                KeyCode::Char('t') => {
                    self.switch_mode(self.mode.toggled());
                    return Vec::new();
                }
                KeyCode::Char('p') | KeyCode::Up => {
                    self.history_prev(Some(self.mode));
                    return Vec::new();
                }
                KeyCode::Char('n') | KeyCode::Down => {
                    self.history_next(Some(self.mode));
                    return Vec::new();
                }
                _ => {}
            }
        }

        if alt_arrow {
            if key.code == KeyCode::Up {
                self.alt_prev();
            } else {
                self.alt_next();
            }
            return Vec::new();
        }

        match key.code {
            KeyCode::Up => self.history_prev(None),
            KeyCode::Down => self.history_next(None),
            KeyCode::Tab => self.start_tab(true),
            KeyCode::BackTab => self.start_tab(false),
            KeyCode::Enter => return self.submit(),
            KeyCode::Char(':')
                if key.is_plain() && self.mode == Mode::Eval && self.input.is_empty() =>
            {
                self.switch_mode(Mode::Ctrl);
            }
            KeyCode::Backspace
                if key.is_plain() && self.mode == Mode::Ctrl && self.input.is_empty() =>
            {
                self.switch_mode(Mode::Eval);
            }
            KeyCode::Escape if self.mode == Mode::Ctrl => self.switch_mode(Mode::Eval),
            _ => self.edit(key),
        }
        Vec::new()
    }

    fn edit(&mut self, key: Key) {
        let (change, action) = self.input.handle_key(key);
        match change {
            Change::Inserted => {
                self.stop_browsing();
                self.refresh(true);
            }
            Change::Deleted => {
                self.stop_browsing();
                self.refresh(false);
            }
            Change::Moved => self.refresh(false),
            Change::None => {}
        }
        if action == Some(Action::Cancel) {
            self.matches.clear();
        }
    }

    /// Recompute word, candidates, matches and the call hint.
    ///
    /// With `auto_confirm`, a sole match equal to the typed word (ignoring
    /// case) is accepted: the word takes the candidate's spelling and the
    /// match list closes.
    fn refresh(&mut self, auto_confirm: bool) {
        let value = self.input.value();
        let word = word_bounds(value, self.input.cursor());
        let (start, end) = (word.start, word.end);

        let (candidates, matches) = match self.mode {
            Mode::Ctrl => (command_candidates(), self.matcher.match_commands(word.text)),
            Mode::Eval => {
                let parent = parent_path(value, start);
                let candidates = candidates(&self.engine, parent);
                let matches = self.matcher.match_eval(word.text, parent, &candidates);
                (candidates, matches)
            }
        };

        let confirmed = match matches.as_slice() {
            [only] if auto_confirm && only.name().eq_ignore_ascii_case(word.text) => {
                Some(only.name().to_string())
            }
            _ => None,
        };

        self.candidates = candidates;
        self.matches = matches;
        self.word = (start, end);

        if let Some(name) = confirmed {
            if self.input.value()[start..end] != *name {
                self.input.replace_range(start, end, &name);
            }
            self.matches.clear();
            self.word = (start, start + name.len());
        }
        self.call = self.resolve_call();
    }

    fn resolve_call(&self) -> Option<ActiveCall> {
        if self.mode != Mode::Eval {
            return None;
        }
        let call = detect_function_call(self.input.value(), self.input.cursor())?;
        let signature = self.signatures.resolve(
            self.engine.document(),
            self.engine.builtins(),
            self.engine.stdlib(),
            &call.name,
        )?;
        Some(ActiveCall {
            signature,
            arg_index: call.arg_index,
        })
    }

    fn start_tab(&mut self, forward: bool) {
        let Some(last) = self.matches.len().checked_sub(1) else {
            return;
        };
        let (start, end) = self.word;
        self.tab = Some(TabCycle {
            snapshot: Snapshot::capture(&self.input),
            start,
            end,
            selected: if forward { 0 } else { last },
        });
        self.apply_tab();
    }

    fn cycle(&mut self, forward: bool) {
        let len = self.matches.len();
        let Some(tab) = self.tab.as_mut() else {
            return;
        };
        if len == 0 {
            return;
        }
        tab.selected = if forward {
            (tab.selected + 1) % len
        } else {
            (tab.selected + len - 1) % len
        };
        self.apply_tab();
    }

    fn apply_tab(&mut self) {
        let Some(tab) = &self.tab else {
            return;
        };
        let Some(selected) = self.matches.get(tab.selected) else {
            return;
        };
        let mut text = tab.snapshot.text.clone();
        text.replace_range(tab.start..tab.end, selected.name());
        let cursor = tab.start + selected.name().len();
        self.input.set(text, cursor);
        self.call = self.resolve_call();
    }

    fn cancel_tab(&mut self) {
        if let Some(tab) = self.tab.take() {
            self.input.set(tab.snapshot.text, tab.snapshot.cursor);
            self.refresh(false);
        }
    }

    fn commit_tab(&mut self) {
        if self.tab.take().is_some() {
            self.refresh(false);
        }
    }

    fn saved_slot(&mut self, mode: Mode) -> &mut Snapshot {
        match mode {
            Mode::Eval => &mut self.saved_eval,
            Mode::Ctrl => &mut self.saved_ctrl,
        }
    }

    /// Switch modes, parking the current input and restoring the target
    /// mode's parked input.
    fn switch_mode(&mut self, to: Mode) {
        if to == self.mode {
            return;
        }
        let current = Snapshot::capture(&self.input);
        *self.saved_slot(self.mode) = current;
        let restored = std::mem::take(self.saved_slot(to));
        self.mode = to;
        self.input.set(restored.text, restored.cursor);
        self.stop_browsing();
        self.refresh(false);
    }

    fn stop_browsing(&mut self) {
        self.history_index = self.history.len();
        self.live = None;
    }

    fn show_line(&mut self, line: String) {
        self.input.set_value(line);
        self.refresh(false);
    }

    /// Older entry. `filter` keeps the mode fixed; without it the session
    /// follows the entry's mode.
    fn history_prev(&mut self, filter: Option<Mode>) {
        let from = self.history_index.min(self.history.len());
        let Some(index) = self.history.prev_index(from, filter) else {
            return;
        };
        if self.live.is_none() {
            self.live = Some((self.mode, Snapshot::capture(&self.input)));
        }
        self.load_history(index, filter.is_none());
    }

    fn history_next(&mut self, filter: Option<Mode>) {
        let len = self.history.len();
        if self.history_index >= len {
            return;
        }
        match self.history.next_index(self.history_index, filter) {
            Some(index) => self.load_history(index, filter.is_none()),
            None => {
                self.history_index = len;
                if let Some((mode, live)) = self.live.take() {
                    self.mode = mode;
                    self.input.set(live.text, live.cursor);
                }
                self.refresh(false);
            }
        }
    }

    fn load_history(&mut self, index: usize, follow_mode: bool) {
        let entry = match self.history.get(index) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "history lookup failed");
                return;
            }
        };
        if follow_mode {
            self.mode = entry.mode;
        }
        self.history_index = index;
        self.show_line(entry.line);
    }

    fn alt_prev(&mut self) {
        let from = self
            .alt_nav
            .as_ref()
            .map_or(self.history.len(), |nav| nav.index);
        let Some(index) = self.history.prev_index(from, Some(Mode::Ctrl)) else {
            return;
        };
        match &mut self.alt_nav {
            Some(nav) => nav.index = index,
            None => {
                self.alt_nav = Some(AltNav {
                    mode: self.mode,
                    snapshot: Snapshot::capture(&self.input),
                    index,
                });
                self.stop_browsing();
            }
        }
        self.load_alt(index);
    }

    fn alt_next(&mut self) {
        let Some(nav) = &self.alt_nav else {
            return;
        };
        match self.history.next_index(nav.index, Some(Mode::Ctrl)) {
            Some(index) => {
                if let Some(nav) = self.alt_nav.as_mut() {
                    nav.index = index;
                }
                self.load_alt(index);
            }
            None => {
                if let Some(nav) = self.alt_nav.take() {
                    self.mode = nav.mode;
                    self.input.set(nav.snapshot.text, nav.snapshot.cursor);
                    self.refresh(false);
                }
            }
        }
    }

    fn load_alt(&mut self, index: usize) {
        match self.history.get(index) {
            Ok(entry) => {
                self.mode = Mode::Ctrl;
                self.show_line(entry.line);
            }
            Err(e) => warn!(error = %e, "history lookup failed"),
        }
    }

    /// Leave alt navigation on the shown entry. The input it replaced is
    /// parked in its mode's slot.
    fn commit_alt_nav(&mut self) {
        if let Some(nav) = self.alt_nav.take()
            && nav.mode != self.mode
        {
            *self.saved_slot(nav.mode) = nav.snapshot;
        }
    }

    fn interrupt(&mut self) -> Vec<Command> {
        if self.input.is_empty() {
            return vec![Command::Quit];
        }
        self.input.clear();
        self.stop_browsing();
        self.refresh(false);
        Vec::new()
    }

    fn submit(&mut self) -> Vec<Command> {
        let line = self.input.value().trim().to_string();
        let mode = self.mode;
        self.input.clear();
        self.live = None;

        let mut commands = Vec::new();
        if !line.is_empty() {
            let saved = self.history.write(&line, mode);
            commands = match mode {
                Mode::Eval => {
                    self.evaluate(&line);
                    Vec::new()
                }
                Mode::Ctrl => self.run_command(&line),
            };
            if let Err(e) = saved {
                warn!(error = %e, "could not save history");
                self.transcript
                    .push(TranscriptEntry::error(format!("warning: {}", e)));
            }
        }

        self.history_index = self.history.len();
        self.refresh(false);
        commands
    }

    fn evaluate(&mut self, line: &str) {
        let entry = TranscriptEntry::new(Mode::Eval, line);
        let entry = match self.engine.evaluate(line) {
            Ok(value) => entry.with_output(value.to_string()),
            Err(e) => entry.with_error(e.to_string()),
        };
        self.transcript.push(entry);
    }

    /// Run a command line. The session drops back to evaluation afterwards.
    fn run_command(&mut self, line: &str) -> Vec<Command> {
        let entry = TranscriptEntry::new(Mode::Ctrl, line);
        let mut commands = Vec::new();
        match line {
            "help" => self.transcript.push(entry.with_output(HELP)),
            "list" => {
                let mut listing = Vec::new();
                list_bindings(&self.engine.document().root, "", &mut listing);
                let output = if listing.is_empty() {
                    "(no bindings)".to_string()
                } else {
                    listing.join("\n")
                };
                self.transcript.push(entry.with_output(output));
            }
            "edit" => {
                self.transcript.push(entry);
                commands.push(Command::Edit);
            }
            "clear" => self.transcript.clear(),
            "quit" => commands.push(Command::Quit),
            other => self.transcript.push(
                entry.with_error(format!("unknown command `{}`; try `help`", other)),
            ),
        }
        self.switch_mode(Mode::Eval);
        commands
    }

    fn finish_edit(&mut self, result: Result<EditOutcome, ReplError>) {
        let entry = match result {
            Ok(EditOutcome::Replaced(document)) => {
                let count = document.root.entries.len();
                self.engine.replace_document(document);
                info!(bindings = count, "bindings replaced");
                match self.engine.validate() {
                    Ok(()) => {
                        TranscriptEntry::note(format!("bindings updated ({} top-level)", count))
                    }
                    Err(e) => TranscriptEntry::error(format!("bindings updated, but {}", e)),
                }
            }
            Ok(EditOutcome::Unchanged) => {
                info!("edit left bindings unchanged");
                TranscriptEntry::note("edit cancelled; bindings unchanged")
            }
            Err(ReplError::EditDeclined) => {
                TranscriptEntry::note(ReplError::EditDeclined.to_string())
            }
            Err(e) => {
                warn!(error = %e, "edit failed");
                TranscriptEntry::error(format!("edit failed: {}", e))
            }
        };
        self.transcript.push(entry);
        self.refresh(false);
    }
}

fn signature_text(path: &str, binding: &Binding) -> String {
    let params: Vec<String> = binding
        .params
        .iter()
        .map(|p| {
            if p.variadic {
                format!("...{}", p.name)
            } else {
                p.name.clone()
            }
        })
        .collect();
    format!("{}({})", path, params.join(", "))
}

/// Flatten `block` into `path` / `path(params)` lines.
fn list_bindings(block: &Block, prefix: &str, out: &mut Vec<String>) {
    for binding in &block.entries {
        let path = if prefix.is_empty() {
            binding.name.clone()
        } else {
            format!("{}.{}", prefix, binding.name)
        };
        match &binding.value {
            Value::Block(inner) if !inner.is_empty() => list_bindings(inner, &path, out),
            _ if binding.is_parameterized() => out.push(signature_text(&path, binding)),
            _ => out.push(path),
        }
    }
}
