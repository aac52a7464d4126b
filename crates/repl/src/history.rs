//! Mode-tagged, deduplicating input history with file persistence.
//!
//! Each record on disk is a two-character mode tag followed by the line:
//!
//! ```text
//! E:add(1, 2)
//! C:list
//! ```
//!
//! Untagged lines from older files load as evaluation entries.

use crate::error::HistoryError;
use parking_lot::RwLock;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Input mode a line was submitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Expression evaluation.
    Eval,
    /// Session commands (`help`, `list`, ...).
    Ctrl,
}

impl Mode {
    fn tag(self) -> &'static str {
        match self {
            Mode::Eval => "E:",
            Mode::Ctrl => "C:",
        }
    }

    pub fn toggled(self) -> Mode {
        match self {
            Mode::Eval => Mode::Ctrl,
            Mode::Ctrl => Mode::Eval,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Eval => "EVAL",
            Mode::Ctrl => "COMMAND",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub line: String,
    pub mode: Mode,
}

impl HistoryEntry {
    pub fn new(line: impl Into<String>, mode: Mode) -> Self {
        Self {
            line: line.into(),
            mode,
        }
    }

    fn parse(record: &str) -> Self {
        if let Some(line) = record.strip_prefix(Mode::Eval.tag()) {
            Self::new(line, Mode::Eval)
        } else if let Some(line) = record.strip_prefix(Mode::Ctrl.tag()) {
            Self::new(line, Mode::Ctrl)
        } else {
            Self::new(record, Mode::Eval)
        }
    }

    fn record(&self) -> String {
        format!("{}{}\n", self.mode.tag(), self.line)
    }
}

/// Submitted lines, oldest first.
///
/// Reads and writes go through a reader/writer lock so browsing and
/// submission can share one `History`.
#[derive(Debug)]
pub struct History {
    path: Option<PathBuf>,
    entries: RwLock<Vec<HistoryEntry>>,
}

impl History {
    /// History that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Load history from `path`. An unreadable file is logged and treated as
    /// empty; later writes still target `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .filter(|line| !line.is_empty())
                .map(HistoryEntry::parse)
                .collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no history file yet");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read history; starting empty");
                Vec::new()
            }
        };
        debug!(entries = entries.len(), "history loaded");
        Self {
            path: Some(path),
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Result<HistoryEntry, HistoryError> {
        let entries = self.entries.read();
        entries
            .get(index)
            .cloned()
            .ok_or(HistoryError::OutOfBounds {
                index,
                len: entries.len(),
            })
    }

    /// Snapshot of every entry, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().clone()
    }

    /// Record a submitted line.
    ///
    /// A repeat of the newest entry is ignored. A repeat of an older entry
    /// moves it to the end and rewrites the file; anything else is appended.
    /// The in-memory history is updated even when persisting fails.
    pub fn write(&self, line: &str, mode: Mode) -> Result<(), HistoryError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let entry = HistoryEntry::new(line, mode);

        let mut entries = self.entries.write();
        if entries.last() == Some(&entry) {
            return Ok(());
        }

        if let Some(pos) = entries.iter().position(|e| *e == entry) {
            entries.remove(pos);
            entries.push(entry);
            self.rewrite(&entries)
        } else {
            let record = entry.record();
            entries.push(entry);
            self.append(&record)
        }
    }

    fn append(&self, record: &str) -> Result<(), HistoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let result = ensure_parent(path).and_then(|()| {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            file.write_all(record.as_bytes())
        });
        result.map_err(|source| HistoryError::Io {
            path: path.clone(),
            source,
        })
    }

    fn rewrite(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content: String = entries.iter().map(HistoryEntry::record).collect();
        ensure_parent(path)
            .and_then(|()| fs::write(path, content))
            .map_err(|source| HistoryError::Io {
                path: path.clone(),
                source,
            })
    }

    /// Nearest entry older than `from` whose mode passes `filter`.
    pub fn prev_index(&self, from: usize, filter: Option<Mode>) -> Option<usize> {
        let entries = self.entries.read();
        let from = from.min(entries.len());
        (0..from)
            .rev()
            .find(|&i| filter.is_none_or(|mode| entries[i].mode == mode))
    }

    /// Nearest entry newer than `from` whose mode passes `filter`.
    pub fn next_index(&self, from: usize, filter: Option<Mode>) -> Option<usize> {
        let entries = self.entries.read();
        (from.saturating_add(1)..entries.len())
            .find(|&i| filter.is_none_or(|mode| entries[i].mode == mode))
    }
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(history: &History) -> Vec<(String, Mode)> {
        history
            .entries()
            .into_iter()
            .map(|e| (e.line, e.mode))
            .collect()
    }

    #[test]
    fn test_consecutive_duplicate_is_ignored() -> Result<(), HistoryError> {
        let history = History::in_memory();
        history.write("add(1, 2)", Mode::Eval)?;
        history.write("  add(1, 2)  ", Mode::Eval)?;
        assert_eq!(history.len(), 1);
        Ok(())
    }

    #[test]
    fn test_same_line_in_two_modes_is_two_entries() -> Result<(), HistoryError> {
        let history = History::in_memory();
        history.write("list", Mode::Eval)?;
        history.write("list", Mode::Ctrl)?;
        assert_eq!(history.len(), 2);
        Ok(())
    }

    #[test]
    fn test_older_duplicate_moves_to_end() -> Result<(), HistoryError> {
        let history = History::in_memory();
        history.write("a", Mode::Eval)?;
        history.write("b", Mode::Eval)?;
        history.write("c", Mode::Eval)?;
        history.write("a", Mode::Eval)?;
        assert_eq!(
            lines(&history),
            vec![
                ("b".to_string(), Mode::Eval),
                ("c".to_string(), Mode::Eval),
                ("a".to_string(), Mode::Eval)
            ]
        );
        Ok(())
    }

    #[test]
    fn test_blank_lines_are_ignored() -> Result<(), HistoryError> {
        let history = History::in_memory();
        history.write("   ", Mode::Eval)?;
        assert!(history.is_empty());
        Ok(())
    }

    #[test]
    fn test_get_out_of_bounds() {
        let history = History::in_memory();
        assert!(matches!(
            history.get(3),
            Err(HistoryError::OutOfBounds { index: 3, len: 0 })
        ));
    }

    #[test]
    fn test_persists_and_reloads() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("history");

        let history = History::open(&path);
        history.write("greeting", Mode::Eval)?;
        history.write("list", Mode::Ctrl)?;
        assert_eq!(fs::read_to_string(&path)?, "E:greeting\nC:list\n");

        history.write("greeting", Mode::Eval)?;
        assert_eq!(fs::read_to_string(&path)?, "C:list\nE:greeting\n");

        let reloaded = History::open(&path);
        assert_eq!(lines(&reloaded), lines(&history));
        Ok(())
    }

    #[test]
    fn test_legacy_untagged_lines_load_as_eval() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("history");
        fs::write(&path, "add(1, 2)\n\nC:quit\n")?;

        let history = History::open(&path);
        assert_eq!(
            lines(&history),
            vec![
                ("add(1, 2)".to_string(), Mode::Eval),
                ("quit".to_string(), Mode::Ctrl)
            ]
        );
        Ok(())
    }

    #[test]
    fn test_unreadable_file_is_empty_history() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        // A directory cannot be read as a file
        let history = History::open(dir.path());
        assert!(history.is_empty());
        Ok(())
    }

    #[test]
    fn test_write_failure_still_updates_memory() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let history = History::open(dir.path());
        assert!(history.write("x", Mode::Eval).is_err());
        assert_eq!(history.len(), 1);
        Ok(())
    }

    #[test]
    fn test_filtered_navigation() -> Result<(), HistoryError> {
        let history = History::in_memory();
        history.write("1", Mode::Eval)?;
        history.write("help", Mode::Ctrl)?;
        history.write("2", Mode::Eval)?;

        assert_eq!(history.prev_index(3, None), Some(2));
        assert_eq!(history.prev_index(3, Some(Mode::Ctrl)), Some(1));
        assert_eq!(history.prev_index(1, Some(Mode::Ctrl)), None);
        assert_eq!(history.next_index(0, Some(Mode::Eval)), Some(2));
        assert_eq!(history.next_index(2, None), None);
        Ok(())
    }

    #[test]
    fn test_concurrent_writes_and_reads() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("history");
        let history = History::open(&path);

        std::thread::scope(|scope| -> Result<(), String> {
            let writers: Vec<_> = (0..4)
                .map(|t| {
                    let history = &history;
                    scope.spawn(move || -> Result<(), HistoryError> {
                        for n in 0..25 {
                            let mode = if n % 2 == 0 { Mode::Eval } else { Mode::Ctrl };
                            history.write(&format!("line-{}-{}", t, n), mode)?;
                        }
                        Ok(())
                    })
                })
                .collect();
            let reader = scope.spawn(|| {
                let mut seen = 0;
                for _ in 0..50 {
                    let entries = history.entries();
                    assert!(entries.len() >= seen);
                    seen = entries.len();
                }
            });

            for writer in writers {
                writer
                    .join()
                    .map_err(|_| "writer panicked".to_string())?
                    .map_err(|e| e.to_string())?;
            }
            reader.join().map_err(|_| "reader panicked".to_string())
        })?;

        assert_eq!(history.len(), 100);
        let reloaded = History::open(&path);
        assert_eq!(reloaded.entries(), history.entries());
        Ok(())
    }
}
