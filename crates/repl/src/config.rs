//! Session configuration: where the program and history come from.

use crate::error::ReplError;
use crate::history::History;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Where the Tether program is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    File(PathBuf),
    Stdin,
}

impl SourceSpec {
    /// `-` means stdin.
    pub fn from_arg(arg: &Path) -> Self {
        if arg.as_os_str() == "-" {
            SourceSpec::Stdin
        } else {
            SourceSpec::File(arg.to_path_buf())
        }
    }

    /// Short name for the status line.
    pub fn display_name(&self) -> String {
        match self {
            SourceSpec::File(path) => path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
            SourceSpec::Stdin => "<stdin>".to_string(),
        }
    }

    pub fn read(&self) -> Result<String, ReplError> {
        match self {
            SourceSpec::File(path) => fs::read_to_string(path).map_err(|source| ReplError::Source {
                path: path.clone(),
                source,
            }),
            SourceSpec::Stdin => {
                let mut src = String::new();
                io::stdin()
                    .read_to_string(&mut src)
                    .map_err(|source| ReplError::Source {
                        path: PathBuf::from("-"),
                        source,
                    })?;
                Ok(src)
            }
        }
    }
}

/// `<data-local-dir>/tether/repl_history`, when the platform has one.
pub fn default_history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("tether").join("repl_history"))
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub source: Option<SourceSpec>,
    /// `None` keeps history in memory only.
    pub history_path: Option<PathBuf>,
}

impl Config {
    pub fn new(source: Option<SourceSpec>) -> Self {
        Self {
            source,
            history_path: default_history_path(),
        }
    }

    pub fn history_path(mut self, path: Option<PathBuf>) -> Self {
        self.history_path = path;
        self
    }

    /// Read the program, returning its display name and text.
    pub fn load_source(&self) -> Result<(String, String), ReplError> {
        let source = self.source.as_ref().ok_or(ReplError::NoSource)?;
        Ok((source.display_name(), source.read()?))
    }

    pub fn open_history(&self) -> History {
        match &self.history_path {
            Some(path) => History::open(path),
            None => History::in_memory(),
        }
    }
}
