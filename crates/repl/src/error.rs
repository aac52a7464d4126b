//! Session and history errors.

use std::io;
use std::path::PathBuf;
use tether_lang::{ParseError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplError {
    /// Started without a program to load.
    #[error("no source given: pass a file path, or `-` to read from stdin")]
    NoSource,

    #[error("could not read {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A plain binding failed to evaluate at startup.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The user refused to re-edit after a parse failure.
    #[error("edit declined; bindings left unchanged")]
    EditDeclined,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    History(#[from] HistoryError),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history index {index} out of bounds (length {len})")]
    OutOfBounds { index: usize, len: usize },

    #[error("history file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
