//! Error types for parsing and evaluation.

use thiserror::Error;

/// A syntax error in Tether source, tied to a 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// A syntax error inside a single expression, positioned by byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at column {})", .offset + 1)]
pub struct ExprSyntaxError {
    pub offset: usize,
    pub message: String,
}

impl ExprSyntaxError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Failure while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(#[from] ExprSyntaxError),

    #[error("unknown name `{0}`")]
    UnknownName(String),

    #[error("`{0}` is a namespace, not a value")]
    Namespace(String),

    #[error("`{name}` expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("type error: {0}")]
    Type(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("index {index} out of range for list of length {len}")]
    Index { index: i64, len: usize },

    #[error("recursion limit exceeded while evaluating `{0}`")]
    RecursionLimit(String),

    #[error("`{name}` result would exceed {limit} elements")]
    TooLarge { name: String, limit: usize },
}

/// A non-parameterized binding that failed to evaluate during validation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("binding `{path}` failed to evaluate: {source}")]
pub struct ValidationError {
    pub path: String,
    #[source]
    pub source: EvalError,
}
