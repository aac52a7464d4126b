//! Tether configuration language
//!
//! A document is a tree of named bindings. Leaves are expressions; bindings
//! with parameters are functions. [`Engine`] owns one document together with
//! the two builtin registries and evaluates input against them.

pub mod ast;
pub mod builtins;
pub mod error;
mod eval;
pub mod expr;
pub mod format;
pub mod parser;
pub mod registry;
pub mod stdlib;
pub mod value;

pub use ast::{Binding, Block, Document, ExprSource, Param, Value};
pub use builtins::{ExprBuiltin, ExprBuiltins};
pub use error::{EvalError, ExprSyntaxError, ParseError, ValidationError};
pub use expr::{Expr, is_ident, is_ident_char, parse_expr};
pub use format::to_source;
pub use parser::parse_document;
pub use registry::{FnType, Kind, Registry, RegistryEntry};
pub use stdlib::{StdEntry, Stdlib};
pub use value::{FuncRef, Val};

use eval::Evaluator;

/// A document plus the registries it is evaluated against.
#[derive(Debug, Default)]
pub struct Engine {
    document: Document,
    builtins: ExprBuiltins,
    stdlib: Stdlib,
}

impl Engine {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            builtins: ExprBuiltins::new(),
            stdlib: Stdlib::new(),
        }
    }

    pub fn from_source(src: &str) -> Result<Self, ParseError> {
        Ok(Self::new(parse_document(src)?))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn builtins(&self) -> &ExprBuiltins {
        &self.builtins
    }

    pub fn stdlib(&self) -> &Stdlib {
        &self.stdlib
    }

    /// Swap in a freshly parsed document. The old tree is dropped whole.
    pub fn replace_document(&mut self, document: Document) -> Document {
        std::mem::replace(&mut self.document, document)
    }

    /// Parse and evaluate one expression against the current document.
    pub fn evaluate(&self, input: &str) -> Result<Val, EvalError> {
        let expr = parse_expr(input.trim())?;
        Evaluator::new(&self.document, &self.builtins, &self.stdlib).eval_top(&expr)
    }

    /// Check that every non-parameterized binding evaluates.
    pub fn validate(&self) -> Result<(), ValidationError> {
        Evaluator::new(&self.document, &self.builtins, &self.stdlib).validate()
    }

    /// Canonical source for the current document.
    pub fn to_source(&self) -> String {
        to_source(&self.document)
    }
}
