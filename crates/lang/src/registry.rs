//! Common shape of the builtin registries.
//!
//! Both the flat expression builtins and the nested standard library are
//! addressed by dotted path and expose function-type metadata so callers can
//! derive parameter lists without evaluating anything.

use crate::error::EvalError;
use crate::eval::Evaluator;
use crate::value::Val;

/// Parameter kind as declared by a native function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Int,
    Float,
    Bool,
    Func,
    Any,
}

impl Kind {
    /// Generic parameter name used when nothing more specific is known.
    pub fn generic_name(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Bool => "bool",
            Kind::Func => "func",
            Kind::Any => "v",
        }
    }
}

/// Function-type metadata for a native function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FnType {
    pub params: &'static [Kind],
    /// When set, the final parameter accepts zero or more trailing arguments.
    pub variadic: bool,
}

impl FnType {
    pub const fn fixed(params: &'static [Kind]) -> Self {
        Self {
            params,
            variadic: false,
        }
    }

    pub const fn variadic(params: &'static [Kind]) -> Self {
        Self {
            params,
            variadic: true,
        }
    }

    /// Whether `got` arguments satisfy this type.
    pub fn accepts(&self, got: usize) -> bool {
        if self.variadic {
            got + 1 >= self.params.len()
        } else {
            got == self.params.len()
        }
    }

    /// Human-readable arity for error messages.
    pub fn arity(&self) -> String {
        if self.variadic {
            format!("at least {}", self.params.len().saturating_sub(1))
        } else {
            self.params.len().to_string()
        }
    }
}

pub(crate) type NativeFn = fn(&mut Evaluator<'_>, Vec<Val>) -> Result<Val, EvalError>;

/// What a dotted path points at inside a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEntry<'a> {
    /// A namespace and the names of its children.
    Namespace(Vec<&'a str>),
    /// A callable with its type metadata.
    Function(&'a FnType),
}

/// A read-only, dotted-path-addressable table of native functions.
pub trait Registry {
    /// Names visible at the top level.
    fn top_level(&self) -> Vec<&str>;

    /// Look up a dotted path.
    fn lookup(&self, path: &str) -> Option<RegistryEntry<'_>>;

    /// Whether the path names a callable.
    fn is_callable(&self, path: &str) -> bool {
        matches!(self.lookup(path), Some(RegistryEntry::Function(_)))
    }
}
