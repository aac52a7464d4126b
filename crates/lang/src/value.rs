//! Runtime values produced by evaluation.

use std::fmt;

/// Upper bound on the length of strings and lists built by builtins.
pub const MAX_GENERATED_LEN: usize = 1 << 20;

/// A reference to something callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuncRef {
    /// A parameterized binding, addressed by its full path.
    Binding(Vec<String>),
    /// An expression builtin.
    Builtin(&'static str),
    /// A standard library function, addressed by dotted path.
    Std(String),
}

impl FuncRef {
    pub fn name(&self) -> String {
        match self {
            FuncRef::Binding(path) => path.join("."),
            FuncRef::Builtin(name) => (*name).to_string(),
            FuncRef::Std(path) => path.clone(),
        }
    }
}

/// An evaluated value.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    List(Vec<Val>),
    /// A block evaluated field by field.
    Record(Vec<(String, Val)>),
    Func(FuncRef),
}

impl Val {
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Int(_) => "int",
            Val::Float(_) => "float",
            Val::Str(_) => "string",
            Val::Bool(_) => "bool",
            Val::List(_) => "list",
            Val::Record(_) => "record",
            Val::Func(_) => "function",
        }
    }

    /// Text form used by `str()` and `join()`: strings are not quoted.
    pub fn to_plain_string(&self) -> String {
        match self {
            Val::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Val::Int(n) => Some(*n as f64),
            Val::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Int(n) => write!(f, "{}", n),
            Val::Float(x) if x.fract() == 0.0 && x.is_finite() => write!(f, "{:.1}", x),
            Val::Float(x) => write!(f, "{}", x),
            Val::Str(s) => write!(f, "{:?}", s),
            Val::Bool(b) => write!(f, "{}", b),
            Val::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Val::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", name, value)?;
                }
                write!(f, "}}")
            }
            Val::Func(func) => write!(f, "<fn {}>", func.name()),
        }
    }
}
