//! Call signatures from bindings and both builtin registries.
//!
//! Bindings are looked up fresh every time since the tree can be replaced by
//! an edit. The two registries are introspected once per [`SignatureCache`]
//! and served from memory afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;
use tether_lang::{Document, ExprBuiltins, FnType, Stdlib, StdEntry, Value};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Fully qualified name.
    pub name: String,
    /// Parameter names; a variadic final parameter carries a `...` prefix.
    pub params: Vec<String>,
    pub display: String,
}

impl Signature {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        let name = name.into();
        let display = format!("{}({})", name, params.join(", "));
        Self {
            name,
            params,
            display,
        }
    }

    /// Index of the parameter to highlight for `arg_index`.
    ///
    /// A trailing variadic parameter stays highlighted for every argument at
    /// or past its position.
    pub fn active_param(&self, arg_index: usize) -> Option<usize> {
        let last = self.params.len().checked_sub(1)?;
        if arg_index >= last && self.params[last].starts_with("...") {
            Some(last)
        } else if arg_index < self.params.len() {
            Some(arg_index)
        } else {
            None
        }
    }
}

/// Parameter names that read better than the kind-derived default.
const PARAM_OVERRIDES: &[(&str, usize, &str)] = &[
    ("filter", 0, "array"),
    ("filter", 1, "predicate"),
    ("map", 0, "array"),
    ("map", 1, "mapper"),
    ("join", 0, "array"),
    ("join", 1, "separator"),
    ("split", 1, "separator"),
    ("all", 0, "array"),
    ("all", 1, "predicate"),
    ("any", 0, "array"),
    ("any", 1, "predicate"),
    ("sum", 0, "array"),
    ("contains", 0, "haystack"),
    ("contains", 1, "needle"),
];

fn param_names(name: &str, ty: &FnType) -> Vec<String> {
    let last = ty.params.len().saturating_sub(1);
    ty.params
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let base = PARAM_OVERRIDES
                .iter()
                .find(|(n, pos, _)| *n == name && *pos == i)
                .map_or(kind.generic_name(), |&(_, _, label)| label);
            if ty.variadic && i == last {
                format!("...{}", base)
            } else {
                base.to_string()
            }
        })
        .collect()
}

/// Signature of a binding addressed by a (possibly dotted) name.
pub fn binding_signature(doc: &Document, name: &str) -> Option<Signature> {
    let binding = doc.resolve(name)?;
    if !matches!(binding.value, Value::Expr(_)) {
        return None;
    }
    let params = binding
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
    Some(Signature::new(name, params))
}

fn expr_builtin_signature(builtins: &ExprBuiltins, name: &str) -> Option<Signature> {
    let builtin = builtins.get(name)?;
    Some(Signature::new(name, param_names(name, &builtin.ty)))
}

fn stdlib_signature(stdlib: &Stdlib, path: &str) -> Option<Signature> {
    match stdlib.get(path)? {
        StdEntry::Function(function) => Some(Signature::new(path, param_names(path, &function.ty))),
        StdEntry::Namespace(_) => None,
    }
}

/// Build-once signature tables for the two builtin registries.
///
/// `OnceLock` blocks concurrent first users until the table is built.
#[derive(Debug, Default)]
pub struct SignatureCache {
    expr_builtins: OnceLock<HashMap<String, Signature>>,
    stdlib: OnceLock<HashMap<String, Signature>>,
}

impl SignatureCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn expr_table(&self, builtins: &ExprBuiltins) -> &HashMap<String, Signature> {
        self.expr_builtins.get_or_init(|| {
            let table: HashMap<_, _> = builtins
                .iter()
                .map(|b| (b.name.to_string(), Signature::new(b.name, param_names(b.name, &b.ty))))
                .collect();
            debug!(entries = table.len(), "built expression builtin signatures");
            table
        })
    }

    fn stdlib_table(&self, stdlib: &Stdlib) -> &HashMap<String, Signature> {
        self.stdlib.get_or_init(|| {
            let table: HashMap<_, _> = stdlib
                .functions()
                .into_iter()
                .map(|(path, ty)| {
                    let params = param_names(&path, ty);
                    (path.clone(), Signature::new(path, params))
                })
                .collect();
            debug!(entries = table.len(), "built standard library signatures");
            table
        })
    }

    /// Resolve `name` from bindings, then expression builtins, then the
    /// standard library. A miss in a cached table falls back to a direct
    /// registry lookup.
    pub fn resolve(
        &self,
        doc: &Document,
        builtins: &ExprBuiltins,
        stdlib: &Stdlib,
        name: &str,
    ) -> Option<Signature> {
        if let Some(signature) = binding_signature(doc, name) {
            return Some(signature);
        }
        if let Some(signature) = self.expr_table(builtins).get(name) {
            return Some(signature.clone());
        }
        if let Some(signature) = expr_builtin_signature(builtins, name) {
            return Some(signature);
        }
        if let Some(signature) = self.stdlib_table(stdlib).get(name) {
            return Some(signature.clone());
        }
        stdlib_signature(stdlib, name)
    }

    pub fn is_built(&self) -> bool {
        self.expr_builtins.get().is_some() && self.stdlib.get().is_some()
    }
}
