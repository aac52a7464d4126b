//! Completion candidates for a parent path.

use std::collections::HashSet;
use tether_lang::{Binding, Engine, Registry, RegistryEntry, Value};

/// Where a candidate name comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    /// A binding without parameters.
    Binding,
    /// A binding with parameters (a function).
    ParamBinding,
    /// An entry of either builtin registry.
    Builtin,
}

impl CandidateKind {
    /// Ordering rank used after fuzzy scoring: plain bindings first.
    pub fn priority(self) -> u8 {
        match self {
            CandidateKind::Binding => 0,
            CandidateKind::ParamBinding => 1,
            CandidateKind::Builtin => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub kind: CandidateKind,
    /// Rendered with a `()` suffix.
    pub callable: bool,
}

impl Candidate {
    fn from_binding(binding: &Binding) -> Self {
        let parameterized = binding.is_parameterized();
        Self {
            name: binding.name.clone(),
            kind: if parameterized {
                CandidateKind::ParamBinding
            } else {
                CandidateKind::Binding
            },
            callable: parameterized,
        }
    }

    fn builtin(name: &str, callable: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: CandidateKind::Builtin,
            callable,
        }
    }
}

/// Names that can follow `parent` (empty for the top level).
pub fn candidates(engine: &Engine, parent: &str) -> Vec<Candidate> {
    if parent.is_empty() {
        return top_level(engine);
    }
    match resolve_block_children(engine, parent) {
        Some(children) => children,
        None => registry_children(engine, parent),
    }
}

fn top_level(engine: &Engine) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let bindings = engine
        .document()
        .root
        .entries
        .iter()
        .map(Candidate::from_binding);
    let builtins = engine
        .builtins()
        .top_level()
        .into_iter()
        .map(|name| Candidate::builtin(name, true));
    let stdlib = engine.stdlib();
    let std_names = stdlib
        .top_level()
        .into_iter()
        .map(|name| Candidate::builtin(name, stdlib.is_callable(name)));

    for candidate in bindings.chain(builtins).chain(std_names) {
        if seen.insert(candidate.name.clone()) {
            out.push(candidate);
        }
    }
    out
}

/// Walk the binding tree along `parent`; only a fully resolved block counts.
fn resolve_block_children(engine: &Engine, parent: &str) -> Option<Vec<Candidate>> {
    let mut segments = parent.split('.');
    let mut binding = engine.document().get(segments.next()?)?;
    for segment in segments {
        let Value::Block(block) = &binding.value else {
            return None;
        };
        binding = block.get(segment)?;
    }
    let block = binding.value.as_block()?;
    Some(block.entries.iter().map(Candidate::from_binding).collect())
}

fn registry_children(engine: &Engine, parent: &str) -> Vec<Candidate> {
    let registries: [&dyn Registry; 2] = [engine.builtins(), engine.stdlib()];
    for registry in registries {
        if let Some(RegistryEntry::Namespace(children)) = registry.lookup(parent) {
            return children
                .into_iter()
                .map(|child| {
                    let path = format!("{}.{}", parent, child);
                    Candidate::builtin(child, registry.is_callable(&path))
                })
                .collect();
        }
    }
    Vec::new()
}
