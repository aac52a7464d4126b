//! Binding tree for Tether documents.
//!
//! A document is a root [`Block`] of named [`Binding`]s. Each binding holds
//! either an expression (a leaf) or a nested block. Parameterized bindings are
//! functions; everything else is a plain value.

use crate::expr::Expr;

/// A parsed Tether document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub root: Block,
}

impl Document {
    pub fn new(root: Block) -> Self {
        Self { root }
    }

    /// Resolve a top-level binding by name.
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.root.get(name)
    }

    /// Resolve a dotted path (`a.b.c`) through nested blocks.
    pub fn resolve(&self, path: &str) -> Option<&Binding> {
        self.resolve_segments(&path.split('.').collect::<Vec<_>>())
    }

    /// Resolve pre-split path segments through nested blocks.
    pub fn resolve_segments<S: AsRef<str>>(&self, segments: &[S]) -> Option<&Binding> {
        let (first, rest) = segments.split_first()?;
        let mut binding = self.root.get(first.as_ref())?;
        for segment in rest {
            binding = binding.value.as_block()?.get(segment.as_ref())?;
        }
        Some(binding)
    }

    /// Top-level binding names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.root.names()
    }
}

/// An ordered collection of named bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub entries: Vec<Binding>,
}

impl Block {
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.iter().find(|b| b.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|b| b.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A named entry in the binding tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub params: Vec<Param>,
    pub value: Value,
}

impl Binding {
    pub fn is_parameterized(&self) -> bool {
        !self.params.is_empty()
    }
}

/// A formal parameter. Only the final parameter may be variadic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub variadic: bool,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variadic: false,
        }
    }

    pub fn variadic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variadic: true,
        }
    }
}

/// The value side of a binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An expression leaf, kept with its original source text.
    Expr(ExprSource),
    /// A structured block of child bindings.
    Block(Block),
}

impl Value {
    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Value::Block(block) => Some(block),
            Value::Expr(_) => None,
        }
    }

    pub fn as_expr(&self) -> Option<&ExprSource> {
        match self {
            Value::Expr(source) => Some(source),
            Value::Block(_) => None,
        }
    }
}

/// Expression source text together with its parsed form.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprSource {
    pub text: String,
    pub expr: Expr,
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_document;

    #[test]
    fn test_resolve_nested() -> Result<(), String> {
        let doc = parse_document("outer {\n  inner {\n    depth = 3\n  }\n}\n")
            .map_err(|e| e.to_string())?;
        let depth = doc.resolve("outer.inner.depth").ok_or("missing")?;
        assert_eq!(depth.name, "depth");
        assert!(doc.resolve("outer.nope").is_none());
        assert!(doc.resolve("outer.inner.depth.more").is_none());
        Ok(())
    }

    #[test]
    fn test_names_in_declaration_order() -> Result<(), String> {
        let doc = parse_document("b = 1\na = 2\nc {}\n").map_err(|e| e.to_string())?;
        let names: Vec<_> = doc.names().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        Ok(())
    }
}
