//! Canonical source rendering of a document.

use crate::ast::{Binding, Block, Document, Value};
use std::fmt::Write;

const INDENT: &str = "  ";

/// Render a document as source the parser accepts.
pub fn to_source(doc: &Document) -> String {
    let mut out = String::new();
    write_block(&mut out, &doc.root, 0);
    out
}

fn write_block(out: &mut String, block: &Block, depth: usize) {
    for binding in &block.entries {
        write_binding(out, binding, depth);
    }
}

fn write_binding(out: &mut String, binding: &Binding, depth: usize) {
    let indent = INDENT.repeat(depth);
    match &binding.value {
        Value::Block(block) if block.is_empty() => {
            let _ = writeln!(out, "{}{} {{}}", indent, binding.name);
        }
        Value::Block(block) => {
            let _ = writeln!(out, "{}{} {{", indent, binding.name);
            write_block(out, block, depth + 1);
            let _ = writeln!(out, "{}}}", indent);
        }
        Value::Expr(source) => {
            let _ = write!(out, "{}{}", indent, binding.name);
            for param in &binding.params {
                let prefix = if param.variadic { "..." } else { "" };
                let _ = write!(out, " {}{}", prefix, param.name);
            }
            let _ = writeln!(out, " = {}", source.text);
        }
    }
}
