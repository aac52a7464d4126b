//! Line-oriented document parser.
//!
//! ```text
//! # comment
//! greeting = "hello"
//! add a b = a + b
//! concat ...parts = join(parts, "")
//! nested {
//!   multiply x y = x * y
//! }
//! empty {}
//! ```

use crate::ast::{Binding, Block, Document, ExprSource, Param, Value};
use crate::error::ParseError;
use crate::expr::{is_ident, parse_expr};

struct OpenBlock {
    name: String,
    line: usize,
    block: Block,
}

/// Parse a whole document.
pub fn parse_document(src: &str) -> Result<Document, ParseError> {
    let mut root = Block::default();
    let mut stack: Vec<OpenBlock> = Vec::new();

    for (idx, raw) in src.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line == "}" {
            let open = stack
                .pop()
                .ok_or_else(|| ParseError::new(line_no, "unmatched `}`"))?;
            let parent = stack.last_mut().map_or(&mut root, |b| &mut b.block);
            parent.entries.push(Binding {
                name: open.name,
                params: Vec::new(),
                value: Value::Block(open.block),
            });
            continue;
        }

        let current = stack.last().map_or(&root, |b| &b.block);

        if let Some((head, body)) = line.split_once('=') {
            let (name, params) = parse_head(head, line_no)?;
            if current.get(&name).is_some() {
                return Err(ParseError::new(line_no, format!("duplicate binding `{}`", name)));
            }
            let text = body.trim();
            if text.is_empty() {
                return Err(ParseError::new(line_no, format!("`{}` has no value", name)));
            }
            let expr = parse_expr(text)
                .map_err(|e| ParseError::new(line_no, format!("in `{}`: {}", name, e)))?;
            let binding = Binding {
                name,
                params,
                value: Value::Expr(ExprSource {
                    text: text.to_string(),
                    expr,
                }),
            };
            stack
                .last_mut()
                .map_or(&mut root, |b| &mut b.block)
                .entries
                .push(binding);
            continue;
        }

        let (head, empty) = if let Some(head) = line.strip_suffix("{}") {
            (head, true)
        } else if let Some(head) = line.strip_suffix('{') {
            (head, false)
        } else {
            return Err(ParseError::new(
                line_no,
                format!("expected `name = value` or `name {{`, found `{}`", line),
            ));
        };

        let name = head.trim();
        if !is_ident(name) {
            return Err(ParseError::new(
                line_no,
                format!("invalid block name `{}`", name),
            ));
        }
        if current.get(name).is_some() {
            return Err(ParseError::new(line_no, format!("duplicate binding `{}`", name)));
        }

        if empty {
            stack
                .last_mut()
                .map_or(&mut root, |b| &mut b.block)
                .entries
                .push(Binding {
                    name: name.to_string(),
                    params: Vec::new(),
                    value: Value::Block(Block::default()),
                });
        } else {
            stack.push(OpenBlock {
                name: name.to_string(),
                line: line_no,
                block: Block::default(),
            });
        }
    }

    if let Some(open) = stack.pop() {
        return Err(ParseError::new(
            open.line,
            format!("unclosed block `{}`", open.name),
        ));
    }

    Ok(Document::new(root))
}

/// Parse `name p1 p2 ...rest` into a name and parameter list.
fn parse_head(head: &str, line: usize) -> Result<(String, Vec<Param>), ParseError> {
    let mut words = head.split_whitespace();
    let name = words
        .next()
        .ok_or_else(|| ParseError::new(line, "missing binding name"))?;
    if !is_ident(name) {
        return Err(ParseError::new(line, format!("invalid binding name `{}`", name)));
    }

    let mut params: Vec<Param> = Vec::new();
    for word in words {
        if params.last().is_some_and(|p| p.variadic) {
            return Err(ParseError::new(
                line,
                "only the last parameter may be variadic",
            ));
        }
        let param = match word.strip_prefix("...") {
            Some(rest) => Param::variadic(rest),
            None => Param::new(word),
        };
        if !is_ident(&param.name) {
            return Err(ParseError::new(line, format!("invalid parameter `{}`", word)));
        }
        if params.iter().any(|p| p.name == param.name) {
            return Err(ParseError::new(
                line,
                format!("duplicate parameter `{}`", param.name),
            ));
        }
        params.push(param);
    }

    Ok((name.to_string(), params))
}
