//! Detect whether the cursor sits inside a call's argument list.

use tether_lang::is_ident_char;

/// The innermost unclosed call around the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// Callee name, possibly dotted (`nested.multiply`).
    pub name: String,
    /// Zero-based index of the argument under the cursor.
    pub arg_index: usize,
    /// Byte offset of the opening parenthesis.
    pub open_paren: usize,
}

pub fn detect_function_call(input: &str, cursor: usize) -> Option<CallContext> {
    let mut cursor = cursor.min(input.len());
    while cursor > 0 && !input.is_char_boundary(cursor) {
        cursor -= 1;
    }
    let head = &input[..cursor];

    let mut depth = 0usize;
    let mut open_paren = None;
    for (i, c) in head.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' if depth == 0 => {
                open_paren = Some(i);
                break;
            }
            '(' => depth -= 1,
            _ => {}
        }
    }
    let open_paren = open_paren?;

    let callee = &head[..open_paren];
    let name_start = callee
        .char_indices()
        .rev()
        .find(|&(_, c)| c != '.' && !is_ident_char(c))
        .map_or(0, |(i, c)| i + c.len_utf8());
    let name = &callee[name_start..];
    if name.is_empty() {
        return None;
    }

    let mut nesting = 0usize;
    let mut arg_index = 0;
    for c in head[open_paren + 1..].chars() {
        match c {
            '(' | '[' | '{' => nesting += 1,
            ')' | ']' | '}' => nesting = nesting.saturating_sub(1),
            ',' if nesting == 0 => arg_index += 1,
            _ => {}
        }
    }

    Some(CallContext {
        name: name.to_string(),
        arg_index,
        open_paren,
    })
}
