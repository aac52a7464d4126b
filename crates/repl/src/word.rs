//! Cursor-relative word and parent-path extraction.

use tether_lang::is_ident_char;

/// Characters that separate completion words. Hyphens are not boundaries so
/// hyphenated names stay whole.
pub fn is_boundary(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '.' | '('
                | ')'
                | '['
                | ']'
                | '{'
                | '}'
                | '+'
                | '*'
                | '/'
                | '%'
                | '='
                | '<'
                | '>'
                | '!'
                | '&'
                | '|'
                | ','
                | '?'
                | ':'
                | ';'
        )
}

/// The word around the cursor as a half-open byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

fn floor_char_boundary(s: &str, pos: usize) -> usize {
    let mut p = pos.min(s.len());
    while p > 0 && !s.is_char_boundary(p) {
        p -= 1;
    }
    p
}

/// Find the word containing `cursor`.
///
/// A cursor sitting right after a boundary with a boundary (or end of input)
/// after it yields an empty word at the cursor.
pub fn word_bounds(input: &str, cursor: usize) -> Word<'_> {
    let cursor = floor_char_boundary(input, cursor);
    let start = input[..cursor]
        .char_indices()
        .rev()
        .find(|&(_, c)| is_boundary(c))
        .map_or(0, |(i, c)| i + c.len_utf8());
    let end = input[cursor..]
        .char_indices()
        .find(|&(_, c)| is_boundary(c))
        .map_or(input.len(), |(i, _)| cursor + i);
    Word {
        text: &input[start..end],
        start,
        end,
    }
}

/// The dotted chain of identifiers immediately before `word_start`.
///
/// `parent_path("nested.inner.x", 13)` is `"nested.inner"`; a word with no
/// dot chain in front of it has an empty parent.
pub fn parent_path(input: &str, word_start: usize) -> &str {
    let head = &input[..floor_char_boundary(input, word_start)];
    let head = head.trim_end_matches('.');
    let start = head
        .char_indices()
        .rev()
        .find(|&(_, c)| c != '.' && !is_ident_char(c))
        .map_or(0, |(i, c)| i + c.len_utf8());
    head[start..].trim_matches('.')
}
