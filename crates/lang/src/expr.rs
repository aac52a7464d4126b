//! Expression syntax: tokenizer and recursive-descent parser.
//!
//! Precedence, lowest first: ternary `?:`, `||`, `&&`, comparisons,
//! `+ -`, `* / %`, unary `- !`, postfix call / index.

use crate::error::ExprSyntaxError;
use std::fmt;

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    List(Vec<Expr>),
    /// A possibly dotted reference, e.g. `nested.multiply`.
    Path(Vec<String>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    fn from_symbol(sym: &str) -> Option<Self> {
        Some(match sym {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        })
    }
}

/// Identifier start character.
pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Identifier continuation character. Hyphens are allowed inside names.
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Whether `s` is a valid identifier.
pub fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_char)
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Sym(&'static str),
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::Int(n) => write!(f, "{}", n),
            Tok::Float(x) => write!(f, "{}", x),
            Tok::Str(s) => write!(f, "\"{}\"", s),
            Tok::Ident(s) => write!(f, "{}", s),
            Tok::Sym(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    offset: usize,
}

const TWO_CHAR_SYMBOLS: &[&str] = &["==", "!=", "<=", ">=", "&&", "||"];
const ONE_CHAR_SYMBOLS: &[&str] = &[
    "+", "-", "*", "/", "%", "<", ">", "!", "?", ":", "(", ")", "[", "]", ",", ".",
];

fn tokenize(src: &str) -> Result<Vec<Token>, ExprSyntaxError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let mut j = i;
            while j < chars.len() && chars[j].1.is_ascii_digit() {
                j += 1;
            }
            let is_float =
                j + 1 < chars.len() && chars[j].1 == '.' && chars[j + 1].1.is_ascii_digit();
            if is_float {
                j += 1;
                while j < chars.len() && chars[j].1.is_ascii_digit() {
                    j += 1;
                }
            }
            let end = chars.get(j).map_or(src.len(), |&(o, _)| o);
            let text = &src[offset..end];
            let tok = if is_float {
                Tok::Float(
                    text.parse()
                        .map_err(|_| ExprSyntaxError::new(offset, "invalid float literal"))?,
                )
            } else {
                Tok::Int(
                    text.parse()
                        .map_err(|_| ExprSyntaxError::new(offset, "integer literal out of range"))?,
                )
            };
            tokens.push(Token { tok, offset });
            i = j;
            continue;
        }

        if is_ident_start(c) {
            let mut j = i;
            while j < chars.len() && is_ident_char(chars[j].1) {
                j += 1;
            }
            let end = chars.get(j).map_or(src.len(), |&(o, _)| o);
            tokens.push(Token {
                tok: Tok::Ident(src[offset..end].to_string()),
                offset,
            });
            i = j;
            continue;
        }

        if c == '"' {
            let mut value = String::new();
            let mut j = i + 1;
            let mut closed = false;
            while j < chars.len() {
                match chars[j].1 {
                    '"' => {
                        closed = true;
                        j += 1;
                        break;
                    }
                    '\\' => {
                        let Some(&(esc_offset, esc)) = chars.get(j + 1) else {
                            break;
                        };
                        value.push(match esc {
                            'n' => '\n',
                            't' => '\t',
                            '"' => '"',
                            '\\' => '\\',
                            other => {
                                return Err(ExprSyntaxError::new(
                                    esc_offset,
                                    format!("unknown escape `\\{}`", other),
                                ));
                            }
                        });
                        j += 2;
                    }
                    other => {
                        value.push(other);
                        j += 1;
                    }
                }
            }
            if !closed {
                return Err(ExprSyntaxError::new(offset, "unterminated string"));
            }
            tokens.push(Token {
                tok: Tok::Str(value),
                offset,
            });
            i = j;
            continue;
        }

        let rest = &src[offset..];
        if let Some(sym) = TWO_CHAR_SYMBOLS.iter().find(|s| rest.starts_with(**s)) {
            tokens.push(Token {
                tok: Tok::Sym(*sym),
                offset,
            });
            i += 2;
            continue;
        }
        if let Some(sym) = ONE_CHAR_SYMBOLS.iter().find(|s| rest.starts_with(**s)) {
            tokens.push(Token {
                tok: Tok::Sym(*sym),
                offset,
            });
            i += 1;
            continue;
        }

        return Err(ExprSyntaxError::new(
            offset,
            format!("unexpected character `{}`", c),
        ));
    }

    Ok(tokens)
}

/// Parse a single expression.
pub fn parse_expr(src: &str) -> Result<Expr, ExprSyntaxError> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(ExprSyntaxError::new(0, "empty expression"));
    }
    let mut parser = ExprParser {
        tokens,
        pos: 0,
        end: src.len(),
        depth: 0,
    };
    let expr = parser.ternary()?;
    if let Some(token) = parser.tokens.get(parser.pos) {
        return Err(ExprSyntaxError::new(
            token.offset,
            format!("unexpected `{}`", token.tok),
        ));
    }
    Ok(expr)
}

/// Maximum depth of the parsed tree: parentheses, operator chains and
/// call or index suffixes all count.
const MAX_NESTING: usize = 128;

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |t| t.offset)
    }

    fn peek_sym(&self) -> Option<&'static str> {
        match self.peek() {
            Some(Tok::Sym(s)) => Some(*s),
            _ => None,
        }
    }

    fn eat(&mut self, sym: &str) -> bool {
        if self.peek_sym() == Some(sym) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, sym: &str) -> Result<(), ExprSyntaxError> {
        if self.eat(sym) {
            return Ok(());
        }
        let found = match self.peek() {
            Some(tok) => format!("`{}`", tok),
            None => "end of input".to_string(),
        };
        Err(ExprSyntaxError::new(
            self.offset(),
            format!("expected `{}`, found {}", sym, found),
        ))
    }

    fn descend(&mut self) -> Result<(), ExprSyntaxError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ExprSyntaxError::new(
                self.offset(),
                format!("expression nested deeper than {}", MAX_NESTING),
            ));
        }
        Ok(())
    }

    fn ternary(&mut self) -> Result<Expr, ExprSyntaxError> {
        self.descend()?;
        let expr = self.conditional();
        self.depth -= 1;
        expr
    }

    fn conditional(&mut self) -> Result<Expr, ExprSyntaxError> {
        let cond = self.binary_level(0)?;
        if !self.eat("?") {
            return Ok(cond);
        }
        let then = self.ternary()?;
        self.expect(":")?;
        let otherwise = self.ternary()?;
        Ok(Expr::Ternary {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// Left-associative binary levels, loosest first. Comparisons do not chain.
    fn binary_level(&mut self, level: usize) -> Result<Expr, ExprSyntaxError> {
        const LEVELS: &[&[&str]] = &[
            &["||"],
            &["&&"],
            &["==", "!=", "<", "<=", ">", ">="],
            &["+", "-"],
            &["*", "/", "%"],
        ];
        let Some(ops) = LEVELS.get(level) else {
            return self.unary();
        };
        let comparison = level == 2;

        let base = self.depth;
        let mut lhs = self.binary_level(level + 1)?;
        while let Some(sym) = self.peek_sym().filter(|s| ops.contains(s)) {
            self.pos += 1;
            self.descend()?;
            let rhs = self.binary_level(level + 1)?;
            let op = BinaryOp::from_symbol(sym)
                .ok_or_else(|| ExprSyntaxError::new(self.offset(), "unknown operator"))?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
            if comparison {
                break;
            }
        }
        self.depth = base;
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ExprSyntaxError> {
        let op = if self.eat("-") {
            UnaryOp::Neg
        } else if self.eat("!") {
            UnaryOp::Not
        } else {
            return self.postfix();
        };
        self.descend()?;
        let operand = self.unary();
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn postfix(&mut self) -> Result<Expr, ExprSyntaxError> {
        let base = self.depth;
        let mut expr = self.primary()?;
        loop {
            if matches!(self.peek_sym(), Some("(" | "[")) {
                self.descend()?;
            }
            if self.eat("(") {
                let args = self.comma_list(")")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else if self.eat("[") {
                let index = self.ternary()?;
                self.expect("]")?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                self.depth = base;
                return Ok(expr);
            }
        }
    }

    fn comma_list(&mut self, close: &str) -> Result<Vec<Expr>, ExprSyntaxError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.ternary()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(",")?;
        }
    }

    fn primary(&mut self) -> Result<Expr, ExprSyntaxError> {
        let offset = self.offset();
        let Some(tok) = self.peek().cloned() else {
            return Err(ExprSyntaxError::new(offset, "unexpected end of input"));
        };
        self.pos += 1;
        match tok {
            Tok::Int(n) => Ok(Expr::Int(n)),
            Tok::Float(x) => Ok(Expr::Float(x)),
            Tok::Str(s) => Ok(Expr::Str(s)),
            Tok::Ident(name) if name == "true" => Ok(Expr::Bool(true)),
            Tok::Ident(name) if name == "false" => Ok(Expr::Bool(false)),
            Tok::Ident(name) => {
                let mut segments = vec![name];
                while self.peek_sym() == Some(".") {
                    match self.tokens.get(self.pos + 1).map(|t| &t.tok) {
                        Some(Tok::Ident(next)) => {
                            segments.push(next.clone());
                            self.pos += 2;
                        }
                        _ => {
                            return Err(ExprSyntaxError::new(
                                self.offset(),
                                "expected a name after `.`",
                            ));
                        }
                    }
                }
                Ok(Expr::Path(segments))
            }
            Tok::Sym("(") => {
                let inner = self.ternary()?;
                self.expect(")")?;
                Ok(inner)
            }
            Tok::Sym("[") => Ok(Expr::List(self.comma_list("]")?)),
            other => Err(ExprSyntaxError::new(
                offset,
                format!("unexpected `{}`", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Expr {
        Expr::Path(segments.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_precedence() -> Result<(), ExprSyntaxError> {
        let expr = parse_expr("1 + 2 * 3")?;
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(Expr::Int(1)),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    lhs: Box::new(Expr::Int(2)),
                    rhs: Box::new(Expr::Int(3)),
                }),
            }
        );
        Ok(())
    }

    #[test]
    fn test_dotted_call() -> Result<(), ExprSyntaxError> {
        let expr = parse_expr("nested.multiply(5, x)")?;
        assert_eq!(
            expr,
            Expr::Call {
                callee: Box::new(path(&["nested", "multiply"])),
                args: vec![Expr::Int(5), path(&["x"])],
            }
        );
        Ok(())
    }

    #[test]
    fn test_hyphenated_identifier_is_one_name() -> Result<(), ExprSyntaxError> {
        assert_eq!(parse_expr("max-retries")?, path(&["max-retries"]));
        assert!(matches!(
            parse_expr("a - b")?,
            Expr::Binary {
                op: BinaryOp::Sub,
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn test_ternary_and_strings() -> Result<(), ExprSyntaxError> {
        let expr = parse_expr(r#"ok ? "yes\n" : "no""#)?;
        assert_eq!(
            expr,
            Expr::Ternary {
                cond: Box::new(path(&["ok"])),
                then: Box::new(Expr::Str("yes\n".to_string())),
                otherwise: Box::new(Expr::Str("no".to_string())),
            }
        );
        Ok(())
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_expr("").is_err());
        assert!(parse_expr("1 +").is_err());
        assert!(parse_expr("add(1, 2").is_err());
        assert!(parse_expr("\"open").is_err());
        assert!(parse_expr("a.").is_err());
        assert!(parse_expr("1 2").is_err());
        assert!(parse_expr("a @ b").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let deep_parens = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(parse_expr(&deep_parens).is_err_and(|e| e.message.contains("nested deeper")));

        let long_sum = vec!["1"; 10_000].join(" + ");
        assert!(parse_expr(&long_sum).is_err());
        assert!(parse_expr(&"-".repeat(10_000)).is_err());
        assert!(parse_expr(&format!("f{}", "()".repeat(10_000))).is_err());

        let shallow = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(parse_expr(&shallow), Ok(Expr::Int(1)));
        assert!(parse_expr(&vec!["1"; 60].join(" + ")).is_ok());
    }

    #[test]
    fn test_is_ident() {
        assert!(is_ident("greeting"));
        assert!(is_ident("max-retries"));
        assert!(is_ident("_x1"));
        assert!(!is_ident("1x"));
        assert!(!is_ident(""));
        assert!(!is_ident("a.b"));
    }
}
