//! Tree-walking evaluator.
//!
//! Names resolve in this order: call parameters, bindings in the enclosing
//! blocks (innermost first), expression builtins, standard library paths.

use crate::ast::{Block, Document, Value};
use crate::builtins::ExprBuiltins;
use crate::error::{EvalError, ValidationError};
use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::registry::FnType;
use crate::stdlib::{StdEntry, Stdlib};
use crate::value::{FuncRef, Val};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Maximum nesting of binding evaluations and calls.
const MAX_DEPTH: usize = 128;

#[derive(Debug, Default)]
struct Scope {
    /// Path of the block whose bindings are in scope.
    block: Vec<String>,
    locals: HashMap<String, Val>,
}

pub(crate) struct Evaluator<'a> {
    doc: &'a Document,
    builtins: &'a ExprBuiltins,
    stdlib: &'a Stdlib,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(doc: &'a Document, builtins: &'a ExprBuiltins, stdlib: &'a Stdlib) -> Self {
        Self {
            doc,
            builtins,
            stdlib,
            depth: 0,
        }
    }

    /// Evaluate a top-level expression against the document root.
    pub(crate) fn eval_top(&mut self, expr: &Expr) -> Result<Val, EvalError> {
        self.eval(expr, &Scope::default())
    }

    /// Evaluate every non-parameterized binding, reporting the first failure.
    pub(crate) fn validate(&mut self) -> Result<(), ValidationError> {
        let doc = self.doc;
        self.validate_block(&doc.root, &mut Vec::new())
    }

    fn validate_block(
        &mut self,
        block: &Block,
        path: &mut Vec<String>,
    ) -> Result<(), ValidationError> {
        for binding in &block.entries {
            path.push(binding.name.clone());
            match &binding.value {
                Value::Block(child) => self.validate_block(child, path)?,
                Value::Expr(_) if binding.is_parameterized() => {}
                Value::Expr(_) => {
                    self.value_of_binding(path).map_err(|source| ValidationError {
                        path: path.join("."),
                        source,
                    })?;
                }
            }
            path.pop();
        }
        Ok(())
    }

    fn enter(&mut self, name: impl FnOnce() -> String) -> Result<(), EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::RecursionLimit(name()));
        }
        self.depth += 1;
        Ok(())
    }

    fn eval(&mut self, expr: &Expr, scope: &Scope) -> Result<Val, EvalError> {
        match expr {
            Expr::Int(n) => Ok(Val::Int(*n)),
            Expr::Float(x) => Ok(Val::Float(*x)),
            Expr::Str(s) => Ok(Val::Str(s.clone())),
            Expr::Bool(b) => Ok(Val::Bool(*b)),
            Expr::List(items) => Ok(Val::List(
                items
                    .iter()
                    .map(|item| self.eval(item, scope))
                    .collect::<Result<_, _>>()?,
            )),
            Expr::Path(segments) => self.resolve_path(segments, scope),
            Expr::Call { callee, args } => {
                let func = match self.eval(callee, scope)? {
                    Val::Func(func) => func,
                    other => {
                        return Err(EvalError::Type(format!(
                            "{} is not callable",
                            other.type_name()
                        )));
                    }
                };
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                self.apply(&func, args)
            }
            Expr::Index { target, index } => {
                let target = self.eval(target, scope)?;
                let index = self.eval(index, scope)?;
                index_value(target, index)
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, scope)?;
                match (op, value) {
                    (UnaryOp::Neg, Val::Int(n)) => n
                        .checked_neg()
                        .map(Val::Int)
                        .ok_or_else(|| EvalError::Type("integer overflow".to_string())),
                    (UnaryOp::Neg, Val::Float(x)) => Ok(Val::Float(-x)),
                    (UnaryOp::Not, Val::Bool(b)) => Ok(Val::Bool(!b)),
                    (op, value) => Err(EvalError::Type(format!(
                        "cannot apply {:?} to {}",
                        op,
                        value.type_name()
                    ))),
                }
            }
            Expr::Binary { op, lhs, rhs } => match op {
                BinaryOp::And | BinaryOp::Or => {
                    let left = expect_bool(self.eval(lhs, scope)?)?;
                    let short_circuit = matches!(op, BinaryOp::Or) == left;
                    if short_circuit {
                        return Ok(Val::Bool(left));
                    }
                    Ok(Val::Bool(expect_bool(self.eval(rhs, scope)?)?))
                }
                _ => {
                    let left = self.eval(lhs, scope)?;
                    let right = self.eval(rhs, scope)?;
                    binary(*op, left, right)
                }
            },
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                if expect_bool(self.eval(cond, scope)?)? {
                    self.eval(then, scope)
                } else {
                    self.eval(otherwise, scope)
                }
            }
        }
    }

    fn resolve_path(&mut self, segments: &[String], scope: &Scope) -> Result<Val, EvalError> {
        let Some((first, rest)) = segments.split_first() else {
            return Err(EvalError::UnknownName(String::new()));
        };

        if let Some(local) = scope.locals.get(first) {
            return rest.iter().try_fold(local.clone(), |value, field| {
                field_of(value, field)
            });
        }

        if let Some(mut path) = self.find_binding(first, &scope.block) {
            path.extend(rest.iter().cloned());
            if self.doc.resolve_segments(&path).is_some() {
                return self.value_of_binding(&path);
            }
            return Err(EvalError::UnknownName(segments.join(".")));
        }

        if rest.is_empty()
            && let Some(builtin) = self.builtins.get(first)
        {
            return Ok(Val::Func(FuncRef::Builtin(builtin.name)));
        }

        let dotted = segments.join(".");
        match self.stdlib.get(&dotted) {
            Some(StdEntry::Function(_)) => Ok(Val::Func(FuncRef::Std(dotted))),
            Some(StdEntry::Namespace(_)) => Err(EvalError::Namespace(dotted)),
            None => Err(EvalError::UnknownName(dotted)),
        }
    }

    /// Find `name` in the enclosing blocks, innermost first.
    fn find_binding(&self, name: &str, block_path: &[String]) -> Option<Vec<String>> {
        (0..=block_path.len()).rev().find_map(|depth| {
            let prefix = &block_path[..depth];
            let block = if prefix.is_empty() {
                &self.doc.root
            } else {
                self.doc.resolve_segments(prefix)?.value.as_block()?
            };
            block.get(name)?;
            let mut path = prefix.to_vec();
            path.push(name.to_string());
            Some(path)
        })
    }

    fn value_of_binding(&mut self, path: &[String]) -> Result<Val, EvalError> {
        let doc = self.doc;
        let binding = doc
            .resolve_segments(path)
            .ok_or_else(|| EvalError::UnknownName(path.join(".")))?;

        if binding.is_parameterized() {
            return Ok(Val::Func(FuncRef::Binding(path.to_vec())));
        }

        self.enter(|| path.join("."))?;
        let result = match &binding.value {
            Value::Block(block) => block
                .entries
                .iter()
                .map(|child| {
                    let mut child_path = path.to_vec();
                    child_path.push(child.name.clone());
                    Ok((child.name.clone(), self.value_of_binding(&child_path)?))
                })
                .collect::<Result<Vec<_>, EvalError>>()
                .map(Val::Record),
            Value::Expr(source) => {
                let scope = Scope {
                    block: path[..path.len() - 1].to_vec(),
                    locals: HashMap::new(),
                };
                self.eval(&source.expr, &scope)
            }
        };
        self.depth -= 1;
        result
    }

    /// Call a function value with already-evaluated arguments.
    pub(crate) fn apply(&mut self, func: &FuncRef, args: Vec<Val>) -> Result<Val, EvalError> {
        match func {
            FuncRef::Binding(path) => self.apply_binding(path, args),
            FuncRef::Builtin(name) => {
                let builtins = self.builtins;
                let builtin = builtins
                    .get(name)
                    .ok_or_else(|| EvalError::UnknownName((*name).to_string()))?;
                check_arity(name, &builtin.ty, args.len())?;
                self.enter(|| (*name).to_string())?;
                let result = (builtin.call)(self, args);
                self.depth -= 1;
                result
            }
            FuncRef::Std(path) => {
                let stdlib = self.stdlib;
                let Some(StdEntry::Function(function)) = stdlib.get(path) else {
                    return Err(EvalError::UnknownName(path.clone()));
                };
                check_arity(path, &function.ty, args.len())?;
                self.enter(|| path.clone())?;
                let result = (function.call)(self, args);
                self.depth -= 1;
                result
            }
        }
    }

    fn apply_binding(&mut self, path: &[String], mut args: Vec<Val>) -> Result<Val, EvalError> {
        let doc = self.doc;
        let name = path.join(".");
        let binding = doc
            .resolve_segments(path)
            .ok_or_else(|| EvalError::UnknownName(name.clone()))?;
        let Value::Expr(source) = &binding.value else {
            return Err(EvalError::Type(format!("`{}` is a block", name)));
        };

        let variadic = binding.params.last().is_some_and(|p| p.variadic);
        let fixed = binding.params.len() - usize::from(variadic);
        let arity_ok = if variadic {
            args.len() >= fixed
        } else {
            args.len() == fixed
        };
        if !arity_ok {
            return Err(EvalError::Arity {
                name,
                expected: if variadic {
                    format!("at least {}", fixed)
                } else {
                    fixed.to_string()
                },
                got: args.len(),
            });
        }

        let mut locals = HashMap::new();
        if variadic {
            let rest = args.split_off(fixed);
            if let Some(param) = binding.params.last() {
                locals.insert(param.name.clone(), Val::List(rest));
            }
        }
        for (param, arg) in binding.params.iter().zip(args) {
            if !param.variadic {
                locals.insert(param.name.clone(), arg);
            }
        }

        let scope = Scope {
            block: path[..path.len() - 1].to_vec(),
            locals,
        };
        self.enter(|| name.clone())?;
        let result = self.eval(&source.expr, &scope);
        self.depth -= 1;
        result
    }
}

fn check_arity(name: &str, ty: &FnType, got: usize) -> Result<(), EvalError> {
    if ty.accepts(got) {
        Ok(())
    } else {
        Err(EvalError::Arity {
            name: name.to_string(),
            expected: ty.arity(),
            got,
        })
    }
}

pub(crate) fn expect_bool(value: Val) -> Result<bool, EvalError> {
    match value {
        Val::Bool(b) => Ok(b),
        other => Err(EvalError::Type(format!(
            "expected bool, got {}",
            other.type_name()
        ))),
    }
}

fn field_of(value: Val, field: &str) -> Result<Val, EvalError> {
    match value {
        Val::Record(fields) => fields
            .into_iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
            .ok_or_else(|| EvalError::UnknownName(field.to_string())),
        other => Err(EvalError::Type(format!(
            "cannot access `{}` on {}",
            field,
            other.type_name()
        ))),
    }
}

fn index_value(target: Val, index: Val) -> Result<Val, EvalError> {
    match (target, index) {
        (Val::List(items), Val::Int(i)) => {
            let len = items.len();
            usize::try_from(i)
                .ok()
                .and_then(|idx| items.into_iter().nth(idx))
                .ok_or(EvalError::Index { index: i, len })
        }
        (Val::Record(fields), Val::Str(key)) => field_of(Val::Record(fields), &key),
        (target, index) => Err(EvalError::Type(format!(
            "cannot index {} with {}",
            target.type_name(),
            index.type_name()
        ))),
    }
}

fn binary(op: BinaryOp, left: Val, right: Val) -> Result<Val, EvalError> {
    use BinaryOp::*;
    match op {
        Eq => return Ok(Val::Bool(values_equal(&left, &right))),
        Ne => return Ok(Val::Bool(!values_equal(&left, &right))),
        Lt | Le | Gt | Ge => {
            let ordering = compare(&left, &right)?;
            return Ok(Val::Bool(match op {
                Lt => ordering == Ordering::Less,
                Le => ordering != Ordering::Greater,
                Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }));
        }
        _ => {}
    }

    match (left, right) {
        (Val::Int(a), Val::Int(b)) => {
            let overflow = || EvalError::Type("integer overflow".to_string());
            match op {
                Add => a.checked_add(b).map(Val::Int).ok_or_else(overflow),
                Sub => a.checked_sub(b).map(Val::Int).ok_or_else(overflow),
                Mul => a.checked_mul(b).map(Val::Int).ok_or_else(overflow),
                Div if b == 0 => Err(EvalError::DivisionByZero),
                Div => a.checked_div(b).map(Val::Int).ok_or_else(overflow),
                Rem if b == 0 => Err(EvalError::DivisionByZero),
                Rem => a.checked_rem(b).map(Val::Int).ok_or_else(overflow),
                _ => unreachable_op(op),
            }
        }
        (Val::Str(a), Val::Str(b)) if op == Add => Ok(Val::Str(a + &b)),
        (Val::List(mut a), Val::List(b)) if op == Add => {
            a.extend(b);
            Ok(Val::List(a))
        }
        (left, right) => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => match op {
                Add => Ok(Val::Float(a + b)),
                Sub => Ok(Val::Float(a - b)),
                Mul => Ok(Val::Float(a * b)),
                Div if b == 0.0 => Err(EvalError::DivisionByZero),
                Div => Ok(Val::Float(a / b)),
                Rem if b == 0.0 => Err(EvalError::DivisionByZero),
                Rem => Ok(Val::Float(a % b)),
                _ => unreachable_op(op),
            },
            _ => Err(EvalError::Type(format!(
                "cannot apply {:?} to {} and {}",
                op,
                left.type_name(),
                right.type_name()
            ))),
        },
    }
}

fn unreachable_op(op: BinaryOp) -> Result<Val, EvalError> {
    Err(EvalError::Type(format!("unsupported operator {:?}", op)))
}

pub(crate) fn values_equal(left: &Val, right: &Val) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

pub(crate) fn compare(left: &Val, right: &Val) -> Result<Ordering, EvalError> {
    match (left, right) {
        (Val::Str(a), Val::Str(b)) => Ok(a.cmp(b)),
        (Val::Int(a), Val::Int(b)) => Ok(a.cmp(b)),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a
                .partial_cmp(&b)
                .ok_or_else(|| EvalError::Type("cannot compare NaN".to_string())),
            _ => Err(EvalError::Type(format!(
                "cannot compare {} with {}",
                left.type_name(),
                right.type_name()
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::Engine;
    use crate::error::EvalError;
    use crate::value::Val;

    const SOURCE: &str = r#"
greeting = "hello"
retries = 3
add a b = a + b
concat ...parts = join(parts, "")
is-even n = n % 2 == 0
nested {
  factor = 10
  multiply x y = x * y * factor
  inner {
    depth = factor + 1
  }
}
loop = loop + 1
"#;

    fn engine() -> Result<Engine, String> {
        Engine::from_source(SOURCE).map_err(|e| e.to_string())
    }

    #[test]
    fn test_arithmetic_and_calls() -> Result<(), String> {
        let engine = engine()?;
        assert_eq!(engine.evaluate("add(2, 3)"), Ok(Val::Int(5)));
        assert_eq!(engine.evaluate("1 + 2 * 3"), Ok(Val::Int(7)));
        assert_eq!(engine.evaluate("7 / 2.0"), Ok(Val::Float(3.5)));
        assert_eq!(engine.evaluate("nested.multiply(2, 3)"), Ok(Val::Int(60)));
        Ok(())
    }

    #[test]
    fn test_enclosing_block_scope() -> Result<(), String> {
        let engine = engine()?;
        assert_eq!(engine.evaluate("nested.inner.depth"), Ok(Val::Int(11)));
        Ok(())
    }

    #[test]
    fn test_variadic_binding() -> Result<(), String> {
        let engine = engine()?;
        assert_eq!(
            engine.evaluate(r#"concat("a", "b", "c")"#),
            Ok(Val::Str("abc".to_string()))
        );
        assert_eq!(engine.evaluate("concat()"), Ok(Val::Str(String::new())));
        Ok(())
    }

    #[test]
    fn test_functions_are_values() -> Result<(), String> {
        let engine = engine()?;
        assert_eq!(
            engine.evaluate("filter(range(1, 7), is-even)"),
            Ok(Val::List(vec![Val::Int(2), Val::Int(4), Val::Int(6)]))
        );
        Ok(())
    }

    #[test]
    fn test_block_evaluates_to_record() -> Result<(), String> {
        let engine = engine()?;
        let value = engine.evaluate("nested.inner").map_err(|e| e.to_string())?;
        assert_eq!(value.to_string(), "{depth = 11}");
        Ok(())
    }

    #[test]
    fn test_errors() -> Result<(), String> {
        let engine = engine()?;
        assert!(matches!(
            engine.evaluate("missing"),
            Err(EvalError::UnknownName(_))
        ));
        assert!(matches!(
            engine.evaluate("add(1)"),
            Err(EvalError::Arity { .. })
        ));
        assert_eq!(engine.evaluate("1 / 0"), Err(EvalError::DivisionByZero));
        assert!(matches!(
            engine.evaluate("strings"),
            Err(EvalError::Namespace(_))
        ));
        assert!(matches!(
            engine.evaluate("loop"),
            Err(EvalError::RecursionLimit(_))
        ));
        assert!(matches!(engine.evaluate("1 +"), Err(EvalError::Syntax(_))));
        Ok(())
    }

    #[test]
    fn test_short_circuit() -> Result<(), String> {
        let engine = engine()?;
        assert_eq!(engine.evaluate("true || missing"), Ok(Val::Bool(true)));
        assert_eq!(engine.evaluate("false && missing"), Ok(Val::Bool(false)));
        Ok(())
    }

    #[test]
    fn test_validate_reports_failing_binding() -> Result<(), String> {
        let engine = engine()?;
        let err = engine.validate().err().ok_or("expected validation failure")?;
        assert_eq!(err.path, "loop");

        let healthy = crate::Engine::from_source("a = 1\nb = a + 1\n").map_err(|e| e.to_string())?;
        assert!(healthy.validate().is_ok());
        Ok(())
    }
}
