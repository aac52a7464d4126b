//! Flat registry of expression builtins (`len`, `join`, `filter`, ...).

use crate::error::EvalError;
use crate::eval::{Evaluator, compare, expect_bool, values_equal};
use crate::registry::{FnType, Kind, NativeFn, Registry, RegistryEntry};
use crate::value::{MAX_GENERATED_LEN, Val};

/// A native function callable from any expression by its bare name.
pub struct ExprBuiltin {
    pub name: &'static str,
    pub ty: FnType,
    pub(crate) call: NativeFn,
}

impl std::fmt::Debug for ExprBuiltin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExprBuiltin")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .finish()
    }
}

#[derive(Debug)]
pub struct ExprBuiltins {
    entries: Vec<ExprBuiltin>,
}

impl Default for ExprBuiltins {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! builtin {
    ($name:literal, $ty:expr, $call:expr) => {
        ExprBuiltin {
            name: $name,
            ty: $ty,
            call: $call,
        }
    };
}

impl ExprBuiltins {
    pub fn new() -> Self {
        use Kind::*;
        let entries = vec![
            builtin!("len", FnType::fixed(&[Any]), len),
            builtin!("upper", FnType::fixed(&[String]), upper),
            builtin!("lower", FnType::fixed(&[String]), lower),
            builtin!("trim", FnType::fixed(&[String]), trim),
            builtin!("join", FnType::fixed(&[Any, String]), join),
            builtin!("split", FnType::fixed(&[String, String]), split),
            builtin!("contains", FnType::fixed(&[Any, Any]), contains),
            builtin!("filter", FnType::fixed(&[Any, Func]), filter),
            builtin!("map", FnType::fixed(&[Any, Func]), map),
            builtin!("all", FnType::fixed(&[Any, Func]), all),
            builtin!("any", FnType::fixed(&[Any, Func]), any),
            builtin!("sum", FnType::fixed(&[Any]), sum),
            builtin!("max", FnType::variadic(&[Int]), max),
            builtin!("min", FnType::variadic(&[Int]), min),
            builtin!("str", FnType::fixed(&[Any]), to_str),
            builtin!("int", FnType::fixed(&[Any]), to_int),
            builtin!("range", FnType::fixed(&[Int, Int]), range),
            builtin!("abs", FnType::fixed(&[Int]), abs),
        ];
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&ExprBuiltin> {
        self.entries.iter().find(|b| b.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExprBuiltin> {
        self.entries.iter()
    }
}

impl Registry for ExprBuiltins {
    fn top_level(&self) -> Vec<&str> {
        self.entries.iter().map(|b| b.name).collect()
    }

    fn lookup(&self, path: &str) -> Option<RegistryEntry<'_>> {
        if path.contains('.') {
            return None;
        }
        self.get(path).map(|b| RegistryEntry::Function(&b.ty))
    }
}

fn type_error(name: &str, expected: &str, got: &Val) -> EvalError {
    EvalError::Type(format!(
        "{} expects {}, got {}",
        name,
        expected,
        got.type_name()
    ))
}

fn string_arg(name: &str, value: &Val) -> Result<String, EvalError> {
    match value {
        Val::Str(s) => Ok(s.clone()),
        other => Err(type_error(name, "a string", other)),
    }
}

fn int_arg(name: &str, value: &Val) -> Result<i64, EvalError> {
    match value {
        Val::Int(n) => Ok(*n),
        other => Err(type_error(name, "an int", other)),
    }
}

fn list_arg(name: &str, value: Val) -> Result<Vec<Val>, EvalError> {
    match value {
        Val::List(items) => Ok(items),
        other => Err(type_error(name, "a list", &other)),
    }
}

fn func_arg(name: &str, value: Val) -> Result<crate::value::FuncRef, EvalError> {
    match value {
        Val::Func(func) => Ok(func),
        other => Err(type_error(name, "a function", &other)),
    }
}

/// Split a two-argument call into (list, function).
fn list_and_func(
    name: &str,
    args: Vec<Val>,
) -> Result<(Vec<Val>, crate::value::FuncRef), EvalError> {
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(list), Some(func)) => Ok((list_arg(name, list)?, func_arg(name, func)?)),
        _ => Err(EvalError::Arity {
            name: name.to_string(),
            expected: "2".to_string(),
            got: 0,
        }),
    }
}

fn first(args: &[Val]) -> Result<&Val, EvalError> {
    args.first()
        .ok_or_else(|| EvalError::Type("missing argument".to_string()))
}

fn second(args: &[Val]) -> Result<&Val, EvalError> {
    args.get(1)
        .ok_or_else(|| EvalError::Type("missing argument".to_string()))
}

fn len(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let n = match first(&args)? {
        Val::Str(s) => s.chars().count(),
        Val::List(items) => items.len(),
        Val::Record(fields) => fields.len(),
        other => return Err(type_error("len", "a string, list or record", other)),
    };
    Ok(Val::Int(n as i64))
}

fn upper(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    Ok(Val::Str(string_arg("upper", first(&args)?)?.to_uppercase()))
}

fn lower(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    Ok(Val::Str(string_arg("lower", first(&args)?)?.to_lowercase()))
}

fn trim(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    Ok(Val::Str(string_arg("trim", first(&args)?)?.trim().to_string()))
}

fn join(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let separator = string_arg("join", second(&args)?)?;
    let items = list_arg("join", first(&args)?.clone())?;
    let parts: Vec<_> = items.iter().map(Val::to_plain_string).collect();
    Ok(Val::Str(parts.join(&separator)))
}

fn split(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let text = string_arg("split", first(&args)?)?;
    let separator = string_arg("split", second(&args)?)?;
    if separator.is_empty() {
        return Err(EvalError::Type("split separator must not be empty".to_string()));
    }
    Ok(Val::List(
        text.split(separator.as_str())
            .map(|part| Val::Str(part.to_string()))
            .collect(),
    ))
}

fn contains(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let needle = second(&args)?;
    let found = match first(&args)? {
        Val::List(items) => items.iter().any(|item| values_equal(item, needle)),
        Val::Str(haystack) => haystack.contains(string_arg("contains", needle)?.as_str()),
        Val::Record(fields) => {
            let key = string_arg("contains", needle)?;
            fields.iter().any(|(name, _)| *name == key)
        }
        other => return Err(type_error("contains", "a list, string or record", other)),
    };
    Ok(Val::Bool(found))
}

fn filter(eval: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let (items, func) = list_and_func("filter", args)?;
    let mut kept = Vec::new();
    for item in items {
        if expect_bool(eval.apply(&func, vec![item.clone()])?)? {
            kept.push(item);
        }
    }
    Ok(Val::List(kept))
}

fn map(eval: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let (items, func) = list_and_func("map", args)?;
    items
        .into_iter()
        .map(|item| eval.apply(&func, vec![item]))
        .collect::<Result<_, _>>()
        .map(Val::List)
}

fn all(eval: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let (items, func) = list_and_func("all", args)?;
    for item in items {
        if !expect_bool(eval.apply(&func, vec![item])?)? {
            return Ok(Val::Bool(false));
        }
    }
    Ok(Val::Bool(true))
}

fn any(eval: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let (items, func) = list_and_func("any", args)?;
    for item in items {
        if expect_bool(eval.apply(&func, vec![item])?)? {
            return Ok(Val::Bool(true));
        }
    }
    Ok(Val::Bool(false))
}

fn sum(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let items = list_arg("sum", first(&args)?.clone())?;
    let mut int_total: i64 = 0;
    let mut float_total: Option<f64> = None;
    for item in &items {
        match item {
            Val::Int(n) => {
                int_total = int_total
                    .checked_add(*n)
                    .ok_or_else(|| EvalError::Type("integer overflow".to_string()))?;
            }
            Val::Float(x) => *float_total.get_or_insert(0.0) += x,
            other => return Err(type_error("sum", "a list of numbers", other)),
        }
    }
    Ok(match float_total {
        Some(x) => Val::Float(x + int_total as f64),
        None => Val::Int(int_total),
    })
}

fn extreme(name: &str, args: Vec<Val>, want: std::cmp::Ordering) -> Result<Val, EvalError> {
    let mut best: Option<Val> = None;
    for arg in args {
        let replace = match &best {
            None => true,
            Some(current) => compare(&arg, current)? == want,
        };
        if replace {
            best = Some(arg);
        }
    }
    best.ok_or_else(|| EvalError::Arity {
        name: name.to_string(),
        expected: "at least 1".to_string(),
        got: 0,
    })
}

fn max(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    extreme("max", args, std::cmp::Ordering::Greater)
}

fn min(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    extreme("min", args, std::cmp::Ordering::Less)
}

fn to_str(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    Ok(Val::Str(first(&args)?.to_plain_string()))
}

fn to_int(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    match first(&args)? {
        Val::Int(n) => Ok(Val::Int(*n)),
        Val::Float(x) => Ok(Val::Int(x.trunc() as i64)),
        Val::Bool(b) => Ok(Val::Int(i64::from(*b))),
        Val::Str(s) => s
            .trim()
            .parse()
            .map(Val::Int)
            .map_err(|_| EvalError::Type(format!("cannot convert {:?} to int", s))),
        other => Err(type_error("int", "a number, bool or string", other)),
    }
}

fn range(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let start = int_arg("range", first(&args)?)?;
    let end = int_arg("range", second(&args)?)?;
    let len = if end <= start {
        0
    } else {
        end.checked_sub(start).unwrap_or(i64::MAX)
    };
    if len > MAX_GENERATED_LEN as i64 {
        return Err(EvalError::TooLarge {
            name: "range".to_string(),
            limit: MAX_GENERATED_LEN,
        });
    }
    Ok(Val::List((start..end).map(Val::Int).collect()))
}

fn abs(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let n = int_arg("abs", first(&args)?)?;
    n.checked_abs()
        .map(Val::Int)
        .ok_or_else(|| EvalError::Type("integer overflow".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Engine;

    #[test]
    fn test_registry_lookup() {
        let builtins = ExprBuiltins::new();
        assert!(builtins.is_callable("join"));
        assert!(!builtins.is_callable("strings.repeat"));
        assert!(builtins.lookup("nope").is_none());
        assert!(builtins.top_level().contains(&"filter"));
    }

    #[test]
    fn test_string_builtins() -> Result<(), String> {
        let engine = Engine::from_source("").map_err(|e| e.to_string())?;
        let eval = |src: &str| engine.evaluate(src).map_err(|e| e.to_string());
        assert_eq!(eval(r#"upper("abc")"#)?, Val::Str("ABC".into()));
        assert_eq!(eval(r#"trim("  x ")"#)?, Val::Str("x".into()));
        assert_eq!(eval(r#"join(["a", 1], "-")"#)?, Val::Str("a-1".into()));
        assert_eq!(eval(r#"len(split("a,b,c", ","))"#)?, Val::Int(3));
        assert_eq!(eval(r#"contains("hello", "ell")"#)?, Val::Bool(true));
        Ok(())
    }

    #[test]
    fn test_numeric_builtins() -> Result<(), String> {
        let engine = Engine::from_source("").map_err(|e| e.to_string())?;
        let eval = |src: &str| engine.evaluate(src).map_err(|e| e.to_string());
        assert_eq!(eval("sum([1, 2, 3])")?, Val::Int(6));
        assert_eq!(eval("sum([1, 0.5])")?, Val::Float(1.5));
        assert_eq!(eval("max(3, 9, 4)")?, Val::Int(9));
        assert_eq!(eval("min(3, 9, 4)")?, Val::Int(3));
        assert_eq!(eval("abs(-4)")?, Val::Int(4));
        assert_eq!(eval(r#"int("42")"#)?, Val::Int(42));
        assert_eq!(eval("range(0, 3)")?.to_string(), "[0, 1, 2]");
        Ok(())
    }

    #[test]
    fn test_range_is_bounded() -> Result<(), String> {
        let engine = Engine::from_source("").map_err(|e| e.to_string())?;
        assert!(matches!(
            engine.evaluate("range(0, 4000000000000)"),
            Err(EvalError::TooLarge { .. })
        ));
        assert!(matches!(
            engine.evaluate("range(-9223372036854775807, 9223372036854775807)"),
            Err(EvalError::TooLarge { .. })
        ));
        assert_eq!(engine.evaluate("range(5, 2)"), Ok(Val::List(Vec::new())));
        Ok(())
    }

    #[test]
    fn test_higher_order_builtins() -> Result<(), String> {
        let engine = Engine::from_source("positive n = n > 0\ndouble n = n * 2\n")
            .map_err(|e| e.to_string())?;
        let eval = |src: &str| engine.evaluate(src).map_err(|e| e.to_string());
        assert_eq!(eval("map([1, 2], double)")?.to_string(), "[2, 4]");
        assert_eq!(eval("all([1, 2], positive)")?, Val::Bool(true));
        assert_eq!(eval("any([-1, -2], positive)")?, Val::Bool(false));
        assert!(engine.evaluate("filter([1], 3)").is_err());
        Ok(())
    }
}
