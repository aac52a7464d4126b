//! Nested standard library (`strings.case.snake`, `math.pow`, ...).

use crate::error::EvalError;
use crate::eval::Evaluator;
use crate::registry::{FnType, Kind, NativeFn, Registry, RegistryEntry};
use crate::value::{MAX_GENERATED_LEN, Val};
use std::collections::BTreeMap;

pub struct StdFunction {
    pub ty: FnType,
    pub(crate) call: NativeFn,
}

impl std::fmt::Debug for StdFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdFunction").field("ty", &self.ty).finish()
    }
}

/// A node in the standard library tree.
#[derive(Debug)]
pub enum StdEntry {
    Namespace(BTreeMap<&'static str, StdEntry>),
    Function(StdFunction),
}

#[derive(Debug)]
pub struct Stdlib {
    root: BTreeMap<&'static str, StdEntry>,
}

impl Default for Stdlib {
    fn default() -> Self {
        Self::new()
    }
}

fn function(params: &'static [Kind], call: NativeFn) -> StdEntry {
    StdEntry::Function(StdFunction {
        ty: FnType::fixed(params),
        call,
    })
}

fn namespace<const N: usize>(entries: [(&'static str, StdEntry); N]) -> StdEntry {
    StdEntry::Namespace(BTreeMap::from(entries))
}

impl Stdlib {
    pub fn new() -> Self {
        use Kind::*;
        let root = BTreeMap::from([
            (
                "strings",
                namespace([
                    ("repeat", function(&[String, Int], strings_repeat)),
                    ("reverse", function(&[String], strings_reverse)),
                    ("has_prefix", function(&[String, String], strings_has_prefix)),
                    (
                        "case",
                        namespace([
                            ("snake", function(&[String], case_snake)),
                            ("kebab", function(&[String], case_kebab)),
                        ]),
                    ),
                ]),
            ),
            (
                "math",
                namespace([
                    ("pow", function(&[Int, Int], math_pow)),
                    ("clamp", function(&[Int, Int, Int], math_clamp)),
                ]),
            ),
            (
                "list",
                namespace([
                    ("first", function(&[Any], list_first)),
                    ("last", function(&[Any], list_last)),
                    ("reverse", function(&[Any], list_reverse)),
                    (
                        "concat",
                        StdEntry::Function(StdFunction {
                            ty: FnType::variadic(&[Any]),
                            call: list_concat,
                        }),
                    ),
                ]),
            ),
        ]);
        Self { root }
    }

    /// Walk the nested maps along a dotted path.
    pub fn get(&self, path: &str) -> Option<&StdEntry> {
        let mut segments = path.split('.');
        let mut entry = self.root.get(segments.next()?)?;
        for segment in segments {
            match entry {
                StdEntry::Namespace(children) => entry = children.get(segment)?,
                StdEntry::Function(_) => return None,
            }
        }
        Some(entry)
    }

    /// Every callable's full dotted path, sorted.
    pub fn functions(&self) -> Vec<(String, &FnType)> {
        fn walk<'a>(
            prefix: &str,
            map: &'a BTreeMap<&'static str, StdEntry>,
            out: &mut Vec<(String, &'a FnType)>,
        ) {
            for (name, entry) in map {
                let path = if prefix.is_empty() {
                    (*name).to_string()
                } else {
                    format!("{}.{}", prefix, name)
                };
                match entry {
                    StdEntry::Namespace(children) => walk(&path, children, out),
                    StdEntry::Function(function) => out.push((path, &function.ty)),
                }
            }
        }

        let mut out = Vec::new();
        walk("", &self.root, &mut out);
        out
    }
}

impl Registry for Stdlib {
    fn top_level(&self) -> Vec<&str> {
        self.root.keys().copied().collect()
    }

    fn lookup(&self, path: &str) -> Option<RegistryEntry<'_>> {
        match self.get(path)? {
            StdEntry::Namespace(children) => {
                Some(RegistryEntry::Namespace(children.keys().copied().collect()))
            }
            StdEntry::Function(function) => Some(RegistryEntry::Function(&function.ty)),
        }
    }
}

fn arg(args: &[Val], index: usize) -> Result<&Val, EvalError> {
    args.get(index)
        .ok_or_else(|| EvalError::Type("missing argument".to_string()))
}

fn string_arg<'v>(name: &str, args: &'v [Val], index: usize) -> Result<&'v str, EvalError> {
    match arg(args, index)? {
        Val::Str(s) => Ok(s),
        other => Err(EvalError::Type(format!(
            "{} expects a string, got {}",
            name,
            other.type_name()
        ))),
    }
}

fn int_arg(name: &str, args: &[Val], index: usize) -> Result<i64, EvalError> {
    match arg(args, index)? {
        Val::Int(n) => Ok(*n),
        other => Err(EvalError::Type(format!(
            "{} expects an int, got {}",
            name,
            other.type_name()
        ))),
    }
}

fn list_arg<'v>(name: &str, args: &'v [Val], index: usize) -> Result<&'v [Val], EvalError> {
    match arg(args, index)? {
        Val::List(items) => Ok(items),
        other => Err(EvalError::Type(format!(
            "{} expects a list, got {}",
            name,
            other.type_name()
        ))),
    }
}

fn strings_repeat(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let text = string_arg("strings.repeat", &args, 0)?;
    let count = int_arg("strings.repeat", &args, 1)?;
    let count = usize::try_from(count)
        .map_err(|_| EvalError::Type("strings.repeat count must not be negative".to_string()))?;
    match text.len().checked_mul(count) {
        Some(len) if len <= MAX_GENERATED_LEN => Ok(Val::Str(text.repeat(count))),
        _ => Err(EvalError::TooLarge {
            name: "strings.repeat".to_string(),
            limit: MAX_GENERATED_LEN,
        }),
    }
}

fn strings_reverse(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let text = string_arg("strings.reverse", &args, 0)?;
    Ok(Val::Str(text.chars().rev().collect()))
}

fn strings_has_prefix(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let text = string_arg("strings.has_prefix", &args, 0)?;
    let prefix = string_arg("strings.has_prefix", &args, 1)?;
    Ok(Val::Bool(text.starts_with(prefix)))
}

/// Split on case changes, spaces, hyphens and underscores.
fn words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in text.chars() {
        if ch == ' ' || ch == '-' || ch == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn case_snake(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let text = string_arg("strings.case.snake", &args, 0)?;
    Ok(Val::Str(words(text).join("_")))
}

fn case_kebab(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let text = string_arg("strings.case.kebab", &args, 0)?;
    Ok(Val::Str(words(text).join("-")))
}

fn math_pow(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let base = int_arg("math.pow", &args, 0)?;
    let exp = int_arg("math.pow", &args, 1)?;
    let exp = u32::try_from(exp).map_err(|_| {
        EvalError::Type("math.pow exponent must be a small non-negative int".to_string())
    })?;
    base.checked_pow(exp)
        .map(Val::Int)
        .ok_or_else(|| EvalError::Type("integer overflow".to_string()))
}

fn math_clamp(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let value = int_arg("math.clamp", &args, 0)?;
    let lo = int_arg("math.clamp", &args, 1)?;
    let hi = int_arg("math.clamp", &args, 2)?;
    if lo > hi {
        return Err(EvalError::Type(format!(
            "math.clamp lower bound {} exceeds upper bound {}",
            lo, hi
        )));
    }
    Ok(Val::Int(value.clamp(lo, hi)))
}

fn list_first(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let items = list_arg("list.first", &args, 0)?;
    items
        .first()
        .cloned()
        .ok_or(EvalError::Index { index: 0, len: 0 })
}

fn list_last(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let items = list_arg("list.last", &args, 0)?;
    items
        .last()
        .cloned()
        .ok_or(EvalError::Index { index: -1, len: 0 })
}

fn list_reverse(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let items = list_arg("list.reverse", &args, 0)?;
    Ok(Val::List(items.iter().rev().cloned().collect()))
}

fn list_concat(_: &mut Evaluator<'_>, args: Vec<Val>) -> Result<Val, EvalError> {
    let mut out = Vec::new();
    for index in 0..args.len() {
        out.extend(list_arg("list.concat", &args, index)?.iter().cloned());
    }
    Ok(Val::List(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Engine;

    #[test]
    fn test_nested_lookup() {
        let stdlib = Stdlib::new();
        assert!(matches!(
            stdlib.lookup("strings"),
            Some(RegistryEntry::Namespace(children))
                if children == vec!["case", "has_prefix", "repeat", "reverse"]
        ));
        assert!(stdlib.is_callable("strings.case.snake"));
        assert!(!stdlib.is_callable("strings.case"));
        assert!(stdlib.get("strings.repeat.more").is_none());
        assert!(stdlib.get("nope").is_none());
    }

    #[test]
    fn test_functions_listing() {
        let stdlib = Stdlib::new();
        let paths: Vec<_> = stdlib.functions().into_iter().map(|(p, _)| p).collect();
        assert!(paths.contains(&"strings.case.kebab".to_string()));
        assert!(paths.contains(&"list.concat".to_string()));
        assert_eq!(paths.len(), 11);
    }

    #[test]
    fn test_stdlib_calls() -> Result<(), String> {
        let engine = Engine::from_source("").map_err(|e| e.to_string())?;
        let eval = |src: &str| engine.evaluate(src).map_err(|e| e.to_string());
        assert_eq!(eval(r#"strings.repeat("ab", 3)"#)?, Val::Str("ababab".into()));
        assert_eq!(
            eval(r#"strings.case.snake("helloWorld again")"#)?,
            Val::Str("hello_world_again".into())
        );
        assert_eq!(
            eval(r#"strings.case.kebab("Max_Retries")"#)?,
            Val::Str("max-retries".into())
        );
        assert_eq!(eval("math.pow(2, 10)")?, Val::Int(1024));
        assert_eq!(eval("math.clamp(15, 0, 10)")?, Val::Int(10));
        assert_eq!(eval("list.concat([1], [], [2, 3])")?.to_string(), "[1, 2, 3]");
        assert_eq!(eval("list.last([1, 2])")?, Val::Int(2));
        assert!(engine.evaluate("list.first([])").is_err());
        Ok(())
    }

    #[test]
    fn test_repeat_rejects_huge_output() -> Result<(), String> {
        let engine = Engine::from_source("").map_err(|e| e.to_string())?;
        assert!(matches!(
            engine.evaluate(r#"strings.repeat("ab", 9223372036854775807)"#),
            Err(EvalError::TooLarge { .. })
        ));
        assert!(matches!(
            engine.evaluate(r#"strings.repeat("x", 2000000)"#),
            Err(EvalError::TooLarge { .. })
        ));
        assert!(engine.evaluate(r#"strings.repeat("", 9223372036854775807)"#).is_ok());
        Ok(())
    }
}
