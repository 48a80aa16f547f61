//! The standard editors: lowercase, mutating, statement-root only.
//!
//! Editors that rework whole attribute maps read the map out of the target
//! path, rebuild it, and write it back through the same path. `Value::Map`
//! preserves insertion order, so a rebuilt map keeps the record's original
//! attribute ordering.

use std::sync::Arc;

use borzoi_lang::{
    ArgSpec, Args, CallbackFn, ContextFamily, EvalError, FunctionLibrary, FunctionSpec, Value,
    ValueKind,
};
use regex::Regex;

fn expect_string<F: ContextFamily>(
    args: &mut dyn Args<F>, function: &str, index: usize,
) -> Result<String, EvalError> {
    match args.get(index)? {
        Value::String(s) => Ok(s),
        other => Err(EvalError::ArgumentType {
            function: function.to_string(),
            index,
            expected: "string",
            actual: other.kind(),
        }),
    }
}

fn expect_map<F: ContextFamily>(
    args: &mut dyn Args<F>, function: &str, index: usize,
) -> Result<indexmap::IndexMap<String, Value>, EvalError> {
    match args.get(index)? {
        Value::Map(map) => Ok(map),
        other => Err(EvalError::ArgumentType {
            function: function.to_string(),
            index,
            expected: "map",
            actual: other.kind(),
        }),
    }
}

fn compile_pattern(function: &str, pattern: &str) -> Result<Regex, EvalError> {
    Regex::new(pattern).map_err(|err| EvalError::Function {
        function: function.to_string(),
        reason: err.to_string(),
    })
}

/// Registers the standard editors into `library`.
pub(crate) fn register<F: ContextFamily>(library: &mut FunctionLibrary<F>) {
    // set(target, value): write a value through a path. A nil value skips
    // the write entirely, so an absent input never erases existing data.
    let set: CallbackFn<F> = Arc::new(|args| {
        let value = args.get(1)?;
        if value.is_nil() {
            return Ok(Value::Nil);
        }
        args.set(0, value)?;
        Ok(Value::Nil)
    });
    library.register_editor("set", FunctionSpec::new(2, 2, &[ArgSpec::Path, ArgSpec::Any], set));

    // delete_key(target, key): remove one key from a map-valued path.
    let delete_key: CallbackFn<F> = Arc::new(|args| {
        let mut map = expect_map(args, "delete_key", 0)?;
        let key = expect_string(args, "delete_key", 1)?;
        if map.shift_remove(&key).is_some() {
            args.set(0, Value::Map(map))?;
        }
        Ok(Value::Nil)
    });
    library.register_editor(
        "delete_key",
        FunctionSpec::new(
            2,
            2,
            &[ArgSpec::Path, ArgSpec::OneOf(&[ValueKind::String])],
            delete_key,
        ),
    );

    // delete_matching_keys(target, pattern): remove every key matching a
    // regular expression.
    let delete_matching_keys: CallbackFn<F> = Arc::new(|args| {
        let mut map = expect_map(args, "delete_matching_keys", 0)?;
        let pattern = expect_string(args, "delete_matching_keys", 1)?;
        let regex = compile_pattern("delete_matching_keys", &pattern)?;
        let before = map.len();
        map.retain(|key, _| !regex.is_match(key));
        if map.len() != before {
            args.set(0, Value::Map(map))?;
        }
        Ok(Value::Nil)
    });
    library.register_editor(
        "delete_matching_keys",
        FunctionSpec::new(
            2,
            2,
            &[ArgSpec::Path, ArgSpec::OneOf(&[ValueKind::String])],
            delete_matching_keys,
        ),
    );

    // keep_keys(target, ["a", "b"]): drop everything except the named keys.
    let keep_keys: CallbackFn<F> = Arc::new(|args| {
        let mut map = expect_map(args, "keep_keys", 0)?;
        let keys = match args.get(1)? {
            Value::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(EvalError::ArgumentType {
                        function: "keep_keys".to_string(),
                        index: 1,
                        expected: "list of strings",
                        actual: other.kind(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => {
                return Err(EvalError::ArgumentType {
                    function: "keep_keys".to_string(),
                    index: 1,
                    expected: "list of strings",
                    actual: other.kind(),
                })
            }
        };
        map.retain(|key, _| keys.iter().any(|keep| keep == key));
        args.set(0, Value::Map(map))?;
        Ok(Value::Nil)
    });
    library.register_editor(
        "keep_keys",
        FunctionSpec::new(
            2,
            2,
            &[ArgSpec::Path, ArgSpec::OneOf(&[ValueKind::List])],
            keep_keys,
        ),
    );

    // truncate_all(target, limit): cap every top-level string value of a map
    // at `limit` characters.
    let truncate_all: CallbackFn<F> = Arc::new(|args| {
        let mut map = expect_map(args, "truncate_all", 0)?;
        let limit = match args.get(1)? {
            Value::Int(limit) if limit >= 0 => limit as usize,
            Value::Int(_) => {
                return Err(EvalError::Function {
                    function: "truncate_all".to_string(),
                    reason: "limit must be non-negative".to_string(),
                })
            }
            other => {
                return Err(EvalError::ArgumentType {
                    function: "truncate_all".to_string(),
                    index: 1,
                    expected: "int",
                    actual: other.kind(),
                })
            }
        };
        let mut changed = false;
        for value in map.values_mut() {
            if let Value::String(s) = value {
                if s.chars().count() > limit {
                    *s = s.chars().take(limit).collect();
                    changed = true;
                }
            }
        }
        if changed {
            args.set(0, Value::Map(map))?;
        }
        Ok(Value::Nil)
    });
    library.register_editor(
        "truncate_all",
        FunctionSpec::new(
            2,
            2,
            &[ArgSpec::Path, ArgSpec::OneOf(&[ValueKind::Int])],
            truncate_all,
        ),
    );

    // replace_pattern(target, pattern, replacement): regex replace on a
    // string-valued path.
    let replace_pattern: CallbackFn<F> = Arc::new(|args| {
        let target = args.get(0)?;
        if target.is_nil() {
            return Ok(Value::Nil);
        }
        let Value::String(target) = target else {
            return Err(EvalError::ArgumentType {
                function: "replace_pattern".to_string(),
                index: 0,
                expected: "string",
                actual: target.kind(),
            });
        };
        let pattern = expect_string(args, "replace_pattern", 1)?;
        let replacement = expect_string(args, "replace_pattern", 2)?;
        let regex = compile_pattern("replace_pattern", &pattern)?;
        let replaced = regex.replace_all(&target, replacement.as_str());
        if replaced != target {
            args.set(0, Value::string(replaced.into_owned()))?;
        }
        Ok(Value::Nil)
    });
    library.register_editor(
        "replace_pattern",
        FunctionSpec::new(
            3,
            3,
            &[
                ArgSpec::Path,
                ArgSpec::OneOf(&[ValueKind::String]),
                ArgSpec::OneOf(&[ValueKind::String]),
            ],
            replace_pattern,
        ),
    );

    // replace_all_patterns(target, pattern, replacement): regex replace on
    // every top-level string value of a map-valued path.
    let replace_all_patterns: CallbackFn<F> = Arc::new(|args| {
        let mut map = expect_map(args, "replace_all_patterns", 0)?;
        let pattern = expect_string(args, "replace_all_patterns", 1)?;
        let replacement = expect_string(args, "replace_all_patterns", 2)?;
        let regex = compile_pattern("replace_all_patterns", &pattern)?;
        let mut changed = false;
        for value in map.values_mut() {
            if let Value::String(s) = value {
                let replaced = regex.replace_all(s, replacement.as_str());
                if replaced != *s {
                    *s = replaced.into_owned();
                    changed = true;
                }
            }
        }
        if changed {
            args.set(0, Value::Map(map))?;
        }
        Ok(Value::Nil)
    });
    library.register_editor(
        "replace_all_patterns",
        FunctionSpec::new(
            3,
            3,
            &[
                ArgSpec::Path,
                ArgSpec::OneOf(&[ValueKind::String]),
                ArgSpec::OneOf(&[ValueKind::String]),
            ],
            replace_all_patterns,
        ),
    );
}
