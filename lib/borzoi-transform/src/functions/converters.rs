//! The standard converters: uppercase, pure, usable in arguments and guards.
//!
//! Converters propagate absence: a nil input yields a nil output (which a
//! guard then treats as false) rather than an error, except where a tag is
//! outright wrong.

use std::fmt::Write as _;
use std::sync::Arc;

use borzoi_lang::{
    ArgSpec, CallbackFn, ContextFamily, EvalError, FunctionLibrary, FunctionSpec, Value, ValueKind,
};
use regex::Regex;

fn wrong_tag(function: &str, index: usize, expected: &'static str, actual: ValueKind) -> EvalError {
    EvalError::ArgumentType {
        function: function.to_string(),
        index,
        expected,
        actual,
    }
}

/// Registers the standard converters into `library`.
pub(crate) fn register<F: ContextFamily>(library: &mut FunctionLibrary<F>) {
    // Concat(delimiter, parts...): join string parts, skipping nils.
    let concat: CallbackFn<F> = Arc::new(|args| {
        let delimiter = match args.get(0)? {
            Value::String(s) => s,
            other => return Err(wrong_tag("Concat", 0, "string", other.kind())),
        };
        let mut parts = Vec::with_capacity(args.len().saturating_sub(1));
        for index in 1..args.len() {
            match args.get(index)? {
                Value::Nil => {}
                Value::String(s) => parts.push(s),
                other => return Err(wrong_tag("Concat", index, "string", other.kind())),
            }
        }
        Ok(Value::string(parts.join(&delimiter)))
    });
    library.register_converter(
        "Concat",
        FunctionSpec::new(
            1,
            usize::MAX,
            &[ArgSpec::OneOf(&[ValueKind::String]), ArgSpec::Any],
            concat,
        ),
    );

    // Split(target, delimiter): string to list of strings.
    let split: CallbackFn<F> = Arc::new(|args| {
        let target = match args.get(0)? {
            Value::Nil => return Ok(Value::Nil),
            Value::String(s) => s,
            other => return Err(wrong_tag("Split", 0, "string", other.kind())),
        };
        let delimiter = match args.get(1)? {
            Value::String(s) => s,
            other => return Err(wrong_tag("Split", 1, "string", other.kind())),
        };
        Ok(Value::List(target.split(&delimiter).map(Value::string).collect()))
    });
    library.register_converter(
        "Split",
        FunctionSpec::new(
            2,
            2,
            &[ArgSpec::Any, ArgSpec::OneOf(&[ValueKind::String])],
            split,
        ),
    );

    // IsMatch(target, pattern): regex test against a string.
    let is_match: CallbackFn<F> = Arc::new(|args| {
        let target = match args.get(0)? {
            Value::Nil => return Ok(Value::Nil),
            Value::String(s) => s,
            other => return Err(wrong_tag("IsMatch", 0, "string", other.kind())),
        };
        let pattern = match args.get(1)? {
            Value::String(s) => s,
            other => return Err(wrong_tag("IsMatch", 1, "string", other.kind())),
        };
        let regex = Regex::new(&pattern).map_err(|err| EvalError::Function {
            function: "IsMatch".to_string(),
            reason: err.to_string(),
        })?;
        Ok(Value::Bool(regex.is_match(&target)))
    });
    library.register_converter(
        "IsMatch",
        FunctionSpec::new(
            2,
            2,
            &[ArgSpec::Any, ArgSpec::OneOf(&[ValueKind::String])],
            is_match,
        ),
    );

    // IsPresent(value): true unless the value is absent.
    let is_present: CallbackFn<F> = Arc::new(|args| Ok(Value::Bool(!args.get(0)?.is_nil())));
    library.register_converter("IsPresent", FunctionSpec::new(1, 1, &[ArgSpec::Any], is_present));

    // Int(value): explicit conversion to int. Unparseable strings yield nil.
    let int: CallbackFn<F> = Arc::new(|args| {
        let value = match args.get(0)? {
            Value::Nil => Value::Nil,
            Value::Int(v) => Value::Int(v),
            Value::Float(v) => Value::Int(v as i64),
            Value::Bool(v) => Value::Int(v as i64),
            Value::Timestamp(v) => Value::Int(v as i64),
            Value::String(s) => s.trim().parse::<i64>().map(Value::Int).unwrap_or(Value::Nil),
            other => return Err(wrong_tag("Int", 0, "int, float, bool, timestamp or string", other.kind())),
        };
        Ok(value)
    });
    library.register_converter("Int", FunctionSpec::new(1, 1, &[ArgSpec::Any], int));

    // Double(value): explicit conversion to float.
    let double: CallbackFn<F> = Arc::new(|args| {
        let value = match args.get(0)? {
            Value::Nil => Value::Nil,
            Value::Int(v) => Value::Float(v as f64),
            Value::Float(v) => Value::Float(v),
            Value::Bool(v) => Value::Float(if v { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse::<f64>().map(Value::Float).unwrap_or(Value::Nil),
            other => return Err(wrong_tag("Double", 0, "int, float, bool or string", other.kind())),
        };
        Ok(value)
    });
    library.register_converter("Double", FunctionSpec::new(1, 1, &[ArgSpec::Any], double));

    // Hex(value): lowercase hex rendering of bytes or an int. The explicit
    // way to turn ids into strings.
    let hex: CallbackFn<F> = Arc::new(|args| {
        let value = match args.get(0)? {
            Value::Nil => Value::Nil,
            Value::Bytes(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2);
                for byte in &bytes {
                    let _ = write!(out, "{:02x}", byte);
                }
                Value::String(out)
            }
            Value::Int(v) => Value::String(format!("{:x}", v)),
            other => return Err(wrong_tag("Hex", 0, "bytes or int", other.kind())),
        };
        Ok(value)
    });
    library.register_converter("Hex", FunctionSpec::new(1, 1, &[ArgSpec::Any], hex));

    // UnixNanos(value): explicit timestamp to integer nanoseconds.
    let unix_nanos: CallbackFn<F> = Arc::new(|args| {
        let value = match args.get(0)? {
            Value::Nil => Value::Nil,
            Value::Timestamp(v) => Value::Int(v as i64),
            Value::Int(v) => Value::Int(v),
            other => return Err(wrong_tag("UnixNanos", 0, "timestamp or int", other.kind())),
        };
        Ok(value)
    });
    library.register_converter("UnixNanos", FunctionSpec::new(1, 1, &[ArgSpec::Any], unix_nanos));

    // Len(value): element or byte count.
    let len: CallbackFn<F> = Arc::new(|args| {
        let len = match args.get(0)? {
            Value::Nil => return Ok(Value::Nil),
            Value::String(s) => s.chars().count(),
            Value::Bytes(b) => b.len(),
            Value::List(l) => l.len(),
            Value::Map(m) => m.len(),
            other => return Err(wrong_tag("Len", 0, "string, bytes, list or map", other.kind())),
        };
        Ok(Value::Int(len as i64))
    });
    library.register_converter(
        "Len",
        FunctionSpec::new(
            1,
            1,
            &[ArgSpec::OneOf(&[
                ValueKind::String,
                ValueKind::Bytes,
                ValueKind::List,
                ValueKind::Map,
            ])],
            len,
        ),
    );
}
