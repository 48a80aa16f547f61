//! Evaluation of compiled statements against one record at a time.

use super::arena::*;
use super::ops;
use crate::{Args, ContextFamily, EvalError, PathKey, Value};

/// Evaluates one statement against one record. Returns `true` if the guard
/// passed and the editor ran, `false` if the guard rejected the record.
pub(super) fn eval_statement<F: ContextFamily>(
    arena: &AstArena<F>, statement: &CompiledStatement, ctx: &mut F::Context<'_>,
) -> Result<bool, EvalError> {
    if let Some(condition) = statement.condition {
        if !eval_bool(arena, condition, ctx)? {
            return Ok(false);
        }
    }
    eval_call(arena, statement.editor, ctx)?;
    Ok(true)
}

/// Evaluates a guard. `and`/`or` short-circuit left to right; a guard
/// position that resolves to nil counts as `false`.
pub(super) fn eval_bool<F: ContextFamily>(
    arena: &AstArena<F>, r: BoolRef, ctx: &mut F::Context<'_>,
) -> Result<bool, EvalError> {
    match arena.bool(r) {
        CompiledBool::Literal(v) => Ok(*v),
        CompiledBool::Comparison { left, op, right } => {
            let left = eval_value(arena, *left, ctx)?;
            let right = eval_value(arena, *right, ctx)?;
            Ok(ops::compare(&left, op, &right))
        }
        CompiledBool::Converter(call) => truthy(eval_call(arena, *call, ctx)?),
        CompiledBool::Path(path) => {
            let resolved = arena.path(*path);
            truthy(F::get(ctx, &resolved.path, &resolved.keys)?)
        }
        CompiledBool::Not(inner) => Ok(!eval_bool(arena, *inner, ctx)?),
        CompiledBool::And(left, right) => {
            if !eval_bool(arena, *left, ctx)? {
                return Ok(false);
            }
            eval_bool(arena, *right, ctx)
        }
        CompiledBool::Or(left, right) => {
            if eval_bool(arena, *left, ctx)? {
                return Ok(true);
            }
            eval_bool(arena, *right, ctx)
        }
    }
}

fn truthy(value: Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(v) => Ok(v),
        Value::Nil => Ok(false),
        other => Err(EvalError::UnexpectedType {
            operation: "guard",
            expected: "bool",
            actual: other.kind(),
        }),
    }
}

fn eval_value<F: ContextFamily>(
    arena: &AstArena<F>, r: ValueRef, ctx: &mut F::Context<'_>,
) -> Result<Value, EvalError> {
    match arena.value(r) {
        CompiledValue::Literal(v) => Ok(v.clone()),
        CompiledValue::Path(path) => {
            let resolved = arena.path(*path);
            F::get(ctx, &resolved.path, &resolved.keys)
        }
        CompiledValue::List(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval_value(arena, *item, ctx)?);
            }
            Ok(Value::List(values))
        }
        CompiledValue::Map(entries) => {
            let mut map = indexmap::IndexMap::with_capacity(entries.len());
            for (key, value) in entries {
                map.insert(key.clone(), eval_value(arena, *value, ctx)?);
            }
            Ok(Value::Map(map))
        }
        CompiledValue::Converter(call) => eval_call(arena, *call, ctx),
        CompiledValue::Math(math) => eval_math(arena, *math, ctx),
    }
}

fn eval_math<F: ContextFamily>(
    arena: &AstArena<F>, r: MathRef, ctx: &mut F::Context<'_>,
) -> Result<Value, EvalError> {
    match arena.math(r) {
        CompiledMath::Value(value) => eval_value(arena, *value, ctx),
        CompiledMath::Negate(inner) => match eval_math(arena, *inner, ctx)? {
            Value::Nil => Ok(Value::Nil),
            Value::Int(v) => v.checked_neg().map(Value::Int).ok_or(EvalError::Arithmetic {
                detail: "integer overflow",
            }),
            Value::Float(v) => Ok(Value::Float(-v)),
            other => Err(EvalError::UnexpectedType {
                operation: "negation",
                expected: "int or float",
                actual: other.kind(),
            }),
        },
        CompiledMath::Binary { left, op, right } => {
            let left = eval_math(arena, *left, ctx)?;
            let right = eval_math(arena, *right, ctx)?;
            ops::math_op(left, op, right)
        }
    }
}

/// Drills keys into a converter result. A key that does not match resolves
/// to nil, mirroring how missing map entries read as nil on paths.
fn apply_keys(mut value: Value, keys: &[PathKey]) -> Value {
    for key in keys {
        value = match (value, key) {
            (Value::Map(mut map), PathKey::String(k)) => map.swap_remove(k).unwrap_or(Value::Nil),
            (Value::List(mut list), PathKey::Int(i)) if *i < list.len() => list.swap_remove(*i),
            _ => Value::Nil,
        };
    }
    value
}

fn eval_call<F: ContextFamily>(
    arena: &AstArena<F>, r: CallRef, ctx: &mut F::Context<'_>,
) -> Result<Value, EvalError> {
    let call = arena.call(r);
    let callback = call.spec.callback().clone();
    let mut args = ArenaArgs { arena, call, ctx };
    let result = callback(&mut args)?;
    if call.keys.is_empty() {
        Ok(result)
    } else {
        Ok(apply_keys(result, &call.keys))
    }
}

/// Lazy argument access for one call, backed by the arena and the live
/// record context.
struct ArenaArgs<'a, 'ctx, F: ContextFamily> {
    arena: &'a AstArena<F>,
    call: &'a CompiledCall<F>,
    ctx: &'a mut F::Context<'ctx>,
}

impl<F: ContextFamily> Args<F> for ArenaArgs<'_, '_, F> {
    fn len(&self) -> usize {
        self.call.args.len()
    }

    fn name(&self, index: usize) -> Option<&str> {
        self.call.args.get(index).and_then(|arg| arg.name.as_deref())
    }

    fn get(&mut self, index: usize) -> Result<Value, EvalError> {
        let arg = self.call.args.get(index).ok_or(EvalError::MissingArgument {
            index,
            available: self.call.args.len(),
        })?;
        eval_value(self.arena, arg.value, self.ctx)
    }

    fn set(&mut self, index: usize, value: Value) -> Result<(), EvalError> {
        let arg = self.call.args.get(index).ok_or(EvalError::MissingArgument {
            index,
            available: self.call.args.len(),
        })?;
        match self.arena.value(arg.value) {
            CompiledValue::Path(path) => {
                let resolved = self.arena.path(*path);
                F::set(self.ctx, &resolved.path, &resolved.keys, value)
            }
            _ => Err(EvalError::NotAPath {
                function: self.call.name.clone(),
                index,
            }),
        }
    }
}
