//! Runtime comparison and arithmetic over dynamic values.

use super::ast::{CompOp, MathOp};
use crate::{EvalError, Value};

/// Compares two values. Comparison is infallible: values of incompatible
/// kinds are simply unequal, so ordering operators yield `false` and `!=`
/// yields `true` rather than an error. `Nil` compares equal only to `Nil`
/// and never orders against anything.
pub fn compare(left: &Value, op: &CompOp, right: &Value) -> bool {
    use std::cmp::Ordering;

    let ordering = match (left, right) {
        (Value::Nil, Value::Nil) => Some(Ordering::Equal),
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::Float(l), Value::Float(r)) => l.partial_cmp(r),
        (Value::Int(l), Value::Float(r)) => (*l as f64).partial_cmp(r),
        (Value::Float(l), Value::Int(r)) => l.partial_cmp(&(*r as f64)),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Timestamp(l), Value::Timestamp(r)) => Some(l.cmp(r)),
        // Equality-only kinds: equal or incomparable, never ordered.
        (Value::Bool(l), Value::Bool(r)) if l == r => Some(Ordering::Equal),
        (Value::Bytes(l), Value::Bytes(r)) if l == r => Some(Ordering::Equal),
        (Value::List(l), Value::List(r)) if l == r => Some(Ordering::Equal),
        (Value::Map(l), Value::Map(r)) if l == r => Some(Ordering::Equal),
        _ => None,
    };

    match op {
        CompOp::Eq => ordering == Some(Ordering::Equal),
        CompOp::NotEq => ordering != Some(Ordering::Equal),
        CompOp::Lt => ordering == Some(Ordering::Less),
        CompOp::Gt => ordering == Some(Ordering::Greater),
        CompOp::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        CompOp::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
    }
}

fn checked_int_op(l: i64, op: &MathOp, r: i64) -> Result<i64, EvalError> {
    let result = match op {
        MathOp::Add => l.checked_add(r),
        MathOp::Sub => l.checked_sub(r),
        MathOp::Mul => l.checked_mul(r),
        MathOp::Div => {
            if r == 0 {
                return Err(EvalError::Arithmetic {
                    detail: "integer division by zero",
                });
            }
            l.checked_div(r)
        }
    };
    result.ok_or(EvalError::Arithmetic {
        detail: "integer overflow",
    })
}

fn float_op(l: f64, op: &MathOp, r: f64) -> f64 {
    match op {
        MathOp::Add => l + r,
        MathOp::Sub => l - r,
        MathOp::Mul => l * r,
        MathOp::Div => l / r,
    }
}

/// Applies one arithmetic operator. `Nil` on either side propagates as
/// `Nil`, mixed int/float promotes to float, and integer arithmetic is
/// checked rather than wrapping.
pub fn math_op(left: Value, op: &MathOp, right: Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Nil, _) | (_, Value::Nil) => Ok(Value::Nil),
        (Value::Int(l), Value::Int(r)) => checked_int_op(l, op, r).map(Value::Int),
        (Value::Float(l), Value::Float(r)) => Ok(Value::Float(float_op(l, op, r))),
        (Value::Int(l), Value::Float(r)) => Ok(Value::Float(float_op(l as f64, op, r))),
        (Value::Float(l), Value::Int(r)) => Ok(Value::Float(float_op(l, op, r as f64))),
        (left, right) => Err(EvalError::UnexpectedType {
            operation: "arithmetic",
            expected: "int or float",
            actual: if matches!(left, Value::Int(_) | Value::Float(_)) {
                right.kind()
            } else {
                left.kind()
            },
        }),
    }
}

/// Constant-folding variant: returns `None` when folding must be deferred
/// to runtime, either because the operation errors (so the error surfaces
/// per record, not at parse time) or because an operand is not a literal.
pub fn try_math_op(left: &Value, op: &MathOp, right: &Value) -> Option<Value> {
    math_op(left.clone(), op, right.clone()).ok()
}
