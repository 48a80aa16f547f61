//! Context bindings: one [`ContextFamily`](borzoi_lang::ContextFamily)
//! implementation per record shape.
//!
//! Every shape exposes its resource and instrumentation scope; both are
//! writable only on their own shapes and read-only everywhere else, so a
//! span statement cannot reach over and edit state shared with sibling
//! spans.

use borzoi_lang::{EvalError, PathKey, Value};
use borzoi_telemetry::{AnyValue, AttributeMap, InstrumentationScope, Resource};

mod datapoint;
mod log;
mod metric;
mod resource;
mod scope;
mod span;
mod spanevent;

pub use self::datapoint::{DataPointContext, DataPointFamily, DataPointPath, MetricInfo};
pub use self::log::{LogContext, LogFamily, LogPath};
pub use self::metric::{MetricContext, MetricFamily, MetricPath};
pub use self::resource::{ResourceContext, ResourceFamily, ResourcePath};
pub use self::scope::{ScopeContext, ScopeFamily, ScopePath};
pub use self::span::{SpanContext, SpanFamily, SpanPath};
pub use self::spanevent::{SpanEventContext, SpanEventFamily, SpanEventPath};

// =====================================================================================================================
// Value conversion
// =====================================================================================================================

pub(crate) fn any_to_value(value: &AnyValue) -> Value {
    match value {
        AnyValue::String(s) => Value::String(s.clone()),
        AnyValue::Bool(b) => Value::Bool(*b),
        AnyValue::Int(i) => Value::Int(*i),
        AnyValue::Double(d) => Value::Float(*d),
        AnyValue::Bytes(b) => Value::Bytes(b.clone()),
        AnyValue::Array(items) => Value::List(items.iter().map(any_to_value).collect()),
        AnyValue::Map(map) => attributes_value(map),
    }
}

pub(crate) fn attributes_value(map: &AttributeMap) -> Value {
    Value::Map(map.iter().map(|(k, v)| (k.clone(), any_to_value(v))).collect())
}

/// Converts a language value into an attribute value. `Nil` has no attribute
/// representation and converts to `None`; nested nils are dropped.
pub(crate) fn value_to_any(value: Value) -> Option<AnyValue> {
    match value {
        Value::Nil => None,
        Value::Bool(b) => Some(AnyValue::Bool(b)),
        Value::Int(i) => Some(AnyValue::Int(i)),
        Value::Float(f) => Some(AnyValue::Double(f)),
        Value::String(s) => Some(AnyValue::String(s)),
        Value::Bytes(b) => Some(AnyValue::Bytes(b)),
        Value::Timestamp(t) => Some(AnyValue::Int(t as i64)),
        Value::List(items) => Some(AnyValue::Array(items.into_iter().filter_map(value_to_any).collect())),
        Value::Map(map) => Some(AnyValue::Map(
            map.into_iter()
                .filter_map(|(k, v)| value_to_any(v).map(|v| (k, v)))
                .collect(),
        )),
    }
}

// =====================================================================================================================
// Attribute map access
// =====================================================================================================================

/// Reads from an attribute map, drilling through nested maps and arrays.
/// Anything missing resolves to `Nil`.
pub(crate) fn map_get(map: &AttributeMap, keys: &[PathKey]) -> Value {
    let Some(first) = keys.first() else {
        return attributes_value(map);
    };
    let PathKey::String(first) = first else {
        return Value::Nil;
    };
    let Some(mut current) = map.get(first) else {
        return Value::Nil;
    };
    for key in &keys[1..] {
        current = match (current, key) {
            (AnyValue::Map(m), PathKey::String(k)) => match m.get(k) {
                Some(v) => v,
                None => return Value::Nil,
            },
            (AnyValue::Array(a), PathKey::Int(i)) => match a.get(*i) {
                Some(v) => v,
                None => return Value::Nil,
            },
            _ => return Value::Nil,
        };
    }
    any_to_value(current)
}

/// Writes into an attribute map. A `Nil` value is a no-op; missing
/// intermediate maps are created; a non-map intermediate is replaced by a
/// map so the write always lands.
pub(crate) fn map_set(map: &mut AttributeMap, keys: &[PathKey], value: Value, path: &str) -> Result<(), EvalError> {
    if value.is_nil() {
        return Ok(());
    }
    match keys.split_first() {
        None => match value {
            Value::Map(entries) => {
                *map = entries
                    .into_iter()
                    .filter_map(|(k, v)| value_to_any(v).map(|v| (k, v)))
                    .collect();
                Ok(())
            }
            other => Err(EvalError::InvalidAssignment {
                path: path.to_string(),
                actual: other.kind(),
            }),
        },
        Some((PathKey::String(first), rest)) => {
            if rest.is_empty() {
                if let Some(value) = value_to_any(value) {
                    map.insert(first.clone(), value);
                }
                return Ok(());
            }
            if !map.contains_key(first) {
                map.insert(first.clone(), AnyValue::Map(AttributeMap::new()));
            }
            match map.get_mut(first) {
                Some(child) => set_nested(child, rest, value, path),
                None => Ok(()),
            }
        }
        Some((PathKey::Int(_), _)) => Err(EvalError::InvalidAssignment {
            path: path.to_string(),
            actual: value.kind(),
        }),
    }
}

fn set_nested(current: &mut AnyValue, keys: &[PathKey], value: Value, path: &str) -> Result<(), EvalError> {
    match keys.split_first() {
        None => {
            if let Some(value) = value_to_any(value) {
                *current = value;
            }
            Ok(())
        }
        Some((PathKey::String(key), rest)) => {
            if !matches!(current, AnyValue::Map(_)) {
                *current = AnyValue::Map(AttributeMap::new());
            }
            let AnyValue::Map(map) = current else {
                return Ok(());
            };
            if !map.contains_key(key) {
                map.insert(key.clone(), AnyValue::Map(AttributeMap::new()));
            }
            match map.get_mut(key) {
                Some(child) => set_nested(child, rest, value, path),
                None => Ok(()),
            }
        }
        Some((PathKey::Int(index), rest)) => match current {
            AnyValue::Array(items) if *index < items.len() => set_nested(&mut items[*index], rest, value, path),
            _ => Err(EvalError::InvalidAssignment {
                path: path.to_string(),
                actual: value.kind(),
            }),
        },
    }
}

// =====================================================================================================================
// Scalar field access
// =====================================================================================================================

/// Extracts a string to write to a string field. `Nil` reads as "skip the
/// write" and surfaces as `None`.
pub(crate) fn string_from_value(value: Value, path: &str) -> Result<Option<String>, EvalError> {
    match value {
        Value::Nil => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(EvalError::InvalidAssignment {
            path: path.to_string(),
            actual: other.kind(),
        }),
    }
}

pub(crate) fn int_from_value(value: Value, path: &str) -> Result<Option<i64>, EvalError> {
    match value {
        Value::Nil => Ok(None),
        Value::Int(v) => Ok(Some(v)),
        other => Err(EvalError::InvalidAssignment {
            path: path.to_string(),
            actual: other.kind(),
        }),
    }
}

/// Drills keys into a standalone attribute value (e.g. a log body).
pub(crate) fn any_get(value: &AnyValue, keys: &[PathKey]) -> Value {
    let mut current = value;
    for key in keys {
        current = match (current, key) {
            (AnyValue::Map(m), PathKey::String(k)) => match m.get(k) {
                Some(v) => v,
                None => return Value::Nil,
            },
            (AnyValue::Array(a), PathKey::Int(i)) => match a.get(*i) {
                Some(v) => v,
                None => return Value::Nil,
            },
            _ => return Value::Nil,
        };
    }
    any_to_value(current)
}

/// Reads a nanosecond field, as `Int` for the `*_unix_nano` spelling and as
/// `Timestamp` for the bare spelling.
pub(crate) fn time_value(nanos: u64, unix_nano: bool) -> Value {
    if unix_nano {
        Value::Int(nanos as i64)
    } else {
        Value::Timestamp(nanos)
    }
}

pub(crate) fn time_from_value(value: Value, path: &str, unix_nano: bool) -> Result<Option<u64>, EvalError> {
    match (value, unix_nano) {
        (Value::Nil, _) => Ok(None),
        (Value::Int(v), true) if v >= 0 => Ok(Some(v as u64)),
        (Value::Timestamp(v), false) => Ok(Some(v)),
        (other, _) => Err(EvalError::InvalidAssignment {
            path: path.to_string(),
            actual: other.kind(),
        }),
    }
}

pub(crate) fn read_only(path: &str) -> EvalError {
    EvalError::ReadOnlyPath {
        path: path.to_string(),
    }
}

// =====================================================================================================================
// Shared resource/scope roots
// =====================================================================================================================

/// The path roots every shape shares: its resource and its instrumentation
/// scope.
#[derive(Clone, Copy, Debug)]
pub enum CommonPath {
    /// A `resource.*` root.
    Resource(ResourcePath),
    /// An `instrumentation_scope.*` root.
    Scope(ScopePath),
}

impl CommonPath {
    pub(crate) fn text(&self) -> &'static str {
        match self {
            CommonPath::Resource(path) => match path {
                ResourcePath::Attributes => "resource.attributes",
                ResourcePath::DroppedAttributesCount => "resource.dropped_attributes_count",
            },
            CommonPath::Scope(path) => match path {
                ScopePath::Name => "instrumentation_scope.name",
                ScopePath::Version => "instrumentation_scope.version",
                ScopePath::Attributes => "instrumentation_scope.attributes",
            },
        }
    }
}

/// Resolves the `resource.*` / `instrumentation_scope.*` roots shared by all
/// shapes. Returns `None` for anything else so the caller can try its own
/// roots.
pub(crate) fn resolve_common(segments: &[String]) -> Option<CommonPath> {
    match segments {
        [root, field] if root == "resource" => match field.as_str() {
            "attributes" => Some(CommonPath::Resource(ResourcePath::Attributes)),
            "dropped_attributes_count" => Some(CommonPath::Resource(ResourcePath::DroppedAttributesCount)),
            _ => None,
        },
        [root, field] if root == "instrumentation_scope" => match field.as_str() {
            "name" => Some(CommonPath::Scope(ScopePath::Name)),
            "version" => Some(CommonPath::Scope(ScopePath::Version)),
            "attributes" => Some(CommonPath::Scope(ScopePath::Attributes)),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn get_common(
    common: &CommonPath, resource: &Resource, scope: &InstrumentationScope, keys: &[PathKey],
) -> Value {
    match common {
        CommonPath::Resource(ResourcePath::Attributes) => map_get(resource.attributes(), keys),
        CommonPath::Resource(ResourcePath::DroppedAttributesCount) => {
            Value::Int(resource.dropped_attributes_count() as i64)
        }
        CommonPath::Scope(ScopePath::Name) => Value::string(scope.name()),
        CommonPath::Scope(ScopePath::Version) => Value::string(scope.version()),
        CommonPath::Scope(ScopePath::Attributes) => map_get(scope.attributes(), keys),
    }
}
