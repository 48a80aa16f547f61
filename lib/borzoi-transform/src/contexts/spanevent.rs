//! The `spanevent` shape.

use borzoi_lang::{ContextFamily, EvalError, PathError, PathKey, Value};
use borzoi_telemetry::trace::SpanEvent;
use borzoi_telemetry::{InstrumentationScope, Resource};

use super::{
    get_common, map_get, map_set, read_only, resolve_common, string_from_value, time_from_value,
    time_value, CommonPath,
};

/// Paths a span event statement can address.
#[derive(Clone, Copy, Debug)]
pub enum SpanEventPath {
    /// `name`.
    Name,
    /// `attributes`.
    Attributes,
    /// `time_unix_nano` (int) or `time` (timestamp).
    Time {
        /// Whether the `_unix_nano` spelling was used.
        unix_nano: bool,
    },
    /// `dropped_attributes_count` (read-only).
    DroppedAttributesCount,
    /// A shared `resource.*` / `instrumentation_scope.*` root (read-only).
    Common(CommonPath),
}

/// One span event under evaluation.
pub struct SpanEventContext<'a> {
    event: &'a mut SpanEvent,
    resource: &'a Resource,
    scope: &'a InstrumentationScope,
}

impl<'a> SpanEventContext<'a> {
    pub fn new(event: &'a mut SpanEvent, resource: &'a Resource, scope: &'a InstrumentationScope) -> Self {
        Self { event, resource, scope }
    }
}

/// Binds statements to span events.
pub struct SpanEventFamily;

impl ContextFamily for SpanEventFamily {
    type Path = SpanEventPath;
    type Context<'a> = SpanEventContext<'a>;

    fn context_name() -> &'static str {
        "spanevent"
    }

    fn resolve_path(segments: &[String]) -> Result<Self::Path, PathError> {
        let path = match segments {
            [s] if s == "name" => SpanEventPath::Name,
            [s] if s == "attributes" => SpanEventPath::Attributes,
            [s] if s == "time_unix_nano" => SpanEventPath::Time { unix_nano: true },
            [s] if s == "time" => SpanEventPath::Time { unix_nano: false },
            [s] if s == "dropped_attributes_count" => SpanEventPath::DroppedAttributesCount,
            _ => match resolve_common(segments) {
                Some(common) => SpanEventPath::Common(common),
                None => {
                    return Err(PathError::UnknownPath {
                        context: Self::context_name(),
                        path: segments.join("."),
                    })
                }
            },
        };
        Ok(path)
    }

    fn get(ctx: &Self::Context<'_>, path: &Self::Path, keys: &[PathKey]) -> Result<Value, EvalError> {
        let value = match path {
            SpanEventPath::Name => Value::string(ctx.event.name()),
            SpanEventPath::Attributes => map_get(ctx.event.attributes(), keys),
            SpanEventPath::Time { unix_nano } => time_value(ctx.event.time_unix_nano(), *unix_nano),
            SpanEventPath::DroppedAttributesCount => Value::Int(ctx.event.dropped_attributes_count() as i64),
            SpanEventPath::Common(common) => get_common(common, ctx.resource, ctx.scope, keys),
        };
        Ok(value)
    }

    fn set(ctx: &mut Self::Context<'_>, path: &Self::Path, keys: &[PathKey], value: Value) -> Result<(), EvalError> {
        match path {
            SpanEventPath::Name => {
                if let Some(name) = string_from_value(value, "name")? {
                    ctx.event.set_name(name);
                }
                Ok(())
            }
            SpanEventPath::Attributes => map_set(ctx.event.attributes_mut(), keys, value, "attributes"),
            SpanEventPath::Time { unix_nano } => {
                let path = if *unix_nano { "time_unix_nano" } else { "time" };
                if let Some(nanos) = time_from_value(value, path, *unix_nano)? {
                    ctx.event.set_time_unix_nano(nanos);
                }
                Ok(())
            }
            SpanEventPath::DroppedAttributesCount => Err(read_only("dropped_attributes_count")),
            SpanEventPath::Common(common) => Err(read_only(common.text())),
        }
    }
}
