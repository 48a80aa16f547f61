//! The `span` shape.

use borzoi_lang::{ContextFamily, EvalError, PathError, PathKey, Value, ValueKind};
use borzoi_telemetry::trace::{Span, SpanKind, StatusCode};
use borzoi_telemetry::{InstrumentationScope, Resource};

use super::{
    get_common, int_from_value, map_get, map_set, read_only, resolve_common, string_from_value,
    time_from_value, time_value, CommonPath,
};

/// Paths a span statement can address.
#[derive(Clone, Copy, Debug)]
pub enum SpanPath {
    /// `name`.
    Name,
    /// `kind`, as its integer code.
    Kind,
    /// `status.code`, as its integer code.
    StatusCode,
    /// `status.message`.
    StatusMessage,
    /// `attributes`.
    Attributes,
    /// `start_time_unix_nano` (int) or `start_time` (timestamp).
    StartTime {
        /// Whether the `_unix_nano` spelling was used.
        unix_nano: bool,
    },
    /// `end_time_unix_nano` (int) or `end_time` (timestamp).
    EndTime {
        /// Whether the `_unix_nano` spelling was used.
        unix_nano: bool,
    },
    /// `trace_id` (read-only bytes).
    TraceId,
    /// `span_id` (read-only bytes).
    SpanId,
    /// `parent_span_id` (read-only bytes).
    ParentSpanId,
    /// `dropped_attributes_count` (read-only).
    DroppedAttributesCount,
    /// A shared `resource.*` / `instrumentation_scope.*` root (read-only).
    Common(CommonPath),
}

/// One span under evaluation, with its ancestors visible read-only.
pub struct SpanContext<'a> {
    span: &'a mut Span,
    resource: &'a Resource,
    scope: &'a InstrumentationScope,
}

impl<'a> SpanContext<'a> {
    pub fn new(span: &'a mut Span, resource: &'a Resource, scope: &'a InstrumentationScope) -> Self {
        Self { span, resource, scope }
    }
}

/// Binds statements to spans.
pub struct SpanFamily;

impl ContextFamily for SpanFamily {
    type Path = SpanPath;
    type Context<'a> = SpanContext<'a>;

    fn context_name() -> &'static str {
        "span"
    }

    fn resolve_path(segments: &[String]) -> Result<Self::Path, PathError> {
        let path = match segments {
            [s] if s == "name" => SpanPath::Name,
            [s] if s == "kind" => SpanPath::Kind,
            [s] if s == "attributes" => SpanPath::Attributes,
            [s] if s == "start_time_unix_nano" => SpanPath::StartTime { unix_nano: true },
            [s] if s == "start_time" => SpanPath::StartTime { unix_nano: false },
            [s] if s == "end_time_unix_nano" => SpanPath::EndTime { unix_nano: true },
            [s] if s == "end_time" => SpanPath::EndTime { unix_nano: false },
            [s] if s == "trace_id" => SpanPath::TraceId,
            [s] if s == "span_id" => SpanPath::SpanId,
            [s] if s == "parent_span_id" => SpanPath::ParentSpanId,
            [s] if s == "dropped_attributes_count" => SpanPath::DroppedAttributesCount,
            [root, field] if root == "status" && field == "code" => SpanPath::StatusCode,
            [root, field] if root == "status" && field == "message" => SpanPath::StatusMessage,
            _ => match resolve_common(segments) {
                Some(common) => SpanPath::Common(common),
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
            SpanPath::Name => Value::string(ctx.span.name()),
            SpanPath::Kind => Value::Int(ctx.span.kind().as_i64()),
            SpanPath::StatusCode => Value::Int(ctx.span.status().code().as_i64()),
            SpanPath::StatusMessage => Value::string(ctx.span.status().message()),
            SpanPath::Attributes => map_get(ctx.span.attributes(), keys),
            SpanPath::StartTime { unix_nano } => time_value(ctx.span.start_time_unix_nano(), *unix_nano),
            SpanPath::EndTime { unix_nano } => time_value(ctx.span.end_time_unix_nano(), *unix_nano),
            SpanPath::TraceId => Value::bytes(ctx.span.trace_id().to_vec()),
            SpanPath::SpanId => Value::bytes(ctx.span.span_id().to_vec()),
            SpanPath::ParentSpanId => Value::bytes(ctx.span.parent_span_id().to_vec()),
            SpanPath::DroppedAttributesCount => Value::Int(ctx.span.dropped_attributes_count() as i64),
            SpanPath::Common(common) => get_common(common, ctx.resource, ctx.scope, keys),
        };
        Ok(value)
    }

    fn set(ctx: &mut Self::Context<'_>, path: &Self::Path, keys: &[PathKey], value: Value) -> Result<(), EvalError> {
        match path {
            SpanPath::Name => {
                if let Some(name) = string_from_value(value, "name")? {
                    ctx.span.set_name(name);
                }
                Ok(())
            }
            SpanPath::Kind => {
                match int_from_value(value, "kind")? {
                    None => Ok(()),
                    Some(code) => match SpanKind::from_i64(code) {
                        Some(kind) => {
                            ctx.span.set_kind(kind);
                            Ok(())
                        }
                        None => Err(EvalError::UnexpectedType {
                            operation: "set kind",
                            expected: "span kind code 0 through 5",
                            actual: ValueKind::Int,
                        }),
                    },
                }
            }
            SpanPath::StatusCode => {
                match int_from_value(value, "status.code")? {
                    None => Ok(()),
                    Some(code) => match StatusCode::from_i64(code) {
                        Some(code) => {
                            ctx.span.status_mut().set_code(code);
                            Ok(())
                        }
                        None => Err(EvalError::UnexpectedType {
                            operation: "set status.code",
                            expected: "status code 0 through 2",
                            actual: ValueKind::Int,
                        }),
                    },
                }
            }
            SpanPath::StatusMessage => {
                if let Some(message) = string_from_value(value, "status.message")? {
                    ctx.span.status_mut().set_message(message);
                }
                Ok(())
            }
            SpanPath::Attributes => map_set(ctx.span.attributes_mut(), keys, value, "attributes"),
            SpanPath::StartTime { unix_nano } => {
                let path = if *unix_nano { "start_time_unix_nano" } else { "start_time" };
                if let Some(nanos) = time_from_value(value, path, *unix_nano)? {
                    ctx.span.set_start_time_unix_nano(nanos);
                }
                Ok(())
            }
            SpanPath::EndTime { unix_nano } => {
                let path = if *unix_nano { "end_time_unix_nano" } else { "end_time" };
                if let Some(nanos) = time_from_value(value, path, *unix_nano)? {
                    ctx.span.set_end_time_unix_nano(nanos);
                }
                Ok(())
            }
            SpanPath::TraceId => Err(read_only("trace_id")),
            SpanPath::SpanId => Err(read_only("span_id")),
            SpanPath::ParentSpanId => Err(read_only("parent_span_id")),
            SpanPath::DroppedAttributesCount => Err(read_only("dropped_attributes_count")),
            SpanPath::Common(common) => Err(read_only(common.text())),
        }
    }
}
