//! The `log` shape.

use borzoi_lang::{ContextFamily, EvalError, PathError, PathKey, Value};
use borzoi_telemetry::log::LogRecord;
use borzoi_telemetry::{AnyValue, AttributeMap, InstrumentationScope, Resource};

use super::{
    any_get, get_common, int_from_value, map_get, map_set, read_only, resolve_common,
    string_from_value, time_from_value, time_value, value_to_any, CommonPath,
};

/// Paths a log statement can address.
#[derive(Clone, Copy, Debug)]
pub enum LogPath {
    /// `body`.
    Body,
    /// `severity_number`.
    SeverityNumber,
    /// `severity_text`.
    SeverityText,
    /// `attributes`.
    Attributes,
    /// `time_unix_nano` (int) or `time` (timestamp).
    Time {
        /// Whether the `_unix_nano` spelling was used.
        unix_nano: bool,
    },
    /// `observed_time_unix_nano` (int) or `observed_time` (timestamp).
    ObservedTime {
        /// Whether the `_unix_nano` spelling was used.
        unix_nano: bool,
    },
    /// `trace_id` (read-only bytes).
    TraceId,
    /// `span_id` (read-only bytes).
    SpanId,
    /// `dropped_attributes_count` (read-only).
    DroppedAttributesCount,
    /// A shared `resource.*` / `instrumentation_scope.*` root (read-only).
    Common(CommonPath),
}

/// One log record under evaluation.
pub struct LogContext<'a> {
    record: &'a mut LogRecord,
    resource: &'a Resource,
    scope: &'a InstrumentationScope,
}

impl<'a> LogContext<'a> {
    pub fn new(record: &'a mut LogRecord, resource: &'a Resource, scope: &'a InstrumentationScope) -> Self {
        Self { record, resource, scope }
    }
}

/// Binds statements to log records.
pub struct LogFamily;

impl ContextFamily for LogFamily {
    type Path = LogPath;
    type Context<'a> = LogContext<'a>;

    fn context_name() -> &'static str {
        "log"
    }

    fn resolve_path(segments: &[String]) -> Result<Self::Path, PathError> {
        let path = match segments {
            [s] if s == "body" => LogPath::Body,
            [s] if s == "severity_number" => LogPath::SeverityNumber,
            [s] if s == "severity_text" => LogPath::SeverityText,
            [s] if s == "attributes" => LogPath::Attributes,
            [s] if s == "time_unix_nano" => LogPath::Time { unix_nano: true },
            [s] if s == "time" => LogPath::Time { unix_nano: false },
            [s] if s == "observed_time_unix_nano" => LogPath::ObservedTime { unix_nano: true },
            [s] if s == "observed_time" => LogPath::ObservedTime { unix_nano: false },
            [s] if s == "trace_id" => LogPath::TraceId,
            [s] if s == "span_id" => LogPath::SpanId,
            [s] if s == "dropped_attributes_count" => LogPath::DroppedAttributesCount,
            _ => match resolve_common(segments) {
                Some(common) => LogPath::Common(common),
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
            LogPath::Body => match ctx.record.body() {
                Some(body) => any_get(body, keys),
                None => Value::Nil,
            },
            LogPath::SeverityNumber => Value::Int(ctx.record.severity_number()),
            LogPath::SeverityText => Value::string(ctx.record.severity_text()),
            LogPath::Attributes => map_get(ctx.record.attributes(), keys),
            LogPath::Time { unix_nano } => time_value(ctx.record.time_unix_nano(), *unix_nano),
            LogPath::ObservedTime { unix_nano } => time_value(ctx.record.observed_time_unix_nano(), *unix_nano),
            LogPath::TraceId => Value::bytes(ctx.record.trace_id().to_vec()),
            LogPath::SpanId => Value::bytes(ctx.record.span_id().to_vec()),
            LogPath::DroppedAttributesCount => Value::Int(ctx.record.dropped_attributes_count() as i64),
            LogPath::Common(common) => get_common(common, ctx.resource, ctx.scope, keys),
        };
        Ok(value)
    }

    fn set(ctx: &mut Self::Context<'_>, path: &Self::Path, keys: &[PathKey], value: Value) -> Result<(), EvalError> {
        match path {
            LogPath::Body => {
                if keys.is_empty() {
                    if let Some(body) = value_to_any(value) {
                        ctx.record.set_body(body);
                    }
                    return Ok(());
                }
                match ctx.record.body_mut() {
                    Some(body) => super::set_nested(body, keys, value, "body"),
                    // Keyed writes into an unset body start from an empty map.
                    None => {
                        let mut body = AnyValue::Map(AttributeMap::new());
                        super::set_nested(&mut body, keys, value, "body")?;
                        ctx.record.set_body(body);
                        Ok(())
                    }
                }
            }
            LogPath::SeverityNumber => {
                if let Some(severity) = int_from_value(value, "severity_number")? {
                    ctx.record.set_severity_number(severity);
                }
                Ok(())
            }
            LogPath::SeverityText => {
                if let Some(severity) = string_from_value(value, "severity_text")? {
                    ctx.record.set_severity_text(severity);
                }
                Ok(())
            }
            LogPath::Attributes => map_set(ctx.record.attributes_mut(), keys, value, "attributes"),
            LogPath::Time { unix_nano } => {
                let path = if *unix_nano { "time_unix_nano" } else { "time" };
                if let Some(nanos) = time_from_value(value, path, *unix_nano)? {
                    ctx.record.set_time_unix_nano(nanos);
                }
                Ok(())
            }
            LogPath::ObservedTime { unix_nano } => {
                let path = if *unix_nano { "observed_time_unix_nano" } else { "observed_time" };
                if let Some(nanos) = time_from_value(value, path, *unix_nano)? {
                    ctx.record.set_observed_time_unix_nano(nanos);
                }
                Ok(())
            }
            LogPath::TraceId => Err(read_only("trace_id")),
            LogPath::SpanId => Err(read_only("span_id")),
            LogPath::DroppedAttributesCount => Err(read_only("dropped_attributes_count")),
            LogPath::Common(common) => Err(read_only(common.text())),
        }
    }
}
