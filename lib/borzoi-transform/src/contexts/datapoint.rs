//! The `datapoint` shape.

use borzoi_lang::{ContextFamily, EvalError, PathError, PathKey, Value};
use borzoi_telemetry::metric::{Metric, NumberDataPoint, NumberValue};
use borzoi_telemetry::{InstrumentationScope, Resource};

use super::{
    get_common, map_get, map_set, read_only, resolve_common, time_from_value, time_value, CommonPath,
};

/// Paths a data point statement can address.
#[derive(Clone, Copy, Debug)]
pub enum DataPointPath {
    /// `value`.
    Value,
    /// `attributes`.
    Attributes,
    /// `time_unix_nano` (int) or `time` (timestamp).
    Time {
        /// Whether the `_unix_nano` spelling was used.
        unix_nano: bool,
    },
    /// `start_time_unix_nano` (int) or `start_time` (timestamp).
    StartTime {
        /// Whether the `_unix_nano` spelling was used.
        unix_nano: bool,
    },
    /// `metric.name` (read-only).
    MetricName,
    /// `metric.description` (read-only).
    MetricDescription,
    /// `metric.unit` (read-only).
    MetricUnit,
    /// A shared `resource.*` / `instrumentation_scope.*` root (read-only).
    Common(CommonPath),
}

/// The identity of the metric a data point belongs to, captured once per
/// metric so points can be iterated mutably while it stays readable.
#[derive(Clone, Debug)]
pub struct MetricInfo {
    name: String,
    description: String,
    unit: String,
}

impl MetricInfo {
    pub fn of(metric: &Metric) -> Self {
        Self {
            name: metric.name().to_string(),
            description: metric.description().to_string(),
            unit: metric.unit().to_string(),
        }
    }
}

/// One number data point under evaluation.
pub struct DataPointContext<'a> {
    point: &'a mut NumberDataPoint,
    metric: &'a MetricInfo,
    resource: &'a Resource,
    scope: &'a InstrumentationScope,
}

impl<'a> DataPointContext<'a> {
    pub fn new(
        point: &'a mut NumberDataPoint, metric: &'a MetricInfo, resource: &'a Resource,
        scope: &'a InstrumentationScope,
    ) -> Self {
        Self {
            point,
            metric,
            resource,
            scope,
        }
    }
}

/// Binds statements to number data points.
pub struct DataPointFamily;

impl ContextFamily for DataPointFamily {
    type Path = DataPointPath;
    type Context<'a> = DataPointContext<'a>;

    fn context_name() -> &'static str {
        "datapoint"
    }

    fn resolve_path(segments: &[String]) -> Result<Self::Path, PathError> {
        let path = match segments {
            [s] if s == "value" => DataPointPath::Value,
            [s] if s == "attributes" => DataPointPath::Attributes,
            [s] if s == "time_unix_nano" => DataPointPath::Time { unix_nano: true },
            [s] if s == "time" => DataPointPath::Time { unix_nano: false },
            [s] if s == "start_time_unix_nano" => DataPointPath::StartTime { unix_nano: true },
            [s] if s == "start_time" => DataPointPath::StartTime { unix_nano: false },
            [root, field] if root == "metric" && field == "name" => DataPointPath::MetricName,
            [root, field] if root == "metric" && field == "description" => DataPointPath::MetricDescription,
            [root, field] if root == "metric" && field == "unit" => DataPointPath::MetricUnit,
            _ => match resolve_common(segments) {
                Some(common) => DataPointPath::Common(common),
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
            DataPointPath::Value => match ctx.point.value() {
                NumberValue::Int(v) => Value::Int(v),
                NumberValue::Double(v) => Value::Float(v),
            },
            DataPointPath::Attributes => map_get(ctx.point.attributes(), keys),
            DataPointPath::Time { unix_nano } => time_value(ctx.point.time_unix_nano(), *unix_nano),
            DataPointPath::StartTime { unix_nano } => time_value(ctx.point.start_time_unix_nano(), *unix_nano),
            DataPointPath::MetricName => Value::string(ctx.metric.name.clone()),
            DataPointPath::MetricDescription => Value::string(ctx.metric.description.clone()),
            DataPointPath::MetricUnit => Value::string(ctx.metric.unit.clone()),
            DataPointPath::Common(common) => get_common(common, ctx.resource, ctx.scope, keys),
        };
        Ok(value)
    }

    fn set(ctx: &mut Self::Context<'_>, path: &Self::Path, keys: &[PathKey], value: Value) -> Result<(), EvalError> {
        match path {
            DataPointPath::Value => match value {
                Value::Nil => Ok(()),
                Value::Int(v) => {
                    ctx.point.set_value(NumberValue::Int(v));
                    Ok(())
                }
                Value::Float(v) => {
                    ctx.point.set_value(NumberValue::Double(v));
                    Ok(())
                }
                other => Err(EvalError::InvalidAssignment {
                    path: "value".to_string(),
                    actual: other.kind(),
                }),
            },
            DataPointPath::Attributes => map_set(ctx.point.attributes_mut(), keys, value, "attributes"),
            DataPointPath::Time { unix_nano } => {
                let path = if *unix_nano { "time_unix_nano" } else { "time" };
                if let Some(nanos) = time_from_value(value, path, *unix_nano)? {
                    ctx.point.set_time_unix_nano(nanos);
                }
                Ok(())
            }
            DataPointPath::StartTime { unix_nano } => {
                let path = if *unix_nano { "start_time_unix_nano" } else { "start_time" };
                if let Some(nanos) = time_from_value(value, path, *unix_nano)? {
                    ctx.point.set_start_time_unix_nano(nanos);
                }
                Ok(())
            }
            DataPointPath::MetricName => Err(read_only("metric.name")),
            DataPointPath::MetricDescription => Err(read_only("metric.description")),
            DataPointPath::MetricUnit => Err(read_only("metric.unit")),
            DataPointPath::Common(common) => Err(read_only(common.text())),
        }
    }
}
