//! The `metric` shape.

use borzoi_lang::{ContextFamily, EvalError, PathError, PathKey, Value};
use borzoi_telemetry::metric::Metric;
use borzoi_telemetry::{InstrumentationScope, Resource};

use super::{get_common, read_only, resolve_common, string_from_value, CommonPath};

/// Paths a metric statement can address.
#[derive(Clone, Copy, Debug)]
pub enum MetricPath {
    /// `name`.
    Name,
    /// `description`.
    Description,
    /// `unit`.
    Unit,
    /// A shared `resource.*` / `instrumentation_scope.*` root (read-only).
    Common(CommonPath),
}

/// One metric under evaluation.
pub struct MetricContext<'a> {
    metric: &'a mut Metric,
    resource: &'a Resource,
    scope: &'a InstrumentationScope,
}

impl<'a> MetricContext<'a> {
    pub fn new(metric: &'a mut Metric, resource: &'a Resource, scope: &'a InstrumentationScope) -> Self {
        Self { metric, resource, scope }
    }
}

/// Binds statements to metrics.
pub struct MetricFamily;

impl ContextFamily for MetricFamily {
    type Path = MetricPath;
    type Context<'a> = MetricContext<'a>;

    fn context_name() -> &'static str {
        "metric"
    }

    fn resolve_path(segments: &[String]) -> Result<Self::Path, PathError> {
        let path = match segments {
            [s] if s == "name" => MetricPath::Name,
            [s] if s == "description" => MetricPath::Description,
            [s] if s == "unit" => MetricPath::Unit,
            _ => match resolve_common(segments) {
                Some(common) => MetricPath::Common(common),
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
            MetricPath::Name => Value::string(ctx.metric.name()),
            MetricPath::Description => Value::string(ctx.metric.description()),
            MetricPath::Unit => Value::string(ctx.metric.unit()),
            MetricPath::Common(common) => get_common(common, ctx.resource, ctx.scope, keys),
        };
        Ok(value)
    }

    fn set(ctx: &mut Self::Context<'_>, path: &Self::Path, _keys: &[PathKey], value: Value) -> Result<(), EvalError> {
        match path {
            MetricPath::Name => {
                if let Some(name) = string_from_value(value, "name")? {
                    ctx.metric.set_name(name);
                }
                Ok(())
            }
            MetricPath::Description => {
                if let Some(description) = string_from_value(value, "description")? {
                    ctx.metric.set_description(description);
                }
                Ok(())
            }
            MetricPath::Unit => {
                if let Some(unit) = string_from_value(value, "unit")? {
                    ctx.metric.set_unit(unit);
                }
                Ok(())
            }
            MetricPath::Common(common) => Err(read_only(common.text())),
        }
    }
}
