//! The `resource` shape.

use borzoi_lang::{ContextFamily, EvalError, PathError, PathKey, Value};
use borzoi_telemetry::Resource;

use super::{map_get, map_set, read_only};

/// Paths a resource statement can address.
#[derive(Clone, Copy, Debug)]
pub enum ResourcePath {
    /// `attributes`.
    Attributes,
    /// `dropped_attributes_count` (read-only).
    DroppedAttributesCount,
}

/// One resource under evaluation.
pub struct ResourceContext<'a> {
    resource: &'a mut Resource,
}

impl<'a> ResourceContext<'a> {
    pub fn new(resource: &'a mut Resource) -> Self {
        Self { resource }
    }
}

/// Binds statements to resources.
pub struct ResourceFamily;

impl ContextFamily for ResourceFamily {
    type Path = ResourcePath;
    type Context<'a> = ResourceContext<'a>;

    fn context_name() -> &'static str {
        "resource"
    }

    fn resolve_path(segments: &[String]) -> Result<Self::Path, PathError> {
        match segments {
            [s] if s == "attributes" => Ok(ResourcePath::Attributes),
            [s] if s == "dropped_attributes_count" => Ok(ResourcePath::DroppedAttributesCount),
            _ => Err(PathError::UnknownPath {
                context: Self::context_name(),
                path: segments.join("."),
            }),
        }
    }

    fn get(ctx: &Self::Context<'_>, path: &Self::Path, keys: &[PathKey]) -> Result<Value, EvalError> {
        let value = match path {
            ResourcePath::Attributes => map_get(ctx.resource.attributes(), keys),
            ResourcePath::DroppedAttributesCount => Value::Int(ctx.resource.dropped_attributes_count() as i64),
        };
        Ok(value)
    }

    fn set(ctx: &mut Self::Context<'_>, path: &Self::Path, keys: &[PathKey], value: Value) -> Result<(), EvalError> {
        match path {
            ResourcePath::Attributes => map_set(ctx.resource.attributes_mut(), keys, value, "attributes"),
            ResourcePath::DroppedAttributesCount => Err(read_only("dropped_attributes_count")),
        }
    }
}
