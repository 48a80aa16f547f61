//! The `scope` shape (an instrumentation scope plus its read-only resource).

use borzoi_lang::{ContextFamily, EvalError, PathError, PathKey, Value};
use borzoi_telemetry::{InstrumentationScope, Resource};

use super::{
    get_common, map_set, read_only, resolve_common, string_from_value, CommonPath, ResourcePath,
};

/// Paths a scope statement can address on the scope itself.
#[derive(Clone, Copy, Debug)]
pub enum ScopePath {
    /// `name`.
    Name,
    /// `version`.
    Version,
    /// `attributes`.
    Attributes,
}

/// One instrumentation scope under evaluation.
pub struct ScopeContext<'a> {
    scope: &'a mut InstrumentationScope,
    resource: &'a Resource,
}

impl<'a> ScopeContext<'a> {
    pub fn new(scope: &'a mut InstrumentationScope, resource: &'a Resource) -> Self {
        Self { scope, resource }
    }
}

/// Binds statements to instrumentation scopes.
pub struct ScopeFamily;

impl ContextFamily for ScopeFamily {
    type Path = CommonPath;
    type Context<'a> = ScopeContext<'a>;

    fn context_name() -> &'static str {
        "scope"
    }

    fn resolve_path(segments: &[String]) -> Result<Self::Path, PathError> {
        // Bare roots address the scope itself; the shared prefixes also work.
        match segments {
            [s] if s == "name" => Ok(CommonPath::Scope(ScopePath::Name)),
            [s] if s == "version" => Ok(CommonPath::Scope(ScopePath::Version)),
            [s] if s == "attributes" => Ok(CommonPath::Scope(ScopePath::Attributes)),
            _ => resolve_common(segments).ok_or_else(|| PathError::UnknownPath {
                context: Self::context_name(),
                path: segments.join("."),
            }),
        }
    }

    fn get(ctx: &Self::Context<'_>, path: &Self::Path, keys: &[PathKey]) -> Result<Value, EvalError> {
        Ok(get_common(path, ctx.resource, ctx.scope, keys))
    }

    fn set(ctx: &mut Self::Context<'_>, path: &Self::Path, keys: &[PathKey], value: Value) -> Result<(), EvalError> {
        match path {
            CommonPath::Scope(ScopePath::Name) => {
                if let Some(name) = string_from_value(value, "name")? {
                    ctx.scope.set_name(name);
                }
                Ok(())
            }
            CommonPath::Scope(ScopePath::Version) => {
                if let Some(version) = string_from_value(value, "version")? {
                    ctx.scope.set_version(version);
                }
                Ok(())
            }
            CommonPath::Scope(ScopePath::Attributes) => {
                map_set(ctx.scope.attributes_mut(), keys, value, "attributes")
            }
            CommonPath::Resource(ResourcePath::Attributes | ResourcePath::DroppedAttributesCount) => {
                Err(read_only(path.text()))
            }
        }
    }
}
