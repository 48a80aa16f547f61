//! Resource and instrumentation scope metadata.

use crate::AttributeMap;

/// The entity that produced a batch of telemetry.
///
/// Every record in a batch hangs off a resource, and every transform context
/// exposes the owning resource for reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resource {
    attributes: AttributeMap,
    dropped_attributes_count: u32,
}

impl Resource {
    /// Creates a resource with the given attributes.
    pub fn new(attributes: AttributeMap) -> Self {
        Self {
            attributes,
            dropped_attributes_count: 0,
        }
    }

    /// Gets a reference to the attributes.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Gets a mutable reference to the attributes.
    pub fn attributes_mut(&mut self) -> &mut AttributeMap {
        &mut self.attributes
    }

    /// Number of attributes dropped upstream due to limits.
    pub fn dropped_attributes_count(&self) -> u32 {
        self.dropped_attributes_count
    }
}

/// The instrumentation library that produced a set of records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstrumentationScope {
    name: String,
    version: String,
    attributes: AttributeMap,
}

impl InstrumentationScope {
    /// Creates a scope with the given name and version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            attributes: AttributeMap::new(),
        }
    }

    /// Gets the scope name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the scope name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Gets the scope version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Sets the scope version.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    /// Gets a reference to the attributes.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Gets a mutable reference to the attributes.
    pub fn attributes_mut(&mut self) -> &mut AttributeMap {
        &mut self.attributes
    }
}
