//! Metric types: metrics, number data points, and the batch containers
//! around them.

use crate::{AttributeMap, InstrumentationScope, Resource};

/// The measured value of a number data point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumberValue {
    /// An integer measurement.
    Int(i64),
    /// A floating point measurement.
    Double(f64),
}

impl Default for NumberValue {
    fn default() -> Self {
        NumberValue::Int(0)
    }
}

/// A single measurement of a metric at a point in time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NumberDataPoint {
    start_time_unix_nano: u64,
    time_unix_nano: u64,
    attributes: AttributeMap,
    value: NumberValue,
}

impl NumberDataPoint {
    /// Creates a data point with the given value.
    pub fn new(value: NumberValue) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }

    /// Gets the start of the aggregation window, in Unix nanoseconds.
    pub fn start_time_unix_nano(&self) -> u64 {
        self.start_time_unix_nano
    }

    /// Sets the start of the aggregation window, in Unix nanoseconds.
    pub fn set_start_time_unix_nano(&mut self, nanos: u64) {
        self.start_time_unix_nano = nanos;
    }

    /// Gets the measurement time, in Unix nanoseconds.
    pub fn time_unix_nano(&self) -> u64 {
        self.time_unix_nano
    }

    /// Sets the measurement time, in Unix nanoseconds.
    pub fn set_time_unix_nano(&mut self, nanos: u64) {
        self.time_unix_nano = nanos;
    }

    /// Gets a reference to the attributes.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Gets a mutable reference to the attributes.
    pub fn attributes_mut(&mut self) -> &mut AttributeMap {
        &mut self.attributes
    }

    /// Gets the measured value.
    pub fn value(&self) -> NumberValue {
        self.value
    }

    /// Sets the measured value.
    pub fn set_value(&mut self, value: NumberValue) {
        self.value = value;
    }
}

/// The data carried by a metric, by metric type.
#[derive(Clone, Debug, PartialEq)]
pub enum MetricData {
    /// A gauge: the latest value of a quantity.
    Gauge(Vec<NumberDataPoint>),
    /// A sum: a quantity aggregated over time.
    Sum {
        /// The aggregated measurements.
        data_points: Vec<NumberDataPoint>,
        /// Whether the sum only ever increases.
        is_monotonic: bool,
    },
}

impl MetricData {
    /// Gets a reference to the data points, regardless of metric type.
    pub fn data_points(&self) -> &[NumberDataPoint] {
        match self {
            MetricData::Gauge(points) => points,
            MetricData::Sum { data_points, .. } => data_points,
        }
    }

    /// Gets a mutable reference to the data points, regardless of metric
    /// type.
    pub fn data_points_mut(&mut self) -> &mut Vec<NumberDataPoint> {
        match self {
            MetricData::Gauge(points) => points,
            MetricData::Sum { data_points, .. } => data_points,
        }
    }
}

/// A named series of measurements.
#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    name: String,
    description: String,
    unit: String,
    data: MetricData,
}

impl Metric {
    /// Creates a gauge metric with the given name and data points.
    pub fn gauge(name: impl Into<String>, data_points: Vec<NumberDataPoint>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            unit: String::new(),
            data: MetricData::Gauge(data_points),
        }
    }

    /// Creates a sum metric with the given name and data points.
    pub fn sum(name: impl Into<String>, data_points: Vec<NumberDataPoint>, is_monotonic: bool) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            unit: String::new(),
            data: MetricData::Sum {
                data_points,
                is_monotonic,
            },
        }
    }

    /// Gets the metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the metric name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Gets the metric description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Sets the metric description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Gets the metric unit.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Sets the metric unit.
    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.unit = unit.into();
    }

    /// Gets a reference to the metric data.
    pub fn data(&self) -> &MetricData {
        &self.data
    }

    /// Gets a mutable reference to the metric data.
    pub fn data_mut(&mut self) -> &mut MetricData {
        &mut self.data
    }
}

/// Metrics produced by one instrumentation scope.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScopeMetrics {
    scope: InstrumentationScope,
    metrics: Vec<Metric>,
}

impl ScopeMetrics {
    /// Creates a scope-metrics group for the given scope.
    pub fn new(scope: InstrumentationScope) -> Self {
        Self {
            scope,
            metrics: Vec::new(),
        }
    }

    /// Gets a reference to the scope.
    pub fn scope(&self) -> &InstrumentationScope {
        &self.scope
    }

    /// Gets a mutable reference to the scope.
    pub fn scope_mut(&mut self) -> &mut InstrumentationScope {
        &mut self.scope
    }

    /// Gets a reference to the metrics.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Gets a mutable reference to the metrics.
    pub fn metrics_mut(&mut self) -> &mut Vec<Metric> {
        &mut self.metrics
    }

    /// Splits this group into the scope and the metrics it owns, so that
    /// metrics can be mutated while the scope is read.
    pub fn split_mut(&mut self) -> (&InstrumentationScope, &mut [Metric]) {
        (&self.scope, &mut self.metrics)
    }
}

/// Metrics produced by one resource.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceMetrics {
    resource: Resource,
    scope_metrics: Vec<ScopeMetrics>,
}

impl ResourceMetrics {
    /// Creates a resource-metrics group for the given resource.
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            scope_metrics: Vec::new(),
        }
    }

    /// Gets a reference to the resource.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Gets a mutable reference to the resource.
    pub fn resource_mut(&mut self) -> &mut Resource {
        &mut self.resource
    }

    /// Gets a reference to the scope groups.
    pub fn scope_metrics(&self) -> &[ScopeMetrics] {
        &self.scope_metrics
    }

    /// Gets a mutable reference to the scope groups.
    pub fn scope_metrics_mut(&mut self) -> &mut Vec<ScopeMetrics> {
        &mut self.scope_metrics
    }

    /// Splits this group into the resource and the scope groups it owns, so
    /// that records can be mutated while the resource is read.
    pub fn split_mut(&mut self) -> (&Resource, &mut [ScopeMetrics]) {
        (&self.resource, &mut self.scope_metrics)
    }
}

/// A batch of metric telemetry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metrics {
    resource_metrics: Vec<ResourceMetrics>,
}

impl Metrics {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a reference to the resource groups.
    pub fn resource_metrics(&self) -> &[ResourceMetrics] {
        &self.resource_metrics
    }

    /// Gets a mutable reference to the resource groups.
    pub fn resource_metrics_mut(&mut self) -> &mut Vec<ResourceMetrics> {
        &mut self.resource_metrics
    }
}
