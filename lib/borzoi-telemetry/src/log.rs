//! Log types: log records and the batch containers around them.

use crate::{AnyValue, AttributeMap, InstrumentationScope, Resource};

/// A single log record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogRecord {
    time_unix_nano: u64,
    observed_time_unix_nano: u64,
    severity_number: i64,
    severity_text: String,
    body: Option<AnyValue>,
    attributes: AttributeMap,
    trace_id: [u8; 16],
    span_id: [u8; 8],
    dropped_attributes_count: u32,
}

impl LogRecord {
    /// Creates a log record with the given body.
    pub fn new(body: impl Into<AnyValue>) -> Self {
        Self {
            body: Some(body.into()),
            ..Default::default()
        }
    }

    /// Gets the record time, in Unix nanoseconds.
    pub fn time_unix_nano(&self) -> u64 {
        self.time_unix_nano
    }

    /// Sets the record time, in Unix nanoseconds.
    pub fn set_time_unix_nano(&mut self, nanos: u64) {
        self.time_unix_nano = nanos;
    }

    /// Gets the time the record was observed by the pipeline, in Unix
    /// nanoseconds.
    pub fn observed_time_unix_nano(&self) -> u64 {
        self.observed_time_unix_nano
    }

    /// Sets the time the record was observed by the pipeline, in Unix
    /// nanoseconds.
    pub fn set_observed_time_unix_nano(&mut self, nanos: u64) {
        self.observed_time_unix_nano = nanos;
    }

    /// Gets the numeric severity.
    pub fn severity_number(&self) -> i64 {
        self.severity_number
    }

    /// Sets the numeric severity.
    pub fn set_severity_number(&mut self, severity: i64) {
        self.severity_number = severity;
    }

    /// Gets the severity text.
    pub fn severity_text(&self) -> &str {
        &self.severity_text
    }

    /// Sets the severity text.
    pub fn set_severity_text(&mut self, severity: impl Into<String>) {
        self.severity_text = severity.into();
    }

    /// Gets a reference to the body, if set.
    pub fn body(&self) -> Option<&AnyValue> {
        self.body.as_ref()
    }

    /// Gets a mutable reference to the body, if set.
    pub fn body_mut(&mut self) -> Option<&mut AnyValue> {
        self.body.as_mut()
    }

    /// Sets the body.
    pub fn set_body(&mut self, body: impl Into<AnyValue>) {
        self.body = Some(body.into());
    }

    /// Clears the body.
    pub fn clear_body(&mut self) {
        self.body = None;
    }

    /// Gets a reference to the attributes.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Gets a mutable reference to the attributes.
    pub fn attributes_mut(&mut self) -> &mut AttributeMap {
        &mut self.attributes
    }

    /// Gets the trace ID of the owning trace, if correlated.
    pub fn trace_id(&self) -> &[u8; 16] {
        &self.trace_id
    }

    /// Sets the trace ID of the owning trace.
    pub fn set_trace_id(&mut self, trace_id: [u8; 16]) {
        self.trace_id = trace_id;
    }

    /// Gets the span ID of the owning span, if correlated.
    pub fn span_id(&self) -> &[u8; 8] {
        &self.span_id
    }

    /// Sets the span ID of the owning span.
    pub fn set_span_id(&mut self, span_id: [u8; 8]) {
        self.span_id = span_id;
    }

    /// Number of attributes dropped upstream due to limits.
    pub fn dropped_attributes_count(&self) -> u32 {
        self.dropped_attributes_count
    }
}

/// Log records produced by one instrumentation scope.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScopeLogs {
    scope: InstrumentationScope,
    log_records: Vec<LogRecord>,
}

impl ScopeLogs {
    /// Creates a scope-logs group for the given scope.
    pub fn new(scope: InstrumentationScope) -> Self {
        Self {
            scope,
            log_records: Vec::new(),
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

    /// Gets a reference to the log records.
    pub fn log_records(&self) -> &[LogRecord] {
        &self.log_records
    }

    /// Gets a mutable reference to the log records.
    pub fn log_records_mut(&mut self) -> &mut Vec<LogRecord> {
        &mut self.log_records
    }

    /// Splits this group into the scope and the records it owns, so that
    /// records can be mutated while the scope is read.
    pub fn split_mut(&mut self) -> (&InstrumentationScope, &mut [LogRecord]) {
        (&self.scope, &mut self.log_records)
    }
}

/// Log records produced by one resource.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceLogs {
    resource: Resource,
    scope_logs: Vec<ScopeLogs>,
}

impl ResourceLogs {
    /// Creates a resource-logs group for the given resource.
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            scope_logs: Vec::new(),
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
    pub fn scope_logs(&self) -> &[ScopeLogs] {
        &self.scope_logs
    }

    /// Gets a mutable reference to the scope groups.
    pub fn scope_logs_mut(&mut self) -> &mut Vec<ScopeLogs> {
        &mut self.scope_logs
    }

    /// Splits this group into the resource and the scope groups it owns, so
    /// that records can be mutated while the resource is read.
    pub fn split_mut(&mut self) -> (&Resource, &mut [ScopeLogs]) {
        (&self.resource, &mut self.scope_logs)
    }
}

/// A batch of log telemetry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Logs {
    resource_logs: Vec<ResourceLogs>,
}

impl Logs {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a reference to the resource groups.
    pub fn resource_logs(&self) -> &[ResourceLogs] {
        &self.resource_logs
    }

    /// Gets a mutable reference to the resource groups.
    pub fn resource_logs_mut(&mut self) -> &mut Vec<ResourceLogs> {
        &mut self.resource_logs
    }
}
