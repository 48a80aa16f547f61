//! Trace types: spans, span events, and the batch containers around them.

use crate::{AttributeMap, InstrumentationScope, Resource};

/// What kind of operation a span describes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SpanKind {
    /// Kind was not set by the instrumentation.
    #[default]
    Unspecified,
    /// An operation internal to an application.
    Internal,
    /// Handling of a request received from a remote caller.
    Server,
    /// An outgoing request to a remote service.
    Client,
    /// Creation of a message for asynchronous processing.
    Producer,
    /// Processing of an asynchronously produced message.
    Consumer,
}

impl SpanKind {
    /// The stable numeric value of this kind.
    pub fn as_i64(self) -> i64 {
        match self {
            SpanKind::Unspecified => 0,
            SpanKind::Internal => 1,
            SpanKind::Server => 2,
            SpanKind::Client => 3,
            SpanKind::Producer => 4,
            SpanKind::Consumer => 5,
        }
    }

    /// Maps a numeric value back to a kind, if valid.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(SpanKind::Unspecified),
            1 => Some(SpanKind::Internal),
            2 => Some(SpanKind::Server),
            3 => Some(SpanKind::Client),
            4 => Some(SpanKind::Producer),
            5 => Some(SpanKind::Consumer),
            _ => None,
        }
    }
}

/// Whether a span completed successfully.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum StatusCode {
    /// No status was recorded.
    #[default]
    Unset,
    /// The operation completed successfully.
    Ok,
    /// The operation failed.
    Error,
}

impl StatusCode {
    /// The stable numeric value of this status code.
    pub fn as_i64(self) -> i64 {
        match self {
            StatusCode::Unset => 0,
            StatusCode::Ok => 1,
            StatusCode::Error => 2,
        }
    }

    /// Maps a numeric value back to a status code, if valid.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(StatusCode::Unset),
            1 => Some(StatusCode::Ok),
            2 => Some(StatusCode::Error),
            _ => None,
        }
    }
}

/// The status of a completed span.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpanStatus {
    code: StatusCode,
    message: String,
}

impl SpanStatus {
    /// Gets the status code.
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Sets the status code.
    pub fn set_code(&mut self, code: StatusCode) {
        self.code = code;
    }

    /// Gets the status message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Sets the status message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }
}

/// A single operation within a trace.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Span {
    trace_id: [u8; 16],
    span_id: [u8; 8],
    parent_span_id: [u8; 8],
    name: String,
    kind: SpanKind,
    start_time_unix_nano: u64,
    end_time_unix_nano: u64,
    attributes: AttributeMap,
    events: Vec<SpanEvent>,
    status: SpanStatus,
    dropped_attributes_count: u32,
}

impl Span {
    /// Creates a span with the given name. All other fields start at their
    /// zero values.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Gets the trace ID.
    pub fn trace_id(&self) -> &[u8; 16] {
        &self.trace_id
    }

    /// Sets the trace ID.
    pub fn set_trace_id(&mut self, trace_id: [u8; 16]) {
        self.trace_id = trace_id;
    }

    /// Gets the span ID.
    pub fn span_id(&self) -> &[u8; 8] {
        &self.span_id
    }

    /// Sets the span ID.
    pub fn set_span_id(&mut self, span_id: [u8; 8]) {
        self.span_id = span_id;
    }

    /// Gets the parent span ID.
    pub fn parent_span_id(&self) -> &[u8; 8] {
        &self.parent_span_id
    }

    /// Sets the parent span ID.
    pub fn set_parent_span_id(&mut self, parent_span_id: [u8; 8]) {
        self.parent_span_id = parent_span_id;
    }

    /// Gets the span name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the span name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Gets the span kind.
    pub fn kind(&self) -> SpanKind {
        self.kind
    }

    /// Sets the span kind.
    pub fn set_kind(&mut self, kind: SpanKind) {
        self.kind = kind;
    }

    /// Gets the start time, in Unix nanoseconds.
    pub fn start_time_unix_nano(&self) -> u64 {
        self.start_time_unix_nano
    }

    /// Sets the start time, in Unix nanoseconds.
    pub fn set_start_time_unix_nano(&mut self, nanos: u64) {
        self.start_time_unix_nano = nanos;
    }

    /// Gets the end time, in Unix nanoseconds.
    pub fn end_time_unix_nano(&self) -> u64 {
        self.end_time_unix_nano
    }

    /// Sets the end time, in Unix nanoseconds.
    pub fn set_end_time_unix_nano(&mut self, nanos: u64) {
        self.end_time_unix_nano = nanos;
    }

    /// Gets a reference to the attributes.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Gets a mutable reference to the attributes.
    pub fn attributes_mut(&mut self) -> &mut AttributeMap {
        &mut self.attributes
    }

    /// Gets a reference to the span's events.
    pub fn events(&self) -> &[SpanEvent] {
        &self.events
    }

    /// Gets a mutable reference to the span's events.
    pub fn events_mut(&mut self) -> &mut Vec<SpanEvent> {
        &mut self.events
    }

    /// Gets a reference to the status.
    pub fn status(&self) -> &SpanStatus {
        &self.status
    }

    /// Gets a mutable reference to the status.
    pub fn status_mut(&mut self) -> &mut SpanStatus {
        &mut self.status
    }

    /// Number of attributes dropped upstream due to limits.
    pub fn dropped_attributes_count(&self) -> u32 {
        self.dropped_attributes_count
    }
}

/// A timestamped event attached to a span.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpanEvent {
    time_unix_nano: u64,
    name: String,
    attributes: AttributeMap,
    dropped_attributes_count: u32,
}

impl SpanEvent {
    /// Creates an event with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Gets the event time, in Unix nanoseconds.
    pub fn time_unix_nano(&self) -> u64 {
        self.time_unix_nano
    }

    /// Sets the event time, in Unix nanoseconds.
    pub fn set_time_unix_nano(&mut self, nanos: u64) {
        self.time_unix_nano = nanos;
    }

    /// Gets the event name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the event name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
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

/// Spans produced by one instrumentation scope.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScopeSpans {
    scope: InstrumentationScope,
    spans: Vec<Span>,
}

impl ScopeSpans {
    /// Creates a scope-spans group for the given scope.
    pub fn new(scope: InstrumentationScope) -> Self {
        Self {
            scope,
            spans: Vec::new(),
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

    /// Gets a reference to the spans.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Gets a mutable reference to the spans.
    pub fn spans_mut(&mut self) -> &mut Vec<Span> {
        &mut self.spans
    }

    /// Splits this group into the scope and the spans it owns, so that spans
    /// can be mutated while the scope is read.
    pub fn split_mut(&mut self) -> (&InstrumentationScope, &mut [Span]) {
        (&self.scope, &mut self.spans)
    }
}

/// Spans produced by one resource.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceSpans {
    resource: Resource,
    scope_spans: Vec<ScopeSpans>,
}

impl ResourceSpans {
    /// Creates a resource-spans group for the given resource.
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            scope_spans: Vec::new(),
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
    pub fn scope_spans(&self) -> &[ScopeSpans] {
        &self.scope_spans
    }

    /// Gets a mutable reference to the scope groups.
    pub fn scope_spans_mut(&mut self) -> &mut Vec<ScopeSpans> {
        &mut self.scope_spans
    }

    /// Splits this group into the resource and the scope groups it owns, so
    /// that records can be mutated while the resource is read.
    pub fn split_mut(&mut self) -> (&Resource, &mut [ScopeSpans]) {
        (&self.resource, &mut self.scope_spans)
    }
}

/// A batch of trace telemetry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Traces {
    resource_spans: Vec<ResourceSpans>,
}

impl Traces {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a reference to the resource groups.
    pub fn resource_spans(&self) -> &[ResourceSpans] {
        &self.resource_spans
    }

    /// Gets a mutable reference to the resource groups.
    pub fn resource_spans_mut(&mut self) -> &mut Vec<ResourceSpans> {
        &mut self.resource_spans
    }
}
