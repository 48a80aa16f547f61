//! The transform processor: compiled statement groups plus the per-signal
//! executors.

use borzoi_lang::{ContextFamily, Parser, Statement};
use borzoi_telemetry::log::Logs;
use borzoi_telemetry::metric::Metrics;
use borzoi_telemetry::trace::Traces;
use metrics::counter;
use tracing::warn;

use crate::config::{ConfigError, ContextKind, ContextStatements, TransformConfig};
use crate::contexts::{
    DataPointContext, DataPointFamily, LogContext, LogFamily, MetricContext, MetricFamily,
    MetricInfo, ResourceContext, ResourceFamily, ScopeContext, ScopeFamily, SpanContext,
    SpanEventContext, SpanEventFamily, SpanFamily,
};
use crate::functions::TransformLibraries;

enum TraceGroup {
    Resource(Vec<Statement<ResourceFamily>>),
    Scope(Vec<Statement<ScopeFamily>>),
    Span(Vec<Statement<SpanFamily>>),
    SpanEvent(Vec<Statement<SpanEventFamily>>),
}

enum MetricGroup {
    Resource(Vec<Statement<ResourceFamily>>),
    Scope(Vec<Statement<ScopeFamily>>),
    Metric(Vec<Statement<MetricFamily>>),
    DataPoint(Vec<Statement<DataPointFamily>>),
}

enum LogGroup {
    Resource(Vec<Statement<ResourceFamily>>),
    Scope(Vec<Statement<ScopeFamily>>),
    Log(Vec<Statement<LogFamily>>),
}

/// Executes compiled statement groups against telemetry batches, in place.
///
/// Construction compiles every statement; a processor that exists can no
/// longer fail to start. The processor is immutable and `Send + Sync`, so
/// one instance serves any number of workers, each feeding it their own
/// batches.
pub struct TransformProcessor {
    traces: Vec<TraceGroup>,
    metrics: Vec<MetricGroup>,
    logs: Vec<LogGroup>,
}

fn compile_group<F: ContextFamily>(
    parser: &Parser<F>, group: &ContextStatements, signal: &'static str,
) -> Result<Vec<Statement<F>>, ConfigError> {
    parser
        .parse_statements(&group.statements)
        .map_err(|source| ConfigError::InvalidStatement {
            signal,
            context: group.context,
            source,
        })
}

/// Runs one statement group against one record. A failing statement is
/// reported and skipped; the rest of the group still runs.
fn run_statements<F: ContextFamily>(statements: &[Statement<F>], ctx: &mut F::Context<'_>) {
    for statement in statements {
        if let Err(error) = statement.execute(ctx) {
            warn!(
                context = F::context_name(),
                statement = statement.text(),
                %error,
                "Transform statement failed; continuing with remaining statements."
            );
            counter!("transform_statement_failures_total", "context" => F::context_name()).increment(1);
        }
    }
}

impl TransformProcessor {
    /// Builds a processor from configuration and the standard function
    /// libraries.
    pub fn from_config(config: &TransformConfig) -> Result<Self, ConfigError> {
        Self::from_config_with_libraries(config, TransformLibraries::default())
    }

    /// Builds a processor from configuration and caller-supplied function
    /// libraries. The libraries are moved in and sealed: no further
    /// registration is possible once compilation has begun.
    pub fn from_config_with_libraries(
        config: &TransformConfig, libraries: TransformLibraries,
    ) -> Result<Self, ConfigError> {
        config.check_forms()?;

        let resource_parser = Parser::new(libraries.resource);
        let scope_parser = Parser::new(libraries.scope);
        let span_parser = Parser::new(libraries.span);
        let span_event_parser = Parser::new(libraries.span_event);
        let metric_parser = Parser::new(libraries.metric);
        let data_point_parser = Parser::new(libraries.data_point);
        let log_parser = Parser::new(libraries.log);

        let mut traces = Vec::new();
        for group in config.trace_groups() {
            let compiled = match group.context {
                ContextKind::Resource => TraceGroup::Resource(compile_group(&resource_parser, &group, "traces")?),
                ContextKind::Scope => TraceGroup::Scope(compile_group(&scope_parser, &group, "traces")?),
                ContextKind::Span => TraceGroup::Span(compile_group(&span_parser, &group, "traces")?),
                ContextKind::SpanEvent => {
                    TraceGroup::SpanEvent(compile_group(&span_event_parser, &group, "traces")?)
                }
                other => {
                    return Err(ConfigError::InvalidContext {
                        signal: "traces",
                        context: other,
                    })
                }
            };
            traces.push(compiled);
        }

        let mut metrics = Vec::new();
        for group in config.metric_groups() {
            let compiled = match group.context {
                ContextKind::Resource => {
                    MetricGroup::Resource(compile_group(&resource_parser, &group, "metrics")?)
                }
                ContextKind::Scope => MetricGroup::Scope(compile_group(&scope_parser, &group, "metrics")?),
                ContextKind::Metric => MetricGroup::Metric(compile_group(&metric_parser, &group, "metrics")?),
                ContextKind::DataPoint => {
                    MetricGroup::DataPoint(compile_group(&data_point_parser, &group, "metrics")?)
                }
                other => {
                    return Err(ConfigError::InvalidContext {
                        signal: "metrics",
                        context: other,
                    })
                }
            };
            metrics.push(compiled);
        }

        let mut logs = Vec::new();
        for group in config.log_groups() {
            let compiled = match group.context {
                ContextKind::Resource => LogGroup::Resource(compile_group(&resource_parser, &group, "logs")?),
                ContextKind::Scope => LogGroup::Scope(compile_group(&scope_parser, &group, "logs")?),
                ContextKind::Log => LogGroup::Log(compile_group(&log_parser, &group, "logs")?),
                other => {
                    return Err(ConfigError::InvalidContext {
                        signal: "logs",
                        context: other,
                    })
                }
            };
            logs.push(compiled);
        }

        Ok(Self { traces, metrics, logs })
    }

    /// Applies the trace statement groups to a batch, in declaration order.
    pub fn process_traces(&self, traces: &mut Traces) {
        for group in &self.traces {
            match group {
                TraceGroup::Resource(statements) => {
                    for resource_spans in traces.resource_spans_mut() {
                        let mut ctx = ResourceContext::new(resource_spans.resource_mut());
                        run_statements(statements, &mut ctx);
                    }
                }
                TraceGroup::Scope(statements) => {
                    for resource_spans in traces.resource_spans_mut() {
                        let (resource, scope_spans) = resource_spans.split_mut();
                        for scope_spans in scope_spans {
                            let mut ctx = ScopeContext::new(scope_spans.scope_mut(), resource);
                            run_statements(statements, &mut ctx);
                        }
                    }
                }
                TraceGroup::Span(statements) => {
                    for resource_spans in traces.resource_spans_mut() {
                        let (resource, scope_spans) = resource_spans.split_mut();
                        for scope_spans in scope_spans {
                            let (scope, spans) = scope_spans.split_mut();
                            for span in spans {
                                let mut ctx = SpanContext::new(span, resource, scope);
                                run_statements(statements, &mut ctx);
                            }
                        }
                    }
                }
                TraceGroup::SpanEvent(statements) => {
                    for resource_spans in traces.resource_spans_mut() {
                        let (resource, scope_spans) = resource_spans.split_mut();
                        for scope_spans in scope_spans {
                            let (scope, spans) = scope_spans.split_mut();
                            for span in spans {
                                for event in span.events_mut() {
                                    let mut ctx = SpanEventContext::new(event, resource, scope);
                                    run_statements(statements, &mut ctx);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Applies the metric statement groups to a batch, in declaration order.
    pub fn process_metrics(&self, metrics: &mut Metrics) {
        for group in &self.metrics {
            match group {
                MetricGroup::Resource(statements) => {
                    for resource_metrics in metrics.resource_metrics_mut() {
                        let mut ctx = ResourceContext::new(resource_metrics.resource_mut());
                        run_statements(statements, &mut ctx);
                    }
                }
                MetricGroup::Scope(statements) => {
                    for resource_metrics in metrics.resource_metrics_mut() {
                        let (resource, scope_metrics) = resource_metrics.split_mut();
                        for scope_metrics in scope_metrics {
                            let mut ctx = ScopeContext::new(scope_metrics.scope_mut(), resource);
                            run_statements(statements, &mut ctx);
                        }
                    }
                }
                MetricGroup::Metric(statements) => {
                    for resource_metrics in metrics.resource_metrics_mut() {
                        let (resource, scope_metrics) = resource_metrics.split_mut();
                        for scope_metrics in scope_metrics {
                            let (scope, metric_list) = scope_metrics.split_mut();
                            for metric in metric_list {
                                let mut ctx = MetricContext::new(metric, resource, scope);
                                run_statements(statements, &mut ctx);
                            }
                        }
                    }
                }
                MetricGroup::DataPoint(statements) => {
                    for resource_metrics in metrics.resource_metrics_mut() {
                        let (resource, scope_metrics) = resource_metrics.split_mut();
                        for scope_metrics in scope_metrics {
                            let (scope, metric_list) = scope_metrics.split_mut();
                            for metric in metric_list {
                                // The metric identity stays readable while
                                // its points are borrowed mutably.
                                let info = MetricInfo::of(metric);
                                for point in metric.data_mut().data_points_mut() {
                                    let mut ctx = DataPointContext::new(point, &info, resource, scope);
                                    run_statements(statements, &mut ctx);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Applies the log statement groups to a batch, in declaration order.
    pub fn process_logs(&self, logs: &mut Logs) {
        for group in &self.logs {
            match group {
                LogGroup::Resource(statements) => {
                    for resource_logs in logs.resource_logs_mut() {
                        let mut ctx = ResourceContext::new(resource_logs.resource_mut());
                        run_statements(statements, &mut ctx);
                    }
                }
                LogGroup::Scope(statements) => {
                    for resource_logs in logs.resource_logs_mut() {
                        let (resource, scope_logs) = resource_logs.split_mut();
                        for scope_logs in scope_logs {
                            let mut ctx = ScopeContext::new(scope_logs.scope_mut(), resource);
                            run_statements(statements, &mut ctx);
                        }
                    }
                }
                LogGroup::Log(statements) => {
                    for resource_logs in logs.resource_logs_mut() {
                        let (resource, scope_logs) = resource_logs.split_mut();
                        for scope_logs in scope_logs {
                            let (scope, records) = scope_logs.split_mut();
                            for record in records {
                                let mut ctx = LogContext::new(record, resource, scope);
                                run_statements(statements, &mut ctx);
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use borzoi_telemetry::log::{LogRecord, Logs, ResourceLogs, ScopeLogs};
    use borzoi_telemetry::metric::{
        Metric, Metrics, NumberDataPoint, NumberValue, ResourceMetrics, ScopeMetrics,
    };
    use borzoi_telemetry::trace::{ResourceSpans, ScopeSpans, Span, Traces};
    use borzoi_telemetry::{AnyValue, AttributeMap, InstrumentationScope, Resource};
    use similar_asserts::assert_eq;

    use super::*;

    fn processor(yaml: &str) -> TransformProcessor {
        let config: TransformConfig = serde_yaml::from_str(yaml).unwrap();
        TransformProcessor::from_config(&config).unwrap()
    }

    fn trace_batch() -> Traces {
        let mut resource_attributes = AttributeMap::new();
        resource_attributes.insert("host.name", "web-1");
        let mut resource_spans = ResourceSpans::new(Resource::new(resource_attributes));

        let mut scope_spans = ScopeSpans::new(InstrumentationScope::new("checkout-service", "1.4.0"));
        let mut checkout = Span::new("checkout");
        checkout.attributes_mut().insert("http.status_code", 200i64);
        scope_spans.spans_mut().push(checkout);
        scope_spans.spans_mut().push(Span::new("payment"));
        resource_spans.scope_spans_mut().push(scope_spans);

        let mut traces = Traces::new();
        traces.resource_spans_mut().push(resource_spans);
        traces
    }

    fn log_batch() -> Logs {
        let mut resource_logs = ResourceLogs::new(Resource::new(AttributeMap::new()));
        let mut scope_logs = ScopeLogs::new(InstrumentationScope::new("auth", "0.9.0"));

        let mut record = LogRecord::new("user login");
        record.attributes_mut().insert("user", "alice");
        record.attributes_mut().insert("password", "hunter2");
        scope_logs.log_records_mut().push(record);
        resource_logs.scope_logs_mut().push(scope_logs);

        let mut logs = Logs::new();
        logs.resource_logs_mut().push(resource_logs);
        logs
    }

    fn metric_batch() -> Metrics {
        let mut resource_metrics = ResourceMetrics::new(Resource::new(AttributeMap::new()));
        let mut scope_metrics = ScopeMetrics::new(InstrumentationScope::new("http-server", "2.0.0"));

        let requests = Metric::gauge(
            "http.requests",
            vec![
                NumberDataPoint::new(NumberValue::Int(7)),
                NumberDataPoint::new(NumberValue::Int(12)),
            ],
        );
        let latency = Metric::gauge("http.latency", vec![NumberDataPoint::new(NumberValue::Double(0.25))]);
        scope_metrics.metrics_mut().push(requests);
        scope_metrics.metrics_mut().push(latency);
        resource_metrics.scope_metrics_mut().push(scope_metrics);

        let mut metrics = Metrics::new();
        metrics.resource_metrics_mut().push(resource_metrics);
        metrics
    }

    #[test]
    fn test_empty_config_leaves_batches_unchanged() {
        let processor = processor("{}");

        let mut traces = trace_batch();
        let mut metrics = metric_batch();
        let mut logs = log_batch();
        let original_traces = traces.clone();
        let original_metrics = metrics.clone();
        let original_logs = logs.clone();

        processor.process_traces(&mut traces);
        processor.process_metrics(&mut metrics);
        processor.process_logs(&mut logs);

        assert_eq!(traces, original_traces);
        assert_eq!(metrics, original_metrics);
        assert_eq!(logs, original_logs);
    }

    #[test]
    fn test_guard_limits_edit_to_matching_spans() {
        let processor = processor(
            r#"
            trace_statements:
              - context: span
                statements:
                  - set(attributes["env"], "prod") where name == "checkout"
            "#,
        );

        let mut traces = trace_batch();
        processor.process_traces(&mut traces);

        let spans = traces.resource_spans()[0].scope_spans()[0].spans();
        assert_eq!(spans[0].attributes().get("env"), Some(&AnyValue::String("prod".into())));
        assert_eq!(spans[1].attributes().get("env"), None);
    }

    #[test]
    fn test_delete_key_scrubs_log_attribute() {
        let processor = processor(
            r#"
            log_statements:
              - context: log
                statements:
                  - delete_key(attributes, "password")
            "#,
        );

        let mut logs = log_batch();
        processor.process_logs(&mut logs);

        let record = &logs.resource_logs()[0].scope_logs()[0].log_records()[0];
        assert!(!record.attributes().contains_key("password"));
        assert_eq!(record.attributes().get("user"), Some(&AnyValue::String("alice".into())));
    }

    #[test]
    fn test_failed_statement_does_not_stop_the_group() {
        let processor = processor(
            r#"
            trace_statements:
              - context: span
                statements:
                  - set(attributes["bad"], 1 / 0)
                  - set(attributes["ok"], true)
            "#,
        );

        let mut traces = trace_batch();
        processor.process_traces(&mut traces);

        for span in traces.resource_spans()[0].scope_spans()[0].spans() {
            assert_eq!(span.attributes().get("bad"), None);
            assert_eq!(span.attributes().get("ok"), Some(&AnyValue::Bool(true)));
        }
    }

    #[test]
    fn test_groups_run_in_declaration_order() {
        let processor = processor(
            r#"
            trace_statements:
              - context: resource
                statements:
                  - set(attributes["team"], "payments")
              - context: span
                statements:
                  - set(attributes["team"], resource.attributes["team"])
            "#,
        );

        let mut traces = trace_batch();
        processor.process_traces(&mut traces);

        let resource_spans = &traces.resource_spans()[0];
        assert_eq!(
            resource_spans.resource().attributes().get("team"),
            Some(&AnyValue::String("payments".into()))
        );
        for span in resource_spans.scope_spans()[0].spans() {
            assert_eq!(span.attributes().get("team"), Some(&AnyValue::String("payments".into())));
        }
    }

    #[test]
    fn test_scope_statements_see_resource_and_edit_scope() {
        let processor = processor(
            r#"
            trace_statements:
              - context: scope
                statements:
                  - set(attributes["host"], resource.attributes["host.name"]) where name == "checkout-service"
            "#,
        );

        let mut traces = trace_batch();
        processor.process_traces(&mut traces);

        let scope = traces.resource_spans()[0].scope_spans()[0].scope();
        assert_eq!(scope.attributes().get("host"), Some(&AnyValue::String("web-1".into())));
    }

    #[test]
    fn test_datapoint_guard_on_metric_name() {
        let processor = processor(
            r#"
            metric_statements:
              - context: datapoint
                statements:
                  - set(attributes["tier"], "frontend") where metric.name == "http.requests"
            "#,
        );

        let mut metrics = metric_batch();
        processor.process_metrics(&mut metrics);

        let metric_list = metrics.resource_metrics()[0].scope_metrics()[0].metrics();
        for point in metric_list[0].data().data_points() {
            assert_eq!(point.attributes().get("tier"), Some(&AnyValue::String("frontend".into())));
        }
        for point in metric_list[1].data().data_points() {
            assert_eq!(point.attributes().get("tier"), None);
        }
    }

    #[test]
    fn test_metric_context_renames_metric() {
        let processor = processor(
            r#"
            metric_statements:
              - context: metric
                statements:
                  - set(name, "http.server.requests") where name == "http.requests"
            "#,
        );

        let mut metrics = metric_batch();
        processor.process_metrics(&mut metrics);

        let metric_list = metrics.resource_metrics()[0].scope_metrics()[0].metrics();
        assert_eq!(metric_list[0].name(), "http.server.requests");
        assert_eq!(metric_list[1].name(), "http.latency");
    }

    #[test]
    fn test_spanevent_statements_edit_events() {
        let processor = processor(
            r#"
            trace_statements:
              - context: spanevent
                statements:
                  - set(attributes["flagged"], true) where name == "exception"
            "#,
        );

        let mut traces = trace_batch();
        {
            let span = &mut traces.resource_spans_mut()[0].scope_spans_mut()[0].spans_mut()[0];
            span.events_mut().push(borzoi_telemetry::trace::SpanEvent::new("exception"));
            span.events_mut().push(borzoi_telemetry::trace::SpanEvent::new("retry"));
        }
        processor.process_traces(&mut traces);

        let events = traces.resource_spans()[0].scope_spans()[0].spans()[0].events();
        assert_eq!(events[0].attributes().get("flagged"), Some(&AnyValue::Bool(true)));
        assert_eq!(events[1].attributes().get("flagged"), None);
    }

    #[test]
    fn test_legacy_form_processes_default_contexts() {
        let processor = processor(
            r#"
            traces:
              statements:
                - set(attributes["env"], "prod")
            logs:
              statements:
                - set(severity_text, "ERROR") where severity_number == SEVERITY_NUMBER_ERROR
            "#,
        );

        let mut traces = trace_batch();
        processor.process_traces(&mut traces);
        for span in traces.resource_spans()[0].scope_spans()[0].spans() {
            assert_eq!(span.attributes().get("env"), Some(&AnyValue::String("prod".into())));
        }

        let mut logs = log_batch();
        logs.resource_logs_mut()[0].scope_logs_mut()[0].log_records_mut()[0].set_severity_number(17);
        processor.process_logs(&mut logs);
        let record = &logs.resource_logs()[0].scope_logs()[0].log_records()[0];
        assert_eq!(record.severity_text(), "ERROR");
    }

    #[test]
    fn test_shared_processor_is_deterministic_across_threads() {
        let processor = Arc::new(processor(
            r#"
            trace_statements:
              - context: span
                statements:
                  - set(attributes["env"], "prod") where name == "checkout"
                  - replace_pattern(attributes["env"], "prod", "production")
            "#,
        ));

        let mut expected = trace_batch();
        processor.process_traces(&mut expected);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let processor = Arc::clone(&processor);
                std::thread::spawn(move || {
                    let mut traces = trace_batch();
                    processor.process_traces(&mut traces);
                    traces
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
