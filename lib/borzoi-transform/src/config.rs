//! Processor configuration.
//!
//! Two front-ends are accepted per signal: the grouped form
//! (`trace_statements: [{context: span, statements: [..]}]`) and the legacy
//! flat form (`traces: {statements: [..]}`), which binds to the signal's
//! default context. Supplying both for one signal is a validation error.

use std::fmt;

use serde::Deserialize;
use snafu::Snafu;

use crate::functions::TransformLibraries;
use crate::processor::TransformProcessor;

/// The record shape a statement group binds to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    /// Resource statements.
    Resource,
    /// Instrumentation scope statements.
    Scope,
    /// Span statements.
    Span,
    /// Span event statements.
    SpanEvent,
    /// Metric statements.
    Metric,
    /// Number data point statements.
    DataPoint,
    /// Log record statements.
    Log,
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextKind::Resource => "resource",
            ContextKind::Scope => "scope",
            ContextKind::Span => "span",
            ContextKind::SpanEvent => "spanevent",
            ContextKind::Metric => "metric",
            ContextKind::DataPoint => "datapoint",
            ContextKind::Log => "log",
        };
        f.write_str(name)
    }
}

/// One statement group: a context and the statements bound to it.
#[derive(Clone, Debug, Deserialize)]
pub struct ContextStatements {
    /// The shape the statements bind to.
    pub context: ContextKind,
    /// The statements, applied in order.
    #[serde(default)]
    pub statements: Vec<String>,
}

/// The legacy flat form for one signal.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SignalStatements {
    /// The statements, bound to the signal's default context.
    #[serde(default)]
    pub statements: Vec<String>,
}

/// Configuration of the transform processor.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformConfig {
    /// Grouped trace statements.
    #[serde(default)]
    pub trace_statements: Vec<ContextStatements>,
    /// Grouped metric statements.
    #[serde(default)]
    pub metric_statements: Vec<ContextStatements>,
    /// Grouped log statements.
    #[serde(default)]
    pub log_statements: Vec<ContextStatements>,

    /// Legacy flat trace statements (bound to the span context).
    #[serde(default)]
    pub traces: SignalStatements,
    /// Legacy flat metric statements (bound to the datapoint context).
    #[serde(default)]
    pub metrics: SignalStatements,
    /// Legacy flat log statements (bound to the log context).
    #[serde(default)]
    pub logs: SignalStatements,
}

impl TransformConfig {
    /// Fully compiles every statement of every group against the standard
    /// libraries, without building a processor. Reports the signal, context
    /// and statement text on failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        TransformProcessor::from_config_with_libraries(self, TransformLibraries::default()).map(|_| ())
    }

    pub(crate) fn check_forms(&self) -> Result<(), ConfigError> {
        let signals = [
            ("traces", !self.trace_statements.is_empty(), !self.traces.statements.is_empty()),
            ("metrics", !self.metric_statements.is_empty(), !self.metrics.statements.is_empty()),
            ("logs", !self.log_statements.is_empty(), !self.logs.statements.is_empty()),
        ];
        for (signal, grouped, legacy) in signals {
            if grouped && legacy {
                return Err(ConfigError::ConflictingForms { signal });
            }
        }
        Ok(())
    }

    /// The effective trace groups, with the legacy form folded into a single
    /// span-context group.
    pub(crate) fn trace_groups(&self) -> Vec<ContextStatements> {
        effective_groups(&self.trace_statements, &self.traces, ContextKind::Span)
    }

    pub(crate) fn metric_groups(&self) -> Vec<ContextStatements> {
        effective_groups(&self.metric_statements, &self.metrics, ContextKind::DataPoint)
    }

    pub(crate) fn log_groups(&self) -> Vec<ContextStatements> {
        effective_groups(&self.log_statements, &self.logs, ContextKind::Log)
    }
}

fn effective_groups(
    grouped: &[ContextStatements], legacy: &SignalStatements, default_context: ContextKind,
) -> Vec<ContextStatements> {
    if !grouped.is_empty() {
        grouped.to_vec()
    } else if !legacy.statements.is_empty() {
        vec![ContextStatements {
            context: default_context,
            statements: legacy.statements.clone(),
        }]
    } else {
        Vec::new()
    }
}

/// A configuration rejection. Always fatal before any telemetry flows.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ConfigError {
    /// A signal uses both the legacy and the grouped form.
    #[snafu(display("{signal}: legacy and grouped statement forms cannot both be set"))]
    ConflictingForms {
        /// The signal with both forms set.
        signal: &'static str,
    },

    /// A group names a context that does not exist for its signal.
    #[snafu(display("{signal}: context '{context}' is not valid for this signal"))]
    InvalidContext {
        /// The signal the group belongs to.
        signal: &'static str,
        /// The context as configured.
        context: ContextKind,
    },

    /// A statement failed to compile.
    #[snafu(display("{signal}/{context}: {source}"))]
    InvalidStatement {
        /// The signal the statement belongs to.
        signal: &'static str,
        /// The context the statement binds to.
        context: ContextKind,
        /// The compile failure.
        source: borzoi_lang::ParseError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_form_deserializes() {
        let config: TransformConfig = serde_yaml::from_str(
            r#"
            trace_statements:
              - context: span
                statements:
                  - set(attributes["env"], "prod") where name == "checkout"
              - context: resource
                statements:
                  - set(attributes["team"], "payments")
            log_statements:
              - context: log
                statements:
                  - delete_key(attributes, "password")
            "#,
        )
        .unwrap();

        assert_eq!(config.trace_statements.len(), 2);
        assert_eq!(config.trace_statements[0].context, ContextKind::Span);
        assert_eq!(config.trace_statements[1].context, ContextKind::Resource);
        assert_eq!(config.log_statements[0].context, ContextKind::Log);
        config.validate().unwrap();
    }

    #[test]
    fn test_legacy_form_binds_to_default_context() {
        let config: TransformConfig = serde_yaml::from_str(
            r#"
            traces:
              statements:
                - set(attributes["env"], "prod")
            metrics:
              statements:
                - set(attributes["host"], resource.attributes["host.name"])
            "#,
        )
        .unwrap();

        let trace_groups = config.trace_groups();
        assert_eq!(trace_groups.len(), 1);
        assert_eq!(trace_groups[0].context, ContextKind::Span);

        let metric_groups = config.metric_groups();
        assert_eq!(metric_groups[0].context, ContextKind::DataPoint);
        config.validate().unwrap();
    }

    #[test]
    fn test_both_forms_for_one_signal_is_rejected() {
        let config: TransformConfig = serde_yaml::from_str(
            r#"
            traces:
              statements:
                - set(attributes["a"], 1)
            trace_statements:
              - context: span
                statements:
                  - set(attributes["b"], 2)
            "#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingForms { signal: "traces" }));
    }

    #[test]
    fn test_invalid_context_for_signal_is_rejected() {
        let config: TransformConfig = serde_yaml::from_str(
            r#"
            log_statements:
              - context: span
                statements:
                  - set(attributes["a"], 1)
            "#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidContext {
                signal: "logs",
                context: ContextKind::Span
            }
        ));
    }

    #[test]
    fn test_undefined_function_fails_validation_with_statement() {
        let config: TransformConfig = serde_yaml::from_str(
            r#"
            trace_statements:
              - context: span
                statements:
                  - vaporize(attributes)
            "#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        match err {
            ConfigError::InvalidStatement { signal, context, source } => {
                assert_eq!(signal, "traces");
                assert_eq!(context, ContextKind::Span);
                let message = source.to_string();
                assert!(message.contains("vaporize"), "got: {message}");
                assert!(message.contains("vaporize(attributes)"), "got: {message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result: Result<TransformConfig, _> = serde_yaml::from_str("span_statements: []");
        assert!(result.is_err());
    }
}
