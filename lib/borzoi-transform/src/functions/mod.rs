//! The standard function libraries, one per record shape.

use borzoi_lang::{ContextFamily, FunctionLibrary};

use crate::contexts::{
    DataPointFamily, LogFamily, MetricFamily, ResourceFamily, ScopeFamily, SpanEventFamily,
    SpanFamily,
};

mod converters;
mod editors;

/// Span kind and status code constants, registered on the span shape.
const SPAN_ENUMS: &[(&str, i64)] = &[
    ("SPAN_KIND_UNSPECIFIED", 0),
    ("SPAN_KIND_INTERNAL", 1),
    ("SPAN_KIND_SERVER", 2),
    ("SPAN_KIND_CLIENT", 3),
    ("SPAN_KIND_PRODUCER", 4),
    ("SPAN_KIND_CONSUMER", 5),
    ("STATUS_CODE_UNSET", 0),
    ("STATUS_CODE_OK", 1),
    ("STATUS_CODE_ERROR", 2),
];

/// Severity number constants, registered on the log shape.
const LOG_ENUMS: &[(&str, i64)] = &[
    ("SEVERITY_NUMBER_TRACE", 1),
    ("SEVERITY_NUMBER_DEBUG", 5),
    ("SEVERITY_NUMBER_INFO", 9),
    ("SEVERITY_NUMBER_WARN", 13),
    ("SEVERITY_NUMBER_ERROR", 17),
    ("SEVERITY_NUMBER_FATAL", 21),
];

/// Builds the standard editor/converter set for one shape.
pub fn standard_library<F: ContextFamily>() -> FunctionLibrary<F> {
    let mut library = FunctionLibrary::new();
    editors::register(&mut library);
    converters::register(&mut library);
    library
}

/// The function libraries the processor compiles against, one per shape.
///
/// `Default` carries the standard set. Hosts may register extra functions or
/// enums on any of the libraries before handing them to
/// [`TransformProcessor::from_config_with_libraries`](crate::TransformProcessor::from_config_with_libraries);
/// after that the libraries are sealed inside the per-shape parsers.
pub struct TransformLibraries {
    /// Functions for `span` statements.
    pub span: FunctionLibrary<SpanFamily>,
    /// Functions for `spanevent` statements.
    pub span_event: FunctionLibrary<SpanEventFamily>,
    /// Functions for `resource` statements.
    pub resource: FunctionLibrary<ResourceFamily>,
    /// Functions for `scope` statements.
    pub scope: FunctionLibrary<ScopeFamily>,
    /// Functions for `metric` statements.
    pub metric: FunctionLibrary<MetricFamily>,
    /// Functions for `datapoint` statements.
    pub data_point: FunctionLibrary<DataPointFamily>,
    /// Functions for `log` statements.
    pub log: FunctionLibrary<LogFamily>,
}

impl Default for TransformLibraries {
    fn default() -> Self {
        let mut span = standard_library::<SpanFamily>();
        for (name, value) in SPAN_ENUMS {
            span.register_enum(*name, *value);
        }

        let mut log = standard_library::<LogFamily>();
        for (name, value) in LOG_ENUMS {
            log.register_enum(*name, *value);
        }

        Self {
            span,
            span_event: standard_library(),
            resource: standard_library(),
            scope: standard_library(),
            metric: standard_library(),
            data_point: standard_library(),
            log,
        }
    }
}
