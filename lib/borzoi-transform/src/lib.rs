//! Statement-based telemetry transformation.
//!
//! This crate binds the transformation language to the telemetry record
//! model: one context per record shape (resource, scope, span, span event,
//! metric, data point, log record), the standard editor and converter
//! libraries, and the processor that compiles configured statement groups
//! and applies them to batches in place.
//!
//! Configuration is validated up front: every statement compiles, or the
//! processor refuses to start. At runtime a failing statement is logged and
//! counted, and processing moves on to the next record.

pub mod config;
pub mod contexts;
pub mod functions;
mod processor;

pub use self::config::{ConfigError, ContextKind, ContextStatements, SignalStatements, TransformConfig};
pub use self::functions::{standard_library, TransformLibraries};
pub use self::processor::TransformProcessor;
