//! In-memory telemetry record model.
//!
//! These are the records the transform engine mutates: spans (and their
//! events), metrics (and their data points), and log records, each carried
//! under a resource and an instrumentation scope. The model is deliberately
//! plain data: batches own their records, and mutation happens through
//! accessors so the engine never needs to reach around the types.
#![deny(missing_docs)]

mod attribute;
pub use self::attribute::{AnyValue, AttributeMap};

pub mod log;
pub mod metric;
pub mod trace;

mod resource;
pub use self::resource::{InstrumentationScope, Resource};
