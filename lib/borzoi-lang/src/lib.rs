//! Statement language for rewriting telemetry records in flight.
//!
//! A statement is a single editor invocation with an optional boolean guard:
//!
//! ```text
//! set(attributes["env"], "prod") where name == "checkout"
//! ```
//!
//! Statements are compiled once, at pipeline configuration time, against a
//! [`FunctionLibrary`] and a record shape (a [`ContextFamily`]): the lexer and
//! grammar produce an AST, the compile step binds every function name and
//! path, checks arity and statically-visible argument types, and folds
//! constants. The resulting [`Statement`] is immutable and `Send + Sync`, and
//! is evaluated synchronously against one record at a time. Parse failures
//! are fatal ([`ParseError`]); evaluation failures ([`EvalError`]) are scoped
//! to a single (statement, record) pair and never panic.
//!
//! This crate knows nothing about telemetry: record shapes plug in through
//! the [`ContextFamily`] trait, and every editor/converter is supplied by the
//! caller through the [`FunctionLibrary`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use snafu::Snafu;

pub(crate) mod lexer;
mod parser;

#[cfg(test)]
mod tests;

pub use parser::{Condition, Parser, Statement};

// =====================================================================================================================
// Values
// =====================================================================================================================

/// Every runtime value a statement can produce or consume.
///
/// A value's tag never changes after construction; conversions between tags
/// go through explicit converter functions, never implicit coercion.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// The absent value: a path that resolved to nothing.
    #[default]
    Nil,
    /// A boolean.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// An opaque byte sequence (e.g. a trace ID).
    Bytes(Vec<u8>),
    /// A point in time, in Unix nanoseconds.
    Timestamp(u64),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A map of string keys to values, preserving insertion order.
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Creates a string value.
    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    /// Creates a bytes value.
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(value.into())
    }

    /// Returns the tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Returns `true` if this is the absent value.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

/// The tag of a [`Value`], without its payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueKind {
    /// The absent value.
    Nil,
    /// A boolean.
    Bool,
    /// A 64-bit signed integer.
    Int,
    /// A 64-bit floating point number.
    Float,
    /// A UTF-8 string.
    String,
    /// An opaque byte sequence.
    Bytes,
    /// A point in time.
    Timestamp,
    /// An ordered list of values.
    List,
    /// A map of string keys to values.
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Nil => "nil",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Timestamp => "timestamp",
            ValueKind::List => "list",
            ValueKind::Map => "map",
        };
        f.write_str(name)
    }
}

/// A single key applied to a path or converter result: either a map key or a
/// list index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathKey {
    /// A map key, e.g. `attributes["env"]`.
    String(String),
    /// A list index, e.g. `Split(name, "-")[0]`.
    Int(usize),
}

// =====================================================================================================================
// Context binding
// =====================================================================================================================

/// One record shape a statement can be bound to.
///
/// An implementation maps the textual paths of its shape to a compiled
/// [`Self::Path`] at statement-compile time, and applies compiled paths to a
/// concrete record ([`Self::Context`]) at evaluation time. Binding a path at
/// compile time means the evaluation hot path performs no shape checks; the
/// path is still applied freshly to every record, never cached as a resolved
/// location across records.
pub trait ContextFamily: Sized + 'static {
    /// The compiled, shape-bound representation of a path.
    type Path: Clone + fmt::Debug + Send + Sync + 'static;

    /// The evaluation context for one record of this shape, borrowing the
    /// record (and read-only ancestors) for the duration of one evaluation.
    type Context<'a>: 'a;

    /// The name of this shape, used in configuration and diagnostics (e.g.
    /// `"span"`).
    fn context_name() -> &'static str;

    /// Resolves dotted path segments to a compiled path, or fails if the
    /// shape has no such field.
    fn resolve_path(segments: &[String]) -> Result<Self::Path, PathError>;

    /// Reads the value at `path` from the record. Missing map keys and list
    /// indexes resolve to [`Value::Nil`], never an error.
    fn get(ctx: &Self::Context<'_>, path: &Self::Path, keys: &[PathKey]) -> Result<Value, EvalError>;

    /// Writes `value` at `path` on the record. Missing intermediate maps are
    /// created; read-only paths and tag mismatches fail.
    fn set(ctx: &mut Self::Context<'_>, path: &Self::Path, keys: &[PathKey], value: Value) -> Result<(), EvalError>;
}

/// Failure to bind a path to a record shape. Always a compile-time error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum PathError {
    /// The shape has no field with this name.
    #[snafu(display("unknown path '{path}' for {context} context"))]
    UnknownPath {
        /// The shape the statement is bound to.
        context: &'static str,
        /// The dotted path as written.
        path: String,
    },
}

// =====================================================================================================================
// Function calls
// =====================================================================================================================

/// Lazy access to the arguments of one function call during evaluation.
///
/// Arguments are evaluated on demand: a guard that short-circuits, or an
/// editor that skips an absent value, never pays for the arguments it does
/// not look at. Path-valued arguments can also be written through, which is
/// how editors mutate the record.
pub trait Args<F: ContextFamily> {
    /// Returns the number of arguments passed to the call.
    fn len(&self) -> usize;

    /// Returns `true` if the call has no arguments.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the name of the argument at `index` if it was passed as a
    /// named argument.
    fn name(&self, index: usize) -> Option<&str>;

    /// Evaluates the argument at `index` against the current record.
    fn get(&mut self, index: usize) -> Result<Value, EvalError>;

    /// Writes `value` through the argument at `index`, which must be a path
    /// expression.
    fn set(&mut self, index: usize, value: Value) -> Result<(), EvalError>;
}

/// The implementation of an editor or converter.
pub type CallbackFn<F> = Arc<dyn Fn(&mut dyn Args<F>) -> Result<Value, EvalError> + Send + Sync>;

/// The per-position constraint a function places on an argument.
#[derive(Clone, Copy, Debug)]
pub enum ArgSpec {
    /// Any value.
    Any,
    /// The argument must be written as a path expression (an edit target).
    Path,
    /// The argument's value must carry one of these tags. Checked at compile
    /// time for literal arguments, at evaluation time otherwise.
    OneOf(&'static [ValueKind]),
}

/// A function registered in a [`FunctionLibrary`]: its arity, per-position
/// argument constraints, and implementation.
pub struct FunctionSpec<F: ContextFamily> {
    min_args: usize,
    max_args: usize,
    args: &'static [ArgSpec],
    callback: CallbackFn<F>,
}

// Derived `Clone` would demand `F: Clone`, which context families never are.
impl<F: ContextFamily> Clone for FunctionSpec<F> {
    fn clone(&self) -> Self {
        Self {
            min_args: self.min_args,
            max_args: self.max_args,
            args: self.args,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<F: ContextFamily> FunctionSpec<F> {
    /// Creates a function spec. For variadic functions, pass
    /// `max_args = usize::MAX`; the last entry of `args` constrains every
    /// trailing argument.
    pub fn new(min_args: usize, max_args: usize, args: &'static [ArgSpec], callback: CallbackFn<F>) -> Self {
        Self {
            min_args,
            max_args,
            args,
            callback,
        }
    }

    /// Minimum number of arguments accepted.
    pub fn min_args(&self) -> usize {
        self.min_args
    }

    /// Maximum number of arguments accepted.
    pub fn max_args(&self) -> usize {
        self.max_args
    }

    /// The constraint for the argument at `index`. Trailing variadic
    /// arguments reuse the last declared constraint.
    pub fn arg_spec(&self, index: usize) -> ArgSpec {
        match self.args.get(index) {
            Some(spec) => *spec,
            None => self.args.last().copied().unwrap_or(ArgSpec::Any),
        }
    }

    /// The implementation of this function.
    pub fn callback(&self) -> &CallbackFn<F> {
        &self.callback
    }
}

impl<F: ContextFamily> fmt::Debug for FunctionSpec<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSpec")
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .field("args", &self.args)
            .finish()
    }
}

/// Named integer constants usable as bare identifiers in statements (e.g.
/// `SPAN_KIND_SERVER`).
pub type EnumMap = HashMap<String, i64>;

/// The functions and enums available to statements bound to one record
/// shape.
///
/// Editors (lowercase names, mutating) and converters (uppercase names,
/// pure) live in separate maps: the grammar only routes converters into
/// guards and arguments, so guard evaluation can structurally never invoke
/// an editor. A library is moved into [`Parser::new`], which seals it:
/// registration is impossible once parsing has begun.
pub struct FunctionLibrary<F: ContextFamily> {
    editors: HashMap<String, FunctionSpec<F>>,
    converters: HashMap<String, FunctionSpec<F>>,
    enums: EnumMap,
}

impl<F: ContextFamily> FunctionLibrary<F> {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self {
            editors: HashMap::new(),
            converters: HashMap::new(),
            enums: EnumMap::new(),
        }
    }

    /// Registers an editor under `name`.
    pub fn register_editor(&mut self, name: impl Into<String>, spec: FunctionSpec<F>) {
        self.editors.insert(name.into(), spec);
    }

    /// Registers a converter under `name`.
    pub fn register_converter(&mut self, name: impl Into<String>, spec: FunctionSpec<F>) {
        self.converters.insert(name.into(), spec);
    }

    /// Registers an enum constant under `name`.
    pub fn register_enum(&mut self, name: impl Into<String>, value: i64) {
        self.enums.insert(name.into(), value);
    }

    /// Looks up an editor by name.
    pub fn editor(&self, name: &str) -> Option<&FunctionSpec<F>> {
        self.editors.get(name)
    }

    /// Looks up a converter by name.
    pub fn converter(&self, name: &str) -> Option<&FunctionSpec<F>> {
        self.converters.get(name)
    }

    /// The enum constants of this library.
    pub fn enums(&self) -> &EnumMap {
        &self.enums
    }
}

impl<F: ContextFamily> Default for FunctionLibrary<F> {
    fn default() -> Self {
        Self::new()
    }
}

// =====================================================================================================================
// Errors
// =====================================================================================================================

/// A compile-time failure: the statement is rejected before any telemetry
/// flows. Carries the statement text so operators can find the offending
/// configuration entry.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ParseError {
    /// The lexer hit a character sequence that is not part of the language.
    #[snafu(display("invalid token '{token}' at position {position} in statement '{statement}'"))]
    InvalidToken {
        /// The offending input slice.
        token: String,
        /// Byte offset of the token in the statement.
        position: usize,
        /// The statement as written.
        statement: String,
    },

    /// The token stream does not match the grammar.
    #[snafu(display("syntax error in statement '{statement}': {detail}"))]
    Syntax {
        /// What the grammar expected.
        detail: String,
        /// The statement as written.
        statement: String,
    },

    /// The statement calls a function the library does not define.
    #[snafu(display("undefined function '{name}' in statement '{statement}'"))]
    UndefinedFunction {
        /// The function name as written.
        name: String,
        /// The statement as written.
        statement: String,
    },

    /// The statement passes the wrong number of arguments to a function.
    #[snafu(display(
        "'{function}' expects between {min} and {max} arguments, got {actual}, in statement '{statement}'"
    ))]
    WrongArgumentCount {
        /// The function being called.
        function: String,
        /// Minimum accepted arity.
        min: usize,
        /// Maximum accepted arity.
        max: usize,
        /// The arity as written.
        actual: usize,
        /// The statement as written.
        statement: String,
    },

    /// A literal argument carries a tag the function does not accept.
    #[snafu(display(
        "argument {index} of '{function}' cannot be a {actual} in statement '{statement}'"
    ))]
    LiteralArgumentType {
        /// The function being called.
        function: String,
        /// Zero-based argument position.
        index: usize,
        /// The tag of the literal as written.
        actual: ValueKind,
        /// The statement as written.
        statement: String,
    },

    /// A function requires a path (an edit target) at a position where the
    /// statement passes something else.
    #[snafu(display("argument {index} of '{function}' must be a path in statement '{statement}'"))]
    PathArgument {
        /// The function being called.
        function: String,
        /// Zero-based argument position.
        index: usize,
        /// The statement as written.
        statement: String,
    },

    /// A path does not exist on the shape the statement is bound to.
    #[snafu(display("{source}, in statement '{statement}'"))]
    InvalidPath {
        /// The binding failure.
        source: PathError,
        /// The statement as written.
        statement: String,
    },
}

/// A runtime failure while evaluating one statement against one record.
///
/// Never fatal to a batch: the executor reports the failure and moves on to
/// the next statement or record.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum EvalError {
    /// An argument resolved to a tag the function does not accept.
    #[snafu(display("argument {index} of '{function}' expected {expected}, got {actual}"))]
    ArgumentType {
        /// The function being called.
        function: String,
        /// Zero-based argument position.
        index: usize,
        /// Human-readable description of the accepted tags.
        expected: &'static str,
        /// The tag the argument resolved to.
        actual: ValueKind,
    },

    /// A function asked to write through an argument that is not a path.
    #[snafu(display("argument {index} of '{function}' is not a writable path"))]
    NotAPath {
        /// The function being called.
        function: String,
        /// Zero-based argument position.
        index: usize,
    },

    /// A function was called with fewer arguments than it tried to read.
    /// Indicates a bug in the function's spec, not in the statement.
    #[snafu(display("argument {index} requested but only {available} arguments were passed"))]
    MissingArgument {
        /// Zero-based argument position requested.
        index: usize,
        /// Number of arguments actually passed.
        available: usize,
    },

    /// An attempt to write a path the bound shape exposes read-only.
    #[snafu(display("path '{path}' is read-only"))]
    ReadOnlyPath {
        /// The path as written.
        path: String,
    },

    /// An attempt to write a value with a tag the field cannot hold.
    #[snafu(display("cannot set path '{path}' to a {actual} value"))]
    InvalidAssignment {
        /// The path as written.
        path: String,
        /// The tag of the value being written.
        actual: ValueKind,
    },

    /// An operation received a value of the wrong tag.
    #[snafu(display("{operation}: expected {expected}, got {actual}"))]
    UnexpectedType {
        /// The operation being evaluated.
        operation: &'static str,
        /// What the operation accepts.
        expected: &'static str,
        /// The tag it received.
        actual: ValueKind,
    },

    /// Integer overflow or division by zero in an arithmetic expression.
    #[snafu(display("arithmetic error: {detail}"))]
    Arithmetic {
        /// What went wrong.
        detail: &'static str,
    },

    /// A failure internal to a function, e.g. an invalid regular expression
    /// pattern resolved from record data.
    #[snafu(display("'{function}' failed: {reason}"))]
    Function {
        /// The function that failed.
        function: String,
        /// Why it failed.
        reason: String,
    },
}
