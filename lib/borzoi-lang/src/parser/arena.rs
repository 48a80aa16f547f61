//! Arena-allocated compiled AST.
//!
//! The compile step walks the parsed AST once, binding every function name
//! against the library and every path against the target shape, checking
//! arity, path positions and statically-visible literal types, and folding
//! constant subexpressions. Nodes live in per-kind vectors and refer to each
//! other through `u32` indexes, keeping evaluation free of pointer chasing
//! through boxes.

use super::ast::*;
use super::ops::try_math_op;
use crate::{
    ArgSpec, ContextFamily, FunctionLibrary, FunctionSpec, ParseError, PathKey, Value,
};

macro_rules! arena_ref {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, Eq, PartialEq)]
        pub(super) struct $name(u32);

        impl $name {
            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_ref!(ValueRef);
arena_ref!(MathRef);
arena_ref!(BoolRef);
arena_ref!(CallRef);
arena_ref!(PathRef);

/// A path bound to the target shape, with its original text kept for
/// diagnostics.
pub(super) struct ResolvedPath<F: ContextFamily> {
    pub text: String,
    pub path: F::Path,
    pub keys: Vec<PathKey>,
}

pub(super) enum CompiledValue {
    Literal(Value),
    Path(PathRef),
    List(Vec<ValueRef>),
    Map(Vec<(String, ValueRef)>),
    Converter(CallRef),
    Math(MathRef),
}

pub(super) enum CompiledMath {
    Value(ValueRef),
    Negate(MathRef),
    Binary {
        left: MathRef,
        op: MathOp,
        right: MathRef,
    },
}

pub(super) enum CompiledBool {
    Literal(bool),
    Comparison {
        left: ValueRef,
        op: CompOp,
        right: ValueRef,
    },
    Converter(CallRef),
    Path(PathRef),
    Not(BoolRef),
    And(BoolRef, BoolRef),
    Or(BoolRef, BoolRef),
}

pub(super) struct CompiledArg {
    pub name: Option<String>,
    pub value: ValueRef,
}

pub(super) struct CompiledCall<F: ContextFamily> {
    pub name: String,
    pub spec: FunctionSpec<F>,
    pub args: Vec<CompiledArg>,
    pub keys: Vec<PathKey>,
}

/// Backing storage for one compiled statement or condition.
pub(super) struct AstArena<F: ContextFamily> {
    values: Vec<CompiledValue>,
    maths: Vec<CompiledMath>,
    bools: Vec<CompiledBool>,
    calls: Vec<CompiledCall<F>>,
    paths: Vec<ResolvedPath<F>>,
}

impl<F: ContextFamily> AstArena<F> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            maths: Vec::new(),
            bools: Vec::new(),
            calls: Vec::new(),
            paths: Vec::new(),
        }
    }

    fn alloc_value(&mut self, node: CompiledValue) -> ValueRef {
        self.values.push(node);
        ValueRef(self.values.len() as u32 - 1)
    }

    fn alloc_math(&mut self, node: CompiledMath) -> MathRef {
        self.maths.push(node);
        MathRef(self.maths.len() as u32 - 1)
    }

    fn alloc_bool(&mut self, node: CompiledBool) -> BoolRef {
        self.bools.push(node);
        BoolRef(self.bools.len() as u32 - 1)
    }

    fn alloc_call(&mut self, node: CompiledCall<F>) -> CallRef {
        self.calls.push(node);
        CallRef(self.calls.len() as u32 - 1)
    }

    fn alloc_path(&mut self, node: ResolvedPath<F>) -> PathRef {
        self.paths.push(node);
        PathRef(self.paths.len() as u32 - 1)
    }

    pub fn value(&self, r: ValueRef) -> &CompiledValue {
        &self.values[r.index()]
    }

    pub fn math(&self, r: MathRef) -> &CompiledMath {
        &self.maths[r.index()]
    }

    pub fn bool(&self, r: BoolRef) -> &CompiledBool {
        &self.bools[r.index()]
    }

    pub fn call(&self, r: CallRef) -> &CompiledCall<F> {
        &self.calls[r.index()]
    }

    pub fn path(&self, r: PathRef) -> &ResolvedPath<F> {
        &self.paths[r.index()]
    }
}

/// The entry points of one compiled statement.
pub(super) struct CompiledStatement {
    pub editor: CallRef,
    pub condition: Option<BoolRef>,
}

fn path_text(path: &PathExpr) -> String {
    use std::fmt::Write as _;

    let mut text = path.segments.join(".");
    for key in &path.keys {
        match key {
            PathKey::String(s) => {
                let _ = write!(text, "[\"{}\"]", s);
            }
            PathKey::Int(i) => {
                let _ = write!(text, "[{}]", i);
            }
        }
    }
    text
}

/// Folds a purely literal arithmetic tree at compile time. Returns `None`
/// when an operand is not a literal or the operation would error, deferring
/// to evaluation.
fn fold_math(expr: &MathExpr) -> Option<Value> {
    match expr {
        MathExpr::Primary(ValueExpr::Literal(v)) => Some(v.clone()),
        MathExpr::Primary(_) => None,
        MathExpr::Negate(inner) => match fold_math(inner)? {
            Value::Int(v) => v.checked_neg().map(Value::Int),
            Value::Float(v) => Some(Value::Float(-v)),
            _ => None,
        },
        MathExpr::Binary { left, op, right } => {
            let left = fold_math(left)?;
            let right = fold_math(right)?;
            try_math_op(&left, op, &right)
        }
    }
}

enum CallKind {
    Editor,
    Converter,
}

/// Compiles parsed nodes into an arena, against one library and one shape.
pub(super) struct Compiler<'a, F: ContextFamily> {
    arena: &'a mut AstArena<F>,
    library: &'a FunctionLibrary<F>,
    statement: &'a str,
}

impl<'a, F: ContextFamily> Compiler<'a, F> {
    pub fn new(arena: &'a mut AstArena<F>, library: &'a FunctionLibrary<F>, statement: &'a str) -> Self {
        Self {
            arena,
            library,
            statement,
        }
    }

    pub fn compile_statement(&mut self, parsed: &ParsedStatement) -> Result<CompiledStatement, ParseError> {
        let editor = self.compile_call(&parsed.editor, CallKind::Editor)?;
        let condition = match &parsed.condition {
            Some(cond) => Some(self.compile_bool(cond)?),
            None => None,
        };
        Ok(CompiledStatement { editor, condition })
    }

    pub fn compile_condition(&mut self, parsed: &BoolExpr) -> Result<BoolRef, ParseError> {
        self.compile_bool(parsed)
    }

    fn compile_path(&mut self, path: &PathExpr) -> Result<PathRef, ParseError> {
        let bound = F::resolve_path(&path.segments).map_err(|source| ParseError::InvalidPath {
            source,
            statement: self.statement.to_string(),
        })?;
        Ok(self.arena.alloc_path(ResolvedPath {
            text: path_text(path),
            path: bound,
            keys: path.keys.clone(),
        }))
    }

    fn compile_value(&mut self, expr: &ValueExpr) -> Result<ValueRef, ParseError> {
        let node = match expr {
            ValueExpr::Literal(v) => CompiledValue::Literal(v.clone()),
            ValueExpr::Path(path) => {
                let path = self.compile_path(path)?;
                CompiledValue::Path(path)
            }
            ValueExpr::List(items) => {
                if let Some(values) = literal_list(items) {
                    CompiledValue::Literal(Value::List(values))
                } else {
                    let items = items
                        .iter()
                        .map(|item| self.compile_value(item))
                        .collect::<Result<Vec<_>, _>>()?;
                    CompiledValue::List(items)
                }
            }
            ValueExpr::Map(entries) => {
                if let Some(map) = literal_map(entries) {
                    CompiledValue::Literal(Value::Map(map))
                } else {
                    let entries = entries
                        .iter()
                        .map(|(key, value)| Ok((key.clone(), self.compile_value(value)?)))
                        .collect::<Result<Vec<_>, ParseError>>()?;
                    CompiledValue::Map(entries)
                }
            }
            ValueExpr::Converter(call) => {
                let call = self.compile_call(call, CallKind::Converter)?;
                CompiledValue::Converter(call)
            }
            ValueExpr::Math(math) => match fold_math(math) {
                Some(v) => CompiledValue::Literal(v),
                None => {
                    let math = self.compile_math(math)?;
                    CompiledValue::Math(math)
                }
            },
        };
        Ok(self.arena.alloc_value(node))
    }

    fn compile_math(&mut self, expr: &MathExpr) -> Result<MathRef, ParseError> {
        let node = match expr {
            MathExpr::Primary(value) => {
                let value = self.compile_value(value)?;
                CompiledMath::Value(value)
            }
            MathExpr::Negate(inner) => {
                let inner = self.compile_math(inner)?;
                CompiledMath::Negate(inner)
            }
            MathExpr::Binary { left, op, right } => {
                let left = self.compile_math(left)?;
                let right = self.compile_math(right)?;
                CompiledMath::Binary { left, op: *op, right }
            }
        };
        Ok(self.arena.alloc_math(node))
    }

    fn compile_bool(&mut self, expr: &BoolExpr) -> Result<BoolRef, ParseError> {
        let node = match expr {
            BoolExpr::Literal(v) => CompiledBool::Literal(*v),
            BoolExpr::Comparison { left, op, right } => {
                // Two literal sides fold to their outcome immediately.
                if let (ValueExpr::Literal(l), ValueExpr::Literal(r)) = (left, right) {
                    CompiledBool::Literal(super::ops::compare(l, op, r))
                } else {
                    let left = self.compile_value(left)?;
                    let right = self.compile_value(right)?;
                    CompiledBool::Comparison { left, op: *op, right }
                }
            }
            BoolExpr::Converter(call) => {
                let call = self.compile_call(call, CallKind::Converter)?;
                CompiledBool::Converter(call)
            }
            BoolExpr::Path(path) => {
                let path = self.compile_path(path)?;
                CompiledBool::Path(path)
            }
            BoolExpr::Not(inner) => {
                let inner = self.compile_bool(inner)?;
                match self.arena.bool(inner) {
                    CompiledBool::Literal(v) => CompiledBool::Literal(!v),
                    _ => CompiledBool::Not(inner),
                }
            }
            BoolExpr::And(left, right) => {
                let left = self.compile_bool(left)?;
                let right = self.compile_bool(right)?;
                CompiledBool::And(left, right)
            }
            BoolExpr::Or(left, right) => {
                let left = self.compile_bool(left)?;
                let right = self.compile_bool(right)?;
                CompiledBool::Or(left, right)
            }
        };
        Ok(self.arena.alloc_bool(node))
    }

    fn compile_call(&mut self, call: &FunctionCall, kind: CallKind) -> Result<CallRef, ParseError> {
        let spec = match kind {
            CallKind::Editor => self.library.editor(&call.name),
            CallKind::Converter => self.library.converter(&call.name),
        };
        let spec = spec
            .ok_or_else(|| ParseError::UndefinedFunction {
                name: call.name.clone(),
                statement: self.statement.to_string(),
            })?
            .clone();

        if call.args.len() < spec.min_args() || call.args.len() > spec.max_args() {
            return Err(ParseError::WrongArgumentCount {
                function: call.name.clone(),
                min: spec.min_args(),
                max: spec.max_args(),
                actual: call.args.len(),
                statement: self.statement.to_string(),
            });
        }

        let mut args = Vec::with_capacity(call.args.len());
        for (index, arg) in call.args.iter().enumerate() {
            match spec.arg_spec(index) {
                ArgSpec::Any => {}
                ArgSpec::Path => {
                    if !matches!(arg.value(), ValueExpr::Path(_)) {
                        return Err(ParseError::PathArgument {
                            function: call.name.clone(),
                            index,
                            statement: self.statement.to_string(),
                        });
                    }
                }
                ArgSpec::OneOf(kinds) => {
                    // Only literals are checkable before any record exists;
                    // everything else is checked per record. A literal nil is
                    // always admissible, since paths can resolve to nil too.
                    if let ValueExpr::Literal(v) = arg.value() {
                        if !v.is_nil() && !kinds.contains(&v.kind()) {
                            return Err(ParseError::LiteralArgumentType {
                                function: call.name.clone(),
                                index,
                                actual: v.kind(),
                                statement: self.statement.to_string(),
                            });
                        }
                    }
                }
            }

            let name = match arg {
                ArgExpr::Positional(_) => None,
                ArgExpr::Named { name, .. } => Some(name.clone()),
            };
            let value = self.compile_value(arg.value())?;
            args.push(CompiledArg { name, value });
        }

        Ok(self.arena.alloc_call(CompiledCall {
            name: call.name.clone(),
            spec,
            args,
            keys: call.keys.clone(),
        }))
    }
}

fn literal_list(items: &[ValueExpr]) -> Option<Vec<Value>> {
    items
        .iter()
        .map(|item| match item {
            ValueExpr::Literal(v) => Some(v.clone()),
            _ => None,
        })
        .collect()
}

fn literal_map(entries: &[(String, ValueExpr)]) -> Option<indexmap::IndexMap<String, Value>> {
    entries
        .iter()
        .map(|(key, value)| match value {
            ValueExpr::Literal(v) => Some((key.clone(), v.clone())),
            _ => None,
        })
        .collect()
}
