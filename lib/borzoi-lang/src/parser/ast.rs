//! The parsed (unbound) AST produced by the grammar.
//!
//! These nodes carry names and textual paths only; function binding, path
//! binding and type checking happen when the AST is compiled into its
//! arena form (see `arena`).

use crate::{PathKey, Value};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    NotEq,
    Lt,
    Gt,
    Lte,
    Gte,
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// A path as written: dotted segments plus trailing keys, e.g.
/// `resource.attributes["host"]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    pub segments: Vec<String>,
    pub keys: Vec<PathKey>,
}

/// A function invocation: an editor at statement root, a converter anywhere
/// else. Converter results may be indexed (`Split(name, "-")[0]`).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<ArgExpr>,
    pub keys: Vec<PathKey>,
}

/// One argument of a function call.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgExpr {
    Positional(ValueExpr),
    Named { name: String, value: ValueExpr },
}

impl ArgExpr {
    pub fn value(&self) -> &ValueExpr {
        match self {
            ArgExpr::Positional(value) => value,
            ArgExpr::Named { value, .. } => value,
        }
    }
}

/// Any expression that produces a value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    Literal(Value),
    Path(PathExpr),
    List(Vec<ValueExpr>),
    Map(Vec<(String, ValueExpr)>),
    Converter(Box<FunctionCall>),
    Math(Box<MathExpr>),
}

/// An arithmetic expression with the usual precedence.
#[derive(Debug, Clone, PartialEq)]
pub enum MathExpr {
    Primary(ValueExpr),
    Negate(Box<MathExpr>),
    Binary {
        left: Box<MathExpr>,
        op: MathOp,
        right: Box<MathExpr>,
    },
}

/// A guard expression. `And`/`Or` chains are homogeneous by construction:
/// the grammar rejects unparenthesized mixes.
#[derive(Debug, Clone, PartialEq)]
pub enum BoolExpr {
    Literal(bool),
    Comparison {
        left: ValueExpr,
        op: CompOp,
        right: ValueExpr,
    },
    Converter(Box<FunctionCall>),
    Path(PathExpr),
    Not(Box<BoolExpr>),
    And(Box<BoolExpr>, Box<BoolExpr>),
    Or(Box<BoolExpr>, Box<BoolExpr>),
}

/// A whole statement: one editor invocation plus an optional guard.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStatement {
    pub editor: FunctionCall,
    pub condition: Option<BoolExpr>,
}
