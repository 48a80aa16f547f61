//! Statement parsing and compilation.

use std::fmt;

use chumsky::Parser as _;

use crate::{ContextFamily, EvalError, FunctionLibrary, ParseError};

mod arena;
pub(crate) mod ast;
pub(crate) mod grammar;
mod eval;
pub(crate) mod ops;

use self::arena::{AstArena, BoolRef, CompiledStatement, Compiler};

/// Parses and compiles statements against one record shape.
///
/// The library is moved in at construction and sealed: the set of functions
/// and enums visible to statements cannot change once parsing has begun, so
/// two statements parsed by the same parser always agree on what a name
/// means.
pub struct Parser<F: ContextFamily> {
    library: FunctionLibrary<F>,
}

impl<F: ContextFamily> Parser<F> {
    /// Creates a parser over the given library.
    pub fn new(library: FunctionLibrary<F>) -> Self {
        Self { library }
    }

    /// The library this parser compiles against.
    pub fn library(&self) -> &FunctionLibrary<F> {
        &self.library
    }

    /// Parses and compiles one statement.
    pub fn parse_statement(&self, input: &str) -> Result<Statement<F>, ParseError> {
        let tokens = crate::lexer::tokenize(input)?;
        let (tokens, spans): (Vec<_>, Vec<_>) = tokens.into_iter().unzip();

        let parsed = grammar::statement_parser(self.library.enums())
            .parse(tokens.as_slice())
            .into_result()
            .map_err(|errors| syntax_error(input, &spans, errors))?;

        let mut arena = AstArena::new();
        let compiled = Compiler::new(&mut arena, &self.library, input).compile_statement(&parsed)?;

        Ok(Statement {
            text: input.to_string(),
            arena,
            compiled,
        })
    }

    /// Parses and compiles a batch of statements, in order. The first
    /// failure aborts the batch: a configuration with any invalid statement
    /// is rejected as a whole.
    pub fn parse_statements<S: AsRef<str>>(&self, inputs: &[S]) -> Result<Vec<Statement<F>>, ParseError> {
        inputs.iter().map(|input| self.parse_statement(input.as_ref())).collect()
    }

    /// Parses and compiles a standalone guard expression.
    pub fn parse_condition(&self, input: &str) -> Result<Condition<F>, ParseError> {
        let tokens = crate::lexer::tokenize(input)?;
        let (tokens, spans): (Vec<_>, Vec<_>) = tokens.into_iter().unzip();

        let parsed = grammar::condition_parser(self.library.enums())
            .parse(tokens.as_slice())
            .into_result()
            .map_err(|errors| syntax_error(input, &spans, errors))?;

        let mut arena = AstArena::new();
        let root = Compiler::new(&mut arena, &self.library, input).compile_condition(&parsed)?;

        Ok(Condition {
            text: input.to_string(),
            arena,
            root,
        })
    }
}

/// Maps chumsky's token-index spans back to byte positions in the input.
fn syntax_error(
    input: &str, spans: &[std::ops::Range<usize>],
    errors: Vec<chumsky::error::Rich<'_, crate::lexer::Token<'_>>>,
) -> ParseError {
    let detail = match errors.first() {
        Some(error) => {
            let token_index = error.span().start;
            let position = spans.get(token_index).map_or(input.len(), |span| span.start);
            format!("{} (at position {})", error.reason(), position)
        }
        None => "unparseable statement".to_string(),
    };
    ParseError::Syntax {
        detail,
        statement: input.to_string(),
    }
}

/// A compiled statement: immutable, shareable across threads, and bound to
/// one record shape.
pub struct Statement<F: ContextFamily> {
    text: String,
    arena: AstArena<F>,
    compiled: CompiledStatement,
}

impl<F: ContextFamily> Statement<F> {
    /// The statement as written.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Evaluates this statement against one record. Returns `true` if the
    /// guard passed and the editor ran, `false` if the guard rejected the
    /// record. Errors are scoped to this (statement, record) pair; the
    /// record may be partially modified if the editor failed mid-write.
    pub fn execute(&self, ctx: &mut F::Context<'_>) -> Result<bool, EvalError> {
        eval::eval_statement(&self.arena, &self.compiled, ctx)
    }
}

impl<F: ContextFamily> fmt::Debug for Statement<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement").field("text", &self.text).finish()
    }
}

/// A compiled standalone guard expression.
pub struct Condition<F: ContextFamily> {
    text: String,
    arena: AstArena<F>,
    root: BoolRef,
}

impl<F: ContextFamily> Condition<F> {
    /// The condition as written.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Evaluates this condition against one record.
    pub fn evaluate(&self, ctx: &mut F::Context<'_>) -> Result<bool, EvalError> {
        eval::eval_bool(&self.arena, self.root, ctx)
    }
}

impl<F: ContextFamily> fmt::Debug for Condition<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition").field("text", &self.text).finish()
    }
}
