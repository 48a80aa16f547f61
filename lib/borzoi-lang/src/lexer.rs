//! Tokens of the statement language.

use std::fmt;
use std::ops::Range;

use logos::Logos;

use crate::ParseError;

/// One token of a statement.
#[derive(Logos, Debug, PartialEq, Eq, Clone, Hash)]
#[logos(skip r"[ \t]+")]
pub enum Token<'a> {
    // Keywords.
    #[token("where")]
    Where,

    #[token("and")]
    And,

    #[token("or")]
    Or,

    #[token("not")]
    Not,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("nil")]
    Nil,

    // Comparison operators.
    #[token("==")]
    EqEq,

    #[token("!=")]
    BangEq,

    #[token("<=")]
    Lte,

    #[token(">=")]
    Gte,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    // Arithmetic operators.
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    // Delimiters.
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token(":")]
    Colon,

    #[token("=")]
    Assign,

    // Literals. Strings keep their quotes; unescaping happens in the
    // grammar. An unterminated string falls through to a lex error.
    #[regex(r#""[^"\\]*(?:\\.[^"\\]*)*""#, |lex| lex.slice())]
    StringLiteral(&'a str),

    /// Bytes literal, e.g. `0xC0FFEE`.
    #[regex(r"0x[0-9a-fA-F]+", |lex| lex.slice())]
    BytesLiteral(&'a str),

    #[regex(r"[0-9]+\.[0-9]*|\.[0-9]+", |lex| lex.slice())]
    FloatLiteral(&'a str),

    #[regex(r"[0-9]+", priority = 2, callback = |lex| lex.slice())]
    IntLiteral(&'a str),

    /// Uppercase identifier: a converter name or an enum constant.
    #[regex(r"[A-Z][a-zA-Z0-9_]*", |lex| lex.slice())]
    UpperIdent(&'a str),

    /// Lowercase identifier: an editor name, a path segment, or an argument
    /// name.
    #[regex(r"[a-z][a-zA-Z0-9_]*", priority = 1, callback = |lex| lex.slice())]
    LowerIdent(&'a str),
}

// Syntax errors quote tokens back to the user, so every token renders as it
// was written.
impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let surface = match self {
            Token::Where => "where",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::True => "true",
            Token::False => "false",
            Token::Nil => "nil",
            Token::EqEq => "==",
            Token::BangEq => "!=",
            Token::Lte => "<=",
            Token::Gte => ">=",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Colon => ":",
            Token::Assign => "=",
            Token::StringLiteral(s)
            | Token::BytesLiteral(s)
            | Token::FloatLiteral(s)
            | Token::IntLiteral(s)
            | Token::UpperIdent(s)
            | Token::LowerIdent(s) => s,
        };
        f.write_str(surface)
    }
}

/// Tokenizes one statement, keeping each token's byte range so later stages
/// can report positions. The first invalid slice aborts the whole statement.
pub(crate) fn tokenize(input: &str) -> Result<Vec<(Token<'_>, Range<usize>)>, ParseError> {
    let mut lexer = Token::lexer(input);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                let span = lexer.span();
                return Err(ParseError::InvalidToken {
                    token: input[span.clone()].to_string(),
                    position: span.start,
                    statement: input.to_string(),
                });
            }
        }
    }
    Ok(tokens)
}
