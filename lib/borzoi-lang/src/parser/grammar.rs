//! Chumsky grammar for the statement language.
//!
//! The grammar is name-agnostic: it classifies calls as editors (lowercase)
//! or converters (uppercase) purely by case, and leaves function lookup,
//! arity and type checking to the compile step. Enum constants are the one
//! exception, since a bare uppercase identifier is only meaningful if the
//! library defines it.

use chumsky::prelude::*;

use super::ast::*;
use crate::lexer::Token;
use crate::{EnumMap, PathKey, Value};

/// The token-slice input the grammar runs over.
pub type TokenInput<'src> = &'src [Token<'src>];

/// Rich errors with token-index spans.
pub type ParserExtra<'src> = extra::Err<Rich<'src, Token<'src>>>;

/// Strips the quotes from a string literal and applies the two supported
/// escapes.
#[inline]
fn unescape(s: &str) -> String {
    s[1..s.len() - 1].replace("\\\"", "\"").replace("\\\\", "\\")
}

/// Decodes the hex digits of a `0x...` bytes literal, two digits per byte.
/// The lexer guarantees valid digits; a lone trailing digit is its own byte.
fn decode_hex(digits: &str) -> Vec<u8> {
    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| match std::str::from_utf8(pair) {
            Ok(pair) => u8::from_str_radix(pair, 16).unwrap_or(0),
            Err(_) => 0,
        })
        .collect()
}

fn literal_parser<'a>() -> impl Parser<'a, TokenInput<'a>, ValueExpr, ParserExtra<'a>> + Clone {
    let sign = just(&Token::Minus).or_not().map(|minus| minus.is_some());

    let int = select_ref! { Token::IntLiteral(s) => *s }.try_map(|s, span| {
        s.parse()
            .map(Value::Int)
            .map_err(|_| Rich::custom(span, format!("integer literal '{}' is out of range", s)))
    });
    let float = select_ref! { Token::FloatLiteral(s) => Value::Float(s.parse().unwrap_or(0.0)) };

    let number = sign.then(float.or(int));
    let number = number.map(|(negative, value)| match (negative, value) {
        (true, Value::Int(v)) => Value::Int(-v),
        (true, Value::Float(v)) => Value::Float(-v),
        (_, value) => value,
    });

    let unsigned = select_ref! {
        Token::StringLiteral(s) => Value::string(unescape(s)),
        Token::BytesLiteral(s) => Value::bytes(decode_hex(&s[2..])),
        Token::True => Value::Bool(true),
        Token::False => Value::Bool(false),
        Token::Nil => Value::Nil,
    };

    number.or(unsigned).map(ValueExpr::Literal)
}

/// Parses one key suffix: `["key"]` or `[0]`.
fn key_parser<'a>() -> impl Parser<'a, TokenInput<'a>, PathKey, ParserExtra<'a>> + Clone {
    let index = select_ref! { Token::IntLiteral(s) => *s }.try_map(|s, span| {
        s.parse::<usize>()
            .map(PathKey::Int)
            .map_err(|_| Rich::custom(span, format!("index '{}' is out of range", s)))
    });

    choice((
        select_ref! { Token::StringLiteral(s) => PathKey::String(unescape(s)) },
        index,
    ))
    .delimited_by(just(&Token::LBracket), just(&Token::RBracket))
}

fn lower_ident<'a>() -> impl Parser<'a, TokenInput<'a>, String, ParserExtra<'a>> + Clone {
    select_ref! { Token::LowerIdent(s) => s.to_string() }
}

fn upper_ident<'a>() -> impl Parser<'a, TokenInput<'a>, String, ParserExtra<'a>> + Clone {
    select_ref! { Token::UpperIdent(s) => s.to_string() }
}

/// Parses a path: `lower_ident ('.' lower_ident)* key*`.
fn path_parser<'a>() -> impl Parser<'a, TokenInput<'a>, PathExpr, ParserExtra<'a>> + Clone {
    lower_ident()
        .then(
            just(&Token::Dot)
                .ignore_then(lower_ident())
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then(key_parser().repeated().collect::<Vec<_>>())
        .map(|((first, rest), keys)| {
            let mut segments = vec![first];
            segments.extend(rest);
            PathExpr { segments, keys }
        })
}

fn comp_op_parser<'a>() -> impl Parser<'a, TokenInput<'a>, CompOp, ParserExtra<'a>> + Clone {
    choice((
        just(&Token::EqEq).to(CompOp::Eq),
        just(&Token::BangEq).to(CompOp::NotEq),
        just(&Token::Lte).to(CompOp::Lte),
        just(&Token::Gte).to(CompOp::Gte),
        just(&Token::Lt).to(CompOp::Lt),
        just(&Token::Gt).to(CompOp::Gt),
    ))
}

fn arg_list_parser<'a>(
    arg_value: impl Parser<'a, TokenInput<'a>, ValueExpr, ParserExtra<'a>> + Clone + 'a,
) -> impl Parser<'a, TokenInput<'a>, Vec<ArgExpr>, ParserExtra<'a>> + Clone + 'a {
    // A `name =` prefix marks a named argument; anything else is positional.
    let name_prefix = lower_ident().then_ignore(just(&Token::Assign));

    let arg = choice((
        name_prefix.then(arg_value.clone()).map(|(name, value)| ArgExpr::Named { name, value }),
        arg_value.map(ArgExpr::Positional),
    ));

    arg.separated_by(just(&Token::Comma)).allow_trailing().collect::<Vec<_>>()
}

/// Unwraps trivial math wrappers so `set(name, "x")` compiles to a literal
/// argument, not a one-node math tree.
fn math_to_value_expr(math: MathExpr) -> ValueExpr {
    match math {
        MathExpr::Primary(v) => v,
        other => ValueExpr::Math(Box::new(other)),
    }
}

fn binary_node(left: MathExpr, (op, right): (MathOp, MathExpr)) -> MathExpr {
    MathExpr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn make_math_expr<'a>(
    value_expr: impl Parser<'a, TokenInput<'a>, ValueExpr, ParserExtra<'a>> + Clone + 'a,
) -> impl Parser<'a, TokenInput<'a>, MathExpr, ParserExtra<'a>> + Clone + 'a {
    recursive(move |math_expr| {
        let grouped = math_expr.clone().delimited_by(just(&Token::LParen), just(&Token::RParen));
        let primary = grouped.or(value_expr.clone().map(MathExpr::Primary));

        // A leading `+` is accepted and dropped; a leading `-` negates.
        let unary = choice((just(&Token::Plus).to(false), just(&Token::Minus).to(true)));
        let factor = unary.or_not().then(primary).map(|(negate, expr)| {
            if negate == Some(true) {
                MathExpr::Negate(Box::new(expr))
            } else {
                expr
            }
        });

        let mul_op = just(&Token::Star).to(MathOp::Mul).or(just(&Token::Slash).to(MathOp::Div));
        let product = factor.clone().foldl(mul_op.then(factor).repeated(), binary_node);

        let add_op = just(&Token::Plus).to(MathOp::Add).or(just(&Token::Minus).to(MathOp::Sub));
        product.clone().foldl(add_op.then(product).repeated(), binary_node)
    })
}

/// Builds the value-expression parser shared by arguments, comparisons and
/// nested calls.
fn make_value_expr<'a>(enums: &'a EnumMap) -> impl Parser<'a, TokenInput<'a>, ValueExpr, ParserExtra<'a>> + Clone + 'a {
    let enum_value = upper_ident().try_map(move |name, span| {
        if let Some(&val) = enums.get(&name) {
            Ok(ValueExpr::Literal(Value::Int(val)))
        } else {
            Err(Rich::custom(span, format!("unknown enum '{}'", name)))
        }
    });

    recursive(|value_expr| {
        let elements = value_expr.clone().separated_by(just(&Token::Comma)).allow_trailing();
        let list = elements
            .collect::<Vec<_>>()
            .delimited_by(just(&Token::LBracket), just(&Token::RBracket))
            .map(ValueExpr::List);

        // Map keys are string literals only; bare identifiers would collide
        // with paths.
        let map_key = select_ref! { Token::StringLiteral(s) => unescape(s) };
        let map = map_key
            .then_ignore(just(&Token::Colon))
            .then(value_expr.clone())
            .separated_by(just(&Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(&Token::LBrace), just(&Token::RBrace))
            .map(ValueExpr::Map);

        let arg_list = arg_list_parser(make_math_expr(value_expr.clone()).map(math_to_value_expr));
        let converter_call = upper_ident()
            .then(arg_list.delimited_by(just(&Token::LParen), just(&Token::RParen)))
            .then(key_parser().repeated().collect::<Vec<_>>())
            .map(|((name, args), keys)| {
                ValueExpr::Converter(Box::new(FunctionCall { name, args, keys }))
            });

        choice((
            converter_call,
            list,
            map,
            enum_value,
            path_parser().map(ValueExpr::Path),
            literal_parser(),
        ))
    })
}

/// Builds the guard parser. `and`/`or` chains are folded left-to-right, but
/// only when the whole chain uses one operator: a mix at the same nesting
/// level is ambiguous and rejected.
fn make_bool_expr<'a>(enums: &'a EnumMap) -> impl Parser<'a, TokenInput<'a>, BoolExpr, ParserExtra<'a>> + Clone + 'a {
    let value_expr = make_value_expr(enums);

    recursive(move |bool_expr| {
        let comparison_value = make_math_expr(value_expr.clone()).map(math_to_value_expr);

        let comparison = comparison_value
            .clone()
            .then(comp_op_parser())
            .then(comparison_value)
            .map(|((left, op), right)| BoolExpr::Comparison { left, op, right });

        let bool_literal = select_ref! {
            Token::True => BoolExpr::Literal(true),
            Token::False => BoolExpr::Literal(false),
        };

        let bool_converter = value_expr.clone().try_map(|v, span| {
            if let ValueExpr::Converter(call) = v {
                Ok(BoolExpr::Converter(call))
            } else {
                Err(Rich::custom(span, "expected a converter call"))
            }
        });

        let bool_path = path_parser().map(BoolExpr::Path);

        let bool_primary = choice((
            bool_expr
                .clone()
                .delimited_by(just(&Token::LParen), just(&Token::RParen)),
            comparison,
            bool_literal,
            bool_converter,
            bool_path,
        ));

        let bool_factor = just(&Token::Not).or_not().then(bool_primary).map(|(not, expr)| {
            if not.is_some() {
                BoolExpr::Not(Box::new(expr))
            } else {
                expr
            }
        });

        #[derive(Clone, Copy, PartialEq)]
        enum Join {
            And,
            Or,
        }

        let join_op = choice((just(&Token::And).to(Join::And), just(&Token::Or).to(Join::Or)));

        bool_factor
            .clone()
            .then(join_op.then(bool_factor).repeated().collect::<Vec<_>>())
            .try_map(|(first, rest), span| {
                if rest.iter().any(|(op, _)| *op == Join::And) && rest.iter().any(|(op, _)| *op == Join::Or) {
                    return Err(Rich::custom(
                        span,
                        "ambiguous boolean expression: parenthesize when mixing 'and' and 'or'",
                    ));
                }
                Ok(rest.into_iter().fold(first, |left, (op, right)| match op {
                    Join::And => BoolExpr::And(Box::new(left), Box::new(right)),
                    Join::Or => BoolExpr::Or(Box::new(left), Box::new(right)),
                }))
            })
    })
}

/// Builds the full statement parser: `editor '(' args ')' ['where' guard]`.
pub fn statement_parser<'a>(
    enums: &'a EnumMap,
) -> impl Parser<'a, TokenInput<'a>, ParsedStatement, ParserExtra<'a>> + 'a {
    let value_expr = make_value_expr(enums);
    let arg_value = make_math_expr(value_expr).map(math_to_value_expr);
    let arg_list = arg_list_parser(arg_value);

    let editor_call = lower_ident()
        .then(arg_list.delimited_by(just(&Token::LParen), just(&Token::RParen)))
        .map(|(name, args)| FunctionCall {
            name,
            args,
            keys: Vec::new(),
        });

    let where_clause = just(&Token::Where).ignore_then(make_bool_expr(enums));

    editor_call
        .then(where_clause.or_not())
        .map(|(editor, condition)| ParsedStatement { editor, condition })
        .then_ignore(end())
}

/// Builds a standalone guard parser, for hosts that evaluate conditions
/// without an edit (e.g. sampling or routing decisions).
pub fn condition_parser<'a>(enums: &'a EnumMap) -> impl Parser<'a, TokenInput<'a>, BoolExpr, ParserExtra<'a>> + 'a {
    make_bool_expr(enums).then_ignore(end())
}
