//! Tests for the lexer, grammar, compile checks and evaluator.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::lexer::{tokenize, Token};
use crate::{
    ArgSpec, CallbackFn, ContextFamily, EvalError, FunctionLibrary, FunctionSpec, ParseError, Parser,
    PathError, PathKey, Value, ValueKind,
};

// ============================================================================
// Test record shape
// ============================================================================

/// A minimal record for exercising the language without any telemetry
/// dependency.
struct Record {
    name: String,
    version: i64,
    attributes: IndexMap<String, Value>,
}

fn record() -> Record {
    Record {
        name: "checkout cart".to_string(),
        version: 3,
        attributes: IndexMap::new(),
    }
}

#[derive(Clone, Copy, Debug)]
enum RecordPath {
    Name,
    Version,
    Attributes,
}

struct RecordFamily;

impl ContextFamily for RecordFamily {
    type Path = RecordPath;
    type Context<'a> = &'a mut Record;

    fn context_name() -> &'static str {
        "record"
    }

    fn resolve_path(segments: &[String]) -> Result<Self::Path, PathError> {
        match segments {
            [s] if s == "name" => Ok(RecordPath::Name),
            [s] if s == "version" => Ok(RecordPath::Version),
            [s] if s == "attributes" => Ok(RecordPath::Attributes),
            _ => Err(PathError::UnknownPath {
                context: Self::context_name(),
                path: segments.join("."),
            }),
        }
    }

    fn get(ctx: &Self::Context<'_>, path: &Self::Path, keys: &[PathKey]) -> Result<Value, EvalError> {
        let mut value = match path {
            RecordPath::Name => Value::string(ctx.name.clone()),
            RecordPath::Version => Value::Int(ctx.version),
            RecordPath::Attributes => Value::Map(ctx.attributes.clone()),
        };
        for key in keys {
            value = match (value, key) {
                (Value::Map(mut map), PathKey::String(k)) => map.swap_remove(k).unwrap_or(Value::Nil),
                (Value::List(mut list), PathKey::Int(i)) if *i < list.len() => list.swap_remove(*i),
                _ => Value::Nil,
            };
        }
        Ok(value)
    }

    fn set(ctx: &mut Self::Context<'_>, path: &Self::Path, keys: &[PathKey], value: Value) -> Result<(), EvalError> {
        match path {
            RecordPath::Name => match value {
                Value::String(s) => {
                    ctx.name = s;
                    Ok(())
                }
                other => Err(EvalError::InvalidAssignment {
                    path: "name".to_string(),
                    actual: other.kind(),
                }),
            },
            RecordPath::Version => Err(EvalError::ReadOnlyPath {
                path: "version".to_string(),
            }),
            RecordPath::Attributes => match keys.first() {
                Some(PathKey::String(key)) => {
                    ctx.attributes.insert(key.clone(), value);
                    Ok(())
                }
                _ => match value {
                    Value::Map(map) => {
                        ctx.attributes = map;
                        Ok(())
                    }
                    other => Err(EvalError::InvalidAssignment {
                        path: "attributes".to_string(),
                        actual: other.kind(),
                    }),
                },
            },
        }
    }
}

fn library() -> FunctionLibrary<RecordFamily> {
    let mut library = FunctionLibrary::new();

    let set: CallbackFn<RecordFamily> = Arc::new(|args| {
        let value = args.get(1)?;
        if value.is_nil() {
            return Ok(Value::Nil);
        }
        args.set(0, value)?;
        Ok(Value::Nil)
    });
    library.register_editor("set", FunctionSpec::new(2, 2, &[ArgSpec::Path, ArgSpec::Any], set));

    let len: CallbackFn<RecordFamily> = Arc::new(|args| {
        let len = match args.get(0)? {
            Value::String(s) => s.len(),
            Value::Bytes(b) => b.len(),
            Value::List(l) => l.len(),
            Value::Map(m) => m.len(),
            other => {
                return Err(EvalError::ArgumentType {
                    function: "Len".to_string(),
                    index: 0,
                    expected: "string, bytes, list or map",
                    actual: other.kind(),
                })
            }
        };
        Ok(Value::Int(len as i64))
    });
    library.register_converter(
        "Len",
        FunctionSpec::new(
            1,
            1,
            &[ArgSpec::OneOf(&[
                ValueKind::String,
                ValueKind::Bytes,
                ValueKind::List,
                ValueKind::Map,
            ])],
            len,
        ),
    );

    let words: CallbackFn<RecordFamily> = Arc::new(|args| match args.get(0)? {
        Value::String(s) => Ok(Value::List(s.split_whitespace().map(Value::string).collect())),
        other => Err(EvalError::ArgumentType {
            function: "Words".to_string(),
            index: 0,
            expected: "string",
            actual: other.kind(),
        }),
    });
    library.register_converter("Words", FunctionSpec::new(1, 1, &[ArgSpec::Any], words));

    let is_tagged: CallbackFn<RecordFamily> = Arc::new(|args| Ok(Value::Bool(!args.get(0)?.is_nil())));
    library.register_converter("IsTagged", FunctionSpec::new(1, 1, &[ArgSpec::Any], is_tagged));

    library.register_enum("SEVERITY_ERROR", 17);

    library
}

fn parser() -> Parser<RecordFamily> {
    Parser::new(library())
}

fn attr(record: &Record, key: &str) -> Value {
    record.attributes.get(key).cloned().unwrap_or(Value::Nil)
}

// ============================================================================
// Lexer tests
// ============================================================================

fn collect_tokens(input: &str) -> Vec<Token<'_>> {
    tokenize(input)
        .expect("lexer error")
        .into_iter()
        .map(|(token, _span)| token)
        .collect()
}

#[test]
fn test_keywords_and_operators() {
    let tokens = collect_tokens("where and or not == != <= >= < >");
    assert_eq!(
        tokens,
        vec![
            Token::Where,
            Token::And,
            Token::Or,
            Token::Not,
            Token::EqEq,
            Token::BangEq,
            Token::Lte,
            Token::Gte,
            Token::Lt,
            Token::Gt,
        ]
    );
}

#[test]
fn test_string_literal_keeps_quotes() {
    let tokens = collect_tokens(r#""hello \"world\"""#);
    assert_eq!(tokens, vec![Token::StringLiteral(r#""hello \"world\"""#)]);
}

#[test]
fn test_bytes_literal() {
    let tokens = collect_tokens("0xC0FFEE");
    assert_eq!(tokens, vec![Token::BytesLiteral("0xC0FFEE")]);
}

#[test]
fn test_identifier_case_split() {
    let tokens = collect_tokens("set Concat span_id SPAN_KIND_SERVER");
    assert_eq!(
        tokens,
        vec![
            Token::LowerIdent("set"),
            Token::UpperIdent("Concat"),
            Token::LowerIdent("span_id"),
            Token::UpperIdent("SPAN_KIND_SERVER"),
        ]
    );
}

#[test]
fn test_invalid_token_reports_position() {
    let err = tokenize("set(name, @)").unwrap_err();
    match err {
        ParseError::InvalidToken { token, position, .. } => {
            assert_eq!(token, "@");
            assert_eq!(position, 10);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_tokens_display_as_written() {
    // Syntax errors quote tokens back to the user, so Display must round-trip
    // the surface form.
    for input in ["where", "and", "==", "!=", "<=", "(", ",", "set", "Concat", "0xFF", "1.5", "42", r#""hi""#] {
        let tokens = collect_tokens(input);
        assert_eq!(tokens[0].to_string(), input, "input: {input}");
    }
}

// ============================================================================
// Statement execution
// ============================================================================

#[test]
fn test_set_literal() {
    let statement = parser().parse_statement(r#"set(name, "payments")"#).unwrap();
    let mut record = record();
    let ran = statement.execute(&mut (&mut record)).unwrap();
    assert!(ran);
    assert_eq!(record.name, "payments");
}

#[test]
fn test_set_map_key() {
    let statement = parser().parse_statement(r#"set(attributes["env"], "prod")"#).unwrap();
    let mut record = record();
    statement.execute(&mut (&mut record)).unwrap();
    assert_eq!(attr(&record, "env"), Value::string("prod"));
}

#[test]
fn test_guard_passes_and_rejects() {
    let statement = parser()
        .parse_statement(r#"set(attributes["env"], "prod") where name == "checkout cart""#)
        .unwrap();

    let mut matching = record();
    assert!(statement.execute(&mut (&mut matching)).unwrap());
    assert_eq!(attr(&matching, "env"), Value::string("prod"));

    let mut other = record();
    other.name = "inventory".to_string();
    assert!(!statement.execute(&mut (&mut other)).unwrap());
    assert_eq!(attr(&other, "env"), Value::Nil);
}

#[test]
fn test_absent_value_comparison_is_false() {
    let statement = parser()
        .parse_statement(r#"set(name, "x") where attributes["missing"] == "y""#)
        .unwrap();
    let mut record = record();
    assert!(!statement.execute(&mut (&mut record)).unwrap());
    assert_eq!(record.name, "checkout cart");
}

#[test]
fn test_absent_value_not_equal_is_true() {
    let condition = parser().parse_condition(r#"attributes["missing"] != "y""#).unwrap();
    let mut record = record();
    assert!(condition.evaluate(&mut (&mut record)).unwrap());
}

#[test]
fn test_nil_guard_path_is_false() {
    let statement = parser()
        .parse_statement(r#"set(name, "x") where attributes["flag"]"#)
        .unwrap();
    let mut record = record();
    assert!(!statement.execute(&mut (&mut record)).unwrap());
}

#[test]
fn test_set_nil_is_noop() {
    let statement = parser().parse_statement(r#"set(name, attributes["missing"])"#).unwrap();
    let mut record = record();
    assert!(statement.execute(&mut (&mut record)).unwrap());
    assert_eq!(record.name, "checkout cart");
}

#[test]
fn test_set_is_idempotent() {
    let statement = parser().parse_statement(r#"set(attributes["n"], 1)"#).unwrap();
    let mut record = record();
    statement.execute(&mut (&mut record)).unwrap();
    statement.execute(&mut (&mut record)).unwrap();
    assert_eq!(attr(&record, "n"), Value::Int(1));
    assert_eq!(record.attributes.len(), 1);
}

#[test]
fn test_read_only_path_errors_at_evaluation() {
    let statement = parser().parse_statement("set(version, 9)").unwrap();
    let mut record = record();
    let err = statement.execute(&mut (&mut record)).unwrap_err();
    assert!(matches!(err, EvalError::ReadOnlyPath { .. }));
    assert_eq!(record.version, 3);
}

#[test]
fn test_math_expression() {
    let statement = parser().parse_statement(r#"set(attributes["n"], 1 + 2 * 3)"#).unwrap();
    let mut record = record();
    statement.execute(&mut (&mut record)).unwrap();
    assert_eq!(attr(&record, "n"), Value::Int(7));
}

#[test]
fn test_math_with_path_operand() {
    let statement = parser().parse_statement(r#"set(attributes["n"], version * 2)"#).unwrap();
    let mut record = record();
    statement.execute(&mut (&mut record)).unwrap();
    assert_eq!(attr(&record, "n"), Value::Int(6));
}

#[test]
fn test_division_by_zero_is_a_runtime_error() {
    // The fold step defers erroring operations to evaluation.
    let statement = parser().parse_statement(r#"set(attributes["n"], 1 / 0)"#).unwrap();
    let mut record = record();
    let err = statement.execute(&mut (&mut record)).unwrap_err();
    assert!(matches!(err, EvalError::Arithmetic { .. }));
}

#[test]
fn test_converter_result_indexing() {
    let statement = parser()
        .parse_statement(r#"set(attributes["first"], Words(name)[0])"#)
        .unwrap();
    let mut record = record();
    statement.execute(&mut (&mut record)).unwrap();
    assert_eq!(attr(&record, "first"), Value::string("checkout"));
}

#[test]
fn test_converter_result_index_out_of_range_is_nil() {
    let statement = parser()
        .parse_statement(r#"set(attributes["missing"], Words(name)[9])"#)
        .unwrap();
    let mut record = record();
    statement.execute(&mut (&mut record)).unwrap();
    // Nil assignment is a no-op, so the key never appears.
    assert_eq!(attr(&record, "missing"), Value::Nil);
    assert!(record.attributes.is_empty());
}

#[test]
fn test_converter_in_guard() {
    let statement = parser()
        .parse_statement(r#"set(attributes["sized"], true) where Len(name) > 5"#)
        .unwrap();
    let mut record = record();
    assert!(statement.execute(&mut (&mut record)).unwrap());
}

#[test]
fn test_bool_converter_guard() {
    let condition = parser().parse_condition(r#"IsTagged(attributes["env"])"#).unwrap();
    let mut record = record();
    assert!(!condition.evaluate(&mut (&mut record)).unwrap());
    record.attributes.insert("env".to_string(), Value::string("prod"));
    assert!(condition.evaluate(&mut (&mut record)).unwrap());
}

#[test]
fn test_enum_constant() {
    let statement = parser()
        .parse_statement(r#"set(attributes["severity"], SEVERITY_ERROR)"#)
        .unwrap();
    let mut record = record();
    statement.execute(&mut (&mut record)).unwrap();
    assert_eq!(attr(&record, "severity"), Value::Int(17));
}

#[test]
fn test_list_and_map_literals() {
    let statement = parser()
        .parse_statement(r#"set(attributes["meta"], {"tags": ["a", "b"], "level": 2})"#)
        .unwrap();
    let mut record = record();
    statement.execute(&mut (&mut record)).unwrap();
    match attr(&record, "meta") {
        Value::Map(map) => {
            assert_eq!(map.get("level"), Some(&Value::Int(2)));
            assert_eq!(
                map.get("tags"),
                Some(&Value::List(vec![Value::string("a"), Value::string("b")]))
            );
        }
        other => panic!("expected map, got {other:?}"),
    }
}

// ============================================================================
// Boolean logic
// ============================================================================

#[test]
fn test_homogeneous_and_chain() {
    let condition = parser().parse_condition(r#"version == 3 and name != "" and true"#).unwrap();
    let mut record = record();
    assert!(condition.evaluate(&mut (&mut record)).unwrap());
}

#[test]
fn test_mixed_and_or_is_rejected() {
    let err = parser().parse_condition("true and false or true").unwrap_err();
    match err {
        ParseError::Syntax { detail, .. } => assert!(detail.contains("ambiguous"), "got: {detail}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_parenthesized_mix_is_accepted() {
    let condition = parser().parse_condition("true and (false or true)").unwrap();
    let mut record = record();
    assert!(condition.evaluate(&mut (&mut record)).unwrap());
}

#[test]
fn test_not() {
    let condition = parser().parse_condition("not (version == 3)").unwrap();
    let mut record = record();
    assert!(!condition.evaluate(&mut (&mut record)).unwrap());
}

#[test]
fn test_or_short_circuits_before_error() {
    // The right side would error on a non-bool guard value, but the left
    // side already decides.
    let condition = parser().parse_condition("version == 3 or Len(version) > 0").unwrap();
    let mut record = record();
    assert!(condition.evaluate(&mut (&mut record)).unwrap());
}

#[test]
fn test_cross_tag_ordering_is_false() {
    let condition = parser().parse_condition(r#"name > 5"#).unwrap();
    let mut record = record();
    assert!(!condition.evaluate(&mut (&mut record)).unwrap());
}

#[test]
fn test_int_float_comparison_coerces() {
    let condition = parser().parse_condition("version == 3.0").unwrap();
    let mut record = record();
    assert!(condition.evaluate(&mut (&mut record)).unwrap());
}

// ============================================================================
// Compile-time rejection
// ============================================================================

#[test]
fn test_undefined_editor() {
    let err = parser().parse_statement(r#"drop(name)"#).unwrap_err();
    match err {
        ParseError::UndefinedFunction { name, statement } => {
            assert_eq!(name, "drop");
            assert_eq!(statement, "drop(name)");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_undefined_converter() {
    let err = parser().parse_statement(r#"set(name, Reverse(name))"#).unwrap_err();
    match err {
        ParseError::UndefinedFunction { name, .. } => assert_eq!(name, "Reverse"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_wrong_argument_count() {
    let err = parser().parse_statement(r#"set(name)"#).unwrap_err();
    match err {
        ParseError::WrongArgumentCount { function, min, max, actual, .. } => {
            assert_eq!(function, "set");
            assert_eq!((min, max, actual), (2, 2, 1));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_literal_argument_type_check() {
    let err = parser().parse_statement(r#"set(name, Len(true))"#).unwrap_err();
    match err {
        ParseError::LiteralArgumentType { function, index, actual, .. } => {
            assert_eq!(function, "Len");
            assert_eq!(index, 0);
            assert_eq!(actual, ValueKind::Bool);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_path_argument_required() {
    let err = parser().parse_statement(r#"set("name", 1)"#).unwrap_err();
    assert!(matches!(err, ParseError::PathArgument { index: 0, .. }));
}

#[test]
fn test_unknown_path_is_rejected() {
    let err = parser().parse_statement(r#"set(bogus, 1)"#).unwrap_err();
    match err {
        ParseError::InvalidPath { source, .. } => {
            let PathError::UnknownPath { path, context } = source;
            assert_eq!(path, "bogus");
            assert_eq!(context, "record");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_overflowing_int_literal_is_rejected() {
    // One past i64::MAX.
    let err = parser()
        .parse_statement(r#"set(attributes["n"], 9223372036854775808)"#)
        .unwrap_err();
    match err {
        ParseError::Syntax { detail, .. } => assert!(detail.contains("out of range"), "got: {detail}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_overflowing_index_is_rejected() {
    let err = parser()
        .parse_statement(r#"set(name, attributes["tags"][99999999999999999999])"#)
        .unwrap_err();
    assert!(matches!(err, ParseError::Syntax { .. }));
}

#[test]
fn test_unknown_enum_is_rejected() {
    let err = parser().parse_statement(r#"set(attributes["k"], NO_SUCH_ENUM)"#).unwrap_err();
    assert!(matches!(err, ParseError::Syntax { .. }));
}

#[test]
fn test_editor_not_callable_in_guard() {
    // A lowercase call is not part of the guard grammar at all.
    let err = parser().parse_statement(r#"set(name, "x") where set(name, "y")"#).unwrap_err();
    assert!(matches!(err, ParseError::Syntax { .. }));
}

#[test]
fn test_batch_parse_aborts_on_first_failure() {
    let parser = parser();
    let err = parser
        .parse_statements(&[r#"set(name, "a")"#, "drop(name)", r#"set(name, "b")"#])
        .unwrap_err();
    assert!(matches!(err, ParseError::UndefinedFunction { .. }));
}

// ============================================================================
// Sharing
// ============================================================================

#[test]
fn test_statements_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<crate::Statement<RecordFamily>>();
    assert_send_sync::<crate::Condition<RecordFamily>>();
}

#[test]
fn test_function_specs_clone_without_cloning_the_family() {
    // RecordFamily is a plain unit struct, so cloning a spec must not
    // require the family type itself to be Clone.
    let noop: CallbackFn<RecordFamily> = Arc::new(|_| Ok(Value::Nil));
    let spec = FunctionSpec::new(1, 2, &[ArgSpec::Any], noop);
    let copy = spec.clone();
    assert_eq!((copy.min_args(), copy.max_args()), (1, 2));
}

#[test]
fn test_reparsing_a_statement_is_equivalent() {
    let parser = parser();
    let input = r#"set(attributes["env"], "prod") where version == 3"#;
    let first = parser.parse_statement(input).unwrap();
    let second = parser.parse_statement(input).unwrap();

    let mut a = record();
    let mut b = record();
    assert_eq!(
        first.execute(&mut (&mut a)).unwrap(),
        second.execute(&mut (&mut b)).unwrap()
    );
    assert_eq!(a.name, b.name);
    assert_eq!(a.attributes, b.attributes);
    assert_eq!(attr(&a, "env"), Value::string("prod"));
}

#[test]
fn test_concurrent_execution_is_deterministic() {
    let statement =
        std::sync::Arc::new(parser().parse_statement(r#"set(attributes["env"], "prod")"#).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let statement = Arc::clone(&statement);
            std::thread::spawn(move || {
                let mut record = record();
                statement.execute(&mut (&mut record)).unwrap();
                attr(&record, "env")
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Value::string("prod"));
    }
}
