//! Criterion benchmarks for statement parsing and evaluation.
//!
//! Run with: `cargo bench -p borzoi-lang`

use std::hint::black_box;
use std::sync::Arc;

use indexmap::IndexMap;

use borzoi_lang::{
    ArgSpec, CallbackFn, ContextFamily, EvalError, FunctionLibrary, FunctionSpec, Parser, PathError,
    PathKey, Value,
};
use criterion::{criterion_group, criterion_main, Criterion};

struct BenchRecord {
    name: String,
    status: i64,
    attributes: IndexMap<String, Value>,
}

impl BenchRecord {
    fn new() -> Self {
        Self {
            name: "checkout".to_string(),
            status: 200,
            attributes: IndexMap::new(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum BenchPath {
    Name,
    Status,
    Attributes,
}

struct BenchFamily;

impl ContextFamily for BenchFamily {
    type Path = BenchPath;
    type Context<'a> = &'a mut BenchRecord;

    fn context_name() -> &'static str {
        "bench"
    }

    fn resolve_path(segments: &[String]) -> Result<Self::Path, PathError> {
        match segments {
            [s] if s == "name" => Ok(BenchPath::Name),
            [s] if s == "status" => Ok(BenchPath::Status),
            [s] if s == "attributes" => Ok(BenchPath::Attributes),
            _ => Err(PathError::UnknownPath {
                context: Self::context_name(),
                path: segments.join("."),
            }),
        }
    }

    fn get(ctx: &Self::Context<'_>, path: &Self::Path, keys: &[PathKey]) -> Result<Value, EvalError> {
        let value = match path {
            BenchPath::Name => Value::string(ctx.name.clone()),
            BenchPath::Status => Value::Int(ctx.status),
            BenchPath::Attributes => match keys.first() {
                Some(PathKey::String(key)) => ctx.attributes.get(key).cloned().unwrap_or(Value::Nil),
                _ => Value::Map(ctx.attributes.clone()),
            },
        };
        Ok(value)
    }

    fn set(ctx: &mut Self::Context<'_>, path: &Self::Path, keys: &[PathKey], value: Value) -> Result<(), EvalError> {
        match path {
            BenchPath::Name => {
                if let Value::String(s) = value {
                    ctx.name = s;
                }
            }
            BenchPath::Status => {
                if let Value::Int(v) = value {
                    ctx.status = v;
                }
            }
            BenchPath::Attributes => {
                if let Some(PathKey::String(key)) = keys.first() {
                    ctx.attributes.insert(key.clone(), value);
                }
            }
        }
        Ok(())
    }
}

fn bench_parser() -> Parser<BenchFamily> {
    let mut library = FunctionLibrary::new();

    let set: CallbackFn<BenchFamily> = Arc::new(|args| {
        let value = args.get(1)?;
        if value.is_nil() {
            return Ok(Value::Nil);
        }
        args.set(0, value)?;
        Ok(Value::Nil)
    });
    library.register_editor("set", FunctionSpec::new(2, 2, &[ArgSpec::Path, ArgSpec::Any], set));

    Parser::new(library)
}

fn parse_simple(c: &mut Criterion) {
    let parser = bench_parser();
    c.bench_function("parse_simple_set", |b| {
        b.iter(|| parser.parse_statement(black_box(r#"set(attributes["env"], "prod")"#)).unwrap())
    });
}

fn parse_guarded(c: &mut Criterion) {
    let parser = bench_parser();
    c.bench_function("parse_guarded_set", |b| {
        b.iter(|| {
            parser
                .parse_statement(black_box(
                    r#"set(attributes["class"], "server_error") where status >= 500 and name != """#,
                ))
                .unwrap()
        })
    });
}

fn execute_guarded(c: &mut Criterion) {
    let parser = bench_parser();
    let statement = parser
        .parse_statement(r#"set(attributes["class"], "ok") where status == 200 and name == "checkout""#)
        .unwrap();

    c.bench_function("execute_guarded_set", |b| {
        b.iter(|| {
            let mut record = BenchRecord::new();
            statement.execute(black_box(&mut (&mut record))).unwrap()
        })
    });
}

criterion_group!(benches, parse_simple, parse_guarded, execute_guarded);
criterion_main!(benches);
