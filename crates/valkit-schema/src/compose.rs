//! Pipes, transforms, intersections and lazily built schemas.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};
use valkit_issue::{NewIssue, Path, PathSegment};
use valkit_value::{FromValue, Map, Value};

use crate::engine::{run, ParseCtx, Payload};
use crate::output::Output;
use crate::schema::{Def, Internals, IntoSchema, Schema, TypeCode};

pub(crate) type TransformFn = Arc<
    dyn Fn(Value, &mut TransformContext) -> std::result::Result<Value, TransformFailure>
        + Send
        + Sync,
>;

/// Side channel for issues raised inside a transform.
#[derive(Debug, Default)]
pub struct TransformContext {
    issues: Vec<NewIssue>,
}

impl TransformContext {
    /// Record an issue; any recorded issue fails the transform.
    pub fn issue(&mut self, issue: impl Into<NewIssue>) {
        self.issues.push(issue.into());
    }

    pub fn issues(&self) -> &[NewIssue] {
        &self.issues
    }
}

/// Why a transform did not produce a value.
#[derive(Debug, Clone)]
pub enum TransformFailure {
    /// Becomes a fatal `custom` issue with this message.
    Message(String),
    /// Reported as given.
    Issue(NewIssue),
}

impl From<String> for TransformFailure {
    fn from(message: String) -> Self {
        TransformFailure::Message(message)
    }
}

impl From<&str> for TransformFailure {
    fn from(message: &str) -> Self {
        TransformFailure::Message(message.to_owned())
    }
}

impl From<NewIssue> for TransformFailure {
    fn from(issue: NewIssue) -> Self {
        TransformFailure::Issue(issue)
    }
}

impl TransformFailure {
    fn into_issue(self) -> NewIssue {
        match self {
            TransformFailure::Message(message) => NewIssue::custom(message).fatal(),
            TransformFailure::Issue(issue) => issue,
        }
    }
}

pub(crate) struct LazyDef {
    init: Box<dyn Fn() -> Schema + Send + Sync>,
    cell: OnceCell<Schema>,
}

impl LazyDef {
    pub(crate) fn resolve(&self) -> &Schema {
        self.cell.get_or_init(|| {
            let schema = (self.init)();
            debug!(target_id = %schema.id(), code = %schema.type_code(), "resolved lazy schema");
            schema
        })
    }
}

/// Run `first`, then feed its output to `second`.
pub fn pipe<A, B>(first: Schema<A>, second: Schema<B>) -> Schema<B> {
    Schema::new(
        TypeCode::Pipe,
        Def::Pipe(first.into_schema(), second.into_schema()),
    )
}

fn transform_fn<T, U, E, F>(f: F) -> TransformFn
where
    T: FromValue,
    U: Into<Value>,
    E: Into<TransformFailure>,
    F: Fn(T, &mut TransformContext) -> std::result::Result<U, E> + Send + Sync + 'static,
{
    Arc::new(move |value: Value, ctx: &mut TransformContext| {
        let typed = T::from_value(value).ok_or_else(|| {
            TransformFailure::Message("transform received a value of the wrong type".to_owned())
        })?;
        f(typed, ctx).map(Into::into).map_err(Into::into)
    })
}

/// A schema that maps its input through `f`.
pub fn transform<T, U, E, F>(f: F) -> Schema<U>
where
    T: Output,
    U: Output,
    E: Into<TransformFailure>,
    F: Fn(T, &mut TransformContext) -> std::result::Result<U, E> + Send + Sync + 'static,
{
    Schema::new(TypeCode::Transform, Def::Transform(transform_fn(f)))
}

/// Build the schema on first use. `f` may refer back to the schema being
/// defined.
pub fn lazy<T, F>(f: F) -> Schema<T>
where
    F: Fn() -> Schema<T> + Send + Sync + 'static,
{
    Schema::new(
        TypeCode::Lazy,
        Def::Lazy(Arc::new(LazyDef {
            init: Box::new(move || f().into_schema()),
            cell: OnceCell::new(),
        })),
    )
}

/// Both schemas must accept the input; their outputs are merged.
pub fn intersection<A, B>(left: Schema<A>, right: Schema<B>) -> Schema {
    Schema::new(
        TypeCode::Intersection,
        Def::Intersection(left.into_schema(), right.into_schema()),
    )
}

pub(crate) fn check_pipe(
    first: &Schema,
    second: &Schema,
    input: Value,
    ctx: &mut ParseCtx<'_>,
) -> Payload {
    let payload = run(&first.inner, input, ctx);
    if !payload.is_ok() {
        return payload;
    }
    run(&second.inner, payload.value, ctx)
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

pub(crate) fn check_transform(
    schema: &Internals,
    f: &TransformFn,
    input: Value,
    ctx: &ParseCtx<'_>,
) -> Payload {
    let mut tctx = TransformContext::default();
    let result = catch_unwind(AssertUnwindSafe(|| f(input.clone(), &mut tctx)));
    let mut issues: Vec<_> = tctx
        .issues
        .into_iter()
        .map(|new| ctx.raise(schema, new, &input))
        .collect();
    let value = match result {
        Ok(Ok(value)) => value,
        Ok(Err(failure)) => {
            issues.push(ctx.raise(schema, failure.into_issue(), &input));
            input
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref()).to_owned();
            warn!(path = %ctx.path, %message, "transform panicked");
            let new = NewIssue::custom(format!("transform panicked: {message}")).fatal();
            issues.push(ctx.raise(schema, new, &input));
            input
        }
    };
    Payload { value, issues }
}

/// Merge two outputs; on conflict return the path where they differ.
fn merge(a: Value, b: Value, path: &mut Vec<PathSegment>) -> Result<Value, Path> {
    if a.equivalent(&b) {
        return Ok(a);
    }
    match (a, b) {
        (Value::Object(mut left), Value::Object(right)) => {
            for (key, value) in right {
                match left.get_mut(&key) {
                    Some(existing) => {
                        path.push(PathSegment::Key(key.clone()));
                        *existing = merge(std::mem::take(existing), value, path)?;
                        path.pop();
                    }
                    None => {
                        left.insert(key, value);
                    }
                }
            }
            Ok(Value::Object(left))
        }
        (Value::Array(left), Value::Array(right)) if left.len() == right.len() => {
            let mut out = Vec::with_capacity(left.len());
            for (i, (x, y)) in left.into_iter().zip(right).enumerate() {
                path.push(PathSegment::Index(i));
                out.push(merge(x, y, path)?);
                path.pop();
            }
            Ok(Value::Array(out))
        }
        _ => Err(Path::from(path.clone())),
    }
}

pub(crate) fn check_intersection(
    schema: &Internals,
    left: &Schema,
    right: &Schema,
    input: Value,
    ctx: &mut ParseCtx<'_>,
) -> Payload {
    let l = run(&left.inner, input.clone(), ctx);
    let r = run(&right.inner, input.clone(), ctx);
    if !l.is_ok() || !r.is_ok() {
        let mut issues = l.issues;
        issues.extend(r.issues);
        return Payload {
            value: input,
            issues,
        };
    }
    match merge(l.value, r.value, &mut Vec::new()) {
        Ok(value) => Payload::ok(value),
        Err(at) => {
            let mut params = Map::new();
            params.insert("intersection_conflict".into(), Value::String(at.to_string()));
            let new = NewIssue::custom("Unmergeable intersection")
                .params(params)
                .fatal();
            let issue = ctx.raise(schema, new, &input);
            Payload::fail(input, issue)
        }
    }
}

impl<T: Output> Schema<T> {
    /// Feed this schema's output into `next`.
    pub fn pipe<U>(&self, next: Schema<U>) -> Schema<U> {
        pipe(self.clone(), next)
    }

    /// Map the output through `f` after this schema accepts the input.
    pub fn transform<U, E, F>(&self, f: F) -> Schema<U>
    where
        U: Output,
        E: Into<TransformFailure>,
        F: Fn(T, &mut TransformContext) -> std::result::Result<U, E> + Send + Sync + 'static,
    {
        self.pipe(transform(f))
    }

    /// Intersection of this schema and `other`.
    pub fn and<U>(&self, other: Schema<U>) -> Schema {
        intersection(self.clone(), other)
    }
}

#[cfg(test)]
mod tests {
    use valkit_issue::{IssueCode, IssueKind};

    use super::*;
    use crate::number::int;
    use crate::object::{object, Shape};
    use crate::primitive::string;

    fn input(json: &str) -> Value {
        Value::from_json_str(json).unwrap()
    }

    fn parse_int() -> Schema<i64> {
        string()
            .transform(|s: String, _| s.trim().parse::<i64>().map_err(|e| e.to_string()))
            .pipe(int().min(1))
    }

    #[test]
    fn pipe_transform_pipeline() {
        assert_eq!(parse_int().parse("42").unwrap(), 42);
        let err = parse_int().parse("0").unwrap_err();
        assert_eq!(err.issues()[0].code(), IssueCode::TooSmall);
        let err = parse_int().parse("abc").unwrap_err();
        assert_eq!(err.issues()[0].code(), IssueCode::Custom);
        assert_eq!(err.issues()[0].message, "invalid digit found in string");
    }

    #[test]
    fn pipe_short_circuits() {
        let err = parse_int().parse(5).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].code(), IssueCode::InvalidType);
    }

    #[test]
    fn context_issues_fail_the_transform() {
        let s = string().transform(|s: String, ctx| {
            if s.is_empty() {
                ctx.issue(NewIssue::custom("empty").at("inner"));
            }
            Ok::<_, TransformFailure>(s.len() as i64)
        });
        let err = s.parse("").unwrap_err();
        assert_eq!(err.issues()[0].path.to_string(), "inner");
        assert_eq!(s.parse("abc").unwrap(), 3);
    }

    #[test]
    fn panics_become_custom_issues() {
        let s = string().transform(|_: String, _| -> Result<i64, TransformFailure> {
            panic!("boom")
        });
        let err = s.parse("x").unwrap_err();
        assert_eq!(err.issues()[0].code(), IssueCode::Custom);
        assert!(err.issues()[0].message.contains("boom"));
    }

    #[test]
    fn intersection_merges_objects() {
        let a = object(Shape::new().field("a", string())).passthrough();
        let b = object(Shape::new().field("b", int())).passthrough();
        let out = a.and(b).parse(input(r#"{"a":"x","b":1}"#)).unwrap();
        assert_eq!(out.get("a"), Some(&Value::from("x")));
        assert_eq!(out.get("b"), Some(&Value::Int(1)));
    }

    #[test]
    fn intersection_conflicts_are_reported_with_their_path() {
        let a = object(Shape::new().field("n", string().to_uppercase()));
        let b = object(Shape::new().field("n", string()));
        let err = a.and(b).parse(input(r#"{"n":"x"}"#)).unwrap_err();
        match &err.issues()[0].kind {
            IssueKind::Custom { params: Some(p) } => {
                assert_eq!(p["intersection_conflict"], Value::from("n"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn intersection_of_scalars_requires_equality() {
        assert_eq!(int().and(int().min(0)).parse(3).unwrap(), Value::Int(3));
        assert!(int().and(int().min(5)).parse(3).is_err());
    }
}
