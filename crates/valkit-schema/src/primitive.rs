//! Scalar leaves, literals and enums.

use std::sync::Arc;

use valkit_issue::IssueKind;
use valkit_value::{BigInt, BoolCoercion, DateTime, Utc, Value};

use crate::engine::{type_error, ParseCtx, Payload};
use crate::error::{Result, SchemaError};
use crate::output::Output;
use crate::schema::{Def, Internals, Schema, TypeCode};

pub(crate) fn check_string(schema: &Internals, input: Value, ctx: &ParseCtx<'_>) -> Payload {
    match input {
        Value::String(_) => Payload::ok(input),
        other => type_error(schema, other, ctx),
    }
}

pub(crate) fn check_bool(schema: &Internals, input: Value, ctx: &ParseCtx<'_>) -> Payload {
    match input {
        Value::Bool(_) => Payload::ok(input),
        other => type_error(schema, other, ctx),
    }
}

pub(crate) fn check_bigint(schema: &Internals, input: Value, ctx: &ParseCtx<'_>) -> Payload {
    match input {
        Value::BigInt(_) => Payload::ok(input),
        other => type_error(schema, other, ctx),
    }
}

pub(crate) fn check_date(schema: &Internals, input: Value, ctx: &ParseCtx<'_>) -> Payload {
    match input {
        Value::Time(_) => Payload::ok(input),
        other => type_error(schema, other, ctx),
    }
}

pub(crate) fn check_nil(schema: &Internals, input: Value, ctx: &ParseCtx<'_>) -> Payload {
    match input {
        Value::Nil => Payload::ok(input),
        other => type_error(schema, other, ctx),
    }
}

/// Literal and enum membership.
pub(crate) fn check_options(
    schema: &Internals,
    values: &[Value],
    input: Value,
    ctx: &ParseCtx<'_>,
) -> Payload {
    if let Some(matched) = values.iter().find(|v| v.equivalent(&input)) {
        return Payload::ok(matched.clone());
    }
    let kind = IssueKind::InvalidValue {
        values: values.to_vec(),
    };
    let issue = ctx.issue(schema, kind, &input);
    Payload::fail(input, issue)
}

pub fn string() -> Schema<String> {
    Schema::new(TypeCode::String, Def::String)
}

pub fn boolean() -> Schema<bool> {
    Schema::new(TypeCode::Bool, Def::Bool(Arc::new(BoolCoercion::default())))
}

pub fn bigint() -> Schema<BigInt> {
    Schema::new(TypeCode::BigInt, Def::BigInt)
}

pub fn date() -> Schema<DateTime<Utc>> {
    Schema::new(TypeCode::Date, Def::Date)
}

/// Accepts only nil.
pub fn nil() -> Schema {
    Schema::new(TypeCode::Nil, Def::Nil)
}

/// Rejects everything.
pub fn never() -> Schema {
    Schema::new(TypeCode::Never, Def::Never)
}

pub fn any() -> Schema {
    Schema::new(TypeCode::Any, Def::Any)
}

pub fn unknown() -> Schema {
    Schema::new(TypeCode::Unknown, Def::Unknown)
}

fn options_schema<T>(code: TypeCode, values: Vec<Value>) -> Schema<T> {
    let mut internals = Internals::new(
        code,
        match code {
            TypeCode::Enum => Def::Enum(values.clone()),
            _ => Def::Literal(values.clone()),
        },
    );
    internals.bag.insert("values".into(), Value::Array(values));
    Schema::from_internals(internals)
}

/// Types usable as literal values; `&str` literals produce `String`.
pub trait IntoLiteral {
    type Output: Output;

    fn into_literal(self) -> Value;
}

macro_rules! into_literal {
    ($($t:ty),* $(,)?) => {
        $(impl IntoLiteral for $t {
            type Output = $t;

            fn into_literal(self) -> Value {
                self.into()
            }
        })*
    };
}

into_literal!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String, BigInt, Value);

impl IntoLiteral for &str {
    type Output = String;

    fn into_literal(self) -> Value {
        Value::from(self)
    }
}

/// Accepts exactly `value`.
pub fn literal<V: IntoLiteral>(value: V) -> Schema<V::Output> {
    options_schema(TypeCode::Literal, vec![value.into_literal()])
}

/// Accepts any of `values`.
pub fn literals<V: IntoLiteral>(values: impl IntoIterator<Item = V>) -> Schema<V::Output> {
    options_schema(
        TypeCode::Literal,
        values.into_iter().map(IntoLiteral::into_literal).collect(),
    )
}

/// A string enum over `values`, in declaration order.
pub fn enumeration<I, S>(values: I) -> Schema<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    options_schema(
        TypeCode::Enum,
        values
            .into_iter()
            .map(|s| Value::String(s.into()))
            .collect(),
    )
}

impl<T> Schema<T> {
    /// The accepted values of a literal or enum schema.
    pub fn values(&self) -> Option<&[Value]> {
        match &self.inner.def {
            Def::Literal(values) | Def::Enum(values) => Some(values),
            _ => None,
        }
    }
}

impl Schema<String> {
    fn enum_values(&self) -> Result<&[Value]> {
        match &self.inner.def {
            Def::Enum(values) => Ok(values),
            _ => Err(SchemaError::NotAnEnum(self.inner.code.as_str())),
        }
    }

    fn select(&self, keys: &[&str], keep: bool) -> Result<Schema<String>> {
        let values = self.enum_values()?;
        if let Some(missing) = keys
            .iter()
            .find(|k| !values.iter().any(|v| v.as_str() == Some(**k)))
        {
            return Err(SchemaError::UnknownValue((*missing).to_owned()));
        }
        let selected = values
            .iter()
            .filter(|v| v.as_str().is_some_and(|s| keys.contains(&s)) == keep)
            .filter_map(|v| v.as_str().map(str::to_owned));
        Ok(enumeration(selected))
    }

    /// A new enum with only `keys`, which must all be options of this one.
    pub fn extract(&self, keys: &[&str]) -> Result<Schema<String>> {
        self.select(keys, true)
    }

    /// A new enum without `keys`, which must all be options of this one.
    pub fn exclude(&self, keys: &[&str]) -> Result<Schema<String>> {
        self.select(keys, false)
    }
}
