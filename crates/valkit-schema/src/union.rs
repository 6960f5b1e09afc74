//! Ordinary, discriminated and exclusive unions.

use tracing::trace;
use valkit_issue::{Issue, IssueKind, NewIssue};
use valkit_value::{Map, Value};

use crate::engine::{run, type_error, ParseCtx, Payload};
use crate::error::{Result, SchemaError};
use crate::schema::{Def, Internals, IntoSchema, Schema, TypeCode};

fn collect<I>(members: I) -> Vec<Schema>
where
    I: IntoIterator,
    I::Item: IntoSchema,
{
    members.into_iter().map(IntoSchema::into_schema).collect()
}

/// Accepts the output of the first member that accepts the input.
pub fn union<I>(members: I) -> Schema
where
    I: IntoIterator,
    I::Item: IntoSchema,
{
    Schema::new(TypeCode::Union, Def::Union(collect(members)))
}

/// Accepts the input only when exactly one member does.
pub fn xor<I>(members: I) -> Schema
where
    I: IntoIterator,
    I::Item: IntoSchema,
{
    Schema::new(TypeCode::Xor, Def::Xor(collect(members)))
}

pub(crate) struct DiscriminatedDef {
    pub(crate) key: String,
    pub(crate) members: Vec<Schema>,
    /// Discriminator value to member index, in declaration order.
    lookup: Vec<(Value, usize)>,
}

impl DiscriminatedDef {
    fn member_for(&self, value: &Value) -> Option<(usize, &Schema)> {
        self.lookup
            .iter()
            .find(|(v, _)| v.equivalent(value))
            .map(|(_, index)| (*index, &self.members[*index]))
    }
}

/// Discriminator values a member declares for `key`.
fn discriminator_values(member: &Schema, key: &str) -> Option<Vec<Value>> {
    match &member.inner.def {
        Def::Object(def) => field_values(def.shape.get(key)?),
        Def::Discriminated(def) if def.key == key => {
            Some(def.lookup.iter().map(|(v, _)| v.clone()).collect())
        }
        Def::Lazy(lazy) => discriminator_values(lazy.resolve(), key),
        _ => None,
    }
}

fn field_values(field: &Schema) -> Option<Vec<Value>> {
    match &field.inner.def {
        Def::Literal(values) | Def::Enum(values) => Some(values.clone()),
        Def::Union(members) => members.iter().try_fold(Vec::new(), |mut all, m| {
            all.extend(field_values(m)?);
            Some(all)
        }),
        _ => None,
    }
}

/// A union that dispatches on the value at `key`.
///
/// Every member must be an object declaring a literal or enum at `key` (or a
/// discriminated union on the same key); values may not overlap.
///
/// Lazy members are resolved here to read their discriminator values, so a
/// lazy member must not build this same discriminated union in its closure.
pub fn discriminated_union<I>(key: impl Into<String>, members: I) -> Result<Schema<Map>>
where
    I: IntoIterator,
    I::Item: IntoSchema,
{
    let key = key.into();
    let members = collect(members);
    let mut lookup: Vec<(Value, usize)> = Vec::new();
    for (index, member) in members.iter().enumerate() {
        let values = discriminator_values(member, &key).ok_or_else(|| {
            SchemaError::MissingDiscriminator {
                key: key.clone(),
                index,
            }
        })?;
        for value in values {
            if lookup.iter().any(|(v, _)| v.equivalent(&value)) {
                return Err(SchemaError::DuplicateDiscriminator {
                    key,
                    value: value.to_string(),
                });
            }
            lookup.push((value, index));
        }
    }
    let mut internals = Internals::new(
        TypeCode::Discriminated,
        Def::Discriminated(std::sync::Arc::new(DiscriminatedDef {
            key: key.clone(),
            members,
            lookup,
        })),
    );
    internals.bag.insert("discriminator".into(), Value::String(key));
    Ok(Schema::from_internals(internals))
}

fn invalid_union(errors: Vec<Vec<Issue>>, note: Option<&str>) -> IssueKind {
    IssueKind::InvalidUnion {
        errors,
        note: note.map(str::to_owned),
        discriminator: None,
    }
}

pub(crate) fn check_union(
    schema: &Internals,
    members: &[Schema],
    input: Value,
    ctx: &mut ParseCtx<'_>,
) -> Payload {
    let mut failures = Vec::with_capacity(members.len());
    for (index, member) in members.iter().enumerate() {
        let payload = run(&member.inner, input.clone(), ctx);
        if payload.is_ok() {
            trace!(member = index, path = %ctx.path, "union member accepted");
            return payload;
        }
        failures.push(payload);
    }

    let errors = failures
        .into_iter()
        .map(|p| ctx.relative(p.issues))
        .collect();
    let issue = ctx.issue(schema, invalid_union(errors, None), &input);
    Payload::fail(input, issue)
}

pub(crate) fn check_xor(
    schema: &Internals,
    members: &[Schema],
    input: Value,
    ctx: &mut ParseCtx<'_>,
) -> Payload {
    let mut accepted = Vec::new();
    let mut failures = Vec::new();
    for member in members {
        let payload = run(&member.inner, input.clone(), ctx);
        if payload.is_ok() {
            accepted.push(payload);
        } else {
            failures.push(ctx.relative(payload.issues));
        }
    }
    trace!(matched = accepted.len(), path = %ctx.path, "xor evaluated");
    match accepted.len() {
        1 => accepted.swap_remove(0),
        0 => {
            let issue = ctx.issue(schema, invalid_union(failures, None), &input);
            Payload::fail(input, issue)
        }
        _ => {
            let kind = invalid_union(Vec::new(), Some("Multiple options matched"));
            let issue = ctx.issue(schema, kind, &input);
            Payload::fail(input, issue)
        }
    }
}

pub(crate) fn check_discriminated(
    schema: &Internals,
    def: &DiscriminatedDef,
    input: Value,
    ctx: &mut ParseCtx<'_>,
) -> Payload {
    let map = match input {
        Value::Object(m) => m,
        Value::Map(entries) => match Value::map_into_object(entries.clone()) {
            Ok(m) => m,
            Err(_) => return type_error(schema, Value::Map(entries), ctx),
        },
        other => return type_error(schema, other, ctx),
    };

    let selected = map.get(&def.key).and_then(|v| def.member_for(v));
    let Some((index, member)) = selected else {
        let input = Value::Object(map);
        let kind = IssueKind::InvalidUnion {
            errors: Vec::new(),
            note: Some("No matching discriminator".to_owned()),
            discriminator: Some(def.key.clone()),
        };
        let new = NewIssue::new(kind).at(def.key.as_str()).fatal();
        let issue = ctx.raise(schema, new, &input);
        return Payload::fail(input, issue);
    };
    trace!(
        discriminator = %def.key,
        member = index,
        path = %ctx.path,
        "discriminated union dispatch"
    );
    run(&member.inner, Value::Object(map), ctx)
}

impl<T> Schema<T> {
    /// Union of this schema and `other`.
    pub fn or(&self, other: impl IntoSchema) -> Schema {
        union([self.erase(), other.into_schema()])
    }

    /// Members of a union, xor or discriminated union.
    pub fn options(&self) -> Option<&[Schema]> {
        match &self.inner.def {
            Def::Union(members) | Def::Xor(members) => Some(members),
            Def::Discriminated(def) => Some(&def.members),
            _ => None,
        }
    }

    /// Discriminator key of a discriminated union.
    pub fn discriminator(&self) -> Option<&str> {
        match &self.inner.def {
            Def::Discriminated(def) => Some(&def.key),
            _ => None,
        }
    }
}
