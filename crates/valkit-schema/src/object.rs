//! Object schemas: a declared shape plus an unknown-key policy.

use indexmap::IndexMap;
use tracing::warn;
use valkit_issue::{IssueKind, NewIssue};
use valkit_value::{Map, Value};

use crate::engine::{run, run_absent, type_error, Absent, ParseCtx, Payload};
use crate::error::{Result, SchemaError};
use crate::primitive::enumeration;
use crate::schema::{Def, Internals, IntoSchema, Schema, TypeCode};

/// Ordered field declarations of an object schema.
#[derive(Clone, Default)]
pub struct Shape {
    fields: IndexMap<String, Schema>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or replace) a field.
    pub fn field(mut self, name: impl Into<String>, schema: impl IntoSchema) -> Self {
        self.fields.insert(name.into(), schema.into_schema());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn check_keys(&self, keys: &[&str]) -> Result<()> {
        match keys.iter().find(|k| !self.contains(k)) {
            Some(k) => Err(SchemaError::UnknownKey((*k).to_owned())),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.fields.iter().map(|(k, v)| (k, v.type_code())))
            .finish()
    }
}

impl<K: Into<String>, S: IntoSchema, const N: usize> From<[(K, S); N]> for Shape {
    fn from(fields: [(K, S); N]) -> Self {
        fields.into_iter().collect()
    }
}

impl<K: Into<String>, S: IntoSchema> FromIterator<(K, S)> for Shape {
    fn from_iter<I: IntoIterator<Item = (K, S)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Shape::new(), |shape, (k, s)| shape.field(k, s))
    }
}

/// What happens to input keys the shape does not declare.
#[derive(Clone, Default)]
pub enum UnknownKeys {
    /// Drop them from the output.
    #[default]
    Strip,
    /// Report them as `unrecognized_keys`.
    Strict,
    /// Copy them to the output unchanged.
    Passthrough,
    /// Validate their values with a schema.
    Catchall(Schema),
}

#[derive(Clone, Default)]
pub(crate) struct ObjectDef {
    pub(crate) shape: Shape,
    pub(crate) unknown: UnknownKeys,
    /// Field name to the input key it is read from.
    pub(crate) aliases: IndexMap<String, String>,
}

impl ObjectDef {
    fn input_key<'a>(&'a self, field: &'a str) -> &'a str {
        self.aliases.get(field).map_or(field, String::as_str)
    }

    fn is_known(&self, key: &str) -> bool {
        if self.aliases.values().any(|k| k == key) {
            return true;
        }
        self.shape.contains(key) && !self.aliases.contains_key(key)
    }
}

pub fn object(shape: impl Into<Shape>) -> Schema<Map> {
    Schema::new(
        TypeCode::Object,
        Def::Object(ObjectDef {
            shape: shape.into(),
            ..ObjectDef::default()
        }),
    )
}

/// An object that rejects unknown keys.
pub fn strict_object(shape: impl Into<Shape>) -> Schema<Map> {
    object(shape).strict()
}

pub(crate) fn check_object(
    schema: &Internals,
    def: &ObjectDef,
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

    let mut out = Map::with_capacity(def.shape.len());
    let mut issues = Vec::new();
    for (name, field) in def.shape.iter() {
        let key = def.input_key(name);
        let payload = match map.get(key) {
            Some(value) => ctx.at(key, |ctx| run(&field.inner, value.clone(), ctx)),
            None => match ctx.at(key, |ctx| run_absent(&field.inner, ctx)) {
                Absent::Omit => continue,
                Absent::Present(p) => p,
            },
        };
        out.insert(name.to_owned(), payload.value);
        issues.extend(payload.issues);
    }

    let unknown: Vec<&String> = map.keys().filter(|k| !def.is_known(k)).collect();
    if !unknown.is_empty() {
        match &def.unknown {
            UnknownKeys::Strip => {}
            UnknownKeys::Strict => {
                let kind = IssueKind::UnrecognizedKeys {
                    keys: unknown.iter().map(|k| (*k).clone()).collect(),
                };
                let whole = Value::Object(map.clone());
                issues.push(ctx.raise(schema, NewIssue::new(kind), &whole));
            }
            UnknownKeys::Passthrough => {
                for key in unknown {
                    out.insert(key.clone(), map[key.as_str()].clone());
                }
            }
            UnknownKeys::Catchall(catchall) => {
                for key in unknown {
                    let value = map[key.as_str()].clone();
                    let payload = ctx.at(key.as_str(), |ctx| run(&catchall.inner, value, ctx));
                    out.insert(key.clone(), payload.value);
                    issues.extend(payload.issues);
                }
            }
        }
    }

    Payload {
        value: Value::Object(out),
        issues,
    }
}

impl Schema<Map> {
    fn object_def(&self) -> Result<&ObjectDef> {
        match &self.inner.def {
            Def::Object(def) => Ok(def),
            _ => Err(SchemaError::NotAnObject(self.inner.code.as_str())),
        }
    }

    fn try_reshape(&self, f: impl FnOnce(&mut ObjectDef) -> Result<()>) -> Result<Schema<Map>> {
        let mut def = self.object_def()?.clone();
        f(&mut def)?;
        Ok(self.derive(|i| i.def = Def::Object(def)))
    }

    fn reshape(&self, operation: &str, f: impl FnOnce(&mut ObjectDef)) -> Schema<Map> {
        match self.object_def() {
            Ok(def) => {
                let mut def = def.clone();
                f(&mut def);
                self.derive(|i| i.def = Def::Object(def))
            }
            Err(_) => {
                warn!(
                    operation,
                    code = %self.inner.code,
                    "object modifier applied to a non-object schema; ignored"
                );
                self.clone()
            }
        }
    }

    /// The declared fields, if this is an object schema.
    pub fn shape(&self) -> Option<&Shape> {
        self.object_def().ok().map(|def| &def.shape)
    }

    /// Unknown keys become `unrecognized_keys` issues.
    pub fn strict(&self) -> Schema<Map> {
        self.reshape("strict", |def| def.unknown = UnknownKeys::Strict)
    }

    pub fn strip(&self) -> Schema<Map> {
        self.reshape("strip", |def| def.unknown = UnknownKeys::Strip)
    }

    pub fn passthrough(&self) -> Schema<Map> {
        self.reshape("passthrough", |def| def.unknown = UnknownKeys::Passthrough)
    }

    pub fn catchall(&self, schema: impl IntoSchema) -> Schema<Map> {
        let schema = schema.into_schema();
        self.reshape("catchall", |def| def.unknown = UnknownKeys::Catchall(schema))
    }

    /// Make every field optional.
    pub fn partial(&self) -> Schema<Map> {
        self.reshape("partial", |def| {
            for field in def.shape.fields.values_mut() {
                *field = make_optional(field);
            }
        })
    }

    /// Make the listed fields optional.
    pub fn partial_keys(&self, keys: &[&str]) -> Result<Schema<Map>> {
        self.try_reshape(|def| {
            def.shape.check_keys(keys)?;
            for key in keys {
                if let Some(field) = def.shape.fields.get_mut(*key) {
                    *field = make_optional(field);
                }
            }
            Ok(())
        })
    }

    /// Make every field required; missing fields become `non_optional`.
    pub fn required(&self) -> Schema<Map> {
        self.reshape("required", |def| {
            for field in def.shape.fields.values_mut() {
                *field = make_required(field);
            }
        })
    }

    pub fn required_keys(&self, keys: &[&str]) -> Result<Schema<Map>> {
        self.try_reshape(|def| {
            def.shape.check_keys(keys)?;
            for key in keys {
                if let Some(field) = def.shape.fields.get_mut(*key) {
                    *field = make_required(field);
                }
            }
            Ok(())
        })
    }

    /// Keep only the listed fields.
    pub fn pick(&self, keys: &[&str]) -> Result<Schema<Map>> {
        self.try_reshape(|def| {
            def.shape.check_keys(keys)?;
            def.shape.fields.retain(|k, _| keys.contains(&k.as_str()));
            def.aliases.retain(|k, _| keys.contains(&k.as_str()));
            Ok(())
        })
    }

    /// Drop the listed fields.
    pub fn omit(&self, keys: &[&str]) -> Result<Schema<Map>> {
        self.try_reshape(|def| {
            def.shape.check_keys(keys)?;
            def.shape.fields.retain(|k, _| !keys.contains(&k.as_str()));
            def.aliases.retain(|k, _| !keys.contains(&k.as_str()));
            Ok(())
        })
    }

    /// Add fields; on collision the new field wins.
    pub fn extend(&self, shape: impl Into<Shape>) -> Schema<Map> {
        let shape = shape.into();
        self.reshape("extend", |def| {
            for (name, field) in shape.fields {
                def.aliases.shift_remove(&name);
                def.shape.fields.insert(name, field);
            }
        })
    }

    /// Extend with `other`'s fields and adopt its unknown-key policy.
    pub fn merge(&self, other: &Schema<Map>) -> Schema<Map> {
        let Ok(incoming) = other.object_def() else {
            warn!(code = %other.inner.code, "merge with a non-object schema; ignored");
            return self.clone();
        };
        let incoming = incoming.clone();
        self.reshape("merge", |def| {
            for (name, field) in incoming.shape.fields {
                def.aliases.shift_remove(&name);
                def.shape.fields.insert(name, field);
            }
            def.aliases.extend(incoming.aliases);
            def.unknown = incoming.unknown;
        })
    }

    /// An enum of the declared field names.
    pub fn keyof(&self) -> Schema<String> {
        let keys: Vec<String> = self
            .shape()
            .map(|s| s.keys().map(str::to_owned).collect())
            .unwrap_or_default();
        enumeration(keys)
    }

    /// Read `field` from `input_key` in the input.
    pub fn alias(&self, input_key: impl Into<String>, field: &str) -> Result<Schema<Map>> {
        let input_key = input_key.into();
        self.try_reshape(|def| {
            def.shape.check_keys(&[field])?;
            def.aliases.insert(field.to_owned(), input_key);
            Ok(())
        })
    }
}

fn make_optional(field: &Schema) -> Schema {
    field.derive(|i| {
        i.flags.optional = true;
        i.flags.non_optional = false;
    })
}

fn make_required(field: &Schema) -> Schema {
    field.derive(|i| {
        i.flags.optional = false;
        i.flags.exact_optional = false;
        i.flags.non_optional = true;
    })
}
