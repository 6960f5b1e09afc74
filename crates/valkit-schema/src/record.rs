//! Records (string-keyed maps with a key schema) and keyed maps.
//!
//! A record whose key schema enumerates a finite set of strings (a literal,
//! an enum, or a union of those) is exhaustive: every enumerated key must be
//! present unless the record is partial, and other keys are unrecognized.
//! Any other key schema validates keys one by one; a key that is rejected
//! as a string but reads as a number is retried as that number.

use indexmap::IndexMap;
use tracing::trace;
use valkit_issue::{Issue, IssueKind, NewIssue, Origin};
use valkit_value::{Map, Value};

use crate::engine::{run, run_absent, type_error, Absent, ParseCtx, Payload};
use crate::output::Output;
use crate::schema::{Def, Internals, IntoSchema, Schema, TypeCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecordMode {
    Standard,
    /// Enumerated keys may be missing.
    Partial,
    /// Entries whose key fails the key schema are passed through.
    Loose,
}

#[derive(Clone)]
pub(crate) struct RecordDef {
    pub(crate) key: Schema,
    pub(crate) value: Schema,
    pub(crate) mode: RecordMode,
}

#[derive(Clone)]
pub(crate) struct MapDef {
    pub(crate) key: Schema,
    pub(crate) value: Schema,
}

fn record_schema<T>(key: Schema, value: Schema, mode: RecordMode) -> Schema<T> {
    Schema::new(TypeCode::Record, Def::Record(RecordDef { key, value, mode }))
}

/// A record validating every key with `key` and every value with `value`.
pub fn record<K, V: Output>(key: Schema<K>, value: Schema<V>) -> Schema<IndexMap<String, V>> {
    record_schema(key.into_schema(), value.into_schema(), RecordMode::Standard)
}

/// A record over enumerated keys where keys may be missing.
pub fn partial_record<K, V: Output>(
    key: Schema<K>,
    value: Schema<V>,
) -> Schema<IndexMap<String, V>> {
    record_schema(key.into_schema(), value.into_schema(), RecordMode::Partial)
}

/// A record that keeps entries whose key the key schema rejects.
pub fn loose_record<K, V>(key: Schema<K>, value: Schema<V>) -> Schema<Map> {
    record_schema(key.into_schema(), value.into_schema(), RecordMode::Loose)
}

/// A map over arbitrary keys. Accepts keyed maps and objects.
pub fn map(key: impl IntoSchema, value: impl IntoSchema) -> Schema {
    Schema::new(
        TypeCode::Map,
        Def::Map(MapDef {
            key: key.into_schema(),
            value: value.into_schema(),
        }),
    )
}

/// The finite key set of a literal, enum or union-of-those key schema.
fn enumerated_keys(schema: &Schema) -> Option<Vec<String>> {
    match &schema.inner.def {
        Def::Literal(values) | Def::Enum(values) => {
            Some(values.iter().map(Value::key_string).collect())
        }
        Def::Union(members) => members.iter().try_fold(Vec::new(), |mut keys, m| {
            keys.extend(enumerated_keys(m)?);
            Some(keys)
        }),
        _ => None,
    }
}

/// Wrap a failed child run in an aggregate issue at the current path.
fn aggregate(
    schema: &Internals,
    kind: impl FnOnce(Vec<Issue>) -> IssueKind,
    issues: Vec<Issue>,
    input: &Value,
    ctx: &ParseCtx<'_>,
) -> Issue {
    let fatal = issues.iter().any(Issue::is_fatal);
    let mut new = NewIssue::new(kind(ctx.relative(issues)));
    new.fatal = fatal;
    ctx.raise(schema, new, input)
}

fn numeric_key(key: &str) -> Option<Value> {
    if let Ok(i) = key.parse::<i64>() {
        return Some(Value::Int(i));
    }
    key.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}

/// Run the key schema, retrying numeric-looking keys as numbers.
fn run_key(key_schema: &Schema, key: &str, ctx: &mut ParseCtx<'_>) -> Payload {
    let first = run(&key_schema.inner, Value::from(key), ctx);
    if first.is_ok() {
        return first;
    }
    match numeric_key(key) {
        Some(number) => {
            let retry = run(&key_schema.inner, number, ctx);
            trace!(key, accepted = retry.is_ok(), "retried record key as a number");
            if retry.is_ok() {
                retry
            } else {
                first
            }
        }
        None => first,
    }
}

pub(crate) fn check_record(
    schema: &Internals,
    def: &RecordDef,
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

    let mut out = Map::with_capacity(map.len());
    let mut issues = Vec::new();

    let enumerated = match def.mode {
        RecordMode::Loose => None,
        _ => enumerated_keys(&def.key),
    };
    if let Some(keys) = enumerated {
        for key in &keys {
            let payload = ctx.at(key.as_str(), |ctx| {
                let payload = match map.get(key) {
                    Some(value) => run(&def.value.inner, value.clone(), ctx),
                    None if def.mode == RecordMode::Partial => return None,
                    None => match run_absent(&def.value.inner, ctx) {
                        Absent::Omit => return None,
                        Absent::Present(p) => p,
                    },
                };
                Some(wrap_element(schema, key, payload, ctx))
            });
            if let Some((value, issue)) = payload {
                out.insert(key.clone(), value);
                issues.extend(issue);
            }
        }
        let unknown: Vec<String> = map
            .keys()
            .filter(|k| !keys.contains(k))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            let kind = IssueKind::UnrecognizedKeys { keys: unknown };
            let whole = Value::Object(map.clone());
            issues.push(ctx.raise(schema, NewIssue::new(kind), &whole));
        }
        return Payload {
            value: Value::Object(out),
            issues,
        };
    }

    for (key, value) in &map {
        ctx.at(key.as_str(), |ctx| {
            let key_payload = run_key(&def.key, key, ctx);
            if !key_payload.is_ok() {
                if def.mode == RecordMode::Loose {
                    out.insert(key.clone(), value.clone());
                } else {
                    let issue = aggregate(
                        schema,
                        |nested| IssueKind::InvalidKey {
                            origin: Origin::Record,
                            issues: nested,
                        },
                        key_payload.issues,
                        &Value::from(key.as_str()),
                        ctx,
                    );
                    issues.push(issue);
                }
                return;
            }
            let out_key = key_payload.value.key_string();
            let payload = run(&def.value.inner, value.clone(), ctx);
            let (value, issue) = wrap_element(schema, key, payload, ctx);
            out.insert(out_key, value);
            issues.extend(issue);
        });
    }

    Payload {
        value: Value::Object(out),
        issues,
    }
}

fn wrap_element(
    schema: &Internals,
    key: &str,
    payload: Payload,
    ctx: &ParseCtx<'_>,
) -> (Value, Option<Issue>) {
    if payload.is_ok() {
        return (payload.value, None);
    }
    let issue = aggregate(
        schema,
        |nested| IssueKind::InvalidElement {
            origin: Origin::Record,
            key: Value::from(key),
            issues: nested,
        },
        payload.issues,
        &payload.value,
        ctx,
    );
    (payload.value, Some(issue))
}

pub(crate) fn check_map(
    schema: &Internals,
    def: &MapDef,
    input: Value,
    ctx: &mut ParseCtx<'_>,
) -> Payload {
    let entries = match input {
        Value::Map(entries) => entries,
        Value::Object(m) => m.into_iter().map(|(k, v)| (Value::String(k), v)).collect(),
        other => return type_error(schema, other, ctx),
    };

    let mut out = Vec::with_capacity(entries.len());
    let mut issues = Vec::new();
    for (key, value) in entries {
        ctx.at(key.key_string(), |ctx| {
            let key_payload = run(&def.key.inner, key.clone(), ctx);
            if !key_payload.is_ok() {
                issues.push(aggregate(
                    schema,
                    |nested| IssueKind::InvalidKey {
                        origin: Origin::Map,
                        issues: nested,
                    },
                    key_payload.issues,
                    &key,
                    ctx,
                ));
                return;
            }
            let payload = run(&def.value.inner, value, ctx);
            if !payload.is_ok() {
                issues.push(aggregate(
                    schema,
                    |nested| IssueKind::InvalidElement {
                        origin: Origin::Map,
                        key: key.clone(),
                        issues: nested,
                    },
                    payload.issues,
                    &payload.value,
                    ctx,
                ));
            }
            out.push((key_payload.value, payload.value));
        });
    }

    Payload {
        value: Value::Map(out),
        issues,
    }
}

impl<V: Output> Schema<IndexMap<String, V>> {
    /// Minimum number of entries.
    pub fn min(&self, limit: usize) -> Self {
        self.min_length(limit)
    }

    /// Maximum number of entries.
    pub fn max(&self, limit: usize) -> Self {
        self.max_length(limit)
    }
}

#[cfg(test)]
mod tests {
    use valkit_issue::IssueCode;

    use super::*;
    use crate::number::int;
    use crate::primitive::{enumeration, literal, string};
    use crate::union::union;

    fn input(json: &str) -> Value {
        Value::from_json_str(json).unwrap()
    }

    fn fields() -> Schema<String> {
        enumeration(["id", "name", "email"])
    }

    #[test]
    fn enumerated_records_are_exhaustive() {
        let s = record(fields(), string());
        let full = input(r#"{"id":"1","name":"x","email":"y@z"}"#);
        assert_eq!(s.parse(full).unwrap().len(), 3);
        assert!(s.parse(input(r#"{"id":"1","name":"x"}"#)).is_err());
        let err = s
            .parse(input(r#"{"id":"1","name":"x","email":"e","extra":"?"}"#))
            .unwrap_err();
        assert!(err.has_code(IssueCode::UnrecognizedKeys));
    }

    #[test]
    fn partial_records_allow_missing_keys() {
        let s = partial_record(fields(), string());
        let out = s.parse(input(r#"{"id":"1","name":"x"}"#)).unwrap();
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["id", "name"]);
        let err = s.parse(input(r#"{"id":"1","extra":"?"}"#)).unwrap_err();
        assert!(err.has_code(IssueCode::UnrecognizedKeys));
    }

    #[test]
    fn union_of_literals_is_enumerated() {
        let keys = union([literal("a").erase(), literal("b").erase()]);
        let s = record(keys, int());
        assert!(s.parse(input(r#"{"a":1}"#)).is_err());
        assert!(s.parse(input(r#"{"a":1,"b":2}"#)).is_ok());
    }

    #[test]
    fn value_failures_are_wrapped_with_the_key() {
        let s = record(string(), int());
        let err = s.parse(input(r#"{"a":1,"b":"x"}"#)).unwrap_err();
        let issue = &err.issues()[0];
        assert_eq!(issue.path.to_string(), "b");
        match &issue.kind {
            IssueKind::InvalidElement { key, issues, .. } => {
                assert_eq!(key, &Value::from("b"));
                assert!(issues[0].path.is_empty());
                assert_eq!(issues[0].code(), IssueCode::InvalidType);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn key_failures_and_numeric_retry() {
        let s = record(string().min(2), int());
        let err = s.parse(input(r#"{"a":1}"#)).unwrap_err();
        assert_eq!(err.issues()[0].code(), IssueCode::InvalidKey);

        let numeric = record(int().min(0), string());
        let out = numeric.parse(input(r#"{"1":"one"}"#)).unwrap();
        assert_eq!(out["1"], "one");
        assert!(numeric.parse(input(r#"{"-1":"neg"}"#)).is_err());
    }

    #[test]
    fn key_overwrites_rewrite_output_keys() {
        let s = record(string().to_uppercase(), int());
        let out = s.parse(input(r#"{"ab":1}"#)).unwrap();
        assert_eq!(out["AB"], 1);
    }

    #[test]
    fn loose_records_pass_unmatched_keys_through() {
        let s = loose_record(string().regex("^n_").unwrap(), int());
        let out = s.parse(input(r#"{"n_a":1,"other":"x"}"#)).unwrap();
        assert_eq!(out["other"], Value::from("x"));
        assert!(s.parse(input(r#"{"n_a":"bad"}"#)).is_err());
    }

    #[test]
    fn record_length_counts_entries() {
        let s = record(string(), int()).min(2);
        assert!(s.parse(input(r#"{"a":1}"#)).is_err());
        assert!(s.parse(input(r#"{"a":1,"b":2}"#)).is_ok());
    }

    #[test]
    fn keyed_maps_validate_keys_and_values() {
        let s = map(int(), string());
        let ok = Value::Map(vec![(Value::Int(1), Value::from("a"))]);
        assert!(s.parse(ok).is_ok());
        let bad = Value::Map(vec![(Value::from("k"), Value::Int(2))]);
        let err = s.parse(bad).unwrap_err();
        assert_eq!(err.issues()[0].code(), IssueCode::InvalidKey);
    }
}
