use valkit_issue::{IssueKind, NewIssue, Origin};
use valkit_value::Value;

use crate::engine::{accepts_absent, run, run_absent, type_error, Absent, ParseCtx, Payload};
use crate::output::Output;
use crate::schema::{Def, Internals, IntoSchema, Schema, TypeCode};

#[derive(Clone)]
pub(crate) struct TupleDef {
    pub(crate) items: Vec<Schema>,
    pub(crate) rest: Option<Schema>,
}

impl TupleDef {
    /// Items up to and including the last one that cannot be absent.
    fn required(&self) -> usize {
        self.items
            .iter()
            .rposition(|s| !accepts_absent(&s.inner))
            .map_or(0, |p| p + 1)
    }
}

pub fn array<T: Output>(element: Schema<T>) -> Schema<Vec<T>> {
    Schema::new(TypeCode::Array, Def::Array(element.into_schema()))
}

/// A fixed-position array.
pub fn tuple<I>(items: I) -> Schema<Vec<Value>>
where
    I: IntoIterator,
    I::Item: IntoSchema,
{
    Schema::new(
        TypeCode::Tuple,
        Def::Tuple(TupleDef {
            items: items.into_iter().map(IntoSchema::into_schema).collect(),
            rest: None,
        }),
    )
}

pub(crate) fn check_array(
    schema: &Internals,
    element: &Schema,
    input: Value,
    ctx: &mut ParseCtx<'_>,
) -> Payload {
    let Value::Array(items) = input else {
        return type_error(schema, input, ctx);
    };
    let mut out = Vec::with_capacity(items.len());
    let mut issues = Vec::new();
    for (i, item) in items.into_iter().enumerate() {
        let payload = ctx.at(i, |ctx| run(&element.inner, item, ctx));
        out.push(payload.value);
        issues.extend(payload.issues);
    }
    Payload {
        value: Value::Array(out),
        issues,
    }
}

pub(crate) fn check_tuple(
    schema: &Internals,
    def: &TupleDef,
    input: Value,
    ctx: &mut ParseCtx<'_>,
) -> Payload {
    let Value::Array(items) = input else {
        return type_error(schema, input, ctx);
    };

    let required = def.required();
    if items.len() < required {
        let kind = IssueKind::TooSmall {
            origin: Origin::Tuple,
            minimum: Value::Uint(required as u64),
            inclusive: true,
            exact: def.rest.is_none() && required == def.items.len(),
        };
        let input = Value::Array(items);
        let issue = ctx.issue(schema, kind, &input);
        return Payload::fail(input, issue);
    }
    if def.rest.is_none() && items.len() > def.items.len() {
        let kind = IssueKind::TooBig {
            origin: Origin::Tuple,
            maximum: Value::Uint(def.items.len() as u64),
            inclusive: true,
            exact: required == def.items.len(),
        };
        let input = Value::Array(items);
        let issue = ctx.raise(schema, NewIssue::new(kind).fatal(), &input);
        return Payload::fail(input, issue);
    }

    let mut out = Vec::with_capacity(items.len().max(def.items.len()));
    let mut issues = Vec::new();
    let mut items = items.into_iter();
    for (i, item_schema) in def.items.iter().enumerate() {
        let payload = match items.next() {
            Some(item) => ctx.at(i, |ctx| run(&item_schema.inner, item, ctx)),
            None => match ctx.at(i, |ctx| run_absent(&item_schema.inner, ctx)) {
                Absent::Omit => break,
                Absent::Present(p) => p,
            },
        };
        out.push(payload.value);
        issues.extend(payload.issues);
    }
    if let Some(rest) = &def.rest {
        for (i, item) in items.enumerate() {
            let index = def.items.len() + i;
            let payload = ctx.at(index, |ctx| run(&rest.inner, item, ctx));
            out.push(payload.value);
            issues.extend(payload.issues);
        }
    }

    Payload {
        value: Value::Array(out),
        issues,
    }
}

impl<T: Output> Schema<Vec<T>> {
    /// Minimum number of items.
    pub fn min(&self, limit: usize) -> Self {
        self.min_length(limit)
    }

    /// Maximum number of items.
    pub fn max(&self, limit: usize) -> Self {
        self.max_length(limit)
    }

    /// Element schema of an array.
    pub fn element(&self) -> Option<&Schema> {
        match &self.inner.def {
            Def::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Positional item schemas of a tuple.
    pub fn items(&self) -> Option<&[Schema]> {
        match &self.inner.def {
            Def::Tuple(def) => Some(&def.items),
            _ => None,
        }
    }

    /// Validate items past the fixed positions of a tuple with `rest`.
    /// Has no effect on other schemas.
    pub fn rest(&self, rest: impl IntoSchema) -> Self {
        let rest = rest.into_schema();
        match &self.inner.def {
            Def::Tuple(def) => {
                let mut def = def.clone();
                def.rest = Some(rest);
                self.derive(|i| i.def = Def::Tuple(def))
            }
            _ => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use valkit_issue::IssueCode;

    use super::*;
    use crate::number::int;
    use crate::primitive::string;

    fn input(json: &str) -> Value {
        Value::from_json_str(json).unwrap()
    }

    #[test]
    fn element_issues_carry_their_index() {
        let err = array(int()).parse(input(r#"[1,"x",3,"y"]"#)).unwrap_err();
        let paths: Vec<String> = err.issues().iter().map(|i| i.path.to_string()).collect();
        assert_eq!(paths, vec!["[1]", "[3]"]);
    }

    #[test]
    fn arrays_are_typed() {
        let out: Vec<i64> = array(int()).parse(input("[1,2]")).unwrap();
        assert_eq!(out, vec![1, 2]);
        assert!(array(int()).min(3).parse(input("[1,2]")).is_err());
        assert!(array(int()).parse(input("{}")).is_err());
    }

    #[test]
    fn tuple_arity() {
        let t = tuple([string().erase(), int().erase()]);
        assert!(t.parse(input(r#"["a",1]"#)).is_ok());
        let err = t.parse(input(r#"["a"]"#)).unwrap_err();
        assert_eq!(err.issues()[0].code(), IssueCode::TooSmall);
        let err = t.parse(input(r#"["a",1,2]"#)).unwrap_err();
        assert_eq!(err.issues()[0].code(), IssueCode::TooBig);
    }

    #[test]
    fn tuple_optional_tail_and_rest() {
        let t = tuple([string().erase(), int().optional().erase()]);
        assert_eq!(t.parse(input(r#"["a"]"#)).unwrap().len(), 1);

        let with_rest = tuple([string().erase()]).rest(int());
        assert!(with_rest.parse(input(r#"["a",1,2,3]"#)).is_ok());
        let err = with_rest.parse(input(r#"["a",1,"x"]"#)).unwrap_err();
        assert_eq!(err.issues()[0].path.to_string(), "[2]");
    }
}
