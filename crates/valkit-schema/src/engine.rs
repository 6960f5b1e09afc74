//! The parse loop shared by every schema node.
//!
//! A frame runs, in order: depth guard, nil normalisation (default,
//! prefault, optional/nilable, non-optional), coercion, type extraction with
//! child descent, the check list, and the catch fallback.

use tracing::warn;
use valkit_issue::{Issue, IssueKind, NewIssue, Path, PathSegment};
use valkit_value::{coerce, Value};

use crate::checks::run_checks;
use crate::config::ParseConfig;
use crate::number::{check_float, check_int};
use crate::schema::{Catch, CatchContext, Def, Internals};
use crate::{array, compose, object, primitive, record, union};

/// Per-call parse state.
pub(crate) struct ParseCtx<'a> {
    pub(crate) path: Path,
    depth: usize,
    pub(crate) config: &'a ParseConfig,
}

impl<'a> ParseCtx<'a> {
    pub(crate) fn new(config: &'a ParseConfig) -> Self {
        Self {
            path: Path::new(),
            depth: 0,
            config,
        }
    }

    /// A fatal issue at the current path, carrying the schema's override.
    pub(crate) fn issue(&self, schema: &Internals, kind: IssueKind, input: &Value) -> Issue {
        self.raise(schema, NewIssue::new(kind).fatal(), input)
    }

    /// Materialise a user-built issue at the current path.
    pub(crate) fn raise(&self, schema: &Internals, new: NewIssue, input: &Value) -> Issue {
        let mut issue = new.into_issue(&self.path, input);
        if let Some(error) = &schema.error {
            issue.attach_schema_error(error);
        }
        issue
    }

    /// Run `f` with `segment` pushed onto the path.
    pub(crate) fn at<R>(
        &mut self,
        segment: impl Into<PathSegment>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.path.push(segment);
        let out = f(self);
        self.path.pop();
        out
    }

    /// Rebase issues raised under the current path onto it, for nesting
    /// inside an aggregate issue.
    pub(crate) fn relative(&self, mut issues: Vec<Issue>) -> Vec<Issue> {
        let depth = self.path.len();
        for issue in &mut issues {
            issue.path.strip_prefix(depth);
        }
        issues
    }
}

/// Value and issues of one frame.
#[derive(Debug, Clone)]
pub(crate) struct Payload {
    pub(crate) value: Value,
    pub(crate) issues: Vec<Issue>,
}

impl Payload {
    pub(crate) fn ok(value: Value) -> Self {
        Self {
            value,
            issues: Vec::new(),
        }
    }

    pub(crate) fn fail(value: Value, issue: Issue) -> Self {
        Self {
            value,
            issues: vec![issue],
        }
    }

    pub(crate) fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    /// True once any fatal issue has been recorded.
    pub(crate) fn aborted(&self) -> bool {
        self.issues.iter().any(Issue::is_fatal)
    }
}

/// Outcome of resolving a missing field.
pub(crate) enum Absent {
    Omit,
    Present(Payload),
}

pub(crate) fn run(schema: &Internals, input: Value, ctx: &mut ParseCtx<'_>) -> Payload {
    if ctx.depth >= ctx.config.max_depth {
        warn!(depth = ctx.depth, path = %ctx.path, "maximum parse depth exceeded");
        let issue = ctx.raise(
            schema,
            NewIssue::custom("maximum parse depth exceeded").fatal(),
            &input,
        );
        return Payload::fail(input, issue);
    }
    ctx.depth += 1;
    let payload = run_frame(schema, input, ctx);
    ctx.depth -= 1;
    payload
}

fn run_frame(schema: &Internals, mut input: Value, ctx: &mut ParseCtx<'_>) -> Payload {
    if input.is_nil() {
        if let Some(default) = &schema.default {
            return Payload::ok(default.get());
        }
        if let Some(prefault) = &schema.prefault {
            input = prefault.get();
        } else if schema.flags.optional || schema.flags.nilable {
            return Payload::ok(Value::Nil);
        } else if schema.flags.non_optional {
            let issue = ctx.issue(schema, IssueKind::NonOptional, &input);
            return apply_catch(schema, Payload::fail(Value::Nil, issue), &Value::Nil);
        }
    }

    let original = schema.catch.as_ref().map(|_| input.clone());
    if schema.coerce {
        if let Some(coerced) = coerce_input(&schema.def, &input) {
            input = coerced;
        }
    }

    let mut payload = check_type(schema, input, ctx);
    run_checks(schema, &mut payload, ctx);

    match original {
        Some(original) => apply_catch(schema, payload, &original),
        None => payload,
    }
}

/// Resolve a field that is missing from its container.
pub(crate) fn run_absent(schema: &Internals, ctx: &mut ParseCtx<'_>) -> Absent {
    if let Some(default) = &schema.default {
        return Absent::Present(Payload::ok(default.get()));
    }
    if schema.prefault.is_some() {
        return Absent::Present(run(schema, Value::Nil, ctx));
    }
    if accepts_absent(schema) {
        return Absent::Omit;
    }
    let kind = if schema.flags.non_optional {
        IssueKind::NonOptional
    } else {
        IssueKind::invalid_type(schema.code.expected(), "undefined")
    };
    let issue = ctx.issue(schema, kind, &Value::Nil);
    Absent::Present(apply_catch(
        schema,
        Payload::fail(Value::Nil, issue),
        &Value::Nil,
    ))
}

/// Whether a missing field may simply be left out of the output.
pub(crate) fn accepts_absent(schema: &Internals) -> bool {
    if schema.flags.non_optional {
        return false;
    }
    if schema.flags.optional || schema.flags.exact_optional {
        return true;
    }
    match &schema.def {
        Def::Any | Def::Unknown => true,
        Def::Union(members) | Def::Xor(members) => {
            members.iter().any(|m| accepts_absent(&m.inner))
        }
        Def::Pipe(first, _) => accepts_absent(&first.inner),
        Def::Lazy(lazy) => accepts_absent(&lazy.resolve().inner),
        _ => false,
    }
}

fn apply_catch(schema: &Internals, payload: Payload, original: &Value) -> Payload {
    match &schema.catch {
        Some(catch) if !payload.is_ok() => {
            let value = match catch {
                Catch::Value(v) => v.clone(),
                Catch::Func(f) => f(&CatchContext {
                    issues: &payload.issues,
                    input: original,
                }),
            };
            Payload::ok(value)
        }
        _ => payload,
    }
}

fn coerce_input(def: &Def, input: &Value) -> Option<Value> {
    match def {
        Def::String => coerce::to_string(input).map(Value::String),
        Def::Int(width) if width.is_unsigned() => coerce::to_i64(input)
            .map(Value::Int)
            .or_else(|| coerce::to_u64(input).map(Value::Uint)),
        Def::Int(_) => coerce::to_i64(input).map(Value::Int),
        Def::Float(_) => coerce::to_f64(input).map(Value::Float),
        Def::Bool(rules) => coerce::to_bool(input, rules).map(Value::Bool),
        Def::BigInt => coerce::to_bigint(input).map(Value::BigInt),
        Def::Date => coerce::to_time(input).map(Value::Time),
        _ => None,
    }
}

/// An `invalid_type` failure for `input` against this schema.
pub(crate) fn type_error(schema: &Internals, input: Value, ctx: &ParseCtx<'_>) -> Payload {
    let kind = IssueKind::invalid_type(schema.code.expected(), input.type_name());
    let issue = ctx.issue(schema, kind, &input);
    Payload::fail(input, issue)
}

fn check_type(schema: &Internals, input: Value, ctx: &mut ParseCtx<'_>) -> Payload {
    match &schema.def {
        Def::String => primitive::check_string(schema, input, ctx),
        Def::Int(width) => check_int(schema, *width, input, ctx),
        Def::Float(width) => check_float(schema, *width, input, ctx),
        Def::Bool(_) => primitive::check_bool(schema, input, ctx),
        Def::BigInt => primitive::check_bigint(schema, input, ctx),
        Def::Date => primitive::check_date(schema, input, ctx),
        Def::Nil => primitive::check_nil(schema, input, ctx),
        Def::Never => type_error(schema, input, ctx),
        Def::Any | Def::Unknown => Payload::ok(input),
        Def::Literal(values) | Def::Enum(values) => {
            primitive::check_options(schema, values, input, ctx)
        }
        Def::Array(element) => array::check_array(schema, element, input, ctx),
        Def::Tuple(def) => array::check_tuple(schema, def, input, ctx),
        Def::Object(def) => object::check_object(schema, def, input, ctx),
        Def::Record(def) => record::check_record(schema, def, input, ctx),
        Def::Map(def) => record::check_map(schema, def, input, ctx),
        Def::Union(members) => union::check_union(schema, members, input, ctx),
        Def::Discriminated(def) => union::check_discriminated(schema, def, input, ctx),
        Def::Xor(members) => union::check_xor(schema, members, input, ctx),
        Def::Intersection(left, right) => {
            compose::check_intersection(schema, left, right, input, ctx)
        }
        Def::Pipe(first, second) => compose::check_pipe(first, second, input, ctx),
        Def::Transform(f) => compose::check_transform(schema, f, input, ctx),
        Def::Lazy(lazy) => run(&lazy.resolve().inner, input, ctx),
    }
}

#[cfg(test)]
mod tests {
    use valkit_issue::IssueCode;

    use super::*;
    use crate::compose::lazy;
    use crate::object::{object, Shape};
    use crate::primitive::{string, unknown};
    use crate::Schema;

    fn run_top<T>(schema: &Schema<T>, input: Value) -> Payload {
        let config = ParseConfig::default();
        let mut ctx = ParseCtx::new(&config);
        run(&schema.inner, input, &mut ctx)
    }

    #[test]
    fn nil_is_rejected_without_modifiers() {
        let p = run_top(&string(), Value::Nil);
        assert_eq!(p.issues[0].code(), IssueCode::InvalidType);
        assert!(p.aborted());
    }

    #[test]
    fn default_wins_over_prefault() {
        let s = string().prefault("pre").default("def".to_owned());
        let p = run_top(&s, Value::Nil);
        assert_eq!(p.value, Value::from("def"));
    }

    #[test]
    fn absent_unknown_is_omitted() {
        let config = ParseConfig::default();
        let mut ctx = ParseCtx::new(&config);
        assert!(matches!(run_absent(&unknown().inner, &mut ctx), Absent::Omit));
        match run_absent(&string().inner, &mut ctx) {
            Absent::Present(p) => match &p.issues[0].kind {
                IssueKind::InvalidType { received, .. } => assert_eq!(received, "undefined"),
                other => panic!("unexpected {other:?}"),
            },
            Absent::Omit => panic!("string must not be omitted"),
        }
    }

    fn tree() -> Schema<valkit_value::Map> {
        object(Shape::new().field("next", lazy(tree).optional()))
    }

    #[test]
    fn depth_guard_stops_runaway_recursion() {
        let mut input = Value::Nil;
        for _ in 0..50 {
            let mut m = valkit_value::Map::new();
            m.insert("next".into(), input);
            input = Value::Object(m);
        }
        let config = ParseConfig {
            max_depth: 20,
            ..ParseConfig::default()
        };
        let mut ctx = ParseCtx::new(&config);
        let p = run(&tree().inner, input, &mut ctx);
        assert!(p.issues.iter().any(|i| i.code() == IssueCode::Custom));
    }
}
