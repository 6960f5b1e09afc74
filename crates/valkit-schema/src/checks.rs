//! Ordered checks run after a value passes its type check.
//!
//! A check may raise any number of issues and may replace the value; the
//! replacement is visible to the next check. Issues are non-fatal unless the
//! check is marked `abort`, so later checks still run and report.

use std::sync::Arc;

use num_traits::Zero;
use regex::Regex;
use valkit_issue::{ErrorOverride, IssueKind, NewIssue, Origin, PathSegment};
use valkit_value::{compare, FromValue, Map, Value};

use crate::engine::{ParseCtx, Payload};
use crate::error::Result;
use crate::formats::Format;
use crate::output::{Measured, Ordered, Output};
use crate::schema::{Internals, Schema, TypeCode};

pub type RefineFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
pub type OverwriteFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;
pub type CheckFn = Arc<dyn Fn(&mut CheckContext<'_>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SizeRelation {
    Min,
    Max,
    Exact,
}

#[derive(Clone)]
enum TextRule {
    StartsWith(String),
    EndsWith(String),
    Includes(String),
    Lowercase,
    Uppercase,
}

#[derive(Clone)]
enum CheckKind {
    Bound {
        limit: Value,
        inclusive: bool,
        lower: bool,
    },
    MultipleOf(Value),
    Size {
        limit: usize,
        relation: SizeRelation,
    },
    Pattern(Regex),
    Format(Format),
    Text(TextRule),
    Refine {
        predicate: RefineFn,
        path: Vec<PathSegment>,
        params: Option<Map>,
    },
    Overwrite(OverwriteFn),
    Callback(CheckFn),
}

#[derive(Clone)]
struct CheckDef {
    kind: CheckKind,
    message: Option<ErrorOverride>,
    abort: bool,
}

/// A single validator or rewriter. Cloning is cheap.
#[derive(Clone)]
pub struct Check {
    def: Arc<CheckDef>,
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("kind", &self.kind_name())
            .field("abort", &self.def.abort)
            .finish()
    }
}

impl Check {
    fn from_kind(kind: CheckKind) -> Self {
        Self {
            def: Arc::new(CheckDef {
                kind,
                message: None,
                abort: false,
            }),
        }
    }

    pub fn gt(limit: impl Into<Value>) -> Self {
        Self::bound(limit.into(), false, true)
    }

    pub fn gte(limit: impl Into<Value>) -> Self {
        Self::bound(limit.into(), true, true)
    }

    pub fn lt(limit: impl Into<Value>) -> Self {
        Self::bound(limit.into(), false, false)
    }

    pub fn lte(limit: impl Into<Value>) -> Self {
        Self::bound(limit.into(), true, false)
    }

    fn bound(limit: Value, inclusive: bool, lower: bool) -> Self {
        Self::from_kind(CheckKind::Bound {
            limit,
            inclusive,
            lower,
        })
    }

    pub fn multiple_of(divisor: impl Into<Value>) -> Self {
        Self::from_kind(CheckKind::MultipleOf(divisor.into()))
    }

    pub fn min_length(limit: usize) -> Self {
        Self::from_kind(CheckKind::Size {
            limit,
            relation: SizeRelation::Min,
        })
    }

    pub fn max_length(limit: usize) -> Self {
        Self::from_kind(CheckKind::Size {
            limit,
            relation: SizeRelation::Max,
        })
    }

    pub fn length(limit: usize) -> Self {
        Self::from_kind(CheckKind::Size {
            limit,
            relation: SizeRelation::Exact,
        })
    }

    /// Compile `pattern` into a regex check.
    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Self::pattern(Regex::new(pattern)?))
    }

    pub fn pattern(regex: Regex) -> Self {
        Self::from_kind(CheckKind::Pattern(regex))
    }

    pub fn format(format: Format) -> Self {
        Self::from_kind(CheckKind::Format(format))
    }

    pub fn starts_with(prefix: impl Into<String>) -> Self {
        Self::from_kind(CheckKind::Text(TextRule::StartsWith(prefix.into())))
    }

    pub fn ends_with(suffix: impl Into<String>) -> Self {
        Self::from_kind(CheckKind::Text(TextRule::EndsWith(suffix.into())))
    }

    pub fn includes(needle: impl Into<String>) -> Self {
        Self::from_kind(CheckKind::Text(TextRule::Includes(needle.into())))
    }

    pub fn lowercase() -> Self {
        Self::from_kind(CheckKind::Text(TextRule::Lowercase))
    }

    pub fn uppercase() -> Self {
        Self::from_kind(CheckKind::Text(TextRule::Uppercase))
    }

    /// Untyped predicate; a `false` result raises a `custom` issue.
    pub fn refine<F>(predicate: F, refinement: Refinement) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let Refinement {
            message,
            path,
            params,
            abort,
        } = refinement;
        let mut check = Self::from_kind(CheckKind::Refine {
            predicate: Arc::new(predicate),
            path,
            params,
        });
        let def = Arc::make_mut(&mut check.def);
        def.message = message;
        def.abort = abort;
        check
    }

    /// Untyped rewrite of the value; never raises.
    pub fn overwrite<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::from_kind(CheckKind::Overwrite(Arc::new(f)))
    }

    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&mut CheckContext<'_>) + Send + Sync + 'static,
    {
        Self::from_kind(CheckKind::Callback(Arc::new(f)))
    }

    /// Message used for issues this check raises without one of their own.
    pub fn message(mut self, message: impl Into<ErrorOverride>) -> Self {
        Arc::make_mut(&mut self.def).message = Some(message.into());
        self
    }

    /// Make issues from this check fatal.
    pub fn abort(mut self) -> Self {
        Arc::make_mut(&mut self.def).abort = true;
        self
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.def.kind {
            CheckKind::Bound { lower: true, .. } => "greater_than",
            CheckKind::Bound { lower: false, .. } => "less_than",
            CheckKind::MultipleOf(_) => "multiple_of",
            CheckKind::Size { relation: SizeRelation::Min, .. } => "min_length",
            CheckKind::Size { relation: SizeRelation::Max, .. } => "max_length",
            CheckKind::Size { relation: SizeRelation::Exact, .. } => "length_equals",
            CheckKind::Pattern(_) => "regex",
            CheckKind::Format(f) => f.name(),
            CheckKind::Text(TextRule::StartsWith(_)) => "starts_with",
            CheckKind::Text(TextRule::EndsWith(_)) => "ends_with",
            CheckKind::Text(TextRule::Includes(_)) => "includes",
            CheckKind::Text(TextRule::Lowercase) => "lowercase",
            CheckKind::Text(TextRule::Uppercase) => "uppercase",
            CheckKind::Refine { .. } => "custom",
            CheckKind::Overwrite(_) => "overwrite",
            CheckKind::Callback(_) => "check",
        }
    }

    pub(crate) fn as_format(&self) -> Option<&Format> {
        match &self.def.kind {
            CheckKind::Format(f) => Some(f),
            _ => None,
        }
    }

    fn evaluate(&self, value: &Value, origin: Origin) -> Outcome {
        let mut out = Outcome::default();
        match &self.def.kind {
            CheckKind::Bound {
                limit,
                inclusive,
                lower,
            } => {
                let passes = match compare(value, limit) {
                    Some(ord) if *lower => ord.is_gt() || (*inclusive && ord.is_eq()),
                    Some(ord) => ord.is_lt() || (*inclusive && ord.is_eq()),
                    None => false,
                };
                if !passes {
                    let kind = if *lower {
                        IssueKind::TooSmall {
                            origin,
                            minimum: limit.clone(),
                            inclusive: *inclusive,
                            exact: false,
                        }
                    } else {
                        IssueKind::TooBig {
                            origin,
                            maximum: limit.clone(),
                            inclusive: *inclusive,
                            exact: false,
                        }
                    };
                    out.issues.push(NewIssue::new(kind));
                }
            }
            CheckKind::MultipleOf(divisor) => {
                if !is_multiple(value, divisor) {
                    out.issues.push(NewIssue::new(IssueKind::NotMultipleOf {
                        origin,
                        divisor: divisor.clone(),
                    }));
                }
            }
            CheckKind::Size { limit, relation } => {
                if let Some(size) = value.size() {
                    let limit_value = Value::Uint(*limit as u64);
                    let exact = *relation == SizeRelation::Exact;
                    let too_small = matches!(relation, SizeRelation::Min | SizeRelation::Exact)
                        && size < *limit;
                    let too_big = matches!(relation, SizeRelation::Max | SizeRelation::Exact)
                        && size > *limit;
                    if too_small {
                        out.issues.push(NewIssue::new(IssueKind::TooSmall {
                            origin,
                            minimum: limit_value,
                            inclusive: true,
                            exact,
                        }));
                    } else if too_big {
                        out.issues.push(NewIssue::new(IssueKind::TooBig {
                            origin,
                            maximum: limit_value,
                            inclusive: true,
                            exact,
                        }));
                    }
                }
            }
            CheckKind::Pattern(regex) => {
                if !value.as_str().is_some_and(|s| regex.is_match(s)) {
                    out.issues.push(NewIssue::new(IssueKind::InvalidFormat {
                        format: "regex".to_owned(),
                        pattern: Some(regex.as_str().to_owned()),
                    }));
                }
            }
            CheckKind::Format(format) => {
                if !value.as_str().is_some_and(|s| format.matches(s)) {
                    out.issues
                        .push(NewIssue::new(IssueKind::invalid_format(format.name())));
                }
            }
            CheckKind::Text(rule) => {
                let s = value.as_str();
                let (ok, format, pattern) = match rule {
                    TextRule::StartsWith(p) => (
                        s.is_some_and(|s| s.starts_with(p.as_str())),
                        "starts_with",
                        Some(p),
                    ),
                    TextRule::EndsWith(p) => (
                        s.is_some_and(|s| s.ends_with(p.as_str())),
                        "ends_with",
                        Some(p),
                    ),
                    TextRule::Includes(p) => {
                        (s.is_some_and(|s| s.contains(p.as_str())), "includes", Some(p))
                    }
                    TextRule::Lowercase => {
                        (s.is_some_and(|s| s == s.to_lowercase()), "lowercase", None)
                    }
                    TextRule::Uppercase => {
                        (s.is_some_and(|s| s == s.to_uppercase()), "uppercase", None)
                    }
                };
                // Non-string values never satisfy a text rule.
                if !ok {
                    out.issues.push(NewIssue::new(IssueKind::InvalidFormat {
                        format: format.to_owned(),
                        pattern: pattern.cloned(),
                    }));
                }
            }
            CheckKind::Refine {
                predicate,
                path,
                params,
            } => {
                if !predicate(value) {
                    let mut issue = NewIssue::new(IssueKind::Custom {
                        params: params.clone(),
                    });
                    issue.path = path.clone();
                    out.issues.push(issue);
                }
            }
            CheckKind::Overwrite(f) => out.replacement = Some(f(value.clone())),
            CheckKind::Callback(f) => {
                let mut ctx = CheckContext {
                    value,
                    issues: Vec::new(),
                    replacement: None,
                };
                f(&mut ctx);
                out.issues = ctx.issues;
                out.replacement = ctx.replacement;
            }
        }
        out
    }
}

#[derive(Default)]
struct Outcome {
    issues: Vec<NewIssue>,
    replacement: Option<Value>,
}

/// What a `check` callback sees and can do.
pub struct CheckContext<'a> {
    value: &'a Value,
    issues: Vec<NewIssue>,
    replacement: Option<Value>,
}

impl<'a> CheckContext<'a> {
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Record an issue. Non-fatal unless built with `NewIssue::fatal`.
    pub fn issue(&mut self, issue: impl Into<NewIssue>) {
        self.issues.push(issue.into());
    }

    /// Replace the value seen by later checks and the output.
    pub fn replace(&mut self, value: impl Into<Value>) {
        self.replacement = Some(value.into());
    }
}

/// Options for `refine_with`.
#[derive(Debug, Clone, Default)]
pub struct Refinement {
    pub message: Option<ErrorOverride>,
    pub path: Vec<PathSegment>,
    pub params: Option<Map>,
    pub abort: bool,
}

impl Refinement {
    pub fn message(message: impl Into<ErrorOverride>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Report the issue under `segment`, relative to the refined value.
    pub fn at(mut self, segment: impl Into<PathSegment>) -> Self {
        self.path.push(segment.into());
        self
    }

    pub fn params(mut self, params: Map) -> Self {
        self.params = Some(params);
        self
    }

    pub fn abort(mut self) -> Self {
        self.abort = true;
        self
    }
}

fn is_integer_kind(v: &Value) -> bool {
    matches!(v, Value::Int(_) | Value::Uint(_) | Value::BigInt(_))
}

fn decimals(x: f64) -> i32 {
    let text = x.abs().to_string();
    text.split_once('.')
        .map_or(0, |(_, frac)| frac.len().min(17) as i32)
}

fn is_multiple(value: &Value, divisor: &Value) -> bool {
    if is_integer_kind(value) && is_integer_kind(divisor) {
        return match (value.as_bigint(), divisor.as_bigint()) {
            (Some(v), Some(d)) if !d.is_zero() => (v % d).is_zero(),
            _ => false,
        };
    }
    let (Some(v), Some(d)) = (value.as_f64(), divisor.as_f64()) else {
        return false;
    };
    if d == 0.0 || !v.is_finite() || !d.is_finite() {
        return false;
    }
    // Scale both sides to integers so 0.3 is a multiple of 0.1.
    let factor = 10f64.powi(decimals(v).max(decimals(d)));
    let (v, d) = ((v * factor).round(), (d * factor).round());
    d != 0.0 && v % d == 0.0
}

fn origin_for(code: TypeCode, value: &Value) -> Origin {
    match (code, value) {
        (TypeCode::Record, _) => Origin::Record,
        (TypeCode::Tuple, _) => Origin::Tuple,
        (TypeCode::Map, _) | (_, Value::Map(_)) => Origin::Map,
        (_, Value::String(_)) => Origin::String,
        (_, Value::Array(_)) => Origin::Array,
        (_, Value::Object(_)) => Origin::Object,
        (_, Value::BigInt(_)) => Origin::BigInt,
        (_, Value::Time(_)) => Origin::Date,
        _ => Origin::Number,
    }
}

/// Walk the check list of `schema` over the payload.
pub(crate) fn run_checks(schema: &Internals, payload: &mut Payload, ctx: &ParseCtx<'_>) {
    for check in &schema.checks {
        if payload.aborted() {
            break;
        }
        let origin = origin_for(schema.code, &payload.value);
        let outcome = check.evaluate(&payload.value, origin);
        for mut new in outcome.issues {
            if new.message.is_none() {
                new.message = check.def.message.clone();
            }
            if check.def.abort {
                new.fatal = true;
            }
            let issue = ctx.raise(schema, new, &payload.value);
            payload.issues.push(issue);
        }
        if let Some(value) = outcome.replacement {
            payload.value = value;
        }
    }
}

impl<T: Output> Schema<T> {
    /// Append a check.
    pub fn with(&self, check: Check) -> Schema<T> {
        self.derive(|i| i.checks.push(check))
    }

    /// Typed predicate over the base value.
    pub fn refine<F>(&self, predicate: F) -> Schema<T>
    where
        F: Fn(&T::Base) -> bool + Send + Sync + 'static,
    {
        self.refine_with(predicate, Refinement::default())
    }

    pub fn refine_with<F>(&self, predicate: F, refinement: Refinement) -> Schema<T>
    where
        F: Fn(&T::Base) -> bool + Send + Sync + 'static,
    {
        let untyped = move |v: &Value| {
            <T::Base as FromValue>::from_value(v.clone()).is_some_and(|base| predicate(&base))
        };
        self.with(Check::refine(untyped, refinement))
    }

    /// Rewrite the base value; values that do not convert are left alone.
    pub fn overwrite<F>(&self, f: F) -> Schema<T>
    where
        F: Fn(T::Base) -> T::Base + Send + Sync + 'static,
    {
        self.with(Check::overwrite(move |v: Value| {
            match <T::Base as FromValue>::from_value(v.clone()) {
                Some(base) => f(base).into(),
                None => v,
            }
        }))
    }

    /// Run a callback that may raise several issues or replace the value.
    pub fn check<F>(&self, f: F) -> Schema<T>
    where
        F: Fn(&mut CheckContext<'_>) + Send + Sync + 'static,
    {
        self.with(Check::callback(f))
    }
}

impl<T: Ordered> Schema<T> {
    pub fn gt(&self, limit: impl Into<Value>) -> Schema<T> {
        self.with(Check::gt(limit))
    }

    pub fn gte(&self, limit: impl Into<Value>) -> Schema<T> {
        self.with(Check::gte(limit))
    }

    pub fn lt(&self, limit: impl Into<Value>) -> Schema<T> {
        self.with(Check::lt(limit))
    }

    pub fn lte(&self, limit: impl Into<Value>) -> Schema<T> {
        self.with(Check::lte(limit))
    }

    /// Alias of [`gte`](Self::gte).
    pub fn min(&self, limit: impl Into<Value>) -> Schema<T> {
        self.gte(limit)
    }

    /// Alias of [`lte`](Self::lte).
    pub fn max(&self, limit: impl Into<Value>) -> Schema<T> {
        self.lte(limit)
    }

    pub fn positive(&self) -> Schema<T> {
        self.gt(0)
    }

    pub fn negative(&self) -> Schema<T> {
        self.lt(0)
    }

    pub fn nonnegative(&self) -> Schema<T> {
        self.gte(0)
    }

    pub fn nonpositive(&self) -> Schema<T> {
        self.lte(0)
    }

    pub fn multiple_of(&self, divisor: impl Into<Value>) -> Schema<T> {
        self.with(Check::multiple_of(divisor))
    }

    /// Alias of [`multiple_of`](Self::multiple_of).
    pub fn step(&self, divisor: impl Into<Value>) -> Schema<T> {
        self.multiple_of(divisor)
    }
}

impl<T: Measured> Schema<T> {
    pub fn min_length(&self, limit: usize) -> Schema<T> {
        self.with(Check::min_length(limit))
    }

    pub fn max_length(&self, limit: usize) -> Schema<T> {
        self.with(Check::max_length(limit))
    }

    pub fn length(&self, limit: usize) -> Schema<T> {
        self.with(Check::length(limit))
    }

    pub fn nonempty(&self) -> Schema<T> {
        self.min_length(1)
    }
}
