use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use valkit_value::Value;

use crate::issue::{Issue, IssueCode, IssueKind};

pub type MessageFn = Arc<dyn Fn(&Issue) -> Option<String> + Send + Sync>;

/// A user-supplied replacement for the locale message of an issue.
///
/// Text and map templates may reference issue fields with `{name}`
/// placeholders: `code`, `path`, `input`, `expected`, `received`,
/// `minimum`, `maximum`, `origin`, `format`, `divisor`, `keys`, `values`.
#[derive(Clone)]
pub enum ErrorOverride {
    /// One template for every issue.
    Text(String),
    /// Computed message; `None` defers to the next level.
    Func(MessageFn),
    /// Template per issue code; unlisted codes defer to the next level.
    Map(HashMap<IssueCode, String>),
}

impl ErrorOverride {
    pub fn text(template: impl Into<String>) -> Self {
        ErrorOverride::Text(template.into())
    }

    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Issue) -> Option<String> + Send + Sync + 'static,
    {
        ErrorOverride::Func(Arc::new(f))
    }

    pub fn map<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (IssueCode, S)>,
        S: Into<String>,
    {
        ErrorOverride::Map(entries.into_iter().map(|(c, s)| (c, s.into())).collect())
    }

    /// The message this override produces for `issue`, if any.
    pub fn resolve(&self, issue: &Issue) -> Option<String> {
        match self {
            ErrorOverride::Text(template) => Some(render_template(template, issue)),
            ErrorOverride::Func(f) => f(issue),
            ErrorOverride::Map(templates) => templates
                .get(&issue.code())
                .map(|template| render_template(template, issue)),
        }
    }
}

impl fmt::Debug for ErrorOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorOverride::Text(t) => f.debug_tuple("Text").field(t).finish(),
            ErrorOverride::Func(_) => f.write_str("Func(..)"),
            ErrorOverride::Map(m) => f.debug_tuple("Map").field(m).finish(),
        }
    }
}

impl From<&str> for ErrorOverride {
    fn from(template: &str) -> Self {
        ErrorOverride::text(template)
    }
}

impl From<String> for ErrorOverride {
    fn from(template: String) -> Self {
        ErrorOverride::Text(template)
    }
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

/// Value of a named placeholder for `issue`, if the issue carries it.
pub fn placeholder(issue: &Issue, name: &str) -> Option<String> {
    let value = match (name, &issue.kind) {
        ("code", kind) => kind.code().to_string(),
        ("path", _) => issue.path.to_string(),
        ("input", _) => issue.input.as_ref().map(Value::to_string)?,
        ("expected", IssueKind::InvalidType { expected, .. }) => expected.clone(),
        ("received", IssueKind::InvalidType { received, .. }) => received.clone(),
        ("minimum", IssueKind::TooSmall { minimum, .. }) => minimum.to_string(),
        ("maximum", IssueKind::TooBig { maximum, .. }) => maximum.to_string(),
        ("origin", IssueKind::TooSmall { origin, .. })
        | ("origin", IssueKind::TooBig { origin, .. })
        | ("origin", IssueKind::NotMultipleOf { origin, .. })
        | ("origin", IssueKind::InvalidKey { origin, .. })
        | ("origin", IssueKind::InvalidElement { origin, .. }) => origin.to_string(),
        ("format", IssueKind::InvalidFormat { format, .. }) => format.clone(),
        ("divisor", IssueKind::NotMultipleOf { divisor, .. }) => divisor.to_string(),
        ("keys", IssueKind::UnrecognizedKeys { keys }) => keys.join(", "),
        ("values", IssueKind::InvalidValue { values }) => join_values(values),
        _ => return None,
    };
    Some(value)
}

/// Substitute `{name}` placeholders; unknown placeholders are kept verbatim.
pub fn render_template(template: &str, issue: &Issue) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let name_len = after
            .find(|c: char| !c.is_ascii_lowercase())
            .unwrap_or(after.len());
        let name = &after[..name_len];
        let closed = after[name_len..].starts_with('}');
        match placeholder(issue, name).filter(|_| closed && !name.is_empty()) {
            Some(value) => {
                out.push_str(&value);
                rest = &after[name_len + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
