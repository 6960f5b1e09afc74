use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;
use valkit_value::Value;

use crate::issue::{Issue, IssueCode, IssueKind, Origin};
use crate::message::render_template;

/// Produces the default message for an issue.
pub trait Locale: Send + Sync {
    fn message(&self, issue: &Issue) -> String;
}

impl<F> Locale for F
where
    F: Fn(&Issue) -> String + Send + Sync,
{
    fn message(&self, issue: &Issue) -> String {
        self(issue)
    }
}

static GLOBAL_LOCALE: Lazy<RwLock<Arc<dyn Locale>>> =
    Lazy::new(|| RwLock::new(Arc::new(English)));

/// Install the process-wide locale used when a parse call supplies none.
pub fn set_locale(locale: impl Locale + 'static) {
    *GLOBAL_LOCALE.write() = Arc::new(locale);
    debug!("global locale replaced");
}

/// Restore the built-in English locale.
pub fn reset_locale() {
    set_locale(English);
}

/// The currently installed process-wide locale.
pub fn locale() -> Arc<dyn Locale> {
    GLOBAL_LOCALE.read().clone()
}

/// Built-in English messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct English;

fn size_unit(origin: Origin) -> Option<&'static str> {
    match origin {
        Origin::String => Some("characters"),
        Origin::Array | Origin::Tuple => Some("items"),
        Origin::Object | Origin::Record | Origin::Map => Some("entries"),
        _ => None,
    }
}

fn bound_message(prefix: &str, origin: Origin, relation: &str, bound: &Value) -> String {
    match size_unit(origin) {
        Some(unit) if !matches!(bound, Value::String(_)) => {
            format!("{prefix}: expected {origin} to have {relation}{bound} {unit}")
        }
        _ => format!("{prefix}: expected {origin} to be {relation}{bound}"),
    }
}

fn format_noun(format: &str) -> &str {
    match format {
        "regex" => "input",
        "email" => "email address",
        "url" => "URL",
        "emoji" => "emoji",
        "uuid" => "UUID",
        "guid" => "GUID",
        "nanoid" => "nanoid",
        "cuid" => "cuid",
        "cuid2" => "cuid2",
        "ulid" => "ULID",
        "xid" => "XID",
        "ksuid" => "KSUID",
        "datetime" => "ISO datetime",
        "date" => "ISO date",
        "time" => "ISO time",
        "duration" => "ISO duration",
        "ipv4" => "IPv4 address",
        "ipv6" => "IPv6 address",
        "cidrv4" => "IPv4 range",
        "cidrv6" => "IPv6 range",
        "base64" => "base64-encoded string",
        "base64url" => "base64url-encoded string",
        "hex" => "hexadecimal string",
        "jwt" => "JWT",
        "e164" => "E.164 number",
        other => other,
    }
}

impl Locale for English {
    fn message(&self, issue: &Issue) -> String {
        match &issue.kind {
            IssueKind::InvalidType { expected, received } => {
                format!("Invalid input: expected {expected}, received {received}")
            }
            IssueKind::InvalidValue { values } if values.len() == 1 => {
                format!("Invalid input: expected {}", values[0])
            }
            IssueKind::InvalidValue { values } => {
                let options: Vec<String> = values.iter().map(Value::to_string).collect();
                format!("Invalid option: expected one of {}", options.join("|"))
            }
            IssueKind::InvalidFormat { format, pattern } => match (format.as_str(), pattern) {
                ("starts_with", Some(p)) => format!("Invalid string: must start with {p:?}"),
                ("ends_with", Some(p)) => format!("Invalid string: must end with {p:?}"),
                ("includes", Some(p)) => format!("Invalid string: must include {p:?}"),
                ("regex", Some(p)) => format!("Invalid string: must match pattern {p}"),
                ("lowercase", _) => "Invalid string: must be lowercase".to_owned(),
                ("uppercase", _) => "Invalid string: must be uppercase".to_owned(),
                (name, _) => format!("Invalid {}", format_noun(name)),
            },
            IssueKind::InvalidUnion { note, .. } => match note {
                Some(note) => format!("Invalid input: {}", note.to_lowercase()),
                None => "Invalid input".to_owned(),
            },
            IssueKind::InvalidKey { origin, .. } => format!("Invalid key in {origin}"),
            IssueKind::InvalidElement { origin, .. } => format!("Invalid value in {origin}"),
            IssueKind::UnrecognizedKeys { keys } => {
                let quoted: Vec<String> = keys.iter().map(|k| format!("{k:?}")).collect();
                let plural = if keys.len() == 1 { "" } else { "s" };
                format!("Unrecognized key{plural}: {}", quoted.join(", "))
            }
            IssueKind::TooSmall {
                origin,
                minimum,
                inclusive,
                exact,
            } => {
                let relation = match (exact, inclusive) {
                    (true, _) => "exactly ",
                    (false, true) => ">=",
                    (false, false) => ">",
                };
                bound_message("Too small", *origin, relation, minimum)
            }
            IssueKind::TooBig {
                origin,
                maximum,
                inclusive,
                exact,
            } => {
                let relation = match (exact, inclusive) {
                    (true, _) => "exactly ",
                    (false, true) => "<=",
                    (false, false) => "<",
                };
                bound_message("Too big", *origin, relation, maximum)
            }
            IssueKind::NotMultipleOf { divisor, .. } => {
                format!("Invalid number: must be a multiple of {divisor}")
            }
            IssueKind::Custom { .. } => "Invalid input".to_owned(),
            IssueKind::NonOptional => "Invalid input: expected a value, received nil".to_owned(),
        }
    }
}

/// A locale built from per-code templates, falling back to another locale
/// for codes it does not list.
#[derive(Clone)]
pub struct TemplateLocale {
    templates: HashMap<IssueCode, String>,
    fallback: Arc<dyn Locale>,
}

impl TemplateLocale {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
            fallback: Arc::new(English),
        }
    }

    pub fn with(mut self, code: IssueCode, template: impl Into<String>) -> Self {
        self.templates.insert(code, template.into());
        self
    }

    pub fn with_fallback(mut self, fallback: impl Locale + 'static) -> Self {
        self.fallback = Arc::new(fallback);
        self
    }
}

impl Default for TemplateLocale {
    fn default() -> Self {
        Self::new()
    }
}

impl Locale for TemplateLocale {
    fn message(&self, issue: &Issue) -> String {
        match self.templates.get(&issue.code()) {
            Some(template) => render_template(template, issue),
            None => self.fallback.message(issue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;

    fn issue(kind: IssueKind) -> Issue {
        Issue::new(kind, Path::new(), Value::Nil)
    }

    #[test]
    fn english_size_messages_name_units() {
        let msg = English.message(&issue(IssueKind::TooSmall {
            origin: Origin::String,
            minimum: Value::Int(3),
            inclusive: true,
            exact: false,
        }));
        assert_eq!(msg, "Too small: expected string to have >=3 characters");

        let msg = English.message(&issue(IssueKind::TooBig {
            origin: Origin::Number,
            maximum: Value::Int(100),
            inclusive: false,
            exact: false,
        }));
        assert_eq!(msg, "Too big: expected number to be <100");
    }

    #[test]
    fn english_unrecognized_keys_are_quoted() {
        let msg = English.message(&issue(IssueKind::UnrecognizedKeys {
            keys: vec!["x".into(), "y".into()],
        }));
        assert_eq!(msg, r#"Unrecognized keys: "x", "y""#);
    }

    #[test]
    fn template_locale_falls_back() {
        let locale = TemplateLocale::new().with(IssueCode::InvalidType, "want {expected}");
        let msg = locale.message(&issue(IssueKind::invalid_type("string", "nil")));
        assert_eq!(msg, "want string");
        let msg = locale.message(&issue(IssueKind::custom()));
        assert_eq!(msg, "Invalid input");
    }
}
