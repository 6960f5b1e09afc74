use std::fmt;

use serde::{Deserialize, Serialize};
use valkit_value::{Map, Value};

use crate::message::ErrorOverride;
use crate::path::{Path, PathSegment};

/// Stable identifier of an issue kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidType,
    InvalidValue,
    InvalidFormat,
    InvalidUnion,
    InvalidKey,
    InvalidElement,
    UnrecognizedKeys,
    TooSmall,
    TooBig,
    NotMultipleOf,
    Custom,
    NonOptional,
}

impl IssueCode {
    pub const ALL: [IssueCode; 12] = [
        IssueCode::InvalidType,
        IssueCode::InvalidValue,
        IssueCode::InvalidFormat,
        IssueCode::InvalidUnion,
        IssueCode::InvalidKey,
        IssueCode::InvalidElement,
        IssueCode::UnrecognizedKeys,
        IssueCode::TooSmall,
        IssueCode::TooBig,
        IssueCode::NotMultipleOf,
        IssueCode::Custom,
        IssueCode::NonOptional,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::InvalidType => "invalid_type",
            IssueCode::InvalidValue => "invalid_value",
            IssueCode::InvalidFormat => "invalid_format",
            IssueCode::InvalidUnion => "invalid_union",
            IssueCode::InvalidKey => "invalid_key",
            IssueCode::InvalidElement => "invalid_element",
            IssueCode::UnrecognizedKeys => "unrecognized_keys",
            IssueCode::TooSmall => "too_small",
            IssueCode::TooBig => "too_big",
            IssueCode::NotMultipleOf => "not_multiple_of",
            IssueCode::Custom => "custom",
            IssueCode::NonOptional => "non_optional",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of value a size or key issue was raised against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    String,
    Number,
    Int,
    #[serde(rename = "bigint")]
    BigInt,
    Date,
    Array,
    Tuple,
    Object,
    Record,
    Map,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::String => "string",
            Origin::Number => "number",
            Origin::Int => "int",
            Origin::BigInt => "bigint",
            Origin::Date => "date",
            Origin::Array => "array",
            Origin::Tuple => "tuple",
            Origin::Object => "object",
            Origin::Record => "record",
            Origin::Map => "map",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code plus the per-code fields of an issue.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "code", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum IssueKind {
    InvalidType {
        expected: String,
        received: String,
    },
    InvalidValue {
        values: Vec<Value>,
    },
    InvalidFormat {
        format: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    InvalidUnion {
        #[serde(rename = "unionErrors")]
        errors: Vec<Vec<Issue>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        discriminator: Option<String>,
    },
    InvalidKey {
        origin: Origin,
        issues: Vec<Issue>,
    },
    InvalidElement {
        origin: Origin,
        key: Value,
        issues: Vec<Issue>,
    },
    UnrecognizedKeys {
        keys: Vec<String>,
    },
    TooSmall {
        origin: Origin,
        minimum: Value,
        inclusive: bool,
        exact: bool,
    },
    TooBig {
        origin: Origin,
        maximum: Value,
        inclusive: bool,
        exact: bool,
    },
    NotMultipleOf {
        origin: Origin,
        divisor: Value,
    },
    Custom {
        #[serde(skip_serializing_if = "Option::is_none")]
        params: Option<Map>,
    },
    NonOptional,
}

impl IssueKind {
    pub fn code(&self) -> IssueCode {
        match self {
            IssueKind::InvalidType { .. } => IssueCode::InvalidType,
            IssueKind::InvalidValue { .. } => IssueCode::InvalidValue,
            IssueKind::InvalidFormat { .. } => IssueCode::InvalidFormat,
            IssueKind::InvalidUnion { .. } => IssueCode::InvalidUnion,
            IssueKind::InvalidKey { .. } => IssueCode::InvalidKey,
            IssueKind::InvalidElement { .. } => IssueCode::InvalidElement,
            IssueKind::UnrecognizedKeys { .. } => IssueCode::UnrecognizedKeys,
            IssueKind::TooSmall { .. } => IssueCode::TooSmall,
            IssueKind::TooBig { .. } => IssueCode::TooBig,
            IssueKind::NotMultipleOf { .. } => IssueCode::NotMultipleOf,
            IssueKind::Custom { .. } => IssueCode::Custom,
            IssueKind::NonOptional => IssueCode::NonOptional,
        }
    }

    pub fn invalid_type(expected: impl Into<String>, received: impl Into<String>) -> Self {
        IssueKind::InvalidType {
            expected: expected.into(),
            received: received.into(),
        }
    }

    pub fn invalid_format(format: impl Into<String>) -> Self {
        IssueKind::InvalidFormat {
            format: format.into(),
            pattern: None,
        }
    }

    pub fn custom() -> Self {
        IssueKind::Custom { params: None }
    }

    /// Nested issue lists carried by union, key and element issues.
    pub fn nested(&self) -> Vec<&[Issue]> {
        match self {
            IssueKind::InvalidUnion { errors, .. } => errors.iter().map(Vec::as_slice).collect(),
            IssueKind::InvalidKey { issues, .. } | IssueKind::InvalidElement { issues, .. } => {
                vec![issues.as_slice()]
            }
            _ => Vec::new(),
        }
    }

    pub(crate) fn nested_mut(&mut self) -> Vec<&mut Vec<Issue>> {
        match self {
            IssueKind::InvalidUnion { errors, .. } => errors.iter_mut().collect(),
            IssueKind::InvalidKey { issues, .. } | IssueKind::InvalidElement { issues, .. } => {
                vec![issues]
            }
            _ => Vec::new(),
        }
    }
}

/// A single validation problem.
///
/// `message` is empty until the issue has been finalised at the parse
/// boundary. `continues` is `true` for non-fatal issues; a fatal issue stops
/// the frame that raised it.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    #[serde(flatten)]
    pub kind: IssueKind,
    pub path: Path,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(rename = "continue")]
    pub continues: bool,
    #[serde(skip)]
    pub(crate) message_override: Option<ErrorOverride>,
    #[serde(skip)]
    pub(crate) schema_error: Option<ErrorOverride>,
}

impl Issue {
    /// A fatal issue at `path`.
    pub fn new(kind: IssueKind, path: Path, input: Value) -> Self {
        Self {
            kind,
            path,
            message: String::new(),
            input: Some(input),
            continues: false,
            message_override: None,
            schema_error: None,
        }
    }

    pub fn code(&self) -> IssueCode {
        self.kind.code()
    }

    pub fn is_fatal(&self) -> bool {
        !self.continues
    }

    /// Attach a per-schema error override unless one is already set.
    ///
    /// Issues bubble up through every enclosing schema; the innermost
    /// schema's override is the one that applies.
    pub fn attach_schema_error(&mut self, error: &ErrorOverride) {
        if self.schema_error.is_none() {
            self.schema_error = Some(error.clone());
        }
    }

    pub fn has_message_override(&self) -> bool {
        self.message_override.is_some()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = if self.message.is_empty() {
            self.code().as_str()
        } else {
            self.message.as_str()
        };
        if self.path.is_empty() {
            f.write_str(message)
        } else {
            write!(f, "{message} (at {})", self.path)
        }
    }
}

/// An issue raised from user code (checks, refinements, transforms).
///
/// The path is relative to the value being checked; the engine prefixes the
/// current parse path when the issue is recorded.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub kind: IssueKind,
    pub message: Option<ErrorOverride>,
    pub path: Vec<PathSegment>,
    pub fatal: bool,
    pub input: Option<Value>,
}

impl NewIssue {
    pub fn new(kind: IssueKind) -> Self {
        Self {
            kind,
            message: None,
            path: Vec::new(),
            fatal: false,
            input: None,
        }
    }

    /// A `custom` issue with a fixed message.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(IssueKind::custom()).message(message)
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(ErrorOverride::Text(message.into()));
        self
    }

    pub fn message_override(mut self, message: ErrorOverride) -> Self {
        self.message = Some(message);
        self
    }

    pub fn at(mut self, segment: impl Into<PathSegment>) -> Self {
        self.path.push(segment.into());
        self
    }

    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    pub fn input(mut self, input: impl Into<Value>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Attach `params` to a `custom` issue. Ignored for other kinds.
    pub fn params(mut self, params: Map) -> Self {
        if let IssueKind::Custom { params: slot } = &mut self.kind {
            *slot = Some(params);
        }
        self
    }

    /// Materialise the issue under `base` with `input` as the default input.
    pub fn into_issue(self, base: &Path, input: &Value) -> Issue {
        let mut path = base.clone();
        for segment in self.path {
            path.push(segment);
        }
        Issue {
            kind: self.kind,
            path,
            message: String::new(),
            input: Some(self.input.unwrap_or_else(|| input.clone())),
            continues: !self.fatal,
            message_override: self.message,
            schema_error: None,
        }
    }
}

impl From<String> for NewIssue {
    fn from(message: String) -> Self {
        NewIssue::custom(message)
    }
}

impl From<&str> for NewIssue {
    fn from(message: &str) -> Self {
        NewIssue::custom(message)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_with_code_tag_and_camel_case() {
        let nested = Issue::new(
            IssueKind::invalid_type("string", "number"),
            Path::new(),
            Value::Int(1),
        );
        let issue = Issue::new(
            IssueKind::InvalidUnion {
                errors: vec![vec![nested]],
                note: None,
                discriminator: None,
            },
            vec![PathSegment::from("a")].into(),
            Value::Int(1),
        );
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["code"], "invalid_union");
        assert_eq!(json["path"], json!(["a"]));
        assert_eq!(json["continue"], false);
        assert_eq!(json["unionErrors"][0][0]["code"], "invalid_type");
        assert_eq!(json["unionErrors"][0][0]["expected"], "string");
        assert!(json.get("note").is_none());
    }

    #[test]
    fn non_optional_serializes_code_only() {
        let issue = Issue::new(IssueKind::NonOptional, Path::new(), Value::Nil);
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["code"], "non_optional");
        assert_eq!(json["input"], json!(null));
    }

    #[test]
    fn new_issue_prefixes_base_path() {
        let base: Path = vec![PathSegment::from("user")].into();
        let issue = NewIssue::custom("bad")
            .at("password")
            .into_issue(&base, &Value::from("x"));
        assert_eq!(issue.path.to_string(), "user.password");
        assert!(issue.continues);
        assert_eq!(issue.input, Some(Value::from("x")));
        assert!(issue.has_message_override());
    }

    #[test]
    fn size_issue_fields_are_camel_case() {
        let issue = Issue::new(
            IssueKind::TooSmall {
                origin: Origin::BigInt,
                minimum: Value::Int(3),
                inclusive: true,
                exact: false,
            },
            Path::new(),
            Value::Int(1),
        );
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["origin"], "bigint");
        assert_eq!(json["minimum"], 3);
        assert_eq!(json["inclusive"], true);
    }
}
