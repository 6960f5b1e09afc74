//! Validation issues and the error report built from them.
//!
//! Schemas raise raw [`Issue`]s while parsing: a code, the path into the
//! input, the offending input and per-code fields. At the parse boundary the
//! issues are finalised (messages resolved through overrides and the active
//! [`Locale`]) and wrapped in a [`ParseError`].
//!
//! The wire shape of an issue is stable: `{code, path, message, input?,
//! continue, ...per-code fields}`.

pub mod error;
pub mod finalize;
pub mod issue;
pub mod locale;
pub mod message;
pub mod path;
pub mod report;

pub use error::{as_parse_error, is_parse_error, IssueReport, ParseError, Result};
pub use finalize::{finalize, FinalizeOptions};
pub use issue::{Issue, IssueCode, IssueKind, NewIssue, Origin};
pub use locale::{locale, reset_locale, set_locale, English, Locale, TemplateLocale};
pub use message::{render_template, ErrorOverride, MessageFn};
pub use path::{Path, PathSegment};
pub use report::{prettify, FlattenedError, FormattedError};
