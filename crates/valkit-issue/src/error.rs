use std::error::Error;

use crate::issue::{Issue, IssueCode};
use crate::report::{self, prettify, FlattenedError, FormattedError};

/// Validation failure returned from every parse entry point.
///
/// Carries the finalised issues in emission order. `Display` renders them
/// one per line with their paths.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", prettify(.issues))]
pub struct ParseError {
    issues: Vec<Issue>,
}

impl ParseError {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    /// Codes of the top-level issues, in order.
    pub fn codes(&self) -> Vec<IssueCode> {
        self.issues.iter().map(Issue::code).collect()
    }

    /// True if any top-level issue has `code`.
    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|issue| issue.code() == code)
    }

    pub fn flatten(&self) -> FlattenedError {
        report::flatten(&self.issues)
    }

    pub fn format(&self) -> FormattedError {
        report::format(&self.issues)
    }
}

/// Errors that carry a list of validation issues.
pub trait IssueReport: Error {
    fn issues(&self) -> &[Issue];
}

impl IssueReport for ParseError {
    fn issues(&self) -> &[Issue] {
        &self.issues
    }
}

/// Recognise a [`ParseError`] behind a type-erased error.
pub fn is_parse_error(err: &(dyn Error + 'static)) -> bool {
    as_parse_error(err).is_some()
}

pub fn as_parse_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a ParseError> {
    err.downcast_ref::<ParseError>()
}

pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use valkit_value::Value;

    use super::*;
    use crate::issue::IssueKind;
    use crate::path::Path;

    #[test]
    fn recognised_through_dyn_error() {
        let err = ParseError::new(vec![Issue::new(
            IssueKind::NonOptional,
            Path::new(),
            Value::Nil,
        )]);
        let boxed: Box<dyn Error + Send + Sync> = Box::new(err);
        assert!(is_parse_error(boxed.as_ref()));
        assert!(as_parse_error(boxed.as_ref())
            .unwrap()
            .has_code(IssueCode::NonOptional));

        let io: Box<dyn Error> = Box::new(std::io::Error::other("x"));
        assert!(!is_parse_error(io.as_ref()));
    }
}
