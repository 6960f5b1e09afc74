use crate::issue::Issue;
use crate::locale::{locale, Locale};
use crate::message::ErrorOverride;

/// Per-call settings applied when issues leave the parse boundary.
#[derive(Clone, Copy)]
pub struct FinalizeOptions<'a> {
    /// Override consulted after per-issue and per-schema overrides.
    pub call_error: Option<&'a ErrorOverride>,
    /// Locale used instead of the global one.
    pub locale: Option<&'a dyn Locale>,
    /// Keep the offending input on each issue.
    pub report_input: bool,
}

impl Default for FinalizeOptions<'_> {
    fn default() -> Self {
        Self {
            call_error: None,
            locale: None,
            report_input: true,
        }
    }
}

/// Assign a message to every issue, nested ones included.
///
/// The first source that yields a message wins: the issue's own override,
/// then the override of the schema that raised it, then the call-level
/// override, then the locale.
pub fn finalize(mut issues: Vec<Issue>, options: &FinalizeOptions<'_>) -> Vec<Issue> {
    let global = locale();
    let locale: &dyn Locale = options.locale.unwrap_or(global.as_ref());
    for issue in &mut issues {
        finalize_one(issue, options, locale);
    }
    issues
}

fn finalize_one(issue: &mut Issue, options: &FinalizeOptions<'_>, locale: &dyn Locale) {
    for nested in issue.kind.nested_mut() {
        for child in nested.iter_mut() {
            finalize_one(child, options, locale);
        }
    }

    let message = issue
        .message_override
        .as_ref()
        .and_then(|o| o.resolve(issue))
        .or_else(|| issue.schema_error.as_ref().and_then(|o| o.resolve(issue)))
        .or_else(|| options.call_error.and_then(|o| o.resolve(issue)))
        .unwrap_or_else(|| locale.message(issue));
    issue.message = message;

    if !options.report_input {
        issue.input = None;
    }
}

#[cfg(test)]
mod tests {
    use valkit_value::Value;

    use super::*;
    use crate::issue::{IssueKind, NewIssue};
    use crate::locale::TemplateLocale;
    use crate::path::Path;

    fn raw() -> Issue {
        Issue::new(IssueKind::invalid_type("string", "number"), Path::new(), Value::Int(1))
    }

    #[test]
    fn locale_is_the_last_resort() {
        let out = finalize(vec![raw()], &FinalizeOptions::default());
        assert_eq!(out[0].message, "Invalid input: expected string, received number");
    }

    #[test]
    fn precedence_issue_then_schema_then_call() {
        let call = ErrorOverride::text("call");
        let schema = ErrorOverride::text("schema");
        let options = FinalizeOptions {
            call_error: Some(&call),
            ..FinalizeOptions::default()
        };

        let mut with_schema = raw();
        with_schema.attach_schema_error(&schema);
        let issue_level = NewIssue::custom("issue").into_issue(&Path::new(), &Value::Nil);
        let mut issue_and_schema = issue_level.clone();
        issue_and_schema.attach_schema_error(&schema);

        let out = finalize(vec![raw(), with_schema, issue_and_schema], &options);
        assert_eq!(out[0].message, "call");
        assert_eq!(out[1].message, "schema");
        assert_eq!(out[2].message, "issue");
    }

    #[test]
    fn func_override_returning_none_defers() {
        let schema = ErrorOverride::func(|_| None);
        let mut issue = raw();
        issue.attach_schema_error(&schema);
        let locale = TemplateLocale::new().with(crate::IssueCode::InvalidType, "loc");
        let options = FinalizeOptions {
            locale: Some(&locale),
            ..FinalizeOptions::default()
        };
        let out = finalize(vec![issue], &options);
        assert_eq!(out[0].message, "loc");
    }

    #[test]
    fn nested_issues_are_finalised_and_input_dropped() {
        let union = Issue::new(
            IssueKind::InvalidUnion {
                errors: vec![vec![raw()]],
                note: None,
                discriminator: None,
            },
            Path::new(),
            Value::Int(1),
        );
        let options = FinalizeOptions {
            report_input: false,
            ..FinalizeOptions::default()
        };
        let out = finalize(vec![union], &options);
        assert_eq!(out[0].input, None);
        match &out[0].kind {
            IssueKind::InvalidUnion { errors, .. } => {
                assert!(errors[0][0].message.starts_with("Invalid input"));
                assert_eq!(errors[0][0].input, None);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
