//! Parse entry points.
//!
//! Every entry point runs the engine from an empty path, finalises the
//! issues (messages, input reporting) and, for typed results, converts the
//! output value into `T`.

use valkit_issue::{finalize, FinalizeOptions, Issue, NewIssue, ParseError, Path};
use valkit_value::Value;

use crate::config::ParseConfig;
use crate::engine::{run, ParseCtx};
use crate::output::Output;
use crate::schema::Schema;

fn finish(issues: Vec<Issue>, config: &ParseConfig) -> ParseError {
    let options = FinalizeOptions {
        call_error: config.error.as_ref(),
        locale: config.locale.as_deref(),
        report_input: config.report_input,
    };
    ParseError::new(finalize(issues, &options))
}

impl<T> Schema<T> {
    /// Run the engine and return the untyped output.
    pub fn parse_value(&self, input: Value, config: &ParseConfig) -> Result<Value, ParseError> {
        let mut ctx = ParseCtx::new(config);
        let payload = run(&self.inner, input, &mut ctx);
        if payload.is_ok() {
            Ok(payload.value)
        } else {
            Err(finish(payload.issues, config))
        }
    }

    /// Parse and return the untyped output.
    pub fn parse_any(&self, input: impl Into<Value>) -> Result<Value, ParseError> {
        self.parse_value(input.into(), &ParseConfig::default())
    }
}

impl<T: Output> Schema<T> {
    pub fn parse(&self, input: impl Into<Value>) -> Result<T, ParseError> {
        self.parse_with(input, &ParseConfig::default())
    }

    pub fn parse_with(&self, input: impl Into<Value>, config: &ParseConfig) -> Result<T, ParseError> {
        let value = self.parse_value(input.into(), config)?;
        match T::from_value(value.clone()) {
            Some(out) => Ok(out),
            None => {
                let new = NewIssue::custom(format!(
                    "output of {} schema does not convert to the declared type",
                    self.type_code()
                ))
                .fatal();
                Err(finish(vec![new.into_issue(&Path::new(), &value)], config))
            }
        }
    }

    /// Parse an already-typed value.
    pub fn strict_parse(&self, input: T) -> Result<T, ParseError> {
        self.parse(input)
    }

    /// Parse, panicking with the [`ParseError`] as payload on failure.
    pub fn must_parse(&self, input: impl Into<Value>) -> T {
        match self.parse(input) {
            Ok(out) => out,
            Err(err) => std::panic::panic_any(err),
        }
    }

    pub fn is_valid(&self, input: impl Into<Value>) -> bool {
        self.parse_value(input.into(), &ParseConfig::default())
            .is_ok()
    }
}
