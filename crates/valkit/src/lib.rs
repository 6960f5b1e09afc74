//! Composable runtime schemas for parsing and validating dynamic values.
//!
//! valkit describes the shape of untrusted input (decoded JSON, form data,
//! config files) as immutable schema values, then parses input into typed
//! output or a structured list of issues.
//!
//! # Crate Structure
//!
//! - [`value`]: the tagged value model schemas operate on
//! - [`issue`]: issues, paths, message overrides, locales and `ParseError`
//! - [`schema`]: schema builders and the parse engine
//! - [`logging`]: `tracing-subscriber` setup (behind the `logging` feature)

/// Re-export value types.
pub mod value {
    pub use valkit_value::*;
}

/// Re-export issue types.
pub mod issue {
    pub use valkit_issue::*;
}

/// Re-export schema builders.
pub mod schema {
    pub use valkit_schema::*;
}

/// The builders and types most callers need.
pub mod prelude {
    pub use valkit_issue::{IssueCode, IssueKind, ParseError};
    pub use valkit_schema::{
        array, boolean, discriminated_union, enumeration, float64, int, literal, object, record,
        string, union, IntoSchema, ParseConfig, Schema, Shape,
    };
    pub use valkit_value::{Map, Value};
}

#[cfg(feature = "logging")]
pub mod logging;
