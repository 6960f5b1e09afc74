//! Composable schemas and the engine that parses values with them.
//!
//! A [`Schema<T>`] is an immutable, cheaply cloned description of accepted
//! input. Every builder method returns a new schema; the receiver is never
//! changed. Parsing walks the schema tree over a [`Value`], collecting
//! [`Issue`]s with paths, and either produces a `T` or a [`ParseError`].
//!
//! ```ignore
//! use valkit_schema::{int, object, string, Shape};
//!
//! let user = object(
//!     Shape::new()
//!         .field("name", string().min(1))
//!         .field("age", int().nonnegative().optional()),
//! );
//! let out = user.parse(serde_json::json!({"name": "ada"}))?;
//! ```
//!
//! Construction problems (bad regex, overlapping discriminators, object
//! modifiers on non-objects) are reported as [`SchemaError`]; parse
//! problems never are.

pub mod array;
pub mod checks;
pub mod coerce;
pub mod compose;
pub mod config;
mod engine;
pub mod error;
pub mod formats;
pub mod modifiers;
pub mod number;
pub mod object;
pub mod output;
pub mod primitive;
pub mod record;
pub mod registry;
pub mod schema;
pub mod string;
pub mod union;
pub mod validator;

pub use array::{array, tuple};
pub use checks::{Check, CheckContext, CheckFn, OverwriteFn, RefineFn, Refinement};
pub use compose::{intersection, lazy, pipe, transform, TransformContext, TransformFailure};
pub use config::ParseConfig;
pub use error::{Result, SchemaError};
pub use formats::{
    DatePrecision, DatetimeOptions, DurationOptions, Format, Precision, UrlOptions,
};
pub use number::{
    float32, float64, int, int16, int32, int64, int8, number, uint, uint16, uint32, uint64,
    uint8,
};
pub use object::{object, strict_object, Shape, UnknownKeys};
pub use output::{Measured, Ordered, Output};
pub use primitive::{
    any, bigint, boolean, date, enumeration, literal, literals, never, nil, string, unknown,
    IntoLiteral,
};
pub use record::{loose_record, map, partial_record, record};
pub use registry::{global_registry, Metadata, MetadataRegistry};
pub use schema::{CatchContext, IntoSchema, Schema, SchemaId, TypeCode};
pub use string::{
    base64, base64url, cidrv4, cidrv6, cuid, cuid2, e164, email, emoji, guid, hex, ipv4, ipv6,
    iso_date, iso_date_with, iso_datetime, iso_datetime_with, iso_duration, iso_duration_with,
    iso_time, iso_time_with, jwt, jwt_alg, ksuid, nanoid, ulid, url, url_with, uuid,
    uuid_version, xid,
};
pub use union::{discriminated_union, union, xor};

pub use valkit_issue::{Issue, IssueCode, IssueKind, NewIssue, ParseError, Path, PathSegment};
pub use valkit_value::{Map, Value};
