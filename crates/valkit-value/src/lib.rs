//! Tagged value model for valkit.
//!
//! Every input handed to a schema is first lowered into a [`Value`]: a small
//! closed set of variants (nil, booleans, the numeric family, strings, times,
//! arrays, insertion-ordered objects and keyed maps). This is the lowest layer
//! of valkit. Everything else builds on the [`Value`] type provided here.
//!
//! - [`convert`] — typed extraction ([`FromValue`]) across the primitive family
//! - [`coerce`] — the coercion rule table used by `coerce` schemas

pub mod coerce;
pub mod convert;
pub mod error;
pub mod value;

pub use coerce::BoolCoercion;
pub use convert::FromValue;
pub use error::{Result, ValueError};
pub use value::{compare, Map, Value};

pub use chrono::{DateTime, Utc};
pub use indexmap::IndexMap;
pub use num_bigint::BigInt;
