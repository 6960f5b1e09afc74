use valkit_value::{BigInt, DateTime, FromValue, IndexMap, Utc, Value};

/// A type a schema can produce.
///
/// `Base` is the type with any `Option` layers removed: refinements,
/// defaults and `non_optional` work in terms of it.
pub trait Output: FromValue + Into<Value> + 'static {
    type Base: Output;
}

/// Outputs with a natural order: value bounds (`gt`, `min`, ...) apply.
pub trait Ordered: Output {}

/// Outputs with a size: length bounds (`min_length`, ...) apply.
pub trait Measured: Output {}

macro_rules! leaf_output {
    ($($t:ty),* $(,)?) => {
        $(impl Output for $t {
            type Base = $t;
        })*
    };
}

leaf_output!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String, BigInt, DateTime<Utc>, Value);

impl<T: Output> Output for Vec<T> {
    type Base = Vec<T>;
}

impl<T: Output> Output for IndexMap<String, T> {
    type Base = IndexMap<String, T>;
}

impl<T: Output> Output for Option<T> {
    type Base = T::Base;
}

macro_rules! ordered {
    ($($t:ty),* $(,)?) => {
        $(impl Ordered for $t {})*
    };
}

ordered!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, BigInt, DateTime<Utc>);

impl<T: Ordered> Ordered for Option<T> {}

impl Measured for String {}
impl<T: Output> Measured for Vec<T> {}
impl<T: Output> Measured for IndexMap<String, T> {}
impl<T: Measured> Measured for Option<T> {}
