use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::value::{Map, Value};

/// Typed extraction from an already-validated [`Value`].
///
/// Returns `None` when the value does not have the shape of `Self`. Integer
/// targets reject out-of-range and fractional inputs rather than truncating.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

fn integral_i128(value: &Value) -> Option<i128> {
    match value {
        Value::Int(i) => Some(i128::from(*i)),
        Value::Uint(u) => Some(i128::from(*u)),
        Value::BigInt(b) => b.to_i128(),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => f.to_i128(),
        _ => None,
    }
}

macro_rules! int_from_value {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: Value) -> Option<Self> {
                    integral_i128(&value).and_then(|i| <$t>::try_from(i).ok())
                }
            }
        )*
    };
}

int_from_value!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::BigInt(_) => None,
            other => other.as_f64(),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Option<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for BigInt {
    fn from_value(value: Value) -> Option<Self> {
        value.as_bigint()
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Time(t) => Some(t),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Nil => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(xs) => xs.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(m) => m
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Some((String::from_value(k)?, T::from_value(v)?)))
                .collect(),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Uint,
    u16 => Uint,
    u32 => Uint,
    u64 => Uint,
    f32 => Float,
    f64 => Float,
    String => String,
    BigInt => BigInt,
    DateTime<Utc> => Time,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(xs: Vec<T>) -> Self {
        Value::Array(xs.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<IndexMap<String, T>> for Value {
    fn from(m: IndexMap<String, T>) -> Self {
        Value::Object(m.into_iter().map(|(k, v)| (k, v.into())).collect::<Map>())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_targets_reject_out_of_range() {
        assert_eq!(u8::from_value(Value::Int(255)), Some(255));
        assert_eq!(u8::from_value(Value::Int(256)), None);
        assert_eq!(i8::from_value(Value::Int(-129)), None);
        assert_eq!(u64::from_value(Value::Int(-1)), None);
    }

    #[test]
    fn integer_targets_accept_integral_floats_only() {
        assert_eq!(i32::from_value(Value::Float(3.0)), Some(3));
        assert_eq!(i32::from_value(Value::Float(3.5)), None);
    }

    #[test]
    fn option_maps_nil_to_none() {
        assert_eq!(Option::<String>::from_value(Value::Nil), Some(None));
        assert_eq!(
            Option::<String>::from_value(Value::from("x")),
            Some(Some("x".to_owned()))
        );
        assert_eq!(Option::<String>::from_value(Value::Int(1)), None);
    }

    #[test]
    fn nested_collections_extract() {
        let v = Value::from(vec![vec![1i64, 2], vec![3]]);
        assert_eq!(
            Vec::<Vec<i64>>::from_value(v),
            Some(vec![vec![1, 2], vec![3]])
        );

        let mut m = IndexMap::new();
        m.insert("a".to_owned(), 1.5f64);
        let v = Value::from(m.clone());
        assert_eq!(IndexMap::<String, f64>::from_value(v), Some(m));
    }
}
