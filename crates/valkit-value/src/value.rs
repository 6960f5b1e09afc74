use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, ValueError};

/// Insertion-ordered object map.
pub type Map = IndexMap<String, Value>;

/// An untyped input or output value.
///
/// Objects keep their insertion order, so the declared field order of an
/// object schema is observable in parse output.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value (JSON `null`).
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    /// Arbitrary-precision integer.
    BigInt(BigInt),
    String(String),
    Time(DateTime<Utc>),
    Array(Vec<Value>),
    /// String-keyed object.
    Object(Map),
    /// Keyed map with arbitrary (non-string) keys, kept in insertion order.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Parse JSON text into a value.
    pub fn from_json_str(src: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(src)?;
        Ok(Self::from(json))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// True for `Int`, `Uint` and `Float` (NaN included).
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Uint(_) | Value::Float(_))
    }

    /// True for `Int`, `Uint`, `BigInt` and floats without a fractional part.
    pub fn is_integral(&self) -> bool {
        match self {
            Value::Int(_) | Value::Uint(_) | Value::BigInt(_) => true,
            Value::Float(f) => f.is_finite() && f.fract() == 0.0,
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of `Int`, in-range `Uint` and in-range `BigInt`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Uint(u) => i64::try_from(*u).ok(),
            Value::BigInt(b) => b.to_i64(),
            _ => None,
        }
    }

    /// Unsigned view of `Uint`, non-negative `Int` and in-range `BigInt`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(u) => Some(*u),
            Value::Int(i) => u64::try_from(*i).ok(),
            Value::BigInt(b) => b.to_u64(),
            _ => None,
        }
    }

    /// Float view of every numeric variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Uint(u) => Some(*u as f64),
            Value::BigInt(b) => b.to_f64(),
            _ => None,
        }
    }

    pub fn as_bigint(&self) -> Option<BigInt> {
        match self {
            Value::BigInt(b) => Some(b.clone()),
            Value::Int(i) => Some(BigInt::from(*i)),
            Value::Uint(u) => Some(BigInt::from(*u)),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Time(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Object(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a field of an object value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|m| m.get(key))
    }

    /// Name of the received type, as reported in `invalid_type` issues.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Float(f) if f.is_nan() => "nan",
            Value::Int(_) | Value::Uint(_) | Value::Float(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Time(_) => "date",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Map(_) => "map",
        }
    }

    /// Number of characters, elements or entries; `None` for scalars.
    pub fn size(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(xs) => Some(xs.len()),
            Value::Object(m) => Some(m.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Deep equality with numeric normalisation: `Int(1)`, `Uint(1)`,
    /// `Float(1.0)` and `BigInt(1)` are all equivalent.
    pub fn equivalent(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if is_numeric(a) && is_numeric(b) => {
                compare(a, b) == Some(Ordering::Equal)
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equivalent(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.equivalent(w)))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka.equivalent(kb) && va.equivalent(vb))
            }
            (a, b) => a == b,
        }
    }

    /// Render a value used as a record or map key.
    pub fn key_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Convert into a JSON value.
    ///
    /// Big integers become decimal strings, times RFC 3339 strings and keyed
    /// maps arrays of `[key, value]` pairs.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        use serde_json::Value as Json;
        Ok(match self {
            Value::Nil => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Uint(u) => Json::from(*u),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .ok_or(ValueError::NonFiniteFloat(*f))?,
            Value::BigInt(b) => Json::String(b.to_string()),
            Value::String(s) => Json::String(s.clone()),
            Value::Time(t) => Json::String(format_time(t)),
            Value::Array(xs) => Json::Array(xs.iter().map(Value::to_json).collect::<Result<_>>()?),
            Value::Object(m) => {
                let mut out = serde_json::Map::with_capacity(m.len());
                for (k, v) in m {
                    out.insert(k.clone(), v.to_json()?);
                }
                Json::Object(out)
            }
            Value::Map(entries) => Json::Array(
                entries
                    .iter()
                    .map(|(k, v)| Ok(Json::Array(vec![k.to_json()?, v.to_json()?])))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Convert a keyed map whose keys are all strings into an object.
    pub fn map_into_object(entries: Vec<(Value, Value)>) -> Result<Map> {
        let mut out = Map::with_capacity(entries.len());
        for (k, v) in entries {
            match k {
                Value::String(s) => {
                    out.insert(s, v);
                }
                other => return Err(ValueError::NonStringKey(other.type_name())),
            }
        }
        Ok(out)
    }
}

fn is_numeric(v: &Value) -> bool {
    matches!(
        v,
        Value::Int(_) | Value::Uint(_) | Value::Float(_) | Value::BigInt(_)
    )
}

fn as_i128(v: &Value) -> Option<i128> {
    match v {
        Value::Int(i) => Some(i128::from(*i)),
        Value::Uint(u) => Some(i128::from(*u)),
        Value::BigInt(b) => b.to_i128(),
        _ => None,
    }
}

/// Order two values of compatible kinds.
///
/// Integers compare exactly (including big integers), mixed integer/float
/// pairs compare as floats, strings compare lexicographically and times
/// chronologically. Incompatible kinds and NaN yield `None`.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Time(x), Value::Time(y)) => Some(x.cmp(y)),
        (x, y) if is_numeric(x) && is_numeric(y) => {
            if let (Some(i), Some(j)) = (as_i128(x), as_i128(y)) {
                return Some(i.cmp(&j));
            }
            let both_integers = !matches!(x, Value::Float(_)) && !matches!(y, Value::Float(_));
            if both_integers {
                return Some(x.as_bigint()?.cmp(&y.as_bigint()?));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        _ => None,
    }
}

pub(crate) fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::BigInt(b) => write!(f, "{b}n"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Time(t) => f.write_str(&format_time(t)),
            Value::Array(xs) => {
                f.write_str("[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{x}")?;
                }
                f.write_str("]")
            }
            Value::Object(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{k:?}:{v}")?;
                }
                f.write_str("}")
            }
            Value::Map(entries) => {
                f.write_str("Map{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{k}=>{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Uint(u) => serializer.serialize_u64(*u),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::BigInt(b) => serializer.serialize_str(&b.to_string()),
            Value::String(s) => serializer.serialize_str(s),
            Value::Time(t) => serializer.serialize_str(&format_time(t)),
            Value::Array(xs) => xs.serialize(serializer),
            Value::Object(m) => m.serialize(serializer),
            Value::Map(entries) => entries.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Nil,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else {
                    n.as_f64().map_or(Value::Nil, Value::Float)
                }
            }
            Json::String(s) => Value::String(s),
            Json::Array(xs) => Value::Array(xs.into_iter().map(Value::from).collect()),
            Json::Object(m) => Value::Object(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_numbers_keep_their_kind() {
        assert_eq!(Value::from(json!(5)), Value::Int(5));
        assert_eq!(Value::from(json!(u64::MAX)), Value::Uint(u64::MAX));
        assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
    }

    #[test]
    fn objects_preserve_insertion_order() {
        let v = Value::from_json_str(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        let keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn equivalent_normalises_numbers() {
        assert!(Value::Int(1).equivalent(&Value::Float(1.0)));
        assert!(Value::Uint(7).equivalent(&Value::BigInt(BigInt::from(7))));
        assert!(!Value::Int(1).equivalent(&Value::String("1".into())));
        let a = Value::from(json!({"a": [1, 2.0]}));
        let b = Value::from(json!({"a": [1.0, 2]}));
        assert!(a.equivalent(&b));
    }

    #[test]
    fn compare_is_exact_for_large_integers() {
        let big = Value::Uint(u64::MAX);
        let smaller = Value::Uint(u64::MAX - 1);
        assert_eq!(compare(&big, &smaller), Some(Ordering::Greater));
        assert_eq!(compare(&Value::Int(-1), &Value::Uint(0)), Some(Ordering::Less));
        assert_eq!(
            compare(&Value::BigInt(BigInt::from(i128::MAX) * 4), &Value::Int(1)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn compare_strings_lexicographically() {
        let a = Value::String("2020-01-01".into());
        let b = Value::String("2021-01-01".into());
        assert_eq!(compare(&a, &b), Some(Ordering::Less));
        assert_eq!(compare(&a, &Value::Int(1)), None);
    }

    #[test]
    fn nan_type_name_and_json_rejection() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan.type_name(), "nan");
        assert!(matches!(nan.to_json(), Err(ValueError::NonFiniteFloat(_))));
    }

    #[test]
    fn bigint_serializes_as_decimal_string() {
        let v = Value::BigInt("123456789012345678901234567890".parse().unwrap());
        assert_eq!(
            serde_json::to_string(&v).unwrap(),
            r#""123456789012345678901234567890""#
        );
    }

    #[test]
    fn string_keyed_map_converts_to_object() {
        let entries = vec![(Value::from("a"), Value::Int(1))];
        let m = Value::map_into_object(entries).unwrap();
        assert_eq!(m.get("a"), Some(&Value::Int(1)));

        let bad = vec![(Value::Int(1), Value::Int(1))];
        assert!(matches!(
            Value::map_into_object(bad),
            Err(ValueError::NonStringKey("number"))
        ));
    }
}
