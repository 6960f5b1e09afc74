//! Coercion rules applied by `coerce` schemas before type-checking.
//!
//! Every function returns `None` when the input cannot be coerced; callers
//! leave the raw value in place so the type-check reports it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};

use crate::value::{format_time, Value};

/// Vocabulary recognised by boolean coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolCoercion {
    pub case_sensitive: bool,
    pub truthy: Vec<String>,
    pub falsy: Vec<String>,
}

impl Default for BoolCoercion {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            truthy: ["true", "1", "yes", "on", "y", "enabled"]
                .map(String::from)
                .to_vec(),
            falsy: ["false", "0", "no", "off", "n", "disabled"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl BoolCoercion {
    fn matches(&self, candidates: &[String], s: &str) -> bool {
        candidates.iter().any(|c| {
            if self.case_sensitive {
                c == s
            } else {
                c.eq_ignore_ascii_case(s)
            }
        })
    }
}

/// Stringify a scalar.
pub fn to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Int(i) => Some(i.to_string()),
        Value::Uint(u) => Some(u.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::BigInt(b) => Some(b.to_string()),
        Value::Time(t) => Some(format_time(t)),
        Value::Nil | Value::Array(_) | Value::Object(_) | Value::Map(_) => None,
    }
}

pub fn to_bool(value: &Value, rules: &BoolCoercion) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => {
            let s = s.trim();
            if rules.matches(&rules.truthy, s) {
                Some(true)
            } else if rules.matches(&rules.falsy, s) {
                Some(false)
            } else {
                None
            }
        }
        other => match other.as_f64() {
            Some(f) if f == 1.0 => Some(true),
            Some(f) if f == 0.0 => Some(false),
            _ => None,
        },
    }
}

fn split_sign(s: &str) -> (bool, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else {
        (false, s.strip_prefix('+').unwrap_or(s))
    }
}

/// Parse an integer literal in decimal, `0x`, `0o` or `0b` notation.
fn parse_integer(s: &str) -> Option<BigInt> {
    let s = s.trim().replace('_', "");
    let (negative, digits) = split_sign(&s);
    let (radix, body) = match digits.get(..2) {
        Some("0x") | Some("0X") => (16, &digits[2..]),
        Some("0o") | Some("0O") => (8, &digits[2..]),
        Some("0b") | Some("0B") => (2, &digits[2..]),
        _ => (10, digits),
    };
    if body.is_empty() || body.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = BigInt::parse_bytes(body.as_bytes(), radix)?;
    Some(if negative { -magnitude } else { magnitude })
}

fn integral_float(f: f64) -> Option<BigInt> {
    if f.is_finite() {
        BigInt::from_f64(f.trunc())
    } else {
        None
    }
}

fn to_integer(value: &Value) -> Option<BigInt> {
    match value {
        Value::Int(_) | Value::Uint(_) | Value::BigInt(_) => value.as_bigint(),
        Value::Float(f) => integral_float(*f),
        Value::Bool(b) => Some(BigInt::from(u8::from(*b))),
        Value::String(s) => parse_integer(s).or_else(|| {
            // "1e3" and "12.0" are integral even though they are not integer literals.
            s.trim().parse::<f64>().ok().filter(|f| f.fract() == 0.0).and_then(integral_float)
        }),
        Value::Time(t) => Some(BigInt::from(t.timestamp_millis())),
        _ => None,
    }
}

/// Coerce into the signed 64-bit carrier; out-of-range values are rejected.
pub fn to_i64(value: &Value) -> Option<i64> {
    to_integer(value)?.to_i64()
}

/// Coerce into the unsigned 64-bit carrier; negatives are rejected.
pub fn to_u64(value: &Value) -> Option<u64> {
    to_integer(value)?.to_u64()
}

pub fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Int(_) | Value::Uint(_) | Value::BigInt(_) => value.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.replace('_', "")
                .parse::<f64>()
                .ok()
                .or_else(|| parse_integer(s).and_then(|b| b.to_f64()))
        }
        Value::Time(t) => Some(t.timestamp_millis() as f64),
        _ => None,
    }
}

/// Parse arbitrary-precision decimal strings, integers and integral floats.
pub fn to_bigint(value: &Value) -> Option<BigInt> {
    match value {
        Value::Float(f) if f.fract() != 0.0 => None,
        other => to_integer(other),
    }
}

/// Coerce RFC 3339 strings, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and epoch
/// seconds into a UTC time.
pub fn to_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Time(t) => Some(*t),
        Value::String(s) => parse_time(s.trim()),
        Value::Int(i) => Utc.timestamp_opt(*i, 0).single(),
        Value::Uint(u) => Utc.timestamp_opt(i64::try_from(*u).ok()?, 0).single(),
        Value::Float(f) if f.is_finite() => {
            let millis = (f * 1000.0).round();
            Utc.timestamp_millis_opt(millis.to_i64()?).single()
        }
        _ => None,
    }
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
