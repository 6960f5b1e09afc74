//! Schemas that coerce their input before type-checking it.
//!
//! `coerce::int()` is `int().coerce()`; the rules themselves live in
//! `valkit_value::coerce`.

use std::sync::Arc;

use valkit_value::{BigInt, BoolCoercion, DateTime, Utc};

use crate::number;
use crate::primitive;
use crate::schema::{Def, Schema, TypeCode};

pub fn string() -> Schema<String> {
    primitive::string().coerce()
}

pub fn int() -> Schema<i64> {
    number::int().coerce()
}

pub fn uint() -> Schema<u64> {
    number::uint().coerce()
}

pub fn float64() -> Schema<f64> {
    number::float64().coerce()
}

pub fn boolean() -> Schema<bool> {
    primitive::boolean().coerce()
}

/// Boolean coercion with a custom truthy/falsy vocabulary.
pub fn boolean_with(rules: BoolCoercion) -> Schema<bool> {
    Schema::<bool>::new(TypeCode::Bool, Def::Bool(Arc::new(rules))).coerce()
}

pub fn bigint() -> Schema<BigInt> {
    primitive::bigint().coerce()
}

pub fn date() -> Schema<DateTime<Utc>> {
    primitive::date().coerce()
}

#[cfg(test)]
mod tests {
    use valkit_issue::IssueCode;
    use valkit_value::Value;

    use super::*;

    #[test]
    fn numbers_from_strings() {
        assert_eq!(int().parse("42").unwrap(), 42);
        assert_eq!(int().parse(" 0x10 ").unwrap(), 16);
        assert_eq!(float64().parse("2.5").unwrap(), 2.5);
        assert_eq!(uint().parse("7").unwrap(), 7);
        let err = int().parse("forty").unwrap_err();
        assert!(err.has_code(IssueCode::InvalidType));
    }

    #[test]
    fn refinements_run_on_the_coerced_value() {
        let s = int().min(10);
        assert!(s.parse("3").is_err());
        assert_eq!(s.parse("30").unwrap(), 30);
    }

    #[test]
    fn booleans_use_the_vocabulary() {
        assert!(boolean().parse("yes").unwrap());
        assert!(!boolean().parse("OFF").unwrap());
        assert!(boolean().parse("maybe").is_err());

        let strict = boolean_with(BoolCoercion {
            case_sensitive: true,
            truthy: vec!["Y".into()],
            falsy: vec!["N".into()],
        });
        assert!(strict.parse("Y").unwrap());
        assert!(strict.parse("y").is_err());
    }

    #[test]
    fn strings_from_scalars() {
        assert_eq!(string().parse(12).unwrap(), "12");
        assert_eq!(string().parse(true).unwrap(), "true");
        assert!(string().parse(Value::Array(vec![])).is_err());
    }

    #[test]
    fn bigints_and_dates() {
        assert_eq!(bigint().parse("123456789012345678901234567890").unwrap().to_string(), "123456789012345678901234567890");
        let t = date().parse("2024-01-02T03:04:05Z").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-01-02T03:04:05+00:00");
    }
}
