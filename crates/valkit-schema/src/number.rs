//! Integer and float leaves.

use valkit_issue::{IssueKind, Origin};
use valkit_value::Value;

use crate::engine::{type_error, ParseCtx, Payload};
use crate::schema::{Def, Internals, Schema, TypeCode};

/// Width of an integer schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    /// Platform-independent signed integer (64 bits).
    Int,
    /// Platform-independent unsigned integer (64 bits).
    Uint,
}

impl IntWidth {
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            IntWidth::U8 | IntWidth::U16 | IntWidth::U32 | IntWidth::U64 | IntWidth::Uint
        )
    }

    /// Inclusive bounds of the width.
    pub fn bounds(self) -> (i128, i128) {
        match self {
            IntWidth::I8 => (i8::MIN.into(), i8::MAX.into()),
            IntWidth::I16 => (i16::MIN.into(), i16::MAX.into()),
            IntWidth::I32 => (i32::MIN.into(), i32::MAX.into()),
            IntWidth::I64 | IntWidth::Int => (i64::MIN.into(), i64::MAX.into()),
            IntWidth::U8 => (0, u8::MAX.into()),
            IntWidth::U16 => (0, u16::MAX.into()),
            IntWidth::U32 => (0, u32::MAX.into()),
            IntWidth::U64 | IntWidth::Uint => (0, u64::MAX.into()),
        }
    }

    fn code(self) -> TypeCode {
        match self {
            IntWidth::I8 => TypeCode::Int8,
            IntWidth::I16 => TypeCode::Int16,
            IntWidth::I32 => TypeCode::Int32,
            IntWidth::I64 => TypeCode::Int64,
            IntWidth::U8 => TypeCode::Uint8,
            IntWidth::U16 => TypeCode::Uint16,
            IntWidth::U32 => TypeCode::Uint32,
            IntWidth::U64 => TypeCode::Uint64,
            IntWidth::Int => TypeCode::Int,
            IntWidth::Uint => TypeCode::Uint,
        }
    }

    fn value(self, n: i128) -> Value {
        if self.is_unsigned() {
            Value::Uint(n as u64)
        } else {
            Value::Int(n as i64)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    F32,
    F64,
}

fn bound_value(n: i128) -> Value {
    match i64::try_from(n) {
        Ok(i) => Value::Int(i),
        Err(_) => Value::Uint(n as u64),
    }
}

fn integral(input: &Value) -> Option<i128> {
    match input {
        Value::Int(i) => Some(i128::from(*i)),
        Value::Uint(u) => Some(i128::from(*u)),
        // `as` saturates, so huge integral floats still land outside every width.
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i128),
        _ => None,
    }
}

pub(crate) fn check_int(
    schema: &Internals,
    width: IntWidth,
    input: Value,
    ctx: &ParseCtx<'_>,
) -> Payload {
    let Some(n) = integral(&input) else {
        return type_error(schema, input, ctx);
    };
    let (min, max) = width.bounds();
    let kind = if n < min {
        IssueKind::TooSmall {
            origin: Origin::Int,
            minimum: bound_value(min),
            inclusive: true,
            exact: false,
        }
    } else if n > max {
        IssueKind::TooBig {
            origin: Origin::Int,
            maximum: bound_value(max),
            inclusive: true,
            exact: false,
        }
    } else {
        return Payload::ok(width.value(n));
    };
    let issue = ctx.issue(schema, kind, &input);
    Payload::fail(input, issue)
}

pub(crate) fn check_float(
    schema: &Internals,
    width: FloatWidth,
    input: Value,
    ctx: &ParseCtx<'_>,
) -> Payload {
    let f = match &input {
        Value::Int(i) => *i as f64,
        Value::Uint(u) => *u as f64,
        Value::Float(f) if f.is_infinite() => {
            let kind = IssueKind::invalid_type(schema.code.expected(), "infinity");
            let issue = ctx.issue(schema, kind, &input);
            return Payload::fail(input, issue);
        }
        Value::Float(f) if !f.is_nan() => *f,
        _ => return type_error(schema, input, ctx),
    };
    if width == FloatWidth::F32 && f.abs() > f64::from(f32::MAX) {
        let limit = f64::from(f32::MAX);
        let kind = if f < 0.0 {
            IssueKind::TooSmall {
                origin: Origin::Number,
                minimum: Value::Float(-limit),
                inclusive: true,
                exact: false,
            }
        } else {
            IssueKind::TooBig {
                origin: Origin::Number,
                maximum: Value::Float(limit),
                inclusive: true,
                exact: false,
            }
        };
        let issue = ctx.issue(schema, kind, &input);
        return Payload::fail(input, issue);
    }
    Payload::ok(Value::Float(f))
}

fn int_schema<T>(width: IntWidth) -> Schema<T> {
    let mut internals = Internals::new(width.code(), Def::Int(width));
    let (min, max) = width.bounds();
    internals.bag.insert("minimum".into(), bound_value(min));
    internals.bag.insert("maximum".into(), bound_value(max));
    Schema::from_internals(internals)
}

fn float_schema<T>(width: FloatWidth) -> Schema<T> {
    let code = match width {
        FloatWidth::F32 => TypeCode::Float32,
        FloatWidth::F64 => TypeCode::Float64,
    };
    Schema::new(code, Def::Float(width))
}

pub fn int() -> Schema<i64> {
    int_schema(IntWidth::Int)
}

pub fn int8() -> Schema<i8> {
    int_schema(IntWidth::I8)
}

pub fn int16() -> Schema<i16> {
    int_schema(IntWidth::I16)
}

pub fn int32() -> Schema<i32> {
    int_schema(IntWidth::I32)
}

pub fn int64() -> Schema<i64> {
    int_schema(IntWidth::I64)
}

pub fn uint() -> Schema<u64> {
    int_schema(IntWidth::Uint)
}

pub fn uint8() -> Schema<u8> {
    int_schema(IntWidth::U8)
}

pub fn uint16() -> Schema<u16> {
    int_schema(IntWidth::U16)
}

pub fn uint32() -> Schema<u32> {
    int_schema(IntWidth::U32)
}

pub fn uint64() -> Schema<u64> {
    int_schema(IntWidth::U64)
}

pub fn float32() -> Schema<f32> {
    float_schema(FloatWidth::F32)
}

pub fn float64() -> Schema<f64> {
    float_schema(FloatWidth::F64)
}

/// Alias of [`float64`].
pub fn number() -> Schema<f64> {
    float64()
}

#[cfg(test)]
mod tests {
    use valkit_issue::IssueCode;

    use super::*;

    #[test]
    fn width_bounds_are_reported() {
        let err = int8().parse(200).unwrap_err();
        match &err.issues()[0].kind {
            IssueKind::TooBig { maximum, .. } => assert_eq!(*maximum, Value::Int(127)),
            other => panic!("unexpected {other:?}"),
        }
        let err = uint8().parse(-1).unwrap_err();
        assert_eq!(err.issues()[0].code(), IssueCode::TooSmall);
    }

    #[test]
    fn integral_floats_are_integers() {
        assert_eq!(int().parse(3.0).unwrap(), 3);
        let err = int().parse(3.5).unwrap_err();
        assert_eq!(err.issues()[0].code(), IssueCode::InvalidType);
    }

    #[test]
    fn huge_integral_floats_are_out_of_range() {
        let err = int().parse(Value::Float(1e300)).unwrap_err();
        assert_eq!(err.codes(), vec![IssueCode::TooBig]);
        let err = int().parse(Value::Float(-1e300)).unwrap_err();
        assert_eq!(err.codes(), vec![IssueCode::TooSmall]);
        let err = uint8().parse(Value::Float(1e20)).unwrap_err();
        assert_eq!(err.codes(), vec![IssueCode::TooBig]);
    }

    #[test]
    fn unsigned_keeps_full_range() {
        assert_eq!(uint64().parse(u64::MAX).unwrap(), u64::MAX);
        assert!(int64().parse(u64::MAX).is_err());
    }

    #[test]
    fn floats_widen_and_reject_non_finite() {
        assert_eq!(float64().parse(2).unwrap(), 2.0);
        match &float64().parse(f64::NAN).unwrap_err().issues()[0].kind {
            IssueKind::InvalidType { received, .. } => assert_eq!(received, "nan"),
            other => panic!("unexpected {other:?}"),
        }
        match &number().parse(f64::INFINITY).unwrap_err().issues()[0].kind {
            IssueKind::InvalidType { received, .. } => assert_eq!(received, "infinity"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(float32().parse(1e39).is_err());
        assert_eq!(float32().parse(1.5).unwrap(), 1.5f32);
    }

    #[test]
    fn strings_are_not_numbers_without_coercion() {
        assert!(int().parse("25").is_err());
        assert_eq!(int().coerce().parse("25").unwrap(), 25);
    }
}
