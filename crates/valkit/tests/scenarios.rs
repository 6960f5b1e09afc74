use serde_json::json;
use valkit::issue::IssueCode;
use valkit::prelude::*;
use valkit::schema::{
    coerce, iso_datetime_with, partial_record, transform, unknown, xor, DatetimeOptions,
    Precision, TransformFailure,
};

fn codes(err: &ParseError) -> Vec<IssueCode> {
    err.codes()
}

#[test]
fn int_pipeline() {
    let s = int().min(0).max(100).multiple_of(5);
    assert_eq!(s.parse(25).unwrap(), 25);
    assert_eq!(codes(&s.parse(26).unwrap_err()), vec![IssueCode::NotMultipleOf]);
    assert!(s.parse(-1).unwrap_err().has_code(IssueCode::TooSmall));
    assert_eq!(codes(&s.parse("25").unwrap_err()), vec![IssueCode::InvalidType]);

    let coerced = coerce::int().min(0).max(100).multiple_of(5);
    assert_eq!(coerced.parse("25").unwrap(), 25);
}

#[test]
fn object_strict_and_strip() {
    let shape = Shape::new().field("name", string()).field("age", int());
    let strict = object(shape.clone()).strict();
    let err = strict.parse(json!({"name": "a", "age": 1, "x": 2})).unwrap_err();
    let issue = &err.issues()[0];
    assert!(issue.path.is_empty());
    match &issue.kind {
        IssueKind::UnrecognizedKeys { keys } => assert_eq!(keys, &vec!["x".to_owned()]),
        other => panic!("unexpected {other:?}"),
    }

    let stripped = object(shape).parse(json!({"name": "a", "age": 1, "x": 2})).unwrap();
    assert_eq!(Value::Object(stripped).to_json().unwrap(), json!({"name": "a", "age": 1}));
}

#[test]
fn record_enumerated() {
    let keys = || enumeration(["id", "name", "email"]);
    let full = record(keys(), string());

    let complete = json!({"id": "1", "name": "x", "email": "y@z"});
    let out = full.parse(complete.clone()).unwrap();
    assert_eq!(out.keys().collect::<Vec<_>>(), ["id", "name", "email"]);

    let missing = json!({"id": "1", "name": "x"});
    let err = full.parse(missing.clone()).unwrap_err();
    assert_eq!(err.issues()[0].path.to_string(), "email");

    let partial = partial_record(keys(), string());
    let out = partial.parse(missing).unwrap();
    assert_eq!(out.len(), 2);

    let extra = json!({"id": "1", "name": "x", "email": "y@z", "extra": "?"});
    assert!(full.parse(extra.clone()).unwrap_err().has_code(IssueCode::UnrecognizedKeys));
    assert!(partial.parse(extra).unwrap_err().has_code(IssueCode::UnrecognizedKeys));
}

#[test]
fn discriminated_union_dispatch() {
    let s = discriminated_union(
        "type",
        [
            object(Shape::new().field("type", literal("dog")).field("bark", string())),
            object(Shape::new().field("type", literal("cat")).field("meow", string())),
        ],
    )
    .unwrap();

    let dog = json!({"type": "dog", "bark": "woof"});
    assert_eq!(Value::Object(s.parse(dog.clone()).unwrap()).to_json().unwrap(), dog);
    assert_eq!(codes(&s.parse(json!({"type": "fish"})).unwrap_err()), vec![IssueCode::InvalidUnion]);
    assert_eq!(codes(&s.parse(json!({})).unwrap_err()), vec![IssueCode::InvalidUnion]);
}

#[test]
fn pipe_transform() {
    let s = string()
        .pipe(transform(|s: String, _| {
            s.parse::<i64>().map_err(|e| TransformFailure::from(e.to_string()))
        }))
        .pipe(int().min(1));
    assert_eq!(s.parse("42").unwrap(), 42);
    assert_eq!(codes(&s.parse("0").unwrap_err()), vec![IssueCode::TooSmall]);
    assert_eq!(codes(&s.parse("abc").unwrap_err()), vec![IssueCode::Custom]);
}

#[test]
fn iso_datetime_precision() {
    let at = |precision| {
        iso_datetime_with(DatetimeOptions {
            precision,
            ..DatetimeOptions::default()
        })
    };
    let whole = "2020-01-01T06:15:00Z";
    let fractional = "2020-01-01T06:15:00.1Z";

    let second = at(Precision::Second);
    assert_eq!(second.parse(whole).unwrap(), whole);
    assert_eq!(codes(&second.parse(fractional).unwrap_err()), vec![IssueCode::InvalidFormat]);

    let milli = at(Precision::Millisecond);
    assert!(milli.parse(whole).is_err());
    assert_eq!(milli.parse(fractional).unwrap(), fractional);
}

#[test]
fn xor_overlap() {
    let overlapping = xor([string().erase(), unknown()]);
    assert!(overlapping.parse("hi").is_err());
    assert_eq!(overlapping.parse(true).unwrap(), Value::Bool(true));

    let disjoint = xor([string().erase(), int().erase()]);
    assert_eq!(disjoint.parse("hi").unwrap(), Value::from("hi"));
    assert!(disjoint.parse(true).is_err());
}
