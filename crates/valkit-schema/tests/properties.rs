//! Property tests for the parse engine.

use proptest::prelude::*;
use valkit_schema::{
    array, discriminated_union, enumeration, int, literal, object, partial_record, record,
    string, union, xor, IssueCode, IssueKind, Map, Schema, Shape, Value,
};

/// Scalars and shallow containers, the inputs schemas most often see.
fn any_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn object_of(entries: impl IntoIterator<Item = (String, Value)>) -> Value {
    Value::Object(entries.into_iter().collect::<Map>())
}

fn pets() -> Schema<Map> {
    discriminated_union(
        "kind",
        [
            object(Shape::new().field("kind", literal("dog")).field("name", string())),
            object(Shape::new().field("kind", literal("cat")).field("lives", int())),
        ],
    )
    .expect("distinct discriminators")
}

proptest! {
    /// Deriving a refined schema never changes the receiver.
    #[test]
    fn builders_leave_the_receiver_untouched(bound in any::<i64>(), input in any::<i64>()) {
        let base = int();
        let refined = base.min(bound).max(bound);
        prop_assert_eq!(base.check_count(), 0);
        prop_assert_eq!(refined.check_count(), 2);
        prop_assert_eq!(base.parse(input).unwrap(), input);
        prop_assert_ne!(base.id(), refined.id());
    }

    /// A default is returned for nil without being validated.
    #[test]
    fn default_short_circuits(fallback in any::<i64>()) {
        let s = int().refine(|_| false).default(fallback);
        prop_assert_eq!(s.parse(Value::Nil).unwrap(), fallback);
    }

    /// A prefault is substituted for nil and then validated.
    #[test]
    fn prefault_is_validated(fallback in any::<i64>(), floor in any::<i64>()) {
        let s = int().min(floor).prefault(fallback);
        prop_assert_eq!(s.parse(Value::Nil).is_ok(), fallback >= floor);
    }

    /// Overwrites are applied in order and their result is the output.
    #[test]
    fn overwrite_replaces_the_output(n in -1_000_000i64..1_000_000) {
        let s = int().overwrite(|v| v * 2).overwrite(|v| v + 1);
        prop_assert_eq!(s.parse(n).unwrap(), n * 2 + 1);
    }

    /// The first accepting union member wins.
    #[test]
    fn union_prefers_earlier_members(s in "[a-z]{0,10}") {
        let u = union([string().erase(), string().to_uppercase().erase()]);
        prop_assert_eq!(u.parse(s.as_str()).unwrap(), Value::from(s.as_str()));
        let flipped = union([string().to_uppercase().erase(), string().erase()]);
        prop_assert_eq!(flipped.parse(s.as_str()).unwrap(), Value::from(s.to_uppercase()));
    }

    /// Xor accepts exactly when one member does.
    #[test]
    fn xor_counts_matches(lo in -50i64..50, hi in -50i64..50, n in -100i64..100) {
        let s = xor([int().gte(lo).erase(), int().lte(hi).erase()]);
        let matches = usize::from(n >= lo) + usize::from(n <= hi);
        prop_assert_eq!(s.parse(n).is_ok(), matches == 1);
    }

    /// Dispatch follows the discriminator, never the order of members.
    #[test]
    fn discriminated_dispatch(name in "[a-z]{1,8}", lives in 0i64..10) {
        let dog = object_of([
            ("kind".to_owned(), Value::from("dog")),
            ("name".to_owned(), Value::from(name.as_str())),
        ]);
        prop_assert!(pets().parse(dog).is_ok());

        // A cat carrying a dog's fields fails inside the cat member.
        let confused = object_of([
            ("kind".to_owned(), Value::from("cat")),
            ("name".to_owned(), Value::from(name.as_str())),
        ]);
        let err = pets().parse(confused).unwrap_err();
        prop_assert_eq!(err.issues()[0].path.to_string(), "lives");

        let cat = object_of([
            ("kind".to_owned(), Value::from("cat")),
            ("lives".to_owned(), Value::Int(lives)),
        ]);
        prop_assert_eq!(pets().parse(cat).unwrap()["lives"].clone(), Value::Int(lives));
    }

    /// Unknown keys are stripped, rejected or kept according to the policy.
    #[test]
    fn unknown_key_policy(
        extra in prop::collection::btree_map("[a-z]{3,6}", any::<i64>(), 0..5),
        id in any::<i64>(),
    ) {
        let mut entries = vec![("id".to_owned(), Value::Int(id))];
        entries.extend(extra.iter().map(|(k, v)| (k.clone(), Value::Int(*v))));
        let input = object_of(entries);
        let base = object(Shape::new().field("id", int()));

        let stripped = base.parse(input.clone()).unwrap();
        prop_assert_eq!(stripped.len(), 1);

        let kept = base.passthrough().parse(input.clone()).unwrap();
        prop_assert_eq!(kept.len(), extra.len() + 1);

        let strict = base.strict().parse(input);
        if extra.is_empty() {
            prop_assert!(strict.is_ok());
        } else {
            let err = strict.unwrap_err();
            match &err.issues()[0].kind {
                IssueKind::UnrecognizedKeys { keys } => {
                    let expected: Vec<String> = extra.keys().cloned().collect();
                    prop_assert_eq!(keys, &expected);
                }
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }
    }

    /// A record keyed by an enumeration demands every key; a partial one
    /// demands none.
    #[test]
    fn record_exhaustiveness(has_a in any::<bool>(), has_b in any::<bool>(), n in any::<i64>()) {
        let mut entries = Vec::new();
        if has_a {
            entries.push(("a".to_owned(), Value::Int(n)));
        }
        if has_b {
            entries.push(("b".to_owned(), Value::Int(n)));
        }
        let input = object_of(entries);
        let full = record(enumeration(["a", "b"]), int());
        prop_assert_eq!(full.parse(input.clone()).is_ok(), has_a && has_b);
        let partial = partial_record(enumeration(["a", "b"]), int());
        prop_assert!(partial.parse(input).is_ok());
    }

    /// Element issues point at exactly the offending indices.
    #[test]
    fn array_issue_paths(items in prop::collection::vec(prop_oneof![
        any::<i64>().prop_map(Value::Int),
        "[a-z]{1,4}".prop_map(Value::String),
    ], 0..10)) {
        let expected: Vec<String> = items
            .iter()
            .enumerate()
            .filter(|(_, v)| matches!(v, Value::String(_)))
            .map(|(i, _)| format!("[{i}]"))
            .collect();
        match array(int()).parse(Value::Array(items)) {
            Ok(_) => prop_assert!(expected.is_empty()),
            Err(err) => {
                let paths: Vec<String> = err.issues().iter().map(|i| i.path.to_string()).collect();
                prop_assert_eq!(paths, expected);
                prop_assert!(err.has_code(IssueCode::InvalidType));
            }
        }
    }

    /// Parsing arbitrary input never panics, whatever the outcome.
    #[test]
    fn parsing_is_total(input in any_value()) {
        let _ = pets().parse(input.clone());
        let _ = array(string().min(1)).parse(input.clone());
        let _ = record(string(), int().optional()).parse(input);
    }
}
