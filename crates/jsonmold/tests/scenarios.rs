//! End-to-end scenarios driven through the public API.

use jsonmold::{
    parse_str, ParseErrorKind, RecordDesc, TypeDesc, TypeRef, Value,
};
use rstest::rstest;

fn int_string_record() -> TypeRef {
    RecordDesc::new("AB")
        .field("a", TypeDesc::int())
        .field("b", TypeDesc::string())
        .build()
}

#[test]
fn record_scenario() {
    let value = parse_str(r#"{"a":1,"b":"x"}"#, &int_string_record()).unwrap();
    let map = value.as_map().unwrap();
    assert_eq!(map.get("a"), Some(&Value::Int(1)));
    assert_eq!(map.get("b"), Some(&Value::String("x".into())));
}

#[test]
fn tuple_scenario() {
    let ty = TypeDesc::tuple(
        vec![TypeDesc::int(), TypeDesc::string(), TypeDesc::boolean()],
        None,
    );
    let value = parse_str(r#"[1, "two", true]"#, &ty).unwrap();
    assert_eq!(
        value.as_list().unwrap().items(),
        &[
            Value::Int(1),
            Value::String("two".into()),
            Value::Boolean(true)
        ]
    );
}

#[test]
fn string_against_sealed_int_field() {
    let ty = RecordDesc::new("K").field("k", TypeDesc::int()).build();
    let err = parse_str(r#"{"k":"v"}"#, &ty).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::RecordFieldNotString);
    assert_eq!((err.line, err.column), (1, 8));
}

#[test]
fn missing_required_field_scenario() {
    let ty = RecordDesc::new("AB")
        .field("a", TypeDesc::int())
        .field("b", TypeDesc::int())
        .build();
    let err = parse_str(r#"{"a":1}"#, &ty).unwrap_err();
    assert!(matches!(
        err.kind,
        ParseErrorKind::MissingRequiredField { ref field, .. } if field == "b"
    ));
}

#[test]
fn union_of_records_first_branch_wins() {
    let map_holder = RecordDesc::new("MapHolder")
        .field("a", TypeDesc::map_of(TypeDesc::int()))
        .build();
    let inner = RecordDesc::new("Inner").field("x", TypeDesc::int()).build();
    let rec_holder = RecordDesc::new("RecHolder").field("a", inner).build();
    let ty = TypeDesc::union(vec![map_holder, rec_holder]);

    let value = parse_str(r#"{"a":{"x":1}}"#, &ty).unwrap();
    let a = value.as_map().unwrap().get("a").unwrap().as_map().unwrap();
    assert_eq!(a.get("x"), Some(&Value::Int(1)));
}

#[test]
fn closed_array_filler_scenario() {
    let ty = TypeDesc::closed_array(TypeDesc::int(), 4);
    let value = parse_str("[1,2,3]", &ty).unwrap();
    assert_eq!(
        value.as_list().unwrap().items(),
        &[Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(0)]
    );
}

#[test]
fn unicode_escape_scenario() {
    let value = parse_str("\"\\u00e9\"", &TypeDesc::string()).unwrap();
    assert_eq!(value, Value::String("é".into()));
}

#[rstest]
#[case::empty("", "empty JSON document")]
#[case::truncated("{\"a\":", "unexpected end of JSON document")]
#[case::trailing("1 2", "JSON document has already ended")]
#[case::bad_token("bogus", "unrecognized token 'bogus'")]
#[case::dangling_comma("[1,]", "expected an array element")]
#[case::no_value("{\"a\":}", "expected a field value")]
fn error_stems(#[case] doc: &str, #[case] stem: &str) {
    let err = parse_str(doc, &TypeDesc::json()).unwrap_err();
    let message = err.to_string();
    assert!(
        message.starts_with(stem),
        "{message:?} does not start with {stem:?}"
    );
    assert!(message.contains(" at line: "), "{message:?} lacks a position");
}

#[rstest]
#[case::object(r#"{"a":[1,{"b":"c"}],"d":null}"#)]
#[case::array(r#"[[1.5,true],{},"s"]"#)]
#[case::scalar("42")]
fn json_round_trips(#[case] doc: &str) {
    let ty = TypeDesc::json();
    let first = parse_str(doc, &ty).unwrap();
    let second = parse_str(&first.to_string(), &ty).unwrap();
    assert_eq!(first, second);
}
