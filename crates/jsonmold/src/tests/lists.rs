use alloc::vec;

use crate::{parse_str, ParseErrorKind, RecordDesc, TypeDesc, Value};

#[test]
fn tuple_of_mixed_primitives() {
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
fn tuple_with_too_few_elements() {
    let ty = TypeDesc::tuple(vec![TypeDesc::int(), TypeDesc::int()], None);
    let err = parse_str("[1]", &ty).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::TupleSizeTooLarge);
}

#[test]
fn tuple_with_too_many_elements() {
    let ty = TypeDesc::tuple(vec![TypeDesc::int(), TypeDesc::int()], None);
    let err = parse_str("[1,2,3]", &ty).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::TupleSizeNotEnough);
}

#[test]
fn tuple_rest_type_takes_overflow() {
    let ty = TypeDesc::tuple(vec![TypeDesc::int()], Some(TypeDesc::string()));
    let value = parse_str(r#"[1,"a","b"]"#, &ty).unwrap();
    assert_eq!(
        value.as_list().unwrap().items(),
        &[
            Value::Int(1),
            Value::String("a".into()),
            Value::String("b".into())
        ]
    );
}

#[test]
fn closed_array_completed_with_fillers() {
    let ty = TypeDesc::closed_array(TypeDesc::int(), 4);
    let value = parse_str("[1,2,3]", &ty).unwrap();
    assert_eq!(
        value.as_list().unwrap().items(),
        &[Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(0)]
    );
}

#[test]
fn closed_array_overflow_rejected() {
    let ty = TypeDesc::closed_array(TypeDesc::int(), 2);
    let err = parse_str("[1,2,3]", &ty).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::ArraySizeNotEnough);
}

#[test]
fn closed_array_without_fillers_needs_every_element() {
    // A union without a nil member has no filler value.
    let elem = TypeDesc::union(vec![TypeDesc::int(), TypeDesc::string()]);
    let ty = TypeDesc::closed_array(elem, 2);
    let err = parse_str("[1]", &ty).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::ArrayWithoutFiller);

    let full = parse_str("[1,2]", &ty).unwrap();
    assert_eq!(full.as_list().unwrap().len(), 2);
}

#[test]
fn open_array_grows_freely() {
    let ty = TypeDesc::array_of(TypeDesc::int());
    let value = parse_str("[]", &ty).unwrap();
    assert!(value.as_list().unwrap().is_empty());

    let value = parse_str("[5,6,7,8,9]", &ty).unwrap();
    assert_eq!(value.as_list().unwrap().len(), 5);
}

#[test]
fn nested_arrays() {
    let ty = TypeDesc::array_of(TypeDesc::array_of(TypeDesc::int()));
    let value = parse_str("[[1,2],[3]]", &ty).unwrap();
    let outer = value.as_list().unwrap();
    assert_eq!(
        outer.get(0).unwrap().as_list().unwrap().items(),
        &[Value::Int(1), Value::Int(2)]
    );
    assert_eq!(
        outer.get(1).unwrap().as_list().unwrap().items(),
        &[Value::Int(3)]
    );
}

#[test]
fn array_of_records() {
    let rec = RecordDesc::new("Id").field("id", TypeDesc::int()).build();
    let ty = TypeDesc::array_of(rec);
    let value = parse_str(r#"[{"id":1},{"id":2}]"#, &ty).unwrap();
    let list = value.as_list().unwrap();
    assert_eq!(
        list.get(1).unwrap().as_map().unwrap().get("id"),
        Some(&Value::Int(2))
    );
}

#[test]
fn array_under_record_field() {
    let ty = RecordDesc::new("Holder")
        .field("xs", TypeDesc::array_of(TypeDesc::int()))
        .build();
    let value = parse_str(r#"{"xs":[1,2]}"#, &ty).unwrap();
    let xs = value.as_map().unwrap().get("xs").unwrap().as_list().unwrap();
    assert_eq!(xs.items(), &[Value::Int(1), Value::Int(2)]);
}

#[test]
fn closed_array_rejects_nested_overflow() {
    let ty = TypeDesc::closed_array(TypeDesc::array_of(TypeDesc::int()), 1);
    let err = parse_str("[[1],[2]]", &ty).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::ArraySizeNotEnough);
}

#[test]
fn tuple_of_containers() {
    let rec = RecordDesc::new("P").field("x", TypeDesc::int()).build();
    let ty = TypeDesc::tuple(vec![rec, TypeDesc::array_of(TypeDesc::int())], None);
    let value = parse_str(r#"[{"x":1},[2,3]]"#, &ty).unwrap();
    let list = value.as_list().unwrap();
    assert!(list.get(0).unwrap().as_map().is_some());
    assert_eq!(
        list.get(1).unwrap().as_list().unwrap().items(),
        &[Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn array_against_scalar_target_rejected() {
    let err = parse_str("[1]", &TypeDesc::int()).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::NotArray);
}

#[test]
fn empty_input_for_closed_array_with_fillers() {
    let ty = TypeDesc::closed_array(TypeDesc::boolean(), 2);
    let value = parse_str("[]", &ty).unwrap();
    assert_eq!(
        value.as_list().unwrap().items(),
        &[Value::Boolean(false), Value::Boolean(false)]
    );
}

#[test]
fn string_array_elements() {
    let ty = TypeDesc::array_of(TypeDesc::string());
    let value = parse_str(r#"["a","b"]"#, &ty).unwrap();
    assert_eq!(value.as_list().unwrap().len(), 2);

    let err = parse_str(r#"["a"]"#, &TypeDesc::array_of(TypeDesc::int())).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::ArrayElementNotString);
}

#[test]
fn string_tuple_element_type_checked() {
    let ty = TypeDesc::tuple(vec![TypeDesc::int()], None);
    let err = parse_str(r#"["a"]"#, &ty).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::TupleElementNotString);
}
