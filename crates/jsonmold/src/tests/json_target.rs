use alloc::string::ToString;

use bigdecimal::BigDecimal;

use crate::{parse_str, RecordDesc, TypeDesc, Value};

fn parse_json(json: &str) -> Value {
    parse_str(json, &TypeDesc::json()).unwrap()
}

#[test]
fn root_scalars() {
    assert_eq!(parse_json("1"), Value::Int(1));
    assert_eq!(parse_json("true"), Value::Boolean(true));
    assert_eq!(parse_json("false"), Value::Boolean(false));
    assert_eq!(parse_json("null"), Value::Null);
    assert_eq!(parse_json(r#""s""#), Value::String("s".into()));
}

#[test]
fn number_lanes() {
    // A fractional lexeme is a decimal; exponents without a dot are too.
    assert_eq!(
        parse_json("1.5"),
        Value::Decimal("1.5".parse::<BigDecimal>().unwrap())
    );
    assert_eq!(
        parse_json("1e2"),
        Value::Decimal("1e2".parse::<BigDecimal>().unwrap())
    );
    assert_eq!(parse_json("42"), Value::Int(42));
}

#[test]
fn negative_zero_is_a_float() {
    let Value::Float(f) = parse_json("-0") else {
        panic!("expected a float");
    };
    assert_eq!(f, 0.0);
    assert!(f.is_sign_negative());

    let Value::Float(f) = parse_json("-0.0") else {
        panic!("expected a float");
    };
    assert!(f.is_sign_negative());

    // A plain zero stays an int, a negative fraction stays a decimal.
    assert_eq!(parse_json("0"), Value::Int(0));
    assert_eq!(
        parse_json("-0.5"),
        Value::Decimal("-0.5".parse::<BigDecimal>().unwrap())
    );
}

#[test]
fn negative_zero_under_decimal_target_is_a_decimal() {
    let ty = RecordDesc::new("D").field("d", TypeDesc::decimal()).build();
    let value = parse_str(r#"{"d":-0}"#, &ty).unwrap();
    assert_eq!(
        value.as_map().unwrap().get("d"),
        Some(&Value::Decimal(BigDecimal::from(0)))
    );

    let json = parse_json(r#"{"d":-0}"#);
    assert!(matches!(
        json.as_map().unwrap().get("d"),
        Some(Value::Float(_))
    ));
}

#[test]
fn objects_and_arrays_nest_freely() {
    let value = parse_json(r#"{"a":[1,{"b":null},"s"],"c":{}}"#);
    let map = value.as_map().unwrap();
    let a = map.get("a").unwrap().as_list().unwrap();
    assert_eq!(a.get(0), Some(&Value::Int(1)));
    assert_eq!(
        a.get(1).unwrap().as_map().unwrap().get("b"),
        Some(&Value::Null)
    );
    assert_eq!(a.get(2), Some(&Value::String("s".into())));
    assert!(map.get("c").unwrap().as_map().unwrap().is_empty());
}

#[test]
fn empty_containers() {
    assert!(parse_json("{}").as_map().unwrap().is_empty());
    assert!(parse_json("[]").as_list().unwrap().is_empty());
}

#[test]
fn round_trip_fixed_documents() {
    for doc in [
        "null",
        "true",
        "-0",
        "123",
        "1.25",
        r#""text with \"quotes\"""#,
        r#"{"a":1,"b":[true,null,"s"],"c":{"d":2.5}}"#,
        "[[],[[]],{}]",
    ] {
        let first = parse_json(doc);
        let second = parse_json(&first.to_string());
        assert_eq!(first, second, "round trip failed for {doc}");
    }
}

#[test]
fn display_emits_json_serde_can_read() {
    let value = parse_json(r#"{"a":[1,2.5,null,true],"b\n":"x\ty","c":{"d":[]}}"#);
    let text = value.to_string();
    let oracle: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(oracle["a"][0], serde_json::json!(1));
    assert_eq!(oracle["b\n"], serde_json::json!("x\ty"));
    assert!(oracle["c"]["d"].as_array().unwrap().is_empty());
}

#[test]
fn converting_json_parse_matches_direct_parse() {
    // Parsing under json then converting must agree with a direct parse.
    let ty = RecordDesc::new("Conf")
        .field("port", TypeDesc::int())
        .field("ratio", TypeDesc::float())
        .build();
    let doc = r#"{"port":8080,"ratio":2}"#;

    let direct = parse_str(doc, &ty).unwrap();
    let generic = parse_json(doc);
    let converted = crate::convert_value(&ty, &generic).unwrap();
    assert_eq!(direct, converted);
}

#[test]
fn whitespace_everywhere() {
    let value = parse_json(" {\r\n\t\"a\" :\t[ 1 ,\n 2 ] } \n");
    assert_eq!(
        value.as_map().unwrap().get("a").unwrap().as_list().unwrap().items(),
        &[Value::Int(1), Value::Int(2)]
    );
}
