use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use bigdecimal::BigDecimal;
use quickcheck::{Arbitrary, Gen, QuickCheck};

use crate::{parse_str, ListValue, MapValue, TypeDesc, Value};

/// A value with the shapes a `json`-targeted parse can produce: ints,
/// decimals, booleans, null, strings, and nested containers. Floats are
/// excluded; under `json` they only arise from negative-zero lexemes.
#[derive(Clone, Debug)]
struct JsonDoc(Value);

impl Arbitrary for JsonDoc {
    fn arbitrary(g: &mut Gen) -> Self {
        JsonDoc(arbitrary_value(g, 3))
    }
}

fn arbitrary_value(g: &mut Gen, depth: usize) -> Value {
    let variants = if depth == 0 { 5 } else { 7 };
    match u32::arbitrary(g) % variants {
        0 => Value::Null,
        1 => Value::Boolean(bool::arbitrary(g)),
        2 => Value::Int(i64::arbitrary(g)),
        3 => Value::Decimal(BigDecimal::from(i64::arbitrary(g))),
        4 => Value::String(String::arbitrary(g)),
        5 => {
            let mut list = ListValue::new(TypeDesc::array_of(TypeDesc::json()));
            let len = usize::arbitrary(g) % 4;
            for i in 0..len {
                list.set(i, arbitrary_value(g, depth - 1));
            }
            Value::List(list)
        }
        _ => {
            let mut map = MapValue::new(TypeDesc::map_of(TypeDesc::json()));
            let len = usize::arbitrary(g) % 4;
            for _ in 0..len {
                map.put_forcefully(String::arbitrary(g), arbitrary_value(g, depth - 1));
            }
            Value::Map(map)
        }
    }
}

#[test]
fn round_trip_under_json_target() {
    fn prop(doc: JsonDoc) -> bool {
        let text = doc.0.to_string();
        match parse_str(&text, &TypeDesc::json()) {
            Ok(parsed) => parsed == doc.0,
            Err(_) => false,
        }
    }
    QuickCheck::new()
        .tests(300)
        .quickcheck(prop as fn(JsonDoc) -> bool);
}

#[test]
fn serialisation_is_stable_after_one_round() {
    fn prop(doc: JsonDoc) -> bool {
        let text = doc.0.to_string();
        let Ok(parsed) = parse_str(&text, &TypeDesc::json()) else {
            return false;
        };
        parsed.to_string() == text
    }
    QuickCheck::new()
        .tests(300)
        .quickcheck(prop as fn(JsonDoc) -> bool);
}

#[test]
fn int_arrays_round_trip_under_their_own_type() {
    fn prop(ints: Vec<i64>) -> bool {
        let mut text = String::from("[");
        for (i, n) in ints.iter().enumerate() {
            if i > 0 {
                text.push(',');
            }
            text.push_str(&alloc::format!("{n}"));
        }
        text.push(']');

        let ty = TypeDesc::array_of(TypeDesc::int());
        let Ok(value) = parse_str(&text, &ty) else {
            return false;
        };
        let items: Vec<i64> = value
            .as_list()
            .unwrap()
            .items()
            .iter()
            .map(|item| match item {
                Value::Int(n) => *n,
                _ => i64::MIN,
            })
            .collect();
        items == ints
    }
    QuickCheck::new().quickcheck(prop as fn(Vec<i64>) -> bool);
}
