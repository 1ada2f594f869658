#![no_main]

use std::cell::RefCell;

use jsonmold::{RecordDesc, StreamParser, TypeDesc, TypeRef, Value};
use libfuzzer_sys::fuzz_target;

thread_local! {
    // One reused parser per thread, like a real deployment.
    static PARSER: RefCell<StreamParser> = RefCell::new(StreamParser::new());
    static TARGETS: Vec<TypeRef> = targets();
}

fn targets() -> Vec<TypeRef> {
    let record = RecordDesc::new("Fuzz")
        .field("id", TypeDesc::int())
        .optional_field("name", TypeDesc::string())
        .defaulted_field("ok", TypeDesc::boolean(), Value::Boolean(false))
        .rest(TypeDesc::json())
        .build();
    vec![
        TypeDesc::json(),
        record.clone(),
        TypeDesc::union(vec![TypeDesc::map_of(TypeDesc::int()), record]),
        TypeDesc::array_of(TypeDesc::union(vec![TypeDesc::int(), TypeDesc::null()])),
        TypeDesc::closed_array(TypeDesc::int(), 4),
        TypeDesc::tuple(
            vec![TypeDesc::int(), TypeDesc::string()],
            Some(TypeDesc::json()),
        ),
    ]
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let pick = data[0] as usize;
    let body = &data[1..];
    TARGETS.with(|targets| {
        let target = targets[pick % targets.len()].clone();
        PARSER.with(|parser| {
            // Must never panic; errors are the expected outcome for most
            // inputs.
            let _ = parser.borrow_mut().parse_bytes(body, &target);
        });
    });
});
