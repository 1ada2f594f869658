//! Schema-directed streaming JSON parser.
//!
//! `jsonmold` consumes a stream of JSON text and materialises a
//! strongly-typed value graph whose shape is dictated by a caller-supplied
//! [`TypeDesc`]. Parsing and construction interleave: as each character
//! arrives the parser decides which container to allocate, which primitive
//! conversion to apply, and which union branches remain viable, failing as
//! soon as the input cannot match the target type.
//!
//! ```
//! use jsonmold::{parse_str, RecordDesc, TypeDesc, Value};
//!
//! let ty = RecordDesc::new("Server")
//!     .field("host", TypeDesc::string())
//!     .defaulted_field("port", TypeDesc::int(), Value::Int(8080))
//!     .build();
//! let value = parse_str(r#"{"host":"example.org"}"#, &ty).unwrap();
//! let map = value.as_map().unwrap();
//! assert_eq!(map.get("port"), Some(&Value::Int(8080)));
//! ```

#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod convert;
mod error;
mod options;
mod parser;
#[cfg(feature = "std")]
mod reader;
mod typedesc;
mod value;

pub use convert::{convert_value, record_value_with_defaults};
pub use error::{ParseError, ParseErrorKind};
pub use options::ParserOptions;
pub use parser::{parse_bytes, parse_str, StreamParser};
#[cfg(feature = "std")]
pub use reader::parse_reader;
pub use typedesc::{
    implied_type, ArrayDesc, ArrayState, FieldDesc, MapDesc, RecordDesc, RefDesc, TupleDesc,
    TypeDesc, TypeRef, UnionDesc,
};
pub use value::{filler_value, ListValue, MapValue, Value};

#[cfg(test)]
mod tests;
