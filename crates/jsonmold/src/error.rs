use alloc::string::String;
use thiserror::Error;

/// The single error produced by the parser.
///
/// `line` is 1-based; `column` is 0-based and resets on every line feed.
/// Both refer to the character that triggered the failure.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at line: {line} column: {column}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
}

/// Every message stem the parser or the value converter can produce.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("empty JSON document")]
    EmptyDocument,
    #[error("unexpected end of JSON document")]
    UnexpectedEnd,
    #[error("JSON document has already ended")]
    DocumentEnded,
    #[error("invalid JSON document")]
    InvalidDocument,
    /// The payload is the pre-formatted list of acceptable characters,
    /// e.g. `'\"' or '}'`.
    #[error("expected {0}")]
    Expected(&'static str),
    #[error("expected a field value")]
    ExpectedFieldValue,
    #[error("expected an array element")]
    ExpectedArrayElement,
    #[error("expected escaped characters")]
    ExpectedEscapeChar,
    #[error("expected the hexadecimal value of a unicode character")]
    ExpectedUnicodeHex,
    #[error("unrecognized token '{0}'")]
    UnrecognizedToken(String),
    #[error("not a string")]
    NotAString,
    #[error("target type is not map or record type")]
    NotMapOrRecord,
    #[error("target type is not array type")]
    NotArray,
    #[error("target union type does not contain map or record type")]
    UnionWithoutMapOrRecord,
    #[error("not a string, string expected")]
    RootNotString,
    #[error("map<string> expected, not a string")]
    MapValueNotString,
    #[error("record rest field not a string")]
    RecordFieldNotString,
    #[error("not a map<string>")]
    NotMapString,
    #[error("given is a string, but array element type is not string")]
    ArrayElementNotString,
    #[error("string is given, but the tuple element type is not string")]
    TupleElementNotString,
    #[error("string in the list expected, not a string")]
    ListElementNotString,
    #[error("no eligible type")]
    NoEligibleType,
    #[error("no eligible types")]
    NoEligibleTypes,
    #[error("no matching type")]
    NoMatchingType,
    #[error("target type array size is not enough")]
    ArraySizeNotEnough,
    #[error("target type array size is too large, array does not have filler values")]
    ArrayWithoutFiller,
    #[error("target type tuple size is too large")]
    TupleSizeTooLarge,
    #[error("target type tuple size is not enough")]
    TupleSizeNotEnough,
    #[error("missing required field '{field}' of type '{field_type}' in record '{record}'")]
    MissingRequiredField {
        field: String,
        field_type: String,
        record: String,
    },
    #[error("field '{field}' cannot be added to the closed record '{record}'")]
    ClosedRecordField { field: String, record: String },
    #[error("value cannot be constructed")]
    CannotConstruct,
    #[error("value cannot be converted to type '{0}'")]
    CannotConvert(String),
    #[error("unsupported type")]
    UnsupportedType,
    #[error("error reading JSON: {0}")]
    Read(String),
}
