//! The schema-directed streaming parser.
//!
//! The parser is a character-driven state machine. Each input character is
//! classified against the current [`State`]; structural characters open and
//! close containers through the construction stacks (see `construct`), and
//! lexeme characters accumulate in a scratch buffer until the lexeme is
//! complete and can be attached to the value under construction. Traversal
//! is recursion-free: nesting depth lives on explicit stacks, never on the
//! host call stack.

mod construct;
mod escape_buffer;

use alloc::{string::String, vec::Vec};

use escape_buffer::UnicodeEscapeBuffer;

use crate::{
    error::{ParseError, ParseErrorKind},
    options::ParserOptions,
    typedesc::{implied_type, TypeRef},
    value::Value,
};

/// A reusable schema-directed JSON parser.
///
/// One instance serves one thread; reuse between parses amortises buffer
/// allocation. Per-parse state is discarded on every exit path, so a failed
/// parse never leaks values into the next call.
///
/// # Examples
///
/// ```
/// use jsonmold::{RecordDesc, StreamParser, TypeDesc, Value};
///
/// let ty = RecordDesc::new("Point")
///     .field("x", TypeDesc::int())
///     .field("y", TypeDesc::int())
///     .build();
/// let mut parser = StreamParser::new();
/// let value = parser.parse_str(r#"{"x":1,"y":2}"#, &ty).unwrap();
/// assert_eq!(value.as_map().unwrap().get("x"), Some(&Value::Int(1)));
/// ```
pub struct StreamParser {
    pub(crate) machine: StateMachine,
}

impl StreamParser {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    #[must_use]
    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            machine: StateMachine::new(options),
        }
    }

    /// Parses a complete JSON document against the target type.
    pub fn parse_str(&mut self, json: &str, target: &TypeRef) -> Result<Value, ParseError> {
        let guard = ResetGuard::new(&mut self.machine);
        guard.machine.begin(target);
        guard.machine.drive(json)?;
        guard.machine.finish()
    }

    /// Parses a UTF-8 byte slice against the target type.
    pub fn parse_bytes(&mut self, bytes: &[u8], target: &TypeRef) -> Result<Value, ParseError> {
        match core::str::from_utf8(bytes) {
            Ok(json) => self.parse_str(json, target),
            Err(e) => Err(ParseError {
                kind: ParseErrorKind::Read(alloc::format!("invalid UTF-8: {e}")),
                line: 1,
                column: 0,
            }),
        }
    }
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a complete JSON document with a fresh parser.
pub fn parse_str(json: &str, target: &TypeRef) -> Result<Value, ParseError> {
    StreamParser::new().parse_str(json, target)
}

/// Parses a UTF-8 byte slice with a fresh parser.
pub fn parse_bytes(bytes: &[u8], target: &TypeRef) -> Result<Value, ParseError> {
    StreamParser::new().parse_bytes(bytes, target)
}

/// Runs `reset` on the wrapped machine whatever way the parse exits.
pub(crate) struct ResetGuard<'a> {
    pub(crate) machine: &'a mut StateMachine,
}

impl<'a> ResetGuard<'a> {
    pub(crate) fn new(machine: &'a mut StateMachine) -> Self {
        Self { machine }
    }
}

impl Drop for ResetGuard<'_> {
    fn drop(&mut self) {
        self.machine.reset();
    }
}

/// The lexeme context a string escape belongs to; doubles as the
/// back-pointer for returning from escape sub-states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringCtx {
    FieldName,
    StringValue,
    StringFieldValue,
    StringArrayElement,
}

impl StringCtx {
    fn resume(self) -> State {
        match self {
            StringCtx::FieldName => State::FieldName,
            StringCtx::StringValue => State::StringValue,
            StringCtx::StringFieldValue => State::StringFieldValue,
            StringCtx::StringArrayElement => State::StringArrayElement,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    DocStart,
    DocEnd,
    FirstFieldReady,
    NonFirstFieldReady,
    FieldName,
    EndFieldName,
    FieldValueReady,
    StringFieldValue,
    NonStringFieldValue,
    StringValue,
    NonStringValue,
    FieldEnd,
    FirstArrayElementReady,
    NonFirstArrayElementReady,
    StringArrayElement,
    NonStringArrayElement,
    ArrayElementEnd,
    Escape(StringCtx),
    UnicodeHex(StringCtx),
}

/// One unit of input: a character or the end-of-input sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ch {
    Char(char),
    Eof,
}

/// Whether a transition consumed the character or wants it re-dispatched to
/// the new state.
enum Flow {
    Consumed,
    Redispatch,
}

/// Which position a non-string lexeme fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LexemeKind {
    Field,
    ArrayElement,
    Value,
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

pub(crate) struct StateMachine {
    options: ParserOptions,
    state: State,

    // Construction stacks, indexed together by nesting depth. The list
    // index and union candidate stacks only hold frames that need one.
    pub(crate) nodes: Vec<Value>,
    pub(crate) target_types: Vec<TypeRef>,
    pub(crate) list_indices: Vec<usize>,
    pub(crate) possible_types: Vec<Vec<TypeRef>>,
    pub(crate) field_names: Vec<String>,
    pub(crate) current_node: Option<Value>,

    // Lexer scratch.
    pub(crate) buffer: String,
    unicode_escape_buffer: UnicodeEscapeBuffer,
    quote_char: char,

    pub(crate) line: usize,
    pub(crate) column: usize,
}

impl StateMachine {
    pub(crate) fn new(options: ParserOptions) -> Self {
        Self {
            options,
            state: State::DocStart,
            nodes: Vec::new(),
            target_types: Vec::new(),
            list_indices: Vec::new(),
            possible_types: Vec::new(),
            field_names: Vec::new(),
            current_node: None,
            buffer: String::new(),
            unicode_escape_buffer: UnicodeEscapeBuffer::new(),
            quote_char: '"',
            line: 1,
            column: 0,
        }
    }

    /// Clears all per-parse state. Values from one parse must never be
    /// reachable from the next.
    pub(crate) fn reset(&mut self) {
        self.state = State::DocStart;
        self.nodes.clear();
        self.target_types.clear();
        self.list_indices.clear();
        self.possible_types.clear();
        self.field_names.clear();
        self.current_node = None;
        self.buffer.clear();
        self.unicode_escape_buffer.reset();
        self.quote_char = '"';
        self.line = 1;
        self.column = 0;
    }

    pub(crate) fn begin(&mut self, target: &TypeRef) {
        self.target_types.push(implied_type(target));
    }

    pub(crate) fn drive(&mut self, chunk: &str) -> Result<(), ParseError> {
        for ch in chunk.chars() {
            self.step(Ch::Char(ch))?;
        }
        Ok(())
    }

    /// Injects end-of-input and returns the root value. Exactly one terminal
    /// transition happens per parse.
    pub(crate) fn finish(&mut self) -> Result<Value, ParseError> {
        self.step(Ch::Eof)?;
        if self.state != State::DocEnd {
            return Err(self.error(ParseErrorKind::InvalidDocument));
        }
        self.current_node
            .take()
            .ok_or_else(|| self.error(ParseErrorKind::InvalidDocument))
    }

    fn step(&mut self, ch: Ch) -> Result<(), ParseError> {
        self.process_location(ch);
        loop {
            match self.transition(ch)? {
                Flow::Consumed => return Ok(()),
                Flow::Redispatch => {}
            }
        }
    }

    fn process_location(&mut self, ch: Ch) {
        if ch == Ch::Char('\n') {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    pub(crate) fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            line: self.line,
            column: self.column,
        }
    }

    fn opens_string(&self, c: char) -> bool {
        c == '"' || (self.options.allow_single_quotes && c == '\'')
    }

    /// Appends a lexeme character, first downgrading any unpaired surrogate
    /// half left by a previous escape.
    fn append(&mut self, c: char) {
        self.unicode_escape_buffer.flush(&mut self.buffer);
        self.buffer.push(c);
    }

    /// Takes the accumulated lexeme, leaving the buffer empty.
    pub(crate) fn take_lexeme(&mut self) -> String {
        self.unicode_escape_buffer.flush(&mut self.buffer);
        core::mem::take(&mut self.buffer)
    }

    fn transition(&mut self, ch: Ch) -> Result<Flow, ParseError> {
        match self.state {
            State::DocStart => self.doc_start(ch),
            State::DocEnd => self.doc_end(ch),
            State::FirstFieldReady => self.first_field_ready(ch),
            State::NonFirstFieldReady => self.non_first_field_ready(ch),
            State::FieldName => self.string_lexeme(StringCtx::FieldName, ch),
            State::EndFieldName => self.end_field_name_state(ch),
            State::FieldValueReady => self.field_value_ready(ch),
            State::StringFieldValue => self.string_lexeme(StringCtx::StringFieldValue, ch),
            State::NonStringFieldValue => self.non_string_lexeme(LexemeKind::Field, ch),
            State::StringValue => self.string_lexeme(StringCtx::StringValue, ch),
            State::NonStringValue => self.non_string_lexeme(LexemeKind::Value, ch),
            State::FieldEnd => self.field_end(ch),
            State::FirstArrayElementReady => self.first_array_element_ready(ch),
            State::NonFirstArrayElementReady => self.non_first_array_element_ready(ch),
            State::StringArrayElement => self.string_lexeme(StringCtx::StringArrayElement, ch),
            State::NonStringArrayElement => self.non_string_lexeme(LexemeKind::ArrayElement, ch),
            State::ArrayElementEnd => self.array_element_end(ch),
            State::Escape(ctx) => self.escape(ctx, ch),
            State::UnicodeHex(ctx) => self.unicode_hex(ctx, ch),
        }
    }

    fn doc_start(&mut self, ch: Ch) -> Result<Flow, ParseError> {
        match ch {
            Ch::Char(c) if is_whitespace(c) => Ok(Flow::Consumed),
            Ch::Char('{') => {
                self.state = self.open_object()?;
                Ok(Flow::Consumed)
            }
            Ch::Char('[') => {
                self.state = self.open_array()?;
                Ok(Flow::Consumed)
            }
            Ch::Char(c) if self.opens_string(c) => {
                self.quote_char = c;
                self.state = State::StringValue;
                Ok(Flow::Consumed)
            }
            Ch::Eof => Err(self.error(ParseErrorKind::EmptyDocument)),
            Ch::Char(_) => {
                self.state = State::NonStringValue;
                Ok(Flow::Redispatch)
            }
        }
    }

    fn doc_end(&mut self, ch: Ch) -> Result<Flow, ParseError> {
        match ch {
            Ch::Char(c) if is_whitespace(c) => Ok(Flow::Consumed),
            Ch::Eof => Ok(Flow::Consumed),
            Ch::Char(_) => Err(self.error(ParseErrorKind::DocumentEnded)),
        }
    }

    fn first_field_ready(&mut self, ch: Ch) -> Result<Flow, ParseError> {
        match ch {
            Ch::Char(c) if is_whitespace(c) => Ok(Flow::Consumed),
            Ch::Char(c) if self.opens_string(c) => {
                self.quote_char = c;
                self.state = State::FieldName;
                Ok(Flow::Consumed)
            }
            Ch::Char('}') => {
                self.state = self.finalize_container()?;
                Ok(Flow::Consumed)
            }
            Ch::Eof => Err(self.error(ParseErrorKind::UnexpectedEnd)),
            Ch::Char(_) => Err(self.error(ParseErrorKind::Expected(r#"'"' or '}'"#))),
        }
    }

    fn non_first_field_ready(&mut self, ch: Ch) -> Result<Flow, ParseError> {
        match ch {
            Ch::Char(c) if is_whitespace(c) => Ok(Flow::Consumed),
            Ch::Char(c) if self.opens_string(c) => {
                self.quote_char = c;
                self.state = State::FieldName;
                Ok(Flow::Consumed)
            }
            Ch::Eof => Err(self.error(ParseErrorKind::UnexpectedEnd)),
            Ch::Char(_) => Err(self.error(ParseErrorKind::Expected(r#"'"'"#))),
        }
    }

    fn end_field_name_state(&mut self, ch: Ch) -> Result<Flow, ParseError> {
        match ch {
            Ch::Char(c) if is_whitespace(c) => Ok(Flow::Consumed),
            Ch::Char(':') => {
                self.state = State::FieldValueReady;
                Ok(Flow::Consumed)
            }
            Ch::Eof => Err(self.error(ParseErrorKind::UnexpectedEnd)),
            Ch::Char(_) => Err(self.error(ParseErrorKind::Expected("':'"))),
        }
    }

    fn field_value_ready(&mut self, ch: Ch) -> Result<Flow, ParseError> {
        match ch {
            Ch::Char(c) if is_whitespace(c) => Ok(Flow::Consumed),
            Ch::Char(c) if self.opens_string(c) => {
                self.quote_char = c;
                self.state = State::StringFieldValue;
                Ok(Flow::Consumed)
            }
            Ch::Char('{') => {
                self.state = self.open_object()?;
                Ok(Flow::Consumed)
            }
            Ch::Char('[') => {
                self.state = self.open_array()?;
                Ok(Flow::Consumed)
            }
            Ch::Char('}' | ']') => Err(self.error(ParseErrorKind::ExpectedFieldValue)),
            Ch::Eof => Err(self.error(ParseErrorKind::UnexpectedEnd)),
            Ch::Char(_) => {
                self.state = State::NonStringFieldValue;
                Ok(Flow::Redispatch)
            }
        }
    }

    fn first_array_element_ready(&mut self, ch: Ch) -> Result<Flow, ParseError> {
        match ch {
            Ch::Char(c) if is_whitespace(c) => Ok(Flow::Consumed),
            Ch::Char(c) if self.opens_string(c) => {
                self.quote_char = c;
                self.state = State::StringArrayElement;
                Ok(Flow::Consumed)
            }
            Ch::Char('{') => {
                self.state = self.open_object()?;
                Ok(Flow::Consumed)
            }
            Ch::Char('[') => {
                self.state = self.open_array()?;
                Ok(Flow::Consumed)
            }
            Ch::Char(']') => {
                self.state = self.finalize_container()?;
                Ok(Flow::Consumed)
            }
            Ch::Eof => Err(self.error(ParseErrorKind::UnexpectedEnd)),
            Ch::Char(_) => {
                self.state = State::NonStringArrayElement;
                Ok(Flow::Redispatch)
            }
        }
    }

    fn non_first_array_element_ready(&mut self, ch: Ch) -> Result<Flow, ParseError> {
        match ch {
            Ch::Char(c) if is_whitespace(c) => Ok(Flow::Consumed),
            Ch::Char(c) if self.opens_string(c) => {
                self.quote_char = c;
                self.state = State::StringArrayElement;
                Ok(Flow::Consumed)
            }
            Ch::Char('{') => {
                self.state = self.open_object()?;
                Ok(Flow::Consumed)
            }
            Ch::Char('[') => {
                self.state = self.open_array()?;
                Ok(Flow::Consumed)
            }
            Ch::Char(']') => Err(self.error(ParseErrorKind::ExpectedArrayElement)),
            Ch::Eof => Err(self.error(ParseErrorKind::UnexpectedEnd)),
            Ch::Char(_) => {
                self.state = State::NonStringArrayElement;
                Ok(Flow::Redispatch)
            }
        }
    }

    fn field_end(&mut self, ch: Ch) -> Result<Flow, ParseError> {
        match ch {
            Ch::Char(c) if is_whitespace(c) => Ok(Flow::Consumed),
            Ch::Char(',') => {
                self.state = State::NonFirstFieldReady;
                Ok(Flow::Consumed)
            }
            Ch::Char('}') => {
                self.state = self.finalize_container()?;
                Ok(Flow::Consumed)
            }
            Ch::Eof => Err(self.error(ParseErrorKind::UnexpectedEnd)),
            Ch::Char(_) => Err(self.error(ParseErrorKind::Expected("',' or '}'"))),
        }
    }

    fn array_element_end(&mut self, ch: Ch) -> Result<Flow, ParseError> {
        match ch {
            Ch::Char(c) if is_whitespace(c) => Ok(Flow::Consumed),
            Ch::Char(',') => {
                self.state = State::NonFirstArrayElementReady;
                Ok(Flow::Consumed)
            }
            Ch::Char(']') => {
                self.state = self.finalize_container()?;
                Ok(Flow::Consumed)
            }
            Ch::Eof => Err(self.error(ParseErrorKind::UnexpectedEnd)),
            Ch::Char(_) => Err(self.error(ParseErrorKind::Expected("',' or ']'"))),
        }
    }

    /// Shared handler for the four string lexeme states.
    fn string_lexeme(&mut self, ctx: StringCtx, ch: Ch) -> Result<Flow, ParseError> {
        match ch {
            Ch::Char(c) if c == self.quote_char => {
                self.state = self.end_string_lexeme(ctx)?;
                Ok(Flow::Consumed)
            }
            Ch::Char('\\') => {
                self.state = State::Escape(ctx);
                Ok(Flow::Consumed)
            }
            Ch::Eof => Err(self.error(ParseErrorKind::UnexpectedEnd)),
            Ch::Char(c) => {
                self.append(c);
                Ok(Flow::Consumed)
            }
        }
    }

    /// Shared handler for the three non-string lexeme states. The
    /// terminator is not consumed: after the lexeme is processed it is
    /// re-dispatched to the post-value state.
    fn non_string_lexeme(&mut self, kind: LexemeKind, ch: Ch) -> Result<Flow, ParseError> {
        let terminated = match ch {
            Ch::Char(c) => is_whitespace(c) || matches!(c, ',' | '}' | ']'),
            Ch::Eof => true,
        };
        if terminated {
            self.process_non_string_value(kind)?;
            self.state = match kind {
                LexemeKind::Field => State::FieldEnd,
                LexemeKind::ArrayElement => State::ArrayElementEnd,
                LexemeKind::Value => State::DocEnd,
            };
            return Ok(Flow::Redispatch);
        }
        match ch {
            Ch::Char(c) => {
                self.append(c);
                Ok(Flow::Consumed)
            }
            Ch::Eof => unreachable!("EOF terminates a non-string lexeme"),
        }
    }

    fn escape(&mut self, ctx: StringCtx, ch: Ch) -> Result<Flow, ParseError> {
        let c = match ch {
            Ch::Char(c) => c,
            Ch::Eof => return Err(self.error(ParseErrorKind::UnexpectedEnd)),
        };
        let decoded = match c {
            '"' | '\\' | '/' => c,
            'b' => '\u{0008}',
            'f' => '\u{000C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => {
                self.state = State::UnicodeHex(ctx);
                return Ok(Flow::Consumed);
            }
            _ => return Err(self.error(ParseErrorKind::ExpectedEscapeChar)),
        };
        self.append(decoded);
        self.state = ctx.resume();
        Ok(Flow::Consumed)
    }

    fn unicode_hex(&mut self, ctx: StringCtx, ch: Ch) -> Result<Flow, ParseError> {
        let c = match ch {
            Ch::Char(c) => c,
            Ch::Eof => return Err(self.error(ParseErrorKind::UnexpectedEnd)),
        };
        match self.unicode_escape_buffer.feed(c, &mut self.buffer) {
            Ok(true) => {
                self.state = ctx.resume();
                Ok(Flow::Consumed)
            }
            Ok(false) => Ok(Flow::Consumed),
            Err(()) => Err(self.error(ParseErrorKind::ExpectedUnicodeHex)),
        }
    }
}
