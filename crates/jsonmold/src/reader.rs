//! Pull-based entry point over [`std::io::Read`].
//!
//! Input is pulled in fixed 1 KiB blocks. The bytes must be UTF-8; a
//! multi-byte sequence split across two blocks is carried over and decoded
//! once complete.

use alloc::{string::ToString, vec::Vec};
use std::io::Read;

use crate::{
    error::{ParseError, ParseErrorKind},
    parser::{ResetGuard, StateMachine, StreamParser},
    typedesc::TypeRef,
    value::Value,
};

const BLOCK_SIZE: usize = 1024;

impl StreamParser {
    /// Parses a JSON document pulled from `reader` against the target type.
    ///
    /// Only the read may block; the state machine itself never yields. Read
    /// failures surface as [`ParseErrorKind::Read`].
    pub fn parse_reader<R: Read>(
        &mut self,
        mut reader: R,
        target: &TypeRef,
    ) -> Result<Value, ParseError> {
        let guard = ResetGuard::new(&mut self.machine);
        guard.machine.begin(target);

        let mut block = [0u8; BLOCK_SIZE];
        let mut pending: Vec<u8> = Vec::new();
        loop {
            let count = match reader.read(&mut block) {
                Ok(0) => break,
                Ok(count) => count,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(guard.machine.error(ParseErrorKind::Read(e.to_string())))
                }
            };
            if pending.is_empty() {
                let consumed = drive_valid_prefix(guard.machine, &block[..count])?;
                pending.extend_from_slice(&block[consumed..count]);
            } else {
                pending.extend_from_slice(&block[..count]);
                let consumed = drive_valid_prefix(guard.machine, &pending)?;
                pending.drain(..consumed);
            }
        }
        if !pending.is_empty() {
            return Err(guard.machine.error(ParseErrorKind::Read(
                "incomplete UTF-8 sequence at end of input".to_string(),
            )));
        }
        guard.machine.finish()
    }
}

/// Parses a JSON document from `reader` with a fresh parser.
pub fn parse_reader<R: Read>(reader: R, target: &TypeRef) -> Result<Value, ParseError> {
    StreamParser::new().parse_reader(reader, target)
}

/// Feeds the longest valid UTF-8 prefix of `bytes` to the machine and
/// returns its length. An incomplete trailing sequence is left for the next
/// block; actually invalid bytes are an error.
fn drive_valid_prefix(machine: &mut StateMachine, bytes: &[u8]) -> Result<usize, ParseError> {
    match core::str::from_utf8(bytes) {
        Ok(text) => {
            machine.drive(text)?;
            Ok(bytes.len())
        }
        Err(e) => {
            if e.error_len().is_some() {
                return Err(
                    machine.error(ParseErrorKind::Read("invalid UTF-8 in input".to_string()))
                );
            }
            let valid = e.valid_up_to();
            match core::str::from_utf8(&bytes[..valid]) {
                Ok(text) => machine.drive(text)?,
                Err(_) => unreachable!("prefix below valid_up_to is valid UTF-8"),
            }
            Ok(valid)
        }
    }
}
