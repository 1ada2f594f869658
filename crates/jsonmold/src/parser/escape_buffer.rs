//! Accumulates the four hexadecimal digits of a `\uXXXX` escape.
//!
//! The decoded 16-bit unit may be half of a UTF-16 surrogate pair. A high
//! half is held back until the next escape completes it; an adjacent low
//! half combines into the coded scalar, and an unpaired half degrades to
//! U+FFFD since Rust strings cannot carry lone surrogates.

use alloc::string::String;

#[derive(Debug, Default)]
pub(crate) struct UnicodeEscapeBuffer {
    digits: [u8; 4],
    len: u8,
    pending_high: Option<u16>,
}

impl UnicodeEscapeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears digits and any held surrogate half.
    pub fn reset(&mut self) {
        self.len = 0;
        self.pending_high = None;
    }

    /// Appends the replacement character for a held-back high half that was
    /// never completed. Must run before any non-escape character joins the
    /// lexeme buffer and before the lexeme is taken.
    pub fn flush(&mut self, dest: &mut String) {
        if self.pending_high.take().is_some() {
            dest.push('\u{FFFD}');
        }
    }

    /// Feeds one hex digit. `Ok(true)` when the escape is complete and the
    /// decoded character (if any) has been appended to `dest`; `Err(())` on
    /// a non-hex digit, with the accumulated digits discarded.
    pub fn feed(&mut self, c: char, dest: &mut String) -> Result<bool, ()> {
        if !c.is_ascii_hexdigit() {
            self.len = 0;
            return Err(());
        }
        self.digits[self.len as usize] = c as u8;
        self.len += 1;
        if self.len < 4 {
            return Ok(false);
        }
        self.len = 0;

        let hex = core::str::from_utf8(&self.digits).unwrap_or_default();
        let unit = match u32::from_str_radix(hex, 16) {
            Ok(code) => code as u16,
            Err(_) => return Err(()),
        };
        match unit {
            0xD800..=0xDBFF => {
                self.flush(dest);
                self.pending_high = Some(unit);
            }
            0xDC00..=0xDFFF => match self.pending_high.take() {
                Some(high) => {
                    let scalar = 0x10000
                        + ((u32::from(high) - 0xD800) << 10)
                        + (u32::from(unit) - 0xDC00);
                    // A completed pair always encodes a valid scalar.
                    if let Some(ch) = char::from_u32(scalar) {
                        dest.push(ch);
                    }
                }
                None => dest.push('\u{FFFD}'),
            },
            _ => {
                self.flush(dest);
                // Non-surrogate BMP units are valid scalars.
                if let Some(ch) = char::from_u32(u32::from(unit)) {
                    dest.push(ch);
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::UnicodeEscapeBuffer;
    use alloc::string::String;

    fn feed_all(buf: &mut UnicodeEscapeBuffer, digits: &str, dest: &mut String) {
        for (i, ch) in digits.chars().enumerate() {
            let done = buf.feed(ch, dest).unwrap();
            assert_eq!(done, i == digits.len() - 1);
        }
    }

    #[test]
    fn basic_decoding() {
        let mut buf = UnicodeEscapeBuffer::new();
        let mut out = String::new();
        feed_all(&mut buf, "0041", &mut out);
        assert_eq!(out, "A");
    }

    #[test]
    fn mixed_case_hex() {
        let mut buf = UnicodeEscapeBuffer::new();
        let mut out = String::new();
        feed_all(&mut buf, "00e9", &mut out);
        feed_all(&mut buf, "00E9", &mut out);
        assert_eq!(out, "éé");
    }

    #[test]
    fn surrogate_pair_combines() {
        let mut buf = UnicodeEscapeBuffer::new();
        let mut out = String::new();
        feed_all(&mut buf, "D83D", &mut out);
        assert_eq!(out, "");
        feed_all(&mut buf, "DE00", &mut out);
        assert_eq!(out, "😀");
    }

    #[test]
    fn lone_high_half_degrades_on_flush() {
        let mut buf = UnicodeEscapeBuffer::new();
        let mut out = String::new();
        feed_all(&mut buf, "D83D", &mut out);
        buf.flush(&mut out);
        assert_eq!(out, "\u{FFFD}");
    }

    #[test]
    fn lone_low_half_degrades() {
        let mut buf = UnicodeEscapeBuffer::new();
        let mut out = String::new();
        feed_all(&mut buf, "DE00", &mut out);
        assert_eq!(out, "\u{FFFD}");
    }

    #[test]
    fn invalid_hex_rejected() {
        let mut buf = UnicodeEscapeBuffer::new();
        let mut out = String::new();
        assert!(buf.feed('G', &mut out).is_err());
        // Digit state is discarded; a fresh escape works.
        feed_all(&mut buf, "0042", &mut out);
        assert_eq!(out, "B");
    }
}
