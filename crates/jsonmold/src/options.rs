/// Configuration options for the stream parser.
///
/// # Default
///
/// All options default to `false`; the default parser accepts exactly the
/// JSON grammar of ECMA-404.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    /// Whether `'` may open a string literal.
    ///
    /// The parser tracks the opening character verbatim, so a string opened
    /// with `'` is closed only by `'` and a `"` inside it needs no escape.
    /// Field names, string values, and string array elements all honour the
    /// flag.
    ///
    /// # Default
    ///
    /// `false`: only `"` opens a string.
    pub allow_single_quotes: bool,
}
