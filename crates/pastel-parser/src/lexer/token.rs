//! Token types for Pastel.
//!
//! Pastel tokens are deliberately coarse: the lexer only separates words,
//! numbers, string literals and punctuation. Keywords are recognized by the
//! parser from the token text, so `if`, `class` and `Core` are all plain
//! [`TokenKind::Word`]s here.

use std::fmt;

use pastel_core::Span;

/// The category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// An identifier or keyword: `[A-Za-z_][A-Za-z0-9_]*`.
    Word,
    /// A run of word characters starting with a digit, e.g. `42` or `0x1F`.
    Integer,
    /// A decimal number with a fractional part, e.g. `3.14`.
    Float,
    /// A string or char literal, including its quotes and raw escapes.
    String,
    /// One or two punctuation characters.
    Punctuation,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Word => "word",
            TokenKind::Integer => "integer",
            TokenKind::Float => "float",
            TokenKind::String => "string",
            TokenKind::Punctuation => "punctuation",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token category.
    pub kind: TokenKind,
    /// The exact source text of the token.
    pub text: String,
    /// Where the token starts.
    pub span: Span,
    /// Whether whitespace or a comment separated this token from the previous one.
    pub leading_whitespace: bool,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span, leading_whitespace: bool) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            leading_whitespace,
        }
    }

    /// Check whether the token text is exactly `text`.
    #[inline]
    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }

    /// Whether this token is directly attached to the previous one.
    #[inline]
    pub fn is_adjacent(&self) -> bool {
        !self.leading_whitespace
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Punctuation pairs that form a single token.
///
/// `>>` is missing on purpose: `List<List<int>>` must close two generic
/// lists, so the parser stitches a shift from two adjacent `>` tokens.
pub const TWO_CHAR_PUNCTUATION: &[&str] = &[
    "++", "--", "==", "!=", "<=", ">=", "&&", "||", "+=", "-=", "*=", "/=", "%=", "&=", "|=",
    "^=", "<<",
];

/// Check whether a string is a valid variable, type or function name.
///
/// Names consist of ASCII letters, digits and underscores and do not start
/// with a digit.
pub fn is_valid_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
