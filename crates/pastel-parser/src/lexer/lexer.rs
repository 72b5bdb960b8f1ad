//! Main lexer implementation for Pastel.
//!
//! The [`Lexer`] converts source text into a flat `Vec` of [`Token`]s in a
//! single left-to-right scan, dispatching on the first character of each
//! token. A second pass stitches `Integer "." Integer` runs into floats.
//!
//! Lexing stops at the first error. Both lexer errors are end-of-file
//! conditions (an unclosed string or block comment) and are reported at the
//! opening delimiter.

use pastel_core::{FileId, LexError, Span};
use tracing::trace;

use super::cursor::{Cursor, is_whitespace, is_word_char};
use super::token::{TWO_CHAR_PUNCTUATION, Token, TokenKind};

/// Lexer for Pastel source code.
pub struct Lexer<'src> {
    /// Low-level character cursor.
    cursor: Cursor<'src>,
    /// File the produced spans point into.
    file: FileId,
    /// Tokens produced so far.
    tokens: Vec<Token>,
    /// Whether whitespace or a comment was skipped since the last token.
    after_trivia: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    ///
    /// A leading UTF-8 byte order mark is skipped.
    pub fn new(source: &'src str, file: FileId) -> Self {
        let source = source.strip_prefix('\u{FEFF}').unwrap_or(source);
        Self {
            cursor: Cursor::new(source),
            file,
            tokens: Vec::new(),
            after_trivia: false,
        }
    }

    /// Scan the whole input.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        while self.scan_token()? {}
        let tokens = stitch_floats(self.tokens);
        trace!(file = self.file.0, count = tokens.len(), "tokenized");
        Ok(tokens)
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    /// Scan the next token from source. Returns `false` at end of input.
    fn scan_token(&mut self) -> Result<bool, LexError> {
        self.skip_whitespace();

        let Some(first) = self.cursor.peek() else {
            return Ok(false);
        };

        let start_line = self.cursor.line();
        let start_col = self.cursor.column();
        let start_offset = self.cursor.offset();

        // Dispatch based on first character
        match first {
            // Comments or slash operator
            '/' => self.scan_slash(start_line, start_col, start_offset)?,

            // String and char literals
            '"' | '\'' => self.scan_string(first, start_line, start_col, start_offset)?,

            // Words and integers
            c if is_word_char(c) => self.scan_word(start_line, start_col, start_offset),

            // Operators and punctuation
            _ => self.scan_operator(start_line, start_col, start_offset),
        }

        Ok(true)
    }

    /// Skip whitespace, remembering that some was seen.
    fn skip_whitespace(&mut self) {
        if !self.cursor.eat_while(is_whitespace).is_empty() {
            self.after_trivia = true;
        }
    }

    /// Record a token from start position to current position.
    fn push_token(&mut self, kind: TokenKind, start_line: u32, start_col: u32, start_offset: usize) {
        let text = self.cursor.slice_from(start_offset);
        let span = Span::new(self.file, start_line, start_col, text.chars().count() as u32);
        self.tokens
            .push(Token::new(kind, text, span, std::mem::take(&mut self.after_trivia)));
    }

    // =========================================
    // Scanning: Comments and slash
    // =========================================

    /// Scan a slash, which could be `/`, `//`, `/*` or `/=`.
    fn scan_slash(&mut self, start_line: u32, start_col: u32, start_offset: usize) -> Result<(), LexError> {
        match self.cursor.peek_nth(1) {
            // Single-line comment
            Some('/') => {
                self.cursor.eat_while(|c| c != '\n');
                self.after_trivia = true;
                Ok(())
            }

            // Block comment
            Some('*') => {
                self.cursor.advance();
                self.cursor.advance();
                self.scan_block_comment(start_line, start_col)
            }

            _ => {
                self.scan_operator(start_line, start_col, start_offset);
                Ok(())
            }
        }
    }

    /// Scan the rest of a block comment. Block comments do not nest.
    fn scan_block_comment(&mut self, start_line: u32, start_col: u32) -> Result<(), LexError> {
        loop {
            if self.cursor.check_str("*/") {
                self.cursor.advance();
                self.cursor.advance();
                self.after_trivia = true;
                return Ok(());
            }
            if self.cursor.advance().is_none() {
                return Err(LexError::UnclosedComment {
                    span: Span::new(self.file, start_line, start_col, 2),
                });
            }
        }
    }

    // =========================================
    // Scanning: Strings
    // =========================================

    /// Scan a string literal starting with the given quote character.
    ///
    /// The token keeps its raw text; escapes are decoded by the parser. A
    /// backslash protects whatever character follows it, and strings may
    /// span lines.
    fn scan_string(
        &mut self,
        quote: char,
        start_line: u32,
        start_col: u32,
        start_offset: usize,
    ) -> Result<(), LexError> {
        self.cursor.advance(); // opening quote

        loop {
            match self.cursor.advance() {
                None => {
                    return Err(LexError::UnclosedString {
                        span: Span::new(self.file, start_line, start_col, 1),
                        hint: self.suspicious_string_hint(),
                    });
                }
                Some('\\') => {
                    self.cursor.advance();
                }
                Some(c) if c == quote => {
                    self.push_token(TokenKind::String, start_line, start_col, start_offset);
                    return Ok(());
                }
                Some(_) => {}
            }
        }
    }

    /// Point at the first completed string literal that spans a newline.
    ///
    /// A string with a missing closing quote swallows everything up to the
    /// next quote, so the first multi-line string is usually the culprit.
    fn suspicious_string_hint(&self) -> String {
        self.tokens
            .iter()
            .find(|t| t.kind == TokenKind::String && t.text.contains('\n'))
            .map(|t| format!(" The string on line {} is suspicious.", t.span.line))
            .unwrap_or_default()
    }

    // =========================================
    // Scanning: Words
    // =========================================

    /// Scan a run of word characters.
    ///
    /// A run starting with a digit is an integer; validating its digits
    /// (including `0x` hex forms) is left to the parser.
    fn scan_word(&mut self, start_line: u32, start_col: u32, start_offset: usize) {
        let text = self.cursor.eat_while(is_word_char);
        let kind = if text.starts_with(|c: char| c.is_ascii_digit()) {
            TokenKind::Integer
        } else {
            TokenKind::Word
        };
        self.push_token(kind, start_line, start_col, start_offset);
    }

    // =========================================
    // Scanning: Operators
    // =========================================

    /// Scan one- or two-character punctuation.
    fn scan_operator(&mut self, start_line: u32, start_col: u32, start_offset: usize) {
        let two_char = TWO_CHAR_PUNCTUATION
            .iter()
            .any(|pair| self.cursor.check_str(pair));
        self.cursor.advance();
        if two_char {
            self.cursor.advance();
        }
        self.push_token(TokenKind::Punctuation, start_line, start_col, start_offset);
    }
}

/// Convenience wrapper: tokenize a whole source blob.
pub fn tokenize(source: &str, file: FileId) -> Result<Vec<Token>, LexError> {
    Lexer::new(source, file).tokenize()
}

// =========================================
// Float stitching
// =========================================

/// Merge `Integer "." Integer` runs into single [`TokenKind::Float`] tokens.
///
/// Only runs with no whitespace around the dot and plain decimal digits on
/// both sides are merged. Anything else is left for the parser to diagnose.
fn stitch_floats(tokens: Vec<Token>) -> Vec<Token> {
    let is_decimal =
        |t: &Token| t.kind == TokenKind::Integer && t.text.chars().all(|c| c.is_ascii_digit());

    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();
    while let Some(token) = iter.next() {
        let dot_follows = is_decimal(&token)
            && iter
                .peek()
                .is_some_and(|dot| dot.is(".") && dot.is_adjacent());
        if !dot_follows {
            out.push(token);
            continue;
        }

        let Some(dot) = iter.next() else {
            out.push(token);
            break;
        };
        match iter.peek() {
            Some(fraction) if is_decimal(fraction) && fraction.is_adjacent() => {
                let text = format!("{}.{}", token.text, fraction.text);
                let span = Span::new(
                    token.span.file,
                    token.span.line,
                    token.span.col,
                    text.chars().count() as u32,
                );
                out.push(Token::new(TokenKind::Float, text, span, token.leading_whitespace));
                iter.next();
            }
            _ => {
                out.push(token);
                out.push(dot);
            }
        }
    }
    out
}
