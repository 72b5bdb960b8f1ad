//! A rewindable cursor over a token vector.
//!
//! The Pastel grammar is parsed with speculation: the statement parser tries
//! a type followed by a name, and the expression parser tries a cast, then
//! both rewind with [`TokenCursor::restore`] when the guess is wrong. A
//! snapshot is just the current index.

use pastel_core::{ParseError, Span};

use super::token::{Token, TokenKind, is_valid_name};

/// A cursor over the tokens of one source file.
#[derive(Debug, Clone)]
pub struct TokenCursor {
    tokens: Vec<Token>,
    index: usize,
    /// Position reported for unexpected end of file.
    eof_span: Span,
}

impl TokenCursor {
    /// Create a cursor at the first token.
    pub fn new(tokens: Vec<Token>) -> Self {
        let eof_span = tokens.last().map(|t| t.span).unwrap_or_default();
        Self {
            tokens,
            index: 0,
            eof_span,
        }
    }

    /// Save the current position.
    #[inline]
    pub fn snapshot(&self) -> usize {
        self.index
    }

    /// Rewind (or fast-forward) to a saved position.
    #[inline]
    pub fn restore(&mut self, snapshot: usize) {
        self.index = snapshot;
    }

    /// Whether any tokens remain.
    #[inline]
    pub fn has_more(&self) -> bool {
        self.index < self.tokens.len()
    }

    /// The next token, if any.
    #[inline]
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    /// The text of the next token, or `""` at end of file.
    #[inline]
    pub fn peek_text(&self) -> &str {
        self.peek().map_or("", |t| t.text.as_str())
    }

    /// The token `n` places after the next one (0 = next).
    #[inline]
    pub fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.index + n)
    }

    /// Whether the next token's text is exactly `text`.
    #[inline]
    pub fn is_next(&self, text: &str) -> bool {
        self.peek().is_some_and(|t| t.is(text))
    }

    /// Span of the next token, or of the last token at end of file.
    pub fn current_span(&self) -> Span {
        self.peek().map_or(self.eof_span, |t| t.span)
    }

    /// Span used for end-of-file errors.
    pub fn eof_span(&self) -> Span {
        self.eof_span
    }

    /// Consume the next token.
    pub fn pop(&mut self) -> Result<Token, ParseError> {
        let token = self
            .tokens
            .get(self.index)
            .cloned()
            .ok_or_else(|| ParseError::unexpected_eof(self.eof_span))?;
        self.index += 1;
        Ok(token)
    }

    /// Skip the next token.
    #[inline]
    pub fn advance(&mut self) {
        if self.has_more() {
            self.index += 1;
        }
    }

    /// Consume the next token if its text is `text`.
    pub fn pop_if_present(&mut self, text: &str) -> bool {
        if self.is_next(text) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Consume the next token, which must be `text`.
    pub fn pop_expected(&mut self, text: &str) -> Result<Token, ParseError> {
        let token = self.pop()?;
        if token.is(text) {
            Ok(token)
        } else {
            Err(ParseError::expected_token(token.span, text, &token.text))
        }
    }

    /// Consume the next token, which must be a valid name.
    pub fn pop_word(&mut self) -> Result<Token, ParseError> {
        let token = self.pop()?;
        if token.kind == TokenKind::Word && is_valid_name(&token.text) {
            Ok(token)
        } else {
            Err(ParseError::expected_identifier(token.span, &token.text))
        }
    }

    /// Consume `<<` or two adjacent `>` tokens as a single shift operator.
    ///
    /// The lexer never produces `>>` so that nested generics close
    /// correctly; this is where it is put back together. A `>` followed by
    /// a spaced `>` is not a shift.
    pub fn pop_bit_shift_if_present(&mut self) -> Option<Token> {
        let first = self.peek()?;
        if first.is("<<") {
            return self.pop().ok();
        }
        if !first.is(">") {
            return None;
        }
        let second = self.peek_ahead(1)?;
        if !second.is(">") || second.leading_whitespace {
            return None;
        }

        let span = Span::new(first.span.file, first.span.line, first.span.col, 2);
        let token = Token::new(TokenKind::Punctuation, ">>", span, first.leading_whitespace);
        self.index += 2;
        Some(token)
    }
}
