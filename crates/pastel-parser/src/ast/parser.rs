//! Core parser infrastructure for Pastel.
//!
//! The [`Parser`] owns a [`TokenCursor`] and borrows the shared
//! [`ParseContext`]. The grammar itself is split across sibling modules,
//! each adding methods to `Parser`:
//! - `entity_parser`: top-level items and top-level imports
//! - `stmt_parser`: statements and code blocks
//! - `expr_parser`: expressions and compile-time functions
//! - `type_parser`: type references
//!
//! There is no error recovery: the first error ends the parse.

use pastel_core::{FileId, ParseError, ParseErrorKind, PastelError, Span};

use crate::ast::decl::Entity;
use crate::context::ParseContext;
use crate::lexer::{Token, TokenCursor, is_valid_name, tokenize};

/// Parser for Pastel source code.
pub struct Parser<'ctx> {
    /// The tokens of the file being parsed.
    pub(crate) tokens: TokenCursor,
    /// Constants, features, loader and source map.
    pub(crate) context: &'ctx mut ParseContext,
}

impl<'ctx> Parser<'ctx> {
    /// Create a parser over already-lexed tokens.
    pub fn new(tokens: TokenCursor, context: &'ctx mut ParseContext) -> Self {
        Self { tokens, context }
    }

    /// Create a parser over a file already registered in the context.
    pub fn for_file(file: FileId, context: &'ctx mut ParseContext) -> Result<Self, PastelError> {
        let tokens = tokenize(context.sources().text(file), file)?;
        Ok(Self::new(TokenCursor::new(tokens), context))
    }

    /// Register a source blob and parse all of its entities.
    ///
    /// # Example
    ///
    /// ```
    /// use pastel_parser::{Parser, ParseContext};
    ///
    /// let mut context = ParseContext::new();
    /// let entities = Parser::parse_source(&mut context, "main.pst", "int one() { return 1; }").unwrap();
    /// assert_eq!(entities.len(), 1);
    /// assert_eq!(entities[0].name(), "one");
    /// ```
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse_source(
        context: &mut ParseContext,
        name: &str,
        text: &str,
    ) -> Result<Vec<Entity>, PastelError> {
        let file = context.add_source(name, text);
        Parser::for_file(file, context)?.parse_entities()
    }

    /// Whether all tokens have been consumed.
    pub fn is_done(&self) -> bool {
        !self.tokens.has_more()
    }

    /// The underlying token cursor, for callers that mix type parsing with
    /// their own small grammars.
    pub fn tokens_mut(&mut self) -> &mut TokenCursor {
        &mut self.tokens
    }

    // =========================================
    // Token helpers
    // =========================================

    /// Pop a token that must be a valid name, failing with `message` otherwise.
    pub(crate) fn pop_name(&mut self, message: &str) -> Result<Token, ParseError> {
        let token = self.tokens.pop()?;
        if is_valid_name(&token.text) {
            Ok(token)
        } else {
            Err(ParseError::new(ParseErrorKind::ExpectedIdentifier, token.span, message))
        }
    }

    /// Whether the next token's text is a valid name.
    pub(crate) fn next_is_name(&self) -> bool {
        is_valid_name(self.tokens.peek_text())
    }

    /// Span of the next token, or of the last token at end of file.
    pub(crate) fn here(&self) -> Span {
        self.tokens.current_span()
    }

    /// Parse a nested file registered in the context with the same context.
    pub(crate) fn nested(&mut self, file: FileId) -> Result<Parser<'_>, PastelError> {
        Parser::for_file(file, self.context)
    }
}
