//! Type reference parsing for Pastel.
//!
//! Grammar: `NAME ('.' NAME)? ('<' TYPE (',' TYPE)* '>')?`
//!
//! Type parsing is speculative in most places it is used (statement starts,
//! casts), so [`Parser::try_parse_type`] rewinds and returns `None` when the
//! tokens cannot start a type. Generic-arity errors are still hard errors:
//! `List x` is a mistake, not an expression.

use pastel_core::{ParseError, PType, Span};

use super::parser::Parser;
use crate::lexer::is_valid_name;

/// Root names that never take generics or a namespace.
const SIMPLE_TYPES: &[&str] = &["int", "char", "double", "bool", "void", "string", "object"];

impl<'ctx> Parser<'ctx> {
    /// Parse a type, failing with "Expected a type here." if there is none.
    pub fn parse_type(&mut self) -> Result<PType, ParseError> {
        match self.try_parse_type()? {
            Some(ty) => Ok(ty),
            None => Err(ParseError::expected_type(self.here())),
        }
    }

    /// Parse a type if the next tokens form one, otherwise rewind.
    pub fn try_parse_type(&mut self) -> Result<Option<PType>, ParseError> {
        let start = self.tokens.snapshot();
        let Some(ty) = self.parse_type_impl()? else {
            self.tokens.restore(start);
            return Ok(None);
        };

        if self.tokens.is_next("[") && self.tokens.peek_ahead(1).is_some_and(|t| t.is("]")) {
            return Err(ParseError::invalid_type(
                self.here(),
                "Array types are defined with the Array class, not square brackets.",
            ));
        }

        Ok(Some(ty))
    }

    fn parse_type_impl(&mut self) -> Result<Option<PType>, ParseError> {
        let Some((namespace, name, span)) = self.parse_type_root_name() else {
            return Ok(None);
        };

        if namespace.is_none() && SIMPLE_TYPES.contains(&name.as_str()) {
            return Ok(Some(PType::named(&name)));
        }

        let after_name = self.tokens.snapshot();
        if !self.tokens.pop_if_present("<") {
            return PType::new(namespace, name, Vec::new(), span).map(Some);
        }

        let mut generics = Vec::new();
        while !self.tokens.pop_if_present(">") {
            if !generics.is_empty() && !self.tokens.pop_if_present(",") {
                // Not a generic list after all, e.g. `a < b;`.
                self.tokens.restore(after_name);
                return PType::new(namespace, name, Vec::new(), span).map(Some);
            }
            match self.parse_type_impl()? {
                Some(generic) => generics.push(generic),
                None => return Ok(None),
            }
        }

        PType::new(namespace, name, generics, span).map(Some)
    }

    /// Pop `Name` or `Namespace.Name`. Consumes nothing if there is no name.
    fn parse_type_root_name(&mut self) -> Option<(Option<String>, String, Span)> {
        let first = self.tokens.peek().filter(|t| is_valid_name(&t.text))?.clone();
        self.tokens.advance();

        let after_first = self.tokens.snapshot();
        if self.tokens.pop_if_present(".") {
            if let Some(second) = self.tokens.peek().filter(|t| is_valid_name(&t.text)) {
                let second = second.text.clone();
                self.tokens.advance();
                return Some((Some(first.text), second, first.span));
            }
            self.tokens.restore(after_first);
        }

        Some((None, first.text, first.span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParseContext;
    use crate::lexer::{TokenCursor, tokenize};
    use pastel_core::{FileId, ParseErrorKind, TypeCategory};

    fn parse(source: &str) -> Result<Option<PType>, ParseError> {
        let mut context = ParseContext::new();
        let tokens = TokenCursor::new(tokenize(source, FileId(0)).unwrap());
        Parser::new(tokens, &mut context).try_parse_type()
    }

    fn rendered(source: &str) -> String {
        parse(source).unwrap().unwrap().to_string()
    }

    #[test]
    fn simple_types() {
        assert_eq!(rendered("int"), "int");
        assert_eq!(rendered("Point"), "Point");
        assert_eq!(parse("int").unwrap().unwrap().category(), TypeCategory::Primitive);
    }

    #[test]
    fn namespaced_type() {
        let ty = parse("Game.Player").unwrap().unwrap();
        assert_eq!(ty.namespace(), Some("Game"));
        assert_eq!(ty.name(), "Player");
    }

    #[test]
    fn nested_generics_close_with_adjacent_brackets() {
        assert_eq!(
            rendered("Dictionary<string, List<Array<int>>>"),
            "Dictionary<string, List<Array<int>>>"
        );
    }

    #[test]
    fn malformed_generic_list_rewinds_to_bare_name() {
        let mut context = ParseContext::new();
        let tokens = TokenCursor::new(tokenize("a < b;", FileId(0)).unwrap());
        let mut parser = Parser::new(tokens, &mut context);
        let ty = parser.try_parse_type().unwrap().unwrap();
        assert_eq!(ty.name(), "a");
        assert_eq!(parser.tokens.peek_text(), "<");
    }

    #[test]
    fn non_names_are_not_types() {
        assert_eq!(parse("42").unwrap(), None);
        assert_eq!(parse("(").unwrap(), None);
        assert_eq!(parse("List<4>").unwrap(), None);
    }

    #[test]
    fn square_brackets_are_rejected() {
        let err = parse("int[] x").unwrap_err();
        assert_eq!(
            err.message,
            "Array types are defined with the Array class, not square brackets."
        );
    }

    #[test]
    fn missing_generics_are_an_error() {
        let err = parse("List x").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidType);
        assert_eq!(err.message, "This type requires generics");
    }

    #[test]
    fn parse_type_requires_a_type() {
        let mut context = ParseContext::new();
        let tokens = TokenCursor::new(tokenize("+", FileId(0)).unwrap());
        let err = Parser::new(tokens, &mut context).parse_type().unwrap_err();
        assert_eq!(err.message, "Expected a type here.");
    }
}
