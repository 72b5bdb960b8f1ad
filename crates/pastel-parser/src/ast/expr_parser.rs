//! Expression parsing using precedence tiers.
//!
//! Each tier parses the next-tighter tier and collects a flat run of its
//! own operators into an [`ExpressionKind::OpChain`]. Associativity is
//! decided later by the resolver when it folds chains into pairs.
//!
//! Compile-time functions other than `@import` are evaluated here, as soon
//! as their argument list closes.

use pastel_core::{Constant, LanguageFeatures, ParseError, ParseErrorKind, Span};

use super::parser::Parser;
use crate::ast::expr::{Expression, ExpressionKind};
use crate::ast::ops::{BinaryOp, IncrementOp, UnaryOp};
use crate::lexer::{Token, TokenKind, is_valid_name};

type TierParser<'ctx> = fn(&mut Parser<'ctx>) -> Result<Expression, ParseError>;

const BOOLEAN_COMBINATION_OPS: &[&str] = &["&&", "||"];
const BITWISE_OPS: &[&str] = &["&", "|", "^"];
const EQUALITY_OPS: &[&str] = &["==", "!="];
const RELATIONAL_OPS: &[&str] = &["<", ">", "<=", ">="];
const ADDITION_OPS: &[&str] = &["+", "-"];
const MULTIPLICATION_OPS: &[&str] = &["*", "/", "%"];

impl<'ctx> Parser<'ctx> {
    /// Parse a full expression.
    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_boolean_combination()
    }

    fn parse_boolean_combination(&mut self) -> Result<Expression, ParseError> {
        self.parse_op_chain(BOOLEAN_COMBINATION_OPS, Self::parse_bitwise)
    }

    fn parse_bitwise(&mut self) -> Result<Expression, ParseError> {
        self.parse_op_chain(BITWISE_OPS, Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        self.parse_op_chain(EQUALITY_OPS, Self::parse_relational)
    }

    fn parse_relational(&mut self) -> Result<Expression, ParseError> {
        self.parse_op_chain(RELATIONAL_OPS, Self::parse_bit_shift)
    }

    fn parse_bit_shift(&mut self) -> Result<Expression, ParseError> {
        let first = self.parse_addition()?;
        let span = first.span;
        let mut operands = vec![first];
        let mut ops = Vec::new();

        while let Some(token) = self.tokens.pop_bit_shift_if_present() {
            let op = BinaryOp::from_text(&token.text)
                .ok_or_else(|| ParseError::unexpected_token(token.span, &token.text))?;
            ops.push(op);
            operands.push(self.parse_addition()?);
        }

        Ok(Self::chain(operands, ops, span))
    }

    fn parse_addition(&mut self) -> Result<Expression, ParseError> {
        self.parse_op_chain(ADDITION_OPS, Self::parse_multiplication)
    }

    fn parse_multiplication(&mut self) -> Result<Expression, ParseError> {
        self.parse_op_chain(MULTIPLICATION_OPS, Self::parse_prefixes)
    }

    /// Parse `next (op next)*` where every `op` is in `texts`.
    fn parse_op_chain(
        &mut self,
        texts: &[&str],
        next: TierParser<'ctx>,
    ) -> Result<Expression, ParseError> {
        let first = next(self)?;
        let span = first.span;
        let mut operands = vec![first];
        let mut ops = Vec::new();

        while let Some(op) = texts
            .iter()
            .find(|text| self.tokens.is_next(text))
            .and_then(|text| BinaryOp::from_text(text))
        {
            self.tokens.advance();
            ops.push(op);
            operands.push(next(self)?);
        }

        Ok(Self::chain(operands, ops, span))
    }

    fn chain(mut operands: Vec<Expression>, ops: Vec<BinaryOp>, span: Span) -> Expression {
        if ops.is_empty() {
            if let Some(single) = operands.pop() {
                return single;
            }
        }
        Expression::new(ExpressionKind::OpChain { operands, ops }, span)
    }

    fn parse_prefixes(&mut self) -> Result<Expression, ParseError> {
        let op = match self.tokens.peek_text() {
            "-" => UnaryOp::Negate,
            "!" => UnaryOp::Not,
            _ => return self.parse_increment_or_cast(),
        };
        let span = self.tokens.pop()?.span;
        let operand = self.parse_prefixes()?;
        Ok(Expression::new(
            ExpressionKind::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    // =========================================
    // Increments and casts
    // =========================================

    fn parse_increment_or_cast(&mut self) -> Result<Expression, ParseError> {
        let prefix = match IncrementOp::from_text(self.tokens.peek_text()) {
            Some(op) => Some((op, self.tokens.pop()?.span)),
            None => None,
        };

        if prefix.is_none() {
            if let Some(cast) = self.try_parse_cast()? {
                return Ok(cast);
            }
        }

        let mut expression = self.parse_entity()?;

        if let Some((op, span)) = prefix {
            expression = Expression::new(
                ExpressionKind::InlineIncrement {
                    op,
                    operand: Box::new(expression),
                    prefix: true,
                },
                span,
            );
        }

        if let Some(op) = IncrementOp::from_text(self.tokens.peek_text()) {
            self.tokens.advance();
            let span = expression.span;
            expression = Expression::new(
                ExpressionKind::InlineIncrement {
                    op,
                    operand: Box::new(expression),
                    prefix: false,
                },
                span,
            );
        }

        Ok(expression)
    }

    /// `(Type) operand`, recognized by speculation. The closing paren must
    /// be followed by something that can start an entity, so that `(x) + 1`
    /// stays a parenthesized expression.
    fn try_parse_cast(&mut self) -> Result<Option<Expression>, ParseError> {
        if !self.tokens.is_next("(") || !self.tokens.peek_ahead(1).is_some_and(|t| is_valid_name(&t.text)) {
            return Ok(None);
        }

        let start = self.tokens.snapshot();
        let span = self.here();
        self.tokens.advance();

        if let Some(target) = self.try_parse_type()? {
            if self.tokens.pop_if_present(")") && self.tokens.peek().is_some_and(starts_entity) {
                let operand = self.parse_increment_or_cast()?;
                return Ok(Some(Expression::new(
                    ExpressionKind::Cast {
                        target,
                        operand: Box::new(operand),
                    },
                    span,
                )));
            }
        }

        self.tokens.restore(start);
        Ok(None)
    }

    // =========================================
    // Entities
    // =========================================

    fn parse_entity(&mut self) -> Result<Expression, ParseError> {
        let root = if self.tokens.is_next("new") {
            let span = self.tokens.pop()?.span;
            let ty = self.parse_type()?;
            if !self.tokens.is_next("(") {
                self.tokens.pop_expected("(")?;
            }
            Expression::new(ExpressionKind::ConstructorReference(ty), span)
        } else if self.tokens.pop_if_present("(") {
            let inner = self.parse_expression()?;
            self.tokens.pop_expected(")")?;
            inner
        } else {
            self.parse_entity_without_suffix_chain()?
        };

        self.parse_entity_suffixes(root)
    }

    fn parse_entity_without_suffix_chain(&mut self) -> Result<Expression, ParseError> {
        let token = self.tokens.pop()?;
        let span = token.span;

        match token.text.as_str() {
            "true" => return Ok(Expression::constant(Constant::Bool(true), span)),
            "false" => return Ok(Expression::constant(Constant::Bool(false), span)),
            "null" => return Ok(Expression::constant(Constant::Null, span)),
            "this" => return Ok(Expression::new(ExpressionKind::This, span)),
            "." => return self.parse_leading_dot_double(span),
            "@" => return self.parse_compile_time_function_name(span),
            _ => {}
        }

        match token.kind {
            TokenKind::String if token.text.starts_with('\'') => {
                let value = unescape(&token)?;
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Expression::constant(Constant::Char(c), span)),
                    _ => Err(ParseError::new(
                        ParseErrorKind::InvalidLiteral,
                        span,
                        "Character constant with a coded value longer than 1 actual character.",
                    )),
                }
            }
            TokenKind::String => Ok(Expression::constant(Constant::String(unescape(&token)?), span)),
            TokenKind::Float => {
                let value = token.text.parse::<f64>().map_err(|_| expected_number(span))?;
                Ok(Expression::constant(Constant::float(value), span))
            }
            TokenKind::Integer if self.tokens.is_next(".") => self.parse_dotted_integer(&token),
            TokenKind::Integer => Ok(Expression::constant(Constant::Int(parse_integer(&token)?), span)),
            TokenKind::Word if is_valid_name(&token.text) => {
                Ok(Expression::new(ExpressionKind::Variable(token.text), span))
            }
            _ => Err(ParseError::expected_expression(span)),
        }
    }

    /// `.5` after the `.` has been popped.
    fn parse_leading_dot_double(&mut self, span: Span) -> Result<Expression, ParseError> {
        let fraction = self
            .tokens
            .peek()
            .filter(|t| t.kind == TokenKind::Integer && t.is_adjacent() && is_decimal(&t.text))
            .map(|t| t.text.clone());
        let Some(fraction) = fraction else {
            return Err(ParseError::unexpected_token(span, "."));
        };
        self.tokens.advance();
        let value = format!("0.{fraction}")
            .parse::<f64>()
            .map_err(|_| expected_number(span))?;
        Ok(Expression::constant(Constant::float(value), span))
    }

    /// An integer followed by `.` that the lexer did not stitch into a float.
    fn parse_dotted_integer(&mut self, whole: &Token) -> Result<Expression, ParseError> {
        if !is_decimal(&whole.text) {
            return Err(expected_number(whole.span));
        }
        let dot = self.tokens.pop()?;
        if !dot.is_adjacent() {
            return Err(ParseError::unexpected_token(dot.span, "."));
        }
        let fraction = self.tokens.pop()?;
        if fraction.kind != TokenKind::Integer || !is_decimal(&fraction.text) {
            return Err(expected_number(fraction.span));
        }
        if !fraction.is_adjacent() {
            return Err(ParseError::unexpected_token(fraction.span, &fraction.text));
        }
        let value = format!("{}.{}", whole.text, fraction.text)
            .parse::<f64>()
            .map_err(|_| expected_number(whole.span))?;
        Ok(Expression::constant(Constant::float(value), whole.span))
    }

    /// `@name`, which must be followed by an argument list.
    fn parse_compile_time_function_name(&mut self, span: Span) -> Result<Expression, ParseError> {
        let name = self.pop_name("Expected compile time function name.")?;
        if !self.tokens.is_next("(") {
            self.tokens.pop_expected("(")?;
        }
        Ok(Expression::new(
            ExpressionKind::CompileTimeFunctionReference(name.text),
            span,
        ))
    }

    fn parse_entity_suffixes(&mut self, mut root: Expression) -> Result<Expression, ParseError> {
        loop {
            match self.tokens.peek_text() {
                "." => {
                    self.tokens.advance();
                    let field = self.pop_name("Invalid field name")?;
                    let span = root.span;
                    root = Expression::new(
                        ExpressionKind::DotField {
                            root: Box::new(root),
                            field: field.text,
                            field_span: field.span,
                        },
                        span,
                    );
                }
                "[" => {
                    self.tokens.advance();
                    let index = self.parse_expression()?;
                    self.tokens.pop_expected("]")?;
                    let span = root.span;
                    root = Expression::new(
                        ExpressionKind::BracketIndex {
                            root: Box::new(root),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                "(" => {
                    self.tokens.advance();
                    let mut args = Vec::new();
                    while !self.tokens.pop_if_present(")") {
                        if !args.is_empty() {
                            self.tokens.pop_expected(",")?;
                        }
                        args.push(self.parse_expression()?);
                    }
                    let span = root.span;
                    let invocation = Expression::new(
                        ExpressionKind::FunctionInvocation {
                            root: Box::new(root),
                            args,
                        },
                        span,
                    );
                    root = self.maybe_immediately_resolve(invocation)?;
                }
                _ => return Ok(root),
            }
        }
    }

    // =========================================
    // Compile-time functions
    // =========================================

    /// Fold `@ext_boolean(...)` and `@pastel_flag(...)` into constants.
    ///
    /// `@import` is left for the statement and entity parsers, which splice
    /// the imported code in place.
    fn maybe_immediately_resolve(&mut self, invocation: Expression) -> Result<Expression, ParseError> {
        let ExpressionKind::FunctionInvocation { root, args } = &invocation.kind else {
            return Ok(invocation);
        };
        let ExpressionKind::CompileTimeFunctionReference(name) = &root.kind else {
            return Ok(invocation);
        };

        let name = name.clone();
        let arg = single_string_arg(args).unwrap_or_default();
        let span = invocation.span;

        match name.as_str() {
            "ext_boolean" => Ok(Expression::constant(
                Constant::Bool(self.context.constant_is_true(&arg)),
                span,
            )),
            "pastel_flag" => {
                let flag = LanguageFeatures::from_name(&arg).ok_or_else(|| {
                    ParseError::new(
                        ParseErrorKind::UnknownCompileTimeFunction,
                        span,
                        format!("Unknown @pastel_flag constant: '{arg}'."),
                    )
                })?;
                Ok(Expression::constant(
                    Constant::Bool(self.context.features().contains(flag)),
                    span,
                ))
            }
            "import" => Ok(invocation),
            other => Err(ParseError::new(
                ParseErrorKind::UnknownCompileTimeFunction,
                span,
                format!("Unknown compile-time function: {other}"),
            )),
        }
    }
}

/// The value of the only argument, if it is a string literal.
pub(crate) fn single_string_arg(args: &[Expression]) -> Option<String> {
    match args {
        [only] => match only.as_constant() {
            Some(Constant::String(value)) => Some(value.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Whether a token can begin an entity, which is what separates a cast
/// from a parenthesized expression.
fn starts_entity(token: &Token) -> bool {
    match token.kind {
        TokenKind::Word | TokenKind::Integer | TokenKind::Float | TokenKind::String => true,
        TokenKind::Punctuation => matches!(token.text.as_str(), "(" | "@" | "."),
    }
}

fn is_decimal(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

fn expected_number(span: Span) -> ParseError {
    ParseError::new(ParseErrorKind::InvalidLiteral, span, "Expected number")
}

/// Parse a decimal or `0x` hex integer literal. Hex literals are read as
/// unsigned 32 bits so that `0xFFFFFFFF` is `-1`.
fn parse_integer(token: &Token) -> Result<i32, ParseError> {
    let text = token.text.as_str();
    let too_big = || ParseError::new(ParseErrorKind::InvalidLiteral, token.span, "Integer is too big.");

    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(expected_number(token.span));
        }
        return u32::from_str_radix(hex, 16)
            .map(|value| value as i32)
            .map_err(|_| too_big());
    }

    if !is_decimal(text) {
        return Err(expected_number(token.span));
    }
    text.parse::<i32>().map_err(|_| too_big())
}

/// Strip the quotes from a string or char token and decode its escapes.
pub(crate) fn unescape(token: &Token) -> Result<String, ParseError> {
    let text = token.text.as_str();
    let body = text
        .get(1..text.len().saturating_sub(1))
        .unwrap_or_default();

    let mut output = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            output.push(c);
            continue;
        }
        let decoded = match chars.next() {
            Some('\\') => '\\',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('\'') => '\'',
            Some('"') => '"',
            Some('0') => '\0',
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidEscapeSequence,
                    token.span,
                    "Unrecognized escape sequence",
                ));
            }
        };
        output.push(decoded);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParseContext;
    use crate::lexer::{TokenCursor, tokenize};
    use pastel_core::FileId;

    fn parse_with(context: &mut ParseContext, source: &str) -> Result<Expression, ParseError> {
        let tokens = TokenCursor::new(tokenize(source, FileId(0)).unwrap());
        let mut parser = Parser::new(tokens, context);
        let expr = parser.parse_expression()?;
        assert!(parser.is_done(), "unparsed tokens after {source:?}");
        Ok(expr)
    }

    fn parse(source: &str) -> Result<Expression, ParseError> {
        parse_with(&mut ParseContext::new(), source)
    }

    fn constant(source: &str) -> Constant {
        match parse(source).unwrap().kind {
            ExpressionKind::InlineConstant(value) => value,
            other => panic!("Expected constant, got {other:?}"),
        }
    }

    fn error(source: &str) -> String {
        parse(source).unwrap_err().message
    }

    // ========================================================================
    // Literals
    // ========================================================================

    #[test]
    fn parse_int_literal() {
        assert_eq!(constant("42"), Constant::Int(42));
        assert_eq!(constant("2147483647"), Constant::Int(i32::MAX));
    }

    #[test]
    fn parse_hex_literal() {
        assert_eq!(constant("0x1F"), Constant::Int(31));
        assert_eq!(constant("0xFFFFFFFF"), Constant::Int(-1));
    }

    #[test]
    fn integer_overflow() {
        assert_eq!(error("2147483648"), "Integer is too big.");
        assert_eq!(error("0x100000000"), "Integer is too big.");
    }

    #[test]
    fn malformed_integer() {
        assert_eq!(error("12abc"), "Expected number");
    }

    #[test]
    fn parse_float_literals() {
        assert_eq!(constant("3.25"), Constant::float(3.25));
        assert_eq!(constant(".5"), Constant::float(0.5));
    }

    #[test]
    fn spaced_dots_are_rejected() {
        assert_eq!(error(". 5"), "Unexpected '.'");
        assert_eq!(error("3 .5"), "Unexpected '.'");
        assert_eq!(error("3. 5"), "Unexpected '5'");
    }

    #[test]
    fn parse_bool_and_null_literals() {
        assert_eq!(constant("true"), Constant::Bool(true));
        assert_eq!(constant("false"), Constant::Bool(false));
        assert_eq!(constant("null"), Constant::Null);
    }

    #[test]
    fn parse_string_literal_with_escapes() {
        assert_eq!(
            constant(r#""a\tb\n\"q\" \\ \0""#),
            Constant::String("a\tb\n\"q\" \\ \0".to_string())
        );
    }

    #[test]
    fn unknown_escape_is_an_error() {
        let err = parse(r#""bad\q""#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidEscapeSequence);
        assert_eq!(err.message, "Unrecognized escape sequence");
    }

    #[test]
    fn parse_char_literals() {
        assert_eq!(constant("'x'"), Constant::Char('x'));
        assert_eq!(constant(r"'\n'"), Constant::Char('\n'));
        assert_eq!(
            error("'xy'"),
            "Character constant with a coded value longer than 1 actual character."
        );
    }

    #[test]
    fn literals_carry_their_type() {
        let expr = parse("'c'").unwrap();
        assert_eq!(expr.resolved_type.unwrap().to_string(), "char");
    }

    // ========================================================================
    // Operators
    // ========================================================================

    #[test]
    fn parse_precedence() {
        // 1 + 2 * 3 is a chain of two operands whose second is a product
        let expr = parse("1 + 2 * 3").unwrap();
        match expr.kind {
            ExpressionKind::OpChain { operands, ops } => {
                assert_eq!(ops, vec![BinaryOp::Add]);
                match &operands[1].kind {
                    ExpressionKind::OpChain { ops, .. } => assert_eq!(ops, &vec![BinaryOp::Mul]),
                    _ => panic!("Expected multiplication"),
                }
            }
            _ => panic!("Expected op chain"),
        }
    }

    #[test]
    fn same_tier_operators_form_one_chain() {
        match parse("a - b + c - d").unwrap().kind {
            ExpressionKind::OpChain { operands, ops } => {
                assert_eq!(operands.len(), 4);
                assert_eq!(ops, vec![BinaryOp::Sub, BinaryOp::Add, BinaryOp::Sub]);
            }
            _ => panic!("Expected op chain"),
        }
    }

    #[test]
    fn boolean_combination_is_loosest() {
        match parse("a == 1 && b < 2 || !c").unwrap().kind {
            ExpressionKind::OpChain { operands, ops } => {
                assert_eq!(ops, vec![BinaryOp::And, BinaryOp::Or]);
                assert!(matches!(operands[2].kind, ExpressionKind::UnaryOp { op: UnaryOp::Not, .. }));
            }
            _ => panic!("Expected op chain"),
        }
    }

    #[test]
    fn shift_right_is_stitched() {
        match parse("a >> 2").unwrap().kind {
            ExpressionKind::OpChain { ops, .. } => assert_eq!(ops, vec![BinaryOp::ShiftRight]),
            _ => panic!("Expected shift"),
        }
        match parse("a << 2").unwrap().kind {
            ExpressionKind::OpChain { ops, .. } => assert_eq!(ops, vec![BinaryOp::ShiftLeft]),
            _ => panic!("Expected shift"),
        }
    }

    #[test]
    fn parse_negation() {
        match parse("-x").unwrap().kind {
            ExpressionKind::UnaryOp { op, operand } => {
                assert_eq!(op, UnaryOp::Negate);
                assert!(matches!(operand.kind, ExpressionKind::Variable(ref n) if n == "x"));
            }
            _ => panic!("Expected unary expression"),
        }
    }

    #[test]
    fn parse_increments() {
        match parse("++i").unwrap().kind {
            ExpressionKind::InlineIncrement { op, prefix, .. } => {
                assert_eq!(op, IncrementOp::Increment);
                assert!(prefix);
            }
            _ => panic!("Expected increment"),
        }
        match parse("i--").unwrap().kind {
            ExpressionKind::InlineIncrement { op, prefix, .. } => {
                assert_eq!(op, IncrementOp::Decrement);
                assert!(!prefix);
            }
            _ => panic!("Expected decrement"),
        }
    }

    // ========================================================================
    // Casts and parentheses
    // ========================================================================

    #[test]
    fn parse_cast_expression() {
        match parse("(int) x").unwrap().kind {
            ExpressionKind::Cast { target, operand } => {
                assert_eq!(target.to_string(), "int");
                assert!(matches!(operand.kind, ExpressionKind::Variable(_)));
            }
            _ => panic!("Expected cast"),
        }
    }

    #[test]
    fn parenthesized_name_followed_by_operator_is_not_a_cast() {
        match parse("(x) + 1").unwrap().kind {
            ExpressionKind::OpChain { operands, .. } => {
                assert!(matches!(operands[0].kind, ExpressionKind::Variable(_)));
            }
            _ => panic!("Expected op chain"),
        }
    }

    #[test]
    fn parenthesized_comparison_is_not_a_cast() {
        assert!(matches!(parse("(a < b)").unwrap().kind, ExpressionKind::OpChain { .. }));
    }

    // ========================================================================
    // Entities and suffixes
    // ========================================================================

    #[test]
    fn parse_method_call_chain() {
        match parse("a.b[0](1, 2)").unwrap().kind {
            ExpressionKind::FunctionInvocation { root, args } => {
                assert_eq!(args.len(), 2);
                match root.kind {
                    ExpressionKind::BracketIndex { root, .. } => {
                        assert!(matches!(root.kind, ExpressionKind::DotField { ref field, .. } if field == "b"));
                    }
                    _ => panic!("Expected index"),
                }
            }
            _ => panic!("Expected call"),
        }
    }

    #[test]
    fn parse_constructor_expression() {
        match parse("new List<int>()").unwrap().kind {
            ExpressionKind::FunctionInvocation { root, args } => {
                assert!(args.is_empty());
                match root.kind {
                    ExpressionKind::ConstructorReference(ty) => assert_eq!(ty.to_string(), "List<int>"),
                    _ => panic!("Expected constructor reference"),
                }
            }
            _ => panic!("Expected invocation"),
        }
    }

    #[test]
    fn constructor_requires_arguments() {
        assert_eq!(error("new Point"), "Unexpected end of file.");
        assert_eq!(
            parse("new Point;").unwrap_err().message,
            "Unexpected token. Expected: '(' but found ';'."
        );
    }

    #[test]
    fn parse_this() {
        assert!(matches!(parse("this").unwrap().kind, ExpressionKind::This));
    }

    #[test]
    fn unrecognized_expression() {
        let err = parse(")").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::ExpectedExpression);
    }

    // ========================================================================
    // Compile-time functions
    // ========================================================================

    #[test]
    fn ext_boolean_reads_constants() {
        let mut constants = std::collections::BTreeMap::new();
        constants.insert("HAS_AUDIO".to_string(), Constant::Bool(true));
        let mut context = ParseContext::new().with_constants(constants);
        let on = parse_with(&mut context, "@ext_boolean(\"HAS_AUDIO\")").unwrap();
        assert_eq!(on.as_bool_constant(), Some(true));
        let off = parse_with(&mut context, "@ext_boolean(\"MISSING\")").unwrap();
        assert_eq!(off.as_bool_constant(), Some(false));
    }

    #[test]
    fn pastel_flag_reads_features() {
        let mut context = ParseContext::new().with_features(LanguageFeatures::HAS_INCREMENT);
        let on = parse_with(&mut context, "@pastel_flag(\"HAS_INCREMENT\")").unwrap();
        assert_eq!(on.as_bool_constant(), Some(true));
        let off = parse_with(&mut context, "@pastel_flag(\"IS_PYTHON\")").unwrap();
        assert_eq!(off.as_bool_constant(), Some(false));
    }

    #[test]
    fn unknown_pastel_flag() {
        let err = parse("@pastel_flag(\"NOPE\")").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownCompileTimeFunction);
        assert_eq!(err.message, "Unknown @pastel_flag constant: 'NOPE'.");
    }

    #[test]
    fn unknown_compile_time_function() {
        assert_eq!(error("@frobnicate(1)"), "Unknown compile-time function: frobnicate");
    }

    #[test]
    fn import_is_left_unresolved() {
        match parse("@import(\"lib.pst\")").unwrap().kind {
            ExpressionKind::FunctionInvocation { root, args } => {
                assert!(matches!(root.kind, ExpressionKind::CompileTimeFunctionReference(ref n) if n == "import"));
                assert_eq!(single_string_arg(&args).as_deref(), Some("lib.pst"));
            }
            _ => panic!("Expected invocation"),
        }
    }

    #[test]
    fn compile_time_function_needs_a_name() {
        assert_eq!(error("@(1)"), "Expected compile time function name.");
    }
}
