//! Unified error types for Pastel.
//!
//! This module provides a consistent error type hierarchy for all phases
//! of Pastel processing: lexing, parsing, code loading, and compilation.
//!
//! ## Error Hierarchy
//!
//! ```text
//! PastelError (top-level wrapper)
//! ├── LexError         - Tokenization errors
//! ├── ParseError       - Parser errors (with ParseErrorKind)
//! ├── LoadError        - Imported code could not be loaded
//! └── CompilationError - Resolution and type checking errors
//! ```
//!
//! Every error carries the [`Span`] it was raised at. There is no recovery:
//! the first error stops the compilation.
//!
//! ## Usage
//!
//! ```ignore
//! use pastel_core::{PastelError, Span};
//!
//! fn compile(source: &str) -> Result<(), PastelError> {
//!     let tokens = tokenize(source)?;  // LexError -> PastelError
//!     let entities = parse(tokens)?;   // ParseError -> PastelError
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur during tokenization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A string literal was still open at the end of the file.
    ///
    /// `hint` is either empty or names the first string literal that spans
    /// a newline, which is usually the one missing its closing quote.
    #[error("at {span}: This file contains an unclosed string.{hint}")]
    UnclosedString { span: Span, hint: String },

    /// A block comment was still open at the end of the file.
    #[error("at {span}: This file seems to contain an unclosed comment.")]
    UnclosedComment { span: Span },
}

impl LexError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnclosedString { span, .. } => *span,
            LexError::UnclosedComment { span } => *span,
        }
    }

    /// The error text without its position prefix.
    pub fn message(&self) -> String {
        match self {
            LexError::UnclosedString { hint, .. } => {
                format!("This file contains an unclosed string.{hint}")
            }
            LexError::UnclosedComment { .. } => {
                "This file seems to contain an unclosed comment.".to_string()
            }
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    // Token-level errors
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Unexpected end of file.
    UnexpectedEof,

    // Expression errors
    /// An expression was expected.
    ExpectedExpression,
    /// The expression is not allowed where it appears.
    InvalidExpression,

    // Type errors
    /// A type was expected.
    ExpectedType,
    /// The type is malformed (bad generic arity, square brackets).
    InvalidType,

    // Statement errors
    /// The statement is invalid.
    InvalidStatement,

    // Declaration errors
    /// The declaration is invalid.
    InvalidDeclaration,

    // Identifier errors
    /// An identifier was expected.
    ExpectedIdentifier,

    // Literal errors
    /// Invalid escape sequence in a string or char literal.
    InvalidEscapeSequence,
    /// A literal value could not be parsed.
    InvalidLiteral,

    // Compile-time evaluation
    /// An unknown compile-time function or flag.
    UnknownCompileTimeFunction,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::InvalidExpression => "invalid expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::InvalidType => "invalid type",
            ParseErrorKind::InvalidStatement => "invalid statement",
            ParseErrorKind::InvalidDeclaration => "invalid declaration",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::InvalidEscapeSequence => "invalid escape sequence",
            ParseErrorKind::InvalidLiteral => "invalid literal",
            ParseErrorKind::UnknownCompileTimeFunction => "unknown compile-time function",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// The source location where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("Unexpected token. Expected: '{expected}' but found '{found}'."),
        )
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(span: Span, token: &str) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            span,
            format!("Unexpected '{token}'"),
        )
    }

    /// Create an "unexpected EOF" error.
    pub fn unexpected_eof(span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedEof,
            span,
            "Unexpected end of file.".to_string(),
        )
    }

    /// Create an "expected identifier" error.
    pub fn expected_identifier(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedIdentifier,
            span,
            format!("Expected identifier. Found '{found}'"),
        )
    }

    /// Create an "expected expression" error.
    pub fn expected_expression(span: Span) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            "Unrecognized expression.".to_string(),
        )
    }

    /// Create an "expected type" error.
    pub fn expected_type(span: Span) -> Self {
        Self::new(
            ParseErrorKind::ExpectedType,
            span,
            "Expected a type here.".to_string(),
        )
    }

    /// Create an "invalid type" error.
    pub fn invalid_type(span: Span, message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::InvalidType, span, message)
    }

    /// Format the error with source context for display.
    ///
    /// This provides a rich error message with the relevant source line
    /// and a caret pointing to the error location.
    pub fn display_with_source(&self, source: &str) -> String {
        let mut output = String::new();

        let line = self.span.line;
        let column = self.span.col;

        output.push_str(&format!("Error at {}:{}: {}\n", line, column, self.kind));

        if !self.message.is_empty() {
            output.push_str(&format!("  {}\n", self.message));
        }

        if let Some(line_text) = Self::get_line(source, line) {
            output.push_str("  |\n");
            output.push_str(&format!("{:>3} | {}\n", line, line_text));

            let indent = " ".repeat(column.saturating_sub(1) as usize);
            let pointer = if self.span.len <= 1 {
                "^".to_string()
            } else {
                "^".to_string() + &"~".repeat((self.span.len - 1) as usize)
            };
            output.push_str(&format!("  | {}{}\n", indent, pointer));
        }

        output
    }

    /// Get the text of a specific line (1-indexed).
    fn get_line(source: &str, line_num: u32) -> Option<String> {
        source
            .lines()
            .nth((line_num as usize).checked_sub(1)?)
            .map(|s| s.to_string())
    }
}

// ============================================================================
// Load Errors
// ============================================================================

/// An imported file could not be loaded by the code loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("at {span}: Could not load '{path}': {reason}")]
pub struct LoadError {
    /// The path that was requested.
    pub path: String,
    /// Why the loader refused it.
    pub reason: String,
    /// The import that requested the file. Filled in by the parser.
    pub span: Span,
}

impl LoadError {
    /// Create a load error that is not yet attached to an import site.
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
            span: Span::default(),
        }
    }

    /// Attach the span of the import that triggered the load.
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Errors that occur during resolution and type checking.
///
/// Every variant carries the full user-facing message so that diagnostics
/// can be rendered without re-deriving the text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilationError {
    /// Two top-level items (or two enum members) share a name.
    #[error("at {span}: {message}")]
    DuplicateDefinition {
        name: String,
        message: String,
        span: Span,
    },

    /// A referenced type could not be found.
    #[error("at {span}: {message}")]
    UnknownType {
        name: String,
        message: String,
        span: Span,
    },

    /// A referenced variable, function or member could not be found.
    #[error("at {span}: {message}")]
    UnknownName {
        name: String,
        message: String,
        span: Span,
    },

    /// A class or struct parent chain loops back on itself.
    #[error("at {span}: {message}")]
    CircularInheritance {
        name: String,
        message: String,
        span: Span,
    },

    /// A constant or enum member depends on itself.
    #[error("at {span}: {message}")]
    ConstantCycle {
        name: String,
        message: String,
        span: Span,
    },

    /// A value does not fit the type expected of it.
    #[error("at {span}: {message}")]
    TypeMismatch { message: String, span: Span },

    /// A call has the wrong number of arguments.
    #[error("at {span}: {message}")]
    ArgumentCountMismatch {
        expected: usize,
        got: usize,
        message: String,
        span: Span,
    },

    /// An operator is not defined for its operand types.
    #[error("at {span}: {message}")]
    InvalidOperator {
        op: String,
        message: String,
        span: Span,
    },

    /// A bracket index was applied to something that cannot be indexed.
    #[error("at {span}: {message}")]
    NotIndexable { message: String, span: Span },

    /// A dotted field or method does not exist on its root.
    #[error("at {span}: {message}")]
    UnknownField {
        field: String,
        message: String,
        span: Span,
    },

    /// A struct field shadows an inherited one.
    #[error("at {span}: {message}")]
    DuplicateField {
        field: String,
        message: String,
        span: Span,
    },

    /// A switch case value appears more than once.
    #[error("at {span}: {message}")]
    DuplicateSwitchCase { message: String, span: Span },

    /// A constant integer division or modulo by zero.
    #[error("at {span}: {message}")]
    DivisionByZero { message: String, span: Span },

    /// A construct the language recognizes but does not support.
    #[error("at {span}: {message}")]
    Unsupported { message: String, span: Span },

    /// Any other semantic error.
    #[error("at {span}: {message}")]
    Other { message: String, span: Span },
}

impl CompilationError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            CompilationError::DuplicateDefinition { span, .. } => *span,
            CompilationError::UnknownType { span, .. } => *span,
            CompilationError::UnknownName { span, .. } => *span,
            CompilationError::CircularInheritance { span, .. } => *span,
            CompilationError::ConstantCycle { span, .. } => *span,
            CompilationError::TypeMismatch { span, .. } => *span,
            CompilationError::ArgumentCountMismatch { span, .. } => *span,
            CompilationError::InvalidOperator { span, .. } => *span,
            CompilationError::NotIndexable { span, .. } => *span,
            CompilationError::UnknownField { span, .. } => *span,
            CompilationError::DuplicateField { span, .. } => *span,
            CompilationError::DuplicateSwitchCase { span, .. } => *span,
            CompilationError::DivisionByZero { span, .. } => *span,
            CompilationError::Unsupported { span, .. } => *span,
            CompilationError::Other { span, .. } => *span,
        }
    }

    /// The error text without its position prefix.
    pub fn message(&self) -> &str {
        match self {
            CompilationError::DuplicateDefinition { message, .. }
            | CompilationError::UnknownType { message, .. }
            | CompilationError::UnknownName { message, .. }
            | CompilationError::CircularInheritance { message, .. }
            | CompilationError::ConstantCycle { message, .. }
            | CompilationError::TypeMismatch { message, .. }
            | CompilationError::ArgumentCountMismatch { message, .. }
            | CompilationError::InvalidOperator { message, .. }
            | CompilationError::NotIndexable { message, .. }
            | CompilationError::UnknownField { message, .. }
            | CompilationError::DuplicateField { message, .. }
            | CompilationError::DuplicateSwitchCase { message, .. }
            | CompilationError::DivisionByZero { message, .. }
            | CompilationError::Unsupported { message, .. }
            | CompilationError::Other { message, .. } => message,
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(span: Span, message: impl Into<String>) -> Self {
        CompilationError::TypeMismatch {
            message: message.into(),
            span,
        }
    }

    /// Create an unsupported-construct error.
    pub fn unsupported(span: Span, message: impl Into<String>) -> Self {
        CompilationError::Unsupported {
            message: message.into(),
            span,
        }
    }

    /// Create a generic error.
    pub fn other(span: Span, message: impl Into<String>) -> Self {
        CompilationError::Other {
            message: message.into(),
            span,
        }
    }

    /// Create an unknown-type error with the standard message.
    pub fn unknown_type(span: Span, name: impl Into<String>) -> Self {
        let name = name.into();
        CompilationError::UnknownType {
            message: format!("Could not find a class or struct by the name of '{name}'"),
            name,
            span,
        }
    }

    /// Create an operator error naming the operator and both operand types.
    pub fn invalid_operator(span: Span, op: &str, left: &str, right: &str) -> Self {
        CompilationError::InvalidOperator {
            op: op.to_string(),
            message: format!("The operator '{op}' is not defined for types: {left} and {right}."),
            span,
        }
    }

    /// Create an argument count error.
    pub fn argument_count(span: Span, expected: usize, got: usize) -> Self {
        CompilationError::ArgumentCountMismatch {
            expected,
            got,
            message: format!(
                "Incorrect number of args for this function. Expected {expected} but instead found {got}."
            ),
            span,
        }
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// The unified error type for all Pastel operations.
///
/// Each variant uses `#[from]` to enable automatic conversion with the `?` operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PastelError {
    /// A lexer error.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// A parse error.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A code loading error.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A compilation error.
    #[error(transparent)]
    Compilation(#[from] CompilationError),
}

impl PastelError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            PastelError::Lex(e) => e.span(),
            PastelError::Parse(e) => e.span,
            PastelError::Load(e) => e.span,
            PastelError::Compilation(e) => e.span(),
        }
    }

    /// The error text without its position prefix.
    pub fn message(&self) -> String {
        match self {
            PastelError::Lex(e) => e.message(),
            PastelError::Parse(e) => e.message.clone(),
            PastelError::Load(e) => format!("Could not load '{}': {}", e.path, e.reason),
            PastelError::Compilation(e) => e.message().to_string(),
        }
    }

    /// Check if this is a lexer error.
    pub fn is_lex(&self) -> bool {
        matches!(self, PastelError::Lex(_))
    }

    /// Check if this is a parse error.
    pub fn is_parse(&self) -> bool {
        matches!(self, PastelError::Parse(_))
    }

    /// Check if this is a load error.
    pub fn is_load(&self) -> bool {
        matches!(self, PastelError::Load(_))
    }

    /// Check if this is a compilation error.
    pub fn is_compilation(&self) -> bool {
        matches!(self, PastelError::Compilation(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
