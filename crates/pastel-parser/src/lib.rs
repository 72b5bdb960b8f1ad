//! Pastel parser crate.
//!
//! This crate provides the lexer and parser for Pastel source code.
//! It includes:
//! - Lexical analysis (tokenization) and a rewindable token cursor
//! - Abstract Syntax Tree (AST) definitions
//! - Parser for transforming tokens into AST, with compile-time functions
//!   and `@import` splicing evaluated on the way
//! - Parse configuration ([`ParseContext`]) and import loading ([`CodeLoader`])
//!
//! # Example
//!
//! ```
//! use pastel_parser::{MemoryLoader, ParseContext, Parser};
//!
//! let loader = MemoryLoader::new().with_file("math.pst", "int square(int x) { return x * x; }");
//! let mut context = ParseContext::new().with_loader(Box::new(loader));
//! let source = r#"
//!     @import("math.pst");
//!
//!     int main() {
//!         return square(4);
//!     }
//! "#;
//!
//! let entities = Parser::parse_source(&mut context, "main.pst", source).unwrap();
//! assert_eq!(entities.len(), 2);
//! ```

// Lexer module
pub mod lexer;

// AST module
pub mod ast;

// Parse configuration
pub mod context;

// Re-export commonly used types at crate root
pub use ast::Parser;
pub use context::{CodeLoader, MemoryLoader, NoImports, ParseContext};
pub use lexer::{Lexer, Token, TokenCursor, TokenKind, tokenize};
