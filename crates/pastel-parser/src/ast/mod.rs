//! Abstract Syntax Tree (AST) for Pastel.
//!
//! This module provides:
//! - AST node definitions for entities, statements and expressions
//! - The [`Parser`] that turns tokens into those nodes
//!
//! # Example
//!
//! ```
//! use pastel_parser::ast::{Entity, Statement};
//! use pastel_parser::{ParseContext, Parser};
//!
//! let source = r#"
//!     class Player {
//!         int health = 100;
//!
//!         void takeDamage(int amount) {
//!             this.health -= amount;
//!         }
//!     }
//! "#;
//!
//! let mut context = ParseContext::new();
//! let entities = Parser::parse_source(&mut context, "player.pst", source).unwrap();
//! match &entities[0] {
//!     Entity::Class(class) => {
//!         let method = class.method("takeDamage").unwrap();
//!         assert!(matches!(method.body[0], Statement::Assignment(_)));
//!     }
//!     _ => unreachable!(),
//! }
//! ```

// Core types
pub mod ops;

mod parser;
mod type_parser;

pub mod expr;
mod expr_parser;

pub mod stmt;
mod stmt_parser;

pub mod decl;
mod entity_parser;

// Re-export error types from core
pub use pastel_core::{ParseError, ParseErrorKind};

pub use decl::*;
pub use expr::*;
pub use ops::*;
pub use parser::Parser;
pub use stmt::*;
