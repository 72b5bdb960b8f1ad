//! Lexical analysis for Pastel.

mod cursor;
mod lexer;
mod token;
mod token_cursor;

pub use lexer::{Lexer, tokenize};
pub use token::{TWO_CHAR_PUNCTUATION, Token, TokenKind, is_valid_name};
pub use token_cursor::TokenCursor;
