//! User-facing error reports.

use std::fmt;

use crate::{PastelError, SourceMap};

/// A positioned error message, ready to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Name of the file the error was raised in.
    pub file: String,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
    /// The error text.
    pub message: String,
}

impl Diagnostic {
    /// Build a diagnostic from any pipeline error, naming its file through the source map.
    pub fn from_error(error: &PastelError, sources: &SourceMap) -> Self {
        let span = error.span();
        Self {
            file: sources.name(span.file).to_string(),
            line: span.line,
            column: span.col,
            message: error.message(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, line {}, column {}: {}",
            self.file, self.line, self.column, self.message
        )
    }
}
