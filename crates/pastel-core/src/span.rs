//! Source location tracking for error reporting.
//!
//! Provides [`Span`] to track where tokens and errors occur in source code,
//! and [`SourceMap`] to map the [`FileId`] inside a span back to a file name.

use std::fmt;

/// Identifies one source blob registered in a [`SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FileId(pub u32);

/// A span of source code, represented by its starting position.
///
/// Line and column are 1-indexed. Columns count characters, not bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// The file this span belongs to.
    pub file: FileId,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub col: u32,
    /// Length in characters.
    pub len: u32,
}

impl Span {
    /// Create a new span from a file, line, column, and length.
    #[inline]
    pub fn new(file: FileId, line: u32, col: u32, len: u32) -> Self {
        Self {
            file,
            line,
            col,
            len,
        }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(file: FileId, line: u32, col: u32) -> Self {
        Self {
            file,
            line,
            col,
            len: 0,
        }
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Merge two spans into one that starts at `self` and extends to cover `other`.
    ///
    /// Spans on different lines keep the start position of `self`.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        if self.line == other.line && self.file == other.file {
            let start_col = self.col.min(other.col);
            let end_col = (other.col + other.len).max(self.col + self.len);
            Span {
                file: self.file,
                line: self.line,
                col: start_col,
                len: end_col - start_col,
            }
        } else {
            Span {
                len: self.len + other.len,
                ..self
            }
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A registered source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// The name the file was registered under (usually its path).
    pub name: String,
    /// The full source text, with line endings normalized.
    pub text: String,
}

/// Owns every source blob seen during one compilation, including imported ones.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    /// Create an empty source map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and return its id.
    ///
    /// `\r\n` line endings are normalized to `\n` before storing.
    pub fn add(&mut self, name: impl Into<String>, text: impl AsRef<str>) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(SourceFile {
            name: name.into(),
            text: text.as_ref().replace("\r\n", "\n"),
        });
        id
    }

    /// Look up a file by id.
    pub fn get(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }

    /// The name of a file, or `"<unknown>"` for ids not issued by this map.
    pub fn name(&self, id: FileId) -> &str {
        self.get(id).map_or("<unknown>", |f| f.name.as_str())
    }

    /// The normalized text of a file.
    pub fn text(&self, id: FileId) -> &str {
        self.get(id).map_or("", |f| f.text.as_str())
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no files are registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
