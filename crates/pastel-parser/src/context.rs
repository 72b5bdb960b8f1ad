//! Parse-time configuration.
//!
//! [`ParseContext`] carries everything the parser needs besides tokens:
//! the build constants read by `@ext_boolean` and `@importIfTrue`, the
//! target's [`LanguageFeatures`] read by `@pastel_flag`, the
//! [`CodeLoader`] that serves `@import`, and the [`SourceMap`] that every
//! parsed file (imports included) is registered in.

use std::collections::BTreeMap;

use pastel_core::{Constant, FileId, LanguageFeatures, LoadError, SourceMap, Span};
use tracing::debug;

/// Serves the text of imported files.
pub trait CodeLoader {
    /// Load the file at `path`, as written in the `@import` call.
    fn load(&self, path: &str) -> Result<String, LoadError>;
}

/// A loader that refuses every import.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImports;

impl CodeLoader for NoImports {
    fn load(&self, path: &str) -> Result<String, LoadError> {
        Err(LoadError::new(path, "imports are not available"))
    }
}

/// An in-memory loader keyed by import path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: BTreeMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file under its import path.
    pub fn with_file(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }
}

impl CodeLoader for MemoryLoader {
    fn load(&self, path: &str) -> Result<String, LoadError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::new(path, "file not found"))
    }
}

/// Shared state for parsing one compilation unit.
pub struct ParseContext {
    constants: BTreeMap<String, Constant>,
    features: LanguageFeatures,
    loader: Box<dyn CodeLoader>,
    sources: SourceMap,
    /// Paths of the imports currently being parsed, outermost first.
    import_stack: Vec<String>,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseContext {
    /// A context with no constants, no features and no imports.
    pub fn new() -> Self {
        Self {
            constants: BTreeMap::new(),
            features: LanguageFeatures::empty(),
            loader: Box::new(NoImports),
            sources: SourceMap::new(),
            import_stack: Vec::new(),
        }
    }

    pub fn with_constants(mut self, constants: BTreeMap<String, Constant>) -> Self {
        self.constants = constants;
        self
    }

    pub fn with_features(mut self, features: LanguageFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn with_loader(mut self, loader: Box<dyn CodeLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// A build constant by name.
    pub fn constant(&self, name: &str) -> Option<&Constant> {
        self.constants.get(name)
    }

    /// A build constant read as a bool. Missing or non-bool constants are false.
    pub fn constant_is_true(&self, name: &str) -> bool {
        self.constant(name).and_then(Constant::as_bool).unwrap_or(false)
    }

    pub fn features(&self) -> LanguageFeatures {
        self.features
    }

    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    /// Give up the source map once parsing is done.
    pub fn into_sources(self) -> SourceMap {
        self.sources
    }

    /// Register a top-level source blob.
    pub fn add_source(&mut self, name: impl Into<String>, text: impl AsRef<str>) -> FileId {
        self.sources.add(name, text)
    }

    /// Load an imported file and register it.
    ///
    /// The import is pushed on the import stack; callers pair this with
    /// [`ParseContext::end_import`] once the file is parsed. Importing a file
    /// that is already being parsed is rejected.
    pub fn begin_import(&mut self, path: &str, span: Span) -> Result<FileId, LoadError> {
        if self.import_stack.iter().any(|p| p == path) {
            return Err(LoadError::new(path, "the file imports itself").at(span));
        }
        let text = self.loader.load(path).map_err(|e| e.at(span))?;
        let file = self.sources.add(path, text);
        debug!(path, depth = self.import_stack.len(), "import loaded");
        self.import_stack.push(path.to_string());
        Ok(file)
    }

    /// Pop the innermost import.
    pub fn end_import(&mut self) {
        self.import_stack.pop();
    }
}
