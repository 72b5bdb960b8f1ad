//! Pastel
//!
//! The front end of the Pastel source-to-source compiler. Pastel source
//! goes in; a fully resolved, type-annotated program comes out, ready for
//! a code generator to walk.
//!
//! ## Architecture
//!
//! - **Parsing** ([`pastel_parser`]): tokenizing, compile-time functions,
//!   `@import` splicing and the entity tree
//! - **Tables** ([`pastel_compiler::tables`]): entities sorted by kind and name
//! - **Resolution** ([`pastel_compiler::passes`]): the eight resolver stages
//! - **Diagnostics** ([`Diagnostic`]): the first error, positioned in its file
//!
//! ## Example
//!
//! ```
//! use pastel::{CompileOptions, Compiler};
//!
//! let mut compiler = Compiler::new(CompileOptions::default());
//! compiler.add_source("main.pst", "int main() { return (1 + 2) * 3; }");
//!
//! let compiled = compiler.compile().unwrap();
//! assert!(compiled.program().function("main").is_some());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, instrument};

pub use pastel_compiler::{
    ExtensibleFunction, ExtensionSet, ProgramIndex, ProgramTables, ResolveOptions,
    ResolvedProgram, Resolver,
};
pub use pastel_core::{
    CompilationError, Constant, Diagnostic, LanguageFeatures, LoadError, PType, PastelError,
    SourceMap, Span, TargetLanguage, TypeIndex,
};
pub use pastel_parser::{CodeLoader, MemoryLoader, NoImports, ParseContext, Parser};

// Re-export the sub-crates for callers that need the full AST or pass APIs
pub use pastel_compiler;
pub use pastel_core;
pub use pastel_parser;

// ============================================================================
// Options
// ============================================================================

/// Everything a compilation depends on besides the source text.
pub struct CompileOptions {
    /// The language being generated; drives `@pastel_flag`.
    pub target: TargetLanguage,
    /// Build constants read by `@ext_boolean`, `@importIfTrue` and `@importIfFalse`.
    pub constants: BTreeMap<String, Constant>,
    /// Functions to keep. Empty keeps every function.
    pub entry_points: Vec<String>,
    /// Host-provided functions callable as `Extension.name(..)`.
    pub extensions: ExtensionSet,
    /// Serves `@import`.
    pub loader: Box<dyn CodeLoader>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            target: TargetLanguage::default(),
            constants: BTreeMap::new(),
            entry_points: Vec::new(),
            extensions: ExtensionSet::default(),
            loader: Box::new(NoImports),
        }
    }
}

impl fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileOptions")
            .field("target", &self.target)
            .field("constants", &self.constants)
            .field("entry_points", &self.entry_points)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

impl CompileOptions {
    pub fn with_target(mut self, target: TargetLanguage) -> Self {
        self.target = target;
        self
    }

    pub fn with_constant(mut self, name: impl Into<String>, value: Constant) -> Self {
        self.constants.insert(name.into(), value);
        self
    }

    pub fn with_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_points.push(name.into());
        self
    }

    pub fn with_extensions(mut self, extensions: ExtensionSet) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_loader(mut self, loader: Box<dyn CodeLoader>) -> Self {
        self.loader = loader;
        self
    }
}

// ============================================================================
// Results
// ============================================================================

/// A failed compilation: the first error, plus its printable form.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{diagnostic}")]
pub struct CompileError {
    pub error: PastelError,
    pub diagnostic: Diagnostic,
}

/// A successful compilation.
#[derive(Debug)]
pub struct CompiledProgram {
    program: ResolvedProgram,
    sources: SourceMap,
}

impl CompiledProgram {
    pub fn program(&self) -> &ResolvedProgram {
        &self.program
    }

    /// Every file that was parsed, imports included.
    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    pub fn into_program(self) -> ResolvedProgram {
        self.program
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// Compiles one unit made of one or more named sources.
#[derive(Debug)]
pub struct Compiler {
    options: CompileOptions,
    sources: Vec<(String, String)>,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            sources: Vec::new(),
        }
    }

    /// Add a named source blob. Sources are parsed in the order they are added.
    pub fn add_source(&mut self, name: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.sources.push((name.into(), text.into()));
        self
    }

    /// Parse every source and resolve the result. The first error stops.
    #[instrument(skip_all, name = "compile")]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(self) -> Result<CompiledProgram, CompileError> {
        let CompileOptions {
            target,
            constants,
            entry_points,
            extensions,
            loader,
        } = self.options;

        let mut context = ParseContext::new()
            .with_constants(constants)
            .with_features(LanguageFeatures::for_target(target))
            .with_loader(loader);
        let options = ResolveOptions {
            entry_points,
            extensions,
        };

        match Self::run(&mut context, &self.sources, &options) {
            Ok(program) => {
                debug!(
                    files = context.sources().len(),
                    functions = program.functions().len(),
                    "compilation finished"
                );
                Ok(CompiledProgram {
                    program,
                    sources: context.into_sources(),
                })
            }
            Err(error) => {
                let diagnostic = Diagnostic::from_error(&error, context.sources());
                debug!(%diagnostic, "compilation failed");
                Err(CompileError { error, diagnostic })
            }
        }
    }

    fn run(
        context: &mut ParseContext,
        sources: &[(String, String)],
        options: &ResolveOptions,
    ) -> Result<ResolvedProgram, PastelError> {
        let mut entities = Vec::new();
        for (name, text) in sources {
            entities.extend(Parser::parse_source(context, name, text)?);
        }
        let tables = ProgramTables::from_entities(entities)?;
        Ok(Resolver::run(tables, options)?)
    }
}
