//! Pastel core crate.
//!
//! Shared vocabulary for the Pastel front end:
//! - Source positions ([`Span`]) and the file table ([`SourceMap`])
//! - The error taxonomy for every phase ([`PastelError`])
//! - The type model ([`PType`]) and the [`TypeIndex`] it resolves user types through
//! - Literal values ([`Constant`])
//! - Builtin function ids ([`CoreFunction`])
//! - Target language feature flags ([`LanguageFeatures`])

pub mod constant;
pub mod core_function;
pub mod diagnostic;
pub mod error;
pub mod features;
pub mod span;
pub mod types;

pub use constant::{Constant, float_to_string};
pub use core_function::CoreFunction;
pub use diagnostic::Diagnostic;
pub use error::{
    CompilationError, LexError, LoadError, ParseError, ParseErrorKind, PastelError,
};
pub use features::{LanguageFeatures, TargetLanguage};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use types::{
    ClassId, EmptyTypeIndex, PType, StructId, TemplateBindings, TypeCategory, TypeIndex, TypeRef,
};
