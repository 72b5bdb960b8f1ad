//! Pastel Resolver
//!
//! Turns the parsed entities of one compilation unit into a fully typed,
//! lowered program that code generators can walk without further checks.
//!
//! ## Architecture
//!
//! - **Stage 0 (Index)**: assign ids to every struct and class
//! - **Stages 1-4 (Declarations)**: class and struct parents, constants, field types,
//!   struct flattening
//! - **Stage 5 (Names)**: reachability from the entry points and bare name
//!   rewriting
//! - **Stages 6-7 (Types)**: signatures, then every body
//! - **Stage 8 (Lowering)**: constant folding and sugar removal
//!
//! ## Modules
//!
//! - [`tables`]: Name-sorted entity tables
//! - [`index`]: The closed struct/class index types are bound against
//! - [`passes`]: The stages
//! - [`resolver`]: The pipeline and its output
//! - [`signatures`]: Builtin function signatures and method tables
//! - [`operators`]: Operator typing and constant folding
//! - [`scope`]: Local scopes and code ownership
//! - [`extensions`]: Host-provided extensible functions

pub mod extensions;
pub mod index;
pub mod operators;
pub mod passes;
pub mod resolver;
pub mod scope;
pub mod signatures;
pub mod tables;

pub use extensions::{ExtensibleFunction, ExtensionSet};
pub use index::ProgramIndex;
pub use resolver::{ResolveOptions, ResolvedProgram, Resolver};
pub use scope::{LocalVar, Owner, VariableScope};
pub use signatures::{SignatureRegistry, signatures};
pub use tables::{EntityKind, ProgramTables};

// Re-export CompilationError from core for convenience
pub use pastel_core::CompilationError;
