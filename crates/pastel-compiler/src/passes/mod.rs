//! Resolver stages.
//!
//! Each stage consumes the tables produced by the previous one. Stage 0 is
//! [`ProgramIndex::build`](crate::index::ProgramIndex::build).
//!
//! - [`hierarchy`]: Stage 1 - bind class and struct parents and reject cycles
//! - [`constants`]: Stage 2 - evaluate enum members and constants
//! - [`fields`]: Stage 3 - bind struct and class field types
//! - [`flatten`]: Stage 4 - flatten inherited struct fields
//! - [`names`]: Stage 5 - cull unreachable functions and rewrite bare names
//! - [`signature_types`]: Stage 6 - bind parameter and return types
//! - [`types`]: Stage 7 - type and check every body
//! - [`lowering`]: Stage 8 - fold constants and lower sugar

pub mod constants;
pub mod fields;
pub mod flatten;
pub mod hierarchy;
pub mod lowering;
pub mod names;
pub mod signature_types;
pub mod types;

pub use constants::{ConstantOutput, ConstantPass};
pub use fields::{FieldTypeOutput, FieldTypePass};
pub use flatten::{FlattenOutput, StructFlattenPass};
pub use hierarchy::{ClassHierarchyPass, HierarchyOutput};
pub use lowering::{LoweringOutput, LoweringPass};
pub use names::{NameOutput, NameResolutionPass};
pub use signature_types::{SignatureOutput, SignatureTypePass};
pub use types::{TypeOutput, TypeResolutionPass};
