//! Struct Flattening Pass - flatten inherited struct fields.
//!
//! Parent links are already bound and proven acyclic by the hierarchy pass.
//! Every struct receives the full list of its fields with inherited ones
//! first, so a struct's field positions extend its parent's. A field that
//! reuses an inherited name is rejected.
//!
//! Class fields get the same shadowing check against their parent chain.
//!
//! ## Example
//!
//! ```text
//! struct Point { int x; int y; }
//! struct Point3D extends Point { int z; }
//!
//! After this pass:
//! - Point3D.flattened_fields = [x, y, z]
//! - Point3D.field_index = { x: 0, y: 1, z: 2 }
//! ```

use std::collections::BTreeMap;

use pastel_core::{CompilationError, StructId};
use tracing::{debug, instrument, trace};

use crate::index::ProgramIndex;
use crate::tables::ProgramTables;

/// Output of the struct flattening pass.
#[derive(Debug, Default)]
pub struct FlattenOutput {
    /// Structs whose fields were flattened.
    pub structs_flattened: usize,
}

/// Struct Flattening Pass - resolves struct inheritance.
pub struct StructFlattenPass<'a> {
    tables: &'a mut ProgramTables,
    index: &'a ProgramIndex,
}

impl<'a> StructFlattenPass<'a> {
    pub fn new(tables: &'a mut ProgramTables, index: &'a ProgramIndex) -> Self {
        Self { tables, index }
    }

    #[instrument(skip_all, name = "struct_flatten")]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self) -> Result<FlattenOutput, CompilationError> {
        let mut output = FlattenOutput::default();

        let mut done = vec![false; self.index.struct_count()];
        for id in 0..self.index.struct_count() {
            output.structs_flattened += self.flatten(StructId(id as u32), &mut done)?;
        }

        self.check_class_fields()?;

        debug!(structs_flattened = output.structs_flattened, "structs flattened");
        Ok(output)
    }

    /// Flatten one struct, flattening its ancestors first.
    ///
    /// Returns how many structs were newly flattened.
    fn flatten(&mut self, id: StructId, done: &mut [bool]) -> Result<usize, CompilationError> {
        // Root first, so each struct only has to extend its parent's list.
        let mut chain = vec![id];
        while let Some(parent) = chain.last().and_then(|&s| self.index.struct_parent(s)) {
            chain.push(parent);
        }

        let mut flattened = 0;
        for &link in chain.iter().rev() {
            if done.get(link.0 as usize).copied().unwrap_or(true) {
                continue;
            }
            let Some(name) = self.index.struct_name(link) else {
                continue;
            };

            let mut fields = match self
                .index
                .struct_parent(link)
                .and_then(|p| self.index.struct_name(p))
                .and_then(|p| self.tables.structs.get(p))
            {
                Some(parent) => parent.flattened_fields.clone(),
                None => Vec::new(),
            };

            let Some(def) = self.tables.structs.get_mut(name) else {
                continue;
            };
            let mut field_index: BTreeMap<String, usize> = fields
                .iter()
                .enumerate()
                .map(|(i, f)| (f.name.clone(), i))
                .collect();
            for field in &def.local_fields {
                if field_index.contains_key(&field.name) {
                    return Err(CompilationError::DuplicateField {
                        field: field.name.clone(),
                        message: format!(
                            "This struct field hides an inherited definition of '{}'",
                            field.name
                        ),
                        span: field.span,
                    });
                }
                field_index.insert(field.name.clone(), fields.len());
                fields.push(field.clone());
            }
            def.flattened_fields = fields;
            def.field_index = field_index;
            trace!(r#struct = %name, fields = def.flattened_fields.len(), "struct flattened");
            done[link.0 as usize] = true;
            flattened += 1;
        }
        Ok(flattened)
    }

    /// Reject class fields that reuse a name from an ancestor class.
    fn check_class_fields(&self) -> Result<(), CompilationError> {
        for (name, def) in &self.tables.classes {
            let Some(id) = self.index.class_id(name) else {
                continue;
            };
            let ancestors = self.index.class_chain(id).into_iter().skip(1);
            for ancestor in ancestors {
                let Some(parent) = self
                    .index
                    .class_name(ancestor)
                    .and_then(|n| self.tables.classes.get(n))
                else {
                    continue;
                };
                if let Some(field) = def.fields.iter().find(|f| parent.field(&f.name).is_some()) {
                    return Err(CompilationError::DuplicateField {
                        field: field.name.clone(),
                        message: format!(
                            "This class field hides an inherited definition of '{}'",
                            field.name
                        ),
                        span: field.span,
                    });
                }
            }
        }
        Ok(())
    }
}
