//! Field Type Pass - bind the declared types of struct and class fields.
//!
//! Field types may name any struct or class, including ones declared later
//! in the file or in an imported file. Each type is finalized against the
//! index so later stages can compare them by binding instead of by name.

use pastel_core::CompilationError;
use tracing::{debug, instrument};

use crate::index::ProgramIndex;
use crate::tables::ProgramTables;

/// Output of the field type pass.
#[derive(Debug, Default)]
pub struct FieldTypeOutput {
    pub struct_fields: usize,
    pub class_fields: usize,
}

/// Field Type Pass - finalizes field types.
pub struct FieldTypePass<'a> {
    tables: &'a mut ProgramTables,
    index: &'a ProgramIndex,
}

impl<'a> FieldTypePass<'a> {
    pub fn new(tables: &'a mut ProgramTables, index: &'a ProgramIndex) -> Self {
        Self { tables, index }
    }

    #[instrument(skip_all, name = "field_types")]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> Result<FieldTypeOutput, CompilationError> {
        let mut output = FieldTypeOutput::default();

        for def in self.tables.structs.values_mut() {
            for field in &mut def.local_fields {
                field.ty = field.ty.finalize(self.index, field.span)?;
                output.struct_fields += 1;
            }
        }

        for def in self.tables.classes.values_mut() {
            for field in &mut def.fields {
                field.ty = field.ty.finalize(self.index, field.span)?;
                output.class_fields += 1;
            }
        }

        debug!(
            struct_fields = output.struct_fields,
            class_fields = output.class_fields,
            "field types bound"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pastel_core::TypeRef;
    use pastel_parser::{ParseContext, Parser};

    fn run(source: &str) -> Result<(ProgramTables, ProgramIndex), CompilationError> {
        let mut context = ParseContext::new();
        let entities = Parser::parse_source(&mut context, "main.pst", source).unwrap();
        let mut tables = ProgramTables::from_entities(entities).unwrap();
        let index = ProgramIndex::build(&tables);
        FieldTypePass::new(&mut tables, &index).run()?;
        Ok((tables, index))
    }

    #[test]
    fn field_types_bind_forward_references() {
        let (tables, index) = run("struct Line { Point a; Point b; }\nstruct Point { int x; }").unwrap();
        let point = index.struct_id("Point").unwrap();
        let line = &tables.structs["Line"];
        assert_eq!(line.local_fields[0].ty.binding(), Some(TypeRef::Struct(point)));
    }

    #[test]
    fn generic_field_types_bind_their_items() {
        let (tables, index) = run("struct Bag { List<Item> items; }\nstruct Item { int id; }").unwrap();
        let item = index.struct_id("Item").unwrap();
        let items = &tables.structs["Bag"].local_fields[0].ty;
        assert_eq!(items.generics()[0].binding(), Some(TypeRef::Struct(item)));
    }

    #[test]
    fn unknown_field_type() {
        let err = run("struct S { Missing m; }").unwrap_err();
        assert!(matches!(err, CompilationError::UnknownType { ref name, .. } if name == "Missing"));
    }
}
