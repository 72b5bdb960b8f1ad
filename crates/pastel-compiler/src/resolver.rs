//! The resolver pipeline.
//!
//! [`Resolver::run`] takes the tables of one compilation unit through
//! every stage in order and hands back a read-only [`ResolvedProgram`].
//! The first error stops the pipeline.

use std::collections::BTreeMap;

use pastel_core::{CompilationError, TypeIndex};
use pastel_parser::ast::{
    ClassDefinition, ConstantDefinition, EnumDefinition, FunctionDefinition, StructDefinition,
};
use tracing::{debug, instrument};

use crate::extensions::ExtensionSet;
use crate::index::ProgramIndex;
use crate::passes::{
    ClassHierarchyPass, ConstantPass, FieldTypePass, LoweringPass, NameResolutionPass,
    SignatureTypePass, StructFlattenPass, TypeResolutionPass,
};
use crate::tables::ProgramTables;

/// What the resolver needs besides the tables.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Functions to keep, with everything they reach. Empty keeps every function.
    pub entry_points: Vec<String>,
    /// Host-provided functions callable as `Extension.name(..)`.
    pub extensions: ExtensionSet,
}

/// A fully resolved compilation unit.
///
/// Every live expression is typed and lowered, every struct is flattened,
/// and only reachable functions remain.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProgram {
    tables: ProgramTables,
    index: ProgramIndex,
}

impl ResolvedProgram {
    pub fn functions(&self) -> &BTreeMap<String, FunctionDefinition> {
        &self.tables.functions
    }

    pub fn structs(&self) -> &BTreeMap<String, StructDefinition> {
        &self.tables.structs
    }

    pub fn classes(&self) -> &BTreeMap<String, ClassDefinition> {
        &self.tables.classes
    }

    pub fn enums(&self) -> &BTreeMap<String, EnumDefinition> {
        &self.tables.enums
    }

    pub fn constants(&self) -> &BTreeMap<String, ConstantDefinition> {
        &self.tables.constants
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDefinition> {
        self.tables.functions.get(name)
    }

    /// The type index that every type in the program is bound against.
    pub fn index(&self) -> &ProgramIndex {
        &self.index
    }

    /// The same index, as the trait object `PType` methods take.
    pub fn type_index(&self) -> &dyn TypeIndex {
        &self.index
    }

    pub fn tables(&self) -> &ProgramTables {
        &self.tables
    }

    pub fn into_tables(self) -> ProgramTables {
        self.tables
    }
}

/// Runs the resolver stages.
pub struct Resolver;

impl Resolver {
    #[instrument(skip_all, name = "resolve")]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(
        mut tables: ProgramTables,
        options: &ResolveOptions,
    ) -> Result<ResolvedProgram, CompilationError> {
        let mut index = ProgramIndex::build(&tables);

        ClassHierarchyPass::new(&mut tables, &mut index).run()?;
        ConstantPass::new(&mut tables, &index).run()?;
        FieldTypePass::new(&mut tables, &index).run()?;
        StructFlattenPass::new(&mut tables, &index).run()?;
        let names = NameResolutionPass::new(&mut tables, &options.entry_points).run()?;
        SignatureTypePass::new(&mut tables, &index).run()?;
        TypeResolutionPass::new(&mut tables, &index, &options.extensions).run()?;
        let lowering = LoweringPass::new(&mut tables).run()?;

        debug!(
            functions = tables.functions.len(),
            culled = names.culled,
            folded = lowering.folded,
            "program resolved"
        );
        Ok(ResolvedProgram { tables, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pastel_parser::{ParseContext, Parser};

    fn tables(source: &str) -> ProgramTables {
        let mut context = ParseContext::new();
        let entities = Parser::parse_source(&mut context, "main.pst", source).unwrap();
        ProgramTables::from_entities(entities).unwrap()
    }

    #[test]
    fn resolves_a_small_program() {
        let source = "struct Point { int x; int y; }\n\
                      int area(Point p) { return p.x * p.y; }\n\
                      int main() { return area(new Point(2, 3)); }";
        let program = Resolver::run(tables(source), &ResolveOptions::default()).unwrap();
        assert_eq!(program.functions().len(), 2);
        assert!(program.index().struct_id("Point").is_some());
        assert_eq!(program.structs()["Point"].flattened_fields.len(), 2);
    }

    #[test]
    fn entry_points_cull() {
        let options = ResolveOptions {
            entry_points: vec!["main".to_string()],
            ..Default::default()
        };
        let source = "void main() { }\nvoid unused() { }";
        let program = Resolver::run(tables(source), &options).unwrap();
        assert!(program.function("main").is_some());
        assert!(program.function("unused").is_none());
    }

    #[test]
    fn resolving_is_deterministic() {
        let source = "enum E { A, B = 5, C }\n\
                      const int K = E.C * 2;\n\
                      string f(int n) { return \"k=\" + K + n; }";
        let first = Resolver::run(tables(source), &ResolveOptions::default()).unwrap();
        let second = Resolver::run(tables(source), &ResolveOptions::default()).unwrap();
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }
}
