//! Signature Type Pass - bind parameter and return types.
//!
//! Methods are bound first, then constructors, then free functions, each
//! group in name order. After this pass every callable's signature can be
//! compared by binding.

use pastel_core::CompilationError;
use pastel_parser::ast::Parameter;
use tracing::{debug, instrument};

use crate::index::ProgramIndex;
use crate::tables::ProgramTables;

/// Output of the signature type pass.
#[derive(Debug, Default)]
pub struct SignatureOutput {
    pub methods: usize,
    pub constructors: usize,
    pub functions: usize,
}

/// Signature Type Pass - finalizes signatures.
pub struct SignatureTypePass<'a> {
    tables: &'a mut ProgramTables,
    index: &'a ProgramIndex,
}

impl<'a> SignatureTypePass<'a> {
    pub fn new(tables: &'a mut ProgramTables, index: &'a ProgramIndex) -> Self {
        Self { tables, index }
    }

    #[instrument(skip_all, name = "signature_types")]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> Result<SignatureOutput, CompilationError> {
        let mut output = SignatureOutput::default();
        let index = self.index;

        for class in self.tables.classes.values_mut() {
            for method in &mut class.methods {
                method.return_type = method.return_type.finalize(index, method.span)?;
                finalize_params(&mut method.params, index)?;
                output.methods += 1;
            }
        }

        for class in self.tables.classes.values_mut() {
            finalize_params(&mut class.constructor.params, index)?;
            output.constructors += 1;
        }

        for function in self.tables.functions.values_mut() {
            function.return_type = function.return_type.finalize(index, function.span)?;
            finalize_params(&mut function.params, index)?;
            output.functions += 1;
        }

        debug!(
            methods = output.methods,
            constructors = output.constructors,
            functions = output.functions,
            "signatures bound"
        );
        Ok(output)
    }
}

fn finalize_params(params: &mut [Parameter], index: &ProgramIndex) -> Result<(), CompilationError> {
    for param in params {
        param.ty = param.ty.finalize(index, param.span)?;
    }
    Ok(())
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
        SignatureTypePass::new(&mut tables, &index).run()?;
        Ok((tables, index))
    }

    #[test]
    fn signatures_bind_user_types() {
        let (tables, index) = run(
            "struct Point { int x; }\n\
             class Canvas { constructor(Point origin) { } Point origin() { return null; } }\n\
             Point make(List<Point> pool) { return pool[0]; }",
        )
        .unwrap();
        let point = Some(TypeRef::Struct(index.struct_id("Point").unwrap()));

        let make = &tables.functions["make"];
        assert_eq!(make.return_type.binding(), point);
        assert_eq!(make.params[0].ty.generics()[0].binding(), point);

        let canvas = &tables.classes["Canvas"];
        assert_eq!(canvas.constructor.params[0].ty.binding(), point);
        assert_eq!(canvas.method("origin").unwrap().return_type.binding(), point);
    }

    #[test]
    fn unknown_parameter_type() {
        let err = run("void f(Ghost g) { }").unwrap_err();
        assert!(matches!(err, CompilationError::UnknownType { ref name, .. } if name == "Ghost"));
    }
}
