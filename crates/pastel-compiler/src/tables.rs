//! Program tables: every top-level entity of one compilation unit, by name.
//!
//! Functions, structs, classes, enums and constants share a single
//! namespace, so a name may be registered in at most one table. Tables are
//! `BTreeMap`s so that every stage visits entities in name order and two
//! runs over the same input produce identical output.

use std::collections::BTreeMap;

use pastel_core::{CompilationError, Span};
use pastel_parser::ast::{
    ClassDefinition, ConstantDefinition, EnumDefinition, Entity, FunctionDefinition,
    StructDefinition,
};
use tracing::debug;

/// Which table a name lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Function,
    Struct,
    Class,
    Enum,
    Constant,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Function => "function",
            EntityKind::Struct => "struct",
            EntityKind::Class => "class",
            EntityKind::Enum => "enum",
            EntityKind::Constant => "constant",
        }
    }
}

/// Name-sorted tables of top-level definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramTables {
    pub functions: BTreeMap<String, FunctionDefinition>,
    pub structs: BTreeMap<String, StructDefinition>,
    pub classes: BTreeMap<String, ClassDefinition>,
    pub enums: BTreeMap<String, EnumDefinition>,
    pub constants: BTreeMap<String, ConstantDefinition>,
}

impl ProgramTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every entity, failing on the first duplicate name.
    ///
    /// # Example
    ///
    /// ```
    /// use pastel_compiler::ProgramTables;
    /// use pastel_parser::{ParseContext, Parser};
    ///
    /// let mut context = ParseContext::new();
    /// let source = "struct Point { int x; int y; }\nint zero() { return 0; }";
    /// let entities = Parser::parse_source(&mut context, "main.pst", source).unwrap();
    ///
    /// let tables = ProgramTables::from_entities(entities).unwrap();
    /// assert_eq!(tables.structs.len(), 1);
    /// assert_eq!(tables.functions.len(), 1);
    /// ```
    pub fn from_entities(
        entities: impl IntoIterator<Item = Entity>,
    ) -> Result<Self, CompilationError> {
        let mut tables = Self::new();
        for entity in entities {
            tables.register(entity)?;
        }
        debug!(
            functions = tables.functions.len(),
            structs = tables.structs.len(),
            classes = tables.classes.len(),
            enums = tables.enums.len(),
            constants = tables.constants.len(),
            "tables registered"
        );
        Ok(tables)
    }

    /// Register one entity.
    pub fn register(&mut self, entity: Entity) -> Result<(), CompilationError> {
        if self.kind_of(entity.name()).is_some() {
            return Err(duplicate(entity.name(), entity.span()));
        }

        match entity {
            Entity::Function(f) => {
                self.functions.insert(f.name.clone(), f);
            }
            Entity::Struct(s) => {
                self.structs.insert(s.name.clone(), s);
            }
            Entity::Class(c) => {
                self.classes.insert(c.name.clone(), c);
            }
            Entity::Enum(e) => {
                check_enum_members(&e)?;
                self.enums.insert(e.name.clone(), e);
            }
            Entity::Constant(c) => {
                self.constants.insert(c.name.clone(), c);
            }
        }
        Ok(())
    }

    /// The table a name is declared in, if any.
    pub fn kind_of(&self, name: &str) -> Option<EntityKind> {
        if self.functions.contains_key(name) {
            Some(EntityKind::Function)
        } else if self.structs.contains_key(name) {
            Some(EntityKind::Struct)
        } else if self.classes.contains_key(name) {
            Some(EntityKind::Class)
        } else if self.enums.contains_key(name) {
            Some(EntityKind::Enum)
        } else if self.constants.contains_key(name) {
            Some(EntityKind::Constant)
        } else {
            None
        }
    }

    /// Total number of registered entities.
    pub fn len(&self) -> usize {
        self.functions.len()
            + self.structs.len()
            + self.classes.len()
            + self.enums.len()
            + self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn duplicate(name: &str, span: Span) -> CompilationError {
    CompilationError::DuplicateDefinition {
        name: name.to_string(),
        message: format!("Multiple definitions of '{name}'."),
        span,
    }
}

fn check_enum_members(def: &EnumDefinition) -> Result<(), CompilationError> {
    for (i, member) in def.members.iter().enumerate() {
        if def.members[..i].iter().any(|m| m.name == member.name) {
            return Err(CompilationError::DuplicateDefinition {
                name: format!("{}.{}", def.name, member.name),
                message: format!(
                    "The enum '{}' has multiple definitions of '{}'",
                    def.name, member.name
                ),
                span: member.span,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pastel_parser::{ParseContext, Parser};

    fn tables(source: &str) -> Result<ProgramTables, CompilationError> {
        let mut context = ParseContext::new();
        let entities = Parser::parse_source(&mut context, "main.pst", source).unwrap();
        ProgramTables::from_entities(entities)
    }

    #[test]
    fn entities_land_in_their_tables() {
        let t = tables(
            "enum Color { RED }\n\
             const int MAX = 3;\n\
             struct Point { int x; }\n\
             class Player { }\n\
             void main() { }",
        )
        .unwrap();
        assert_eq!(t.kind_of("Color"), Some(EntityKind::Enum));
        assert_eq!(t.kind_of("MAX"), Some(EntityKind::Constant));
        assert_eq!(t.kind_of("Point"), Some(EntityKind::Struct));
        assert_eq!(t.kind_of("Player"), Some(EntityKind::Class));
        assert_eq!(t.kind_of("main"), Some(EntityKind::Function));
        assert_eq!(t.kind_of("nothing"), None);
        assert_eq!(t.len(), 5);
    }

    #[test]
    fn names_are_unique_across_tables() {
        let err = tables("struct Thing { int x; }\nvoid Thing() { }").unwrap_err();
        match err {
            CompilationError::DuplicateDefinition { name, message, span } => {
                assert_eq!(name, "Thing");
                assert_eq!(message, "Multiple definitions of 'Thing'.");
                assert_eq!(span.line, 2);
            }
            other => panic!("Expected DuplicateDefinition, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_enum_members() {
        let err = tables("enum E { A, B, A }").unwrap_err();
        assert_eq!(err.message(), "The enum 'E' has multiple definitions of 'A'");
    }

    #[test]
    fn iteration_is_name_sorted() {
        let t = tables("void zeta() { }\nvoid alpha() { }\nvoid mid() { }").unwrap();
        let names: Vec<&str> = t.functions.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }
}
