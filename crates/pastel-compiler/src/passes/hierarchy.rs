//! Class Hierarchy Pass - bind each class and struct to its parent.
//!
//! A class names at most one parent after `:` and a struct at most one
//! after `extends`. Classes extend classes and structs extend structs.
//! Once every link is bound, each parent graph is checked for cycles with a
//! three-colour walk that memoizes nodes already proven safe, so each one is
//! visited once no matter how long the chains are.
//!
//! Both checks run before any constant is evaluated.
//!
//! ## Example
//!
//! ```text
//! class Animal { }
//! class Dog : Animal { }
//! struct Point { int x; }
//! struct Point3D extends Point { int z; }
//!
//! After this pass:
//! - Dog.parent_id = Some(Animal)
//! - index.parent_of(Dog) = Some(Animal)
//! - Point3D.parent_id = Some(Point)
//! ```

use pastel_core::{ClassId, CompilationError, StructId};
use tracing::{debug, instrument, trace};

use crate::index::ProgramIndex;
use crate::tables::ProgramTables;

/// Output of the class hierarchy pass.
#[derive(Debug, Default)]
pub struct HierarchyOutput {
    /// Number of classes that have a parent.
    pub classes_bound: usize,
    /// Number of structs that have a parent.
    pub structs_bound: usize,
}

/// Class Hierarchy Pass - binds and validates class and struct parents.
pub struct ClassHierarchyPass<'a> {
    tables: &'a mut ProgramTables,
    index: &'a mut ProgramIndex,
}

impl<'a> ClassHierarchyPass<'a> {
    pub fn new(tables: &'a mut ProgramTables, index: &'a mut ProgramIndex) -> Self {
        Self { tables, index }
    }

    #[instrument(skip_all, name = "class_hierarchy")]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self) -> Result<HierarchyOutput, CompilationError> {
        let mut output = HierarchyOutput::default();

        self.bind_classes(&mut output)?;
        self.check_class_cycles()?;
        for (name, class) in self.tables.classes.iter_mut() {
            class.parent_id = self
                .index
                .class_id(name)
                .and_then(|id| self.index.class_parent(id));
        }

        self.bind_structs(&mut output)?;
        self.check_struct_cycles()?;
        for def in self.tables.structs.values_mut() {
            def.parent_id = self
                .index
                .struct_id(&def.name)
                .and_then(|id| self.index.struct_parent(id));
        }

        debug!(
            classes_bound = output.classes_bound,
            structs_bound = output.structs_bound,
            "hierarchy bound"
        );
        Ok(output)
    }

    // =========================================
    // Classes
    // =========================================

    fn bind_classes(&mut self, output: &mut HierarchyOutput) -> Result<(), CompilationError> {
        for (name, class) in &self.tables.classes {
            let Some((parent, span)) = class.inherits.first() else {
                continue;
            };
            if let Some((_, extra)) = class.inherits.get(1) {
                return Err(CompilationError::unsupported(
                    *extra,
                    "Interfaces and multiple inheritance are not supported.",
                ));
            }

            let Some(parent_id) = self.index.class_id(parent) else {
                if self.tables.kind_of(parent).is_some() {
                    return Err(CompilationError::other(*span, "This is not a valid class."));
                }
                return Err(CompilationError::unknown_type(*span, parent.clone()));
            };

            if let Some(id) = self.index.class_id(name) {
                trace!(class = %name, parent = %parent, "class parent bound");
                self.index.set_class_parent(id, parent_id);
                output.classes_bound += 1;
            }
        }
        Ok(())
    }

    fn check_class_cycles(&self) -> Result<(), CompilationError> {
        let index = &*self.index;
        let Some(node) = find_cycle(index.class_count(), |i| {
            index.class_parent(ClassId(i as u32)).map(|p| p.0 as usize)
        }) else {
            return Ok(());
        };
        let name = index.class_name(ClassId(node as u32)).unwrap_or_default();
        let span = self.tables.classes.get(name).map(|c| c.span).unwrap_or_default();
        Err(CompilationError::CircularInheritance {
            name: name.to_string(),
            message: "This class has a cycle in its inheritance chain.".to_string(),
            span,
        })
    }

    // =========================================
    // Structs
    // =========================================

    fn bind_structs(&mut self, output: &mut HierarchyOutput) -> Result<(), CompilationError> {
        for (name, def) in &self.tables.structs {
            let Some(parent) = &def.parent else {
                continue;
            };
            let span = def.parent_span.unwrap_or(def.span);
            let Some(parent_id) = self.index.struct_id(parent) else {
                if self.tables.kind_of(parent).is_some() {
                    return Err(CompilationError::other(span, "This is not a valid struct."));
                }
                return Err(CompilationError::UnknownType {
                    name: parent.clone(),
                    message: format!("There is no struct by the name of '{parent}'"),
                    span,
                });
            };
            if let Some(id) = self.index.struct_id(name) {
                trace!(r#struct = %name, parent = %parent, "struct parent bound");
                self.index.set_struct_parent(id, parent_id);
                output.structs_bound += 1;
            }
        }
        Ok(())
    }

    fn check_struct_cycles(&self) -> Result<(), CompilationError> {
        let index = &*self.index;
        let Some(node) = find_cycle(index.struct_count(), |i| {
            index.struct_parent(StructId(i as u32)).map(|p| p.0 as usize)
        }) else {
            return Ok(());
        };
        let name = index.struct_name(StructId(node as u32)).unwrap_or_default();
        let span = self.tables.structs.get(name).map(|s| s.span).unwrap_or_default();
        Err(CompilationError::CircularInheritance {
            name: name.to_string(),
            message: "The parent chain for this struct has a cycle.".to_string(),
            span,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Safe,
}

/// Find a node that lies on a cycle of a parent graph over `0..len`.
///
/// Nodes proven to reach a root are marked safe and never walked again.
pub(crate) fn find_cycle(len: usize, parent: impl Fn(usize) -> Option<usize>) -> Option<usize> {
    let mut marks = vec![Mark::Unvisited; len];
    for start in 0..len {
        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(node) = current {
            match marks.get(node).copied() {
                Some(Mark::Unvisited) => {
                    marks[node] = Mark::Visiting;
                    path.push(node);
                    current = parent(node);
                }
                Some(Mark::Visiting) => return Some(node),
                Some(Mark::Safe) | None => break,
            }
        }
        for node in path {
            marks[node] = Mark::Safe;
        }
    }
    None
}
