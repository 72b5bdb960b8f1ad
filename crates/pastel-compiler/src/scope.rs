//! Local variable scopes and the owner of the code being resolved.
//!
//! This module provides:
//! - [`Owner`]: which function, method, constructor or field initializer a
//!   piece of code belongs to. Expression nodes carry no back pointer; the
//!   resolver passes the owner down explicitly.
//! - [`VariableScope`]: the nested block scopes of one body. Pastel does not
//!   allow shadowing, so a declaration that collides with any visible
//!   variable is an error.

use pastel_core::{ClassId, CompilationError, PType, Span};
use rustc_hash::FxHashMap;

// ============================================================================
// Owner
// ============================================================================

/// The entity whose code is being resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Owner {
    /// A free function, or a method when `class` is set.
    Function {
        class: Option<ClassId>,
        name: String,
        return_type: PType,
    },
    /// A class constructor.
    Constructor { class: ClassId },
    /// A class field initializer.
    Field { class: ClassId, name: String },
    /// Top-level code such as a constant or enum value.
    Module,
}

impl Owner {
    /// The class this code belongs to, which is what `this` refers to.
    pub fn class(&self) -> Option<ClassId> {
        match self {
            Owner::Function { class, .. } => *class,
            Owner::Constructor { class } | Owner::Field { class, .. } => Some(*class),
            Owner::Module => None,
        }
    }

    /// The declared return type, for owners that can `return`.
    ///
    /// Constructors return `void`.
    pub fn return_type(&self) -> Option<PType> {
        match self {
            Owner::Function { return_type, .. } => Some(return_type.clone()),
            Owner::Constructor { .. } => Some(PType::void()),
            Owner::Field { .. } | Owner::Module => None,
        }
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self, Owner::Constructor { .. })
    }
}

// ============================================================================
// VariableScope
// ============================================================================

/// A declared local.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVar {
    pub ty: PType,
    /// Where the variable was declared.
    pub span: Span,
    /// Block depth of the declaration (0 = parameters and function body).
    pub depth: u32,
}

/// The locals visible at one point of a body.
#[derive(Debug, Default)]
pub struct VariableScope {
    variables: FxHashMap<String, LocalVar>,
    depth: u32,
}

impl VariableScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a nested block.
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave a block, forgetting every variable it declared.
    pub fn pop_scope(&mut self) {
        let depth = self.depth;
        self.variables.retain(|_, var| var.depth < depth);
        self.depth = depth.saturating_sub(1);
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Declare a variable in the current block.
    pub fn declare(&mut self, name: &str, ty: PType, span: Span) -> Result<(), CompilationError> {
        if self.variables.contains_key(name) {
            return Err(CompilationError::DuplicateDefinition {
                name: name.to_string(),
                message: format!(
                    "This declaration of '{name}' conflicts with a previous declaration."
                ),
                span,
            });
        }
        self.variables.insert(
            name.to_string(),
            LocalVar {
                ty,
                span,
                depth: self.depth,
            },
        );
        Ok(())
    }

    /// Look up a visible variable.
    pub fn lookup(&self, name: &str) -> Option<&LocalVar> {
        self.variables.get(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pastel_core::FileId;

    fn at(line: u32) -> Span {
        Span::new(FileId(0), line, 1, 1)
    }

    #[test]
    fn nested_blocks_forget_their_locals() {
        let mut scope = VariableScope::new();
        scope.declare("a", PType::int(), at(1)).unwrap();

        scope.push_scope();
        scope.declare("b", PType::string(), at(2)).unwrap();
        assert!(scope.lookup("a").is_some());
        assert_eq!(scope.lookup("b").unwrap().ty, PType::string());
        scope.pop_scope();

        assert!(scope.lookup("b").is_none());
        assert_eq!(scope.depth(), 0);
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn sibling_blocks_may_reuse_names() {
        let mut scope = VariableScope::new();
        scope.push_scope();
        scope.declare("i", PType::int(), at(1)).unwrap();
        scope.pop_scope();
        scope.push_scope();
        assert!(scope.declare("i", PType::int(), at(2)).is_ok());
    }

    #[test]
    fn shadowing_is_rejected() {
        let mut scope = VariableScope::new();
        scope.declare("x", PType::int(), at(1)).unwrap();
        scope.push_scope();
        let err = scope.declare("x", PType::int(), at(3)).unwrap_err();
        assert_eq!(
            err.message(),
            "This declaration of 'x' conflicts with a previous declaration."
        );
        assert_eq!(err.span().line, 3);
    }

    #[test]
    fn owners() {
        let method = Owner::Function {
            class: Some(ClassId(2)),
            name: "update".to_string(),
            return_type: PType::bool(),
        };
        assert_eq!(method.class(), Some(ClassId(2)));
        assert_eq!(method.return_type(), Some(PType::bool()));

        let ctor = Owner::Constructor { class: ClassId(0) };
        assert!(ctor.is_constructor());
        assert_eq!(ctor.return_type(), Some(PType::void()));

        assert_eq!(Owner::Module.class(), None);
        assert_eq!(Owner::Module.return_type(), None);
    }
}
