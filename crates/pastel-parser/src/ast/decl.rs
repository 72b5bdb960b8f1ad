//! Top-level entity AST nodes for Pastel.
//!
//! A Pastel file is a flat list of [`Entity`] values: functions, structs,
//! classes, enums and constants. There are no namespaces and no nesting
//! beyond class members.
//!
//! A few fields are empty after parsing and filled in by the resolver
//! (flattened struct fields, resolved parents). They live on the node so
//! that a resolved program is a self-contained tree.

use std::collections::BTreeMap;

use pastel_core::{ClassId, PType, Span, StructId};

use super::expr::Expression;
use super::stmt::{Statement, walk_block};

/// A top-level item.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Function(FunctionDefinition),
    Struct(StructDefinition),
    Class(ClassDefinition),
    Enum(EnumDefinition),
    Constant(ConstantDefinition),
}

impl Entity {
    /// The declared name.
    pub fn name(&self) -> &str {
        match self {
            Entity::Function(e) => &e.name,
            Entity::Struct(e) => &e.name,
            Entity::Class(e) => &e.name,
            Entity::Enum(e) => &e.name,
            Entity::Constant(e) => &e.name,
        }
    }

    /// Get the span of this entity's name.
    pub fn span(&self) -> Span {
        match self {
            Entity::Function(e) => e.span,
            Entity::Struct(e) => e.span,
            Entity::Class(e) => e.span,
            Entity::Enum(e) => e.span,
            Entity::Constant(e) => e.span,
        }
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub ty: PType,
    pub name: String,
    pub span: Span,
}

/// A free function or a class method.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub return_type: PType,
    pub params: Vec<Parameter>,
    pub body: Vec<Statement>,
    pub span: Span,
}

impl FunctionDefinition {
    /// The function's type as a value: `Func<R, A...>`.
    pub fn signature_type(&self) -> PType {
        PType::function_of(
            self.return_type.clone(),
            self.params.iter().map(|p| p.ty.clone()),
        )
    }

    /// Visit every expression in the body.
    pub fn walk_expressions<'a>(&'a self, visit: &mut impl FnMut(&'a Expression)) {
        walk_block(&self.body, visit);
    }
}

/// A declared struct field.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub ty: PType,
    pub name: String,
    pub span: Span,
}

/// `struct Name [extends Parent] { Type field; ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct StructDefinition {
    pub name: String,
    /// The `extends` name, if any.
    pub parent: Option<String>,
    pub parent_span: Option<Span>,
    /// Fields declared in this struct's own body.
    pub local_fields: Vec<StructField>,
    /// Bound parent. Set by the struct hierarchy stage.
    pub parent_id: Option<StructId>,
    /// Every field including inherited ones, parent first. Set by flattening.
    pub flattened_fields: Vec<StructField>,
    /// Field name to position in `flattened_fields`.
    pub field_index: BTreeMap<String, usize>,
    pub span: Span,
}

impl StructDefinition {
    /// Look up a flattened field by name.
    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.field_index
            .get(name)
            .and_then(|&i| self.flattened_fields.get(i))
    }
}

/// The single constructor of a class.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDefinition {
    pub params: Vec<Parameter>,
    pub body: Vec<Statement>,
    pub span: Span,
}

/// A class field with its initial value.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassField {
    pub ty: PType,
    pub name: String,
    pub value: Expression,
    pub span: Span,
}

/// `class Name [: Parent] { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDefinition {
    pub name: String,
    /// Every name after `:`. More than one is rejected by the resolver.
    pub inherits: Vec<(String, Span)>,
    /// Bound parent. Set by the class hierarchy stage.
    pub parent_id: Option<ClassId>,
    pub constructor: ConstructorDefinition,
    pub fields: Vec<ClassField>,
    pub methods: Vec<FunctionDefinition>,
    pub span: Span,
}

impl ClassDefinition {
    pub fn field(&self, name: &str) -> Option<&ClassField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&FunctionDefinition> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// The class as a type.
    pub fn ptype(&self) -> PType {
        PType::named(&self.name)
    }

    /// Visit every expression in the constructor, field initializers and methods.
    pub fn walk_expressions<'a>(&'a self, visit: &mut impl FnMut(&'a Expression)) {
        walk_block(&self.constructor.body, visit);
        for field in &self.fields {
            field.value.walk(visit);
        }
        for method in &self.methods {
            method.walk_expressions(visit);
        }
    }
}

/// One enum member. `value` is absent until assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub value: Option<Expression>,
    pub span: Span,
}

/// `enum Name { A, B = expr }`
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDefinition {
    pub name: String,
    pub members: Vec<EnumMember>,
    pub span: Span,
}

impl EnumDefinition {
    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// The integer value of a member once constants are resolved.
    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.member(name)?.value.as_ref()?.as_constant()?.as_int()
    }
}

/// `const Type NAME = value;`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDefinition {
    pub ty: PType,
    pub name: String,
    pub value: Expression,
    pub span: Span,
}
