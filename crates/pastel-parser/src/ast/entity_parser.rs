//! Top-level entity parsing for Pastel.
//!
//! Dispatches on the leading word of each item:
//! - `class`, `struct`, `enum`, `const`
//! - `@import`, `@importIfTrue`, `@importIfFalse`, which load another file
//!   and splice its entities in place
//! - anything else is a function definition

use std::collections::BTreeSet;

use pastel_core::{Constant, FileId, PType, ParseError, ParseErrorKind, PastelError, Span};
use tracing::debug;

use super::expr_parser::unescape;
use super::parser::Parser;
use crate::ast::decl::*;
use crate::ast::expr::Expression;
use crate::lexer::TokenKind;

impl<'ctx> Parser<'ctx> {
    /// Parse every entity until the end of the file.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse_entities(&mut self) -> Result<Vec<Entity>, PastelError> {
        let mut entities = Vec::new();
        while !self.is_done() {
            self.parse_entity_into(&mut entities)?;
        }
        debug!(count = entities.len(), "entities parsed");
        Ok(entities)
    }

    fn parse_entity_into(&mut self, entities: &mut Vec<Entity>) -> Result<(), PastelError> {
        let entity = match self.tokens.peek_text() {
            "class" => Entity::Class(self.parse_class()?),
            "enum" => Entity::Enum(self.parse_enum()?),
            "const" => Entity::Constant(self.parse_constant()?),
            "struct" => Entity::Struct(self.parse_struct()?),
            "@" => {
                entities.extend(self.parse_top_level_import()?);
                return Ok(());
            }
            _ => Entity::Function(self.parse_function()?),
        };
        entities.push(entity);
        Ok(())
    }

    // =========================================
    // Functions
    // =========================================

    /// `Type name(Type a, ...) { ... }`
    pub fn parse_function(&mut self) -> Result<FunctionDefinition, PastelError> {
        let return_type = self.parse_type()?;
        let name = self.pop_name("Expected function name")?;
        let params = self.parse_parameters()?;
        let body = self.parse_code_block(true)?;

        Ok(FunctionDefinition {
            name: name.text,
            return_type,
            params,
            body,
            span: name.span,
        })
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, ParseError> {
        self.tokens.pop_expected("(")?;
        let mut params = Vec::new();
        while !self.tokens.pop_if_present(")") {
            if !params.is_empty() {
                self.tokens.pop_expected(",")?;
            }
            let ty = self.parse_type()?;
            let name = self.pop_name("Invalid function arg name")?;
            params.push(Parameter {
                ty,
                name: name.text,
                span: name.span,
            });
        }
        Ok(params)
    }

    // =========================================
    // Structs and classes
    // =========================================

    /// `struct Name [extends Parent] { Type field; ... }`
    pub fn parse_struct(&mut self) -> Result<StructDefinition, ParseError> {
        self.tokens.pop_expected("struct")?;
        let name = self.pop_name("Invalid struct name")?;

        let (parent, parent_span) = if self.tokens.pop_if_present("extends") {
            let parent = self.pop_name("Invalid struct name")?;
            (Some(parent.text), Some(parent.span))
        } else {
            (None, None)
        };

        self.tokens.pop_expected("{")?;
        let mut local_fields = Vec::new();
        while !self.tokens.pop_if_present("}") {
            let ty = self.parse_type()?;
            let field = self.pop_name("Invalid struct field name")?;
            self.tokens.pop_expected(";")?;
            local_fields.push(StructField {
                ty,
                name: field.text,
                span: field.span,
            });
        }

        Ok(StructDefinition {
            name: name.text,
            parent,
            parent_span,
            local_fields,
            parent_id: None,
            flattened_fields: Vec::new(),
            field_index: Default::default(),
            span: name.span,
        })
    }

    /// `class Name [: Parent] { constructor(...) { } Type field [= value]; Type method(...) { } }`
    pub fn parse_class(&mut self) -> Result<ClassDefinition, PastelError> {
        self.tokens.pop_expected("class")?;
        let name = self.pop_name("Invalid class name")?;

        let mut inherits = Vec::new();
        if self.tokens.pop_if_present(":") {
            loop {
                let parent = self.pop_name("Invalid class name")?;
                inherits.push((parent.text, parent.span));
                if !self.tokens.pop_if_present(",") {
                    break;
                }
            }
        }

        self.tokens.pop_expected("{")?;

        let mut constructor: Option<ConstructorDefinition> = None;
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        let mut member_names = BTreeSet::new();

        while !self.tokens.pop_if_present("}") {
            if self.tokens.is_next("constructor") {
                let span = self.tokens.pop()?.span;
                if constructor.is_some() {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidDeclaration,
                        span,
                        "Only one constructor is permitted per class.",
                    )
                    .into());
                }
                let params = self.parse_parameters()?;
                let body = self.parse_code_block(true)?;
                constructor = Some(ConstructorDefinition { params, body, span });
                continue;
            }

            let ty = self.parse_type()?;
            let member = self.pop_name("Invalid class member name")?;
            if !member_names.insert(member.text.clone()) {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidDeclaration,
                    member.span,
                    format!(
                        "There are conflicting members in the class '{}' for the name '{}'.",
                        name.text, member.text
                    ),
                )
                .into());
            }

            if self.tokens.is_next("(") {
                let params = self.parse_parameters()?;
                let body = self.parse_code_block(true)?;
                methods.push(FunctionDefinition {
                    name: member.text,
                    return_type: ty,
                    params,
                    body,
                    span: member.span,
                });
            } else {
                let value = if self.tokens.pop_if_present("=") {
                    self.parse_expression()?
                } else {
                    default_field_value(&ty, member.span)
                };
                self.tokens.pop_expected(";")?;
                fields.push(ClassField {
                    ty,
                    name: member.text,
                    value,
                    span: member.span,
                });
            }
        }

        let constructor = constructor.unwrap_or_else(|| ConstructorDefinition {
            params: Vec::new(),
            body: Vec::new(),
            span: name.span,
        });

        Ok(ClassDefinition {
            name: name.text,
            inherits,
            parent_id: None,
            constructor,
            fields,
            methods,
            span: name.span,
        })
    }

    // =========================================
    // Enums and constants
    // =========================================

    /// `enum Name { A, B = value, }`
    pub fn parse_enum(&mut self) -> Result<EnumDefinition, ParseError> {
        self.tokens.pop_expected("enum")?;
        let name = self.pop_name("Invalid name for an enum.")?;
        self.tokens.pop_expected("{")?;

        let mut members = Vec::new();
        while !self.tokens.pop_if_present("}") {
            let member = self.pop_name("Invalid name for a enum value.")?;
            let value = if self.tokens.pop_if_present("=") {
                Some(self.parse_expression()?)
            } else {
                None
            };
            members.push(EnumMember {
                name: member.text,
                value,
                span: member.span,
            });
            if !self.tokens.pop_if_present(",") {
                self.tokens.pop_expected("}")?;
                break;
            }
        }

        Ok(EnumDefinition {
            name: name.text,
            members,
            span: name.span,
        })
    }

    /// `const Type NAME = value;`
    pub fn parse_constant(&mut self) -> Result<ConstantDefinition, PastelError> {
        let span = self.tokens.pop_expected("const")?.span;
        let declaration = self.parse_declaration_statement()?;
        let Some(value) = declaration.value else {
            return Err(ParseError::new(
                ParseErrorKind::InvalidDeclaration,
                span,
                "Expected an assignment here.",
            )
            .into());
        };

        Ok(ConstantDefinition {
            ty: declaration.ty,
            name: declaration.name,
            value,
            span: declaration.name_span,
        })
    }

    // =========================================
    // Imports
    // =========================================

    /// `@import("path");`, `@importIfTrue("CONST", "path");` or
    /// `@importIfFalse("CONST", "path");`
    fn parse_top_level_import(&mut self) -> Result<Vec<Entity>, PastelError> {
        let span = self.tokens.pop_expected("@")?.span;

        let condition = match self.tokens.peek_text() {
            "importIfTrue" | "importIfFalse" => {
                let invert = self.tokens.pop()?.is("importIfFalse");
                self.tokens.pop_expected("(")?;
                let constant = self.pop_string_constant()?;
                self.tokens.pop_expected(",")?;
                Some(self.context.constant_is_true(&constant) != invert)
            }
            _ => {
                self.tokens.pop_expected("import")?;
                self.tokens.pop_expected("(")?;
                None
            }
        };

        let path = self.pop_string_constant()?;
        self.tokens.pop_expected(")")?;
        self.tokens.pop_expected(";")?;

        if condition == Some(false) {
            debug!(path, "conditional import skipped");
            return Ok(Vec::new());
        }

        let file = self.context.begin_import(&path, span)?;
        let parsed = self.parse_imported_entities(file);
        self.context.end_import();
        parsed
    }

    fn parse_imported_entities(&mut self, file: FileId) -> Result<Vec<Entity>, PastelError> {
        self.nested(file)?.parse_entities()
    }

    fn pop_string_constant(&mut self) -> Result<String, ParseError> {
        let token = self.tokens.pop()?;
        if token.kind != TokenKind::String || !token.text.starts_with('"') {
            return Err(ParseError::new(
                ParseErrorKind::InvalidExpression,
                token.span,
                "Expected a string constant here.",
            ));
        }
        unescape(&token)
    }
}

/// The initial value of a class field declared without one.
fn default_field_value(ty: &PType, span: Span) -> Expression {
    let value = if ty.is_nullable() {
        Constant::Null
    } else if ty.is_double() {
        Constant::float(0.0)
    } else if ty.is_int() {
        Constant::Int(0)
    } else if ty.is_bool() {
        Constant::Bool(false)
    } else if ty.is_char() {
        Constant::Char('\0')
    } else {
        Constant::Null
    };
    Expression::constant(value, span)
}
