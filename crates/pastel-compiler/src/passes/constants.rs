//! Constant Pass - evaluate enum members and top-level constants.
//!
//! Every enum member and every `const` ends this pass as an inline literal.
//! Values may refer to other constants and enum members in any order, so
//! evaluation is demand driven: a reference evaluates its target first and
//! stores the result back into the tables. A string-keyed set of the items
//! currently being evaluated (`"Enum.Member"` or the constant name) turns a
//! self-dependency into an error instead of endless recursion.
//!
//! Enum members without an explicit value are numbered after the explicit
//! ones: the first gets one more than the largest explicit value (or 0 when
//! there is none), and each following one counts up from there.

use rustc_hash::FxHashSet;
use tracing::{debug, instrument, trace};

use pastel_core::{CompilationError, Constant, PType, Span};
use pastel_parser::ast::{Expression, ExpressionKind};

use crate::index::ProgramIndex;
use crate::operators::{chain_to_pairs, fold_binary, fold_unary};
use crate::tables::ProgramTables;

/// Output of the constant pass.
#[derive(Debug, Default)]
pub struct ConstantOutput {
    /// Enum members given a value by evaluation or auto-numbering.
    pub enum_members_resolved: usize,
    /// Top-level constants evaluated to a literal.
    pub constants_resolved: usize,
}

/// Constant Pass - folds enum values and constants into literals.
pub struct ConstantPass<'a> {
    tables: &'a mut ProgramTables,
    index: &'a ProgramIndex,
    /// Items currently being evaluated.
    resolving: FxHashSet<String>,
    output: ConstantOutput,
}

impl<'a> ConstantPass<'a> {
    pub fn new(tables: &'a mut ProgramTables, index: &'a ProgramIndex) -> Self {
        Self {
            tables,
            index,
            resolving: FxHashSet::default(),
            output: ConstantOutput::default(),
        }
    }

    #[instrument(skip_all, name = "constants")]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self) -> Result<ConstantOutput, CompilationError> {
        let enum_names: Vec<String> = self.tables.enums.keys().cloned().collect();
        for name in &enum_names {
            self.resolve_enum(name)?;
        }

        let constant_names: Vec<String> = self.tables.constants.keys().cloned().collect();
        for name in &constant_names {
            self.resolve_constant(name)?;
        }

        debug!(
            enum_members = self.output.enum_members_resolved,
            constants = self.output.constants_resolved,
            "constants resolved"
        );
        Ok(self.output)
    }

    // =========================================
    // Constants
    // =========================================

    fn resolve_constant(&mut self, name: &str) -> Result<Constant, CompilationError> {
        let Some(def) = self.tables.constants.get(name) else {
            return Err(not_a_constant(Span::default()));
        };
        if let Some(value) = def.value.as_constant() {
            if def.value.resolved_type.as_ref() == Some(&def.ty) {
                return Ok(value.clone());
            }
        }
        if self.resolving.contains(name) {
            return Err(CompilationError::ConstantCycle {
                name: name.to_string(),
                message: format!("The constant '{name}' has a cycle in its value declaration."),
                span: def.span,
            });
        }

        let declared = def.ty.finalize(self.index, def.span)?;
        let expression = def.value.clone();

        self.resolving.insert(name.to_string());
        let value = self.evaluate(&expression)?;
        self.resolving.remove(name);

        let value = coerce(&declared, value).ok_or_else(|| {
            CompilationError::type_mismatch(
                expression.span,
                format!("Cannot assign this type to a {declared}"),
            )
        })?;

        if let Some(def) = self.tables.constants.get_mut(name) {
            def.value = Expression::constant(value.clone(), expression.span).with_type(declared.clone());
            def.ty = declared;
        }
        trace!(constant = %name, value = %value, "constant resolved");
        self.output.constants_resolved += 1;
        Ok(value)
    }

    // =========================================
    // Enums
    // =========================================

    /// Evaluate every member of an enum, explicit values first.
    fn resolve_enum(&mut self, name: &str) -> Result<(), CompilationError> {
        let Some(def) = self.tables.enums.get(name) else {
            return Ok(());
        };
        let explicit: Vec<String> = def
            .members
            .iter()
            .filter(|m| m.value.as_ref().is_some_and(|v| !v.is_constant()))
            .map(|m| m.name.clone())
            .collect();
        for member in &explicit {
            self.resolve_member(name, member)?;
        }

        let Some(def) = self.tables.enums.get_mut(name) else {
            return Ok(());
        };
        if def.members.iter().all(|m| m.value.is_some()) {
            return Ok(());
        }

        let mut next = def
            .members
            .iter()
            .filter_map(|m| m.value.as_ref()?.as_constant()?.as_int())
            .max()
            .map_or(0, |max| max.wrapping_add(1));
        for member in def.members.iter_mut().filter(|m| m.value.is_none()) {
            member.value = Some(Expression::constant(Constant::Int(next), member.span));
            trace!(member = %member.name, value = next, "enum member numbered");
            next = next.wrapping_add(1);
            self.output.enum_members_resolved += 1;
        }
        Ok(())
    }

    fn resolve_member(&mut self, enum_name: &str, member: &str) -> Result<i32, CompilationError> {
        let Some(def) = self.tables.enums.get(enum_name) else {
            return Err(not_a_constant(Span::default()));
        };
        let Some(entry) = def.member(member) else {
            return Err(CompilationError::UnknownName {
                name: format!("{enum_name}.{member}"),
                message: format!(
                    "The enum value '{member}' does not exist in the definition of '{enum_name}'."
                ),
                span: def.span,
            });
        };

        let expression = match &entry.value {
            None => {
                self.resolve_enum(enum_name)?;
                return self
                    .tables
                    .enums
                    .get(enum_name)
                    .and_then(|e| e.value_of(member))
                    .ok_or_else(|| not_a_constant(Span::default()));
            }
            Some(value) => match value.as_constant() {
                Some(Constant::Int(i)) => return Ok(*i),
                Some(_) => return Err(not_an_integer(value.span)),
                None => value.clone(),
            },
        };

        let key = format!("{enum_name}.{member}");
        if self.resolving.contains(&key) {
            return Err(CompilationError::ConstantCycle {
                name: key,
                message: format!(
                    "This enum has a cycle in its value declarations in '{member}'"
                ),
                span: expression.span,
            });
        }

        self.resolving.insert(key.clone());
        let value = self.evaluate(&expression)?;
        self.resolving.remove(&key);

        let Constant::Int(value) = value else {
            return Err(not_an_integer(expression.span));
        };
        if let Some(entry) = self
            .tables
            .enums
            .get_mut(enum_name)
            .and_then(|e| e.members.iter_mut().find(|m| m.name == member))
        {
            entry.value = Some(Expression::constant(Constant::Int(value), expression.span));
        }
        trace!(member = %key, value, "enum member resolved");
        self.output.enum_members_resolved += 1;
        Ok(value)
    }

    // =========================================
    // Evaluation
    // =========================================

    fn evaluate(&mut self, expression: &Expression) -> Result<Constant, CompilationError> {
        let span = expression.span;
        match &expression.kind {
            ExpressionKind::InlineConstant(value) => Ok(value.clone()),

            ExpressionKind::Variable(name) if self.tables.constants.contains_key(name) => {
                self.resolve_constant(name)
            }

            ExpressionKind::DotField { root, field, .. } => match &root.kind {
                ExpressionKind::Variable(name) if self.tables.enums.contains_key(name) => {
                    let name = name.clone();
                    self.resolve_member(&name, field).map(Constant::Int)
                }
                _ => Err(not_a_constant(span)),
            },

            ExpressionKind::UnaryOp { op, operand } => {
                let value = self.evaluate(operand)?;
                fold_unary(*op, &value).ok_or_else(|| {
                    CompilationError::type_mismatch(
                        span,
                        format!("Cannot apply '{op}' to type: {}", value.ptype()),
                    )
                })
            }

            ExpressionKind::OpChain { operands, ops } => {
                let pairs = chain_to_pairs(operands.clone(), ops.clone())
                    .ok_or_else(|| not_a_constant(span))?;
                self.evaluate(&pairs)
            }

            ExpressionKind::OpPair { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                fold_binary(&left, *op, &right, span)?.ok_or_else(|| {
                    CompilationError::invalid_operator(
                        span,
                        op.as_str(),
                        &left.ptype().to_string(),
                        &right.ptype().to_string(),
                    )
                })
            }

            ExpressionKind::FunctionInvocation { root, args } if is_core_ord(root) => {
                match args.as_slice() {
                    [arg] => match self.evaluate(arg)? {
                        Constant::Char(c) => Ok(Constant::Int(c as i32)),
                        _ => Err(not_a_constant(arg.span)),
                    },
                    _ => Err(CompilationError::argument_count(span, 1, args.len())),
                }
            }

            _ => Err(not_a_constant(span)),
        }
    }
}

/// `Core.Ord`, the only builtin allowed in constant expressions.
fn is_core_ord(root: &Expression) -> bool {
    matches!(
        &root.kind,
        ExpressionKind::DotField { root, field, .. }
            if field == "Ord" && matches!(&root.kind, ExpressionKind::Variable(ns) if ns == "Core")
    )
}

/// Fit a literal to the declared type of its constant.
///
/// An int literal is accepted where a double is declared.
fn coerce(declared: &PType, value: Constant) -> Option<Constant> {
    match value {
        Constant::Int(i) if declared.is_double() => Some(Constant::float(f64::from(i))),
        Constant::Null if declared.is_nullable() => Some(Constant::Null),
        value if value.ptype().is_identical(declared, &pastel_core::EmptyTypeIndex) => Some(value),
        _ => None,
    }
}

fn not_a_constant(span: Span) -> CompilationError {
    CompilationError::other(span, "Not able to resolve this constant.")
}

fn not_an_integer(span: Span) -> CompilationError {
    CompilationError::type_mismatch(span, "Enum values must resolve into integers. This does not.")
}
