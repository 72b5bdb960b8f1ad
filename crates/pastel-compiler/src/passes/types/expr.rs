//! Expression resolution.
//!
//! Every expression that leaves [`resolve`] carries a resolved type.
//! Children are resolved before their parent, and a parent is rebuilt
//! around its resolved children rather than updated in place.

use pastel_core::{CompilationError, Constant, PType, Span, TypeRef};
use pastel_parser::ast::{BinaryOp, Expression, ExpressionKind, IncrementOp, UnaryOp};

use super::{Result, TypeResolver, calls, type_of};
use crate::operators::{binary_result_type, chain_to_pairs, fold_unary, unary_result_type};
use crate::signatures::builtin_method;

/// Resolve an expression in any position.
pub(super) fn resolve(resolver: &mut TypeResolver<'_>, expression: Expression) -> Result<Expression> {
    let span = expression.span;
    match expression.kind {
        ExpressionKind::InlineConstant(value) => {
            let ty = expression.resolved_type.unwrap_or_else(|| value.ptype());
            Ok(Expression::constant(value, span).with_type(ty))
        }
        ExpressionKind::Variable(name) => resolve_variable(resolver, name, span, "variable"),
        ExpressionKind::This => match resolver.owner.class() {
            Some(class) => {
                let ty = resolver.class_type(class, span)?;
                Ok(Expression::new(ExpressionKind::This, span).with_type(ty))
            }
            None => Err(CompilationError::other(
                span,
                "Cannot use the expression 'this' outside of classes.",
            )),
        },
        ExpressionKind::UnaryOp { op, operand } => resolve_unary(resolver, op, *operand, span),
        ExpressionKind::OpChain { operands, ops } => {
            let pairs = chain_to_pairs(operands, ops)
                .ok_or_else(|| CompilationError::other(span, "Malformed operator chain."))?;
            resolve(resolver, pairs)
        }
        ExpressionKind::OpPair { left, op, right } => resolve_pair(resolver, *left, op, *right, span),
        ExpressionKind::StringConcatenation(operands) => {
            let operands = operands
                .into_iter()
                .map(|e| resolver.expression(e))
                .collect::<Result<Vec<_>>>()?;
            Ok(Expression::new(ExpressionKind::StringConcatenation(operands), span)
                .with_type(PType::string()))
        }
        ExpressionKind::BracketIndex { root, index } => resolve_index(resolver, *root, *index, span),
        ExpressionKind::DotField {
            root,
            field,
            field_span,
        } => resolve_dot_field(resolver, *root, field, field_span, span),
        ExpressionKind::FunctionInvocation { root, args } => {
            calls::resolve_invocation(resolver, *root, args, span)
        }
        ExpressionKind::FunctionReference(name) => {
            let ty = resolver
                .tables
                .functions
                .get(&name)
                .map(|f| f.signature_type())
                .ok_or_else(|| undefined(&name, span, "function"))?;
            Ok(Expression::new(ExpressionKind::FunctionReference(name), span).with_type(ty))
        }
        ExpressionKind::Cast { target, operand } => {
            let operand = resolver.expression(*operand)?;
            let target = target.finalize(resolver.index, span)?;
            Ok(Expression::new(
                ExpressionKind::Cast {
                    target: target.clone(),
                    operand: Box::new(operand),
                },
                span,
            )
            .with_type(target))
        }
        ExpressionKind::InlineIncrement {
            op,
            operand,
            prefix,
        } => resolve_increment(resolver, op, *operand, prefix, span),
        ExpressionKind::CompileTimeFunctionReference(_) => Err(CompilationError::other(
            span,
            "Compile-time functions can only be used as standalone statements and cannot be used in expressions.",
        )),
        kind @ (ExpressionKind::CoreFunctionReference { context: None, .. }
        | ExpressionKind::ExtensibleFunctionReference(_)
        | ExpressionKind::ConstructorReference(_)
        | ExpressionKind::NamespaceReference(_)
        | ExpressionKind::EnumReference(_)) => {
            Ok(Expression::new(kind, span).with_type(PType::core_function()))
        }
        kind => match expression.resolved_type {
            Some(ty) => Ok(Expression::new(kind, span).with_type(ty)),
            None => Err(CompilationError::other(span, "Could not resolve the type of this expression.")),
        },
    }
}

pub(super) fn undefined(name: &str, span: Span, what: &str) -> CompilationError {
    CompilationError::UnknownName {
        name: name.to_string(),
        message: format!("The {what} '{name}' is not defined."),
        span,
    }
}

/// Look a name up in the local scope. `what` names the role in the error.
pub(super) fn resolve_variable(
    resolver: &TypeResolver<'_>,
    name: String,
    span: Span,
    what: &str,
) -> Result<Expression> {
    let Some(local) = resolver.scope.lookup(&name) else {
        return Err(undefined(&name, span, what));
    };
    let ty = local.ty.clone();
    Ok(Expression::new(ExpressionKind::Variable(name), span).with_type(ty))
}

// =========================================
// Operators
// =========================================

fn resolve_unary(
    resolver: &mut TypeResolver<'_>,
    op: UnaryOp,
    operand: Expression,
    span: Span,
) -> Result<Expression> {
    let operand = resolver.expression(operand)?;
    let operand_type = type_of(&operand);
    let Some(ty) = unary_result_type(op, &operand_type) else {
        return Err(CompilationError::type_mismatch(
            span,
            format!("Cannot apply '{op}' to type: {operand_type}"),
        ));
    };
    if let Some(folded) = operand.as_constant().and_then(|value| fold_unary(op, value)) {
        return Ok(Expression::constant(folded, span));
    }
    Ok(Expression::new(
        ExpressionKind::UnaryOp {
            op,
            operand: Box::new(operand),
        },
        span,
    )
    .with_type(ty))
}

fn resolve_pair(
    resolver: &mut TypeResolver<'_>,
    left: Expression,
    op: BinaryOp,
    right: Expression,
    span: Span,
) -> Result<Expression> {
    let left = resolver.expression(left)?;
    let right = resolver.expression(right)?;
    let left_type = type_of(&left);
    let right_type = type_of(&right);

    let Some(ty) = binary_result_type(&left_type, op, &right_type) else {
        return Err(CompilationError::invalid_operator(
            span,
            op.as_str(),
            &left_type.to_string(),
            &right_type.to_string(),
        ));
    };

    if op == BinaryOp::Add && ty.is_string() {
        let mut operands = Vec::new();
        for side in [left, right] {
            match side.kind {
                ExpressionKind::StringConcatenation(inner) => operands.extend(inner),
                _ => operands.push(side),
            }
        }
        return Ok(
            Expression::new(ExpressionKind::StringConcatenation(operands), span).with_type(ty),
        );
    }

    Ok(Expression::new(
        ExpressionKind::OpPair {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
    .with_type(ty))
}

fn resolve_increment(
    resolver: &mut TypeResolver<'_>,
    op: IncrementOp,
    operand: Expression,
    prefix: bool,
    span: Span,
) -> Result<Expression> {
    let operand = resolver.expression(operand)?;
    if !type_of(&operand).is_int() {
        return Err(CompilationError::type_mismatch(
            span,
            "++ and -- can only be applied to integer types.",
        ));
    }
    Ok(Expression::new(
        ExpressionKind::InlineIncrement {
            op,
            operand: Box::new(operand),
            prefix,
        },
        span,
    )
    .with_type(PType::int()))
}

// =========================================
// Indexing
// =========================================

fn resolve_index(
    resolver: &mut TypeResolver<'_>,
    root: Expression,
    index: Expression,
    span: Span,
) -> Result<Expression> {
    let root = resolver.expression(root)?;
    let index = resolver.expression(index)?;
    let root_type = type_of(&root);
    let index_type = type_of(&index);

    let mismatch = || {
        CompilationError::type_mismatch(
            span,
            format!("Cannot index into a {root_type} with a {index_type}."),
        )
    };

    let ty = match root_type.root().as_str() {
        "string" if index_type.is_int() => {
            if let (Some(Constant::String(text)), Some(Constant::Int(at))) =
                (root.as_constant(), index.as_constant())
            {
                let found = usize::try_from(*at).ok().and_then(|at| text.chars().nth(at));
                if let Some(c) = found {
                    return Ok(Expression::constant(Constant::Char(c), span));
                }
            }
            PType::char()
        }
        "string" => return Err(mismatch()),
        "List" | "Array" => {
            if !index_type.is_int() {
                return Err(mismatch());
            }
            root_type.generics().first().cloned().ok_or_else(mismatch)?
        }
        "Dictionary" => {
            let [key, value] = root_type.generics() else {
                return Err(mismatch());
            };
            if !index_type.is_identical(key, resolver.index) {
                return Err(mismatch());
            }
            value.clone()
        }
        _ => {
            return Err(CompilationError::NotIndexable {
                message: format!("Cannot index into a {root_type} with a {index_type}."),
                span,
            });
        }
    };

    Ok(Expression::new(
        ExpressionKind::BracketIndex {
            root: Box::new(root),
            index: Box::new(index),
        },
        span,
    )
    .with_type(ty))
}

// =========================================
// Fields and methods
// =========================================

fn resolve_dot_field(
    resolver: &mut TypeResolver<'_>,
    root: Expression,
    field: String,
    field_span: Span,
    span: Span,
) -> Result<Expression> {
    let root = resolver.expression(root)?;
    let root_type = type_of(&root);

    let field_expression = |root: Expression, field: String, ty: PType| {
        Expression::new(
            ExpressionKind::DotField {
                root: Box::new(root),
                field,
                field_span,
            },
            span,
        )
        .with_type(ty)
    };

    match root_type.type_ref(resolver.index) {
        Some(TypeRef::Struct(id)) => {
            let name = resolver.index.struct_name(id).unwrap_or_default();
            let Some(def) = resolver.tables.structs.get(name) else {
                return Err(CompilationError::unknown_type(span, name));
            };
            let Some(found) = def.field(&field) else {
                return Err(CompilationError::UnknownField {
                    message: format!("The struct '{name}' does not have a field called '{field}'."),
                    field,
                    span: field_span,
                });
            };
            let ty = found.ty.clone();
            Ok(field_expression(root, field, ty))
        }
        Some(TypeRef::Class(id)) => {
            for class in resolver.index.class_chain(id) {
                let Some(def) = resolver
                    .index
                    .class_name(class)
                    .and_then(|n| resolver.tables.classes.get(n))
                else {
                    continue;
                };
                if let Some(found) = def.field(&field) {
                    let ty = found.ty.clone();
                    return Ok(field_expression(root, field, ty));
                }
                if let Some(method) = def.method(&field) {
                    let ty = method.signature_type();
                    return Ok(Expression::new(
                        ExpressionKind::MethodReference {
                            root: Box::new(root),
                            class,
                            name: field,
                        },
                        span,
                    )
                    .with_type(ty));
                }
            }
            let name = resolver.index.class_name(id).unwrap_or_default();
            Err(CompilationError::UnknownField {
                message: format!("The class '{name}' does not have a field called '{field}'."),
                field,
                span: field_span,
            })
        }
        None => {
            let function = builtin_method(&root_type, &field, field_span)?;
            Ok(Expression::new(
                ExpressionKind::CoreFunctionReference {
                    function,
                    context: Some(Box::new(root)),
                },
                span,
            )
            .with_type(PType::core_function()))
        }
    }
}
