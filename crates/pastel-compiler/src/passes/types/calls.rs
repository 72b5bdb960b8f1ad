//! Invocation resolution.
//!
//! Arguments are resolved before the call target. The target decides
//! which invocation node replaces the call and how the arguments are
//! checked:
//!
//! - user functions and methods: exact arity, assignable arguments
//! - core functions: registry signature with per-call template bindings
//! - extensible functions: the host-provided signature
//! - constructors: struct fields, class constructor parameters, or
//!   anything for builtin collections
//! - `Func` values: exact arity, identical argument types

use pastel_core::{CompilationError, CoreFunction, PType, Span, TemplateBindings, TypeRef};
use pastel_parser::ast::{Expression, ExpressionKind};

use super::expr::{resolve, resolve_variable, undefined};
use super::{Result, TypeResolver, type_of};

/// Resolve `root(args)`.
pub(super) fn resolve_invocation(
    resolver: &mut TypeResolver<'_>,
    root: Expression,
    args: Vec<Expression>,
    span: Span,
) -> Result<Expression> {
    let args = args
        .into_iter()
        .map(|arg| resolver.expression(arg))
        .collect::<Result<Vec<_>>>()?;

    let root_span = root.span;
    let root = match root.kind {
        ExpressionKind::Variable(name) => resolve_variable(resolver, name, root_span, "function")?,
        ExpressionKind::ConstructorReference(target) => {
            return resolve_constructor(resolver, target, args, span);
        }
        kind => resolve(
            resolver,
            Expression {
                kind,
                span: root_span,
                resolved_type: root.resolved_type,
            },
        )?,
    };

    match &root.kind {
        ExpressionKind::FunctionReference(name) => {
            let tables = resolver.tables;
            let Some(function) = tables.functions.get(name) else {
                return Err(undefined(name, root_span, "function"));
            };
            let params: Vec<PType> = function.params.iter().map(|p| p.ty.clone()).collect();
            check_user_args(resolver, &params, &args, span)?;
            let ty = function.return_type.clone();
            Ok(invocation(root, args, span, ty))
        }
        ExpressionKind::MethodReference { class, name, .. } => {
            let tables = resolver.tables;
            let method = resolver
                .index
                .class_name(*class)
                .and_then(|c| tables.classes.get(c))
                .and_then(|c| c.method(name));
            let Some(method) = method else {
                return Err(undefined(name, root_span, "method"));
            };
            let params: Vec<PType> = method.params.iter().map(|p| p.ty.clone()).collect();
            check_user_args(resolver, &params, &args, span)?;
            let ty = method.return_type.clone();
            Ok(invocation(root, args, span, ty))
        }
        ExpressionKind::CoreFunctionReference { .. } => {
            let ExpressionKind::CoreFunctionReference { function, context } = root.kind else {
                return Err(not_invocable(span));
            };
            let mut all_args = Vec::with_capacity(args.len() + 1);
            all_args.extend(context.map(|c| *c));
            all_args.extend(args);
            let ty = check_core_args(resolver, function, &all_args, span)?;
            Ok(Expression::new(
                ExpressionKind::CoreFunctionInvocation {
                    function,
                    args: all_args,
                },
                span,
            )
            .with_type(ty))
        }
        ExpressionKind::ExtensibleFunctionReference(name) => {
            let ty = check_extensible_args(resolver, name, &args, span)?;
            Ok(Expression::new(
                ExpressionKind::ExtensibleFunctionInvocation {
                    name: name.clone(),
                    args,
                },
                span,
            )
            .with_type(ty))
        }
        _ => {
            let root_type = type_of(&root);
            if !root_type.is_function() {
                return Err(not_invocable(span));
            }
            let expected = root_type.function_arg_types();
            if expected.len() != args.len() {
                return Err(CompilationError::ArgumentCountMismatch {
                    expected: expected.len(),
                    got: args.len(),
                    message: "This function has the incorrect number of arguments.".to_string(),
                    span,
                });
            }
            for (expected, arg) in expected.iter().zip(&args) {
                let actual = type_of(arg);
                if !actual.is_identical(expected, resolver.index) {
                    return Err(CompilationError::type_mismatch(
                        arg.span,
                        format!("Incorrect argument type. Expected {expected} but found {actual}."),
                    ));
                }
            }
            let ty = root_type
                .function_return_type()
                .cloned()
                .unwrap_or_else(PType::void);
            Ok(Expression::new(
                ExpressionKind::FunctionPointerInvocation {
                    root: Box::new(root),
                    args,
                },
                span,
            )
            .with_type(ty))
        }
    }
}

fn invocation(root: Expression, args: Vec<Expression>, span: Span, ty: PType) -> Expression {
    Expression::new(
        ExpressionKind::FunctionInvocation {
            root: Box::new(root),
            args,
        },
        span,
    )
    .with_type(ty)
}

fn not_invocable(span: Span) -> CompilationError {
    CompilationError::type_mismatch(span, "This expression cannot be invoked like a function.")
}

// =========================================
// User functions
// =========================================

fn check_user_args(
    resolver: &TypeResolver<'_>,
    params: &[PType],
    args: &[Expression],
    span: Span,
) -> Result<()> {
    if params.len() != args.len() {
        return Err(CompilationError::ArgumentCountMismatch {
            expected: params.len(),
            got: args.len(),
            message: format!(
                "This function invocation has the wrong number of parameters. Expected {} but found {}.",
                params.len(),
                args.len()
            ),
            span,
        });
    }
    for (param, arg) in params.iter().zip(args) {
        let actual = type_of(arg);
        if !PType::check_assignment(param, &actual, resolver.index) {
            return Err(CompilationError::type_mismatch(
                arg.span,
                format!("Wrong function arg type. Cannot convert a {actual} to a {param}"),
            ));
        }
    }
    Ok(())
}

// =========================================
// Core functions
// =========================================

/// Check a builtin call against its registry signature and return the
/// call's type with every placeholder bound.
fn check_core_args(
    resolver: &TypeResolver<'_>,
    function: CoreFunction,
    args: &[Expression],
    span: Span,
) -> Result<PType> {
    let expected = resolver.registry.arg_types(function);
    let repeats = resolver.registry.last_arg_repeats(function);
    let verify_len = if repeats {
        expected.len().saturating_sub(1)
    } else {
        expected.len()
    };

    if args.len() < verify_len {
        return Err(CompilationError::argument_count(span, verify_len, args.len()));
    }

    let mut bindings = TemplateBindings::new();
    let mut check = |declared: &PType, arg: &Expression| -> Result<()> {
        let actual = type_of(arg);
        if PType::check_assignment_with_template_output(declared, &actual, &mut bindings, resolver.index) {
            return Ok(());
        }
        let wanted = declared.resolve_templates(&bindings);
        Err(CompilationError::type_mismatch(
            arg.span,
            format!("Incorrect type. Expected {wanted} but found {actual}."),
        ))
    };

    for (declared, arg) in expected.iter().zip(&args[..verify_len]) {
        check(declared, arg)?;
    }
    match expected.last() {
        Some(repeated) if repeats => {
            for arg in &args[verify_len..] {
                check(repeated, arg)?;
            }
        }
        _ if args.len() > verify_len => {
            return Err(CompilationError::ArgumentCountMismatch {
                expected: verify_len,
                got: args.len(),
                message: "Too many arguments.".to_string(),
                span,
            });
        }
        _ => {}
    }

    let ty = if function == CoreFunction::MathAbs {
        args.first()
            .map(type_of)
            .unwrap_or_else(|| resolver.registry.return_type(function).clone())
    } else {
        resolver.registry.return_type(function).resolve_templates(&bindings)
    };
    if ty.has_templates() {
        return Err(CompilationError::other(
            span,
            format!("Could not determine the return type of {}.", function.name()),
        ));
    }
    Ok(ty)
}

// =========================================
// Extensible functions
// =========================================

fn check_extensible_args(
    resolver: &TypeResolver<'_>,
    name: &str,
    args: &[Expression],
    span: Span,
) -> Result<PType> {
    let Some(function) = resolver.extensions.get(name) else {
        return Err(CompilationError::UnknownName {
            name: name.to_string(),
            message: format!("Type information for '{name}' extensible function is not defined."),
            span,
        });
    };
    if function.arg_types.len() != args.len() {
        return Err(CompilationError::argument_count(
            span,
            function.arg_types.len(),
            args.len(),
        ));
    }
    for (declared, arg) in function.arg_types.iter().zip(args) {
        let declared = declared.finalize(resolver.index, span)?;
        let actual = type_of(arg);
        if !PType::check_assignment(&declared, &actual, resolver.index) {
            return Err(CompilationError::type_mismatch(
                arg.span,
                format!("Invalid argument type. Expected '{declared}' but found '{actual}'."),
            ));
        }
    }
    function.return_type.finalize(resolver.index, span)
}

// =========================================
// Constructors
// =========================================

fn resolve_constructor(
    resolver: &mut TypeResolver<'_>,
    target: PType,
    args: Vec<Expression>,
    span: Span,
) -> Result<Expression> {
    let target = target.finalize(resolver.index, span)?;

    match target.type_ref(resolver.index) {
        Some(TypeRef::Struct(id)) => {
            let tables = resolver.tables;
            let def = resolver
                .index
                .struct_name(id)
                .and_then(|n| tables.structs.get(n))
                .ok_or_else(|| CompilationError::unknown_type(span, target.root()))?;
            let fields = &def.flattened_fields;
            if fields.len() != args.len() {
                return Err(CompilationError::ArgumentCountMismatch {
                    expected: fields.len(),
                    got: args.len(),
                    message: format!(
                        "Incorrect number of args in constructor. Expected {}, found {}",
                        fields.len(),
                        args.len()
                    ),
                    span,
                });
            }
            for (field, arg) in fields.iter().zip(&args) {
                let actual = type_of(arg);
                if !PType::check_assignment(&field.ty, &actual, resolver.index) {
                    return Err(CompilationError::type_mismatch(
                        arg.span,
                        format!(
                            "Cannot use an arg of this type for this struct field. Expected {} but found {actual}",
                            field.ty
                        ),
                    ));
                }
            }
        }
        Some(TypeRef::Class(id)) => {
            let tables = resolver.tables;
            let def = resolver
                .index
                .class_name(id)
                .and_then(|n| tables.classes.get(n))
                .ok_or_else(|| CompilationError::unknown_type(span, target.root()))?;
            let params: Vec<PType> = def.constructor.params.iter().map(|p| p.ty.clone()).collect();
            check_user_args(resolver, &params, &args, span)?;
        }
        None => match target.root().as_str() {
            "List" | "Array" | "Dictionary" | "StringBuilder" => {}
            _ => {
                return Err(CompilationError::type_mismatch(
                    span,
                    "Cannot instantiate this item.",
                ));
            }
        },
    }

    Ok(Expression::new(
        ExpressionKind::ConstructorInvocation {
            target: target.clone(),
            args,
        },
        span,
    )
    .with_type(target))
}
