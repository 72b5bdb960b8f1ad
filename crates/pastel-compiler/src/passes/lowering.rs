//! Lowering Pass - fold constants and lower sugar now that types are known.
//!
//! This pass rewrites typed code into the smaller set of forms code
//! generators have to handle:
//!
//! - binary pairs over literals are folded, and `&&`/`||` with a literal
//!   left operand are shortcut
//! - string concatenations stringify their literals, merge adjacent ones,
//!   and wrap other primitives in the matching `*_TO_STRING` builtin
//! - `root[index]` becomes a `*_GET` builtin call and `root[index] = v`
//!   becomes a `*_SET` builtin call
//! - `for` loops become a batch of the init statements followed by a
//!   `while` whose body ends with the step
//! - `if` on a literal condition is replaced by the branch that runs
//!
//! Switch cases are checked here because they must have folded down to
//! literals by now.
//!
//! ## Example
//!
//! ```text
//! string label(int n) { return "n=" + n + "!"; }
//!
//! After this pass:
//! - the return value is Concat["n=", INT_TO_STRING(n), "!"]
//! ```

use pastel_core::{CompilationError, Constant, CoreFunction, PType, Span};
use pastel_parser::ast::{
    Assignment, BinaryOp, CaseLabel, Expression, ExpressionKind, ExpressionStatement, ForLoop,
    IfStatement, ReturnStatement, Statement, StatementBatch, SwitchChunk, SwitchStatement,
    VariableDeclaration, WhileLoop,
};
use rustc_hash::FxHashSet;
use tracing::{debug, instrument, trace};

use crate::operators::{fold_binary, fold_unary};
use crate::tables::ProgramTables;

type Result<T> = std::result::Result<T, CompilationError>;

/// Output of the lowering pass.
#[derive(Debug, Default)]
pub struct LoweringOutput {
    /// Expressions replaced by a literal.
    pub folded: usize,
    /// Nodes replaced by builtin calls or simpler statements.
    pub lowered: usize,
}

/// Lowering Pass - the final resolver stage.
pub struct LoweringPass<'a> {
    tables: &'a mut ProgramTables,
}

impl<'a> LoweringPass<'a> {
    pub fn new(tables: &'a mut ProgramTables) -> Self {
        Self { tables }
    }

    #[instrument(skip_all, name = "lowering")]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> Result<LoweringOutput> {
        let mut lowerer = Lowerer::default();

        for class in self.tables.classes.values_mut() {
            let body = std::mem::take(&mut class.constructor.body);
            class.constructor.body = lowerer.block(body)?;
            for field in &mut class.fields {
                let value = std::mem::replace(&mut field.value, Expression::new(ExpressionKind::This, field.span));
                field.value = lowerer.expression(value)?;
            }
            for method in &mut class.methods {
                let body = std::mem::take(&mut method.body);
                method.body = lowerer.block(body)?;
            }
            trace!(class = %class.name, "lowered");
        }

        for function in self.tables.functions.values_mut() {
            let body = std::mem::take(&mut function.body);
            function.body = lowerer.block(body)?;
            trace!(function = %function.name, "lowered");
        }

        debug!(folded = lowerer.output.folded, lowered = lowerer.output.lowered, "lowering complete");
        Ok(lowerer.output)
    }
}

// ============================================================================
// Lowerer
// ============================================================================

#[derive(Default)]
struct Lowerer {
    output: LoweringOutput,
}

impl Lowerer {
    fn block(&mut self, block: Vec<Statement>) -> Result<Vec<Statement>> {
        block.into_iter().map(|s| self.statement(s)).collect()
    }

    fn statement(&mut self, statement: Statement) -> Result<Statement> {
        Ok(match statement {
            Statement::VariableDeclaration(decl) => {
                Statement::VariableDeclaration(VariableDeclaration {
                    value: decl.value.map(|v| self.expression(v)).transpose()?,
                    ..decl
                })
            }
            Statement::Assignment(assign) => self.assignment(assign)?,
            Statement::If(stmt) => {
                let condition = self.expression(stmt.condition)?;
                if let Some(taken) = condition.as_bool_constant() {
                    let branch = if taken {
                        stmt.then_branch
                    } else {
                        stmt.else_branch
                    };
                    self.output.lowered += 1;
                    return Ok(Statement::batch(self.block(branch)?, stmt.span));
                }
                Statement::If(IfStatement {
                    condition,
                    then_branch: self.block(stmt.then_branch)?,
                    else_branch: self.block(stmt.else_branch)?,
                    span: stmt.span,
                })
            }
            Statement::For(stmt) => self.for_loop(stmt)?,
            Statement::While(stmt) => Statement::While(WhileLoop {
                condition: self.expression(stmt.condition)?,
                body: self.block(stmt.body)?,
                span: stmt.span,
            }),
            Statement::Switch(stmt) => self.switch(stmt)?,
            Statement::Break(stmt) => Statement::Break(stmt),
            Statement::Return(stmt) => Statement::Return(ReturnStatement {
                value: stmt.value.map(|v| self.expression(v)).transpose()?,
                span: stmt.span,
            }),
            Statement::Expression(stmt) => Statement::Expression(ExpressionStatement {
                expression: self.expression(stmt.expression)?,
                span: stmt.span,
            }),
            Statement::Batch(batch) => {
                Statement::Batch(StatementBatch::new(self.block(batch.statements)?, batch.span))
            }
        })
    }

    fn for_loop(&mut self, stmt: ForLoop) -> Result<Statement> {
        let span = stmt.span;
        let mut statements = self.block(stmt.init)?;
        let condition = match stmt.condition {
            Some(condition) => self.expression(condition)?,
            None => Expression::constant(Constant::Bool(true), span),
        };
        let mut body = self.block(stmt.body)?;
        body.extend(self.block(stmt.step)?);
        statements.push(Statement::While(WhileLoop {
            condition,
            body,
            span,
        }));
        self.output.lowered += 1;
        Ok(Statement::batch(statements, span))
    }

    fn switch(&mut self, stmt: SwitchStatement) -> Result<Statement> {
        let condition = self.expression(stmt.condition)?;
        let mut seen: FxHashSet<Constant> = FxHashSet::default();
        let mut chunks = Vec::with_capacity(stmt.chunks.len());

        for chunk in stmt.chunks {
            let mut labels = Vec::with_capacity(chunk.labels.len());
            for label in chunk.labels {
                let CaseLabel::Case(value) = label else {
                    labels.push(label);
                    continue;
                };
                let value = self.expression(value)?;
                let Some(constant) = value.as_constant() else {
                    return Err(CompilationError::other(
                        value.span,
                        "Only constants may be used as switch cases.",
                    ));
                };
                if !seen.insert(constant.clone()) {
                    return Err(CompilationError::DuplicateSwitchCase {
                        message: "This case appears multiple times.".to_string(),
                        span: value.span,
                    });
                }
                labels.push(CaseLabel::Case(value));
            }
            chunks.push(SwitchChunk {
                labels,
                body: self.block(chunk.body)?,
            });
        }

        Ok(Statement::Switch(SwitchStatement {
            condition,
            chunks,
            span: stmt.span,
        }))
    }

    // =========================================
    // Assignments
    // =========================================

    fn assignment(&mut self, assign: Assignment) -> Result<Statement> {
        let value = self.expression(assign.value)?;
        let span = assign.span;

        let ExpressionKind::BracketIndex { root, index } = assign.target.kind else {
            return Ok(Statement::Assignment(Assignment {
                target: self.target(assign.target)?,
                value,
                ..assign
            }));
        };

        let target_type = assign.target.resolved_type.unwrap_or_else(PType::void);
        let root = self.expression(*root)?;
        let index = self.expression(*index)?;
        let root_type = type_of(&root);

        let setter = match root_type.root().as_str() {
            "Array" => CoreFunction::ArraySet,
            "List" => CoreFunction::ListSet,
            "Dictionary" => CoreFunction::DictionarySet,
            _ => return Err(CompilationError::other(span, "Can't use brackets here.")),
        };

        let value = match assign.op.binary_op() {
            None => value,
            Some(op) if setter == CoreFunction::ArraySet => {
                let current = core_call(
                    CoreFunction::ArrayGet,
                    vec![root.clone(), index.clone()],
                    span,
                    target_type.clone(),
                );
                Expression::new(
                    ExpressionKind::OpPair {
                        left: Box::new(current),
                        op,
                        right: Box::new(value),
                    },
                    span,
                )
                .with_type(target_type)
            }
            Some(_) => {
                return Err(CompilationError::unsupported(
                    span,
                    "Incremental assignment on a key/index is not currently supported.",
                ));
            }
        };

        self.output.lowered += 1;
        Ok(Statement::Expression(ExpressionStatement {
            expression: core_call(setter, vec![root, index, value], span, PType::void()),
            span,
        }))
    }

    /// Lower the children of an assignable expression, keeping its shape.
    fn target(&mut self, target: Expression) -> Result<Expression> {
        let span = target.span;
        let kind = match target.kind {
            ExpressionKind::DotField {
                root,
                field,
                field_span,
            } => ExpressionKind::DotField {
                root: Box::new(self.expression(*root)?),
                field,
                field_span,
            },
            ExpressionKind::BracketIndex { root, index } => ExpressionKind::BracketIndex {
                root: Box::new(self.expression(*root)?),
                index: Box::new(self.expression(*index)?),
            },
            kind => kind,
        };
        Ok(Expression {
            kind,
            span,
            resolved_type: target.resolved_type,
        })
    }

    // =========================================
    // Expressions
    // =========================================

    fn expression(&mut self, expression: Expression) -> Result<Expression> {
        let span = expression.span;
        let ty = expression.resolved_type;
        let kind = match expression.kind {
            ExpressionKind::OpPair { left, op, right } => {
                return self.pair(*left, op, *right, span, ty);
            }
            ExpressionKind::StringConcatenation(operands) => {
                return self.concatenation(operands, span);
            }
            ExpressionKind::BracketIndex { root, index } => {
                let root = self.expression(*root)?;
                let index = self.expression(*index)?;
                let getter = match type_of(&root).root().as_str() {
                    "string" => CoreFunction::StringCharAt,
                    "List" => CoreFunction::ListGet,
                    "Dictionary" => CoreFunction::DictionaryGet,
                    "Array" => CoreFunction::ArrayGet,
                    _ => return Err(CompilationError::other(span, "Can't use brackets here.")),
                };
                self.output.lowered += 1;
                return Ok(core_call(
                    getter,
                    vec![root, index],
                    span,
                    ty.unwrap_or_else(PType::void),
                ));
            }
            ExpressionKind::CoreFunctionInvocation { function, args } => {
                let args = self.expressions(args)?;
                if function == CoreFunction::Ord {
                    if let [arg] = args.as_slice() {
                        if let Some(Constant::Char(c)) = arg.as_constant() {
                            self.output.folded += 1;
                            return Ok(Expression::constant(Constant::Int(*c as i32), span));
                        }
                    }
                }
                ExpressionKind::CoreFunctionInvocation { function, args }
            }
            ExpressionKind::UnaryOp { op, operand } => {
                let operand = self.expression(*operand)?;
                if let Some(folded) = operand.as_constant().and_then(|value| fold_unary(op, value)) {
                    self.output.folded += 1;
                    return Ok(Expression::constant(folded, span));
                }
                ExpressionKind::UnaryOp {
                    op,
                    operand: Box::new(operand),
                }
            }
            ExpressionKind::DotField {
                root,
                field,
                field_span,
            } => ExpressionKind::DotField {
                root: Box::new(self.expression(*root)?),
                field,
                field_span,
            },
            ExpressionKind::MethodReference { root, class, name } => ExpressionKind::MethodReference {
                root: Box::new(self.expression(*root)?),
                class,
                name,
            },
            ExpressionKind::FunctionInvocation { root, args } => ExpressionKind::FunctionInvocation {
                root: Box::new(self.expression(*root)?),
                args: self.expressions(args)?,
            },
            ExpressionKind::FunctionPointerInvocation { root, args } => {
                ExpressionKind::FunctionPointerInvocation {
                    root: Box::new(self.expression(*root)?),
                    args: self.expressions(args)?,
                }
            }
            ExpressionKind::ConstructorInvocation { target, args } => {
                ExpressionKind::ConstructorInvocation {
                    target,
                    args: self.expressions(args)?,
                }
            }
            ExpressionKind::ExtensibleFunctionInvocation { name, args } => {
                ExpressionKind::ExtensibleFunctionInvocation {
                    name,
                    args: self.expressions(args)?,
                }
            }
            ExpressionKind::Cast { target, operand } => ExpressionKind::Cast {
                target,
                operand: Box::new(self.expression(*operand)?),
            },
            ExpressionKind::InlineIncrement {
                op,
                operand,
                prefix,
            } => ExpressionKind::InlineIncrement {
                op,
                operand: Box::new(self.target(*operand)?),
                prefix,
            },
            other => other,
        };
        Ok(Expression {
            kind,
            span,
            resolved_type: ty,
        })
    }

    fn expressions(&mut self, expressions: Vec<Expression>) -> Result<Vec<Expression>> {
        expressions.into_iter().map(|e| self.expression(e)).collect()
    }

    fn pair(
        &mut self,
        left: Expression,
        op: BinaryOp,
        right: Expression,
        span: Span,
        ty: Option<PType>,
    ) -> Result<Expression> {
        let left = self.expression(left)?;
        let right = self.expression(right)?;

        if let (Some(a), Some(b)) = (left.as_constant(), right.as_constant()) {
            return match fold_binary(a, op, b, span)? {
                Some(folded) => {
                    self.output.folded += 1;
                    Ok(Expression::constant(folded, span))
                }
                None => Err(CompilationError::other(
                    span,
                    "The operator is not defined for these two constants.",
                )),
            };
        }

        if op.is_boolean_combination() {
            if let Some(value) = left.as_bool_constant() {
                self.output.folded += 1;
                let short_circuits = (op == BinaryOp::Or) == value;
                return Ok(if short_circuits { left } else { right });
            }
        }

        Ok(Expression {
            kind: ExpressionKind::OpPair {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
            resolved_type: ty,
        })
    }

    fn concatenation(&mut self, operands: Vec<Expression>, span: Span) -> Result<Expression> {
        let mut parts: Vec<Expression> = Vec::with_capacity(operands.len());

        for operand in operands {
            let operand = self.expression(operand)?;

            if let Some(value) = operand.as_constant() {
                let Some(text) = value.to_concat_string() else {
                    return Err(CompilationError::type_mismatch(
                        operand.span,
                        "Cannot concatenate null to string.",
                    ));
                };
                if text.is_empty() {
                    continue;
                }
                if let Some(Constant::String(previous)) = parts.last_mut().and_then(literal_mut) {
                    previous.push_str(&text);
                } else {
                    parts.push(Expression::constant(Constant::String(text), operand.span));
                }
                continue;
            }

            let operand_type = type_of(&operand);
            let converter = match operand_type.root().as_str() {
                "string" => {
                    parts.push(operand);
                    continue;
                }
                "int" => CoreFunction::IntToString,
                "double" => CoreFunction::FloatToString,
                "bool" => CoreFunction::BoolToString,
                "char" => CoreFunction::CharToString,
                _ => {
                    return Err(CompilationError::type_mismatch(
                        operand.span,
                        format!("There is no default conversion from {operand_type} to string."),
                    ));
                }
            };
            let operand_span = operand.span;
            parts.push(core_call(converter, vec![operand], operand_span, PType::string()));
            self.output.lowered += 1;
        }

        Ok(match parts.len() {
            0 => Expression::constant(Constant::String(String::new()), span),
            1 => parts.remove(0),
            _ => Expression::new(ExpressionKind::StringConcatenation(parts), span)
                .with_type(PType::string()),
        })
    }
}

fn literal_mut(expression: &mut Expression) -> Option<&mut Constant> {
    match &mut expression.kind {
        ExpressionKind::InlineConstant(value) => Some(value),
        _ => None,
    }
}

fn core_call(function: CoreFunction, args: Vec<Expression>, span: Span, ty: PType) -> Expression {
    Expression::new(ExpressionKind::CoreFunctionInvocation { function, args }, span).with_type(ty)
}

fn type_of(expression: &Expression) -> PType {
    expression.resolved_type.clone().unwrap_or_else(PType::void)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::ExtensionSet;
    use crate::index::ProgramIndex;
    use crate::passes::constants::ConstantPass;
    use crate::passes::fields::FieldTypePass;
    use crate::passes::flatten::StructFlattenPass;
    use crate::passes::hierarchy::ClassHierarchyPass;
    use crate::passes::names::NameResolutionPass;
    use crate::passes::signature_types::SignatureTypePass;
    use crate::passes::types::TypeResolutionPass;
    use pastel_parser::{ParseContext, Parser};

    fn run(source: &str) -> Result<ProgramTables> {
        let mut context = ParseContext::new();
        let entities = Parser::parse_source(&mut context, "main.pst", source).unwrap();
        let mut tables = ProgramTables::from_entities(entities).unwrap();
        let mut index = ProgramIndex::build(&tables);
        ClassHierarchyPass::new(&mut tables, &mut index).run()?;
        ConstantPass::new(&mut tables, &index).run()?;
        FieldTypePass::new(&mut tables, &index).run()?;
        StructFlattenPass::new(&mut tables, &index).run()?;
        NameResolutionPass::new(&mut tables, &[]).run()?;
        SignatureTypePass::new(&mut tables, &index).run()?;
        TypeResolutionPass::new(&mut tables, &index, &ExtensionSet::new()).run()?;
        LoweringPass::new(&mut tables).run()?;
        Ok(tables)
    }

    fn body(tables: &ProgramTables, function: &str) -> Vec<Statement> {
        tables.functions[function].body.clone()
    }

    fn returned(tables: &ProgramTables, function: &str) -> Expression {
        tables.functions[function]
            .body
            .iter()
            .rev()
            .find_map(|s| match s {
                Statement::Return(r) => r.value.clone(),
                _ => None,
            })
            .unwrap()
    }

    fn returned_constant(source: &str) -> Constant {
        let tables = run(source).unwrap();
        returned(&tables, "f").as_constant().cloned().unwrap()
    }

    fn core_function_of(expression: &Expression) -> Option<CoreFunction> {
        match &expression.kind {
            ExpressionKind::CoreFunctionInvocation { function, .. } => Some(*function),
            _ => None,
        }
    }

    // =========================================
    // Folding
    // =========================================

    #[test]
    fn arithmetic_folds() {
        assert_eq!(returned_constant("int f() { return (1 + 2) * 3; }"), Constant::Int(9));
        assert_eq!(returned_constant("int f() { return 2 + 3; }"), Constant::Int(5));
        assert_eq!(returned_constant("double f() { return 1 + 2.5; }"), Constant::float(3.5));
        assert_eq!(returned_constant("int f() { return -7 % 3; }"), Constant::Int(2));
    }

    #[test]
    fn comparisons_fold() {
        assert_eq!(returned_constant("bool f() { return 2 < 3; }"), Constant::Bool(true));
    }

    #[test]
    fn division_by_literal_zero() {
        let err = run("int f() { return 1 / 0; }").unwrap_err();
        assert!(matches!(err, CompilationError::DivisionByZero { .. }));
    }

    #[test]
    fn literal_strings_fold() {
        assert_eq!(
            returned_constant("string f() { return \"ab\" + \"cd\"; }"),
            Constant::String("abcd".to_string())
        );
        assert_eq!(
            returned_constant("string f() { return \"x\" + 1 + true + 'c' + 1.5; }"),
            Constant::String("x1truec1.5".to_string())
        );
    }

    #[test]
    fn boolean_shortcuts() {
        let tables = run(
            "bool g() { return false; }\n\
             bool f() { return true || g(); }\n\
             bool h() { return true && g(); }",
        )
        .unwrap();
        assert_eq!(returned(&tables, "f").as_constant(), Some(&Constant::Bool(true)));
        assert!(matches!(
            returned(&tables, "h").kind,
            ExpressionKind::FunctionInvocation { .. }
        ));
    }

    #[test]
    fn ord_of_a_literal_char() {
        assert_eq!(returned_constant("int f() { return Core.Ord('a'); }"), Constant::Int(97));
    }

    // =========================================
    // Concatenation
    // =========================================

    #[test]
    fn concatenation_converts_primitives() {
        let tables = run("string f(string s, int n) { return s + n + \"!\" + \"?\"; }").unwrap();
        let ExpressionKind::StringConcatenation(parts) = returned(&tables, "f").kind else {
            panic!("Expected concatenation");
        };
        assert_eq!(parts.len(), 3);
        assert_eq!(core_function_of(&parts[1]), Some(CoreFunction::IntToString));
        assert_eq!(parts[2].as_constant(), Some(&Constant::String("!?".to_string())));
    }

    #[test]
    fn empty_literals_drop_out() {
        let tables = run("string f(string s) { return \"\" + s; }").unwrap();
        assert!(matches!(returned(&tables, "f").kind, ExpressionKind::Variable(ref n) if n == "s"));
    }

    #[test]
    fn null_cannot_be_concatenated() {
        let err = run("const string NOTHING = null;\nstring f() { return \"a\" + NOTHING; }").unwrap_err();
        assert_eq!(err.message(), "Cannot concatenate null to string.");
    }

    // =========================================
    // Indexing
    // =========================================

    #[test]
    fn reads_become_getters() {
        let tables = run(
            "int f(List<int> a) { return a[0]; }\n\
             char g(string s, int i) { return s[i]; }\n\
             int h(Dictionary<string, int> d) { return d[\"k\"]; }\n\
             int k(Array<int> a) { return a[1]; }",
        )
        .unwrap();
        assert_eq!(core_function_of(&returned(&tables, "f")), Some(CoreFunction::ListGet));
        assert_eq!(core_function_of(&returned(&tables, "g")), Some(CoreFunction::StringCharAt));
        assert_eq!(core_function_of(&returned(&tables, "h")), Some(CoreFunction::DictionaryGet));
        assert_eq!(core_function_of(&returned(&tables, "k")), Some(CoreFunction::ArrayGet));
    }

    #[test]
    fn writes_become_setters() {
        let tables = run(
            "void f(List<int> a, Dictionary<string, int> d) { a[0] = 1; d[\"k\"] = 2; }",
        )
        .unwrap();
        let calls: Vec<_> = body(&tables, "f")
            .iter()
            .map(|s| match s {
                Statement::Expression(e) => core_function_of(&e.expression),
                _ => None,
            })
            .collect();
        assert_eq!(
            calls,
            vec![Some(CoreFunction::ListSet), Some(CoreFunction::DictionarySet)]
        );
    }

    #[test]
    fn incremental_array_write_reads_first() {
        let tables = run("void f(Array<int> a) { a[1] += 2; }").unwrap();
        let Statement::Expression(stmt) = &body(&tables, "f")[0] else {
            panic!("Expected expression statement");
        };
        let ExpressionKind::CoreFunctionInvocation { function, args } = &stmt.expression.kind else {
            panic!("Expected core invocation");
        };
        assert_eq!(*function, CoreFunction::ArraySet);
        let ExpressionKind::OpPair { left, op, .. } = &args[2].kind else {
            panic!("Expected pair");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert_eq!(core_function_of(left), Some(CoreFunction::ArrayGet));
    }

    #[test]
    fn incremental_list_write_is_unsupported() {
        let err = run("void f(List<int> a) { a[0] += 1; }").unwrap_err();
        assert!(matches!(err, CompilationError::Unsupported { .. }));
    }

    // =========================================
    // Statements
    // =========================================

    #[test]
    fn for_becomes_while() {
        let tables = run("int f() { int t = 0; for (int i = 0; i < 3; i++) { t += i; } return t; }")
            .unwrap();
        let Statement::Batch(batch) = &body(&tables, "f")[1] else {
            panic!("Expected batch");
        };
        assert!(matches!(batch.statements[0], Statement::VariableDeclaration(_)));
        let Statement::While(looped) = &batch.statements[1] else {
            panic!("Expected while");
        };
        assert_eq!(looped.body.len(), 2);
    }

    #[test]
    fn literal_conditions_prune() {
        let tables = run("int f() { if (1 < 2) { return 1; } return 2; }").unwrap();
        assert!(matches!(body(&tables, "f")[0], Statement::Batch(_)));
    }

    #[test]
    fn duplicate_switch_case() {
        let err = run(
            "const int FIVE = 5;\n\
             void f(int x) { switch (x) { case 5: break; case FIVE: break; } }",
        )
        .unwrap_err();
        assert!(matches!(err, CompilationError::DuplicateSwitchCase { .. }));
    }

    #[test]
    fn switch_cases_must_be_constant() {
        let err = run("void f(int x, int y) { switch (x) { case y: break; } }").unwrap_err();
        assert_eq!(err.message(), "Only constants may be used as switch cases.");
    }
}
