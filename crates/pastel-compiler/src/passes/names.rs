//! Name Resolution Pass - find live functions and rewrite bare names.
//!
//! This pass runs in three steps:
//!
//! 1. **Call graph.** Every function body is scanned for bare names that
//!    refer to a declared function. Any such mention counts as a use, so a
//!    function passed around as a value stays alive too.
//! 2. **Reachability.** A breadth-first walk from the roots produces the
//!    set of live functions. The roots are the configured entry points (or
//!    every function when none are configured) plus every function that a
//!    class member mentions.
//! 3. **Rewrite.** Live function bodies and all class members are rebuilt
//!    with names replaced by what they refer to: constants become literals,
//!    functions become references, `Enum.Member` becomes its value and
//!    `Core.X`, `Math.X` and `Extension.X` become builtin references.
//!    Operator chains become binary pairs and literal-condition `if`
//!    statements are pruned down to the branch that runs.
//!
//! Functions outside the live set are removed from the tables.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use pastel_core::{CompilationError, Span};
use pastel_parser::ast::{
    Assignment, CaseLabel, ExpressionStatement, ForLoop, IfStatement, Namespace, Parameter,
    ReturnStatement, Statement, StatementBatch, SwitchChunk, SwitchStatement, VariableDeclaration,
    WhileLoop,
};
use pastel_parser::ast::{Expression, ExpressionKind};
use tracing::{debug, instrument, trace};

use crate::operators::{chain_to_pairs, fold_unary};
use crate::signatures::namespace_function;
use crate::tables::ProgramTables;

type Result<T> = std::result::Result<T, CompilationError>;

/// Output of the name resolution pass.
#[derive(Debug, Default)]
pub struct NameOutput {
    /// Functions kept.
    pub reachable: BTreeSet<String>,
    /// Number of functions removed.
    pub culled: usize,
}

/// Name Resolution Pass - reachability and name rewriting.
pub struct NameResolutionPass<'a> {
    tables: &'a mut ProgramTables,
    entry_points: &'a [String],
}

impl<'a> NameResolutionPass<'a> {
    pub fn new(tables: &'a mut ProgramTables, entry_points: &'a [String]) -> Self {
        Self {
            tables,
            entry_points,
        }
    }

    #[instrument(skip_all, name = "name_resolution")]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self) -> Result<NameOutput> {
        self.check_declarations()?;
        let graph = self.call_graph();
        let reachable = self.reachable(&graph)?;

        let before = self.tables.functions.len();
        self.tables.functions.retain(|name, _| reachable.contains(name));
        let culled = before - self.tables.functions.len();

        let names: Vec<String> = self.tables.functions.keys().cloned().collect();
        for name in &names {
            let Some(body) = self.tables.functions.get_mut(name).map(|f| std::mem::take(&mut f.body)) else {
                continue;
            };
            let body = NameRewriter::new(self.tables).block(body)?;
            if let Some(function) = self.tables.functions.get_mut(name) {
                function.body = body;
            }
            trace!(function = %name, "names resolved");
        }

        let classes: Vec<String> = self.tables.classes.keys().cloned().collect();
        for name in &classes {
            self.rewrite_class(name)?;
        }

        debug!(reachable = reachable.len(), culled, "names resolved");
        Ok(NameOutput { reachable, culled })
    }

    // =========================================
    // Local declarations
    // =========================================

    /// Reject parameters and locals named after a program-level entity.
    ///
    /// Runs over every function before culling and before bare names are
    /// rewritten.
    fn check_declarations(&self) -> Result<()> {
        for function in self.tables.functions.values() {
            self.check_params(&function.params)?;
            self.check_locals(&function.body)?;
        }
        for class in self.tables.classes.values() {
            self.check_params(&class.constructor.params)?;
            self.check_locals(&class.constructor.body)?;
            for method in &class.methods {
                self.check_params(&method.params)?;
                self.check_locals(&method.body)?;
            }
        }
        Ok(())
    }

    fn check_params(&self, params: &[Parameter]) -> Result<()> {
        params
            .iter()
            .try_for_each(|param| self.check_local_name(&param.name, param.span))
    }

    fn check_locals(&self, block: &[Statement]) -> Result<()> {
        for statement in block {
            match statement {
                Statement::VariableDeclaration(decl) => {
                    self.check_local_name(&decl.name, decl.name_span)?;
                }
                Statement::If(stmt) => {
                    self.check_locals(&stmt.then_branch)?;
                    self.check_locals(&stmt.else_branch)?;
                }
                Statement::For(stmt) => {
                    self.check_locals(&stmt.init)?;
                    self.check_locals(&stmt.step)?;
                    self.check_locals(&stmt.body)?;
                }
                Statement::While(stmt) => self.check_locals(&stmt.body)?,
                Statement::Switch(stmt) => {
                    for chunk in &stmt.chunks {
                        self.check_locals(&chunk.body)?;
                    }
                }
                Statement::Batch(batch) => self.check_locals(&batch.statements)?,
                Statement::Assignment(_)
                | Statement::Break(_)
                | Statement::Return(_)
                | Statement::Expression(_) => {}
            }
        }
        Ok(())
    }

    fn check_local_name(&self, name: &str, span: Span) -> Result<()> {
        if self.tables.kind_of(name).is_none() {
            return Ok(());
        }
        Err(CompilationError::DuplicateDefinition {
            name: name.to_string(),
            message: format!("This declaration of '{name}' conflicts with a previous declaration."),
            span,
        })
    }

    // =========================================
    // Reachability
    // =========================================

    /// Map each function to the declared functions its body mentions.
    fn call_graph(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.tables
            .functions
            .iter()
            .map(|(name, function)| {
                let mut callees = BTreeSet::new();
                function.walk_expressions(&mut |e| self.collect_function(e, &mut callees));
                (name.clone(), callees)
            })
            .collect()
    }

    fn collect_function(&self, expression: &Expression, into: &mut BTreeSet<String>) {
        if let ExpressionKind::Variable(name) = &expression.kind {
            if self.tables.functions.contains_key(name) {
                into.insert(name.clone());
            }
        }
    }

    fn reachable(&self, graph: &BTreeMap<String, BTreeSet<String>>) -> Result<BTreeSet<String>> {
        let mut queue: VecDeque<String> = VecDeque::new();
        if self.entry_points.is_empty() {
            queue.extend(self.tables.functions.keys().cloned());
        } else {
            for entry in self.entry_points {
                if !self.tables.functions.contains_key(entry) {
                    return Err(CompilationError::UnknownName {
                        name: entry.clone(),
                        message: format!("The entry point function '{entry}' is not defined."),
                        span: Span::default(),
                    });
                }
                queue.push_back(entry.clone());
            }
        }

        let mut from_classes = BTreeSet::new();
        for class in self.tables.classes.values() {
            class.walk_expressions(&mut |e| self.collect_function(e, &mut from_classes));
        }
        queue.extend(from_classes);

        let mut seen = BTreeSet::new();
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(callees) = graph.get(&name) {
                queue.extend(callees.iter().filter(|c| !seen.contains(*c)).cloned());
            }
        }
        Ok(seen)
    }

    // =========================================
    // Class members
    // =========================================

    fn rewrite_class(&mut self, name: &str) -> Result<()> {
        let Some(class) = self.tables.classes.get_mut(name) else {
            return Ok(());
        };
        let constructor = std::mem::take(&mut class.constructor.body);
        let fields: Vec<Expression> = class
            .fields
            .iter_mut()
            .map(|f| std::mem::replace(&mut f.value, Expression::new(ExpressionKind::This, f.span)))
            .collect();
        let methods: Vec<_> = class
            .methods
            .iter_mut()
            .map(|m| std::mem::take(&mut m.body))
            .collect();

        let rewriter = NameRewriter::new(self.tables);
        let constructor = rewriter.block(constructor)?;
        let fields = fields
            .into_iter()
            .map(|value| rewriter.expression(value))
            .collect::<Result<Vec<_>>>()?;
        let methods = methods
            .into_iter()
            .map(|body| rewriter.block(body))
            .collect::<Result<Vec<_>>>()?;

        if let Some(class) = self.tables.classes.get_mut(name) {
            class.constructor.body = constructor;
            for (field, value) in class.fields.iter_mut().zip(fields) {
                field.value = value;
            }
            for (method, body) in class.methods.iter_mut().zip(methods) {
                method.body = body;
            }
        }
        trace!(class = %name, "names resolved");
        Ok(())
    }
}

// ============================================================================
// Rewriter
// ============================================================================

/// Rebuilds code with every bare name replaced by what it refers to.
struct NameRewriter<'t> {
    tables: &'t ProgramTables,
}

impl<'t> NameRewriter<'t> {
    fn new(tables: &'t ProgramTables) -> Self {
        Self { tables }
    }

    fn block(&self, block: Vec<Statement>) -> Result<Vec<Statement>> {
        block.into_iter().map(|s| self.statement(s)).collect()
    }

    fn statement(&self, statement: Statement) -> Result<Statement> {
        Ok(match statement {
            Statement::VariableDeclaration(decl) => {
                let Some(value) = decl.value else {
                    return Err(CompilationError::other(
                        decl.span,
                        "Cannot have variable declaration without a value.",
                    ));
                };
                Statement::VariableDeclaration(VariableDeclaration {
                    value: Some(self.expression(value)?),
                    ..decl
                })
            }
            Statement::Assignment(assign) => Statement::Assignment(Assignment {
                target: self.expression(assign.target)?,
                value: self.expression(assign.value)?,
                ..assign
            }),
            Statement::If(stmt) => {
                let condition = self.expression(stmt.condition)?;
                if let Some(taken) = condition.as_bool_constant() {
                    let branch = if taken { stmt.then_branch } else { stmt.else_branch };
                    return Ok(Statement::batch(self.block(branch)?, stmt.span));
                }
                Statement::If(IfStatement {
                    condition,
                    then_branch: self.block(stmt.then_branch)?,
                    else_branch: self.block(stmt.else_branch)?,
                    span: stmt.span,
                })
            }
            Statement::For(stmt) => Statement::For(ForLoop {
                init: self.block(stmt.init)?,
                condition: stmt.condition.map(|c| self.expression(c)).transpose()?,
                step: self.block(stmt.step)?,
                body: self.block(stmt.body)?,
                span: stmt.span,
            }),
            Statement::While(stmt) => Statement::While(WhileLoop {
                condition: self.expression(stmt.condition)?,
                body: self.block(stmt.body)?,
                span: stmt.span,
            }),
            Statement::Switch(stmt) => {
                let condition = self.expression(stmt.condition)?;
                let chunks = stmt
                    .chunks
                    .into_iter()
                    .map(|chunk| {
                        let labels = chunk
                            .labels
                            .into_iter()
                            .map(|label| match label {
                                CaseLabel::Case(value) => self.expression(value).map(CaseLabel::Case),
                                CaseLabel::Default(span) => Ok(CaseLabel::Default(span)),
                            })
                            .collect::<Result<Vec<_>>>()?;
                        Ok(SwitchChunk {
                            labels,
                            body: self.block(chunk.body)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Statement::Switch(SwitchStatement {
                    condition,
                    chunks,
                    span: stmt.span,
                })
            }
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

    fn expression(&self, expression: Expression) -> Result<Expression> {
        let span = expression.span;
        let kind = match expression.kind {
            ExpressionKind::Variable(name) => return Ok(self.variable(name, span)),

            ExpressionKind::UnaryOp { op, operand } => {
                let operand = self.expression(*operand)?;
                if let Some(value) = operand.as_constant() {
                    return match fold_unary(op, value) {
                        Some(folded) => Ok(Expression::constant(folded, span)),
                        None => Err(CompilationError::type_mismatch(
                            span,
                            format!("The op '{op}' is not valid on this type of expression."),
                        )),
                    };
                }
                ExpressionKind::UnaryOp {
                    op,
                    operand: Box::new(operand),
                }
            }

            ExpressionKind::OpChain { operands, ops } => {
                let operands = operands
                    .into_iter()
                    .map(|e| self.expression(e))
                    .collect::<Result<Vec<_>>>()?;
                return chain_to_pairs(operands, ops)
                    .ok_or_else(|| CompilationError::other(span, "Malformed operator chain."));
            }

            ExpressionKind::BracketIndex { root, index } => ExpressionKind::BracketIndex {
                root: Box::new(self.expression(*root)?),
                index: Box::new(self.expression(*index)?),
            },

            ExpressionKind::DotField {
                root,
                field,
                field_span,
            } => return self.dot_field(*root, field, field_span, span),

            ExpressionKind::FunctionInvocation { root, args } => {
                if matches!(root.kind, ExpressionKind::CompileTimeFunctionReference(_)) {
                    return Err(compile_time_in_expression(span));
                }
                ExpressionKind::FunctionInvocation {
                    root: Box::new(self.expression(*root)?),
                    args: args
                        .into_iter()
                        .map(|e| self.expression(e))
                        .collect::<Result<Vec<_>>>()?,
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
                operand: Box::new(self.expression(*operand)?),
                prefix,
            },

            ExpressionKind::CompileTimeFunctionReference(_) => {
                return Err(compile_time_in_expression(span));
            }

            other => other,
        };
        Ok(Expression {
            kind,
            span,
            resolved_type: expression.resolved_type,
        })
    }

    /// What a bare name refers to. Unknown names stay variables.
    fn variable(&self, name: String, span: Span) -> Expression {
        if let Some(def) = self.tables.constants.get(&name) {
            if let Some(value) = def.value.as_constant() {
                return Expression::constant(value.clone(), span).with_type(def.ty.clone());
            }
        }
        if let Some(namespace) = Namespace::from_name(&name) {
            return Expression::new(ExpressionKind::NamespaceReference(namespace), span);
        }
        if self.tables.functions.contains_key(&name) {
            return Expression::new(ExpressionKind::FunctionReference(name), span);
        }
        if self.tables.enums.contains_key(&name) {
            return Expression::new(ExpressionKind::EnumReference(name), span);
        }
        Expression::new(ExpressionKind::Variable(name), span)
    }

    fn dot_field(
        &self,
        root: Expression,
        field: String,
        field_span: Span,
        span: Span,
    ) -> Result<Expression> {
        let root = self.expression(root)?;
        match &root.kind {
            ExpressionKind::NamespaceReference(Namespace::Extension) => Ok(Expression::new(
                ExpressionKind::ExtensibleFunctionReference(field),
                span,
            )),
            ExpressionKind::NamespaceReference(namespace) => {
                let Some(function) = namespace_function(*namespace, &field) else {
                    return Err(CompilationError::UnknownName {
                        message: format!(
                            "Invalid {0} function: '{0}.{field}'.",
                            namespace.as_str()
                        ),
                        name: format!("{}.{field}", namespace.as_str()),
                        span: field_span,
                    });
                };
                Ok(Expression::new(
                    ExpressionKind::CoreFunctionReference {
                        function,
                        context: None,
                    },
                    span,
                ))
            }
            ExpressionKind::EnumReference(name) => {
                let value = self
                    .tables
                    .enums
                    .get(name)
                    .and_then(|e| e.value_of(&field))
                    .ok_or_else(|| CompilationError::UnknownField {
                        message: format!(
                            "The enum value '{field}' does not exist in the definition of '{name}'."
                        ),
                        field: field.clone(),
                        span: field_span,
                    })?;
                Ok(Expression::constant(pastel_core::Constant::Int(value), span))
            }
            _ => Ok(Expression::new(
                ExpressionKind::DotField {
                    root: Box::new(root),
                    field,
                    field_span,
                },
                span,
            )),
        }
    }
}

fn compile_time_in_expression(span: Span) -> CompilationError {
    CompilationError::other(
        span,
        "Compile-time functions can only be used as standalone statements and cannot be used in expressions.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ProgramIndex;
    use crate::passes::constants::ConstantPass;
    use pastel_core::{Constant, CoreFunction};
    use pastel_parser::ast::{BinaryOp, walk_block};
    use pastel_parser::{ParseContext, Parser};

    /// Whether a block mentions a name as a bare variable.
    fn mentions(block: &[Statement], name: &str) -> bool {
        let mut found = false;
        walk_block(block, &mut |e| {
            if matches!(&e.kind, ExpressionKind::Variable(n) if n == name) {
                found = true;
            }
        });
        found
    }

    fn run_with(source: &str, entry_points: &[&str]) -> Result<(ProgramTables, NameOutput)> {
        let mut context = ParseContext::new();
        let entities = Parser::parse_source(&mut context, "main.pst", source).unwrap();
        let mut tables = ProgramTables::from_entities(entities).unwrap();
        let index = ProgramIndex::build(&tables);
        ConstantPass::new(&mut tables, &index).run()?;
        let entry_points: Vec<String> = entry_points.iter().map(|s| s.to_string()).collect();
        let output = NameResolutionPass::new(&mut tables, &entry_points).run()?;
        Ok((tables, output))
    }

    fn run(source: &str) -> Result<ProgramTables> {
        run_with(source, &[]).map(|(tables, _)| tables)
    }

    /// The value of the first `return` in a function.
    fn returned(tables: &ProgramTables, function: &str) -> Expression {
        tables.functions[function]
            .body
            .iter()
            .find_map(|s| match s {
                Statement::Return(r) => r.value.clone(),
                _ => None,
            })
            .unwrap()
    }

    // =========================================
    // Reachability
    // =========================================

    #[test]
    fn unreachable_functions_are_culled() {
        let (tables, output) = run_with(
            "void A() { B(); }\nvoid B() { }\nvoid C() { }",
            &["A"],
        )
        .unwrap();
        let names: Vec<_> = tables.functions.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(output.culled, 1);
        assert!(output.reachable.contains("B"));
    }

    #[test]
    fn without_entry_points_every_function_is_live() {
        let (tables, output) = run_with("void A() { }\nvoid B() { }", &[]).unwrap();
        assert_eq!(tables.functions.len(), 2);
        assert_eq!(output.culled, 0);
    }

    #[test]
    fn functions_used_as_values_stay_alive() {
        let (tables, _) = run_with(
            "void main() { Func<int> f = seven; }\nint seven() { return 7; }",
            &["main"],
        )
        .unwrap();
        assert!(tables.functions.contains_key("seven"));
    }

    #[test]
    fn class_members_keep_their_callees_alive() {
        let (tables, _) = run_with(
            "class Timer { void tick() { helper(); } }\nvoid helper() { }\nvoid main() { }",
            &["main"],
        )
        .unwrap();
        assert!(tables.functions.contains_key("helper"));
    }

    #[test]
    fn unknown_entry_point() {
        let err = run_with("void main() { }", &["start"]).unwrap_err();
        assert!(matches!(err, CompilationError::UnknownName { ref name, .. } if name == "start"));
    }

    // =========================================
    // Rewrites
    // =========================================

    #[test]
    fn names_are_replaced_by_their_targets() {
        let tables = run(
            "const int LIMIT = 10;\n\
             enum Color { RED, GREEN }\n\
             int f() { return LIMIT; }\n\
             int g() { return Color.GREEN; }\n\
             Func<int> h() { return f; }",
        )
        .unwrap();
        assert_eq!(returned(&tables, "f").as_constant(), Some(&Constant::Int(10)));
        assert_eq!(returned(&tables, "g").as_constant(), Some(&Constant::Int(1)));
        assert!(matches!(returned(&tables, "h").kind, ExpressionKind::FunctionReference(ref n) if n == "f"));
        assert!(!mentions(&tables.functions["f"].body, "LIMIT"));
    }

    #[test]
    fn chains_become_pairs() {
        let tables = run("int f(int a, int b, int c) { return a - b - c; }").unwrap();
        match returned(&tables, "f").kind {
            ExpressionKind::OpPair { left, op, .. } => {
                assert_eq!(op, BinaryOp::Sub);
                assert!(matches!(left.kind, ExpressionKind::OpPair { .. }));
            }
            other => panic!("Expected OpPair, got {other:?}"),
        }
    }

    #[test]
    fn builtin_namespaces() {
        let tables = run(
            "void f() { Core.PrintStdOut(\"hi\"); }\n\
             double g(double x) { return Math.floor(x); }",
        )
        .unwrap();
        let Statement::Expression(stmt) = &tables.functions["f"].body[0] else {
            panic!("Expected expression statement");
        };
        let ExpressionKind::FunctionInvocation { root, .. } = &stmt.expression.kind else {
            panic!("Expected invocation");
        };
        assert!(matches!(
            root.kind,
            ExpressionKind::CoreFunctionReference { function: CoreFunction::PrintStdout, .. }
        ));
        let ExpressionKind::FunctionInvocation { root, .. } = returned(&tables, "g").kind else {
            panic!("Expected invocation");
        };
        assert!(matches!(
            root.kind,
            ExpressionKind::CoreFunctionReference { function: CoreFunction::MathFloor, .. }
        ));
    }

    #[test]
    fn invalid_core_function() {
        let err = run("void f() { Core.Nope(); }").unwrap_err();
        assert_eq!(err.message(), "Invalid Core function: 'Core.Nope'.");
    }

    #[test]
    fn extension_references() {
        let tables = run("void f() { Extension.beep(1); }").unwrap();
        let Statement::Expression(stmt) = &tables.functions["f"].body[0] else {
            panic!("Expected expression statement");
        };
        let ExpressionKind::FunctionInvocation { root, .. } = &stmt.expression.kind else {
            panic!("Expected invocation");
        };
        assert!(matches!(root.kind, ExpressionKind::ExtensibleFunctionReference(ref n) if n == "beep"));
    }

    #[test]
    fn literal_if_is_pruned() {
        let tables = run("int f() { if (!true) { return 1; } else { return 2; } }").unwrap();
        let Statement::Batch(batch) = &tables.functions["f"].body[0] else {
            panic!("Expected batch");
        };
        let [Statement::Return(taken)] = batch.statements.as_slice() else {
            panic!("Expected a single return");
        };
        assert_eq!(
            taken.value.as_ref().and_then(Expression::as_constant),
            Some(&Constant::Int(2))
        );
    }

    #[test]
    fn negative_literals_fold() {
        let tables = run("int f() { return -(5); }").unwrap();
        assert_eq!(returned(&tables, "f").as_constant(), Some(&Constant::Int(-5)));
    }

    #[test]
    fn unknown_enum_member() {
        let err = run("enum E { A }\nint f() { return E.B; }").unwrap_err();
        assert_eq!(
            err.message(),
            "The enum value 'B' does not exist in the definition of 'E'."
        );
    }

    #[test]
    fn declaration_without_value() {
        let err = run("void f() { int x; }").unwrap_err();
        assert_eq!(err.message(), "Cannot have variable declaration without a value.");
    }

    // =========================================
    // Local declarations
    // =========================================

    fn conflict(source: &str) -> CompilationError {
        run(source).unwrap_err()
    }

    #[test]
    fn locals_cannot_reuse_program_names() {
        for source in [
            "const int K = 3;\nint f() { int K = 1; return K; }",
            "struct S { int a; }\nint f() { int S = 1; return S; }",
            "int g() { return 0; }\nint f() { int g = 1; return g; }",
            "enum E { A }\nvoid f() { if (true) { int E = 1; } }",
        ] {
            let err = conflict(source);
            assert!(
                matches!(err, CompilationError::DuplicateDefinition { .. }),
                "{source}: {err:?}"
            );
        }
    }

    #[test]
    fn parameters_cannot_reuse_program_names() {
        let err = conflict("const int K = 3;\nint f(int K) { return K; }");
        assert_eq!(
            err.message(),
            "This declaration of 'K' conflicts with a previous declaration."
        );
        let err = conflict("class Dog { }\nclass Cat { void chase(int Dog) { } }");
        assert!(matches!(err, CompilationError::DuplicateDefinition { ref name, .. } if name == "Dog"));
    }

    #[test]
    fn culled_functions_still_conflict() {
        let err = run_with("void main() { int helper = 1; }\nvoid helper() { }", &["main"])
            .unwrap_err();
        assert!(matches!(err, CompilationError::DuplicateDefinition { .. }));
    }
}
