//! Statement resolution.
//!
//! Blocks of `if`, `while` and `switch` get their own scope. The init and
//! step statements of a `for` live in the enclosing scope, so a variable
//! declared in the init is still visible after the loop.

use pastel_core::{CompilationError, PType};
use pastel_parser::ast::{
    Assignment, CaseLabel, ExpressionKind, ExpressionStatement, ForLoop, IfStatement,
    ReturnStatement, Statement, StatementBatch, SwitchChunk, SwitchStatement, VariableDeclaration,
    WhileLoop,
};

use super::{Result, TypeResolver, type_of};
use crate::scope::Owner;

impl<'t> TypeResolver<'t> {
    pub(super) fn block(&mut self, block: Vec<Statement>) -> Result<Vec<Statement>> {
        block.into_iter().map(|s| self.statement(s)).collect()
    }

    /// Resolve a block inside a nested scope.
    fn scoped_block(&mut self, block: Vec<Statement>) -> Result<Vec<Statement>> {
        self.scope.push_scope();
        let block = self.block(block);
        self.scope.pop_scope();
        block
    }

    fn statement(&mut self, statement: Statement) -> Result<Statement> {
        match statement {
            Statement::VariableDeclaration(decl) => self.variable_declaration(decl),
            Statement::Assignment(assign) => self.assignment(assign),
            Statement::If(stmt) => self.if_statement(stmt),
            Statement::For(stmt) => self.for_loop(stmt),
            Statement::While(stmt) => {
                let condition = self.expression(stmt.condition)?;
                if !type_of(&condition).is_bool() {
                    return Err(CompilationError::type_mismatch(
                        condition.span,
                        "While loop must have a boolean condition.",
                    ));
                }
                Ok(Statement::While(WhileLoop {
                    condition,
                    body: self.scoped_block(stmt.body)?,
                    span: stmt.span,
                }))
            }
            Statement::Switch(stmt) => self.switch(stmt),
            Statement::Break(stmt) => Ok(Statement::Break(stmt)),
            Statement::Return(stmt) => self.return_statement(stmt),
            Statement::Expression(stmt) => Ok(Statement::Expression(ExpressionStatement {
                expression: self.expression(stmt.expression)?,
                span: stmt.span,
            })),
            Statement::Batch(batch) => Ok(Statement::Batch(StatementBatch::new(
                self.block(batch.statements)?,
                batch.span,
            ))),
        }
    }

    fn variable_declaration(&mut self, decl: VariableDeclaration) -> Result<Statement> {
        let Some(value) = decl.value else {
            return Err(CompilationError::other(
                decl.span,
                "Cannot have variable declaration without a value.",
            ));
        };
        let value = self.expression(value)?;
        let ty = decl.ty.finalize(self.index, decl.name_span)?;
        let value_type = type_of(&value);
        if ty.is_double() && value_type.is_int() {
            return Err(CompilationError::type_mismatch(
                value.span,
                "Must explicitly convert integer to a double/float.",
            ));
        }
        if !PType::check_assignment(&ty, &value_type, self.index) {
            return Err(CompilationError::type_mismatch(
                value.span,
                format!("Cannot assign this type to a {ty}"),
            ));
        }
        self.scope.declare(&decl.name, ty.clone(), decl.name_span)?;
        Ok(Statement::VariableDeclaration(VariableDeclaration {
            ty,
            value: Some(value),
            ..decl
        }))
    }

    fn assignment(&mut self, assign: Assignment) -> Result<Statement> {
        let value = self.expression(assign.value)?;
        let target = self.expression(assign.target)?;

        if !matches!(
            target.kind,
            ExpressionKind::Variable(_)
                | ExpressionKind::DotField { .. }
                | ExpressionKind::BracketIndex { .. }
        ) {
            return Err(CompilationError::other(
                target.span,
                "Cannot assign to this type of expression.",
            ));
        }

        let target_type = type_of(&target);
        let value_type = type_of(&value);
        let widened =
            assign.op.is_incremental() && target_type.is_double() && value_type.is_int();
        if !widened && !PType::check_assignment(&target_type, &value_type, self.index) {
            return Err(CompilationError::type_mismatch(
                assign.span,
                format!("Cannot assign a {value_type} to a {target_type}"),
            ));
        }

        Ok(Statement::Assignment(Assignment {
            target,
            value,
            ..assign
        }))
    }

    fn if_statement(&mut self, stmt: IfStatement) -> Result<Statement> {
        let condition = self.expression(stmt.condition)?;
        if !type_of(&condition).is_bool() {
            return Err(CompilationError::type_mismatch(
                condition.span,
                "Only booleans can be used in if statements.",
            ));
        }

        if let Some(taken) = condition.as_bool_constant() {
            let branch = if taken {
                stmt.then_branch
            } else {
                stmt.else_branch
            };
            return Ok(Statement::batch(self.scoped_block(branch)?, stmt.span));
        }

        Ok(Statement::If(IfStatement {
            condition,
            then_branch: self.scoped_block(stmt.then_branch)?,
            else_branch: self.scoped_block(stmt.else_branch)?,
            span: stmt.span,
        }))
    }

    fn for_loop(&mut self, stmt: ForLoop) -> Result<Statement> {
        let init = self.block(stmt.init)?;
        let condition = match stmt.condition {
            Some(condition) => {
                let condition = self.expression(condition)?;
                if !type_of(&condition).is_bool() {
                    return Err(CompilationError::type_mismatch(
                        condition.span,
                        "For loop condition must be a boolean.",
                    ));
                }
                Some(condition)
            }
            None => None,
        };
        let body = self.scoped_block(stmt.body)?;
        let step = self.block(stmt.step)?;
        Ok(Statement::For(ForLoop {
            init,
            condition,
            step,
            body,
            span: stmt.span,
        }))
    }

    fn switch(&mut self, stmt: SwitchStatement) -> Result<Statement> {
        let condition = self.expression(stmt.condition)?;
        let condition_type = type_of(&condition);
        let case_error = if condition_type.is_int() {
            "Only ints may be used."
        } else if condition_type.is_char() {
            "Only chars may be used."
        } else {
            return Err(CompilationError::type_mismatch(
                condition.span,
                "Only ints and chars can be used in switch statements.",
            ));
        };

        self.scope.push_scope();
        let chunks = self.switch_chunks(stmt.chunks, &condition_type, case_error);
        self.scope.pop_scope();

        Ok(Statement::Switch(SwitchStatement {
            condition,
            chunks: chunks?,
            span: stmt.span,
        }))
    }

    fn switch_chunks(
        &mut self,
        chunks: Vec<SwitchChunk>,
        condition_type: &PType,
        case_error: &str,
    ) -> Result<Vec<SwitchChunk>> {
        let mut resolved = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let mut labels = Vec::with_capacity(chunk.labels.len());
            for label in chunk.labels {
                labels.push(match label {
                    CaseLabel::Case(value) => {
                        let value = self.expression(value)?;
                        if type_of(&value).root() != condition_type.root() {
                            return Err(CompilationError::type_mismatch(value.span, case_error));
                        }
                        CaseLabel::Case(value)
                    }
                    CaseLabel::Default(span) => CaseLabel::Default(span),
                });
            }
            resolved.push(SwitchChunk {
                labels,
                body: self.block(chunk.body)?,
            });
        }
        Ok(resolved)
    }

    fn return_statement(&mut self, stmt: ReturnStatement) -> Result<Statement> {
        let value = stmt.value.map(|v| self.expression(v)).transpose()?;

        match (&self.owner, &value) {
            (Owner::Constructor { .. }, Some(value)) => {
                return Err(CompilationError::other(
                    value.span,
                    "You cannot return a value from a constructor.",
                ));
            }
            (Owner::Function { return_type, .. }, Some(value)) => {
                if !PType::check_return_type(return_type, &type_of(value), self.index) {
                    return Err(CompilationError::type_mismatch(
                        value.span,
                        "This expression is not the expected return type of this function.",
                    ));
                }
            }
            (Owner::Function { return_type, .. }, None) if !return_type.is_void() => {
                return Err(CompilationError::type_mismatch(
                    stmt.span,
                    "Must return a value in this function.",
                ));
            }
            (Owner::Field { .. } | Owner::Module, _) => {
                return Err(CompilationError::other(stmt.span, "Cannot return from here."));
            }
            _ => {}
        }

        Ok(Statement::Return(ReturnStatement {
            value,
            span: stmt.span,
        }))
    }
}
