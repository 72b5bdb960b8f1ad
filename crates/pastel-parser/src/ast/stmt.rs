//! Statement AST nodes for Pastel.
//!
//! Statements own their children. Code blocks are plain `Vec<Statement>`;
//! a [`StatementBatch`] is a block that does not introduce anything of its
//! own and is spliced into its parent by code generators (it is what a
//! pruned `if` or a lowered `for` turns into).

use pastel_core::{PType, Span};

use super::expr::Expression;
use super::ops::AssignOp;

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `Type name = value;`
    VariableDeclaration(VariableDeclaration),
    /// `target op value;`
    Assignment(Assignment),
    /// `if (cond) { } else { }`
    If(IfStatement),
    /// `for (init; cond; step) { }`
    For(ForLoop),
    /// `while (cond) { }`
    While(WhileLoop),
    /// `switch (cond) { case ...: }`
    Switch(SwitchStatement),
    /// `break;`
    Break(BreakStatement),
    /// `return value;`
    Return(ReturnStatement),
    /// An expression evaluated for its side effects.
    Expression(ExpressionStatement),
    /// A flat run of statements.
    Batch(StatementBatch),
}

impl Statement {
    /// Get the span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Self::VariableDeclaration(s) => s.span,
            Self::Assignment(s) => s.span,
            Self::If(s) => s.span,
            Self::For(s) => s.span,
            Self::While(s) => s.span,
            Self::Switch(s) => s.span,
            Self::Break(s) => s.span,
            Self::Return(s) => s.span,
            Self::Expression(s) => s.span,
            Self::Batch(s) => s.span,
        }
    }

    /// Build a batch statement, flattening nested batches.
    pub fn batch(statements: Vec<Statement>, span: Span) -> Self {
        Self::Batch(StatementBatch::new(statements, span))
    }

    /// Visit every expression directly or transitively owned by this statement.
    pub fn walk_expressions<'a>(&'a self, visit: &mut impl FnMut(&'a Expression)) {
        match self {
            Self::VariableDeclaration(s) => {
                if let Some(value) = &s.value {
                    value.walk(visit);
                }
            }
            Self::Assignment(s) => {
                s.target.walk(visit);
                s.value.walk(visit);
            }
            Self::If(s) => {
                s.condition.walk(visit);
                walk_block(&s.then_branch, visit);
                walk_block(&s.else_branch, visit);
            }
            Self::For(s) => {
                walk_block(&s.init, visit);
                if let Some(condition) = &s.condition {
                    condition.walk(visit);
                }
                walk_block(&s.step, visit);
                walk_block(&s.body, visit);
            }
            Self::While(s) => {
                s.condition.walk(visit);
                walk_block(&s.body, visit);
            }
            Self::Switch(s) => {
                s.condition.walk(visit);
                for chunk in &s.chunks {
                    for label in &chunk.labels {
                        if let CaseLabel::Case(value) = label {
                            value.walk(visit);
                        }
                    }
                    walk_block(&chunk.body, visit);
                }
            }
            Self::Break(_) => {}
            Self::Return(s) => {
                if let Some(value) = &s.value {
                    value.walk(visit);
                }
            }
            Self::Expression(s) => s.expression.walk(visit),
            Self::Batch(s) => walk_block(&s.statements, visit),
        }
    }
}

/// Visit every expression in a code block.
pub fn walk_block<'a>(block: &'a [Statement], visit: &mut impl FnMut(&'a Expression)) {
    for statement in block {
        statement.walk_expressions(visit);
    }
}

/// A local variable declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub ty: PType,
    pub name: String,
    pub name_span: Span,
    /// Absent for `Type name;`, which the resolver rejects.
    pub value: Option<Expression>,
    pub span: Span,
}

/// An assignment to a variable, field or index.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Expression,
    pub op: AssignOp,
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Vec<Statement>,
    pub else_branch: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub init: Vec<Statement>,
    /// `None` loops forever.
    pub condition: Option<Expression>,
    pub step: Vec<Statement>,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileLoop {
    pub condition: Expression,
    pub body: Vec<Statement>,
    pub span: Span,
}

/// A `switch` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStatement {
    pub condition: Expression,
    pub chunks: Vec<SwitchChunk>,
    pub span: Span,
}

/// Consecutive case labels sharing one body.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchChunk {
    pub labels: Vec<CaseLabel>,
    pub body: Vec<Statement>,
}

impl SwitchChunk {
    /// Whether the chunk ends in `default:`.
    pub fn has_default(&self) -> bool {
        matches!(self.labels.last(), Some(CaseLabel::Default(_)))
    }
}

/// One `case value:` or `default:` label.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseLabel {
    Case(Expression),
    Default(Span),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakStatement {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: Span,
}

/// A flat run of statements with no scope of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementBatch {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl StatementBatch {
    /// Create a batch. Nested batches are spliced in.
    pub fn new(statements: Vec<Statement>, span: Span) -> Self {
        let mut flat = Vec::with_capacity(statements.len());
        for statement in statements {
            match statement {
                Statement::Batch(inner) => flat.extend(inner.statements),
                other => flat.push(other),
            }
        }
        Self {
            statements: flat,
            span,
        }
    }
}
