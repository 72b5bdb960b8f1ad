//! Statement parsing functions for Pastel.
//!
//! Implements code blocks, control flow, declarations, assignments and the
//! statement-level `@import`, which splices the statements of another file
//! in place.
//!
//! For-loop init and step clauses use a restricted form (see
//! [`Parser::parse_simple_statement`]): no control flow, and the statement
//! ends at `;`, `,` or `)` without consuming it.

use pastel_core::{FileId, ParseError, ParseErrorKind, PastelError, Span};

use super::expr_parser::single_string_arg;
use super::parser::Parser;
use crate::ast::expr::{Expression, ExpressionKind};
use crate::ast::ops::AssignOp;
use crate::ast::stmt::*;

impl<'ctx> Parser<'ctx> {
    /// Parse a code block.
    ///
    /// With `braces_required` the block must be wrapped in `{ }`; otherwise
    /// braces are optional and a single statement forms the block. Batches
    /// produced by imports and folded `if`s are flattened into the block.
    pub fn parse_code_block(&mut self, braces_required: bool) -> Result<Vec<Statement>, PastelError> {
        let mut block = Vec::new();

        if braces_required || self.tokens.is_next("{") {
            self.tokens.pop_expected("{")?;
            while !self.tokens.pop_if_present("}") {
                let statement = self.parse_code_line()?;
                push_flattened(&mut block, statement);
            }
        } else {
            let statement = self.parse_code_line()?;
            push_flattened(&mut block, statement);
        }

        Ok(block)
    }

    /// Parse one statement inside a code block.
    pub fn parse_code_line(&mut self) -> Result<Statement, PastelError> {
        match self.parse_executable(false)? {
            Statement::Expression(statement) if is_import_call(&statement.expression) => {
                self.splice_statement_import(statement)
            }
            statement => Ok(statement),
        }
    }

    /// Parse a for-loop init or step clause.
    pub fn parse_simple_statement(&mut self) -> Result<Statement, PastelError> {
        self.parse_executable(true)
    }

    fn parse_executable(&mut self, simple_only: bool) -> Result<Statement, PastelError> {
        if !simple_only {
            match self.tokens.peek_text() {
                "if" => return self.parse_if(),
                "for" => return self.parse_for(),
                "while" => return self.parse_while(),
                "switch" => return self.parse_switch(),
                "break" => return Ok(self.parse_break()?),
                "return" => return Ok(self.parse_return()?),
                _ => {}
            }
        }

        if let Some(declaration) = self.try_parse_declaration(simple_only)? {
            return Ok(Statement::VariableDeclaration(declaration));
        }

        let span = self.here();
        let expression = self.parse_expression()?;

        if simple_only && matches!(self.tokens.peek_text(), ";" | "," | ")") {
            return Ok(Statement::Expression(ExpressionStatement { expression, span }));
        }

        if self.tokens.pop_if_present(";") {
            return Ok(Statement::Expression(ExpressionStatement { expression, span }));
        }

        if let Some(op) = AssignOp::from_text(self.tokens.peek_text()) {
            self.tokens.advance();
            let value = self.parse_expression()?;
            if !simple_only {
                self.tokens.pop_expected(";")?;
            }
            return Ok(Statement::Assignment(Assignment {
                target: expression,
                op,
                value,
                span,
            }));
        }

        let found = self.tokens.pop()?;
        Err(ParseError::expected_token(found.span, ";", &found.text).into())
    }

    /// Parse a statement that must be a variable declaration, as after `const`.
    pub(crate) fn parse_declaration_statement(&mut self) -> Result<VariableDeclaration, PastelError> {
        let span = self.here();
        match self.parse_executable(false)? {
            Statement::VariableDeclaration(declaration) => Ok(declaration),
            _ => Err(ParseError::new(
                ParseErrorKind::InvalidDeclaration,
                span,
                "Expected an assignment here.",
            )
            .into()),
        }
    }

    /// `Type name = value;` or `Type name;`, by speculation.
    ///
    /// The declaration is only accepted when the name is followed by `=` or
    /// `;`; everything else rewinds and is parsed as an expression.
    fn try_parse_declaration(
        &mut self,
        simple_only: bool,
    ) -> Result<Option<VariableDeclaration>, ParseError> {
        let start = self.tokens.snapshot();
        let span = self.here();

        let Some(ty) = self.try_parse_type()? else {
            return Ok(None);
        };
        let is_declaration = self.next_is_name()
            && self
                .tokens
                .peek_ahead(1)
                .is_some_and(|t| t.is("=") || t.is(";"));
        if !is_declaration {
            self.tokens.restore(start);
            return Ok(None);
        }

        let name = self.tokens.pop()?;
        let value = if self.tokens.pop_if_present("=") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        if !simple_only {
            self.tokens.pop_expected(";")?;
        }

        Ok(Some(VariableDeclaration {
            ty,
            name: name.text,
            name_span: name.span,
            value,
            span,
        }))
    }

    // =========================================
    // Control flow
    // =========================================

    /// `if (cond) body [else body]`. A literal `true`/`false` condition is
    /// folded into a batch of the taken branch.
    pub fn parse_if(&mut self) -> Result<Statement, PastelError> {
        let span = self.tokens.pop_expected("if")?.span;
        self.tokens.pop_expected("(")?;
        let condition = self.parse_expression()?;
        self.tokens.pop_expected(")")?;
        let then_branch = self.parse_code_block(false)?;
        let else_branch = if self.tokens.pop_if_present("else") {
            self.parse_code_block(false)?
        } else {
            Vec::new()
        };

        if let Some(value) = condition.as_bool_constant() {
            let taken = if value { then_branch } else { else_branch };
            return Ok(Statement::batch(taken, span));
        }

        Ok(Statement::If(IfStatement {
            condition,
            then_branch,
            else_branch,
            span,
        }))
    }

    /// `for (init, ...; cond; step, ...) body`
    pub fn parse_for(&mut self) -> Result<Statement, PastelError> {
        let span = self.tokens.pop_expected("for")?.span;
        self.tokens.pop_expected("(")?;

        let mut init = Vec::new();
        if !self.tokens.pop_if_present(";") {
            loop {
                init.push(self.parse_simple_statement()?);
                if !self.tokens.pop_if_present(",") {
                    break;
                }
            }
            self.tokens.pop_expected(";")?;
        }

        let condition = if self.tokens.is_next(";") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.tokens.pop_expected(";")?;

        let mut step = Vec::new();
        while !self.tokens.pop_if_present(")") {
            if !step.is_empty() {
                self.tokens.pop_expected(",")?;
            }
            step.push(self.parse_simple_statement()?);
        }

        let body = self.parse_code_block(false)?;

        Ok(Statement::For(ForLoop {
            init,
            condition,
            step,
            body,
            span,
        }))
    }

    /// `while (cond) body`
    pub fn parse_while(&mut self) -> Result<Statement, PastelError> {
        let span = self.tokens.pop_expected("while")?.span;
        self.tokens.pop_expected("(")?;
        let condition = self.parse_expression()?;
        self.tokens.pop_expected(")")?;
        let body = self.parse_code_block(false)?;

        Ok(Statement::While(WhileLoop {
            condition,
            body,
            span,
        }))
    }

    /// `switch (cond) { case a: case b: ... default: ... }`
    pub fn parse_switch(&mut self) -> Result<Statement, PastelError> {
        let span = self.tokens.pop_expected("switch")?.span;
        self.tokens.pop_expected("(")?;
        let condition = self.parse_expression()?;
        self.tokens.pop_expected(")")?;
        self.tokens.pop_expected("{")?;

        let mut chunks = Vec::new();
        while !self.tokens.pop_if_present("}") {
            chunks.push(self.parse_switch_chunk()?);
        }

        Ok(Statement::Switch(SwitchStatement {
            condition,
            chunks,
            span,
        }))
    }

    fn parse_switch_chunk(&mut self) -> Result<SwitchChunk, PastelError> {
        let mut labels = Vec::new();
        loop {
            if self.tokens.is_next("default") {
                let span = self.tokens.pop()?.span;
                self.tokens.pop_expected(":")?;
                labels.push(CaseLabel::Default(span));
            } else if self.tokens.is_next("case") || labels.is_empty() {
                self.tokens.pop_expected("case")?;
                let value = self.parse_expression()?;
                self.tokens.pop_expected(":")?;
                labels.push(CaseLabel::Case(value));
            } else {
                break;
            }
        }

        let misplaced_default = labels
            .iter()
            .rev()
            .skip(1)
            .find_map(|label| match label {
                CaseLabel::Default(span) => Some(*span),
                CaseLabel::Case(_) => None,
            });
        if let Some(span) = misplaced_default {
            return Err(ParseError::new(
                ParseErrorKind::InvalidStatement,
                span,
                "default cannot appear before other cases.",
            )
            .into());
        }

        let mut body = Vec::new();
        while !matches!(self.tokens.peek_text(), "}" | "case" | "default") {
            let statement = self.parse_code_line()?;
            push_flattened(&mut body, statement);
        }

        Ok(SwitchChunk { labels, body })
    }

    fn parse_break(&mut self) -> Result<Statement, ParseError> {
        let span = self.tokens.pop_expected("break")?.span;
        self.tokens.pop_expected(";")?;
        Ok(Statement::Break(BreakStatement { span }))
    }

    fn parse_return(&mut self) -> Result<Statement, ParseError> {
        let span = self.tokens.pop_expected("return")?.span;
        let value = if self.tokens.pop_if_present(";") {
            None
        } else {
            let value = self.parse_expression()?;
            self.tokens.pop_expected(";")?;
            Some(value)
        };
        Ok(Statement::Return(ReturnStatement { value, span }))
    }

    // =========================================
    // Imports
    // =========================================

    fn splice_statement_import(
        &mut self,
        statement: ExpressionStatement,
    ) -> Result<Statement, PastelError> {
        let span = statement.span;
        let ExpressionKind::FunctionInvocation { args, .. } = &statement.expression.kind else {
            return Ok(Statement::Expression(statement));
        };
        let path = import_path(args, span)?;

        let file = self.context.begin_import(&path, span)?;
        let parsed = self.parse_imported_statements(file);
        self.context.end_import();

        Ok(Statement::batch(parsed?, span))
    }

    fn parse_imported_statements(&mut self, file: FileId) -> Result<Vec<Statement>, PastelError> {
        let mut nested = self.nested(file)?;
        let mut statements = Vec::new();
        while !nested.is_done() {
            let statement = nested.parse_code_line()?;
            push_flattened(&mut statements, statement);
        }
        Ok(statements)
    }
}

/// Whether an expression is `@import(...)`.
pub(crate) fn is_import_call(expression: &Expression) -> bool {
    match &expression.kind {
        ExpressionKind::FunctionInvocation { root, .. } => matches!(
            &root.kind,
            ExpressionKind::CompileTimeFunctionReference(name) if name == "import"
        ),
        _ => false,
    }
}

/// The single string-literal argument of an import call.
pub(crate) fn import_path(args: &[Expression], span: Span) -> Result<String, ParseError> {
    single_string_arg(args).ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::InvalidExpression,
            span,
            "@import requires a single string constant.",
        )
    })
}

fn push_flattened(block: &mut Vec<Statement>, statement: Statement) {
    match statement {
        Statement::Batch(batch) => block.extend(batch.statements),
        other => block.push(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{MemoryLoader, ParseContext};
    use crate::lexer::{TokenCursor, tokenize};
    use pastel_core::Constant;

    fn parse_block_with(context: &mut ParseContext, source: &str) -> Result<Vec<Statement>, PastelError> {
        let tokens = TokenCursor::new(tokenize(source, FileId(0))?);
        let mut parser = Parser::new(tokens, context);
        let block = parser.parse_code_block(true)?;
        assert!(parser.is_done(), "unparsed tokens after {source:?}");
        Ok(block)
    }

    fn parse_block(source: &str) -> Vec<Statement> {
        parse_block_with(&mut ParseContext::new(), source).unwrap()
    }

    fn parse_one(source: &str) -> Statement {
        let mut block = parse_block(&format!("{{ {source} }}"));
        assert_eq!(block.len(), 1, "expected one statement in {source:?}");
        block.remove(0)
    }

    fn error(source: &str) -> String {
        parse_block_with(&mut ParseContext::new(), &format!("{{ {source} }}"))
            .unwrap_err()
            .message()
    }

    // ========================================================================
    // Declarations and assignments
    // ========================================================================

    #[test]
    fn parse_var_decl() {
        match parse_one("int x = 5;") {
            Statement::VariableDeclaration(decl) => {
                assert_eq!(decl.ty.to_string(), "int");
                assert_eq!(decl.name, "x");
                assert_eq!(decl.value.unwrap().as_constant(), Some(&Constant::Int(5)));
            }
            _ => panic!("Expected variable declaration"),
        }
    }

    #[test]
    fn parse_var_decl_no_init() {
        match parse_one("List<string> names;") {
            Statement::VariableDeclaration(decl) => {
                assert_eq!(decl.ty.to_string(), "List<string>");
                assert!(decl.value.is_none());
            }
            _ => panic!("Expected variable declaration"),
        }
    }

    #[test]
    fn parse_assignment() {
        match parse_one("point.x += 2;") {
            Statement::Assignment(assignment) => {
                assert_eq!(assignment.op, AssignOp::Add);
                assert!(matches!(assignment.target.kind, ExpressionKind::DotField { .. }));
            }
            _ => panic!("Expected assignment"),
        }
    }

    #[test]
    fn parse_expr_stmt() {
        match parse_one("Core.print(\"hi\");") {
            Statement::Expression(statement) => {
                assert!(matches!(statement.expression.kind, ExpressionKind::FunctionInvocation { .. }));
            }
            _ => panic!("Expected expression statement"),
        }
    }

    #[test]
    fn constructor_call_is_not_a_declaration() {
        assert!(matches!(parse_one("new Foo();"), Statement::Expression(_)));
    }

    #[test]
    fn missing_semicolon() {
        assert_eq!(error("x = 1 y"), "Unexpected token. Expected: ';' but found 'y'.");
        assert_eq!(error("foo() bar"), "Unexpected token. Expected: ';' but found 'bar'.");
    }

    // ========================================================================
    // Control flow
    // ========================================================================

    #[test]
    fn parse_if_else() {
        match parse_one("if (a) { b(); } else c();") {
            Statement::If(statement) => {
                assert_eq!(statement.then_branch.len(), 1);
                assert_eq!(statement.else_branch.len(), 1);
            }
            _ => panic!("Expected if"),
        }
    }

    #[test]
    fn literal_if_keeps_taken_branch() {
        let block = parse_block("{ if (false) { a(); } else { b(); c(); } d(); }");
        assert_eq!(block.len(), 3);
        let block = parse_block("{ if (true) { a(); } }");
        assert_eq!(block.len(), 1);
        let block = parse_block("{ if (false) { a(); } }");
        assert!(block.is_empty());
    }

    #[test]
    fn parse_for() {
        match parse_one("for (int i = 0, j = 1; i < 10; i++, j += 2) { x(); }") {
            Statement::For(statement) => {
                assert_eq!(statement.init.len(), 2);
                assert!(matches!(statement.init[0], Statement::VariableDeclaration(_)));
                assert!(matches!(statement.init[1], Statement::Assignment(_)));
                assert!(statement.condition.is_some());
                assert_eq!(statement.step.len(), 2);
                assert_eq!(statement.body.len(), 1);
            }
            _ => panic!("Expected for"),
        }
    }

    #[test]
    fn parse_for_all_empty() {
        match parse_one("for (;;) break;") {
            Statement::For(statement) => {
                assert!(statement.init.is_empty());
                assert!(statement.condition.is_none());
                assert!(statement.step.is_empty());
                assert!(matches!(statement.body[0], Statement::Break(_)));
            }
            _ => panic!("Expected for"),
        }
    }

    #[test]
    fn parse_while() {
        assert!(matches!(parse_one("while (running) step();"), Statement::While(_)));
    }

    #[test]
    fn parse_return() {
        match parse_one("return x + 1;") {
            Statement::Return(statement) => assert!(statement.value.is_some()),
            _ => panic!("Expected return"),
        }
        match parse_one("return;") {
            Statement::Return(statement) => assert!(statement.value.is_none()),
            _ => panic!("Expected return"),
        }
    }

    // ========================================================================
    // Switch
    // ========================================================================

    #[test]
    fn parse_switch_chunks() {
        let source = "switch (x) { case 1: case 2: a(); break; case 3: default: b(); }";
        match parse_one(source) {
            Statement::Switch(statement) => {
                assert_eq!(statement.chunks.len(), 2);
                assert_eq!(statement.chunks[0].labels.len(), 2);
                assert_eq!(statement.chunks[0].body.len(), 2);
                assert!(!statement.chunks[0].has_default());
                assert!(statement.chunks[1].has_default());
            }
            _ => panic!("Expected switch"),
        }
    }

    #[test]
    fn default_must_be_last_in_its_chunk() {
        assert_eq!(
            error("switch (x) { default: case 1: a(); }"),
            "default cannot appear before other cases."
        );
    }

    // ========================================================================
    // Imports
    // ========================================================================

    #[test]
    fn statement_import_is_spliced() {
        let loader = MemoryLoader::new().with_file("inc.pst", "a(); b();");
        let mut context = ParseContext::new().with_loader(Box::new(loader));
        let block = parse_block_with(&mut context, "{ @import(\"inc.pst\"); c(); }").unwrap();
        assert_eq!(block.len(), 3);
        assert_eq!(context.sources().len(), 1);
    }

    #[test]
    fn missing_statement_import() {
        let err = parse_block_with(&mut ParseContext::new(), "{ @import(\"nope.pst\"); }").unwrap_err();
        assert!(err.is_load());
    }
}
