//! Type Resolution Pass - type every expression of every live body.
//!
//! Bodies are resolved one at a time by a [`TypeResolver`], which carries
//! the [`Owner`] of the code and a [`VariableScope`] of its locals. The
//! resolver consumes each node and produces a typed replacement: binary
//! pairs on strings become concatenations, calls become the invocation
//! kind their target calls for, and builtin methods become core function
//! references with their receiver attached.
//!
//! Classes are resolved first (constructor, field initializers, methods),
//! then free functions, each in name order.
//!
//! ## Example
//!
//! ```text
//! int twice(int x) { return x * 2; }
//!
//! After this pass:
//! - `x` is typed int from the parameter scope
//! - `x * 2` is an OpPair typed int
//! - the return value is checked against the declared int
//! ```

mod calls;
mod expr;
mod stmt;

use pastel_core::{ClassId, CompilationError, PType, Span};
use pastel_parser::ast::{Expression, ExpressionKind, Parameter, Statement};
use tracing::{debug, instrument, trace};

use crate::extensions::ExtensionSet;
use crate::index::ProgramIndex;
use crate::scope::{Owner, VariableScope};
use crate::signatures::{SignatureRegistry, registry_at};
use crate::tables::ProgramTables;

type Result<T> = std::result::Result<T, CompilationError>;

/// Output of the type resolution pass.
#[derive(Debug, Default)]
pub struct TypeOutput {
    pub functions: usize,
    pub methods: usize,
    pub constructors: usize,
    pub fields: usize,
}

/// Type Resolution Pass - resolves and checks all code.
pub struct TypeResolutionPass<'a> {
    tables: &'a mut ProgramTables,
    index: &'a ProgramIndex,
    extensions: &'a ExtensionSet,
}

impl<'a> TypeResolutionPass<'a> {
    pub fn new(
        tables: &'a mut ProgramTables,
        index: &'a ProgramIndex,
        extensions: &'a ExtensionSet,
    ) -> Self {
        Self {
            tables,
            index,
            extensions,
        }
    }

    #[instrument(skip_all, name = "type_resolution")]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self) -> Result<TypeOutput> {
        let registry = registry_at(Span::default())?;
        let mut output = TypeOutput::default();

        let classes: Vec<String> = self.tables.classes.keys().cloned().collect();
        for name in &classes {
            self.resolve_class(name, registry, &mut output)?;
        }

        let functions: Vec<String> = self.tables.functions.keys().cloned().collect();
        for name in &functions {
            let Some(function) = self.tables.functions.get_mut(name) else {
                continue;
            };
            let body = std::mem::take(&mut function.body);
            let params = function.params.clone();
            let owner = Owner::Function {
                class: None,
                name: name.clone(),
                return_type: function.return_type.clone(),
            };

            let body = self.resolver(owner, registry).body(&params, body)?;
            if let Some(function) = self.tables.functions.get_mut(name) {
                function.body = body;
            }
            trace!(function = %name, "types resolved");
            output.functions += 1;
        }

        debug!(
            functions = output.functions,
            methods = output.methods,
            constructors = output.constructors,
            fields = output.fields,
            "types resolved"
        );
        Ok(output)
    }

    fn resolver(&self, owner: Owner, registry: &'a SignatureRegistry) -> TypeResolver<'_> {
        TypeResolver {
            tables: &*self.tables,
            index: self.index,
            extensions: self.extensions,
            registry,
            owner,
            scope: VariableScope::new(),
        }
    }

    fn resolve_class(
        &mut self,
        name: &str,
        registry: &'a SignatureRegistry,
        output: &mut TypeOutput,
    ) -> Result<()> {
        let Some(class_id) = self.index.class_id(name) else {
            return Ok(());
        };
        let Some(class) = self.tables.classes.get_mut(name) else {
            return Ok(());
        };

        let constructor = std::mem::take(&mut class.constructor.body);
        let constructor_params = class.constructor.params.clone();
        let fields: Vec<(String, PType, Expression)> = class
            .fields
            .iter_mut()
            .map(|f| {
                let value = std::mem::replace(&mut f.value, Expression::new(ExpressionKind::This, f.span));
                (f.name.clone(), f.ty.clone(), value)
            })
            .collect();
        let methods: Vec<(String, PType, Vec<Parameter>, Vec<Statement>)> = class
            .methods
            .iter_mut()
            .map(|m| {
                let body = std::mem::take(&mut m.body);
                (m.name.clone(), m.return_type.clone(), m.params.clone(), body)
            })
            .collect();

        let constructor = self
            .resolver(Owner::Constructor { class: class_id }, registry)
            .body(&constructor_params, constructor)?;
        output.constructors += 1;

        let mut field_values = Vec::with_capacity(fields.len());
        for (field, ty, value) in fields {
            let owner = Owner::Field {
                class: class_id,
                name: field,
            };
            field_values.push(self.resolver(owner, registry).field_value(&ty, value)?);
            output.fields += 1;
        }

        let mut method_bodies = Vec::with_capacity(methods.len());
        for (method, return_type, params, body) in methods {
            let owner = Owner::Function {
                class: Some(class_id),
                name: method,
                return_type,
            };
            method_bodies.push(self.resolver(owner, registry).body(&params, body)?);
            output.methods += 1;
        }

        if let Some(class) = self.tables.classes.get_mut(name) {
            class.constructor.body = constructor;
            for (field, value) in class.fields.iter_mut().zip(field_values) {
                field.value = value;
            }
            for (method, body) in class.methods.iter_mut().zip(method_bodies) {
                method.body = body;
            }
        }
        trace!(class = %name, "types resolved");
        Ok(())
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Resolves the code of one owner.
pub(crate) struct TypeResolver<'t> {
    tables: &'t ProgramTables,
    index: &'t ProgramIndex,
    extensions: &'t ExtensionSet,
    registry: &'t SignatureRegistry,
    owner: Owner,
    scope: VariableScope,
}

impl<'t> TypeResolver<'t> {
    /// Resolve a function-like body after declaring its parameters.
    fn body(mut self, params: &[Parameter], body: Vec<Statement>) -> Result<Vec<Statement>> {
        for param in params {
            self.scope.declare(&param.name, param.ty.clone(), param.span)?;
        }
        self.block(body)
    }

    /// Resolve a class field initializer against the field's type.
    fn field_value(mut self, ty: &PType, value: Expression) -> Result<Expression> {
        let value = self.expression(value)?;
        if !PType::check_assignment(ty, &type_of(&value), self.index) {
            return Err(CompilationError::type_mismatch(
                value.span,
                "Cannot assign this value to this type.",
            ));
        }
        Ok(value)
    }

    /// Resolve an expression used as a value.
    ///
    /// References that only make sense as a call target are rejected here.
    fn expression(&mut self, expression: Expression) -> Result<Expression> {
        let expression = expr::resolve(self, expression)?;
        let message = match &expression.kind {
            ExpressionKind::CoreFunctionReference { .. } => "Core functions must be invoked.",
            ExpressionKind::ExtensibleFunctionReference(_) => "Extensible functions must be invoked.",
            ExpressionKind::ConstructorReference(_) => "Constructors must be invoked.",
            ExpressionKind::NamespaceReference(_) => "A namespace cannot be used as a value.",
            ExpressionKind::EnumReference(_) => "An enum cannot be used as a value.",
            _ => return Ok(expression),
        };
        Err(CompilationError::other(expression.span, message))
    }

    fn class_type(&self, class: ClassId, span: Span) -> Result<PType> {
        let name = self.index.class_name(class).unwrap_or_default();
        PType::named(name).finalize(self.index, span)
    }
}

/// The resolved type of an expression that has been through the resolver.
fn type_of(expression: &Expression) -> PType {
    expression.resolved_type.clone().unwrap_or_else(PType::void)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::ExtensibleFunction;
    use crate::passes::constants::ConstantPass;
    use crate::passes::fields::FieldTypePass;
    use crate::passes::flatten::StructFlattenPass;
    use crate::passes::hierarchy::ClassHierarchyPass;
    use crate::passes::names::NameResolutionPass;
    use crate::passes::signature_types::SignatureTypePass;
    use pastel_core::{Constant, CoreFunction};
    use pastel_parser::ast::{BinaryOp, ReturnStatement};
    use pastel_parser::{ParseContext, Parser};

    fn run_with(source: &str, extensions: &ExtensionSet) -> Result<ProgramTables> {
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
        TypeResolutionPass::new(&mut tables, &index, extensions).run()?;
        Ok(tables)
    }

    fn run(source: &str) -> Result<ProgramTables> {
        run_with(source, &ExtensionSet::new())
    }

    fn message(source: &str) -> String {
        run(source).unwrap_err().message().to_string()
    }

    /// The value of the last `return` at the top level of a function.
    fn returned(tables: &ProgramTables, function: &str) -> Expression {
        tables.functions[function]
            .body
            .iter()
            .rev()
            .find_map(|s| match s {
                Statement::Return(ReturnStatement { value, .. }) => value.clone(),
                _ => None,
            })
            .unwrap()
    }

    fn returned_type(tables: &ProgramTables, function: &str) -> String {
        type_of(&returned(tables, function)).to_string()
    }

    // =========================================
    // Variables and scopes
    // =========================================

    #[test]
    fn parameters_and_locals_are_typed() {
        let tables = run("double f(int a) { double b = 1.5; return b; }").unwrap();
        assert_eq!(returned_type(&tables, "f"), "double");
    }

    #[test]
    fn unknown_variable() {
        assert_eq!(message("int f() { return y; }"), "The variable 'y' is not defined.");
    }

    #[test]
    fn unknown_function() {
        assert_eq!(message("void f() { g(); }"), "The function 'g' is not defined.");
    }

    #[test]
    fn locals_do_not_outlive_their_block() {
        assert_eq!(
            message("int f() { if (1 < 2) { int x = 1; } return x; }"),
            "The variable 'x' is not defined."
        );
    }

    #[test]
    fn redeclaration_is_rejected() {
        let err = run("void f(int a) { int a = 2; }").unwrap_err();
        assert!(matches!(err, CompilationError::DuplicateDefinition { .. }));
    }

    #[test]
    fn declaration_type_must_match() {
        assert_eq!(message("void f() { int x = \"no\"; }"), "Cannot assign this type to a int");
    }

    #[test]
    fn double_declaration_needs_an_explicit_conversion() {
        assert_eq!(
            message("void f(int n) { double d = n; }"),
            "Must explicitly convert integer to a double/float."
        );
        assert_eq!(
            message("void f() { double d = 3; }"),
            "Must explicitly convert integer to a double/float."
        );
        assert!(run("void f() { double d = 3.0; }").is_ok());
    }

    // =========================================
    // Operators
    // =========================================

    #[test]
    fn arithmetic_types() {
        let tables = run(
            "double f(int a, double b) { return a * b; }\n\
             bool g(char a, char b) { return a < b; }",
        )
        .unwrap();
        assert_eq!(returned_type(&tables, "f"), "double");
        assert_eq!(returned_type(&tables, "g"), "bool");
    }

    #[test]
    fn undefined_operator() {
        assert_eq!(
            message("int f(bool a, int b) { return a - b; }"),
            "The operator '-' is not defined for types: bool and int."
        );
    }

    #[test]
    fn string_addition_becomes_concatenation() {
        let tables = run("string f(string a, int b, char c) { return a + b + c; }").unwrap();
        let value = returned(&tables, "f");
        let ExpressionKind::StringConcatenation(parts) = &value.kind else {
            panic!("Expected concatenation, got {:?}", value.kind);
        };
        assert_eq!(parts.len(), 3);
        assert_eq!(type_of(&value).to_string(), "string");
    }

    #[test]
    fn null_compares_with_nullable() {
        let tables = run("bool f(string s) { return s == null; }").unwrap();
        assert_eq!(returned_type(&tables, "f"), "bool");
    }

    #[test]
    fn unary_operand_types() {
        assert_eq!(
            message("bool f(string s) { return !s; }"),
            "Cannot apply '!' to type: string"
        );
    }

    // =========================================
    // Statements
    // =========================================

    #[test]
    fn conditions_must_be_bool() {
        assert_eq!(
            message("void f(int x) { if (x) { } }"),
            "Only booleans can be used in if statements."
        );
        assert_eq!(
            message("void f(int x) { while (x) { } }"),
            "While loop must have a boolean condition."
        );
    }

    #[test]
    fn switch_cases_match_the_condition() {
        assert_eq!(
            message("void f(string s) { switch (s) { default: break; } }"),
            "Only ints and chars can be used in switch statements."
        );
        assert_eq!(
            message("void f(int x) { switch (x) { case 'a': break; } }"),
            "Only ints may be used."
        );
    }

    #[test]
    fn returns_are_checked() {
        assert_eq!(
            message("int f() { return \"s\"; }"),
            "This expression is not the expected return type of this function."
        );
        assert_eq!(message("int f() { return; }"), "Must return a value in this function.");
        assert!(run("void f() { return; }").is_ok());
    }

    #[test]
    fn int_does_not_widen_on_return() {
        assert!(run("double f() { return 1; }").is_err());
    }

    #[test]
    fn incremental_double_assignment_accepts_int() {
        assert!(run("void f() { double d = 1.0; d += 2; }").is_ok());
        assert_eq!(
            message("void f() { double d = 1.0; d = 2; }"),
            "Cannot assign a int to a double"
        );
    }

    // =========================================
    // Indexing and fields
    // =========================================

    #[test]
    fn collection_indexing() {
        let tables = run(
            "string f(List<string> items) { return items[0]; }\n\
             double g(Dictionary<string, double> d) { return d[\"k\"]; }\n\
             char h(string s) { return s[1]; }",
        )
        .unwrap();
        assert_eq!(returned_type(&tables, "f"), "string");
        assert_eq!(returned_type(&tables, "g"), "double");
        assert_eq!(returned_type(&tables, "h"), "char");
    }

    #[test]
    fn literal_string_index_folds() {
        let tables = run("char f() { return \"abc\"[1]; }").unwrap();
        assert_eq!(returned(&tables, "f").as_constant(), Some(&Constant::Char('b')));
    }

    #[test]
    fn bad_index_type() {
        assert_eq!(
            message("int f(List<int> items) { return items[\"0\"]; }"),
            "Cannot index into a List<int> with a string."
        );
    }

    #[test]
    fn struct_fields_include_inherited_ones() {
        let tables = run(
            "struct Point { int x; int y; }\n\
             struct Point3D extends Point { int z; }\n\
             int f(Point3D p) { return p.x + p.z; }",
        )
        .unwrap();
        assert_eq!(returned_type(&tables, "f"), "int");
    }

    #[test]
    fn unknown_struct_field() {
        assert_eq!(
            message("struct P { int x; }\nint f(P p) { return p.w; }"),
            "The struct 'P' does not have a field called 'w'."
        );
    }

    #[test]
    fn builtin_methods_become_core_invocations() {
        let tables = run("int f(List<string> items) { return items.Size(); }").unwrap();
        let value = returned(&tables, "f");
        let ExpressionKind::CoreFunctionInvocation { function, args } = &value.kind else {
            panic!("Expected core invocation, got {:?}", value.kind);
        };
        assert_eq!(*function, CoreFunction::ListSize);
        assert_eq!(args.len(), 1);
        assert_eq!(type_of(&value).to_string(), "int");
    }

    // =========================================
    // Calls
    // =========================================

    #[test]
    fn user_function_arguments() {
        assert!(run("int add(int a, int b) { return a + b; }\nint f() { return add(1, 2); }").is_ok());
        let err = run("int add(int a, int b) { return a + b; }\nint f() { return add(1); }")
            .unwrap_err();
        assert!(matches!(err, CompilationError::ArgumentCountMismatch { expected: 2, got: 1, .. }));
        assert_eq!(
            message("int id(int a) { return a; }\nint f() { return id(\"x\"); }"),
            "Wrong function arg type. Cannot convert a string to a int"
        );
    }

    #[test]
    fn templates_unify_per_call_site() {
        let tables = run(
            "string first(List<string> a) { return a[0]; }\n\
             void f(List<string> names, List<int> ids) { names.Add(\"x\"); ids.Add(4); }",
        )
        .unwrap();
        assert!(tables.functions.contains_key("f"));
        assert_eq!(
            message("void f(List<string> names) { names.Add(4); }"),
            "Incorrect type. Expected string but found int."
        );
    }

    #[test]
    fn math_abs_keeps_its_argument_type() {
        let tables = run(
            "int f(int x) { return Math.abs(x); }\n\
             double g(double x) { return Math.abs(x); }",
        )
        .unwrap();
        assert_eq!(returned_type(&tables, "f"), "int");
        assert_eq!(returned_type(&tables, "g"), "double");
    }

    #[test]
    fn function_pointers() {
        let tables = run(
            "int seven() { return 7; }\n\
             int f() { Func<int> g = seven; return g(); }",
        )
        .unwrap();
        let value = returned(&tables, "f");
        assert!(matches!(value.kind, ExpressionKind::FunctionPointerInvocation { .. }));
        assert_eq!(
            message("int seven() { return 7; }\nint f() { Func<int> g = seven; return g(1); }"),
            "This function has the incorrect number of arguments."
        );
    }

    #[test]
    fn not_invocable() {
        assert_eq!(
            message("int f(int x) { return x(); }"),
            "This expression cannot be invoked like a function."
        );
    }

    #[test]
    fn extensible_functions() {
        let extensions = ExtensionSet::new().with(ExtensibleFunction::new(
            "beep",
            PType::void(),
            vec![PType::int()],
            "beep($0)",
        ));
        assert!(run_with("void f() { Extension.beep(3); }", &extensions).is_ok());
        let err = run_with("void f() { Extension.beep(\"3\"); }", &extensions).unwrap_err();
        assert_eq!(err.message(), "Invalid argument type. Expected 'int' but found 'string'.");
        let err = run("void f() { Extension.beep(3); }").unwrap_err();
        assert_eq!(
            err.message(),
            "Type information for 'beep' extensible function is not defined."
        );
    }

    #[test]
    fn struct_constructors() {
        assert!(run("struct P { int x; string s; }\nP f() { return new P(1, null); }").is_ok());
        assert_eq!(
            message("struct P { int x; }\nP f() { return new P(); }"),
            "Incorrect number of args in constructor. Expected 1, found 0"
        );
        assert_eq!(
            message("struct P { int x; }\nP f() { return new P(true); }"),
            "Cannot use an arg of this type for this struct field. Expected int but found bool"
        );
        assert_eq!(
            message("int f() { return new int(); }"),
            "Cannot instantiate this item."
        );
    }

    // =========================================
    // Classes
    // =========================================

    #[test]
    fn class_members_resolve_through_this() {
        let tables = run(
            "class Animal { int legs = 4; int legCount() { return this.legs; } }\n\
             class Dog : Animal { string name; constructor(string n) { this.name = n; }\n\
               int twice() { return this.legCount() * 2; } }",
        )
        .unwrap();
        let method = tables.classes["Dog"].method("twice").unwrap();
        let Statement::Return(ret) = &method.body[0] else {
            panic!("Expected return");
        };
        assert_eq!(ret.value.as_ref().map(type_of), Some(PType::int()));
    }

    #[test]
    fn this_outside_a_class() {
        assert_eq!(
            message("int f() { return this.x; }"),
            "Cannot use the expression 'this' outside of classes."
        );
    }

    #[test]
    fn constructors_cannot_return_values() {
        assert_eq!(
            message("class C { constructor() { return 1; } }"),
            "You cannot return a value from a constructor."
        );
    }

    #[test]
    fn field_initializers_are_checked() {
        assert_eq!(
            message("class C { int x = \"one\"; }"),
            "Cannot assign this value to this type."
        );
    }

    #[test]
    fn inline_increment_needs_int() {
        assert_eq!(
            message("void f() { double d = 1.0; d++; }"),
            "++ and -- can only be applied to integer types."
        );
    }

    #[test]
    fn pairs_keep_their_operator() {
        let tables = run("bool f(int a, int b) { return a == b; }").unwrap();
        assert!(matches!(
            returned(&tables, "f").kind,
            ExpressionKind::OpPair { op: BinaryOp::Equal, .. }
        ));
    }
}
