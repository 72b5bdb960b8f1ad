//! Integration tests for Pastel using the Compiler facade as the entry point.
//!
//! These tests validate the full front end (parsing + resolution)
//! against complete Pastel programs.

use pastel::pastel_parser::ast::{Expression, ExpressionKind, Statement};
use pastel::{
    CompilationError, CompileError, CompileOptions, CompiledProgram, Compiler, Constant,
    ExtensibleFunction, ExtensionSet, MemoryLoader, PType, Span, TargetLanguage,
};

/// Compile a single source with default options.
fn compile(source: &str) -> Result<CompiledProgram, CompileError> {
    compile_with(CompileOptions::default(), source)
}

fn compile_with(options: CompileOptions, source: &str) -> Result<CompiledProgram, CompileError> {
    let mut compiler = Compiler::new(options);
    compiler.add_source("main.pst", source);
    compiler.compile()
}

/// Compile a source that must fail and return the resolver error.
fn compilation_error(source: &str) -> CompilationError {
    match compile(source).unwrap_err().error {
        pastel::PastelError::Compilation(err) => err,
        other => panic!("Expected a compilation error, got {other:?}"),
    }
}

/// The value of the last `return` in a function.
fn returned(compiled: &CompiledProgram, function: &str) -> Expression {
    compiled.program().functions()[function]
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
    let compiled = compile(source).unwrap();
    returned(&compiled, "f").as_constant().cloned().unwrap()
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_resolving_twice_is_identical() {
    let source = r#"
        enum Shape { CIRCLE, SQUARE = 4, TRIANGLE }
        const int SIDES = Shape.TRIANGLE + 1;
        struct Point { int x; int y; }
        struct Point3D extends Point { int z; }

        string describe(Point3D p) {
            return "(" + p.x + ", " + p.y + ", " + p.z + ") " + SIDES;
        }

        int main() {
            List<int> values = new List<int>();
            values.Add(3);
            for (int i = 0; i < values.Size(); i++) {
                values[i] = values[i] * 2;
            }
            return values.Size();
        }
    "#;
    let first = compile(source).unwrap();
    let second = compile(source).unwrap();
    assert_eq!(
        format!("{:?}", first.program()),
        format!("{:?}", second.program())
    );
}

// =============================================================================
// Reachability
// =============================================================================

#[test]
fn test_entry_points_keep_what_they_reach() {
    let options = CompileOptions::default().with_entry_point("A");
    let compiled = compile_with(options, "void A() { B(); }\nvoid B() { }\nvoid C() { }").unwrap();
    let names: Vec<&str> = compiled
        .program()
        .functions()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn test_no_entry_points_keeps_everything() {
    let compiled = compile("void A() { }\nvoid B() { }\nvoid C() { }").unwrap();
    assert_eq!(compiled.program().functions().len(), 3);
}

#[test]
fn test_unknown_entry_point() {
    let options = CompileOptions::default().with_entry_point("start");
    let err = compile_with(options, "void main() { }").unwrap_err();
    assert!(matches!(
        err.error,
        pastel::PastelError::Compilation(CompilationError::UnknownName { .. })
    ));
}

// =============================================================================
// Structs and classes
// =============================================================================

#[test]
fn test_struct_flattening() {
    let compiled = compile(
        "struct Point3D extends Point { int z; }\n\
         struct Point { int x; int y; }",
    )
    .unwrap();
    let fields: Vec<&str> = compiled.program().structs()["Point3D"]
        .flattened_fields
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(fields, vec!["x", "y", "z"]);
}

#[test]
fn test_struct_field_shadowing_is_rejected() {
    let err = compilation_error("struct A { int x; }\nstruct B extends A { int x; }");
    assert!(matches!(err, CompilationError::DuplicateField { .. }));
}

#[test]
fn test_struct_cycle_is_rejected() {
    let err = compilation_error("struct A extends B { }\nstruct B extends A { }");
    assert!(matches!(err, CompilationError::CircularInheritance { .. }));
}

#[test]
fn test_class_cycle_is_rejected() {
    let err = compilation_error("class A : B { }\nclass B : A { }");
    assert!(matches!(err, CompilationError::CircularInheritance { .. }));
}

#[test]
fn test_struct_cycle_is_reported_before_constants() {
    let err = compilation_error(
        "struct A extends B { }\n\
         struct B extends A { }\n\
         const int X = Y;\n\
         const int Y = X;",
    );
    assert!(matches!(err, CompilationError::CircularInheritance { .. }));
}

#[test]
fn test_struct_identity_through_the_index() {
    let compiled = compile(
        "struct Point { int x; int y; }\n\
         struct Point3D extends Point { int z; }",
    )
    .unwrap();
    let index = compiled.program().type_index();
    let span = Span::default();

    let point = PType::named("Point").finalize(index, span).unwrap();
    let again = PType::named("Point").finalize(index, span).unwrap();
    let point3d = PType::named("Point3D").finalize(index, span).unwrap();

    assert!(point.is_identical(&again, index));
    assert!(!point3d.is_identical(&point, index));
    assert!(point3d.is_identical_or_child_of(&point, index));
    assert!(!point.is_identical_or_child_of(&point3d, index));
}

#[test]
fn test_class_members() {
    let compiled = compile(
        r#"
        class Counter {
            int count = 0;
            constructor(int start) { this.count = start; }
            int next() { this.count += 1; return this.count; }
        }
        class Stepper : Counter {
            constructor() { }
            int twice() { this.next(); return this.next(); }
        }
        int main() {
            Counter c = new Counter(3);
            return c.next();
        }
        "#,
    )
    .unwrap();
    assert!(compiled.program().classes()["Stepper"].parent_id.is_some());
    assert_eq!(
        returned(&compiled, "main").resolved_type,
        Some(PType::int())
    );
}

// =============================================================================
// Constants and enums
// =============================================================================

#[test]
fn test_constant_cycle_names_a_member() {
    let err = compilation_error("const int X = Y + 1;\nconst int Y = X + 1;");
    match err {
        CompilationError::ConstantCycle { name, .. } => {
            assert!(name == "X" || name == "Y", "unexpected name {name}")
        }
        other => panic!("Expected ConstantCycle, got {other:?}"),
    }
}

#[test]
fn test_constants_and_enums_inline() {
    let source = "enum Level { LOW = 1, HIGH = 8 }\n\
                  const int LIMIT = Level.HIGH * 2;\n\
                  int f() { return LIMIT + Level.LOW; }";
    assert_eq!(returned_constant(source), Constant::Int(17));
}

#[test]
fn test_mutually_referencing_constants_cycle() {
    let err = compilation_error("const int X = Y;\nconst int Y = X;");
    match err {
        CompilationError::ConstantCycle { name, message, .. } => {
            assert!(name == "X" || name == "Y", "unexpected name {name}");
            assert_eq!(
                message,
                format!("The constant '{name}' has a cycle in its value declaration.")
            );
        }
        other => panic!("Expected ConstantCycle, got {other:?}"),
    }
}

// =============================================================================
// Local declarations
// =============================================================================

fn assert_conflict(source: &str, name: &str) {
    match compilation_error(source) {
        CompilationError::DuplicateDefinition { name: found, message, .. } => {
            assert_eq!(found, name);
            assert_eq!(
                message,
                format!("This declaration of '{name}' conflicts with a previous declaration.")
            );
        }
        other => panic!("Expected DuplicateDefinition for {name}, got {other:?}"),
    }
}

#[test]
fn test_local_named_after_a_constant() {
    assert_conflict("const int K = 3;\nint f() { int K = 1; return K; }", "K");
}

#[test]
fn test_local_named_after_a_struct() {
    assert_conflict("struct S { int a; }\nint f() { int S = 1; return S; }", "S");
}

#[test]
fn test_local_named_after_a_function() {
    assert_conflict("int g() { return 2; }\nint f() { int g = 1; return g; }", "g");
}

#[test]
fn test_parameter_named_after_a_constant() {
    assert_conflict("const int K = 3;\nint f(int K) { return K; }", "K");
}

#[test]
fn test_parameter_named_after_a_struct() {
    assert_conflict("struct S { int a; }\nint f(int S) { return S; }", "S");
}

#[test]
fn test_parameter_named_after_a_function() {
    assert_conflict("int g() { return 2; }\nint f(int g) { return g; }", "g");
}

#[test]
fn test_nested_local_conflict_in_a_method() {
    assert_conflict(
        "enum Mode { ON }\nclass C { void run() { while (true) { string Mode = \"x\"; } } }",
        "Mode",
    );
}

// =============================================================================
// Folding
// =============================================================================

#[test]
fn test_arithmetic_folds() {
    assert_eq!(returned_constant("int f() { return (1 + 2) * 3; }"), Constant::Int(9));
    assert_eq!(returned_constant("int f() { return 2 + 3; }"), Constant::Int(5));
}

#[test]
fn test_string_literals_fold() {
    assert_eq!(
        returned_constant("string f() { return \"ab\" + \"cd\"; }"),
        Constant::String("abcd".to_string())
    );
}

#[test]
fn test_division_by_zero() {
    let err = compilation_error("int f() { return 4 / 0; }");
    assert!(matches!(err, CompilationError::DivisionByZero { .. }));
}

#[test]
fn test_double_modulo_and_division_by_zero() {
    assert_eq!(
        returned_constant("double f() { return -7.5 % 2.0; }"),
        Constant::float(-1.5)
    );
    let err = compilation_error("double f() { return 1.5 / 0.0; }");
    assert!(matches!(err, CompilationError::DivisionByZero { .. }));
}

// =============================================================================
// Template unification
// =============================================================================

#[test]
fn test_templates_bind_per_call() {
    let compiled = compile(
        "void f(List<string> names, List<int> ids) { names.Add(\"x\"); ids.Add(4); }",
    );
    assert!(compiled.is_ok());
}

#[test]
fn test_template_mismatch() {
    let err = compilation_error("void f(List<string> names) { names.Add(4); }");
    assert_eq!(err.message(), "Incorrect type. Expected string but found int.");
}

#[test]
fn test_builtin_return_types_follow_bindings() {
    let compiled = compile("string f(List<string> items) { return items[0]; }").unwrap();
    let value = returned(&compiled, "f");
    assert_eq!(value.resolved_type, Some(PType::string()));
    assert!(matches!(value.kind, ExpressionKind::CoreFunctionInvocation { .. }));
}

// =============================================================================
// Statements
// =============================================================================

#[test]
fn test_duplicate_switch_case() {
    let err = compilation_error("void f(int x) { switch (x) { case 5: break; case 5: break; } }");
    assert!(matches!(err, CompilationError::DuplicateSwitchCase { .. }));
}

#[test]
fn test_for_loops_become_while_loops() {
    let compiled =
        compile("int f() { int total = 0; for (int i = 0; i < 3; i++) { total += i; } return total; }")
            .unwrap();
    let body = &compiled.program().functions()["f"].body;
    assert!(!body.iter().any(|s| matches!(s, Statement::For(_))));
}

#[test]
fn test_int_does_not_widen_on_return() {
    let err = compilation_error("double f() { int x = 1; return x; }");
    assert!(matches!(err, CompilationError::TypeMismatch { .. }));
}

// =============================================================================
// Extensions
// =============================================================================

#[test]
fn test_extensible_functions() {
    let mut extensions = ExtensionSet::new();
    extensions.insert(ExtensibleFunction::new(
        "beep",
        PType::void(),
        vec![PType::int()],
        "beep($0)",
    ));
    let options = CompileOptions::default().with_extensions(extensions.clone());
    assert!(compile_with(options, "void main() { Extension.beep(3); }").is_ok());

    let options = CompileOptions::default().with_extensions(extensions);
    let err = compile_with(options, "void main() { Extension.beep(\"x\"); }").unwrap_err();
    assert!(err.error.is_compilation());
}

// =============================================================================
// Imports and compile-time functions
// =============================================================================

#[test]
fn test_imports_through_the_loader() {
    let loader = MemoryLoader::new().with_file("math.pst", "int square(int x) { return x * x; }");
    let options = CompileOptions::default().with_loader(Box::new(loader));
    let compiled = compile_with(
        options,
        "@import(\"math.pst\");\nint main() { return square(4); }",
    )
    .unwrap();
    assert_eq!(compiled.sources().len(), 2);
    assert!(compiled.program().function("square").is_some());
}

#[test]
fn test_conditional_imports_read_constants() {
    let loader = MemoryLoader::new()
        .with_file("audio.pst", "void play() { }")
        .with_file("silent.pst", "void mute() { }");
    let options = CompileOptions::default()
        .with_loader(Box::new(loader))
        .with_constant("HAS_AUDIO", Constant::Bool(true));
    let compiled = compile_with(
        options,
        "@importIfTrue(\"HAS_AUDIO\", \"audio.pst\");\n\
         @importIfFalse(\"HAS_AUDIO\", \"silent.pst\");\n\
         void main() { }",
    )
    .unwrap();
    assert!(compiled.program().function("play").is_some());
    assert!(compiled.program().function("mute").is_none());
}

#[test]
fn test_pastel_flag_follows_the_target() {
    let source = "bool f() { return @pastel_flag(\"IS_PYTHON\"); }";
    let python = CompileOptions::default().with_target(TargetLanguage::Python);
    let java = CompileOptions::default().with_target(TargetLanguage::Java);

    let compiled = compile_with(python, source).unwrap();
    assert_eq!(returned(&compiled, "f").as_constant(), Some(&Constant::Bool(true)));
    let compiled = compile_with(java, source).unwrap();
    assert_eq!(returned(&compiled, "f").as_constant(), Some(&Constant::Bool(false)));
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn test_diagnostic_formatting() {
    let err = compile("void main() {\n  int x = \"nope\";\n}").unwrap_err();
    assert_eq!(
        err.diagnostic.to_string(),
        "main.pst, line 2, column 11: Cannot assign this type to a int"
    );
}

#[test]
fn test_missing_import_is_a_load_error() {
    let options = CompileOptions::default().with_loader(Box::new(MemoryLoader::new()));
    let err = compile_with(options, "@import(\"missing.pst\");\nvoid main() { }").unwrap_err();
    assert!(err.error.is_load());
    assert_eq!(err.diagnostic.file, "main.pst");
    assert_eq!(err.diagnostic.line, 1);
    assert!(err.diagnostic.message.contains("missing.pst"));
}

#[test]
fn test_lex_errors_surface() {
    let err = compile("string f() { return \"open; }").unwrap_err();
    assert!(err.error.is_lex());
}
