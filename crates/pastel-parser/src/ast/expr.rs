//! Expression AST nodes for Pastel.
//!
//! An [`Expression`] is a node kind plus its span and, once the resolver's
//! type stage has visited it, its resolved type. The parser only produces
//! the first group of [`ExpressionKind`] variants. The resolver replaces
//! nodes with the second group as it learns what names refer to; it never
//! mutates a node in place, it builds the replacement and swaps it in.
//!
//! # Expression Precedence
//!
//! From loosest to tightest:
//! 1. Boolean combination (`&&`, `||`)
//! 2. Bitwise (`&`, `|`, `^`)
//! 3. Equality (`==`, `!=`)
//! 4. Relational (`<`, `>`, `<=`, `>=`)
//! 5. Bit shift (`<<`, `>>`)
//! 6. Additive (`+`, `-`)
//! 7. Multiplicative (`*`, `/`, `%`)
//! 8. Prefix (`-`, `!`)
//! 9. Increment and cast (`++x`, `x--`, `(Type) x`)
//! 10. Entities and suffixes (`.field`, `[index]`, `(args)`)

use pastel_core::{ClassId, Constant, CoreFunction, PType, Span};

use super::ops::{BinaryOp, IncrementOp, UnaryOp};

/// A builtin namespace usable as the root of a dotted name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// `Core.X`: general builtins.
    Core,
    /// `Math.X`: math builtins.
    Math,
    /// `Extension.X`: host-provided extensible functions.
    Extension,
}

impl Namespace {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Core" => Some(Namespace::Core),
            "Math" => Some(Namespace::Math),
            "Extension" => Some(Namespace::Extension),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Core => "Core",
            Namespace::Math => "Math",
            Namespace::Extension => "Extension",
        }
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// What the expression is.
    pub kind: ExpressionKind,
    /// Where the expression starts.
    pub span: Span,
    /// Filled in by the type resolution stage.
    pub resolved_type: Option<PType>,
}

/// The kind of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    // ========================================================================
    // Produced by the parser
    // ========================================================================
    /// A literal value.
    InlineConstant(Constant),
    /// A bare name. May turn out to be a function, enum, constant or namespace.
    Variable(String),
    /// `this` inside a class member.
    This,
    /// `-x` or `!x`.
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    /// A flat run of same-tier binary operators, e.g. `a + b - c`.
    ///
    /// There is always exactly one more operand than operator.
    OpChain {
        operands: Vec<Expression>,
        ops: Vec<BinaryOp>,
    },
    /// `root[index]`.
    BracketIndex {
        root: Box<Expression>,
        index: Box<Expression>,
    },
    /// `root.field`.
    DotField {
        root: Box<Expression>,
        field: String,
        field_span: Span,
    },
    /// `root(args)`.
    FunctionInvocation {
        root: Box<Expression>,
        args: Vec<Expression>,
    },
    /// `new Type`, always followed by an invocation.
    ConstructorReference(PType),
    /// `(Type) operand`.
    Cast {
        target: PType,
        operand: Box<Expression>,
    },
    /// `++x`, `x++`, `--x`, `x--`.
    InlineIncrement {
        op: IncrementOp,
        operand: Box<Expression>,
        prefix: bool,
    },
    /// `@name`, the root of a compile-time function call.
    CompileTimeFunctionReference(String),

    // ========================================================================
    // Produced by the resolver
    // ========================================================================
    /// A single binary operation.
    OpPair {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
    },
    /// N-ary string `+`.
    StringConcatenation(Vec<Expression>),
    /// A user function used as a value or call target.
    FunctionReference(String),
    /// `instance.method` on a class instance.
    MethodReference {
        root: Box<Expression>,
        class: ClassId,
        name: String,
    },
    /// A call through a `Func<...>` value.
    FunctionPointerInvocation {
        root: Box<Expression>,
        args: Vec<Expression>,
    },
    /// `new Type(args)`.
    ConstructorInvocation { target: PType, args: Vec<Expression> },
    /// A builtin that has not been invoked yet. `context` is the receiver
    /// of a builtin method, which becomes the first argument.
    CoreFunctionReference {
        function: CoreFunction,
        context: Option<Box<Expression>>,
    },
    /// A call to a builtin.
    CoreFunctionInvocation {
        function: CoreFunction,
        args: Vec<Expression>,
    },
    /// A bare enum name, waiting for `.Member`.
    EnumReference(String),
    /// A bare builtin namespace, waiting for `.Name`.
    NamespaceReference(Namespace),
    /// `Extension.name`.
    ExtensibleFunctionReference(String),
    /// `Extension.name(args)`.
    ExtensibleFunctionInvocation { name: String, args: Vec<Expression> },
}

impl Expression {
    /// Create an untyped expression.
    pub fn new(kind: ExpressionKind, span: Span) -> Self {
        Self {
            kind,
            span,
            resolved_type: None,
        }
    }

    /// Create a literal, typed with the literal's own type.
    pub fn constant(value: Constant, span: Span) -> Self {
        let ty = value.ptype();
        Self {
            kind: ExpressionKind::InlineConstant(value),
            span,
            resolved_type: Some(ty),
        }
    }

    /// Attach a resolved type.
    pub fn with_type(mut self, ty: PType) -> Self {
        self.resolved_type = Some(ty);
        self
    }

    /// The literal value, if this is an inline constant.
    pub fn as_constant(&self) -> Option<&Constant> {
        match &self.kind {
            ExpressionKind::InlineConstant(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.kind, ExpressionKind::InlineConstant(_))
    }

    /// The literal bool value, if this is a bool constant.
    pub fn as_bool_constant(&self) -> Option<bool> {
        self.as_constant().and_then(Constant::as_bool)
    }

    /// Visit this expression and every sub-expression, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expression)) {
        visit(self);
        match &self.kind {
            ExpressionKind::InlineConstant(_)
            | ExpressionKind::Variable(_)
            | ExpressionKind::This
            | ExpressionKind::ConstructorReference(_)
            | ExpressionKind::CompileTimeFunctionReference(_)
            | ExpressionKind::FunctionReference(_)
            | ExpressionKind::EnumReference(_)
            | ExpressionKind::NamespaceReference(_)
            | ExpressionKind::ExtensibleFunctionReference(_) => {}
            ExpressionKind::UnaryOp { operand, .. }
            | ExpressionKind::Cast { operand, .. }
            | ExpressionKind::InlineIncrement { operand, .. } => operand.walk(visit),
            ExpressionKind::OpChain { operands, .. }
            | ExpressionKind::StringConcatenation(operands) => {
                operands.iter().for_each(|e| e.walk(visit));
            }
            ExpressionKind::BracketIndex { root, index } => {
                root.walk(visit);
                index.walk(visit);
            }
            ExpressionKind::DotField { root, .. } | ExpressionKind::MethodReference { root, .. } => {
                root.walk(visit)
            }
            ExpressionKind::FunctionInvocation { root, args }
            | ExpressionKind::FunctionPointerInvocation { root, args } => {
                root.walk(visit);
                args.iter().for_each(|e| e.walk(visit));
            }
            ExpressionKind::OpPair { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            ExpressionKind::ConstructorInvocation { args, .. }
            | ExpressionKind::CoreFunctionInvocation { args, .. }
            | ExpressionKind::ExtensibleFunctionInvocation { args, .. } => {
                args.iter().for_each(|e| e.walk(visit));
            }
            ExpressionKind::CoreFunctionReference { context, .. } => {
                if let Some(context) = context {
                    context.walk(visit);
                }
            }
        }
    }
}
