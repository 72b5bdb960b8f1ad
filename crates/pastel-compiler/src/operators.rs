//! Operator typing and constant folding.
//!
//! The same table drives three stages: constant evaluation folds literal
//! operands, type resolution asks what an operator produces for two operand
//! types, and the type-context stage folds literal pairs left behind by
//! name resolution.
//!
//! Integer arithmetic is 32-bit and wraps. Integer `/` and `%` by a literal
//! zero is an error; `%` always yields a non-negative result for a positive
//! divisor.

use pastel_core::{CompilationError, Constant, PType, Span};
use pastel_parser::ast::{BinaryOp, Expression, ExpressionKind, UnaryOp};

// ============================================================================
// Chains
// ============================================================================

/// Turn a flat operator chain into nested pairs.
///
/// `&&` and `||` nest to the right so that short-circuiting keeps source
/// order; every other tier nests to the left. The span of each pair is the
/// span of its leftmost operand. Returns `None` for a chain with no operands.
pub fn chain_to_pairs(operands: Vec<Expression>, ops: Vec<BinaryOp>) -> Option<Expression> {
    let mut operands = operands.into_iter();
    let first = operands.next()?;
    let mut rest: Vec<(BinaryOp, Expression)> = ops.into_iter().zip(operands).collect();

    if !rest.first().is_some_and(|(op, _)| op.is_boolean_combination()) {
        return Some(
            rest.into_iter()
                .fold(first, |acc, (op, right)| pair(acc, op, right)),
        );
    }

    let Some((mut pending, mut acc)) = rest.pop() else {
        return Some(first);
    };
    while let Some((op, left)) = rest.pop() {
        acc = pair(left, pending, acc);
        pending = op;
    }
    Some(pair(first, pending, acc))
}

fn pair(left: Expression, op: BinaryOp, right: Expression) -> Expression {
    let span = left.span;
    Expression::new(
        ExpressionKind::OpPair {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

// ============================================================================
// Typing
// ============================================================================

/// The type `left op right` produces, or `None` when the operator is not
/// defined for those operands.
pub fn binary_result_type(left: &PType, op: BinaryOp, right: &PType) -> Option<PType> {
    use BinaryOp::*;

    if op.is_equality()
        && (left.root() == right.root()
            || (right.is_null() && left.is_nullable())
            || (left.is_null() && right.is_nullable()))
    {
        return Some(PType::bool());
    }

    let l = left.root();
    let r = right.root();
    let ty = match (l.as_str(), op, r.as_str()) {
        ("int", Add | Sub | Mul | Div | Mod | BitAnd | BitOr | BitXor | ShiftLeft | ShiftRight, "int") => {
            PType::int()
        }
        ("int" | "double", Add | Sub | Mul | Div | Mod, "int" | "double") => PType::double(),
        ("int" | "double", Less | Greater | LessEqual | GreaterEqual | Equal | NotEqual, "int" | "double") => {
            PType::bool()
        }
        ("bool", And | Or, "bool") => PType::bool(),
        ("char", Less | Greater | LessEqual | GreaterEqual, "char") => PType::bool(),
        ("string", Add, "string" | "bool" | "int" | "double" | "char")
        | ("bool" | "int" | "double" | "char", Add, "string") => PType::string(),
        _ => return None,
    };
    Some(ty)
}

/// The type a prefix operator produces.
pub fn unary_result_type(op: UnaryOp, operand: &PType) -> Option<PType> {
    match op {
        UnaryOp::Negate if operand.is_numeric() => Some(operand.clone()),
        UnaryOp::Not if operand.is_bool() => Some(PType::bool()),
        _ => None,
    }
}

// ============================================================================
// Folding
// ============================================================================

/// Fold `left op right` over two literals.
///
/// Returns `Ok(None)` when no folding rule applies, so the caller decides
/// whether that is an error.
pub fn fold_binary(
    left: &Constant,
    op: BinaryOp,
    right: &Constant,
    span: Span,
) -> Result<Option<Constant>, CompilationError> {
    use BinaryOp::*;
    use Constant::*;

    let value = match (left, right) {
        (Int(a), Int(b)) => {
            let (a, b) = (*a, *b);
            match op {
                Add => Int(a.wrapping_add(b)),
                Sub => Int(a.wrapping_sub(b)),
                Mul => Int(a.wrapping_mul(b)),
                Div if b == 0 => return Err(division_by_zero(span)),
                Div => Int(a.wrapping_div(b)),
                Mod if b == 0 => return Err(division_by_zero(span)),
                Mod => Int(a.wrapping_rem_euclid(b)),
                BitAnd => Int(a & b),
                BitOr => Int(a | b),
                BitXor => Int(a ^ b),
                ShiftLeft => Int(a.wrapping_shl(b as u32)),
                ShiftRight => Int(a.wrapping_shr(b as u32)),
                Equal => Bool(a == b),
                NotEqual => Bool(a != b),
                Less => Bool(a < b),
                Greater => Bool(a > b),
                LessEqual => Bool(a <= b),
                GreaterEqual => Bool(a >= b),
                And | Or => return Ok(None),
            }
        }
        (Int(_) | Float(_), Int(_) | Float(_)) => {
            let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                return Ok(None);
            };
            match op {
                Add => Constant::float(a + b),
                Sub => Constant::float(a - b),
                Mul => Constant::float(a * b),
                Div | Mod if b == 0.0 => return Err(division_by_zero(span)),
                Div => Constant::float(a / b),
                Mod => Constant::float(a % b),
                Equal => Bool(a == b),
                NotEqual => Bool(a != b),
                Less => Bool(a < b),
                Greater => Bool(a > b),
                LessEqual => Bool(a <= b),
                GreaterEqual => Bool(a >= b),
                _ => return Ok(None),
            }
        }
        (Bool(a), Bool(b)) => match op {
            And => Bool(*a && *b),
            Or => Bool(*a || *b),
            Equal => Bool(a == b),
            NotEqual => Bool(a != b),
            _ => return Ok(None),
        },
        (Char(a), Char(b)) => match op {
            Equal => Bool(a == b),
            NotEqual => Bool(a != b),
            Less => Bool(a < b),
            Greater => Bool(a > b),
            LessEqual => Bool(a <= b),
            GreaterEqual => Bool(a >= b),
            _ => return Ok(None),
        },
        (String(a), String(b)) => match op {
            Add => String(format!("{a}{b}")),
            Equal => Bool(a == b),
            NotEqual => Bool(a != b),
            _ => return Ok(None),
        },
        (String(a), other) if op == Add => match other.to_concat_string() {
            Some(b) => String(format!("{a}{b}")),
            None => return Ok(None),
        },
        (other, String(b)) if op == Add => match other.to_concat_string() {
            Some(a) => String(format!("{a}{b}")),
            None => return Ok(None),
        },
        (Null, Null) => match op {
            Equal => Bool(true),
            NotEqual => Bool(false),
            _ => return Ok(None),
        },
        (Null, String(_)) | (String(_), Null) => match op {
            Equal => Bool(false),
            NotEqual => Bool(true),
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// Fold a prefix operator over a literal.
pub fn fold_unary(op: UnaryOp, value: &Constant) -> Option<Constant> {
    match (op, value) {
        (UnaryOp::Negate, Constant::Int(i)) => Some(Constant::Int(i.wrapping_neg())),
        (UnaryOp::Negate, Constant::Float(f)) => Some(Constant::float(-f.0)),
        (UnaryOp::Not, Constant::Bool(b)) => Some(Constant::Bool(!b)),
        _ => None,
    }
}

fn division_by_zero(span: Span) -> CompilationError {
    CompilationError::DivisionByZero {
        message: "Division by zero.".to_string(),
        span,
    }
}
