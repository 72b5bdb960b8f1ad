//! Operator definitions for Pastel expressions and assignments.
//!
//! Operators are kept as small `Copy` enums so the resolver can match on
//! them instead of comparing token text. Each enum converts from the token
//! text the parser sees and displays back as that text.

use std::fmt;

/// Binary operators.
///
/// Organized by precedence tier from loosest to tightest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Boolean combination
    /// `&&`
    And,
    /// `||`
    Or,

    // Bitwise
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,

    // Equality
    /// `==`
    Equal,
    /// `!=`
    NotEqual,

    // Relational
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,

    // Bit shift
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,

    // Additive
    /// `+`
    Add,
    /// `-`
    Sub,

    // Multiplicative
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
}

impl BinaryOp {
    /// Convert token text to a binary operator.
    pub fn from_text(text: &str) -> Option<Self> {
        use BinaryOp::*;
        Some(match text {
            "&&" => And,
            "||" => Or,
            "&" => BitAnd,
            "|" => BitOr,
            "^" => BitXor,
            "==" => Equal,
            "!=" => NotEqual,
            "<" => Less,
            ">" => Greater,
            "<=" => LessEqual,
            ">=" => GreaterEqual,
            "<<" => ShiftLeft,
            ">>" => ShiftRight,
            "+" => Add,
            "-" => Sub,
            "*" => Mul,
            "/" => Div,
            "%" => Mod,
            _ => return None,
        })
    }

    /// The source text of this operator.
    pub fn as_str(&self) -> &'static str {
        use BinaryOp::*;
        match self {
            And => "&&",
            Or => "||",
            BitAnd => "&",
            BitOr => "|",
            BitXor => "^",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            Greater => ">",
            LessEqual => "<=",
            GreaterEqual => ">=",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
        }
    }

    /// `&&` or `||`. These fold right-associatively.
    pub fn is_boolean_combination(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// `==` or `!=`.
    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Equal | BinaryOp::NotEqual)
    }

    /// `<`, `>`, `<=` or `>=`.
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual
        )
    }

    /// Bitwise and shift operators, which only apply to integers.
    pub fn is_integer_only(&self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::ShiftLeft
                | BinaryOp::ShiftRight
                | BinaryOp::Mod
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prefix unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-`
    Negate,
    /// `!`
    Not,
}

impl UnaryOp {
    /// Convert token text to a unary operator.
    pub fn from_text(text: &str) -> Option<Self> {
        match text {
            "-" => Some(UnaryOp::Negate),
            "!" => Some(UnaryOp::Not),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `++` or `--`, in prefix or postfix position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncrementOp {
    Increment,
    Decrement,
}

impl IncrementOp {
    pub fn from_text(text: &str) -> Option<Self> {
        match text {
            "++" => Some(IncrementOp::Increment),
            "--" => Some(IncrementOp::Decrement),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IncrementOp::Increment => "++",
            IncrementOp::Decrement => "--",
        }
    }
}

impl fmt::Display for IncrementOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
    /// `%=`
    Mod,
    /// `&=`
    BitAnd,
    /// `|=`
    BitOr,
    /// `^=`
    BitXor,
}

impl AssignOp {
    /// Convert token text to an assignment operator.
    pub fn from_text(text: &str) -> Option<Self> {
        use AssignOp::*;
        Some(match text {
            "=" => Assign,
            "+=" => Add,
            "-=" => Sub,
            "*=" => Mul,
            "/=" => Div,
            "%=" => Mod,
            "&=" => BitAnd,
            "|=" => BitOr,
            "^=" => BitXor,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        use AssignOp::*;
        match self {
            Assign => "=",
            Add => "+=",
            Sub => "-=",
            Mul => "*=",
            Div => "/=",
            Mod => "%=",
            BitAnd => "&=",
            BitOr => "|=",
            BitXor => "^=",
        }
    }

    /// The binary operator an incremental assignment applies, if any.
    pub fn binary_op(&self) -> Option<BinaryOp> {
        use AssignOp::*;
        match self {
            Assign => None,
            Add => Some(BinaryOp::Add),
            Sub => Some(BinaryOp::Sub),
            Mul => Some(BinaryOp::Mul),
            Div => Some(BinaryOp::Div),
            Mod => Some(BinaryOp::Mod),
            BitAnd => Some(BinaryOp::BitAnd),
            BitOr => Some(BinaryOp::BitOr),
            BitXor => Some(BinaryOp::BitXor),
        }
    }

    /// Whether this is anything other than plain `=`.
    pub fn is_incremental(&self) -> bool {
        *self != AssignOp::Assign
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_text_round_trip() {
        for text in ["&&", "|", "==", "<=", "<<", ">>", "%"] {
            assert_eq!(BinaryOp::from_text(text).map(|op| op.as_str()), Some(text));
        }
        assert_eq!(BinaryOp::from_text("="), None);
    }

    #[test]
    fn incremental_assignment_maps_to_binary() {
        assert_eq!(AssignOp::from_text("+="), Some(AssignOp::Add));
        assert_eq!(AssignOp::Add.binary_op(), Some(BinaryOp::Add));
        assert_eq!(AssignOp::Assign.binary_op(), None);
        assert!(AssignOp::Mod.is_incremental());
        assert!(!AssignOp::Assign.is_incremental());
    }

    #[test]
    fn categories() {
        assert!(BinaryOp::Or.is_boolean_combination());
        assert!(BinaryOp::GreaterEqual.is_relational());
        assert!(BinaryOp::ShiftRight.is_integer_only());
        assert!(!BinaryOp::Add.is_integer_only());
    }
}
