//! Literal values carried by inline constants.

use std::fmt;

use ordered_float::OrderedFloat;

use crate::PType;

/// A compile-time literal value.
///
/// Floats are wrapped in [`OrderedFloat`] so that constants can be compared and
/// hashed, which switch-case duplicate detection relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    /// A 32-bit integer. Folding uses wrapping arithmetic.
    Int(i32),
    /// A double-precision float.
    Float(OrderedFloat<f64>),
    /// A boolean.
    Bool(bool),
    /// A single character.
    Char(char),
    /// A string.
    String(String),
    /// The null reference.
    Null,
}

impl Constant {
    /// Create a float constant.
    pub fn float(value: f64) -> Self {
        Constant::Float(OrderedFloat(value))
    }

    /// The type of this literal.
    pub fn ptype(&self) -> PType {
        match self {
            Constant::Int(_) => PType::int(),
            Constant::Float(_) => PType::double(),
            Constant::Bool(_) => PType::bool(),
            Constant::Char(_) => PType::char(),
            Constant::String(_) => PType::string(),
            Constant::Null => PType::null(),
        }
    }

    /// The boolean value, if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Constant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer value, if this is an int.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Constant::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The numeric value of an int or float as a double.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Constant::Int(i) => Some(f64::from(*i)),
            Constant::Float(f) => Some(f.0),
            _ => None,
        }
    }

    /// The text this value contributes to a string concatenation.
    ///
    /// Returns `None` for null, which cannot be concatenated.
    pub fn to_concat_string(&self) -> Option<String> {
        match self {
            Constant::Int(i) => Some(i.to_string()),
            Constant::Float(f) => Some(float_to_string(f.0)),
            Constant::Bool(b) => Some(b.to_string()),
            Constant::Char(c) => Some(c.to_string()),
            Constant::String(s) => Some(s.clone()),
            Constant::Null => None,
        }
    }
}

/// Render a double in its shortest round-trip form, always with a decimal point.
pub fn float_to_string(value: f64) -> String {
    let text = format!("{value}");
    if value.is_finite() && !text.contains('.') && !text.contains('e') {
        format!("{text}.0")
    } else {
        text
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(i) => write!(f, "{i}"),
            Constant::Float(v) => write!(f, "{}", float_to_string(v.0)),
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Char(c) => write!(f, "{c:?}"),
            Constant::String(s) => write!(f, "{s:?}"),
            Constant::Null => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_strings() {
        assert_eq!(Constant::Int(-4).to_concat_string().as_deref(), Some("-4"));
        assert_eq!(Constant::Bool(true).to_concat_string().as_deref(), Some("true"));
        assert_eq!(Constant::Char('x').to_concat_string().as_deref(), Some("x"));
        assert_eq!(Constant::float(2.0).to_concat_string().as_deref(), Some("2.0"));
        assert_eq!(Constant::float(0.25).to_concat_string().as_deref(), Some("0.25"));
        assert_eq!(Constant::Null.to_concat_string(), None);
    }

    #[test]
    fn floats_hash_and_compare() {
        use rustc_hash::FxHashSet;

        let mut seen = FxHashSet::default();
        assert!(seen.insert(Constant::float(1.5)));
        assert!(!seen.insert(Constant::float(1.5)));
        assert!(seen.insert(Constant::Int(1)));
    }

    #[test]
    fn literal_types() {
        assert_eq!(Constant::Int(1).ptype().name(), "int");
        assert_eq!(Constant::float(1.0).ptype().name(), "double");
        assert!(Constant::Null.ptype().is_null());
    }
}
