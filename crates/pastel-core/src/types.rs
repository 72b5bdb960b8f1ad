//! The Pastel type model.
//!
//! A [`PType`] is an immutable value describing a type as written in source:
//! an optional namespace, a root name, and generic arguments. Its
//! [`TypeCategory`] and nullability are derived from the root name and the
//! generic arity when the type is constructed.
//!
//! ## Struct identity
//!
//! User types (structs and classes) are identified through a closed
//! [`TypeIndex`] built before any type is finalized. [`PType::finalize`]
//! returns a copy of the type with its [`TypeRef`] binding filled in, so two
//! types parsed from separate references compare identical because they bind
//! to the same id. Finalization is a pure function of the index and is
//! idempotent.
//!
//! ## Example
//!
//! ```
//! use pastel_core::{EmptyTypeIndex, PType};
//!
//! let list = PType::list(PType::string());
//! assert_eq!(list.to_string(), "List<string>");
//! assert!(list.is_nullable());
//! assert!(PType::check_assignment(&list, &PType::null(), &EmptyTypeIndex));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::{CompilationError, ParseError, Span};

/// Identifies a struct in a [`TypeIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructId(pub u32);

/// Identifies a class in a [`TypeIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

/// A resolved reference to a user-defined type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    Struct(StructId),
    Class(ClassId),
}

/// Name lookup for user-defined types.
///
/// Implemented by the compiler once every struct and class is registered.
/// Parent links may be absent until the hierarchy stages have run.
pub trait TypeIndex {
    /// Find a struct or class by name.
    fn lookup(&self, name: &str) -> Option<TypeRef>;

    /// The parent of a struct or class, if it has one.
    fn parent_of(&self, ty: TypeRef) -> Option<TypeRef>;
}

/// A [`TypeIndex`] with no user types, for contexts that only see builtins.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyTypeIndex;

impl TypeIndex for EmptyTypeIndex {
    fn lookup(&self, _name: &str) -> Option<TypeRef> {
        None
    }

    fn parent_of(&self, _ty: TypeRef) -> Option<TypeRef> {
        None
    }
}

/// Placeholder bindings collected while unifying one call site.
pub type TemplateBindings = BTreeMap<String, PType>;

/// The broad kind of a type, derived from its root name and generic arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Primitive,
    Struct,
    Array,
    List,
    Dictionary,
    Null,
    Void,
    Object,
    Template,
    Function,
    CoreFunction,
    Unknown,
}

/// Root names that are primitives.
const PRIMITIVES: &[&str] = &[
    "int",
    "char",
    "double",
    "bool",
    "string",
    "number",
    "byte",
    "StringBuilder",
];

/// Root name of the sentinel type given to unresolved core function references.
const CORE_FUNCTION_ROOT: &str = "@CoreFunc";

/// A Pastel type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PType {
    category: TypeCategory,
    namespace: Option<String>,
    name: String,
    generics: Vec<PType>,
    nullable: bool,
    has_templates: bool,
    binding: Option<TypeRef>,
}

impl PType {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Build a type from its parts, deriving category and nullability.
    ///
    /// Fails when the generic arity does not fit the root name.
    pub fn new(
        namespace: Option<String>,
        name: impl Into<String>,
        generics: Vec<PType>,
        span: Span,
    ) -> Result<Self, ParseError> {
        let name = name.into();
        let root = match &namespace {
            Some(ns) => format!("{ns}.{name}"),
            None => name.clone(),
        };

        let category = match (generics.len(), root.as_str()) {
            (1, "List") => TypeCategory::List,
            (1, "Array") => TypeCategory::Array,
            (1, "Func") => TypeCategory::Function,
            (1, _) => {
                return Err(ParseError::invalid_type(
                    span,
                    "A generic cannot be applied to this type.",
                ));
            }
            (2, "Dictionary") => TypeCategory::Dictionary,
            (2, "Func") => TypeCategory::Function,
            (2, _) => {
                return Err(ParseError::invalid_type(
                    span,
                    "Two generics cannot be applied to this type.",
                ));
            }
            (_, "Func") if generics.len() > 2 => TypeCategory::Function,
            (n, _) if n > 2 => {
                return Err(ParseError::invalid_type(span, "Invalid number of generics."));
            }
            (_, "List" | "Array" | "Dictionary") => {
                return Err(ParseError::invalid_type(
                    span,
                    "This type requires generics",
                ));
            }
            (_, root) => Self::category_of_bare_root(root),
        };

        Ok(Self::from_parts(category, namespace, name, generics))
    }

    fn category_of_bare_root(root: &str) -> TypeCategory {
        match root {
            "null" => TypeCategory::Null,
            "object" => TypeCategory::Object,
            "void" => TypeCategory::Void,
            CORE_FUNCTION_ROOT => TypeCategory::CoreFunction,
            r if PRIMITIVES.contains(&r) => TypeCategory::Primitive,
            r if r.chars().count() == 1 => TypeCategory::Template,
            _ => TypeCategory::Struct,
        }
    }

    fn from_parts(
        category: TypeCategory,
        namespace: Option<String>,
        name: String,
        generics: Vec<PType>,
    ) -> Self {
        let nullable = match category {
            TypeCategory::Struct
            | TypeCategory::Array
            | TypeCategory::List
            | TypeCategory::Dictionary
            | TypeCategory::Function
            | TypeCategory::Object
            | TypeCategory::Null => true,
            TypeCategory::Primitive => name == "string" || name == "StringBuilder",
            _ => false,
        };
        let has_templates =
            category == TypeCategory::Template || generics.iter().any(|g| g.has_templates);

        Self {
            category,
            namespace,
            name,
            generics,
            nullable,
            has_templates,
            binding: None,
        }
    }

    /// A bare, non-generic type by root name.
    ///
    /// Names that would require generics produce an `Unknown` type.
    pub fn named(name: &str) -> Self {
        let category = match name {
            "List" | "Array" | "Dictionary" | "Func" => TypeCategory::Unknown,
            other => Self::category_of_bare_root(other),
        };
        Self::from_parts(category, None, name.to_string(), Vec::new())
    }

    pub fn int() -> Self {
        Self::named("int")
    }

    pub fn double() -> Self {
        Self::named("double")
    }

    pub fn bool() -> Self {
        Self::named("bool")
    }

    pub fn char() -> Self {
        Self::named("char")
    }

    pub fn string() -> Self {
        Self::named("string")
    }

    pub fn void() -> Self {
        Self::named("void")
    }

    pub fn null() -> Self {
        Self::named("null")
    }

    pub fn object() -> Self {
        Self::named("object")
    }

    /// The sentinel type of a core function reference that has not been invoked yet.
    pub fn core_function() -> Self {
        Self::named(CORE_FUNCTION_ROOT)
    }

    /// `List<item>`.
    pub fn list(item: PType) -> Self {
        Self::from_parts(TypeCategory::List, None, "List".to_string(), vec![item])
    }

    /// `Array<item>`.
    pub fn array(item: PType) -> Self {
        Self::from_parts(TypeCategory::Array, None, "Array".to_string(), vec![item])
    }

    /// `Dictionary<key, value>`.
    pub fn dictionary(key: PType, value: PType) -> Self {
        Self::from_parts(
            TypeCategory::Dictionary,
            None,
            "Dictionary".to_string(),
            vec![key, value],
        )
    }

    /// `Func<return, args...>`.
    pub fn function_of(return_type: PType, args: impl IntoIterator<Item = PType>) -> Self {
        let mut generics = vec![return_type];
        generics.extend(args);
        Self::from_parts(TypeCategory::Function, None, "Func".to_string(), generics)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn category(&self) -> TypeCategory {
        self.category
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The type name without its namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespaced root name, e.g. `Ns.Name`.
    pub fn root(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn generics(&self) -> &[PType] {
        &self.generics
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether this type or any of its generics is a template placeholder.
    pub fn has_templates(&self) -> bool {
        self.has_templates
    }

    /// The user type this type was bound to by [`PType::finalize`].
    pub fn binding(&self) -> Option<TypeRef> {
        self.binding
    }

    pub fn is_struct(&self) -> bool {
        self.category == TypeCategory::Struct
    }

    pub fn is_template(&self) -> bool {
        self.category == TypeCategory::Template
    }

    pub fn is_null(&self) -> bool {
        self.category == TypeCategory::Null
    }

    pub fn is_void(&self) -> bool {
        self.category == TypeCategory::Void
    }

    pub fn is_object(&self) -> bool {
        self.category == TypeCategory::Object
    }

    pub fn is_function(&self) -> bool {
        self.category == TypeCategory::Function
    }

    pub fn is_core_function(&self) -> bool {
        self.category == TypeCategory::CoreFunction
    }

    /// Whether this is the primitive with the given name.
    pub fn is_primitive(&self, name: &str) -> bool {
        self.category == TypeCategory::Primitive && self.namespace.is_none() && self.name == name
    }

    pub fn is_int(&self) -> bool {
        self.is_primitive("int")
    }

    pub fn is_double(&self) -> bool {
        self.is_primitive("double")
    }

    pub fn is_bool(&self) -> bool {
        self.is_primitive("bool")
    }

    pub fn is_char(&self) -> bool {
        self.is_primitive("char")
    }

    pub fn is_string(&self) -> bool {
        self.is_primitive("string")
    }

    /// Whether this is `int` or `double`.
    pub fn is_numeric(&self) -> bool {
        self.is_int() || self.is_double()
    }

    /// The declared return type of a `Func` type.
    pub fn function_return_type(&self) -> Option<&PType> {
        if self.is_function() {
            self.generics.first()
        } else {
            None
        }
    }

    /// The declared argument types of a `Func` type.
    pub fn function_arg_types(&self) -> &[PType] {
        if self.is_function() && !self.generics.is_empty() {
            &self.generics[1..]
        } else {
            &[]
        }
    }

    // ========================================================================
    // Finalization
    // ========================================================================

    /// Bind every struct-like name in this type (and its generics) against the index.
    ///
    /// Unknown names are a hard error positioned at `span`.
    pub fn finalize(&self, index: &dyn TypeIndex, span: Span) -> Result<PType, CompilationError> {
        let mut out = self.clone();
        if self.is_struct() {
            let root = self.root();
            let binding = index
                .lookup(&root)
                .ok_or_else(|| CompilationError::unknown_type(span, root))?;
            out.binding = Some(binding);
        }
        out.generics = self
            .generics
            .iter()
            .map(|g| g.finalize(index, span))
            .collect::<Result<_, _>>()?;
        Ok(out)
    }

    /// The user type this type refers to, consulting the index when unbound.
    pub fn type_ref(&self, index: &dyn TypeIndex) -> Option<TypeRef> {
        if !self.is_struct() {
            return None;
        }
        self.binding.or_else(|| index.lookup(&self.root()))
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    /// Structural identity. `number` matches both `int` and `double`.
    pub fn is_identical(&self, other: &PType, index: &dyn TypeIndex) -> bool {
        if self.category != other.category || self.generics.len() != other.generics.len() {
            return false;
        }

        if self.is_struct() {
            return match (self.type_ref(index), other.type_ref(index)) {
                (Some(a), Some(b)) => a == b,
                _ => self.root() == other.root(),
            };
        }

        let this_root = self.root();
        let that_root = other.root();
        if this_root != that_root {
            let numeric = |r: &str| r == "int" || r == "double";
            return (this_root == "number" && numeric(&that_root))
                || (that_root == "number" && numeric(&this_root));
        }

        self.generics
            .iter()
            .zip(&other.generics)
            .all(|(a, b)| a.is_identical(b, index))
    }

    /// Identical, or a struct-like type whose parent chain reaches `other`.
    pub fn is_identical_or_child_of(&self, other: &PType, index: &dyn TypeIndex) -> bool {
        if self.is_identical(other, index) {
            return true;
        }
        if !self.is_struct() || !other.is_struct() {
            return false;
        }
        let (Some(mut walker), Some(target)) = (self.type_ref(index), other.type_ref(index))
        else {
            return false;
        };
        // A malformed index could loop; the hierarchy stages reject cycles first.
        let mut steps = 0usize;
        loop {
            if walker == target {
                return true;
            }
            match index.parent_of(walker) {
                Some(parent) if steps < 10_000 => {
                    walker = parent;
                    steps += 1;
                }
                _ => return false,
            }
        }
    }

    /// Whether `value` may be returned from a function declared to return `return_type`.
    ///
    /// `int` never widens to `double` implicitly.
    pub fn check_return_type(return_type: &PType, value: &PType, index: &dyn TypeIndex) -> bool {
        if value.is_identical_or_child_of(return_type, index) {
            return true;
        }
        if return_type.is_object() {
            return true;
        }
        if return_type.is_void() {
            return false;
        }
        value.is_null()
            && (return_type.is_string() || !return_type.generics.is_empty() || return_type.is_struct())
    }

    /// Whether `value` may be stored into a slot of type `target`.
    pub fn check_assignment(target: &PType, value: &PType, index: &dyn TypeIndex) -> bool {
        if target.is_void() {
            return false;
        }
        Self::check_return_type(target, value, index)
    }

    /// Unify a declared (possibly templated) type against an actual value type.
    ///
    /// Placeholders seen for the first time are bound in `bindings`. A placeholder
    /// that is already bound must match its binding.
    pub fn check_assignment_with_template_output(
        declared: &PType,
        actual: &PType,
        bindings: &mut TemplateBindings,
        index: &dyn TypeIndex,
    ) -> bool {
        if declared.is_object() {
            return true;
        }

        if actual.is_identical_or_child_of(declared, index) {
            return true;
        }

        if declared.is_template() {
            let key = declared.root();
            return match bindings.get(&key) {
                Some(required) => {
                    actual.is_identical_or_child_of(required, index)
                        || (actual.is_null() && required.is_nullable())
                }
                None => {
                    bindings.insert(key, actual.clone());
                    true
                }
            };
        }

        if actual.is_null() && declared.is_nullable() {
            return true;
        }

        if declared.generics.len() != actual.generics.len() || declared.root() != actual.root() {
            return false;
        }

        declared
            .generics
            .iter()
            .zip(&actual.generics)
            .all(|(d, a)| Self::check_assignment_with_template_output(d, a, bindings, index))
    }

    /// Substitute bound placeholders. Unbound placeholders are left in place.
    pub fn resolve_templates(&self, bindings: &TemplateBindings) -> PType {
        if !self.has_templates {
            return self.clone();
        }
        if self.is_template() {
            return bindings
                .get(&self.root())
                .cloned()
                .unwrap_or_else(|| self.clone());
        }
        let generics = self
            .generics
            .iter()
            .map(|g| g.resolve_templates(bindings))
            .collect();
        let mut out = Self::from_parts(self.category, self.namespace.clone(), self.name.clone(), generics);
        out.binding = self.binding;
        out
    }
}

impl fmt::Display for PType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{ns}.")?;
        }
        write!(f, "{}", self.name)?;
        if !self.generics.is_empty() {
            write!(f, "<")?;
            for (i, g) in self.generics.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{g}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}
