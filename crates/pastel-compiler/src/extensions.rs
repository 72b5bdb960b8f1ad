//! Host-provided extensible functions.
//!
//! Code generators can offer functions that Pastel source calls as
//! `Extension.name(args)`. The front end only type-checks those calls; the
//! `translation` text is carried along untouched for the generator.

use std::collections::BTreeMap;

use pastel_core::PType;

/// One extensible function.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensibleFunction {
    pub name: String,
    pub return_type: PType,
    pub arg_types: Vec<PType>,
    /// Target-specific replacement text, opaque to the compiler.
    pub translation: String,
}

impl ExtensibleFunction {
    pub fn new(
        name: impl Into<String>,
        return_type: PType,
        arg_types: Vec<PType>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            return_type,
            arg_types,
            translation: translation.into(),
        }
    }
}

/// Extensible functions by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionSet {
    functions: BTreeMap<String, ExtensibleFunction>,
}

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function, replacing any earlier one with the same name.
    pub fn with(mut self, function: ExtensibleFunction) -> Self {
        self.insert(function);
        self
    }

    pub fn insert(&mut self, function: ExtensibleFunction) {
        self.functions.insert(function.name.clone(), function);
    }

    pub fn get(&self, name: &str) -> Option<&ExtensibleFunction> {
        self.functions.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtensibleFunction> {
        self.functions.values()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
