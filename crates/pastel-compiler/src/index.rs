//! The closed type index of one compilation unit.
//!
//! Built once, before any type is finalized, from the struct and class
//! tables: every struct gets a [`StructId`] and every class a [`ClassId`]
//! in name order. Parent links start out empty and are filled in by the
//! hierarchy stages. No new names are ever added after construction, so a
//! [`PType`](pastel_core::PType) finalized against this index stays valid
//! for the lifetime of the program.

use rustc_hash::FxHashMap;

use pastel_core::{ClassId, StructId, TypeIndex, TypeRef};

use crate::tables::ProgramTables;

/// Name to id lookup for every struct and class, plus their parents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramIndex {
    names: FxHashMap<String, TypeRef>,
    struct_names: Vec<String>,
    class_names: Vec<String>,
    struct_parents: Vec<Option<StructId>>,
    class_parents: Vec<Option<ClassId>>,
}

impl ProgramIndex {
    /// Assign ids to every struct and class in the tables.
    pub fn build(tables: &ProgramTables) -> Self {
        let mut index = Self::default();

        for (i, name) in tables.structs.keys().enumerate() {
            let id = StructId(i as u32);
            index.names.insert(name.clone(), TypeRef::Struct(id));
            index.struct_names.push(name.clone());
        }
        for (i, name) in tables.classes.keys().enumerate() {
            let id = ClassId(i as u32);
            index.names.insert(name.clone(), TypeRef::Class(id));
            index.class_names.push(name.clone());
        }

        index.struct_parents = vec![None; index.struct_names.len()];
        index.class_parents = vec![None; index.class_names.len()];
        index
    }

    // =========================================
    // Lookups
    // =========================================

    pub fn struct_id(&self, name: &str) -> Option<StructId> {
        match self.names.get(name) {
            Some(TypeRef::Struct(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        match self.names.get(name) {
            Some(TypeRef::Class(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn struct_name(&self, id: StructId) -> Option<&str> {
        self.struct_names.get(id.0 as usize).map(String::as_str)
    }

    pub fn class_name(&self, id: ClassId) -> Option<&str> {
        self.class_names.get(id.0 as usize).map(String::as_str)
    }

    pub fn struct_count(&self) -> usize {
        self.struct_names.len()
    }

    pub fn class_count(&self) -> usize {
        self.class_names.len()
    }

    pub fn struct_parent(&self, id: StructId) -> Option<StructId> {
        self.struct_parents.get(id.0 as usize).copied().flatten()
    }

    pub fn class_parent(&self, id: ClassId) -> Option<ClassId> {
        self.class_parents.get(id.0 as usize).copied().flatten()
    }

    /// The class itself followed by each ancestor, nearest first.
    ///
    /// Only meaningful once the class hierarchy has been checked for cycles.
    pub fn class_chain(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.class_parent(current) {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    // =========================================
    // Hierarchy binding
    // =========================================

    pub(crate) fn set_struct_parent(&mut self, id: StructId, parent: StructId) {
        if let Some(slot) = self.struct_parents.get_mut(id.0 as usize) {
            *slot = Some(parent);
        }
    }

    pub(crate) fn set_class_parent(&mut self, id: ClassId, parent: ClassId) {
        if let Some(slot) = self.class_parents.get_mut(id.0 as usize) {
            *slot = Some(parent);
        }
    }
}

impl TypeIndex for ProgramIndex {
    fn lookup(&self, name: &str) -> Option<TypeRef> {
        self.names.get(name).copied()
    }

    fn parent_of(&self, ty: TypeRef) -> Option<TypeRef> {
        match ty {
            TypeRef::Struct(id) => self.struct_parent(id).map(TypeRef::Struct),
            TypeRef::Class(id) => self.class_parent(id).map(TypeRef::Class),
        }
    }
}
