//! Objects and constants

use std::collections::HashMap;

use super::{TypeHierarchy, TypeId};

/// Index of an object in an [`ObjectTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(pub usize);

/// An object with its most specific type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDecl {
    pub name: String,
    pub ty: TypeId,
}

/// Declared objects in declaration order.
///
/// A problem's table starts as a copy of its domain's constants, so constant
/// ids stay valid once problem objects are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectTable {
    objects: Vec<ObjectDecl>,
    index: HashMap<String, ObjectId>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object. Returns the existing id if the name is taken.
    pub fn insert(&mut self, name: impl Into<String>, ty: TypeId) -> Result<ObjectId, ObjectId> {
        let name = name.into();
        if let Some(&id) = self.index.get(&name) {
            return Err(id);
        }
        let id = ObjectId(self.objects.len());
        self.index.insert(name.clone(), id);
        self.objects.push(ObjectDecl { name, ty });
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<ObjectId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, id: ObjectId) -> &ObjectDecl {
        &self.objects[id.0]
    }

    pub fn name(&self, id: ObjectId) -> &str {
        &self.objects[id.0].name
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &ObjectDecl)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, decl)| (ObjectId(i), decl))
    }

    /// The type extension of `ty`: every object whose type is `ty` or a
    /// subtype of it, in declaration order.
    pub fn of_type(&self, types: &TypeHierarchy, ty: TypeId) -> Vec<ObjectId> {
        self.iter()
            .filter(|(_, decl)| types.is_subtype(decl.ty, ty))
            .map(|(id, _)| id)
            .collect()
    }
}
