//! Object type hierarchy

use std::collections::HashMap;

use thiserror::Error;

/// Index of a type in a [`TypeHierarchy`]. `TypeId(0)` is always `object`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub usize);

/// Errors raised while building a type hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeHierarchyError {
    #[error("declaring {child} as a subtype of {parent} creates a cycle")]
    Cycle { child: String, parent: String },

    #[error("type {child} is already a subtype of {existing}, cannot also extend {parent}")]
    ConflictingParent {
        child: String,
        existing: String,
        parent: String,
    },

    #[error("the root type object cannot have a parent")]
    RootHasParent,
}

/// Single-inheritance hierarchy of object sorts.
///
/// Every type other than `object` has exactly one parent; types declared
/// without an explicit parent extend `object`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHierarchy {
    names: Vec<String>,
    parents: Vec<Option<TypeId>>,
    index: HashMap<String, TypeId>,
}

impl Default for TypeHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeHierarchy {
    /// The implicit root type.
    pub const OBJECT: TypeId = TypeId(0);

    pub fn new() -> Self {
        let mut index = HashMap::new();
        index.insert("object".to_string(), Self::OBJECT);
        Self {
            names: vec!["object".to_string()],
            parents: vec![None],
            index,
        }
    }

    /// Returns the id of `name`, declaring it under `object` if unknown.
    pub fn declare(&mut self, name: &str) -> TypeId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = TypeId(self.names.len());
        self.names.push(name.to_string());
        self.parents.push(None);
        self.index.insert(name.to_string(), id);
        id
    }

    /// Makes `parent` the direct supertype of `child`.
    ///
    /// Re-stating an existing edge is accepted. Extending `object` is a no-op
    /// for types without an explicit parent.
    pub fn set_parent(&mut self, child: TypeId, parent: TypeId) -> Result<(), TypeHierarchyError> {
        if child == Self::OBJECT {
            return if parent == Self::OBJECT {
                Ok(())
            } else {
                Err(TypeHierarchyError::RootHasParent)
            };
        }
        match self.parents[child.0] {
            Some(existing) if existing == parent => return Ok(()),
            Some(existing) if parent != Self::OBJECT => {
                return Err(TypeHierarchyError::ConflictingParent {
                    child: self.name(child).to_string(),
                    existing: self.name(existing).to_string(),
                    parent: self.name(parent).to_string(),
                });
            }
            Some(_) => return Ok(()),
            None => {}
        }
        if self.is_subtype(parent, child) {
            return Err(TypeHierarchyError::Cycle {
                child: self.name(child).to_string(),
                parent: self.name(parent).to_string(),
            });
        }
        if parent != Self::OBJECT {
            self.parents[child.0] = Some(parent);
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: TypeId) -> &str {
        &self.names[id.0]
    }

    /// Direct supertype, `None` only for `object`.
    pub fn parent(&self, id: TypeId) -> Option<TypeId> {
        if id == Self::OBJECT {
            None
        } else {
            Some(self.parents[id.0].unwrap_or(Self::OBJECT))
        }
    }

    /// Returns true if `sub` equals `sup` or transitively extends it.
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        let mut current = Some(sub);
        // The hierarchy is acyclic, so a walk is bounded by its size.
        for _ in 0..=self.names.len() {
            match current {
                Some(ty) if ty == sup => return true,
                Some(ty) => current = self.parent(ty),
                None => return false,
            }
        }
        false
    }

    /// Returns true if the two types share a chain (one extends the other).
    pub fn compatible(&self, a: TypeId, b: TypeId) -> bool {
        self.is_subtype(a, b) || self.is_subtype(b, a)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (TypeId(i), name.as_str()))
    }
}
