//! Lifted planning declarations
//!
//! Everything here is produced once by the parser and is immutable
//! afterwards:
//! - `TypeHierarchy`: single-inheritance object sorts rooted at `object`
//! - `ObjectTable`: domain constants followed by problem objects
//! - `Domain`: signatures and action schemas
//! - `Problem`: objects, initial state, goal and optional deadline

mod objects;
mod problem;
mod requirements;
mod schema;
mod types;

#[cfg(test)]
mod tests;

pub use objects::{ObjectDecl, ObjectId, ObjectTable};
pub use problem::{GroundAtom, GroundFluent, Metric, MetricDirection, MetricTerm, Problem};
pub use requirements::{Requirement, Requirements};
pub use schema::{
    ActionSchema, AtomTemplate, Condition, DurationConstraint, Effect, EffectTiming,
    FluentTemplate, LiftedExpr, Term, TimedCondition, TimedEffect, Timing,
};
pub use types::{TypeHierarchy, TypeHierarchyError, TypeId};

use std::collections::HashMap;

/// Index of a predicate in [`Domain::predicates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PredicateId(pub usize);

/// Index of a numeric function in [`Domain::functions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub usize);

/// A named, typed parameter (`?x - truck`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedParameter {
    pub name: String,
    pub ty: TypeId,
}

impl TypedParameter {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Name and ordered typed parameters of a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateSignature {
    pub name: String,
    pub params: Vec<TypedParameter>,
}

impl PredicateSignature {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Name and ordered typed parameters of a numeric function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<TypedParameter>,
}

impl FunctionSignature {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// A parsed and validated planning domain.
#[derive(Debug, Clone)]
pub struct Domain {
    pub name: String,
    pub requirements: Requirements,
    pub types: TypeHierarchy,
    pub constants: ObjectTable,
    pub predicates: Vec<PredicateSignature>,
    pub functions: Vec<FunctionSignature>,
    pub actions: Vec<ActionSchema>,
    predicate_index: HashMap<String, PredicateId>,
    function_index: HashMap<String, FunctionId>,
}

impl Domain {
    /// Creates an empty domain with only the `object` root type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: Requirements::default(),
            types: TypeHierarchy::new(),
            constants: ObjectTable::new(),
            predicates: Vec::new(),
            functions: Vec::new(),
            actions: Vec::new(),
            predicate_index: HashMap::new(),
            function_index: HashMap::new(),
        }
    }

    /// Declares a predicate. Returns the existing id if the name is taken.
    pub fn add_predicate(&mut self, signature: PredicateSignature) -> Result<PredicateId, PredicateId> {
        if let Some(&id) = self.predicate_index.get(&signature.name) {
            return Err(id);
        }
        let id = PredicateId(self.predicates.len());
        self.predicate_index.insert(signature.name.clone(), id);
        self.predicates.push(signature);
        Ok(id)
    }

    /// Declares a numeric function. Returns the existing id if the name is taken.
    pub fn add_function(&mut self, signature: FunctionSignature) -> Result<FunctionId, FunctionId> {
        if let Some(&id) = self.function_index.get(&signature.name) {
            return Err(id);
        }
        let id = FunctionId(self.functions.len());
        self.function_index.insert(signature.name.clone(), id);
        self.functions.push(signature);
        Ok(id)
    }

    pub fn lookup_predicate(&self, name: &str) -> Option<PredicateId> {
        self.predicate_index.get(name).copied()
    }

    pub fn lookup_function(&self, name: &str) -> Option<FunctionId> {
        self.function_index.get(name).copied()
    }

    pub fn predicate(&self, id: PredicateId) -> &PredicateSignature {
        &self.predicates[id.0]
    }

    pub fn function(&self, id: FunctionId) -> &FunctionSignature {
        &self.functions[id.0]
    }

    pub fn action(&self, name: &str) -> Option<&ActionSchema> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Returns true if any action schema is durative.
    pub fn has_durative_actions(&self) -> bool {
        self.actions.iter().any(ActionSchema::is_durative)
    }

    /// Predicates that no action effect ever adds or deletes.
    pub fn static_predicates(&self) -> Vec<bool> {
        let mut is_static = vec![true; self.predicates.len()];
        for action in &self.actions {
            for timed in &action.effects {
                match &timed.effect {
                    Effect::Add(atom) | Effect::Delete(atom) => {
                        is_static[atom.predicate.0] = false;
                    }
                    Effect::Numeric { .. } => {}
                }
            }
        }
        is_static
    }

    /// Functions that no action effect ever changes.
    pub fn static_functions(&self) -> Vec<bool> {
        let mut is_static = vec![true; self.functions.len()];
        for action in &self.actions {
            for timed in &action.effects {
                if let Effect::Numeric { fluent, .. } = &timed.effect {
                    is_static[fluent.function.0] = false;
                }
            }
        }
        is_static
    }
}
