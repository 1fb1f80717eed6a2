//! Ground task: the output of grounding
//!
//! Facts, fluents and actions are interned to dense ids so the state model
//! can work on bitsets and vectors. A [`GroundTask`] is built once per solve
//! and shared read-only by the search engine and the validator.

mod symbols;

#[cfg(test)]
mod tests;

pub use symbols::{DenseId, SymbolTable};

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::domain::{Domain, GroundAtom, GroundFluent, ObjectId, Problem};
use crate::expr::{format_number, AssignOp, Comparison, NumericExpr};
use crate::state::State;

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl DenseId for $name {
            fn from_index(index: usize) -> Self {
                $name(index as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

dense_id!(
    /// Dense id of a ground atom.
    FactId
);
dense_id!(
    /// Dense id of a ground numeric fluent.
    FluentId
);
dense_id!(
    /// Dense id of a ground action.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    ActionId
);

/// Numeric expression over ground fluents.
pub type GroundExpr = NumericExpr<FluentId>;

/// A resolved condition literal.
#[derive(Debug, Clone, PartialEq)]
pub enum GroundCondition {
    Fact { fact: FactId, positive: bool },
    Compare {
        op: Comparison,
        lhs: GroundExpr,
        rhs: GroundExpr,
    },
    /// A condition decided at grounding time (e.g. object equality in a goal).
    Constant(bool),
}

impl GroundCondition {
    /// The fact of a positive literal.
    pub fn positive_fact(&self) -> Option<FactId> {
        match self {
            GroundCondition::Fact {
                fact,
                positive: true,
            } => Some(*fact),
            _ => None,
        }
    }
}

/// A resolved effect.
#[derive(Debug, Clone, PartialEq)]
pub enum GroundEffect {
    Add(FactId),
    Delete(FactId),
    Numeric {
        op: AssignOp,
        fluent: FluentId,
        value: GroundExpr,
    },
}

/// Resolved duration constraint of a durative ground action.
#[derive(Debug, Clone, PartialEq)]
pub enum GroundDuration {
    Exact(GroundExpr),
    Bounded {
        lower: Option<GroundExpr>,
        upper: Option<GroundExpr>,
    },
}

/// An action schema with its parameters bound to objects.
///
/// Instantaneous actions have no duration and keep their conditions in
/// `at_start` and their effects in `start_effects`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundAction {
    pub id: ActionId,
    /// Index of the schema in [`Domain::actions`].
    pub schema: usize,
    /// Rendered name, e.g. `(move r1 a b)`.
    pub name: String,
    pub args: SmallVec<[ObjectId; 4]>,
    pub duration: Option<GroundDuration>,
    pub at_start: Vec<GroundCondition>,
    pub over_all: Vec<GroundCondition>,
    pub at_end: Vec<GroundCondition>,
    pub start_effects: Vec<GroundEffect>,
    pub end_effects: Vec<GroundEffect>,
}

impl GroundAction {
    pub fn is_durative(&self) -> bool {
        self.duration.is_some()
    }

    /// Facts added at start or at end.
    pub fn add_effects(&self) -> impl Iterator<Item = FactId> + '_ {
        self.start_effects
            .iter()
            .chain(self.end_effects.iter())
            .filter_map(|e| match e {
                GroundEffect::Add(f) => Some(*f),
                _ => None,
            })
    }
}

/// Conjunctive goal with an optional completion deadline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Goal {
    pub conditions: Vec<GroundCondition>,
    pub deadline: Option<f64>,
}

impl Goal {
    /// Returns true if `time` is within the deadline (or there is none).
    pub fn meets_deadline(&self, time: f64) -> bool {
        self.deadline.map_or(true, |d| time <= d + 1e-9)
    }
}

/// The fully grounded planning task.
#[derive(Debug, Clone)]
pub struct GroundTask {
    pub facts: SymbolTable<GroundAtom, FactId>,
    pub fluents: SymbolTable<GroundFluent, FluentId>,
    pub actions: Vec<GroundAction>,
    pub initial_state: State,
    pub goal: Goal,
    pub domain: Arc<Domain>,
    pub problem: Arc<Problem>,
}

impl GroundTask {
    pub fn action(&self, id: ActionId) -> &GroundAction {
        &self.actions[id.index()]
    }

    pub fn num_facts(&self) -> usize {
        self.facts.len()
    }

    pub fn num_fluents(&self) -> usize {
        self.fluents.len()
    }

    /// Renders a fact as `(pred a b)`.
    pub fn fact_name(&self, id: FactId) -> String {
        let atom = self.facts.get(id);
        let name = &self.domain.predicate(atom.predicate).name;
        self.render_call(name, &atom.args)
    }

    /// Renders a fluent as `(fn a b)`.
    pub fn fluent_name(&self, id: FluentId) -> String {
        let fluent = self.fluents.get(id);
        let name = &self.domain.function(fluent.function).name;
        self.render_call(name, &fluent.args)
    }

    /// Renders a ground condition.
    pub fn condition_text(&self, condition: &GroundCondition) -> String {
        match condition {
            GroundCondition::Fact { fact, positive } => {
                if *positive {
                    self.fact_name(*fact)
                } else {
                    format!("(not {})", self.fact_name(*fact))
                }
            }
            GroundCondition::Compare { op, lhs, rhs } => {
                let fluent = |f: &FluentId| self.fluent_name(*f);
                format!("({} {} {})", op.symbol(), lhs.render(&fluent), rhs.render(&fluent))
            }
            GroundCondition::Constant(value) => value.to_string(),
        }
    }

    fn render_call(&self, name: &str, args: &[ObjectId]) -> String {
        let mut out = format!("({}", name);
        for &arg in args {
            out.push(' ');
            out.push_str(self.problem.objects.name(arg));
        }
        out.push(')');
        out
    }

    /// Renders an action name from its schema and arguments.
    pub fn render_action(domain: &Domain, problem: &Problem, schema: usize, args: &[ObjectId]) -> String {
        let mut out = format!("({}", domain.actions[schema].name);
        for &arg in args {
            out.push(' ');
            out.push_str(problem.objects.name(arg));
        }
        out.push(')');
        out
    }
}

impl fmt::Display for GroundTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {}: {} facts, {} fluents, {} actions",
            self.domain.name,
            self.problem.name,
            self.facts.len(),
            self.fluents.len(),
            self.actions.len()
        )?;
        if let Some(deadline) = self.goal.deadline {
            write!(f, ", deadline {}", format_number(deadline))?;
        }
        Ok(())
    }
}
