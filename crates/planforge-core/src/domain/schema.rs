//! Action schemas with timed conditions and effects

use std::fmt;

use crate::expr::{AssignOp, Comparison, NumericExpr};

use super::{FunctionId, ObjectId, PredicateId, TypedParameter};

/// An argument inside a schema: a parameter index or a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    Param(usize),
    Object(ObjectId),
}

impl Term {
    /// Resolves the term under a parameter binding.
    pub fn resolve(&self, binding: &[ObjectId]) -> ObjectId {
        match *self {
            Term::Param(i) => binding[i],
            Term::Object(o) => o,
        }
    }
}

/// A predicate applied to terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtomTemplate {
    pub predicate: PredicateId,
    pub args: Vec<Term>,
}

/// A numeric function applied to terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FluentTemplate {
    pub function: FunctionId,
    pub args: Vec<Term>,
}

/// Numeric expression over lifted fluents.
pub type LiftedExpr = NumericExpr<FluentTemplate>;

/// A single condition literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A (possibly negated) atom.
    Atom { atom: AtomTemplate, positive: bool },
    /// Term (in)equality, requires `:equality`.
    Equality { lhs: Term, rhs: Term, positive: bool },
    /// Numeric comparison, requires `:numeric-fluents`.
    Compare {
        op: Comparison,
        lhs: LiftedExpr,
        rhs: LiftedExpr,
    },
}

/// A single effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Add(AtomTemplate),
    Delete(AtomTemplate),
    Numeric {
        op: AssignOp,
        fluent: FluentTemplate,
        value: LiftedExpr,
    },
}

/// When a condition must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timing {
    AtStart,
    OverAll,
    AtEnd,
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Timing::AtStart => "at start",
            Timing::OverAll => "over all",
            Timing::AtEnd => "at end",
        })
    }
}

/// When an effect takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectTiming {
    AtStart,
    AtEnd,
}

impl fmt::Display for EffectTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EffectTiming::AtStart => "at start",
            EffectTiming::AtEnd => "at end",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedCondition {
    pub timing: Timing,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedEffect {
    pub timing: EffectTiming,
    pub effect: Effect,
}

/// Duration constraint of a durative action.
#[derive(Debug, Clone, PartialEq)]
pub enum DurationConstraint {
    /// `(= ?duration e)`
    Exact(LiftedExpr),
    /// `(>= ?duration lo)` and/or `(<= ?duration hi)`.
    Bounded {
        lower: Option<LiftedExpr>,
        upper: Option<LiftedExpr>,
    },
}

/// An instantaneous or durative action schema.
///
/// Instantaneous actions carry no duration; their conditions and effects
/// are all tagged `AtStart`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSchema {
    pub name: String,
    pub parameters: Vec<TypedParameter>,
    pub duration: Option<DurationConstraint>,
    pub conditions: Vec<TimedCondition>,
    pub effects: Vec<TimedEffect>,
}

impl ActionSchema {
    pub fn is_durative(&self) -> bool {
        self.duration.is_some()
    }

    pub fn conditions_at(&self, timing: Timing) -> impl Iterator<Item = &Condition> {
        self.conditions
            .iter()
            .filter(move |c| c.timing == timing)
            .map(|c| &c.condition)
    }

    pub fn effects_at(&self, timing: EffectTiming) -> impl Iterator<Item = &Effect> {
        self.effects
            .iter()
            .filter(move |e| e.timing == timing)
            .map(|e| &e.effect)
    }
}
