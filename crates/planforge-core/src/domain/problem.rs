//! Problem declarations

use smallvec::SmallVec;

use crate::expr::NumericExpr;

use super::{Condition, FunctionId, ObjectId, ObjectTable, PredicateId, Requirements};

/// A predicate applied to objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroundAtom {
    pub predicate: PredicateId,
    pub args: SmallVec<[ObjectId; 4]>,
}

impl GroundAtom {
    pub fn new(predicate: PredicateId, args: impl IntoIterator<Item = ObjectId>) -> Self {
        Self {
            predicate,
            args: args.into_iter().collect(),
        }
    }
}

/// A numeric function applied to objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroundFluent {
    pub function: FunctionId,
    pub args: SmallVec<[ObjectId; 4]>,
}

impl GroundFluent {
    pub fn new(function: FunctionId, args: impl IntoIterator<Item = ObjectId>) -> Self {
        Self {
            function,
            args: args.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricDirection {
    Minimize,
    Maximize,
}

/// Leaf of a metric expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricTerm {
    TotalTime,
    Fluent(GroundFluent),
}

/// A recorded `:metric` section.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub direction: MetricDirection,
    pub expr: NumericExpr<MetricTerm>,
}

impl Metric {
    /// True for `(:metric minimize (total-time))`.
    pub fn minimizes_makespan(&self) -> bool {
        self.direction == MetricDirection::Minimize
            && matches!(self.expr, NumericExpr::Fluent(MetricTerm::TotalTime))
    }
}

/// A parsed and validated problem.
///
/// Goal conditions use only [`Term::Object`](super::Term::Object) terms.
#[derive(Debug, Clone)]
pub struct Problem {
    pub name: String,
    pub domain_name: String,
    pub requirements: Requirements,
    pub objects: ObjectTable,
    pub init: Vec<GroundAtom>,
    pub init_fluents: Vec<(GroundFluent, f64)>,
    pub goal: Vec<Condition>,
    pub deadline: Option<f64>,
    pub metric: Option<Metric>,
}
