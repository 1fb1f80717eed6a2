//! Goal-distance estimators for guided search
//!
//! This module contains:
//! - The [`Heuristic`] trait evaluated on every generated search node
//! - [`BlindHeuristic`]: constant zero, for uninformed search
//! - Delete-relaxation estimators over a [`RelaxedPlanningGraph`]

mod relaxed;

#[cfg(test)]
mod tests;

use std::fmt::Debug;

use planforge_config::HeuristicType;
use planforge_core::{FactId, GroundTask, State};

pub use relaxed::{AdditiveHeuristic, RelaxedPlanHeuristic, RelaxedPlanningGraph};

/// Estimates the remaining effort from a search node to the goal.
///
/// `pending` holds the facts that actions still executing will add at their
/// end. Returning `None` declares the node a dead end: no sequence of actions
/// can reach the goal even when deletes are ignored.
pub trait Heuristic: Send + Sync + Debug {
    fn estimate(&self, state: &State, pending: &[FactId]) -> Option<u64>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Constant zero estimate.
///
/// # Example
///
/// ```
/// use planforge_core::{FactSet, State};
/// use planforge_solver::heuristic::{BlindHeuristic, Heuristic};
///
/// let state = State::new(FactSet::default(), Vec::new());
/// assert_eq!(BlindHeuristic.estimate(&state, &[]), Some(0));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BlindHeuristic;

impl Heuristic for BlindHeuristic {
    fn estimate(&self, _state: &State, _pending: &[FactId]) -> Option<u64> {
        Some(0)
    }

    fn name(&self) -> &'static str {
        "blind"
    }
}

/// Builds the configured heuristic for `task`.
pub fn build_heuristic(heuristic: HeuristicType, task: &GroundTask) -> Box<dyn Heuristic> {
    match heuristic {
        HeuristicType::RelaxedPlan => Box::new(RelaxedPlanHeuristic::new(task)),
        HeuristicType::Additive => Box::new(AdditiveHeuristic::new(task)),
        HeuristicType::Blind => Box::new(BlindHeuristic),
    }
}
