//! PlanForge Solver Engine
//!
//! This crate turns a parsed domain and problem into a validated plan:
//! - Grounding of action schemas over the problem's objects
//! - Temporal forward search with best-first, breadth-first and
//!   depth-first ordering
//! - Delete-relaxation heuristics
//! - Termination conditions (node budget, time limit, external flag)
//! - An independent plan validator
//!
//! [`Planner`] runs the whole pipeline; the pieces are public for callers
//! that want to drive them directly.

pub mod grounder;
pub mod heuristic;
pub mod planner;
pub mod scope;
pub mod search;
pub mod statistics;
pub mod termination;
pub mod validator;

pub use grounder::Grounder;
pub use heuristic::{
    build_heuristic, AdditiveHeuristic, BlindHeuristic, Heuristic, RelaxedPlanHeuristic,
    RelaxedPlanningGraph,
};
pub use planner::{Planner, PlanningOutcome};
pub use scope::SearchScope;
pub use search::{SearchResult, TemporalSearch};
pub use statistics::SearchStatistics;
pub use termination::{
    build_termination, ConfiguredTermination, ExternalTermination, NodeCountTermination,
    OrTermination, Termination, TimeTermination,
};
pub use validator::{validate, ValidationError, ValidationReport};
