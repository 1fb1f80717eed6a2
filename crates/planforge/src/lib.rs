//! PlanForge - A Temporal Planner in Rust
//!
//! Parses PDDL domains with durative actions, searches for a timed plan and
//! validates it before handing it back.
//!
//! # Example
//!
//! ```rust
//! use planforge::prelude::*;
//!
//! let domain = r#"
//! (define (domain kettle)
//!   (:requirements :strips :durative-actions)
//!   (:predicates (cold) (hot))
//!   (:durative-action boil
//!     :parameters ()
//!     :duration (= ?duration 3)
//!     :condition (at start (cold))
//!     :effect (and (at start (not (cold))) (at end (hot)))))
//! "#;
//! let problem = r#"
//! (define (problem tea)
//!   (:domain kettle)
//!   (:init (cold))
//!   (:goal (hot)))
//! "#;
//!
//! let outcome = solve(domain, problem, &SolveBudget::new().with_max_search_nodes(1_000));
//! assert_eq!(outcome.status, SolveStatus::SolutionFound);
//! let plan = outcome.plan.unwrap();
//! assert_eq!(plan.to_string(), "0.000: (boil) [3.000]\n");
//! ```

#[cfg(feature = "console")]
pub mod console;

mod session;
mod status;

pub use session::{Session, SessionId, SessionRegistry, SolveBudget, DEFAULT_SESSION_CAPACITY};
pub use status::{SolveOutcome, SolveStatus};

// Building blocks
pub use planforge_config::{HeuristicType, PlannerConfig, SearchStrategy, ThreadCount};
pub use planforge_core::{Plan, PlanForgeError, PlanStep};
pub use planforge_pddl::{parse, ParseError};
pub use planforge_solver::{
    validate, Planner, PlanningOutcome, SearchResult, SearchStatistics, ValidationError,
    ValidationReport,
};

/// Planner version, e.g. `0.1.0`.
///
/// The returned string is owned by the caller.
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Solves with a fresh default [`Session`].
pub fn solve(domain_text: &str, problem_text: &str, budget: &SolveBudget) -> SolveOutcome {
    Session::new().solve(domain_text, problem_text, budget)
}

pub mod prelude {
    pub use super::{solve, version};
    pub use super::{Plan, PlanStep, PlannerConfig};
    pub use super::{Session, SessionRegistry, SolveBudget, SolveOutcome, SolveStatus};
}
