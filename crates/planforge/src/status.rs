//! Solve outcomes as seen by callers.

use std::fmt;

use planforge_core::{Plan, PlanForgeError};
use planforge_solver::{SearchResult, SearchStatistics};

/// Definite result of one solve call.
///
/// Codes are stable; foreign callers match on [`SolveStatus::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    /// A validated plan reaches the goal.
    SolutionFound,
    /// The reachable space was exhausted without reaching the goal.
    NoSolution,
    /// The domain or problem text is malformed or semantically invalid.
    ParseError,
    /// A description file could not be read.
    FileError,
    /// The session does not exist or was destroyed.
    InvalidSession,
    /// A budget ran out before the search was decided.
    SearchBudgetExceeded,
    /// Grounding would exceed the configured instantiation budget.
    GroundingLimitExceeded,
    /// A numeric effect evaluated to an undefined value.
    InvalidNumericEffect,
    /// The validator rejected a plan produced by the search.
    InternalInconsistency,
}

impl SolveStatus {
    pub fn code(self) -> i32 {
        match self {
            SolveStatus::SolutionFound => 1,
            SolveStatus::NoSolution => 2,
            SolveStatus::ParseError => 3,
            SolveStatus::FileError => 4,
            SolveStatus::InvalidSession => 5,
            SolveStatus::SearchBudgetExceeded => 6,
            SolveStatus::GroundingLimitExceeded => 7,
            SolveStatus::InvalidNumericEffect => 8,
            SolveStatus::InternalInconsistency => 9,
        }
    }

    pub fn is_solution(self) -> bool {
        self == SolveStatus::SolutionFound
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolveStatus::SolutionFound => "SolutionFound",
            SolveStatus::NoSolution => "NoSolution",
            SolveStatus::ParseError => "ParseError",
            SolveStatus::FileError => "FileError",
            SolveStatus::InvalidSession => "InvalidSession",
            SolveStatus::SearchBudgetExceeded => "SearchBudgetExceeded",
            SolveStatus::GroundingLimitExceeded => "GroundingLimitExceeded",
            SolveStatus::InvalidNumericEffect => "InvalidNumericEffect",
            SolveStatus::InternalInconsistency => "InternalInconsistency",
        };
        f.write_str(name)
    }
}

impl From<&PlanForgeError> for SolveStatus {
    fn from(err: &PlanForgeError) -> Self {
        match err {
            PlanForgeError::Parse(_) => SolveStatus::ParseError,
            PlanForgeError::GroundingLimitExceeded { .. } => SolveStatus::GroundingLimitExceeded,
            PlanForgeError::InvalidNumericEffect { .. } => SolveStatus::InvalidNumericEffect,
            PlanForgeError::InternalInconsistency(_) | PlanForgeError::InvalidState(_) => {
                SolveStatus::InternalInconsistency
            }
        }
    }
}

/// Everything a solve call hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Number of steps; zero unless a plan was found.
    pub plan_length: usize,
    pub plan: Option<Plan>,
    /// Search counters, when the search ran.
    pub statistics: Option<SearchStatistics>,
    /// Human-readable reason for a failure status.
    pub diagnostics: Option<String>,
}

impl SolveOutcome {
    /// An outcome that carries no plan.
    pub fn failure(status: SolveStatus, diagnostics: impl Into<String>) -> Self {
        Self {
            status,
            plan_length: 0,
            plan: None,
            statistics: None,
            diagnostics: Some(diagnostics.into()),
        }
    }

    pub fn invalid_session() -> Self {
        Self::failure(SolveStatus::InvalidSession, "unknown or destroyed session")
    }

    pub(crate) fn from_search(result: SearchResult, statistics: SearchStatistics) -> Self {
        let (status, plan, diagnostics) = match result {
            SearchResult::Solved(plan) => (SolveStatus::SolutionFound, Some(plan), None),
            SearchResult::NoSolution => (
                SolveStatus::NoSolution,
                None,
                Some("the goal is unreachable".to_string()),
            ),
            SearchResult::Inconclusive => (
                SolveStatus::SearchBudgetExceeded,
                None,
                Some(format!(
                    "search space exhausted after {} expansions without proving that no plan exists",
                    statistics.expanded
                )),
            ),
            SearchResult::BudgetExceeded => (
                SolveStatus::SearchBudgetExceeded,
                None,
                Some(format!(
                    "search stopped after {} expansions without a decision",
                    statistics.expanded
                )),
            ),
        };
        Self {
            status,
            plan_length: plan.as_ref().map_or(0, Plan::len),
            plan,
            statistics: Some(statistics),
            diagnostics,
        }
    }
}

impl From<PlanForgeError> for SolveOutcome {
    fn from(err: PlanForgeError) -> Self {
        SolveOutcome::failure(SolveStatus::from(&err), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let all = [
            SolveStatus::SolutionFound,
            SolveStatus::NoSolution,
            SolveStatus::ParseError,
            SolveStatus::FileError,
            SolveStatus::InvalidSession,
            SolveStatus::SearchBudgetExceeded,
            SolveStatus::GroundingLimitExceeded,
            SolveStatus::InvalidNumericEffect,
            SolveStatus::InternalInconsistency,
        ];
        let codes: Vec<i32> = all.iter().map(|s| s.code()).collect();
        assert_eq!(codes, (1..=9).collect::<Vec<_>>());
    }

    #[test]
    fn test_error_mapping() {
        let err = PlanForgeError::InvalidNumericEffect {
            action: "(settle)".to_string(),
            reason: "division by zero".to_string(),
        };
        let outcome = SolveOutcome::from(err);
        assert_eq!(outcome.status, SolveStatus::InvalidNumericEffect);
        assert_eq!(outcome.plan_length, 0);
        assert!(outcome.diagnostics.unwrap().contains("(settle)"));

        let err = PlanForgeError::InvalidState("pool".to_string());
        assert_eq!(SolveStatus::from(&err), SolveStatus::InternalInconsistency);
    }

    #[test]
    fn test_budget_is_not_no_solution() {
        let outcome = SolveOutcome::from_search(
            SearchResult::BudgetExceeded,
            SearchStatistics::default(),
        );
        assert_eq!(outcome.status, SolveStatus::SearchBudgetExceeded);
        assert_ne!(outcome.status, SolveStatus::NoSolution);
        assert!(outcome.statistics.is_some());
    }

    #[test]
    fn test_inconclusive_is_not_no_solution() {
        let outcome =
            SolveOutcome::from_search(SearchResult::Inconclusive, SearchStatistics::default());
        assert_eq!(outcome.status, SolveStatus::SearchBudgetExceeded);
        assert!(outcome.diagnostics.unwrap().contains("without proving"));
    }

    #[test]
    fn test_display() {
        assert_eq!(SolveStatus::SolutionFound.to_string(), "SolutionFound");
        assert_eq!(SolveStatus::InvalidSession.to_string(), "InvalidSession");
    }
}
