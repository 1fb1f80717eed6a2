//! End-to-end planning pipeline.
//!
//! Logging levels:
//! - **INFO**: Solve start/end, grounding size, search summary
//! - **DEBUG**: Search progress, plan replay
//! - **TRACE**: Individual decisions

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use planforge_config::PlannerConfig;
use planforge_core::{Domain, PlanForgeError, Problem, Result};

use crate::grounder::Grounder;
use crate::scope::SearchScope;
use crate::search::{SearchResult, TemporalSearch};
use crate::statistics::SearchStatistics;
use crate::termination::build_termination;
use crate::validator::{validate, ValidationReport};

/// Result of a completed planning run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanningOutcome {
    pub result: SearchResult,
    pub statistics: SearchStatistics,
    /// Replay summary of the returned plan.
    pub report: Option<ValidationReport>,
}

/// Grounds, searches and validates.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use planforge_config::PlannerConfig;
/// use planforge_solver::{Planner, SearchResult};
///
/// let (domain, problem) = planforge_pddl::parse(
///     "(define (domain d) (:predicates (p)) (:action a :effect (p)))",
///     "(define (problem q) (:domain d) (:goal (p)))",
/// ).unwrap();
///
/// let outcome = Planner::new(PlannerConfig::default())
///     .plan(Arc::new(domain), Arc::new(problem))
///     .unwrap();
/// assert!(matches!(outcome.result, SearchResult::Solved(_)));
/// assert_eq!(outcome.report.map(|r| r.happenings), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct Planner {
    config: PlannerConfig,
    terminate_flag: Option<Arc<AtomicBool>>,
    started: Option<Instant>,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            terminate_flag: None,
            started: None,
        }
    }

    /// Stops the search early once `flag` is set.
    pub fn with_terminate_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.terminate_flag = Some(flag);
        self
    }

    /// Counts the time limit from `started` instead of from the call to
    /// [`plan`](Self::plan), so work done before it (such as parsing) is
    /// included.
    pub fn with_start_time(mut self, started: Instant) -> Self {
        self.started = Some(started);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Runs the pipeline on a parsed domain and problem.
    ///
    /// The returned plan has been replayed by the validator; a plan that
    /// fails replay is reported as `InternalInconsistency`.
    pub fn plan(&self, domain: Arc<Domain>, problem: Arc<Problem>) -> Result<PlanningOutcome> {
        let started = self.started.unwrap_or_else(Instant::now);
        let threads = self.config.search.thread_count.resolve();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|err| PlanForgeError::InvalidState(format!("thread pool: {}", err)))?;

        info!(
            event = "solve_start",
            domain = %domain.name,
            problem = %problem.name,
            threads,
        );
        pool.install(|| self.plan_in_pool(domain, problem, started))
    }

    fn plan_in_pool(
        &self,
        domain: Arc<Domain>,
        problem: Arc<Problem>,
        started: Instant,
    ) -> Result<PlanningOutcome> {
        let task = Grounder::new(&self.config).ground(domain, problem)?;

        let termination = build_termination(&self.config, self.terminate_flag.clone(), started);
        let mut scope = SearchScope::new();
        let result = TemporalSearch::new(&task, &self.config.search).run(&mut scope, &termination)?;
        let statistics = scope.finish();

        let report = match result.plan() {
            Some(plan) => {
                let report = validate(&task, plan).map_err(|err| {
                    warn!(event = "plan_rejected", error = %err);
                    PlanForgeError::InternalInconsistency(format!(
                        "search produced an invalid plan: {}",
                        err
                    ))
                })?;
                info!(
                    event = "plan_validated",
                    steps = plan.len(),
                    makespan = report.makespan,
                );
                Some(report)
            }
            None => None,
        };

        info!(
            event = "solve_end",
            outcome = result.label(),
            expanded = statistics.expanded,
            generated = statistics.generated,
            duration_ms = statistics.elapsed.as_millis() as u64,
        );
        Ok(PlanningOutcome {
            result,
            statistics,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use planforge_test::fixtures::{self, Fixture};

    use super::*;

    fn plan(fixture: &Fixture, planner: &Planner) -> Result<PlanningOutcome> {
        let (domain, problem) = planforge_pddl::parse(fixture.domain, fixture.problem).unwrap();
        planner.plan(Arc::new(domain), Arc::new(problem))
    }

    #[test]
    fn test_plan_is_validated() {
        let outcome = plan(&fixtures::DELIVERY, &Planner::new(PlannerConfig::default())).unwrap();
        let makespan = outcome.result.plan().map(|p| p.makespan());
        assert_eq!(outcome.report.map(|r| r.makespan), makespan);
        assert!(outcome.statistics.expanded > 0);
        assert_eq!(outcome.statistics.ground_actions, 10);
    }

    #[test]
    fn test_no_report_without_plan() {
        let outcome = plan(&fixtures::UNSOLVABLE, &Planner::new(PlannerConfig::default())).unwrap();
        assert_eq!(outcome.result, SearchResult::NoSolution);
        assert_eq!(outcome.report, None);
    }

    #[test]
    fn test_grounding_limit_propagates() {
        let config = PlannerConfig::new().with_max_ground_actions(3);
        let err = plan(&fixtures::DELIVERY, &Planner::new(config)).unwrap_err();
        assert!(matches!(err, PlanForgeError::GroundingLimitExceeded { limit: 3, .. }));
    }

    #[test]
    fn test_terminate_flag_stops_search() {
        let flag = Arc::new(AtomicBool::new(true));
        let planner = Planner::new(PlannerConfig::default()).with_terminate_flag(flag);
        let outcome = plan(&fixtures::DELIVERY, &planner).unwrap();
        assert_eq!(outcome.result, SearchResult::BudgetExceeded);
        assert_eq!(outcome.statistics.expanded, 0);
    }

    #[test]
    fn test_time_before_planning_counts() {
        let config = PlannerConfig::new().with_time_limit(Duration::from_millis(10));
        let planner =
            Planner::new(config).with_start_time(Instant::now() - Duration::from_secs(1));
        let outcome = plan(&fixtures::DELIVERY, &planner).unwrap();
        assert_eq!(outcome.result, SearchResult::BudgetExceeded);
        assert_eq!(outcome.statistics.expanded, 0);
    }
}
