//! Search statistics.
//!
//! Plain counters owned by the search scope and copied into the outcome of
//! every solve.

use std::fmt;
use std::time::Duration;

use planforge_core::GroundTask;

/// Counters for one solve.
///
/// # Example
///
/// ```
/// use planforge_solver::SearchStatistics;
///
/// let mut stats = SearchStatistics::default();
/// stats.record_expansion();
/// stats.record_generated(3);
/// stats.record_duplicate();
///
/// assert_eq!(stats.expanded, 1);
/// assert_eq!(stats.generated, 3);
/// assert_eq!(stats.duplicates, 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStatistics {
    /// Nodes popped from the frontier and expanded.
    pub expanded: u64,
    /// Successor nodes created.
    pub generated: u64,
    /// Successors discarded because an equal or earlier node was seen.
    pub duplicates: u64,
    /// Successors the heuristic proved unable to reach the goal.
    pub dead_ends: u64,
    /// Successors cut by the deadline or the makespan bound.
    pub pruned: u64,
    /// Goal nodes reached (more than one when optimizing makespan).
    pub plans_found: u64,
    /// Wall time from the start of the search.
    pub elapsed: Duration,
    pub ground_facts: usize,
    pub ground_fluents: usize,
    pub ground_actions: usize,
}

impl SearchStatistics {
    /// Records the size of the ground task being searched.
    pub fn record_task(&mut self, task: &GroundTask) {
        self.ground_facts = task.num_facts();
        self.ground_fluents = task.num_fluents();
        self.ground_actions = task.actions.len();
    }

    pub fn record_expansion(&mut self) {
        self.expanded += 1;
    }

    pub fn record_generated(&mut self, count: u64) {
        self.generated += count;
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates += 1;
    }

    pub fn record_dead_end(&mut self) {
        self.dead_ends += 1;
    }

    pub fn record_pruned(&mut self) {
        self.pruned += 1;
    }

    pub fn record_plan(&mut self) {
        self.plans_found += 1;
    }

    /// Expanded nodes per second, zero before any time has passed.
    pub fn nodes_per_second(&self) -> u64 {
        let millis = self.elapsed.as_millis() as u64;
        if millis == 0 {
            0
        } else {
            self.expanded.saturating_mul(1000) / millis
        }
    }
}

impl fmt::Display for SearchStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} expanded, {} generated, {} duplicates, {} dead ends in {:?}",
            self.expanded, self.generated, self.duplicates, self.dead_ends, self.elapsed
        )
    }
}
