//! Termination conditions for the search.
//!
//! Terminations are polled once per expansion. When any configured one
//! fires, the search reports a budget stop (or the best plan found so far
//! when optimizing makespan).

mod composite;
mod external;
mod node_count;
mod time;

use std::fmt::Debug;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use planforge_config::PlannerConfig;

use crate::scope::SearchScope;

pub use composite::OrTermination;
pub use external::ExternalTermination;
pub use node_count::NodeCountTermination;
pub use time::TimeTermination;

/// Trait for determining when to stop searching.
pub trait Termination: Send + Debug {
    /// Returns true if the search should stop.
    fn is_terminated(&self, scope: &SearchScope) -> bool;
}

/// An absent termination never fires.
impl<T: Termination> Termination for Option<T> {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        self.as_ref().is_some_and(|t| t.is_terminated(scope))
    }
}

/// The termination assembled from a [`PlannerConfig`].
pub type ConfiguredTermination = OrTermination<(
    Option<NodeCountTermination>,
    Option<TimeTermination>,
    Option<ExternalTermination>,
)>;

/// Builds the node budget, time limit and cancellation flag into one
/// termination. The time limit counts from `started`.
pub fn build_termination(
    config: &PlannerConfig,
    flag: Option<Arc<AtomicBool>>,
    started: Instant,
) -> ConfiguredTermination {
    OrTermination((
        config
            .termination
            .max_search_nodes
            .map(NodeCountTermination::new),
        config
            .time_limit()
            .map(|limit| TimeTermination::since(started, limit)),
        flag.map(ExternalTermination::new),
    ))
}

#[cfg(test)]
mod tests;
