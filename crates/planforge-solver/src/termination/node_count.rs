//! Expanded-node termination.

use super::Termination;
use crate::scope::SearchScope;

/// Terminates once `limit` nodes have been expanded.
///
/// # Example
///
/// ```
/// use planforge_solver::termination::{NodeCountTermination, Termination};
/// use planforge_solver::SearchScope;
///
/// let term = NodeCountTermination::new(2);
/// let mut scope = SearchScope::new();
/// scope.statistics_mut().record_expansion();
/// assert!(!term.is_terminated(&scope));
/// scope.statistics_mut().record_expansion();
/// assert!(term.is_terminated(&scope));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct NodeCountTermination {
    limit: u64,
}

impl NodeCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl Termination for NodeCountTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.expanded() >= self.limit
    }
}
