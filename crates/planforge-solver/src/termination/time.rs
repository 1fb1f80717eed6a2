//! Wall-clock limit on a solve.

use std::time::{Duration, Instant};

use super::Termination;
use crate::scope::SearchScope;

/// Fires once `limit` has passed since the solve began.
///
/// The clock is anchored where the solve call starts rather than where the
/// search does, so parsing and grounding count against the limit. The
/// search scope is not consulted.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
/// use planforge_solver::termination::{Termination, TimeTermination};
/// use planforge_solver::SearchScope;
///
/// let solve_began = Instant::now();
/// // parse and ground here
/// let limit = TimeTermination::since(solve_began, Duration::from_secs(30));
/// assert!(!limit.is_terminated(&SearchScope::new()));
/// assert!(limit.remaining() <= Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeTermination {
    limit: Duration,
    /// `None` when the limit lies beyond what `Instant` can represent.
    cutoff: Option<Instant>,
}

impl TimeTermination {
    /// A limit counted from now.
    pub fn new(limit: Duration) -> Self {
        Self::since(Instant::now(), limit)
    }

    /// A limit counted from `started`.
    pub fn since(started: Instant, limit: Duration) -> Self {
        Self {
            limit,
            cutoff: started.checked_add(limit),
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Time left before the limit fires.
    pub fn remaining(&self) -> Duration {
        self.cutoff
            .map_or(Duration::MAX, |c| c.saturating_duration_since(Instant::now()))
    }

    fn expired(&self) -> bool {
        self.cutoff.is_some_and(|c| Instant::now() >= c)
    }
}

impl Termination for TimeTermination {
    fn is_terminated(&self, _scope: &SearchScope) -> bool {
        self.expired()
    }
}
