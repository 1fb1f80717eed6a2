//! Search-level scope.

use std::time::{Duration, Instant};

use crate::statistics::SearchStatistics;

/// Top-level scope for one search run.
#[derive(Debug, Default)]
pub struct SearchScope {
    start_time: Option<Instant>,
    statistics: SearchStatistics,
}

impl SearchScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of the search and clears the counters.
    pub fn start_searching(&mut self) {
        self.start_time = Some(Instant::now());
        self.statistics = SearchStatistics::default();
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|t| t.elapsed())
    }

    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    pub fn statistics_mut(&mut self) -> &mut SearchStatistics {
        &mut self.statistics
    }

    /// Stamps the elapsed time into the statistics and returns them.
    pub fn finish(&mut self) -> SearchStatistics {
        self.statistics.elapsed = self.elapsed().unwrap_or_default();
        self.statistics.clone()
    }

    pub fn expanded(&self) -> u64 {
        self.statistics.expanded
    }
}
