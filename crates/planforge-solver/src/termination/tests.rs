//! Tests for termination conditions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use planforge_config::PlannerConfig;

use super::*;

fn scope_with_expansions(n: u64) -> SearchScope {
    let mut scope = SearchScope::new();
    scope.start_searching();
    for _ in 0..n {
        scope.statistics_mut().record_expansion();
    }
    scope
}

#[test]
fn test_node_count_termination() {
    let term = NodeCountTermination::new(3);
    assert!(!term.is_terminated(&scope_with_expansions(2)));
    assert!(term.is_terminated(&scope_with_expansions(3)));
    assert_eq!(term.limit(), 3);
}

#[test]
fn test_time_termination_zero_limit() {
    let term = TimeTermination::new(Duration::ZERO);
    assert!(term.is_terminated(&scope_with_expansions(0)));
    assert_eq!(term.remaining(), Duration::ZERO);
    let hour = TimeTermination::new(Duration::from_secs(3600));
    assert!(!hour.is_terminated(&scope_with_expansions(0)));
}

#[test]
fn test_time_counts_before_search_starts() {
    // The solve began 50ms ago; grounding used the whole budget.
    let began = Instant::now() - Duration::from_millis(50);
    let term = TimeTermination::since(began, Duration::from_millis(20));
    assert!(term.is_terminated(&SearchScope::new()));

    let term = TimeTermination::since(began, Duration::from_secs(3600));
    assert!(!term.is_terminated(&SearchScope::new()));
    assert!(term.remaining() < Duration::from_secs(3600));
}

#[test]
fn test_unrepresentable_limit_never_fires() {
    let term = TimeTermination::new(Duration::MAX);
    assert!(!term.is_terminated(&scope_with_expansions(0)));
    assert_eq!(term.remaining(), Duration::MAX);
    assert_eq!(term.limit(), Duration::MAX);
}

#[test]
fn test_external_termination() {
    let flag = Arc::new(AtomicBool::new(false));
    let term = ExternalTermination::new(flag.clone());
    let scope = SearchScope::new();
    assert!(!term.is_terminated(&scope));
    flag.store(true, Ordering::SeqCst);
    assert!(term.is_terminated(&scope));
}

#[test]
fn test_absent_termination_never_fires() {
    let term: Option<NodeCountTermination> = None;
    assert!(!term.is_terminated(&scope_with_expansions(1_000)));
}

#[test]
fn test_or_termination() {
    let term = OrTermination((
        NodeCountTermination::new(5),
        TimeTermination::new(Duration::from_secs(3600)),
    ));
    assert!(!term.is_terminated(&scope_with_expansions(4)));
    assert!(term.is_terminated(&scope_with_expansions(5)));
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_build_from_default_config() {
    let term = build_termination(&PlannerConfig::default(), None, Instant::now());
    assert!(!term.is_terminated(&scope_with_expansions(100_000)));
}

#[test]
fn test_build_with_node_budget() {
    let config = PlannerConfig::new().with_max_search_nodes(10);
    let term = build_termination(&config, None, Instant::now());
    assert!(!term.is_terminated(&scope_with_expansions(9)));
    assert!(term.is_terminated(&scope_with_expansions(10)));
}

#[test]
fn test_build_with_time_limit_from_solve_start() {
    let config = PlannerConfig::new().with_time_limit(Duration::from_millis(10));
    let started = Instant::now() - Duration::from_millis(20);
    let term = build_termination(&config, None, started);
    assert!(term.is_terminated(&SearchScope::new()));
    assert!(!build_termination(&config, None, Instant::now() + Duration::from_secs(60))
        .is_terminated(&SearchScope::new()));
}

#[test]
fn test_build_with_flag() {
    let flag = Arc::new(AtomicBool::new(true));
    let term = build_termination(&PlannerConfig::default(), Some(flag), Instant::now());
    assert!(term.is_terminated(&SearchScope::new()));
}
