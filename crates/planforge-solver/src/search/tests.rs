//! Search tests on the shared fixtures.

use std::sync::Arc;

use planforge_config::{HeuristicType, PlannerConfig, SearchStrategy, ThreadCount};
use planforge_core::{GroundTask, PlanForgeError, StateDelta};
use planforge_test::fixtures::{self, Fixture};

use super::*;
use crate::grounder::Grounder;
use crate::heuristic::BlindHeuristic;
use crate::termination::NodeCountTermination;

fn task(fixture: &Fixture) -> GroundTask {
    task_from(fixture.domain, fixture.problem)
}

fn task_from(domain: &str, problem: &str) -> GroundTask {
    let (domain, problem) = planforge_pddl::parse(domain, problem).unwrap();
    Grounder::new(&PlannerConfig::default())
        .ground(Arc::new(domain), Arc::new(problem))
        .unwrap()
}

fn search_with(task: &GroundTask, config: &PlannerConfig) -> (SearchResult, SearchScope) {
    let mut scope = SearchScope::new();
    let result = TemporalSearch::new(task, &config.search)
        .run(&mut scope, &NodeCountTermination::new(100_000))
        .unwrap();
    (result, scope)
}

fn solve(fixture: &Fixture, config: &PlannerConfig) -> Plan {
    match search_with(&task(fixture), config).0 {
        SearchResult::Solved(plan) => plan,
        other => panic!("{} not solved: {:?}", fixture.name, other),
    }
}

fn solve_task(task: &GroundTask) -> Plan {
    match search_with(task, &PlannerConfig::default()).0 {
        SearchResult::Solved(plan) => plan,
        other => panic!("not solved: {:?}", other),
    }
}

fn optimizing() -> PlannerConfig {
    PlannerConfig::new().with_optimize_makespan(true)
}

fn names(plan: &Plan) -> Vec<&str> {
    plan.iter().map(|s| s.name.as_str()).collect()
}

// ============================================================================
// Plan Tests
// ============================================================================

#[test]
fn test_trivial_plan() {
    let plan = solve(&fixtures::TRIVIAL, &PlannerConfig::default());
    assert_eq!(plan.len(), 1);
    let step = &plan.steps()[0];
    assert_eq!(step.name, "(finish)");
    assert_eq!(step.start, 0.0);
    assert_eq!(step.duration, 1.0);
}

#[test]
fn test_goal_already_satisfied() {
    let problem = r#"
(define (problem trivial-0)
  (:domain trivial)
  (:init (ready) (done))
  (:goal (done)))
"#;
    let task = task_from(fixtures::TRIVIAL.domain, problem);
    let (result, scope) = search_with(&task, &PlannerConfig::default());
    assert_eq!(result, SearchResult::Solved(Plan::empty()));
    assert_eq!(scope.expanded(), 0);
}

#[test]
fn test_delivery_solved() {
    let plan = solve(&fixtures::DELIVERY, &PlannerConfig::default());
    assert!(plan.len() >= 4);
    assert_eq!(plan.steps()[0].name, "(move r1 depot hall)");
}

#[test]
fn test_delivery_optimal_makespan() {
    let plan = solve(&fixtures::DELIVERY, &optimizing());
    assert_eq!(
        names(&plan),
        vec![
            "(move r1 depot hall)",
            "(pick r1 p1 hall)",
            "(move r1 hall office)",
            "(drop r1 p1 office)",
        ]
    );
    assert_eq!(plan.makespan(), 6.0);
}

#[test]
fn test_power_never_overlaps() {
    let plan = solve(&fixtures::POWER, &PlannerConfig::default());
    assert_eq!(plan.len(), 2);
    let (a, b) = (&plan.steps()[0], &plan.steps()[1]);
    // `maintain` cuts the power `operate` needs, so the two are sequenced.
    assert!(b.start >= a.end() - 1e-9);
    assert_eq!(plan.makespan(), 6.0);
}

#[test]
fn test_courier_meets_deadline() {
    let plan = solve(&fixtures::COURIER, &PlannerConfig::default());
    assert_eq!(names(&plan), vec!["(get-bike)", "(ride)"]);
    assert_eq!(plan.steps()[1].start, 1.0);
    assert_eq!(plan.makespan(), 3.0);
}

#[test]
fn test_courier_optimized_without_deadline() {
    let plan = solve(&fixtures::COURIER_RELAXED, &optimizing());
    assert_eq!(plan.makespan(), 3.0);
}

#[test]
fn test_deadline_too_tight() {
    let config = PlannerConfig::new().with_deadline(2.5);
    let task = {
        let (domain, problem) =
            planforge_pddl::parse(fixtures::COURIER.domain, fixtures::COURIER.problem).unwrap();
        Grounder::new(&config)
            .ground(Arc::new(domain), Arc::new(problem))
            .unwrap()
    };
    let (result, scope) = search_with(&task, &config);
    assert_eq!(result, SearchResult::NoSolution);
    assert!(scope.statistics().pruned > 0);
}

#[test]
fn test_numeric_duration_and_effects() {
    let plan = solve(&fixtures::FACTORY, &PlannerConfig::default());
    assert_eq!(names(&plan), vec!["(produce m1)"]);
    assert_eq!(plan.steps()[0].duration, 2.0);
}

const HANDOVER_DOMAIN: &str = r#"
(define (domain handover)
  (:requirements :strips :durative-actions)
  (:predicates (ready) (p) (r) (done))
  (:durative-action open
    :parameters ()
    :duration (= ?duration 2)
    :condition (at start (ready))
    :effect (and (at start (p)) (at start (not (ready)))
                 (at end (not (p))) (at end (r))))
  (:durative-action use
    :parameters ()
    :duration (= ?duration 1)
    :condition (and (at start (p)) (at end (r)))
    :effect (at end (done))))
"#;

#[test]
fn test_start_aligned_with_running_end() {
    // `use` needs `p`, which only holds while `open` runs, and `r`, which
    // only appears when `open` ends. It must start at 1 to end with `open`.
    let problem = "(define (problem h) (:domain handover) (:init (ready)) (:goal (done)))";
    let task = task_from(HANDOVER_DOMAIN, problem);
    let plan = solve_task(&task);
    assert_eq!(names(&plan), vec!["(open)", "(use)"]);
    assert_eq!(plan.steps()[1].start, 1.0);
    assert_eq!(plan.makespan(), 2.0);
    assert!(crate::validator::validate(&task, &plan).is_ok());
}

#[test]
fn test_bounded_duration_stretched_to_running_end() {
    let domain = r#"
(define (domain stretch)
  (:requirements :strips :durative-actions :duration-inequalities)
  (:predicates (ready) (p) (r) (done))
  (:durative-action open
    :parameters ()
    :duration (= ?duration 3)
    :condition (at start (ready))
    :effect (and (at start (p)) (at start (not (ready)))
                 (at end (not (p))) (at end (r))))
  (:durative-action use
    :parameters ()
    :duration (and (>= ?duration 1) (<= ?duration 5))
    :condition (and (at start (p)) (at end (r)))
    :effect (at end (done))))
"#;
    let problem = "(define (problem s) (:domain stretch) (:init (ready)) (:goal (done)))";
    let task = task_from(domain, problem);
    let plan = solve_task(&task);
    assert_eq!(names(&plan), vec!["(open)", "(use)"]);
    assert_eq!(plan.makespan(), 3.0);
    assert!(crate::validator::validate(&task, &plan).is_ok());
}

// ============================================================================
// Outcome Tests
// ============================================================================

#[test]
fn test_unsolvable_at_root() {
    let task = task(&fixtures::UNSOLVABLE);
    let (result, scope) = search_with(&task, &PlannerConfig::default());
    assert_eq!(result, SearchResult::NoSolution);
    assert_eq!(scope.expanded(), 0);
    assert_eq!(scope.statistics().dead_ends, 1);
}

#[test]
fn test_unsolvable_exhausted_blind() {
    let task = task(&fixtures::UNSOLVABLE);
    let config = PlannerConfig::new().with_heuristic(HeuristicType::Blind);
    let (result, scope) = search_with(&task, &config);
    assert_eq!(result, SearchResult::NoSolution);
    assert!(scope.expanded() > 0);
}

const SHARED_TOOL_DOMAIN: &str = r#"
(define (domain tool)
  (:requirements :strips :durative-actions)
  (:predicates (ready) (x) (y))
  (:durative-action make-x
    :parameters ()
    :duration (= ?duration 1)
    :condition (at start (ready))
    :effect (and (at start (not (ready))) (at end (x))))
  (:durative-action make-y
    :parameters ()
    :duration (= ?duration 1)
    :condition (at start (ready))
    :effect (and (at start (not (ready))) (at end (y)))))
"#;

#[test]
fn test_unproven_exhaustion_is_inconclusive() {
    // Both actions consume `ready`, which the relaxation ignores.
    let problem = "(define (problem t) (:domain tool) (:init (ready)) (:goal (and (x) (y))))";
    let task = task_from(SHARED_TOOL_DOMAIN, problem);
    let config = PlannerConfig::new().with_heuristic(HeuristicType::Blind);
    let (result, scope) = search_with(&task, &config);
    assert_eq!(result, SearchResult::Inconclusive);
    assert_eq!(result.label(), "inconclusive");
    assert!(scope.expanded() > 0);
}

#[test]
fn test_exhausted_instantaneous_is_no_solution() {
    let domain = r#"
(define (domain tool-now)
  (:requirements :strips)
  (:predicates (ready) (x) (y))
  (:action make-x :parameters () :precondition (ready) :effect (and (not (ready)) (x)))
  (:action make-y :parameters () :precondition (ready) :effect (and (not (ready)) (y))))
"#;
    let problem = "(define (problem t) (:domain tool-now) (:init (ready)) (:goal (and (x) (y))))";
    let task = task_from(domain, problem);
    let config = PlannerConfig::new().with_heuristic(HeuristicType::Blind);
    let (result, scope) = search_with(&task, &config);
    assert_eq!(result, SearchResult::NoSolution);
    assert!(scope.expanded() > 0);
}

#[test]
fn test_node_budget_exceeded() {
    let task = task(&fixtures::DELIVERY);
    let mut scope = SearchScope::new();
    let result = TemporalSearch::new(&task, &PlannerConfig::default().search)
        .run(&mut scope, &NodeCountTermination::new(1))
        .unwrap();
    assert_eq!(result, SearchResult::BudgetExceeded);
    assert_eq!(scope.expanded(), 1);
}

#[test]
fn test_invalid_numeric_effect_aborts() {
    let task = task(&fixtures::LEDGER);
    let mut scope = SearchScope::new();
    let err = TemporalSearch::new(&task, &PlannerConfig::default().search)
        .run(&mut scope, &NodeCountTermination::new(1_000))
        .unwrap_err();
    match err {
        PlanForgeError::InvalidNumericEffect { action, .. } => assert_eq!(action, "(settle)"),
        other => panic!("unexpected error {:?}", other),
    }
}

// ============================================================================
// Strategy and Determinism Tests
// ============================================================================

#[test]
fn test_all_strategies_solve() {
    for strategy in [
        SearchStrategy::BestFirst,
        SearchStrategy::BreadthFirst,
        SearchStrategy::DepthFirst,
    ] {
        let config = PlannerConfig::new().with_strategy(strategy);
        for fixture in fixtures::SOLVABLE {
            let plan = solve(fixture, &config);
            assert!(!plan.is_empty(), "{} with {:?}", fixture.name, strategy);
        }
    }
}

#[test]
fn test_blind_search_with_injected_heuristic() {
    let task = task(&fixtures::POWER);
    let mut scope = SearchScope::new();
    let result = TemporalSearch::new(&task, &PlannerConfig::default().search)
        .with_heuristic(Box::new(BlindHeuristic))
        .run(&mut scope, &NodeCountTermination::new(10_000))
        .unwrap();
    assert_eq!(result.plan().map(Plan::makespan), Some(6.0));
}

#[test]
fn test_deterministic() {
    let task = task(&fixtures::DELIVERY);
    let config = PlannerConfig::default();
    let (first, first_scope) = search_with(&task, &config);
    let (second, second_scope) = search_with(&task, &config);
    assert_eq!(first, second);
    assert_eq!(first_scope.expanded(), second_scope.expanded());
    assert_eq!(first_scope.statistics().generated, second_scope.statistics().generated);
}

#[test]
fn test_parallel_matches_sequential() {
    let task = task(&fixtures::DELIVERY);
    let sequential = PlannerConfig::new().with_thread_count(ThreadCount::None);
    let parallel = PlannerConfig::new().with_thread_count(ThreadCount::Count(4));
    let (a, a_scope) = search_with(&task, &sequential);
    let (b, b_scope) = search_with(&task, &parallel);
    assert_eq!(a, b);
    assert_eq!(a_scope.expanded(), b_scope.expanded());
}

// ============================================================================
// Node Tests
// ============================================================================

#[test]
fn test_running_actions_sorted_by_end() {
    let task = task(&fixtures::POWER);
    let mut node = SearchNode::root(task.initial_state.clone(), 0);
    for (step, end) in [(0usize, 4.0), (1, 2.0), (2, 4.0)] {
        node.insert_running(RunningAction {
            action: ActionId(step as u32 % 2),
            step,
            duration: end,
            end,
        });
    }
    let order: Vec<usize> = node.running.iter().map(|r| r.step).collect();
    assert_eq!(order, vec![1, 0, 2]);
    assert_eq!(node.makespan_bound(), 4.0);
}

#[test]
fn test_key_ignores_clock_offset() {
    let task = task(&fixtures::POWER);
    let running = |end: f64| RunningAction {
        action: ActionId(0),
        step: 0,
        duration: 4.0,
        end,
    };
    let mut early = SearchNode::root(task.initial_state.clone(), 0);
    early.insert_running(running(4.0));
    let mut late = early.clone();
    late.now = 1.0;
    late.running[0] = running(5.0);
    assert_eq!(early.key(), late.key());

    let changed = late.child(
        0,
        late.state.commit(&StateDelta {
            adds: vec![planforge_core::FactId(1)],
            ..StateDelta::default()
        }),
        Decision::End {
            action: ActionId(0),
            step: 0,
            at: 5.0,
        },
    );
    assert_ne!(early.key(), changed.key());
}
