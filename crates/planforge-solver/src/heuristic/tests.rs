//! Heuristic tests on ground fixtures.

use std::sync::Arc;

use planforge_config::{HeuristicType, PlannerConfig};
use planforge_core::{GroundTask, StateDelta};
use planforge_test::fixtures::{self, Fixture};

use super::*;
use crate::grounder::Grounder;

fn task(fixture: &Fixture) -> GroundTask {
    let (domain, problem) = planforge_pddl::parse(fixture.domain, fixture.problem).unwrap();
    Grounder::new(&PlannerConfig::default())
        .ground(Arc::new(domain), Arc::new(problem))
        .unwrap()
}

fn goal_fact(task: &GroundTask) -> FactId {
    task.goal.conditions[0].positive_fact().unwrap()
}

fn with_fact(state: &State, fact: FactId) -> State {
    state.commit(&StateDelta {
        adds: vec![fact],
        ..StateDelta::default()
    })
}

// ============================================================================
// Relaxed Exploration Tests
// ============================================================================

#[test]
fn test_graph_has_one_operator_per_action() {
    let task = task(&fixtures::DELIVERY);
    let graph = RelaxedPlanningGraph::new(&task);
    assert_eq!(graph.num_operators(), task.actions.len());
}

#[test]
fn test_additive_delivery() {
    let task = task(&fixtures::DELIVERY);
    let h = AdditiveHeuristic::new(&task);
    // at hall = 1, holding = 2, at office = 2, in office = 2 + 2 + 1.
    assert_eq!(h.estimate(&task.initial_state, &[]), Some(5));
}

#[test]
fn test_relaxed_plan_delivery() {
    let task = task(&fixtures::DELIVERY);
    let h = RelaxedPlanHeuristic::new(&task);
    // move, pick, move, drop
    assert_eq!(h.estimate(&task.initial_state, &[]), Some(4));
}

#[test]
fn test_goal_state_is_zero() {
    let task = task(&fixtures::DELIVERY);
    let state = with_fact(&task.initial_state, goal_fact(&task));
    assert_eq!(AdditiveHeuristic::new(&task).estimate(&state, &[]), Some(0));
    assert_eq!(RelaxedPlanHeuristic::new(&task).estimate(&state, &[]), Some(0));
}

#[test]
fn test_pending_effects_count_as_reached() {
    let task = task(&fixtures::TRIVIAL);
    let h = RelaxedPlanHeuristic::new(&task);
    assert_eq!(h.estimate(&task.initial_state, &[]), Some(1));
    assert_eq!(h.estimate(&task.initial_state, &[goal_fact(&task)]), Some(0));
}

#[test]
fn test_unreachable_goal_is_dead_end() {
    let task = task(&fixtures::UNSOLVABLE);
    assert_eq!(AdditiveHeuristic::new(&task).estimate(&task.initial_state, &[]), None);
    assert_eq!(RelaxedPlanHeuristic::new(&task).estimate(&task.initial_state, &[]), None);
}

#[test]
fn test_start_adds_do_not_block_own_invariant() {
    let domain = r#"
(define (domain hold)
  (:requirements :strips :durative-actions)
  (:predicates (busy) (done))
  (:durative-action work
    :parameters ()
    :duration (= ?duration 2)
    :condition (over all (busy))
    :effect (and (at start (busy)) (at end (done)))))
"#;
    let problem = "(define (problem hold-1) (:domain hold) (:goal (done)))";
    let (domain, problem) = planforge_pddl::parse(domain, problem).unwrap();
    let task = Grounder::new(&PlannerConfig::default())
        .ground(Arc::new(domain), Arc::new(problem))
        .unwrap();
    assert_eq!(RelaxedPlanHeuristic::new(&task).estimate(&task.initial_state, &[]), Some(1));
}

// ============================================================================
// Factory Tests
// ============================================================================

#[test]
fn test_build_heuristic() {
    let task = task(&fixtures::DELIVERY);
    assert_eq!(build_heuristic(HeuristicType::RelaxedPlan, &task).name(), "relaxed-plan");
    assert_eq!(build_heuristic(HeuristicType::Additive, &task).name(), "additive");
    let blind = build_heuristic(HeuristicType::Blind, &task);
    assert_eq!(blind.name(), "blind");
    assert_eq!(blind.estimate(&task.initial_state, &[]), Some(0));
}
