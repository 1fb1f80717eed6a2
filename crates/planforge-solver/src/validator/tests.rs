//! Replay tests for hand-built plans.

use std::sync::Arc;

use planforge_config::PlannerConfig;
use planforge_core::{ActionId, GroundTask, PlanStep};
use planforge_test::fixtures::{self, Fixture};

use super::*;
use crate::grounder::Grounder;

fn task(fixture: &Fixture) -> GroundTask {
    task_from(fixture.domain, fixture.problem)
}

fn task_from(domain: &str, problem: &str) -> GroundTask {
    let (domain, problem) = planforge_pddl::parse(domain, problem).unwrap();
    Grounder::new(&PlannerConfig::default())
        .ground(Arc::new(domain), Arc::new(problem))
        .unwrap()
}

fn step(task: &GroundTask, name: &str, start: f64, duration: f64) -> PlanStep {
    let action = task
        .actions
        .iter()
        .find(|a| a.name == name)
        .unwrap_or_else(|| panic!("no action {}", name));
    PlanStep::new(action.id, name, start, duration)
}

// ============================================================================
// Valid Plans
// ============================================================================

#[test]
fn test_trivial_plan_valid() {
    let task = task(&fixtures::TRIVIAL);
    let plan = Plan::new(vec![step(&task, "(finish)", 0.0, 1.0)]);
    let report = validate(&task, &plan).unwrap();
    assert_eq!(report.makespan, 1.0);
    assert_eq!(report.happenings, 2);
}

#[test]
fn test_sequenced_power_plan_valid() {
    let task = task(&fixtures::POWER);
    let plan = Plan::new(vec![
        step(&task, "(operate)", 0.0, 4.0),
        step(&task, "(maintain)", 4.0, 2.0),
    ]);
    assert_eq!(validate(&task, &plan).unwrap().makespan, 6.0);
}

#[test]
fn test_end_applies_before_start_at_same_time() {
    // `maintain` restores the power at 2.0, exactly when `operate` needs it.
    let task = task(&fixtures::POWER);
    let plan = Plan::new(vec![
        step(&task, "(maintain)", 0.0, 2.0),
        step(&task, "(operate)", 2.0, 4.0),
    ]);
    assert!(validate(&task, &plan).is_ok());
}

#[test]
fn test_numeric_plan_valid() {
    let task = task(&fixtures::FACTORY);
    let plan = Plan::new(vec![step(&task, "(produce m1)", 0.0, 2.0)]);
    assert!(validate(&task, &plan).is_ok());
}

#[test]
fn test_courier_bike_plan_meets_deadline() {
    let task = task(&fixtures::COURIER);
    let plan = Plan::new(vec![
        step(&task, "(get-bike)", 0.0, 1.0),
        step(&task, "(ride)", 1.0, 2.0),
    ]);
    assert_eq!(validate(&task, &plan).unwrap().makespan, 3.0);
}

// ============================================================================
// Rejected Plans
// ============================================================================

#[test]
fn test_empty_plan_misses_goal() {
    let task = task(&fixtures::TRIVIAL);
    assert_eq!(
        validate(&task, &Plan::empty()),
        Err(ValidationError::GoalNotSatisfied {
            condition: "(done)".to_string()
        })
    );
}

#[test]
fn test_overlap_breaks_invariant() {
    let task = task(&fixtures::POWER);
    let plan = Plan::new(vec![
        step(&task, "(operate)", 0.0, 4.0),
        step(&task, "(maintain)", 1.0, 2.0),
    ]);
    match validate(&task, &plan) {
        Err(ValidationError::InvariantViolated {
            step,
            action,
            by,
            time,
            ..
        }) => {
            assert_eq!(step, 0);
            assert_eq!(action, "(operate)");
            assert_eq!(by, 1);
            assert_eq!(time, 1.0);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_self_overlap_rejected() {
    let task = task(&fixtures::POWER);
    let plan = Plan::new(vec![
        step(&task, "(operate)", 0.0, 4.0),
        step(&task, "(operate)", 1.0, 4.0),
    ]);
    assert!(matches!(
        validate(&task, &plan),
        Err(ValidationError::SelfOverlap { step: 1, .. })
    ));
}

#[test]
fn test_wrong_duration_rejected() {
    let task = task(&fixtures::TRIVIAL);
    let plan = Plan::new(vec![step(&task, "(finish)", 0.0, 2.0)]);
    assert!(matches!(
        validate(&task, &plan),
        Err(ValidationError::InvalidDuration { step: 0, .. })
    ));

    let task = self::task(&fixtures::FACTORY);
    let plan = Plan::new(vec![step(&task, "(produce m1)", 0.0, 3.0)]);
    assert!(matches!(
        validate(&task, &plan),
        Err(ValidationError::InvalidDuration { .. })
    ));
}

#[test]
fn test_unknown_action_rejected() {
    let task = task(&fixtures::TRIVIAL);
    let plan = Plan::new(vec![PlanStep::new(ActionId(0), "(start)", 0.0, 1.0)]);
    assert!(matches!(
        validate(&task, &plan),
        Err(ValidationError::UnknownAction { step: 0, .. })
    ));

    let plan = Plan::new(vec![PlanStep::new(ActionId(7), "(finish)", 0.0, 1.0)]);
    assert!(validate(&task, &plan).is_err());
}

#[test]
fn test_start_condition_violated() {
    let task = task(&fixtures::DELIVERY);
    let plan = Plan::new(vec![step(&task, "(drop r1 p1 office)", 0.0, 1.0)]);
    match validate(&task, &plan) {
        Err(ValidationError::StartConditionViolated { condition, .. }) => {
            assert_eq!(condition, "(holding r1 p1)")
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_end_condition_violated() {
    let domain = r#"
(define (domain gate)
  (:requirements :strips :durative-actions)
  (:predicates (open) (passed))
  (:durative-action pass
    :parameters ()
    :duration (= ?duration 2)
    :condition (at end (open))
    :effect (at end (passed)))
  (:durative-action shut
    :parameters ()
    :duration (= ?duration 1)
    :condition (at start (open))
    :effect (at start (not (open)))))
"#;
    let problem = r#"
(define (problem gate-1)
  (:domain gate)
  (:init (open))
  (:goal (passed)))
"#;
    let task = task_from(domain, problem);
    let plan = Plan::new(vec![
        step(&task, "(pass)", 0.0, 2.0),
        step(&task, "(shut)", 0.0, 1.0),
    ]);
    assert!(matches!(
        validate(&task, &plan),
        Err(ValidationError::EndConditionViolated { step: 0, .. })
    ));
}

#[test]
fn test_deadline_missed() {
    let task = task(&fixtures::COURIER);
    let plan = Plan::new(vec![step(&task, "(walk)", 0.0, 5.0)]);
    assert_eq!(
        validate(&task, &plan),
        Err(ValidationError::DeadlineMissed {
            makespan: 5.0,
            deadline: 3.5
        })
    );
}

#[test]
fn test_numeric_error_reported() {
    let task = task(&fixtures::LEDGER);
    let plan = Plan::new(vec![step(&task, "(settle)", 0.0, 1.0)]);
    assert!(matches!(
        validate(&task, &plan),
        Err(ValidationError::NumericEffect { step: 0, .. })
    ));
}
