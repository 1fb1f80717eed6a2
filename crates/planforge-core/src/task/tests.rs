//! Tests for the ground task types.

use std::sync::Arc;

use smallvec::smallvec;

use super::*;
use crate::domain::{PredicateSignature, TypeHierarchy, TypedParameter};
use crate::state::FactSet;

fn tiny_task() -> GroundTask {
    let mut domain = Domain::new("tiny");
    let at = domain
        .add_predicate(PredicateSignature {
            name: "at".to_string(),
            params: vec![TypedParameter::new("?x", TypeHierarchy::OBJECT)],
        })
        .unwrap();
    let mut objects = crate::domain::ObjectTable::new();
    let r1 = objects.insert("r1", TypeHierarchy::OBJECT).unwrap();
    let problem = Problem {
        name: "p".to_string(),
        domain_name: "tiny".to_string(),
        requirements: Default::default(),
        objects,
        init: vec![],
        init_fluents: vec![],
        goal: vec![],
        deadline: Some(5.0),
        metric: None,
    };

    let mut facts = SymbolTable::new();
    let f0: FactId = facts.intern(GroundAtom::new(at, [r1]));
    let mut set = FactSet::with_capacity(facts.len());
    set.insert(f0);

    GroundTask {
        facts,
        fluents: SymbolTable::new(),
        actions: vec![],
        initial_state: State::new(set, vec![]),
        goal: Goal {
            conditions: vec![GroundCondition::Fact {
                fact: f0,
                positive: false,
            }],
            deadline: Some(5.0),
        },
        domain: Arc::new(domain),
        problem: Arc::new(problem),
    }
}

#[test]
fn test_symbol_table_interns_once() {
    let mut table: SymbolTable<&str, FactId> = SymbolTable::new();
    let a = table.intern("a");
    let b = table.intern("b");
    assert_eq!(table.intern("a"), a);
    assert_eq!(a, FactId(0));
    assert_eq!(b, FactId(1));
    assert_eq!(table.lookup(&"b"), Some(b));
    assert_eq!(table.lookup(&"c"), None);
    assert_eq!(*table.get(b), "b");
    assert_eq!(table.len(), 2);
}

#[test]
fn test_rendering() {
    let task = tiny_task();
    assert_eq!(task.fact_name(FactId(0)), "(at r1)");
    assert_eq!(
        task.condition_text(&task.goal.conditions[0]),
        "(not (at r1))"
    );
    assert_eq!(task.to_string(), "tiny / p: 1 facts, 0 fluents, 0 actions, deadline 5");
}

#[test]
fn test_goal_deadline() {
    let task = tiny_task();
    assert!(task.goal.meets_deadline(5.0));
    assert!(!task.goal.meets_deadline(5.5));
    assert!(!task.initial_state.satisfies_goal(&task.goal));
    assert!(Goal::default().meets_deadline(1e9));
}

#[test]
fn test_add_effects() {
    let action = GroundAction {
        id: ActionId(0),
        schema: 0,
        name: "(a)".to_string(),
        args: smallvec![],
        duration: None,
        at_start: vec![],
        over_all: vec![],
        at_end: vec![],
        start_effects: vec![GroundEffect::Add(FactId(1)), GroundEffect::Delete(FactId(2))],
        end_effects: vec![GroundEffect::Add(FactId(3))],
    };
    assert_eq!(action.add_effects().collect::<Vec<_>>(), vec![FactId(1), FactId(3)]);
    assert!(!action.is_durative());
}
