//! State model
//!
//! A [`State`] is a closed-world set of true facts plus the values of numeric
//! fluents. Both halves sit behind `Arc`s: successors share whatever they do
//! not change, and a published state is never mutated in place.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::PlanForgeError;
use crate::expr::EvalError;
use crate::task::{DenseId, FactId, FluentId, Goal, GroundAction, GroundCondition, GroundEffect, GroundExpr};

/// Bitset of true facts.
///
/// All sets built for one task share the same word count, so derived
/// equality and hashing are set equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FactSet {
    words: Vec<u64>,
}

impl FactSet {
    /// An empty set able to hold `num_facts` facts without growing.
    pub fn with_capacity(num_facts: usize) -> Self {
        Self {
            words: vec![0; num_facts.div_ceil(64)],
        }
    }

    pub fn contains(&self, fact: FactId) -> bool {
        let i = fact.index();
        self.words
            .get(i / 64)
            .is_some_and(|word| (word >> (i % 64)) & 1 == 1)
    }

    pub fn insert(&mut self, fact: FactId) {
        let i = fact.index();
        if i / 64 >= self.words.len() {
            self.words.resize(i / 64 + 1, 0);
        }
        self.words[i / 64] |= 1 << (i % 64);
    }

    pub fn remove(&mut self, fact: FactId) {
        let i = fact.index();
        if let Some(word) = self.words.get_mut(i / 64) {
            *word &= !(1 << (i % 64));
        }
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = FactId> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            (0..64)
                .filter(move |bit| (word >> bit) & 1 == 1)
                .map(move |bit| FactId::from_index(w * 64 + bit))
        })
    }
}

/// The two timepoints at which a ground action's effects apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timepoint {
    Start,
    End,
}

/// Changes produced by one timepoint of one action.
///
/// Numeric right-hand sides are evaluated in the state the delta was
/// computed from; `assignments` hold the final values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDelta {
    pub adds: Vec<FactId>,
    pub deletes: Vec<FactId>,
    pub assignments: Vec<(FluentId, f64)>,
}

impl StateDelta {
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.deletes.is_empty() && self.assignments.is_empty()
    }
}

/// Planning state with structural sharing.
#[derive(Debug, Clone)]
pub struct State {
    facts: Arc<FactSet>,
    fluents: Arc<Vec<Option<f64>>>,
}

impl State {
    pub fn new(facts: FactSet, fluents: Vec<Option<f64>>) -> Self {
        Self {
            facts: Arc::new(facts),
            fluents: Arc::new(fluents),
        }
    }

    /// Closed-world membership test.
    pub fn holds(&self, fact: FactId) -> bool {
        self.facts.contains(fact)
    }

    /// Current value of a fluent; `None` when undefined.
    pub fn fluent(&self, fluent: FluentId) -> Option<f64> {
        self.fluents.get(fluent.index()).copied().flatten()
    }

    pub fn facts(&self) -> &FactSet {
        &self.facts
    }

    pub fn fluent_values(&self) -> &[Option<f64>] {
        &self.fluents
    }

    pub fn eval(&self, expr: &GroundExpr, duration: Option<f64>) -> Result<f64, EvalError> {
        expr.eval(&|f: &FluentId| self.fluent(*f), duration)
    }

    /// Tests a single condition. Comparisons that cannot be evaluated are false.
    pub fn condition_holds(&self, condition: &GroundCondition, duration: Option<f64>) -> bool {
        match condition {
            GroundCondition::Fact { fact, positive } => self.holds(*fact) == *positive,
            GroundCondition::Compare { op, lhs, rhs } => {
                match (self.eval(lhs, duration), self.eval(rhs, duration)) {
                    (Ok(l), Ok(r)) => op.holds(l, r),
                    _ => false,
                }
            }
            GroundCondition::Constant(value) => *value,
        }
    }

    /// First condition of `conditions` that does not hold.
    pub fn first_violated<'a>(
        &self,
        conditions: &'a [GroundCondition],
        duration: Option<f64>,
    ) -> Option<&'a GroundCondition> {
        conditions
            .iter()
            .find(|c| !self.condition_holds(c, duration))
    }

    pub fn all_hold(&self, conditions: &[GroundCondition], duration: Option<f64>) -> bool {
        self.first_violated(conditions, duration).is_none()
    }

    /// Conjunctive goal entailment. The deadline is checked by the caller.
    pub fn satisfies_goal(&self, goal: &Goal) -> bool {
        self.all_hold(&goal.conditions, None)
    }

    /// Computes the delta of `action`'s effects at timepoint `at`.
    ///
    /// Numeric effects on the same fluent compose in declaration order.
    /// Undefined operands, division by zero and non-finite results fail with
    /// [`PlanForgeError::InvalidNumericEffect`].
    pub fn apply(
        &self,
        action: &GroundAction,
        at: Timepoint,
        duration: Option<f64>,
    ) -> Result<StateDelta, PlanForgeError> {
        let effects = match at {
            Timepoint::Start => &action.start_effects,
            Timepoint::End => &action.end_effects,
        };
        let mut delta = StateDelta::default();
        for effect in effects {
            match effect {
                GroundEffect::Add(fact) => delta.adds.push(*fact),
                GroundEffect::Delete(fact) => delta.deletes.push(*fact),
                GroundEffect::Numeric { op, fluent, value } => {
                    let invalid = |err: EvalError| PlanForgeError::InvalidNumericEffect {
                        action: action.name.clone(),
                        reason: format!("{} on fluent #{}: {}", op.keyword(), fluent.0, err),
                    };
                    let amount = self.eval(value, duration).map_err(invalid)?;
                    let slot = delta.assignments.iter().position(|(f, _)| f == fluent);
                    let current = match slot {
                        Some(i) => Some(delta.assignments[i].1),
                        None => self.fluent(*fluent),
                    };
                    let next = op.apply(current, amount).map_err(invalid)?;
                    match slot {
                        Some(i) => delta.assignments[i].1 = next,
                        None => delta.assignments.push((*fluent, next)),
                    }
                }
            }
        }
        Ok(delta)
    }

    /// Returns the successor state. Deletes are applied before adds, so a
    /// fact both deleted and added by the same happening ends up true.
    pub fn commit(&self, delta: &StateDelta) -> State {
        let mut next = self.clone();
        if !delta.adds.is_empty() || !delta.deletes.is_empty() {
            let facts = Arc::make_mut(&mut next.facts);
            for &fact in &delta.deletes {
                facts.remove(fact);
            }
            for &fact in &delta.adds {
                facts.insert(fact);
            }
        }
        if !delta.assignments.is_empty() {
            let fluents = Arc::make_mut(&mut next.fluents);
            for &(fluent, value) in &delta.assignments {
                let i = fluent.index();
                if i >= fluents.len() {
                    fluents.resize(i + 1, None);
                }
                fluents[i] = Some(value);
            }
        }
        next
    }

    /// `apply` followed by `commit`.
    pub fn successor(
        &self,
        action: &GroundAction,
        at: Timepoint,
        duration: Option<f64>,
    ) -> Result<State, PlanForgeError> {
        let delta = self.apply(action, at, duration)?;
        Ok(self.commit(&delta))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.facts == other.facts
            && self.fluents.len() == other.fluents.len()
            && self
                .fluents
                .iter()
                .zip(other.fluents.iter())
                .all(|(a, b)| a.map(f64::to_bits) == b.map(f64::to_bits))
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.facts.hash(state);
        for value in self.fluents.iter() {
            value.map(f64::to_bits).hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;
    use crate::expr::{AssignOp, Comparison, NumericExpr};
    use crate::task::ActionId;

    fn action(start_effects: Vec<GroundEffect>) -> GroundAction {
        GroundAction {
            id: ActionId(0),
            schema: 0,
            name: "(act)".to_string(),
            args: smallvec![],
            duration: None,
            at_start: vec![],
            over_all: vec![],
            at_end: vec![],
            start_effects,
            end_effects: vec![],
        }
    }

    fn state(facts: &[u32], fluents: Vec<Option<f64>>) -> State {
        let mut set = FactSet::with_capacity(8);
        for &f in facts {
            set.insert(FactId(f));
        }
        State::new(set, fluents)
    }

    #[test]
    fn test_closed_world() {
        let s = state(&[1], vec![]);
        assert!(s.holds(FactId(1)));
        assert!(!s.holds(FactId(2)));
        assert!(!s.holds(FactId(500)));
        assert!(s.condition_holds(
            &GroundCondition::Fact {
                fact: FactId(2),
                positive: false
            },
            None
        ));
    }

    #[test]
    fn test_add_wins_over_delete() {
        let s = state(&[0], vec![]);
        let a = action(vec![
            GroundEffect::Add(FactId(0)),
            GroundEffect::Delete(FactId(0)),
            GroundEffect::Add(FactId(3)),
        ]);
        let next = s.successor(&a, Timepoint::Start, None).unwrap();
        assert!(next.holds(FactId(0)));
        assert!(next.holds(FactId(3)));
        assert!(s.holds(FactId(0)));
        assert!(!s.holds(FactId(3)));
    }

    #[test]
    fn test_numeric_effects_compose() {
        let s = state(&[], vec![Some(10.0)]);
        let a = action(vec![
            GroundEffect::Numeric {
                op: AssignOp::Increase,
                fluent: FluentId(0),
                value: NumericExpr::Number(5.0),
            },
            GroundEffect::Numeric {
                op: AssignOp::ScaleUp,
                fluent: FluentId(0),
                value: NumericExpr::Fluent(FluentId(0)),
            },
        ]);
        // The scale factor is read from the pre-state (10), applied to 15.
        let next = s.successor(&a, Timepoint::Start, None).unwrap();
        assert_eq!(next.fluent(FluentId(0)), Some(150.0));
    }

    #[test]
    fn test_invalid_numeric_effect() {
        let s = state(&[], vec![Some(1.0), None]);
        let divide = action(vec![GroundEffect::Numeric {
            op: AssignOp::ScaleDown,
            fluent: FluentId(0),
            value: NumericExpr::Number(0.0),
        }]);
        let err = s.apply(&divide, Timepoint::Start, None).unwrap_err();
        assert!(matches!(err, PlanForgeError::InvalidNumericEffect { .. }));

        let undefined = action(vec![GroundEffect::Numeric {
            op: AssignOp::Increase,
            fluent: FluentId(1),
            value: NumericExpr::Number(1.0),
        }]);
        assert!(s.apply(&undefined, Timepoint::Start, None).is_err());
    }

    #[test]
    fn test_comparison_on_undefined_is_false() {
        let s = state(&[], vec![None]);
        let cond = GroundCondition::Compare {
            op: Comparison::GreaterOrEqual,
            lhs: NumericExpr::Fluent(FluentId(0)),
            rhs: NumericExpr::Number(0.0),
        };
        assert!(!s.condition_holds(&cond, None));
    }

    #[test]
    fn test_equal_states_hash_equal() {
        use std::collections::HashSet;

        let a = state(&[1, 2], vec![Some(1.0)]);
        let b = state(&[2, 1], vec![Some(1.0)]);
        let c = state(&[1, 2], vec![Some(2.0)]);
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn test_fact_set_iter() {
        let mut set = FactSet::with_capacity(130);
        set.insert(FactId(0));
        set.insert(FactId(64));
        set.insert(FactId(129));
        set.remove(FactId(64));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![FactId(0), FactId(129)]);
        assert_eq!(set.count(), 2);
    }
}
