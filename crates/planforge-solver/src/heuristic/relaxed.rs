//! Delete-relaxation estimators.
//!
//! Every durative action becomes one relaxed operator: it needs the positive
//! facts of all three condition timings (minus what it adds itself at start)
//! and adds everything it adds at either end. Deletes and numeric conditions
//! are ignored, so an unreachable goal fact proves a dead end.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use planforge_core::{DenseId, FactId, GroundCondition, GroundEffect, GroundTask, State};

use super::Heuristic;

const UNREACHED: u64 = u64::MAX;

#[derive(Debug, Clone)]
struct RelaxedOperator {
    preconditions: Vec<FactId>,
    effects: Vec<FactId>,
}

/// Fact costs and best supporters from one relaxed exploration.
struct Exploration {
    cost: Vec<u64>,
    supporter: Vec<Option<usize>>,
}

/// Relaxed operators of a ground task, shared by the additive and
/// relaxed-plan estimators.
#[derive(Debug, Clone)]
pub struct RelaxedPlanningGraph {
    operators: Vec<RelaxedOperator>,
    precondition_of: Vec<Vec<usize>>,
    goal: Vec<FactId>,
    /// The goal holds a condition decided false at grounding time.
    unreachable_goal: bool,
}

impl RelaxedPlanningGraph {
    pub fn new(task: &GroundTask) -> Self {
        let num_facts = task.num_facts();
        let mut operators = Vec::with_capacity(task.actions.len());
        let mut precondition_of = vec![Vec::new(); num_facts];

        for action in &task.actions {
            let start_adds: Vec<FactId> = action
                .start_effects
                .iter()
                .filter_map(|e| match e {
                    GroundEffect::Add(f) => Some(*f),
                    _ => None,
                })
                .collect();

            let mut preconditions: Vec<FactId> =
                action.at_start.iter().filter_map(GroundCondition::positive_fact).collect();
            for fact in action
                .over_all
                .iter()
                .chain(&action.at_end)
                .filter_map(GroundCondition::positive_fact)
            {
                if !start_adds.contains(&fact) {
                    preconditions.push(fact);
                }
            }
            preconditions.sort_unstable();
            preconditions.dedup();

            let mut effects: Vec<FactId> = action.add_effects().collect();
            effects.sort_unstable();
            effects.dedup();

            let index = operators.len();
            for fact in &preconditions {
                precondition_of[fact.index()].push(index);
            }
            operators.push(RelaxedOperator {
                preconditions,
                effects,
            });
        }

        let mut goal: Vec<FactId> = task
            .goal
            .conditions
            .iter()
            .filter_map(GroundCondition::positive_fact)
            .collect();
        goal.sort_unstable();
        goal.dedup();
        let unreachable_goal = task
            .goal
            .conditions
            .iter()
            .any(|c| matches!(c, GroundCondition::Constant(false)));

        Self {
            operators,
            precondition_of,
            goal,
            unreachable_goal,
        }
    }

    pub fn num_operators(&self) -> usize {
        self.operators.len()
    }

    /// Uniform-cost exploration with additive operator costs.
    ///
    /// Stops as soon as every goal fact is settled.
    fn explore(&self, state: &State, pending: &[FactId]) -> Exploration {
        let num_facts = self.precondition_of.len();
        let mut cost = vec![UNREACHED; num_facts];
        let mut supporter = vec![None; num_facts];
        let mut settled = vec![false; num_facts];
        let mut unsatisfied: Vec<usize> = self.operators.iter().map(|o| o.preconditions.len()).collect();
        let mut op_cost = vec![0u64; self.operators.len()];
        let mut queue = BinaryHeap::new();

        for fact in state.facts().iter().chain(pending.iter().copied()) {
            if fact.index() < num_facts && cost[fact.index()] != 0 {
                cost[fact.index()] = 0;
                queue.push(Reverse((0u64, fact.index())));
            }
        }

        for (op, operator) in self.operators.iter().enumerate() {
            if operator.preconditions.is_empty() {
                self.relax(op, 0, &mut cost, &mut supporter, &mut queue);
            }
        }

        let mut goals_left = self.goal.len();
        while let Some(Reverse((c, i))) = queue.pop() {
            if settled[i] || c > cost[i] {
                continue;
            }
            settled[i] = true;
            if self.goal.binary_search(&FactId::from_index(i)).is_ok() {
                goals_left -= 1;
                if goals_left == 0 {
                    break;
                }
            }
            for &op in &self.precondition_of[i] {
                unsatisfied[op] -= 1;
                op_cost[op] = op_cost[op].saturating_add(c);
                if unsatisfied[op] == 0 {
                    self.relax(op, op_cost[op], &mut cost, &mut supporter, &mut queue);
                }
            }
        }

        Exploration { cost, supporter }
    }

    /// Lowers the cost of every effect of `op`, reached at `base + 1`.
    fn relax(
        &self,
        op: usize,
        base: u64,
        cost: &mut [u64],
        supporter: &mut [Option<usize>],
        queue: &mut BinaryHeap<Reverse<(u64, usize)>>,
    ) {
        let reached = base.saturating_add(1);
        for fact in &self.operators[op].effects {
            let i = fact.index();
            if reached < cost[i] {
                cost[i] = reached;
                supporter[i] = Some(op);
                queue.push(Reverse((reached, i)));
            }
        }
    }

    fn goal_reachable(&self, exploration: &Exploration) -> bool {
        !self.unreachable_goal
            && self
                .goal
                .iter()
                .all(|f| exploration.cost[f.index()] != UNREACHED)
    }
}

/// Sum of the relaxed costs of the goal facts (h_add). Not admissible.
#[derive(Debug, Clone)]
pub struct AdditiveHeuristic {
    graph: RelaxedPlanningGraph,
}

impl AdditiveHeuristic {
    pub fn new(task: &GroundTask) -> Self {
        Self {
            graph: RelaxedPlanningGraph::new(task),
        }
    }
}

impl Heuristic for AdditiveHeuristic {
    fn estimate(&self, state: &State, pending: &[FactId]) -> Option<u64> {
        let exploration = self.graph.explore(state, pending);
        if !self.graph.goal_reachable(&exploration) {
            return None;
        }
        Some(
            self.graph
                .goal
                .iter()
                .fold(0u64, |sum, f| sum.saturating_add(exploration.cost[f.index()])),
        )
    }

    fn name(&self) -> &'static str {
        "additive"
    }
}

/// Size of a relaxed plan extracted backwards from the goal over the best
/// supporters of the additive exploration.
#[derive(Debug, Clone)]
pub struct RelaxedPlanHeuristic {
    graph: RelaxedPlanningGraph,
}

impl RelaxedPlanHeuristic {
    pub fn new(task: &GroundTask) -> Self {
        Self {
            graph: RelaxedPlanningGraph::new(task),
        }
    }
}

impl Heuristic for RelaxedPlanHeuristic {
    fn estimate(&self, state: &State, pending: &[FactId]) -> Option<u64> {
        let exploration = self.graph.explore(state, pending);
        if !self.graph.goal_reachable(&exploration) {
            return None;
        }

        let mut marked = vec![false; self.graph.operators.len()];
        let mut visited = vec![false; exploration.cost.len()];
        let mut open: Vec<FactId> = self.graph.goal.clone();
        let mut size = 0u64;
        while let Some(fact) = open.pop() {
            let i = fact.index();
            if visited[i] || exploration.cost[i] == 0 {
                continue;
            }
            visited[i] = true;
            let Some(op) = exploration.supporter[i] else {
                continue;
            };
            if !marked[op] {
                marked[op] = true;
                size += 1;
                open.extend(self.graph.operators[op].preconditions.iter().copied());
            }
        }
        Some(size)
    }

    fn name(&self) -> &'static str {
        "relaxed-plan"
    }
}
