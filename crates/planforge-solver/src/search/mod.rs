//! Temporal forward search
//!
//! Decision epochs are the times at which something happens: the clock
//! starts at zero and advances either to the end of the running action that
//! finishes first, or to a time at which a newly started action would end
//! together with one already running. At each node the engine may start any
//! applicable ground action at one of those epochs, or end the earliest
//! running action. Ends that are due are always processed before anything
//! new starts. Inequality durations are tried at their chosen value and at
//! every value that lines the new end up with a running one.
//!
//! Epochs are a finite sample of dense time, so an exhausted space only
//! proves that no plan exists when every action is instantaneous or the
//! earliest-time relaxation in [`bound`] rules the goal out. Otherwise the
//! run ends [`SearchResult::Inconclusive`].
//!
//! Over-all conditions are checked after every happening while their action
//! is executing. Successors are generated in action-id order (in parallel
//! when configured, order-preserving), so two runs on the same task expand
//! the same nodes in the same order.

mod bound;
mod duration;
mod frontier;
mod node;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, trace};

use planforge_config::{SearchConfig, SearchStrategy};
use planforge_core::{
    ActionId, GroundAction, GroundDuration, GroundTask, Plan, PlanStep, Result, State, Timepoint,
};

use crate::heuristic::{build_heuristic, Heuristic};
use crate::scope::SearchScope;
use crate::termination::Termination;

use frontier::Frontier;
use node::{Decision, NodeKey, RunningAction, SearchNode, EPSILON};

pub(crate) use duration::{admits as duration_admits, choose as choose_duration};

/// How a search run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    /// A plan that reaches the goal (the best one found when optimizing).
    Solved(Plan),
    /// No plan exists.
    NoSolution,
    /// Every epoch the search considers was exhausted, but plans starting
    /// actions at other times were not ruled out.
    Inconclusive,
    /// A termination fired before the search was decided.
    BudgetExceeded,
}

impl SearchResult {
    pub fn plan(&self) -> Option<&Plan> {
        match self {
            SearchResult::Solved(plan) => Some(plan),
            _ => None,
        }
    }

    /// Snake-case name used in log events.
    pub fn label(&self) -> &'static str {
        match self {
            SearchResult::Solved(_) => "solved",
            SearchResult::NoSolution => "no_solution",
            SearchResult::Inconclusive => "inconclusive",
            SearchResult::BudgetExceeded => "budget_exceeded",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Choice {
    Start {
        action: ActionId,
        at: f64,
        /// `None` for instantaneous actions.
        duration: Option<f64>,
    },
    End,
}

/// Outcome of one successor attempt.
enum Expansion {
    Child(SearchNode),
    Inapplicable,
    DeadEnd,
    Pruned,
}

/// Forward search over a ground task.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use planforge_config::PlannerConfig;
/// use planforge_solver::termination::NodeCountTermination;
/// use planforge_solver::{Grounder, SearchResult, SearchScope, TemporalSearch};
///
/// let (domain, problem) = planforge_pddl::parse(
///     "(define (domain d) (:predicates (p)) (:action a :effect (p)))",
///     "(define (problem q) (:domain d) (:goal (p)))",
/// ).unwrap();
/// let config = PlannerConfig::default();
/// let task = Grounder::new(&config).ground(Arc::new(domain), Arc::new(problem)).unwrap();
///
/// let search = TemporalSearch::new(&task, &config.search);
/// let mut scope = SearchScope::new();
/// let result = search.run(&mut scope, &NodeCountTermination::new(100)).unwrap();
/// assert_eq!(result.plan().map(|p| p.len()), Some(1));
/// ```
#[derive(Debug)]
pub struct TemporalSearch<'t> {
    task: &'t GroundTask,
    heuristic: Box<dyn Heuristic>,
    strategy: SearchStrategy,
    optimize_makespan: bool,
    parallel: bool,
}

impl<'t> TemporalSearch<'t> {
    pub fn new(task: &'t GroundTask, config: &SearchConfig) -> Self {
        Self {
            task,
            heuristic: build_heuristic(config.heuristic, task),
            strategy: config.strategy,
            optimize_makespan: config.optimize_makespan,
            parallel: config.thread_count.resolve() > 1,
        }
    }

    /// Replaces the configured heuristic.
    pub fn with_heuristic(mut self, heuristic: Box<dyn Heuristic>) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Runs the search until a plan is found, the space is exhausted or
    /// `termination` fires.
    ///
    /// Fails with `InvalidNumericEffect` if an applicable action's numeric
    /// effect cannot be evaluated.
    pub fn run<T: Termination>(
        &self,
        scope: &mut SearchScope,
        termination: &T,
    ) -> Result<SearchResult> {
        scope.start_searching();
        scope.statistics_mut().record_task(self.task);
        info!(
            event = "search_start",
            strategy = ?self.strategy,
            heuristic = self.heuristic.name(),
            actions = self.task.actions.len(),
            optimize_makespan = self.optimize_makespan,
            parallel = self.parallel,
        );

        let initial = &self.task.initial_state;
        let Some(h) = self.heuristic.estimate(initial, &[]) else {
            scope.statistics_mut().record_dead_end();
            self.log_end(scope, "no_solution", None);
            return Ok(SearchResult::NoSolution);
        };

        let mut nodes = vec![SearchNode::root(initial.clone(), h)];
        let mut closed: HashMap<NodeKey, f64> = HashMap::new();
        closed.insert(nodes[0].key(), 0.0);
        let mut frontier = Frontier::new(self.strategy);
        frontier.push(0, &nodes[0]);

        let mut best: Option<(usize, f64)> = None;
        let mut first_plan: Option<usize> = None;
        let mut budget_exceeded = false;
        let mut last_progress = Instant::now();

        while let Some(index) = frontier.pop() {
            let node = &nodes[index];
            if best.is_some_and(|(_, makespan)| node.makespan_bound() >= makespan - EPSILON) {
                scope.statistics_mut().record_pruned();
                continue;
            }

            if self.is_goal(node) {
                scope.statistics_mut().record_plan();
                if !self.optimize_makespan {
                    first_plan = Some(index);
                    break;
                }
                if best.map_or(true, |(_, makespan)| node.now < makespan - EPSILON) {
                    debug!(event = "plan_improved", makespan = node.now, depth = node.depth);
                    best = Some((index, node.now));
                }
                continue;
            }

            if termination.is_terminated(scope) {
                budget_exceeded = true;
                break;
            }
            scope.statistics_mut().record_expansion();
            trace!(
                event = "expand",
                node = index,
                now = node.now,
                h = node.h,
                running = node.running.len(),
                decision = ?node.decision.map(|d| d.describe(self.task)),
            );

            let expansions = self.expand(index, node)?;
            let mut generated = 0u64;
            for expansion in expansions {
                let child = match expansion {
                    Expansion::Child(child) => child,
                    Expansion::Inapplicable => continue,
                    Expansion::DeadEnd => {
                        scope.statistics_mut().record_dead_end();
                        continue;
                    }
                    Expansion::Pruned => {
                        scope.statistics_mut().record_pruned();
                        continue;
                    }
                };
                if best.is_some_and(|(_, makespan)| child.makespan_bound() >= makespan - EPSILON) {
                    scope.statistics_mut().record_pruned();
                    continue;
                }
                let key = child.key();
                if closed.get(&key).is_some_and(|&seen| seen <= child.now + EPSILON) {
                    scope.statistics_mut().record_duplicate();
                    continue;
                }
                closed.insert(key, child.now);
                let child_index = nodes.len();
                nodes.push(child);
                frontier.push(child_index, &nodes[child_index]);
                generated += 1;
            }
            scope.statistics_mut().record_generated(generated);

            if last_progress.elapsed().as_secs() >= 1 {
                let stats = scope.statistics();
                debug!(
                    event = "progress",
                    expanded = stats.expanded,
                    generated = stats.generated,
                    open = frontier.len(),
                    best_makespan = best.map(|(_, m)| m),
                );
                last_progress = Instant::now();
            }
        }

        let result = match first_plan.or(best.map(|(index, _)| index)) {
            Some(index) => SearchResult::Solved(self.extract_plan(&nodes, index)),
            None if budget_exceeded => SearchResult::BudgetExceeded,
            None => self.exhausted(),
        };
        self.log_end(scope, result.label(), result.plan());
        Ok(result)
    }

    fn log_end(&self, scope: &mut SearchScope, outcome: &str, plan: Option<&Plan>) {
        let stats = scope.finish();
        info!(
            event = "search_end",
            outcome,
            expanded = stats.expanded,
            generated = stats.generated,
            duplicates = stats.duplicates,
            dead_ends = stats.dead_ends,
            plan_length = plan.map(Plan::len),
            makespan = plan.map(Plan::makespan),
            duration_ms = stats.elapsed.as_millis() as u64,
            speed = stats.nodes_per_second(),
        );
    }

    /// Classifies a run that ran out of nodes without a plan.
    fn exhausted(&self) -> SearchResult {
        let task = self.task;
        if task.actions.iter().all(|a| !a.is_durative()) {
            return SearchResult::NoSolution;
        }
        match bound::earliest_goal_time(task) {
            Some(t) if task.goal.meets_deadline(t) => {
                debug!(event = "exhausted_unproven", earliest_goal = t);
                SearchResult::Inconclusive
            }
            _ => SearchResult::NoSolution,
        }
    }

    fn is_goal(&self, node: &SearchNode) -> bool {
        node.running.is_empty()
            && node.state.satisfies_goal(&self.task.goal)
            && self.task.goal.meets_deadline(node.now)
    }

    /// Decisions available at `node`, in a fixed order.
    fn choices(&self, node: &SearchNode) -> Vec<Choice> {
        let Some(first_end) = node.next_end().map(|r| r.end) else {
            return self
                .task
                .actions
                .iter()
                .flat_map(|a| self.starts(node, a, f64::INFINITY))
                .collect();
        };
        if first_end <= node.now + EPSILON {
            return vec![Choice::End];
        }
        let mut choices: Vec<Choice> = self
            .task
            .actions
            .iter()
            .filter(|a| !node.is_running(a.id))
            .flat_map(|a| self.starts(node, a, first_end))
            .collect();
        choices.push(Choice::End);
        choices
    }

    /// Start decisions for `action` before `first_end`: now, plus every
    /// start time or duration that makes it end with a running action.
    fn starts(&self, node: &SearchNode, action: &GroundAction, first_end: f64) -> Vec<Choice> {
        let start = |at: f64, duration: Option<f64>| Choice::Start {
            action: action.id,
            at,
            duration,
        };
        let Some(constraint) = &action.duration else {
            return vec![start(node.now, None)];
        };
        let Some(chosen) = choose_duration(constraint, &node.state) else {
            return Vec::new();
        };

        let mut epochs: Vec<(f64, f64)> = vec![(node.now, chosen)];
        let mut consider = |at: f64, duration: f64| {
            let seen = epochs
                .iter()
                .any(|&(a, d)| (a - at).abs() <= EPSILON && (d - duration).abs() <= EPSILON);
            if !seen {
                epochs.push((at, duration));
            }
        };
        for running in &node.running {
            if matches!(constraint, GroundDuration::Bounded { .. }) {
                let remaining = running.end - node.now;
                if duration_admits(constraint, &node.state, remaining) {
                    consider(node.now, remaining);
                }
            }
            let aligned = running.end - chosen;
            if aligned > node.now + EPSILON && aligned < first_end - EPSILON {
                consider(aligned, chosen);
            }
        }
        epochs
            .into_iter()
            .map(|(at, duration)| start(at, Some(duration)))
            .collect()
    }

    fn expand(&self, index: usize, node: &SearchNode) -> Result<Vec<Expansion>> {
        let choices = self.choices(node);
        let expansions: Vec<Result<Expansion>> = if self.parallel && choices.len() > 1 {
            choices
                .par_iter()
                .map(|&choice| self.successor(index, node, choice))
                .collect()
        } else {
            choices
                .iter()
                .map(|&choice| self.successor(index, node, choice))
                .collect()
        };
        expansions.into_iter().collect()
    }

    fn successor(&self, index: usize, node: &SearchNode, choice: Choice) -> Result<Expansion> {
        match choice {
            Choice::Start {
                action,
                at,
                duration,
            } => self.start(index, node, action, at, duration),
            Choice::End => self.end(index, node),
        }
    }

    /// Starts `id` at `at`. Nothing happens between `node.now` and `at`, so
    /// the node's state is the state at `at`.
    fn start(
        &self,
        index: usize,
        node: &SearchNode,
        id: ActionId,
        at: f64,
        duration: Option<f64>,
    ) -> Result<Expansion> {
        let action = self.task.action(id);
        if !node.state.all_hold(&action.at_start, duration) {
            return Ok(Expansion::Inapplicable);
        }
        let end = at + duration.unwrap_or(0.0);
        if self.task.goal.deadline.is_some_and(|d| end > d + EPSILON) {
            return Ok(Expansion::Pruned);
        }

        let state = node.state.successor(action, Timepoint::Start, duration)?;
        if !state.all_hold(&action.over_all, duration) {
            return Ok(Expansion::Inapplicable);
        }
        if !self.invariants_hold(&state, node.running.iter()) {
            return Ok(Expansion::Inapplicable);
        }

        let step = node.next_step;
        let mut child = node.child(
            index,
            state,
            Decision::Start {
                action: id,
                step,
                at,
                duration,
            },
        );
        child.now = at;
        if let Some(duration) = duration {
            child.insert_running(RunningAction {
                action: id,
                step,
                duration,
                end,
            });
        }
        child.next_step += 1;
        Ok(self.evaluate(child))
    }

    fn end(&self, index: usize, node: &SearchNode) -> Result<Expansion> {
        let Some(running) = node.next_end() else {
            return Ok(Expansion::Inapplicable);
        };
        let action = self.task.action(running.action);
        if !node.state.all_hold(&action.at_end, Some(running.duration)) {
            return Ok(Expansion::Inapplicable);
        }
        let state = node
            .state
            .successor(action, Timepoint::End, Some(running.duration))?;
        if !self.invariants_hold(&state, node.running.iter().skip(1)) {
            return Ok(Expansion::Inapplicable);
        }

        let mut child = node.child(
            index,
            state,
            Decision::End {
                action: running.action,
                step: running.step,
                at: running.end,
            },
        );
        child.running.remove(0);
        child.now = node.now.max(running.end);
        Ok(self.evaluate(child))
    }

    fn invariants_hold<'a>(
        &self,
        state: &State,
        running: impl Iterator<Item = &'a RunningAction>,
    ) -> bool {
        let task = self.task;
        running.into_iter().all(|r| {
            state.all_hold(&task.action(r.action).over_all, Some(r.duration))
        })
    }

    fn evaluate(&self, mut child: SearchNode) -> Expansion {
        let pending = child.pending_adds(self.task);
        match self.heuristic.estimate(&child.state, &pending) {
            Some(h) => {
                child.h = h;
                Expansion::Child(child)
            }
            None => Expansion::DeadEnd,
        }
    }

    /// Collects the start decisions along the parent chain.
    fn extract_plan(&self, nodes: &[SearchNode], goal: usize) -> Plan {
        let mut steps = Vec::new();
        let mut cursor = Some(goal);
        while let Some(index) = cursor {
            let node = &nodes[index];
            if let Some(Decision::Start {
                action,
                at,
                duration,
                ..
            }) = node.decision
            {
                let name = &self.task.action(action).name;
                steps.push(PlanStep::new(action, name.as_str(), at, duration.unwrap_or(0.0)));
            }
            cursor = node.parent;
        }
        steps.reverse();
        Plan::new(steps)
    }
}
