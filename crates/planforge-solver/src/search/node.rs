//! Search nodes.
//!
//! A node is a state plus the clock and the durative actions still
//! executing. Nodes live in an arena and point to their parent by index;
//! the plan is read back along that chain.

use smallvec::SmallVec;

use planforge_core::{ActionId, FactId, GroundEffect, GroundTask, State};

/// Tolerance for comparing timepoints.
pub(crate) const EPSILON: f64 = 1e-9;

/// A durative action that has started and not yet ended.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RunningAction {
    pub action: ActionId,
    /// Index of the plan step that started it.
    pub step: usize,
    pub duration: f64,
    pub end: f64,
}

/// The happening that leads from a parent node to its child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Decision {
    Start {
        action: ActionId,
        step: usize,
        at: f64,
        /// `None` for instantaneous actions.
        duration: Option<f64>,
    },
    End {
        action: ActionId,
        step: usize,
        at: f64,
    },
}

impl Decision {
    /// One-line rendering for trace output.
    pub fn describe(&self, task: &GroundTask) -> String {
        match *self {
            Decision::Start {
                action,
                step,
                at,
                duration,
            } => format!(
                "start #{} {} at {} for {}",
                step,
                task.action(action).name,
                at,
                duration.unwrap_or(0.0)
            ),
            Decision::End { action, step, at } => {
                format!("end #{} {} at {}", step, task.action(action).name, at)
            }
        }
    }
}

/// Duplicate-detection key: the state and, for every running action, the
/// time it still needs and the duration it was started with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct NodeKey {
    state: State,
    running: SmallVec<[(ActionId, u64, u64); 4]>,
}

#[derive(Debug, Clone)]
pub(crate) struct SearchNode {
    pub state: State,
    pub now: f64,
    /// Sorted by `(end, step)`.
    pub running: SmallVec<[RunningAction; 4]>,
    pub next_step: usize,
    pub parent: Option<usize>,
    pub decision: Option<Decision>,
    pub h: u64,
    pub depth: u64,
}

impl SearchNode {
    pub fn root(state: State, h: u64) -> Self {
        Self {
            state,
            now: 0.0,
            running: SmallVec::new(),
            next_step: 0,
            parent: None,
            decision: None,
            h,
            depth: 0,
        }
    }

    /// A child reached by `decision`, still holding the parent's clock and
    /// running set.
    pub fn child(&self, parent: usize, state: State, decision: Decision) -> Self {
        Self {
            state,
            now: self.now,
            running: self.running.clone(),
            next_step: self.next_step,
            parent: Some(parent),
            decision: Some(decision),
            h: 0,
            depth: self.depth + 1,
        }
    }

    pub fn is_running(&self, action: ActionId) -> bool {
        self.running.iter().any(|r| r.action == action)
    }

    /// The running action that ends first.
    pub fn next_end(&self) -> Option<&RunningAction> {
        self.running.first()
    }

    pub fn insert_running(&mut self, running: RunningAction) {
        let pos = self.running.partition_point(|r| {
            r.end
                .total_cmp(&running.end)
                .then(r.step.cmp(&running.step))
                .is_lt()
        });
        self.running.insert(pos, running);
    }

    /// Facts the running actions add when they end.
    pub fn pending_adds(&self, task: &GroundTask) -> Vec<FactId> {
        self.running
            .iter()
            .flat_map(|r| task.action(r.action).end_effects.iter())
            .filter_map(|e| match e {
                GroundEffect::Add(f) => Some(*f),
                _ => None,
            })
            .collect()
    }

    /// No plan through this node can finish before this time.
    pub fn makespan_bound(&self) -> f64 {
        self.running.iter().map(|r| r.end).fold(self.now, f64::max)
    }

    pub fn key(&self) -> NodeKey {
        let mut running: SmallVec<[(ActionId, u64, u64); 4]> = self
            .running
            .iter()
            .map(|r| (r.action, (r.end - self.now).to_bits(), r.duration.to_bits()))
            .collect();
        running.sort_unstable();
        NodeKey {
            state: self.state.clone(),
            running,
        }
    }
}
