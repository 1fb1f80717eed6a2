//! Plan validator
//!
//! Replays a timed plan against the ground task, independently of the
//! search that produced it. Every start and end is a happening; happenings
//! are applied in time order with ends before starts at equal times, and
//! plan order between equal happenings of the same kind. After each
//! happening the over-all conditions of every executing action must hold.

#[cfg(test)]
mod tests;

use thiserror::Error;
use tracing::debug;

use planforge_core::{
    DenseId, GroundAction, GroundCondition, GroundTask, Plan, PlanStep, PlanStepStatus, State,
    Timepoint,
};

use crate::search::duration_admits;

/// Why a plan does not solve the task.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("step {step}: unknown action {name}")]
    UnknownAction { step: usize, name: String },

    #[error("step {step}: duration {duration} is not allowed for {action}")]
    InvalidDuration {
        step: usize,
        action: String,
        duration: f64,
    },

    #[error("step {step}: {action} starts at {time} while already executing")]
    SelfOverlap {
        step: usize,
        action: String,
        time: f64,
    },

    #[error("step {step}: start condition {condition} of {action} fails at {time}")]
    StartConditionViolated {
        step: usize,
        action: String,
        condition: String,
        time: f64,
    },

    #[error("step {step}: end condition {condition} of {action} fails at {time}")]
    EndConditionViolated {
        step: usize,
        action: String,
        condition: String,
        time: f64,
    },

    #[error("step {step}: invariant {condition} of {action} broken at {time} by step {by}")]
    InvariantViolated {
        step: usize,
        action: String,
        condition: String,
        time: f64,
        /// Step whose happening broke the invariant.
        by: usize,
    },

    #[error("step {step}: numeric effect failed: {reason}")]
    NumericEffect { step: usize, reason: String },

    #[error("goal condition {condition} does not hold at the end of the plan")]
    GoalNotSatisfied { condition: String },

    #[error("makespan {makespan} exceeds the deadline {deadline}")]
    DeadlineMissed { makespan: f64, deadline: f64 },
}

/// Summary of a successful replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub makespan: f64,
    /// Starts and ends applied (instantaneous steps count once).
    pub happenings: usize,
}

#[derive(Debug, Clone, Copy)]
struct Happening {
    time: f64,
    at: Timepoint,
    step: usize,
}

/// Replays `plan` on `task`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use planforge_config::PlannerConfig;
/// use planforge_core::{ActionId, Plan, PlanStep};
/// use planforge_solver::{validate, Grounder};
///
/// let (domain, problem) = planforge_pddl::parse(
///     "(define (domain d) (:predicates (p)) (:action a :effect (p)))",
///     "(define (problem q) (:domain d) (:goal (p)))",
/// ).unwrap();
/// let task = Grounder::new(&PlannerConfig::default())
///     .ground(Arc::new(domain), Arc::new(problem))
///     .unwrap();
///
/// let plan = Plan::new(vec![PlanStep::new(ActionId(0), "(a)", 0.0, 0.0)]);
/// assert!(validate(&task, &plan).is_ok());
/// assert!(validate(&task, &Plan::empty()).is_err());
/// ```
pub fn validate(task: &GroundTask, plan: &Plan) -> Result<ValidationReport, ValidationError> {
    let steps = plan.steps();
    let actions = steps
        .iter()
        .enumerate()
        .map(|(i, step)| resolve(task, i, step))
        .collect::<Result<Vec<_>, _>>()?;

    let mut happenings = Vec::with_capacity(steps.len() * 2);
    for (i, (step, action)) in steps.iter().zip(&actions).enumerate() {
        happenings.push(Happening {
            time: step.start,
            at: Timepoint::Start,
            step: i,
        });
        if action.is_durative() {
            happenings.push(Happening {
                time: step.end(),
                at: Timepoint::End,
                step: i,
            });
        }
    }
    happenings.sort_by(|a, b| {
        a.time
            .total_cmp(&b.time)
            .then_with(|| end_first(a.at).cmp(&end_first(b.at)))
            .then(a.step.cmp(&b.step))
    });

    let mut replay = Replay {
        task,
        steps,
        actions: &actions,
        status: vec![PlanStepStatus::Scheduled; steps.len()],
        state: task.initial_state.clone(),
    };
    for happening in &happenings {
        replay.apply(happening)?;
    }

    if let Some(condition) = replay.state.first_violated(&task.goal.conditions, None) {
        return Err(ValidationError::GoalNotSatisfied {
            condition: task.condition_text(condition),
        });
    }
    let makespan = plan.makespan();
    if let Some(deadline) = task.goal.deadline {
        if !task.goal.meets_deadline(makespan) {
            return Err(ValidationError::DeadlineMissed { makespan, deadline });
        }
    }

    debug!(
        event = "plan_replayed",
        steps = steps.len(),
        happenings = happenings.len(),
        makespan,
    );
    Ok(ValidationReport {
        makespan,
        happenings: happenings.len(),
    })
}

fn end_first(at: Timepoint) -> u8 {
    match at {
        Timepoint::End => 0,
        Timepoint::Start => 1,
    }
}

fn resolve<'t>(
    task: &'t GroundTask,
    index: usize,
    step: &PlanStep,
) -> Result<&'t GroundAction, ValidationError> {
    task.actions
        .get(step.action.index())
        .filter(|a| a.name == step.name)
        .ok_or_else(|| ValidationError::UnknownAction {
            step: index,
            name: step.name.clone(),
        })
}

struct Replay<'a> {
    task: &'a GroundTask,
    steps: &'a [PlanStep],
    actions: &'a [&'a GroundAction],
    status: Vec<PlanStepStatus>,
    state: State,
}

impl Replay<'_> {
    fn apply(&mut self, happening: &Happening) -> Result<(), ValidationError> {
        let i = happening.step;
        let step = &self.steps[i];
        let action = self.actions[i];
        let time = happening.time;

        match happening.at {
            Timepoint::Start => {
                let duration = if action.is_durative() {
                    if self.is_executing(action) {
                        return Err(ValidationError::SelfOverlap {
                            step: i,
                            action: action.name.clone(),
                            time,
                        });
                    }
                    let admitted = action
                        .duration
                        .as_ref()
                        .is_some_and(|c| duration_admits(c, &self.state, step.duration));
                    if !admitted {
                        return Err(self.invalid_duration(i, action, step.duration));
                    }
                    Some(step.duration)
                } else {
                    if step.duration != 0.0 {
                        return Err(self.invalid_duration(i, action, step.duration));
                    }
                    None
                };

                if let Some(c) = self.state.first_violated(&action.at_start, duration) {
                    return Err(ValidationError::StartConditionViolated {
                        step: i,
                        action: action.name.clone(),
                        condition: self.task.condition_text(c),
                        time,
                    });
                }
                self.state = self.successor(i, action, Timepoint::Start, duration)?;
                self.status[i] = if action.is_durative() {
                    PlanStepStatus::Executing
                } else {
                    PlanStepStatus::Completed
                };
            }
            Timepoint::End => {
                let duration = Some(step.duration);
                if let Some(c) = self.state.first_violated(&action.at_end, duration) {
                    return Err(ValidationError::EndConditionViolated {
                        step: i,
                        action: action.name.clone(),
                        condition: self.task.condition_text(c),
                        time,
                    });
                }
                self.state = self.successor(i, action, Timepoint::End, duration)?;
                self.status[i] = PlanStepStatus::Completed;
            }
        }
        self.check_invariants(i, time)
    }

    fn successor(
        &self,
        step: usize,
        action: &GroundAction,
        at: Timepoint,
        duration: Option<f64>,
    ) -> Result<State, ValidationError> {
        self.state
            .successor(action, at, duration)
            .map_err(|err| ValidationError::NumericEffect {
                step,
                reason: err.to_string(),
            })
    }

    fn is_executing(&self, action: &GroundAction) -> bool {
        self.status
            .iter()
            .zip(self.actions)
            .any(|(s, a)| *s == PlanStepStatus::Executing && a.id == action.id)
    }

    fn invalid_duration(&self, step: usize, action: &GroundAction, duration: f64) -> ValidationError {
        ValidationError::InvalidDuration {
            step,
            action: action.name.clone(),
            duration,
        }
    }

    fn check_invariants(&self, by: usize, time: f64) -> Result<(), ValidationError> {
        for (i, status) in self.status.iter().enumerate() {
            if *status != PlanStepStatus::Executing {
                continue;
            }
            let action = self.actions[i];
            let duration = Some(self.steps[i].duration);
            if let Some(c) = self.state.first_violated(&action.over_all, duration) {
                return Err(invariant(self.task, i, action, c, time, by));
            }
        }
        Ok(())
    }
}

fn invariant(
    task: &GroundTask,
    step: usize,
    action: &GroundAction,
    condition: &GroundCondition,
    time: f64,
    by: usize,
) -> ValidationError {
    ValidationError::InvariantViolated {
        step,
        action: action.name.clone(),
        condition: task.condition_text(condition),
        time,
        by,
    }
}
