//! Timed plans

use std::fmt;

use crate::task::ActionId;

/// A ground action bound to a start time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanStep {
    pub action: ActionId,
    /// Rendered action, e.g. `(move r1 a b)`.
    pub name: String,
    pub start: f64,
    /// Zero for instantaneous actions.
    pub duration: f64,
}

impl PlanStep {
    pub fn new(action: ActionId, name: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            action,
            name: name.into(),
            start,
            duration,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}: {} [{:.3}]", self.start, self.name, self.duration)
    }
}

/// Lifecycle of a step while a plan is simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanStepStatus {
    /// Bound to a start time that has not been reached.
    Scheduled,
    /// Started, end not reached; over-all conditions are checked.
    Executing,
    /// End effects applied.
    Completed,
}

/// An ordered sequence of plan steps.
///
/// Steps are ordered by start time; steps with equal start times keep the
/// order in which they were given.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plan {
    steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(mut steps: Vec<PlanStep>) -> Self {
        steps.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self { steps }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlanStep> {
        self.steps.iter()
    }

    /// Time at which the last step completes; zero for an empty plan.
    pub fn makespan(&self) -> f64 {
        self.steps.iter().map(PlanStep::end).fold(0.0, f64::max)
    }

    pub fn into_steps(self) -> Vec<PlanStep> {
        self.steps
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a PlanStep;
    type IntoIter = std::slice::Iter<'a, PlanStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "{}", step)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_orders_by_start_stably() {
        let plan = Plan::new(vec![
            PlanStep::new(ActionId(2), "(c)", 1.0, 1.0),
            PlanStep::new(ActionId(0), "(a)", 0.0, 2.0),
            PlanStep::new(ActionId(1), "(b)", 1.0, 0.5),
        ]);
        let names: Vec<_> = plan.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["(a)", "(c)", "(b)"]);
        assert_eq!(plan.makespan(), 2.0);
    }

    #[test]
    fn test_plan_display() {
        let plan = Plan::new(vec![PlanStep::new(ActionId(0), "(move r1 a b)", 0.0, 2.5)]);
        assert_eq!(plan.to_string(), "0.000: (move r1 a b) [2.500]\n");
    }

    #[test]
    fn test_empty_plan() {
        let plan = Plan::empty();
        assert!(plan.is_empty());
        assert_eq!(plan.makespan(), 0.0);
    }
}
