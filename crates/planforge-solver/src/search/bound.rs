//! Earliest-time relaxation.
//!
//! Ignores deletes, negative conditions and numeric conditions, and runs
//! every action with the shortest duration it could possibly take. The
//! resulting goal time is a lower bound on the makespan of any plan,
//! whatever start times that plan uses.

use planforge_core::{
    DenseId, FactId, FluentId, GroundAction, GroundCondition, GroundDuration, GroundEffect,
    GroundExpr, GroundTask,
};

/// Earliest time at which every positive goal fact can hold, or `None` if
/// some goal fact is unreachable even in the relaxation.
pub(crate) fn earliest_goal_time(task: &GroundTask) -> Option<f64> {
    if task
        .goal
        .conditions
        .iter()
        .any(|c| matches!(c, GroundCondition::Constant(false)))
    {
        return None;
    }

    let mut time = vec![f64::INFINITY; task.num_facts()];
    for fact in task.initial_state.facts().iter() {
        if let Some(t) = time.get_mut(fact.index()) {
            *t = 0.0;
        }
    }
    let durations: Vec<f64> = task.actions.iter().map(shortest_duration).collect();

    // Times only decrease, and each pass settles at least one more fact.
    for _ in 0..=task.num_facts() {
        let mut changed = false;
        for (action, &duration) in task.actions.iter().zip(&durations) {
            changed |= relax(action, duration, &mut time);
        }
        if !changed {
            break;
        }
    }

    task.goal
        .conditions
        .iter()
        .filter_map(GroundCondition::positive_fact)
        .map(|f| time[f.index()])
        .try_fold(0.0f64, |latest, t| t.is_finite().then(|| latest.max(t)))
}

/// Lowers the times of `action`'s adds; true if any changed.
fn relax(action: &GroundAction, duration: f64, time: &mut [f64]) -> bool {
    let start_adds: Vec<FactId> = adds(&action.start_effects).collect();
    let (start, end) = {
        let view: &[f64] = time;
        let start = action
            .at_start
            .iter()
            .filter_map(GroundCondition::positive_fact)
            .fold(0.0f64, |latest, f| latest.max(view[f.index()]));
        let end = action
            .over_all
            .iter()
            .chain(&action.at_end)
            .filter_map(GroundCondition::positive_fact)
            .filter(|f| !start_adds.contains(f))
            .fold(start + duration, |latest, f| latest.max(view[f.index()]));
        (start, end)
    };
    if !start.is_finite() {
        return false;
    }

    let mut changed = false;
    let reached = start_adds
        .iter()
        .map(|&f| (f, start))
        .chain(adds(&action.end_effects).map(|f| (f, end)));
    for (fact, at) in reached {
        if at < time[fact.index()] {
            time[fact.index()] = at;
            changed = true;
        }
    }
    changed
}

fn adds(effects: &[GroundEffect]) -> impl Iterator<Item = FactId> + '_ {
    effects.iter().filter_map(|e| match e {
        GroundEffect::Add(f) => Some(*f),
        _ => None,
    })
}

/// A duration no execution of the action can undercut. Durations that
/// depend on fluents count as zero.
fn shortest_duration(action: &GroundAction) -> f64 {
    let constant = |e: &GroundExpr| e.eval(&|_: &FluentId| None, None).ok();
    let shortest = match &action.duration {
        None => None,
        Some(GroundDuration::Exact(expr)) => constant(expr),
        Some(GroundDuration::Bounded { lower, .. }) => lower.as_ref().and_then(constant),
    };
    shortest.map_or(0.0, |d| d.max(0.0))
}
