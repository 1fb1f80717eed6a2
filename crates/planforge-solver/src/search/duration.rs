//! Duration constraints evaluated against a state.

use planforge_core::{GroundDuration, GroundExpr, State};

use super::node::EPSILON;

/// The duration a durative action is started with, or `None` if its
/// constraint cannot be evaluated or admits no positive value.
///
/// Exact durations are used as given. For inequalities the lower bound is
/// taken when it is positive, otherwise the upper bound.
pub(crate) fn choose(constraint: &GroundDuration, state: &State) -> Option<f64> {
    match constraint {
        GroundDuration::Exact(expr) => state.eval(expr, None).ok().filter(|d| *d > 0.0),
        GroundDuration::Bounded { lower, upper } => {
            let (lower, upper) = bounds(lower.as_ref(), upper.as_ref(), state)?;
            let candidate = match (lower, upper) {
                (Some(l), _) if l > 0.0 => l,
                (_, Some(u)) => u,
                (Some(l), None) => l,
                (None, None) => return None,
            };
            within(candidate, lower, upper).then_some(candidate)
        }
    }
}

/// Returns true if `value` satisfies the constraint in `state`.
pub(crate) fn admits(constraint: &GroundDuration, state: &State, value: f64) -> bool {
    if !(value.is_finite() && value > 0.0) {
        return false;
    }
    match constraint {
        GroundDuration::Exact(expr) => state
            .eval(expr, None)
            .is_ok_and(|d| (d - value).abs() <= EPSILON * d.abs().max(1.0)),
        GroundDuration::Bounded { lower, upper } => {
            match bounds(lower.as_ref(), upper.as_ref(), state) {
                Some((lower, upper)) => within(value, lower, upper),
                None => false,
            }
        }
    }
}

type Bounds = (Option<f64>, Option<f64>);

fn bounds(
    lower: Option<&GroundExpr>,
    upper: Option<&GroundExpr>,
    state: &State,
) -> Option<Bounds> {
    let eval = |e: Option<&GroundExpr>| match e {
        Some(e) => state.eval(e, None).ok().map(Some),
        None => Some(None),
    };
    Some((eval(lower)?, eval(upper)?))
}

fn within(value: f64, lower: Option<f64>, upper: Option<f64>) -> bool {
    value > 0.0
        && lower.map_or(true, |l| value >= l - EPSILON)
        && upper.map_or(true, |u| value <= u + EPSILON)
}
