//! Numeric expressions shared by lifted schemas and ground actions.
//!
//! The leaf type `F` is the fluent reference: a lifted fluent template in
//! action schemas, a dense [`FluentId`](crate::task::FluentId) after grounding.

use std::fmt;

use thiserror::Error;

/// Arithmetic operator of a binary numeric expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// PDDL symbol of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Numeric comparison used in conditions and goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Less,
    LessOrEqual,
    Equal,
    GreaterOrEqual,
    Greater,
}

impl Comparison {
    /// Applies the comparison to two defined values.
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Less => lhs < rhs,
            Comparison::LessOrEqual => lhs <= rhs,
            Comparison::Equal => lhs == rhs,
            Comparison::GreaterOrEqual => lhs >= rhs,
            Comparison::Greater => lhs > rhs,
        }
    }

    /// PDDL symbol of the comparison.
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::Equal => "=",
            Comparison::GreaterOrEqual => ">=",
            Comparison::Greater => ">",
        }
    }
}

/// Numeric effect operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Increase,
    Decrease,
    ScaleUp,
    ScaleDown,
}

impl AssignOp {
    /// PDDL keyword of the operator.
    pub fn keyword(self) -> &'static str {
        match self {
            AssignOp::Assign => "assign",
            AssignOp::Increase => "increase",
            AssignOp::Decrease => "decrease",
            AssignOp::ScaleUp => "scale-up",
            AssignOp::ScaleDown => "scale-down",
        }
    }

    /// Combines the current fluent value with the effect amount.
    ///
    /// `current` is `None` when the fluent is undefined; only `assign` may
    /// define a fluent.
    pub fn apply(self, current: Option<f64>, amount: f64) -> Result<f64, EvalError> {
        let value = match (self, current) {
            (AssignOp::Assign, _) => amount,
            (_, None) => return Err(EvalError::UndefinedFluent),
            (AssignOp::Increase, Some(v)) => v + amount,
            (AssignOp::Decrease, Some(v)) => v - amount,
            (AssignOp::ScaleUp, Some(v)) => v * amount,
            (AssignOp::ScaleDown, Some(v)) => {
                if amount == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                v / amount
            }
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::NonFinite)
        }
    }
}

/// Failure while evaluating a numeric expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("fluent has no defined value")]
    UndefinedFluent,

    #[error("division by zero")]
    DivisionByZero,

    #[error("?duration is not available here")]
    DurationUnavailable,

    #[error("result is not a finite number")]
    NonFinite,
}

/// A numeric expression over fluents of type `F`.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericExpr<F> {
    /// Numeric literal.
    Number(f64),
    /// Current value of a fluent.
    Fluent(F),
    /// The `?duration` of the enclosing durative action.
    Duration,
    /// Binary arithmetic.
    Binary {
        op: BinaryOp,
        lhs: Box<NumericExpr<F>>,
        rhs: Box<NumericExpr<F>>,
    },
    /// Unary minus.
    Negate(Box<NumericExpr<F>>),
}

impl<F> NumericExpr<F> {
    /// Builds a binary expression.
    pub fn binary(op: BinaryOp, lhs: NumericExpr<F>, rhs: NumericExpr<F>) -> Self {
        NumericExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Evaluates the expression.
    ///
    /// `lookup` resolves fluent values; `duration` is the bound `?duration`
    /// when evaluated inside a durative action.
    pub fn eval<L>(&self, lookup: &L, duration: Option<f64>) -> Result<f64, EvalError>
    where
        L: Fn(&F) -> Option<f64>,
    {
        let value = match self {
            NumericExpr::Number(n) => *n,
            NumericExpr::Fluent(f) => lookup(f).ok_or(EvalError::UndefinedFluent)?,
            NumericExpr::Duration => duration.ok_or(EvalError::DurationUnavailable)?,
            NumericExpr::Negate(inner) => -inner.eval(lookup, duration)?,
            NumericExpr::Binary { op, lhs, rhs } => {
                let l = lhs.eval(lookup, duration)?;
                let r = rhs.eval(lookup, duration)?;
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => {
                        if r == 0.0 {
                            return Err(EvalError::DivisionByZero);
                        }
                        l / r
                    }
                }
            }
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::NonFinite)
        }
    }

    /// Rewrites every fluent leaf, keeping the expression shape.
    pub fn try_map_fluents<G, E, M>(&self, map: &mut M) -> Result<NumericExpr<G>, E>
    where
        M: FnMut(&F) -> Result<G, E>,
    {
        Ok(match self {
            NumericExpr::Number(n) => NumericExpr::Number(*n),
            NumericExpr::Fluent(f) => NumericExpr::Fluent(map(f)?),
            NumericExpr::Duration => NumericExpr::Duration,
            NumericExpr::Negate(inner) => NumericExpr::Negate(Box::new(inner.try_map_fluents(map)?)),
            NumericExpr::Binary { op, lhs, rhs } => NumericExpr::Binary {
                op: *op,
                lhs: Box::new(lhs.try_map_fluents(map)?),
                rhs: Box::new(rhs.try_map_fluents(map)?),
            },
        })
    }

    /// Visits every fluent leaf.
    pub fn for_each_fluent<V: FnMut(&F)>(&self, visit: &mut V) {
        match self {
            NumericExpr::Fluent(f) => visit(f),
            NumericExpr::Negate(inner) => inner.for_each_fluent(visit),
            NumericExpr::Binary { lhs, rhs, .. } => {
                lhs.for_each_fluent(visit);
                rhs.for_each_fluent(visit);
            }
            NumericExpr::Number(_) | NumericExpr::Duration => {}
        }
    }

    /// Returns true if the expression mentions `?duration`.
    pub fn uses_duration(&self) -> bool {
        match self {
            NumericExpr::Duration => true,
            NumericExpr::Negate(inner) => inner.uses_duration(),
            NumericExpr::Binary { lhs, rhs, .. } => lhs.uses_duration() || rhs.uses_duration(),
            NumericExpr::Number(_) | NumericExpr::Fluent(_) => false,
        }
    }

    /// Returns the value if the expression is a literal number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            NumericExpr::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Renders the expression with a caller-supplied fluent formatter.
    pub fn render<R>(&self, fluent: &R) -> String
    where
        R: Fn(&F) -> String,
    {
        match self {
            NumericExpr::Number(n) => format_number(*n),
            NumericExpr::Fluent(f) => fluent(f),
            NumericExpr::Duration => "?duration".to_string(),
            NumericExpr::Negate(inner) => format!("(- {})", inner.render(fluent)),
            NumericExpr::Binary { op, lhs, rhs } => format!(
                "({} {} {})",
                op.symbol(),
                lhs.render(fluent),
                rhs.render(fluent)
            ),
        }
    }
}

impl<F: fmt::Debug> fmt::Display for NumericExpr<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(&|leaf: &F| format!("{:?}", leaf)))
    }
}

/// Formats a number without a trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(f: &usize) -> Option<f64> {
        match f {
            0 => Some(4.0),
            1 => Some(0.0),
            _ => None,
        }
    }

    #[test]
    fn test_eval_arithmetic() {
        let expr = NumericExpr::binary(
            BinaryOp::Add,
            NumericExpr::Fluent(0usize),
            NumericExpr::binary(BinaryOp::Mul, NumericExpr::Number(2.0), NumericExpr::Duration),
        );
        assert_eq!(expr.eval(&lookup, Some(3.0)), Ok(10.0));
    }

    #[test]
    fn test_eval_division_by_zero() {
        let expr = NumericExpr::binary(
            BinaryOp::Div,
            NumericExpr::Fluent(0usize),
            NumericExpr::Fluent(1usize),
        );
        assert_eq!(expr.eval(&lookup, None), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_eval_undefined_fluent() {
        let expr: NumericExpr<usize> = NumericExpr::Fluent(7);
        assert_eq!(expr.eval(&lookup, None), Err(EvalError::UndefinedFluent));
    }

    #[test]
    fn test_eval_duration_unavailable() {
        let expr: NumericExpr<usize> = NumericExpr::Negate(Box::new(NumericExpr::Duration));
        assert_eq!(expr.eval(&lookup, None), Err(EvalError::DurationUnavailable));
        assert!(expr.uses_duration());
    }

    #[test]
    fn test_assign_ops() {
        assert_eq!(AssignOp::Assign.apply(None, 3.0), Ok(3.0));
        assert_eq!(AssignOp::Increase.apply(Some(1.0), 2.0), Ok(3.0));
        assert_eq!(AssignOp::Decrease.apply(Some(1.0), 2.0), Ok(-1.0));
        assert_eq!(AssignOp::ScaleUp.apply(Some(1.5), 2.0), Ok(3.0));
        assert_eq!(AssignOp::ScaleDown.apply(Some(3.0), 0.0), Err(EvalError::DivisionByZero));
        assert_eq!(AssignOp::Increase.apply(None, 1.0), Err(EvalError::UndefinedFluent));
    }

    #[test]
    fn test_comparison() {
        assert!(Comparison::Less.holds(1.0, 2.0));
        assert!(!Comparison::Greater.holds(1.0, 2.0));
        assert!(Comparison::Equal.holds(2.0, 2.0));
        assert!(Comparison::GreaterOrEqual.holds(2.0, 2.0));
    }

    #[test]
    fn test_map_fluents() {
        let expr = NumericExpr::binary(BinaryOp::Sub, NumericExpr::Fluent(1usize), NumericExpr::Number(1.0));
        let mapped: NumericExpr<String> = expr
            .try_map_fluents(&mut |f: &usize| Ok::<_, ()>(format!("f{}", f)))
            .unwrap();
        assert_eq!(mapped.render(&|s: &String| s.clone()), "(- f1 1)");
    }
}
