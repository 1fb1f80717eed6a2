//! Composite termination.
//!
//! Uses macro-generated tuple implementations, so a configured termination
//! is a single concrete type.

use super::Termination;
use crate::scope::SearchScope;

/// Combines terminations with OR logic: stops when ANY child stops.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use planforge_solver::termination::{
///     NodeCountTermination, OrTermination, Termination, TimeTermination,
/// };
/// use planforge_solver::SearchScope;
///
/// // Stop after 30 seconds OR 10 000 expansions
/// let termination = OrTermination((
///     TimeTermination::new(Duration::from_secs(30)),
///     NodeCountTermination::new(10_000),
/// ));
/// assert!(!termination.is_terminated(&SearchScope::new()));
/// ```
#[derive(Debug)]
pub struct OrTermination<T>(pub T);

impl<T> OrTermination<T> {
    /// Creates a new OR termination from a tuple of terminations.
    pub fn new(terminations: T) -> Self {
        Self(terminations)
    }
}

/// Generates `Termination` implementations for OR tuples.
macro_rules! impl_or_termination {
    ($($idx:tt: $T:ident),+) => {
        impl<$($T),+> Termination for OrTermination<($($T,)+)>
        where
            $($T: Termination,)+
        {
            fn is_terminated(&self, scope: &SearchScope) -> bool {
                $((self.0).$idx.is_terminated(scope))||+
            }
        }
    };
}

impl_or_termination!(0: T0);
impl_or_termination!(0: T0, 1: T1);
impl_or_termination!(0: T0, 1: T1, 2: T2);
impl_or_termination!(0: T0, 1: T1, 2: T2, 3: T3);
