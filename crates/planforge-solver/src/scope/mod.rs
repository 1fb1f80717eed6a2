//! Search scope.
//!
//! [`SearchScope`] carries the mutable bookkeeping of one search run: the
//! start instant and the running statistics. The terminations read it;
//! the search loop owns it.

mod search;

pub use search::SearchScope;
