//! PlanForge PDDL - Domain and problem parsing
//!
//! Turns PDDL text into validated [`Domain`] and [`Problem`] declarations:
//! - `lexer`: case-insensitive tokens with line/column positions
//! - `sexpr`: s-expression tree
//! - domain and problem readers enforcing declared requirements, arity and
//!   typing of every referenced name
//!
//! Parsing stops at the first error; no partial declarations are returned.
//!
//! # Example
//!
//! ```
//! let domain = planforge_pddl::parse_domain(
//!     "(define (domain d) (:predicates (p)) (:action a :effect (p)))",
//! ).unwrap();
//! let problem = planforge_pddl::parse_problem(
//!     "(define (problem q) (:domain d) (:goal (p)))",
//!     &domain,
//! ).unwrap();
//! assert_eq!(problem.goal.len(), 1);
//! ```

mod context;
mod domain;
mod error;
mod lexer;
mod problem;
mod sexpr;


pub use domain::parse_domain;
pub use error::{Document, ParseError, ParseErrorKind, ParseResult};
pub use problem::parse_problem;
pub use sexpr::MAX_DEPTH;

use planforge_core::{Domain, Problem};

/// Parses a domain and a problem for it.
pub fn parse(domain_text: &str, problem_text: &str) -> ParseResult<(Domain, Problem)> {
    let domain = parse_domain(domain_text)?;
    let problem = parse_problem(problem_text, &domain)?;
    Ok((domain, problem))
}
