//! Shared test fixtures for PlanForge crates.
//!
//! This crate provides PDDL text and pure functions for testing.
//! It does NOT depend on the parser or the solver, so every crate in the
//! workspace can use it as a dev-dependency.
//!
//! - [`fixtures`] - hand-written domain/problem pairs with known outcomes
//! - [`random`] - seeded generator of small propositional temporal domains
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! planforge-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```ignore
//! use planforge_test::fixtures::{DELIVERY, TRIVIAL};
//! use planforge_test::random::{generate, RandomDomainConfig};
//! ```

pub mod fixtures;
pub mod random;

pub use fixtures::Fixture;
pub use random::{generate, GeneratedProblem, RandomDomainConfig};
