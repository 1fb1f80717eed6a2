//! Seeded random temporal domains.
//!
//! Generates small propositional domains with durative actions, negative
//! preconditions and all three condition timings. The same seed always
//! yields the same text, so property tests are reproducible.
//!
//! # Example
//!
//! ```
//! use planforge_test::random::{generate, RandomDomainConfig};
//!
//! let a = generate(7, &RandomDomainConfig::default());
//! let b = generate(7, &RandomDomainConfig::default());
//! assert_eq!(a, b);
//! assert!(a.domain.contains(":durative-action"));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Shape of the generated domains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomDomainConfig {
    /// Number of propositions `p0..pn`.
    pub facts: usize,
    /// Number of durative actions.
    pub actions: usize,
    /// Upper bound on `at start` conditions per action.
    pub max_conditions: usize,
    /// Upper bound on effects per timepoint.
    pub max_effects: usize,
    /// Number of goal literals (fewer if not enough facts are ever added).
    pub goal_size: usize,
    /// Durations are drawn from `1..=max_duration`.
    pub max_duration: u32,
}

impl Default for RandomDomainConfig {
    fn default() -> Self {
        Self {
            facts: 6,
            actions: 5,
            max_conditions: 2,
            max_effects: 2,
            goal_size: 2,
            max_duration: 3,
        }
    }
}

/// Generated domain and problem text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProblem {
    pub seed: u64,
    pub domain: String,
    pub problem: String,
}

/// Generates a domain/problem pair from `seed`.
pub fn generate(seed: u64, config: &RandomDomainConfig) -> GeneratedProblem {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let facts = config.facts.max(1);
    let name = format!("random-{}", seed);

    let mut domain = format!(
        "(define (domain {})\n  (:requirements :strips :negative-preconditions :durative-actions)\n  (:predicates",
        name
    );
    for f in 0..facts {
        domain.push_str(&format!(" (p{})", f));
    }
    domain.push_str(")\n");

    let mut added = vec![false; facts];
    for a in 0..config.actions {
        let duration = rng.random_range(1..=config.max_duration.max(1));

        let mut conditions = Vec::new();
        for _ in 0..rng.random_range(0..=config.max_conditions) {
            let fact = rng.random_range(0..facts);
            let literal = if rng.random_bool(0.8) {
                format!("(p{})", fact)
            } else {
                format!("(not (p{}))", fact)
            };
            conditions.push(format!("(at start {})", literal));
        }
        if rng.random_bool(0.5) {
            conditions.push(format!("(over all (p{}))", rng.random_range(0..facts)));
        }
        if rng.random_bool(0.3) {
            conditions.push(format!("(at end (p{}))", rng.random_range(0..facts)));
        }

        let mut effects = Vec::new();
        for _ in 0..rng.random_range(0..=config.max_effects) {
            let fact = rng.random_range(0..facts);
            if rng.random_bool(0.5) {
                added[fact] = true;
                effects.push(format!("(at start (p{}))", fact));
            } else {
                effects.push(format!("(at start (not (p{})))", fact));
            }
        }
        for _ in 0..rng.random_range(1..=config.max_effects.max(1)) {
            let fact = rng.random_range(0..facts);
            if rng.random_bool(0.7) {
                added[fact] = true;
                effects.push(format!("(at end (p{}))", fact));
            } else {
                effects.push(format!("(at end (not (p{})))", fact));
            }
        }

        domain.push_str(&format!(
            "  (:durative-action a{}\n    :parameters ()\n    :duration (= ?duration {})\n    :condition (and {})\n    :effect (and {}))\n",
            a,
            duration,
            conditions.join(" "),
            effects.join(" ")
        ));
    }
    domain.push_str(")\n");

    let mut problem = format!(
        "(define (problem {}-p)\n  (:domain {})\n  (:init",
        name, name
    );
    for f in 0..facts {
        if rng.random_bool(0.5) {
            problem.push_str(&format!(" (p{})", f));
        }
    }
    problem.push_str(")\n  (:goal (and");
    let candidates: Vec<usize> = (0..facts).filter(|&f| added[f]).collect();
    let mut goal = Vec::new();
    for _ in 0..config.goal_size {
        if candidates.is_empty() {
            break;
        }
        let fact = candidates[rng.random_range(0..candidates.len())];
        if !goal.contains(&fact) {
            goal.push(fact);
        }
    }
    for fact in goal {
        problem.push_str(&format!(" (p{})", fact));
    }
    problem.push_str(")))\n");

    GeneratedProblem {
        seed,
        domain,
        problem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_text() {
        let config = RandomDomainConfig::default();
        assert_eq!(generate(3, &config), generate(3, &config));
    }

    #[test]
    fn test_different_seeds_differ() {
        let config = RandomDomainConfig::default();
        let texts: Vec<String> = (0..8).map(|s| generate(s, &config).domain).collect();
        assert!(texts.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_action_count() {
        let config = RandomDomainConfig {
            actions: 4,
            ..RandomDomainConfig::default()
        };
        let generated = generate(11, &config);
        assert_eq!(generated.domain.matches(":durative-action").count(), 4);
        assert!(generated.problem.contains("(:domain random-11)"));
    }
}
