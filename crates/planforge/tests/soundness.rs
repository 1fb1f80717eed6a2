//! Property tests over seeded random domains.

use std::sync::Arc;

use planforge::{solve, PlannerConfig, SearchStrategy, Session, SolveBudget, SolveStatus};
use planforge_solver::{validate, Grounder};
use planforge_test::random::{generate, RandomDomainConfig};

const SEEDS: u64 = 40;

fn budget() -> SolveBudget {
    SolveBudget::new().with_max_search_nodes(5_000)
}

#[test]
fn test_returned_plans_replay() {
    let config = RandomDomainConfig::default();
    let mut solved = 0;

    for seed in 0..SEEDS {
        let generated = generate(seed, &config);
        let outcome = solve(&generated.domain, &generated.problem, &budget());
        assert!(
            matches!(
                outcome.status,
                SolveStatus::SolutionFound
                    | SolveStatus::NoSolution
                    | SolveStatus::SearchBudgetExceeded
            ),
            "seed {}: {} ({:?})\n{}\n{}",
            seed,
            outcome.status,
            outcome.diagnostics,
            generated.domain,
            generated.problem,
        );

        if let Some(plan) = outcome.plan {
            solved += 1;
            let (domain, problem) = planforge::parse(&generated.domain, &generated.problem).unwrap();
            let task = Grounder::new(&PlannerConfig::default())
                .ground(Arc::new(domain), Arc::new(problem))
                .unwrap();
            if let Err(err) = validate(&task, &plan) {
                panic!("seed {}: {}\n{}", seed, err, plan);
            }
        }
    }
    assert!(solved > 0);
}

#[test]
fn test_random_solves_deterministic() {
    let config = RandomDomainConfig {
        facts: 8,
        actions: 7,
        ..RandomDomainConfig::default()
    };
    for seed in 0..10 {
        let generated = generate(seed, &config);
        let first = solve(&generated.domain, &generated.problem, &budget());
        let second = solve(&generated.domain, &generated.problem, &budget());
        assert_eq!(first.status, second.status, "seed {}", seed);
        assert_eq!(first.plan, second.plan, "seed {}", seed);
    }
}

#[test]
fn test_strategies_agree_on_solvability() {
    // A complete strategy that exhausts the space proves there is no plan;
    // no other strategy may then find one.
    let config = RandomDomainConfig::default();
    for seed in 0..20 {
        let generated = generate(seed, &config);
        let statuses: Vec<SolveStatus> = [
            SearchStrategy::BestFirst,
            SearchStrategy::BreadthFirst,
            SearchStrategy::DepthFirst,
        ]
        .into_iter()
        .map(|strategy| {
            let session =
                Session::with_config(PlannerConfig::new().with_strategy(strategy)).unwrap();
            session
                .solve(&generated.domain, &generated.problem, &budget())
                .status
        })
        .collect();

        let proven_unsolvable = statuses.contains(&SolveStatus::NoSolution);
        let found = statuses.contains(&SolveStatus::SolutionFound);
        assert!(!(proven_unsolvable && found), "seed {}: {:?}", seed, statuses);
    }
}
