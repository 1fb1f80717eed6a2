//! Configuration system for PlanForge.
//!
//! Load planner configuration from TOML or YAML files to control the search
//! strategy, the heuristic, termination budgets and grounding limits without
//! code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use planforge_config::{PlannerConfig, SearchStrategy};
//! use std::time::Duration;
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     deadline = 40.0
//!
//!     [search]
//!     strategy = "breadth_first"
//!     heuristic = "additive"
//!
//!     [termination]
//!     max_search_nodes = 50000
//!     seconds_spent_limit = 30
//! "#).unwrap();
//!
//! assert_eq!(config.search.strategy, SearchStrategy::BreadthFirst);
//! assert_eq!(config.time_limit(), Some(Duration::from_secs(30)));
//! assert_eq!(config.termination.max_search_nodes, Some(50000));
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use planforge_config::PlannerConfig;
//!
//! let config = PlannerConfig::load("planner.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;


/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main planner configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PlannerConfig {
    /// Search strategy and guidance.
    #[serde(default)]
    pub search: SearchConfig,

    /// Search budgets.
    #[serde(default)]
    pub termination: TerminationConfig,

    /// Grounding limits.
    #[serde(default)]
    pub grounding: GroundingConfig,

    /// Goal completion deadline; overrides a deadline given in the problem.
    #[serde(default)]
    pub deadline: Option<f64>,
}

impl PlannerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Bounds the number of node expansions.
    pub fn with_max_search_nodes(mut self, nodes: u64) -> Self {
        self.termination.max_search_nodes = Some(nodes);
        self
    }

    /// Sets a wall-clock limit for the search.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.termination.seconds_spent_limit = None;
        self.termination.millis_spent_limit = Some(limit.as_millis() as u64);
        self
    }

    /// Sets the goal completion deadline.
    pub fn with_deadline(mut self, deadline: f64) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.search.strategy = strategy;
        self
    }

    pub fn with_heuristic(mut self, heuristic: HeuristicType) -> Self {
        self.search.heuristic = heuristic;
        self
    }

    /// Keeps searching after the first plan for one with a smaller makespan.
    pub fn with_optimize_makespan(mut self, optimize: bool) -> Self {
        self.search.optimize_makespan = optimize;
        self
    }

    pub fn with_thread_count(mut self, threads: ThreadCount) -> Self {
        self.search.thread_count = threads;
        self
    }

    pub fn with_max_ground_actions(mut self, limit: u64) -> Self {
        self.grounding.max_ground_actions = limit;
        self
    }

    /// Returns the search time limit, if configured.
    ///
    /// Convenience method that delegates to `termination.time_limit()`.
    pub fn time_limit(&self) -> Option<Duration> {
        self.termination.time_limit()
    }

    /// Rejects values the planner cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(deadline) = self.deadline {
            if !deadline.is_finite() || deadline < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "deadline must be a non-negative number, got {}",
                    deadline
                )));
            }
        }
        if self.termination.max_search_nodes == Some(0) {
            return Err(ConfigError::Invalid(
                "max_search_nodes must be at least 1".to_string(),
            ));
        }
        if self.grounding.max_ground_actions == 0 {
            return Err(ConfigError::Invalid(
                "max_ground_actions must be at least 1".to_string(),
            ));
        }
        if self.search.thread_count == ThreadCount::Count(0) {
            return Err(ConfigError::Invalid(
                "thread_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Search configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchConfig {
    /// Order in which open nodes are expanded.
    #[serde(default)]
    pub strategy: SearchStrategy,

    /// Distance estimate used by best-first search.
    #[serde(default)]
    pub heuristic: HeuristicType,

    /// Branch-and-bound on makespan after the first plan is found.
    #[serde(default)]
    pub optimize_makespan: bool,

    /// Threads used to generate successors.
    #[serde(default)]
    pub thread_count: ThreadCount,
}

/// Node expansion order. All strategies are deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Lowest heuristic estimate first, then earliest time.
    #[default]
    BestFirst,

    /// Shallowest node first.
    BreadthFirst,

    /// Deepest node first.
    DepthFirst,
}

/// Heuristic estimate types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicType {
    /// Size of a relaxed plan extracted from the relaxed planning graph.
    #[default]
    RelaxedPlan,

    /// Sum of relaxed fact costs.
    Additive,

    /// Constant zero estimate.
    Blind,
}

/// Thread count configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadCount {
    /// Use the available parallelism of the machine.
    #[default]
    Auto,

    /// Generate successors on the calling thread.
    None,

    /// Specific number of threads.
    Count(usize),
}

impl ThreadCount {
    /// Resolves to a concrete thread count (at least 1).
    pub fn resolve(&self) -> usize {
        match self {
            ThreadCount::Auto => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            ThreadCount::None => 1,
            ThreadCount::Count(n) => (*n).max(1),
        }
    }
}

/// Termination configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TerminationConfig {
    /// Maximum number of node expansions.
    pub max_search_nodes: Option<u64>,

    /// Maximum seconds to spend searching.
    pub seconds_spent_limit: Option<u64>,

    /// Maximum milliseconds to spend searching (added to seconds).
    pub millis_spent_limit: Option<u64>,
}

impl TerminationConfig {
    /// Returns the time limit as a Duration, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        let millis = self
            .seconds_spent_limit
            .unwrap_or(0)
            .saturating_mul(1000)
            .saturating_add(self.millis_spent_limit.unwrap_or(0));
        if millis > 0 {
            Some(Duration::from_millis(millis))
        } else {
            None
        }
    }
}

fn default_max_ground_actions() -> u64 {
    1_000_000
}

/// Grounding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroundingConfig {
    /// Upper bound on parameter bindings enumerated across all schemas.
    #[serde(default = "default_max_ground_actions")]
    pub max_ground_actions: u64,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            max_ground_actions: default_max_ground_actions(),
        }
    }
}
