//! Error types for PlanForge

use thiserror::Error;

/// Main error type for PlanForge engine operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanForgeError {
    /// Malformed or semantically invalid domain/problem text
    #[error("Parse error: {0}")]
    Parse(String),

    /// Grounding would instantiate more actions than the configured budget
    #[error("Grounding limit exceeded: {required} ground actions required, limit is {limit}")]
    GroundingLimitExceeded {
        /// Configured instantiation budget.
        limit: u64,
        /// Number of bindings the domain would produce (saturating).
        required: u64,
    },

    /// A numeric effect evaluated to an undefined value
    #[error("Invalid numeric effect in {action}: {reason}")]
    InvalidNumericEffect {
        /// Display name of the ground action.
        action: String,
        /// What went wrong.
        reason: String,
    },

    /// The validator rejected a plan produced by the search engine
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// Invalid operation for the current engine state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias for PlanForge operations
pub type Result<T> = std::result::Result<T, PlanForgeError>;
