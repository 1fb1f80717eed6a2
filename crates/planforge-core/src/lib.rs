//! PlanForge Core - Data model for temporal planning
//!
//! This crate provides the fundamental types shared by the parser, the
//! grounder, the search engine and the plan validator:
//! - Lifted declarations: types, objects, predicate and function
//!   signatures, action schemas with timed conditions and effects
//! - The ground task produced by instantiating schemas over objects
//! - The state model (closed-world facts plus numeric fluents)
//! - Timed plans
//! - The engine-level error taxonomy

pub mod domain;
pub mod error;
pub mod expr;
pub mod plan;
pub mod state;
pub mod task;

pub use domain::{
    ActionSchema, AtomTemplate, Condition, Domain, DurationConstraint, Effect, EffectTiming,
    FluentTemplate, FunctionId, FunctionSignature, GroundAtom, GroundFluent, Metric,
    MetricDirection, MetricTerm, ObjectDecl, ObjectId, ObjectTable, PredicateId,
    PredicateSignature, Problem, Requirement, Requirements, Term, TimedCondition, TimedEffect,
    Timing, TypeHierarchy, TypeId, TypedParameter,
};
pub use error::{PlanForgeError, Result};
pub use expr::{AssignOp, BinaryOp, Comparison, EvalError, NumericExpr};
pub use plan::{Plan, PlanStep, PlanStepStatus};
pub use state::{FactSet, State, StateDelta, Timepoint};
pub use task::{
    ActionId, DenseId, FactId, FluentId, Goal, GroundAction, GroundCondition, GroundDuration,
    GroundEffect, GroundExpr, GroundTask, SymbolTable,
};
