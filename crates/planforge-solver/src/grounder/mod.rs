//! Grounder
//!
//! Instantiates every action schema over the type extensions of its
//! parameters. Schemas are grounded in parallel into object-level actions;
//! interning to dense ids then runs serially, so ids and action order never
//! depend on thread scheduling.
//!
//! Static predicates and functions (never changed by any effect) are
//! compiled away: a binding whose static condition fails is dropped, and a
//! satisfied static condition is removed from the ground action.


use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::info;

use planforge_config::PlannerConfig;
use planforge_core::domain::LiftedExpr;
use planforge_core::{
    ActionId, ActionSchema, AssignOp, AtomTemplate, Comparison, Condition, DenseId, Domain,
    DurationConstraint, Effect, EffectTiming, FactId, FactSet, FluentId, FluentTemplate, Goal,
    GroundAction, GroundAtom, GroundCondition, GroundDuration, GroundEffect, GroundExpr,
    GroundFluent, GroundTask, NumericExpr, ObjectId, PlanForgeError, Problem, Result, State,
    SymbolTable, Timing, TypeId,
};

/// Numeric expression over object-level fluents, before interning.
type BoundExpr = NumericExpr<GroundFluent>;

enum BoundCondition {
    Fact { atom: GroundAtom, positive: bool },
    Compare {
        op: Comparison,
        lhs: BoundExpr,
        rhs: BoundExpr,
    },
}

enum BoundEffect {
    Add(GroundAtom),
    Delete(GroundAtom),
    Numeric {
        op: AssignOp,
        fluent: GroundFluent,
        value: BoundExpr,
    },
}

enum BoundDuration {
    Exact(BoundExpr),
    Bounded {
        lower: Option<BoundExpr>,
        upper: Option<BoundExpr>,
    },
}

struct BoundAction {
    schema: usize,
    args: SmallVec<[ObjectId; 4]>,
    duration: Option<BoundDuration>,
    at_start: Vec<BoundCondition>,
    over_all: Vec<BoundCondition>,
    at_end: Vec<BoundCondition>,
    start_effects: Vec<BoundEffect>,
    end_effects: Vec<BoundEffect>,
}

/// Outcome of resolving one condition under a binding.
enum Resolved {
    Keep(BoundCondition),
    Holds,
    Fails,
}

/// Grounds a parsed domain and problem into a [`GroundTask`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use planforge_config::PlannerConfig;
/// use planforge_solver::Grounder;
///
/// let (domain, problem) = planforge_pddl::parse(
///     "(define (domain d) (:predicates (p)) (:action a :effect (p)))",
///     "(define (problem q) (:domain d) (:goal (p)))",
/// ).unwrap();
/// let task = Grounder::new(&PlannerConfig::default())
///     .ground(Arc::new(domain), Arc::new(problem))
///     .unwrap();
/// assert_eq!(task.actions.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Grounder {
    max_ground_actions: u64,
    deadline: Option<f64>,
}

impl Grounder {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            max_ground_actions: config.grounding.max_ground_actions,
            deadline: config.deadline,
        }
    }

    /// Instantiates all actions, the goal and the initial state.
    ///
    /// Fails with [`PlanForgeError::GroundingLimitExceeded`] before
    /// enumerating anything if the bindings would exceed the budget.
    pub fn ground(&self, domain: Arc<Domain>, problem: Arc<Problem>) -> Result<GroundTask> {
        let start = Instant::now();
        info!(
            event = "grounding_start",
            domain = %domain.name,
            problem = %problem.name,
            schemas = domain.actions.len(),
            objects = problem.objects.len(),
        );

        let extents: Vec<Vec<Vec<ObjectId>>> = domain
            .actions
            .iter()
            .map(|schema| {
                schema
                    .parameters
                    .iter()
                    .map(|p| problem.objects.of_type(&domain.types, p.ty))
                    .collect()
            })
            .collect();

        let required = extents.iter().fold(0u64, |total, params| {
            let bindings = params
                .iter()
                .fold(1u64, |n, objects| n.saturating_mul(objects.len() as u64));
            total.saturating_add(bindings)
        });
        if required > self.max_ground_actions {
            return Err(PlanForgeError::GroundingLimitExceeded {
                limit: self.max_ground_actions,
                required,
            });
        }

        let statics = StaticContext::new(&domain, &problem);
        let grounded: Vec<(Vec<BoundAction>, u64)> = domain
            .actions
            .par_iter()
            .zip(extents.par_iter())
            .enumerate()
            .map(|(index, (schema, extent))| statics.ground_schema(index, schema, extent))
            .collect();

        let mut interner = Interner::default();
        for atom in &problem.init {
            interner.facts.intern(atom.clone());
        }
        for (fluent, _) in &problem.init_fluents {
            interner.fluents.intern(fluent.clone());
        }

        let mut goal_conditions = Vec::new();
        for condition in &problem.goal {
            match statics.condition(condition, &[]) {
                Resolved::Holds => {}
                Resolved::Fails => goal_conditions.push(GroundCondition::Constant(false)),
                Resolved::Keep(bound) => goal_conditions.push(interner.condition(bound)),
            }
        }

        let mut pruned = 0u64;
        let mut actions = Vec::new();
        for (bound_actions, dropped) in grounded {
            pruned += dropped;
            for bound in bound_actions {
                let id = ActionId::from_index(actions.len());
                let name = GroundTask::render_action(&domain, &problem, bound.schema, &bound.args);
                actions.push(interner.action(id, name, bound));
            }
        }

        let mut facts = FactSet::with_capacity(interner.facts.len());
        for atom in &problem.init {
            if let Some(id) = interner.facts.lookup(atom) {
                facts.insert(id);
            }
        }
        let mut values = vec![None; interner.fluents.len()];
        for (fluent, value) in &problem.init_fluents {
            if let Some(id) = interner.fluents.lookup(fluent) {
                values[id.index()] = Some(*value);
            }
        }

        let task = GroundTask {
            facts: interner.facts,
            fluents: interner.fluents,
            actions,
            initial_state: State::new(facts, values),
            goal: Goal {
                conditions: goal_conditions,
                deadline: self.deadline.or(problem.deadline),
            },
            domain,
            problem,
        };

        info!(
            event = "grounding_end",
            facts = task.num_facts(),
            fluents = task.num_fluents(),
            actions = task.actions.len(),
            pruned,
            duration_ms = start.elapsed().as_millis() as u64,
        );
        Ok(task)
    }
}

/// Read-only view of what never changes: shared by all grounding workers.
struct StaticContext<'a> {
    domain: &'a Domain,
    problem: &'a Problem,
    static_predicates: Vec<bool>,
    static_functions: Vec<bool>,
    init_atoms: HashSet<&'a GroundAtom>,
    init_values: HashMap<&'a GroundFluent, f64>,
}

impl<'a> StaticContext<'a> {
    fn new(domain: &'a Domain, problem: &'a Problem) -> Self {
        Self {
            domain,
            problem,
            static_predicates: domain.static_predicates(),
            static_functions: domain.static_functions(),
            init_atoms: problem.init.iter().collect(),
            init_values: problem.init_fluents.iter().map(|(f, v)| (f, *v)).collect(),
        }
    }

    /// Enumerates bindings in lexicographic order, last parameter fastest.
    /// Returns the kept actions and the number of dropped bindings.
    fn ground_schema(
        &self,
        index: usize,
        schema: &ActionSchema,
        extent: &[Vec<ObjectId>],
    ) -> (Vec<BoundAction>, u64) {
        let mut actions = Vec::new();
        let mut pruned = 0u64;
        if extent.iter().any(Vec::is_empty) {
            return (actions, pruned);
        }

        let mut counters = vec![0usize; extent.len()];
        'bindings: loop {
            let args: SmallVec<[ObjectId; 4]> = counters
                .iter()
                .zip(extent)
                .map(|(&i, objects)| objects[i])
                .collect();
            match self.instantiate(index, schema, args) {
                Some(action) => actions.push(action),
                None => pruned += 1,
            }

            let mut pos = extent.len();
            loop {
                if pos == 0 {
                    break 'bindings;
                }
                pos -= 1;
                counters[pos] += 1;
                if counters[pos] < extent[pos].len() {
                    break;
                }
                counters[pos] = 0;
            }
        }
        (actions, pruned)
    }

    fn instantiate(
        &self,
        index: usize,
        schema: &ActionSchema,
        args: SmallVec<[ObjectId; 4]>,
    ) -> Option<BoundAction> {
        let mut at_start = Vec::new();
        let mut over_all = Vec::new();
        let mut at_end = Vec::new();
        for timed in &schema.conditions {
            let condition = match self.condition(&timed.condition, &args) {
                Resolved::Holds => continue,
                Resolved::Fails => return None,
                Resolved::Keep(condition) => condition,
            };
            match timed.timing {
                Timing::AtStart => at_start.push(condition),
                Timing::OverAll => over_all.push(condition),
                Timing::AtEnd => at_end.push(condition),
            }
        }

        let mut start_effects = Vec::new();
        let mut end_effects = Vec::new();
        for timed in &schema.effects {
            let effect = self.effect(&timed.effect, &args)?;
            match timed.timing {
                EffectTiming::AtStart => start_effects.push(effect),
                EffectTiming::AtEnd => end_effects.push(effect),
            }
        }

        let duration = match &schema.duration {
            None => None,
            Some(DurationConstraint::Exact(expr)) => {
                let expr = self.expr(expr, &args)?;
                if is_constant(&expr) {
                    // A constant duration that can never be positive makes the action unusable.
                    match expr.eval(&|_: &GroundFluent| None, None) {
                        Ok(d) if d > 0.0 => {}
                        _ => return None,
                    }
                }
                Some(BoundDuration::Exact(expr))
            }
            Some(DurationConstraint::Bounded { lower, upper }) => {
                let lower = match lower {
                    Some(e) => Some(self.expr(e, &args)?),
                    None => None,
                };
                let upper = match upper {
                    Some(e) => Some(self.expr(e, &args)?),
                    None => None,
                };
                Some(BoundDuration::Bounded { lower, upper })
            }
        };

        Some(BoundAction {
            schema: index,
            args,
            duration,
            at_start,
            over_all,
            at_end,
            start_effects,
            end_effects,
        })
    }

    /// Resolves an atom; `None` if an argument has the wrong type.
    fn atom(&self, template: &AtomTemplate, binding: &[ObjectId]) -> Option<GroundAtom> {
        let signature = self.domain.predicate(template.predicate);
        let mut args = SmallVec::new();
        for (term, param) in template.args.iter().zip(&signature.params) {
            let object = term.resolve(binding);
            if !self.well_typed(object, param.ty) {
                return None;
            }
            args.push(object);
        }
        Some(GroundAtom {
            predicate: template.predicate,
            args,
        })
    }

    fn fluent(&self, template: &FluentTemplate, binding: &[ObjectId]) -> Option<GroundFluent> {
        let signature = self.domain.function(template.function);
        let mut args = SmallVec::new();
        for (term, param) in template.args.iter().zip(&signature.params) {
            let object = term.resolve(binding);
            if !self.well_typed(object, param.ty) {
                return None;
            }
            args.push(object);
        }
        Some(GroundFluent {
            function: template.function,
            args,
        })
    }

    fn well_typed(&self, object: ObjectId, ty: TypeId) -> bool {
        self.domain
            .types
            .is_subtype(self.problem.objects.get(object).ty, ty)
    }

    /// Resolves fluents and substitutes the initial values of static ones.
    fn expr(&self, expr: &LiftedExpr, binding: &[ObjectId]) -> Option<BoundExpr> {
        Some(match expr {
            NumericExpr::Number(n) => NumericExpr::Number(*n),
            NumericExpr::Duration => NumericExpr::Duration,
            NumericExpr::Fluent(template) => {
                let fluent = self.fluent(template, binding)?;
                match self.static_value(&fluent) {
                    Some(value) => NumericExpr::Number(value),
                    None => NumericExpr::Fluent(fluent),
                }
            }
            NumericExpr::Negate(inner) => NumericExpr::Negate(Box::new(self.expr(inner, binding)?)),
            NumericExpr::Binary { op, lhs, rhs } => {
                NumericExpr::binary(*op, self.expr(lhs, binding)?, self.expr(rhs, binding)?)
            }
        })
    }

    fn static_value(&self, fluent: &GroundFluent) -> Option<f64> {
        if self.static_functions[fluent.function.0] {
            self.init_values.get(fluent).copied()
        } else {
            None
        }
    }

    fn condition(&self, condition: &Condition, binding: &[ObjectId]) -> Resolved {
        match condition {
            Condition::Atom { atom, positive } => match self.atom(atom, binding) {
                // An ill-typed atom is never true.
                None if *positive => Resolved::Fails,
                None => Resolved::Holds,
                Some(atom) if self.static_predicates[atom.predicate.0] => {
                    if self.init_atoms.contains(&atom) == *positive {
                        Resolved::Holds
                    } else {
                        Resolved::Fails
                    }
                }
                Some(atom) => Resolved::Keep(BoundCondition::Fact {
                    atom,
                    positive: *positive,
                }),
            },
            Condition::Equality { lhs, rhs, positive } => {
                if (lhs.resolve(binding) == rhs.resolve(binding)) == *positive {
                    Resolved::Holds
                } else {
                    Resolved::Fails
                }
            }
            Condition::Compare { op, lhs, rhs } => {
                let (Some(lhs), Some(rhs)) = (self.expr(lhs, binding), self.expr(rhs, binding))
                else {
                    return Resolved::Fails;
                };
                if is_constant(&lhs) && is_constant(&rhs) {
                    let none = |_: &GroundFluent| None;
                    return match (lhs.eval(&none, None), rhs.eval(&none, None)) {
                        (Ok(l), Ok(r)) if op.holds(l, r) => Resolved::Holds,
                        _ => Resolved::Fails,
                    };
                }
                Resolved::Keep(BoundCondition::Compare { op: *op, lhs, rhs })
            }
        }
    }

    fn effect(&self, effect: &Effect, binding: &[ObjectId]) -> Option<BoundEffect> {
        Some(match effect {
            Effect::Add(atom) => BoundEffect::Add(self.atom(atom, binding)?),
            Effect::Delete(atom) => BoundEffect::Delete(self.atom(atom, binding)?),
            Effect::Numeric { op, fluent, value } => BoundEffect::Numeric {
                op: *op,
                fluent: self.fluent(fluent, binding)?,
                value: self.expr(value, binding)?,
            },
        })
    }
}

fn is_constant(expr: &BoundExpr) -> bool {
    let mut fluents = 0usize;
    expr.for_each_fluent(&mut |_| fluents += 1);
    fluents == 0 && !expr.uses_duration()
}

#[derive(Default)]
struct Interner {
    facts: SymbolTable<GroundAtom, FactId>,
    fluents: SymbolTable<GroundFluent, FluentId>,
}

impl Interner {
    fn expr(&mut self, expr: &BoundExpr) -> GroundExpr {
        let fluents = &mut self.fluents;
        let mapped: std::result::Result<GroundExpr, Infallible> =
            expr.try_map_fluents(&mut |f: &GroundFluent| Ok(fluents.intern(f.clone())));
        match mapped {
            Ok(expr) => expr,
            Err(never) => match never {},
        }
    }

    fn condition(&mut self, condition: BoundCondition) -> GroundCondition {
        match condition {
            BoundCondition::Fact { atom, positive } => GroundCondition::Fact {
                fact: self.facts.intern(atom),
                positive,
            },
            BoundCondition::Compare { op, lhs, rhs } => GroundCondition::Compare {
                op,
                lhs: self.expr(&lhs),
                rhs: self.expr(&rhs),
            },
        }
    }

    fn effect(&mut self, effect: BoundEffect) -> GroundEffect {
        match effect {
            BoundEffect::Add(atom) => GroundEffect::Add(self.facts.intern(atom)),
            BoundEffect::Delete(atom) => GroundEffect::Delete(self.facts.intern(atom)),
            BoundEffect::Numeric { op, fluent, value } => GroundEffect::Numeric {
                op,
                fluent: self.fluents.intern(fluent),
                value: self.expr(&value),
            },
        }
    }

    fn conditions(&mut self, conditions: Vec<BoundCondition>) -> Vec<GroundCondition> {
        conditions.into_iter().map(|c| self.condition(c)).collect()
    }

    fn effects(&mut self, effects: Vec<BoundEffect>) -> Vec<GroundEffect> {
        effects.into_iter().map(|e| self.effect(e)).collect()
    }

    fn action(&mut self, id: ActionId, name: String, bound: BoundAction) -> GroundAction {
        let duration = bound.duration.map(|d| match d {
            BoundDuration::Exact(e) => GroundDuration::Exact(self.expr(&e)),
            BoundDuration::Bounded { lower, upper } => GroundDuration::Bounded {
                lower: lower.map(|e| self.expr(&e)),
                upper: upper.map(|e| self.expr(&e)),
            },
        });
        GroundAction {
            id,
            schema: bound.schema,
            name,
            args: bound.args,
            duration,
            at_start: self.conditions(bound.at_start),
            over_all: self.conditions(bound.over_all),
            at_end: self.conditions(bound.at_end),
            start_effects: self.effects(bound.start_effects),
            end_effects: self.effects(bound.end_effects),
        }
    }
}
