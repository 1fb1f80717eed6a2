//! Planner sessions.
//!
//! A [`Session`] owns one planner configuration and can be solved
//! repeatedly, from several threads at once. Each solve gets its own
//! termination flag; terminating the session raises every flag that is
//! live at that moment. A [`SessionRegistry`] hands out numeric
//! session ids for callers that cannot hold Rust values, such as a foreign
//! boundary; every operation on an unknown id reports `InvalidSession`.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use planforge_config::{ConfigError, PlannerConfig};
use planforge_solver::Planner;

use crate::status::{SolveOutcome, SolveStatus};

/// Default number of sessions a registry holds at once.
pub const DEFAULT_SESSION_CAPACITY: usize = 64;

/// Per-call limits layered over the session configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveBudget {
    pub max_search_nodes: Option<u64>,
    pub time_limit: Option<Duration>,
    /// Goal completion deadline; overrides the problem's own deadline.
    pub deadline: Option<f64>,
}

impl SolveBudget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_search_nodes(mut self, nodes: u64) -> Self {
        self.max_search_nodes = Some(nodes);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_deadline(mut self, deadline: f64) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// `base` with every limit of this budget that is set.
    pub fn apply(&self, base: &PlannerConfig) -> PlannerConfig {
        let mut config = base.clone();
        if let Some(nodes) = self.max_search_nodes {
            config = config.with_max_search_nodes(nodes);
        }
        if let Some(limit) = self.time_limit {
            config = config.with_time_limit(limit);
        }
        if let Some(deadline) = self.deadline {
            config = config.with_deadline(deadline);
        }
        config
    }
}

/// One planner instance.
///
/// Dropping a session releases everything it owns.
///
/// # Example
///
/// ```
/// use planforge::{Session, SolveBudget, SolveStatus};
///
/// let session = Session::new();
/// let outcome = session.solve(
///     "(define (domain d) (:predicates (p)) (:action a :effect (p)))",
///     "(define (problem q) (:domain d) (:goal (p)))",
///     &SolveBudget::new(),
/// );
/// assert_eq!(outcome.status, SolveStatus::SolutionFound);
/// assert_eq!(outcome.plan_length, 1);
/// ```
#[derive(Debug)]
pub struct Session {
    config: PlannerConfig,
    solves: Mutex<ActiveSolves>,
}

/// Termination flags of the solves currently running on a session.
#[derive(Debug, Default)]
struct ActiveSolves {
    flags: Vec<Arc<AtomicBool>>,
    /// Set once the session is destroyed; no solve may start afterwards.
    closed: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::unchecked(PlannerConfig::default())
    }

    /// Creates a session with a validated configuration.
    pub fn with_config(config: PlannerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::unchecked(config))
    }

    fn unchecked(config: PlannerConfig) -> Self {
        Self {
            config,
            solves: Mutex::new(ActiveSolves::default()),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Solves a domain and problem given as text.
    ///
    /// Never panics: every failure, including a panic inside the planner,
    /// comes back as a status.
    ///
    /// The time limit counts from this call, so parsing and grounding use
    /// part of it.
    pub fn solve(&self, domain_text: &str, problem_text: &str, budget: &SolveBudget) -> SolveOutcome {
        let started = Instant::now();
        let Some(flag) = self.register() else {
            return SolveOutcome::invalid_session();
        };
        let config = budget.apply(&self.config);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            solve_text(config, Arc::clone(&flag), started, domain_text, problem_text)
        }));
        self.unregister(&flag);
        match result {
            Ok(outcome) => outcome,
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(event = "solve_panicked", reason = %reason);
                SolveOutcome::failure(
                    SolveStatus::InternalInconsistency,
                    format!("planner panicked: {}", reason),
                )
            }
        }
    }

    /// Reads both files, then solves their contents.
    pub fn solve_files(
        &self,
        domain_path: impl AsRef<Path>,
        problem_path: impl AsRef<Path>,
        budget: &SolveBudget,
    ) -> SolveOutcome {
        let domain = match read(domain_path.as_ref()) {
            Ok(text) => text,
            Err(outcome) => return outcome,
        };
        let problem = match read(problem_path.as_ref()) {
            Ok(text) => text,
            Err(outcome) => return outcome,
        };
        self.solve(&domain, &problem, budget)
    }

    /// Asks every solve running now to stop; each returns
    /// `SearchBudgetExceeded` unless it already holds a plan. Solves started
    /// later are unaffected.
    pub fn terminate(&self) {
        for flag in &self.solves().flags {
            flag.store(true, Ordering::SeqCst);
        }
    }

    /// Returns true if a running solve has been asked to stop.
    pub fn is_terminating(&self) -> bool {
        self.solves()
            .flags
            .iter()
            .any(|flag| flag.load(Ordering::SeqCst))
    }

    pub fn running_solves(&self) -> usize {
        self.solves().flags.len()
    }

    /// Stops every running solve and refuses new ones.
    pub(crate) fn close(&self) {
        let mut solves = self.solves();
        solves.closed = true;
        for flag in &solves.flags {
            flag.store(true, Ordering::SeqCst);
        }
    }

    /// A fresh flag for one solve, or `None` once the session is closed.
    fn register(&self) -> Option<Arc<AtomicBool>> {
        let mut solves = self.solves();
        if solves.closed {
            return None;
        }
        let flag = Arc::new(AtomicBool::new(false));
        solves.flags.push(Arc::clone(&flag));
        Some(flag)
    }

    fn unregister(&self, flag: &Arc<AtomicBool>) {
        self.solves().flags.retain(|f| !Arc::ptr_eq(f, flag));
    }

    fn solves(&self) -> MutexGuard<'_, ActiveSolves> {
        self.solves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn read(path: &Path) -> Result<String, SolveOutcome> {
    std::fs::read_to_string(path).map_err(|err| {
        SolveOutcome::failure(
            SolveStatus::FileError,
            format!("cannot read {}: {}", path.display(), err),
        )
    })
}

fn solve_text(
    config: PlannerConfig,
    flag: Arc<AtomicBool>,
    started: Instant,
    domain_text: &str,
    problem_text: &str,
) -> SolveOutcome {
    let (domain, problem) = match planforge_pddl::parse(domain_text, problem_text) {
        Ok(parsed) => parsed,
        Err(err) => {
            info!(event = "parse_failed", error = %err);
            return SolveOutcome::failure(SolveStatus::ParseError, err.to_string());
        }
    };

    let planner = Planner::new(config)
        .with_terminate_flag(flag)
        .with_start_time(started);
    match planner.plan(Arc::new(domain), Arc::new(problem)) {
        Ok(outcome) => SolveOutcome::from_search(outcome.result, outcome.statistics),
        Err(err) => SolveOutcome::from(err),
    }
}

/// Identifier of a session inside a [`SessionRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Sessions addressed by id.
///
/// Safe to share between threads. A solve does not hold the registry lock,
/// so `terminate` and `destroy` stay responsive while it runs. Destroying a
/// session mid-solve stops that solve, and a solve that looked the session
/// up just before it was destroyed returns `InvalidSession`. The session is
/// freed when the last such call returns.
///
/// # Example
///
/// ```
/// use planforge::{SessionRegistry, SolveBudget, SolveStatus};
///
/// let registry = SessionRegistry::new();
/// let id = registry.create().unwrap();
/// assert!(registry.destroy(id));
///
/// let outcome = registry.solve(id, "", "", &SolveBudget::new());
/// assert_eq!(outcome.status, SolveStatus::InvalidSession);
/// ```
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, Arc<Session>>>,
    next_id: AtomicU64,
    capacity: usize,
    config: PlannerConfig,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SESSION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            capacity,
            config: PlannerConfig::default(),
        }
    }

    /// Configuration given to every session created afterwards.
    pub fn with_config(mut self, config: PlannerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Creates a session; `None` once the registry is full.
    pub fn create(&self) -> Option<SessionId> {
        let mut sessions = self.lock();
        if sessions.len() >= self.capacity {
            warn!(event = "session_rejected", capacity = self.capacity);
            return None;
        }
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        sessions.insert(id, Arc::new(Session::unchecked(self.config.clone())));
        info!(event = "session_created", session = %id, open = sessions.len());
        Some(id)
    }

    pub fn solve(
        &self,
        id: SessionId,
        domain_text: &str,
        problem_text: &str,
        budget: &SolveBudget,
    ) -> SolveOutcome {
        match self.get(id) {
            Some(session) => session.solve(domain_text, problem_text, budget),
            None => SolveOutcome::invalid_session(),
        }
    }

    pub fn solve_files(
        &self,
        id: SessionId,
        domain_path: impl AsRef<Path>,
        problem_path: impl AsRef<Path>,
        budget: &SolveBudget,
    ) -> SolveOutcome {
        match self.get(id) {
            Some(session) => session.solve_files(domain_path, problem_path, budget),
            None => SolveOutcome::invalid_session(),
        }
    }

    /// Requests early termination of the session's running solve.
    pub fn terminate(&self, id: SessionId) -> bool {
        match self.get(id) {
            Some(session) => {
                session.terminate();
                true
            }
            None => false,
        }
    }

    /// Releases the session; false if it was unknown.
    pub fn destroy(&self, id: SessionId) -> bool {
        let mut sessions = self.lock();
        let removed = sessions.remove(&id);
        if let Some(session) = &removed {
            session.close();
            info!(event = "session_destroyed", session = %id, open = sessions.len());
        }
        removed.is_some()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn get(&self, id: SessionId) -> Option<Arc<Session>> {
        self.lock().get(&id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Arc<Session>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "(define (domain d) (:predicates (p)) (:action a :effect (p)))";
    const PROBLEM: &str = "(define (problem q) (:domain d) (:goal (p)))";

    #[test]
    fn test_closed_session_refuses_solves() {
        let session = Session::new();
        assert_eq!(
            session.solve(DOMAIN, PROBLEM, &SolveBudget::new()).status,
            SolveStatus::SolutionFound
        );
        session.close();
        let outcome = session.solve(DOMAIN, PROBLEM, &SolveBudget::new());
        assert_eq!(outcome.status, SolveStatus::InvalidSession);
        assert_eq!(session.running_solves(), 0);
    }

    #[test]
    fn test_flags_released_after_solve() {
        let session = Session::new();
        session.solve(DOMAIN, PROBLEM, &SolveBudget::new());
        session.solve("(define", PROBLEM, &SolveBudget::new());
        assert_eq!(session.running_solves(), 0);
        assert!(!session.is_terminating());
    }
}
