//! Session parameters.
//!
//! [`SessionParams`] carries everything a consensus session needs to
//! know: the solver roster, the arbiter model, the rephrase budget and
//! the per-call timeout. Parameters are read-only for the lifetime of a
//! session — they are passed explicitly into the session constructor,
//! never read from ambient process state, so sessions are independently
//! constructible and testable in parallel.

use ensemble_domain::{Model, SolverId};
use std::time::Duration;

/// Default per-call timeout for solver and arbiter invocations
pub const DEFAULT_PER_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of rephrase retries after the initial attempt
pub const DEFAULT_MAX_REPHRASE_ATTEMPTS: usize = 2;

/// Read-only configuration for one consensus session
#[derive(Debug, Clone)]
pub struct SessionParams {
    /// One model per solver slot; the roster length is N
    pub solvers: Vec<Model>,
    /// Model used for equivalence rulings and rephrasing
    pub arbiter: Model,
    /// Rephrase retries allowed after the initial attempt
    pub max_rephrase_attempts: usize,
    /// Per-invocation timeout; `None` disables the bound
    pub per_call_timeout: Option<Duration>,
    /// Slot whose answer wins frequency ties, typically the solver most
    /// recently correct on rubric-matching tasks. Absent signal falls
    /// back to lexicographic tie-breaking.
    pub trusted_solver: Option<SolverId>,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            solvers: Model::default_solvers(),
            arbiter: Model::default_arbiter(),
            max_rephrase_attempts: DEFAULT_MAX_REPHRASE_ATTEMPTS,
            per_call_timeout: Some(DEFAULT_PER_CALL_TIMEOUT),
            trusted_solver: None,
        }
    }
}

impl SessionParams {
    /// Number of solver slots (N)
    pub fn num_solvers(&self) -> usize {
        self.solvers.len()
    }

    /// Total attempt bound: the initial attempt plus the rephrase budget
    pub fn max_attempts(&self) -> usize {
        self.max_rephrase_attempts + 1
    }

    // ==================== Builder Methods ====================

    pub fn with_solvers(mut self, solvers: Vec<Model>) -> Self {
        self.solvers = solvers;
        self
    }

    pub fn with_arbiter(mut self, arbiter: Model) -> Self {
        self.arbiter = arbiter;
        self
    }

    pub fn with_max_rephrase_attempts(mut self, attempts: usize) -> Self {
        self.max_rephrase_attempts = attempts;
        self
    }

    pub fn with_per_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.per_call_timeout = timeout;
        self
    }

    pub fn with_trusted_solver(mut self, slot: usize) -> Self {
        self.trusted_solver = Some(SolverId::new(slot));
        self
    }
}
