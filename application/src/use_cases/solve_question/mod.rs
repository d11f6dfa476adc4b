//! Solve Question use case: the consensus session.
//!
//! [`ConsensusSession`] is the per-question orchestrator and the single
//! public entry point of the core. Each attempt fans the current
//! phrasing out to the solver pool, normalizes and evaluates the
//! candidates, and either finalizes a decision or generates a reworded
//! restatement and retries. The loop is an explicit iteration over
//! attempt indices with exits on both acceptance and exhaustion, so
//! termination is guaranteed.
//!
//! Attempts within a session are strictly sequential, since each
//! phrasing depends on the previous disagreement. Sessions for different
//! questions share nothing and may run fully in parallel.

mod evaluate;
mod pool;

use crate::config::SessionParams;
use crate::ports::solver_gateway::SolverGateway;
use ensemble_domain::{
    Attempt, CandidateAnswer, ConsensusDecision, PromptTemplate, Question, QuestionId,
    SelectedAnswer, Tally, Verdict, parse_rephrasing, representative,
};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Errors that can occur while solving a question.
///
/// Solver and arbiter failures never surface here; they are absorbed
/// into the attempt/verdict model. Only session-level faults do.
#[derive(Error, Debug)]
pub enum SolveQuestionError {
    #[error("No solvers configured")]
    NoSolvers,

    #[error("Operation cancelled")]
    Cancelled,
}

/// Internal solver-pool failure modes
#[derive(Error, Debug)]
pub(crate) enum PoolError {
    /// Zero slots produced an answer; the abstention records are kept so
    /// the attempt still appears in the history
    #[error("All solvers failed to respond")]
    AllSolversFailed(Vec<CandidateAnswer>),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Per-question consensus session.
///
/// Owns its attempt history exclusively; configuration and gateway are
/// injected at construction and read-only for the session's lifetime.
pub struct ConsensusSession<G: SolverGateway + 'static> {
    gateway: Arc<G>,
    params: SessionParams,
    cancellation_token: Option<CancellationToken>,
}

impl<G: SolverGateway + 'static> ConsensusSession<G> {
    pub fn new(gateway: Arc<G>, params: SessionParams) -> Self {
        Self {
            gateway,
            params,
            cancellation_token: None,
        }
    }

    /// Attach a cancellation token. A cancelled session aborts in-flight
    /// solver calls and finalizes no decision.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Run the session to a terminal decision.
    ///
    /// Always returns a finalized [`ConsensusDecision`], accepted or
    /// unresolved, unless the session is cancelled or misconfigured. A
    /// question is never dropped silently.
    pub async fn run(&self, question: &Question) -> Result<ConsensusDecision, SolveQuestionError> {
        if self.params.solvers.is_empty() {
            return Err(SolveQuestionError::NoSolvers);
        }

        let max_attempts = self.params.max_attempts();
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut phrasing = question.prompt().to_string();

        for index in 1..=max_attempts {
            info!(
                "Question {}: attempt {}/{}",
                question.id(),
                index,
                max_attempts
            );

            let outcome = pool::solve(
                &self.gateway,
                &self.params,
                &phrasing,
                question.kind(),
                &self.cancellation_token,
            )
            .await;

            let (candidates, verdict) = match outcome {
                Ok(candidates) => {
                    self.check_cancelled()?;
                    let verdict = evaluate::evaluate(
                        self.gateway.as_ref(),
                        &self.params,
                        &phrasing,
                        &candidates,
                    )
                    .await;
                    (candidates, verdict)
                }
                Err(PoolError::AllSolversFailed(candidates)) => {
                    // a zero-success attempt is itself a failure, consumed
                    // as one non-consensus attempt
                    warn!("Question {}: all solvers failed on attempt {}", question.id(), index);
                    (candidates, Verdict::rephrase())
                }
                Err(PoolError::Cancelled) => return Err(SolveQuestionError::Cancelled),
            };

            // an accept verdict always carries its selection and tier
            let acceptance = if verdict.is_accept() {
                verdict.selected.clone().zip(verdict.confidence)
            } else {
                None
            };
            attempts.push(Attempt::new(index, phrasing.clone(), candidates, verdict));

            if let Some((selected, confidence)) = acceptance {
                info!(
                    "Question {}: accepted {:?} ({}) after {} attempt(s)",
                    question.id(),
                    selected.text,
                    confidence,
                    index
                );
                return Ok(ConsensusDecision::accepted(
                    question.id().clone(),
                    attempts,
                    selected,
                    confidence,
                ));
            }

            if index < max_attempts {
                self.check_cancelled()?;
                // rubric and point value live on the immutable Question;
                // only the wording is regenerated
                if let Some(reworded) = self.rephrase(&phrasing).await {
                    info!("Question {}: rephrased for attempt {}", question.id(), index + 1);
                    phrasing = reworded;
                } else {
                    warn!(
                        "Question {}: rephrase failed, reusing previous phrasing",
                        question.id()
                    );
                }
            }
        }

        info!(
            "Question {}: rephrase budget exhausted after {} attempts",
            question.id(),
            max_attempts
        );
        Ok(self.finalize_exhausted(question.id().clone(), attempts))
    }

    fn check_cancelled(&self) -> Result<(), SolveQuestionError> {
        if let Some(token) = &self.cancellation_token
            && token.is_cancelled()
        {
            return Err(SolveQuestionError::Cancelled);
        }
        Ok(())
    }

    /// Generate a reworded restatement of the current phrasing through
    /// the arbiter model. Returns `None` on failure; the caller reuses
    /// the previous phrasing.
    async fn rephrase(&self, phrasing: &str) -> Option<String> {
        let prompt = PromptTemplate::rephrase_prompt(phrasing);
        let call = self
            .gateway
            .invoke(&self.params.arbiter, PromptTemplate::rephrase_system(), &prompt);

        let response = match self.params.per_call_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(r) => r,
                Err(_) => {
                    warn!("Rephrase timed out");
                    return None;
                }
            },
            None => call.await,
        };

        match response {
            Ok(text) => parse_rephrasing(&text),
            Err(e) => {
                warn!("Rephrase failed: {}", e);
                None
            }
        }
    }

    /// Exhausted fallback: best-effort selection as the most frequent
    /// normalized key across all attempts combined, abstentions and
    /// unknown keys excluded, ties broken by the trusted-solver rule then
    /// lexicographic order. This is a fallback, not a success: the
    /// unresolved status keeps it distinguishable.
    fn finalize_exhausted(&self, id: QuestionId, attempts: Vec<Attempt>) -> ConsensusDecision {
        let tally = Tally::count(attempts.iter().flat_map(|a| a.candidates.iter()));

        let selected = tally.leader(self.params.trusted_solver).map(|key| {
            let text = attempts
                .iter()
                .find_map(|a| representative(&a.candidates, key))
                .map(|c| c.answer.clone())
                .unwrap_or_else(|| key.to_string());
            SelectedAnswer::new(key, text)
        });

        ConsensusDecision::unresolved(id, attempts, selected)
    }
}
