//! Attempt records and the terminal consensus decision.
//!
//! Attempts form an ordered, append-only sequence owned by one session.
//! The [`ConsensusDecision`] is created exactly once when the session
//! reaches a terminal state and is immutable afterwards: constructors
//! consume the history and no mutators exist.

use super::candidate::CandidateAnswer;
use super::verdict::{Confidence, SelectedAnswer, Verdict};
use crate::core::question::QuestionId;
use serde::{Deserialize, Serialize};

/// One fan-out/evaluate cycle using a specific question phrasing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// Attempt index (1-based, contiguous)
    pub index: usize,
    /// The phrasing used for this attempt (original or rephrased)
    pub phrasing: String,
    /// Candidates gathered, in solver slot order
    pub candidates: Vec<CandidateAnswer>,
    /// The evaluation verdict for this attempt
    pub verdict: Verdict,
}

impl Attempt {
    pub fn new(
        index: usize,
        phrasing: impl Into<String>,
        candidates: Vec<CandidateAnswer>,
        verdict: Verdict,
    ) -> Self {
        Self {
            index,
            phrasing: phrasing.into(),
            candidates,
            verdict,
        }
    }

    /// Number of solvers that produced an answer on this attempt
    pub fn success_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.success).count()
    }
}

/// Terminal status of a consensus session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    /// The ensemble converged on an answer
    Accepted,
    /// The rephrase budget ran out without consensus; the selected
    /// answer, if any, is best-effort only
    Unresolved,
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionStatus::Accepted => write!(f, "accepted"),
            DecisionStatus::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Terminal record of one question's consensus session.
///
/// Carries the full attempt history for audit and for rendering
/// "solution with reasoning" documents downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusDecision {
    /// The question this decision answers
    pub question_id: QuestionId,
    /// Terminal status
    pub status: DecisionStatus,
    /// The selected answer; absent only when every candidate of every
    /// attempt abstained
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<SelectedAnswer>,
    /// Confidence tier of the selection
    pub confidence: Confidence,
    /// Number of attempts consumed; always equals `attempts.len()`
    pub attempts_used: usize,
    /// Full attempt history
    pub attempts: Vec<Attempt>,
    /// Finalization timestamp (milliseconds since epoch)
    pub timestamp: u64,
}

impl ConsensusDecision {
    /// Finalize an accepted decision from the attempt history.
    ///
    /// The confidence tier comes from the accepting attempt's verdict.
    pub fn accepted(
        question_id: QuestionId,
        attempts: Vec<Attempt>,
        selected: SelectedAnswer,
        confidence: Confidence,
    ) -> Self {
        Self {
            question_id,
            status: DecisionStatus::Accepted,
            selected: Some(selected),
            confidence,
            attempts_used: attempts.len(),
            attempts,
            timestamp: current_timestamp(),
        }
    }

    /// Finalize an exhausted session as unresolved.
    ///
    /// The best-effort selection may be absent when no solver ever
    /// produced a parseable answer; the unresolved status keeps that
    /// distinguishable from success either way.
    pub fn unresolved(
        question_id: QuestionId,
        attempts: Vec<Attempt>,
        selected: Option<SelectedAnswer>,
    ) -> Self {
        Self {
            question_id,
            status: DecisionStatus::Unresolved,
            selected,
            confidence: Confidence::LowConfidence,
            attempts_used: attempts.len(),
            attempts,
            timestamp: current_timestamp(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self.status, DecisionStatus::Accepted)
    }

    /// The selected answer text, if any
    pub fn answer_text(&self) -> Option<&str> {
        self.selected.as_ref().map(|s| s.text.as_str())
    }
}

/// Get current timestamp in milliseconds
fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
