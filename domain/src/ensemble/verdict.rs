//! Evaluation verdicts.
//!
//! The arbiter evaluation of one attempt yields a [`Verdict`]: either the
//! candidates agree well enough to accept an answer at some confidence
//! tier, or the disagreement is judged genuine and the question should be
//! rephrased and retried.

use serde::{Deserialize, Serialize};

/// Confidence tier of an accepted (or fallback) answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Every successful candidate shared the same key
    Unanimous,
    /// A strict majority shared the key
    Majority,
    /// No majority, but semantic arbitration judged two candidates
    /// substantively equivalent
    Arbitrated,
    /// Exhausted fallback — best-effort answer, not a success
    LowConfidence,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Confidence::Unanimous => "unanimous",
            Confidence::Majority => "majority",
            Confidence::Arbitrated => "arbitrated",
            Confidence::LowConfidence => "low_confidence",
        };
        write!(f, "{}", s)
    }
}

/// The answer selected by an evaluation: canonical key plus the
/// representative raw text behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedAnswer {
    pub key: String,
    pub text: String,
}

impl SelectedAnswer {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// Whether an attempt's candidates were accepted or flagged for rephrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Accept,
    Rephrase,
}

/// Outcome of evaluating one attempt's candidates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<SelectedAnswer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

impl Verdict {
    /// Accept a selected answer at the given confidence tier
    pub fn accept(selected: SelectedAnswer, confidence: Confidence) -> Self {
        Self {
            status: VerdictStatus::Accept,
            selected: Some(selected),
            confidence: Some(confidence),
        }
    }

    /// Flag the attempt as genuine disagreement
    pub fn rephrase() -> Self {
        Self {
            status: VerdictStatus::Rephrase,
            selected: None,
            confidence: None,
        }
    }

    pub fn is_accept(&self) -> bool {
        matches!(self.status, VerdictStatus::Accept)
    }
}
