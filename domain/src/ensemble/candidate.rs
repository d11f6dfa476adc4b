//! Candidate answers and vote tallying.
//!
//! A [`CandidateAnswer`] is one solver's output for one attempt; a
//! [`Tally`] aggregates the candidates of an attempt (or of a whole
//! session) into per-key counts and answers the unanimity/majority
//! questions, with a deterministic tie-break.

use super::normalize::CanonicalKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable identifier of a solver slot (1-based).
///
/// Candidates are always reported in slot order regardless of completion
/// order, so the same solver's output sits in the same position on every
/// attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SolverId(usize);

impl SolverId {
    pub fn new(slot: usize) -> Self {
        debug_assert!(slot >= 1, "solver slots are 1-based");
        Self(slot)
    }

    pub fn slot(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for SolverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "solver-{}", self.0)
    }
}

/// One solving agent's output for one attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateAnswer {
    /// Slot that produced this candidate
    pub solver: SolverId,
    /// Model backing the slot
    pub model: String,
    /// Extracted final answer (empty for abstentions)
    pub answer: String,
    /// Full worked solution, retained for the audit history
    pub solution: String,
    /// Canonical comparison key
    pub key: CanonicalKey,
    /// Whether the solver produced an answer at all
    pub success: bool,
    /// Failure reason when abstaining
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CandidateAnswer {
    /// A successful solver response
    pub fn success(
        solver: SolverId,
        model: impl Into<String>,
        answer: impl Into<String>,
        solution: impl Into<String>,
        key: CanonicalKey,
    ) -> Self {
        Self {
            solver,
            model: model.into(),
            answer: answer.into(),
            solution: solution.into(),
            key,
            success: true,
            error: None,
        }
    }

    /// An abstention: the solver timed out or errored.
    ///
    /// Abstentions still occupy their slot in the attempt record; no
    /// invocation is discarded silently.
    pub fn abstention(solver: SolverId, model: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            solver,
            model: model.into(),
            answer: String::new(),
            solution: String::new(),
            key: CanonicalKey::Unknown,
            success: false,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The voting key, present only for successful candidates with a
    /// parseable answer
    pub fn voting_key(&self) -> Option<&str> {
        if self.success { self.key.value() } else { None }
    }
}

/// Aggregated per-key vote counts over a set of candidates.
///
/// Only successful candidates with parseable keys vote; unknown keys are
/// counted separately and can break unanimity but never form a bloc.
#[derive(Debug, Clone)]
pub struct Tally {
    counts: BTreeMap<String, Vec<SolverId>>,
    total: usize,
    successful: usize,
    unparseable: usize,
}

impl Tally {
    /// Count votes over any collection of candidates: one attempt's, or
    /// every attempt's combined for the exhausted fallback.
    pub fn count<'a>(candidates: impl IntoIterator<Item = &'a CandidateAnswer>) -> Self {
        let mut counts: BTreeMap<String, Vec<SolverId>> = BTreeMap::new();
        let mut total = 0;
        let mut successful = 0;
        let mut unparseable = 0;

        for candidate in candidates {
            total += 1;
            if !candidate.success {
                continue;
            }
            successful += 1;
            match candidate.key.value() {
                Some(key) => counts.entry(key.to_string()).or_default().push(candidate.solver),
                None => unparseable += 1,
            }
        }

        Self {
            counts,
            total,
            successful,
            unparseable,
        }
    }

    /// Number of successful candidates (the voting denominator)
    pub fn successful_count(&self) -> usize {
        self.successful
    }

    /// Successful candidates whose answer did not normalize
    pub fn unparseable_count(&self) -> usize {
        self.unparseable
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Votes for a specific key
    pub fn votes_for(&self, key: &str) -> usize {
        self.counts.get(key).map_or(0, |v| v.len())
    }

    /// The single key shared by every candidate, if any.
    ///
    /// An abstention or an unparseable answer breaks unanimity; full
    /// agreement among the remaining solvers still counts, but only at
    /// the majority tier.
    pub fn unanimous_key(&self) -> Option<&str> {
        if self.successful == 0
            || self.successful != self.total
            || self.unparseable > 0
            || self.counts.len() != 1
        {
            return None;
        }
        self.counts.keys().next().map(String::as_str)
    }

    /// The key held by a strict majority (more than half) of successful
    /// candidates, if any
    pub fn majority_key(&self) -> Option<&str> {
        self.counts
            .iter()
            .find(|(_, voters)| voters.len() * 2 > self.successful)
            .map(|(key, _)| key.as_str())
    }

    /// Keys tied at the highest vote count, in lexicographic order
    pub fn leading_keys(&self) -> Vec<&str> {
        let max = self.counts.values().map(Vec::len).max().unwrap_or(0);
        self.counts
            .iter()
            .filter(|(_, voters)| voters.len() == max)
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// The most frequent key, ties broken deterministically: prefer the
    /// key the trusted solver voted for, then lexicographic order.
    pub fn leader(&self, trusted: Option<SolverId>) -> Option<&str> {
        let leaders = self.leading_keys();
        self.break_tie(&leaders, trusted)
    }

    /// Deterministic tie-break over a set of keys.
    ///
    /// Prefers a key the trusted solver voted for; falls back to the
    /// lexicographically smallest key. Repeated evaluation of the same
    /// candidate set always picks the same key.
    pub fn break_tie<'a>(&self, keys: &[&'a str], trusted: Option<SolverId>) -> Option<&'a str> {
        if keys.is_empty() {
            return None;
        }
        if let Some(trusted) = trusted {
            for key in keys {
                if let Some(voters) = self.counts.get(*key)
                    && voters.contains(&trusted)
                {
                    return Some(key);
                }
            }
        }
        keys.iter().min().copied()
    }
}

/// The lowest-slot successful candidate holding the given key, used as
/// the representative answer text for a winning key
pub fn representative<'a>(
    candidates: &'a [CandidateAnswer],
    key: &str,
) -> Option<&'a CandidateAnswer> {
    candidates
        .iter()
        .filter(|c| c.success && c.key.value() == Some(key))
        .min_by_key(|c| c.solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::question::QuestionKind;
    use crate::ensemble::normalize::normalize;

    fn candidate(slot: usize, answer: &str) -> CandidateAnswer {
        CandidateAnswer::success(
            SolverId::new(slot),
            "test-model",
            answer,
            format!("work shown\nFinal Answer: {}", answer),
            normalize(answer, &QuestionKind::FreeForm),
        )
    }

    fn abstention(slot: usize) -> CandidateAnswer {
        CandidateAnswer::abstention(SolverId::new(slot), "test-model", "timed out")
    }

    #[test]
    fn test_unanimous() {
        let candidates = vec![candidate(1, "4"), candidate(2, "4"), candidate(3, "four")];
        let tally = Tally::count(&candidates);
        assert_eq!(tally.unanimous_key(), Some("4"));
        assert_eq!(tally.majority_key(), Some("4"));
    }

    #[test]
    fn test_majority_not_unanimous() {
        let candidates = vec![candidate(1, "4"), candidate(2, "4"), candidate(3, "5")];
        let tally = Tally::count(&candidates);
        assert_eq!(tally.unanimous_key(), None);
        assert_eq!(tally.majority_key(), Some("4"));
    }

    #[test]
    fn test_no_majority() {
        let candidates = vec![candidate(1, "4"), candidate(2, "5"), candidate(3, "6")];
        let tally = Tally::count(&candidates);
        assert_eq!(tally.majority_key(), None);
        assert_eq!(tally.leading_keys(), vec!["4", "5", "6"]);
    }

    #[test]
    fn test_abstention_downgrades_unanimity_to_majority() {
        // 2 successes out of 3 slots, both agree: a majority, but not
        // unanimous since one slot never voted
        let candidates = vec![candidate(1, "4"), candidate(2, "4"), abstention(3)];
        let tally = Tally::count(&candidates);
        assert_eq!(tally.successful_count(), 2);
        assert_eq!(tally.unanimous_key(), None);
        assert_eq!(tally.majority_key(), Some("4"));
    }

    #[test]
    fn test_unknown_keys_break_unanimity_but_never_vote() {
        let garbage = CandidateAnswer::success(
            SolverId::new(3),
            "test-model",
            "",
            "",
            CanonicalKey::Unknown,
        );
        let candidates = vec![candidate(1, "4"), candidate(2, "4"), garbage];
        let tally = Tally::count(&candidates);
        assert_eq!(tally.unanimous_key(), None);
        assert_eq!(tally.unparseable_count(), 1);
        // 2 of 3 successful still a strict majority
        assert_eq!(tally.majority_key(), Some("4"));
    }

    #[test]
    fn test_two_unknowns_do_not_agree() {
        let mk = |slot| {
            CandidateAnswer::success(SolverId::new(slot), "m", "", "", CanonicalKey::Unknown)
        };
        let tally = Tally::count(&[mk(1), mk(2)]);
        assert_eq!(tally.unanimous_key(), None);
        assert_eq!(tally.majority_key(), None);
        assert!(tally.is_empty());
    }

    #[test]
    fn test_tie_break_prefers_trusted_solver() {
        let candidates = vec![
            candidate(1, "5"),
            candidate(2, "4"),
            candidate(3, "5"),
            candidate(4, "4"),
        ];
        let tally = Tally::count(&candidates);
        assert_eq!(tally.majority_key(), None);
        assert_eq!(tally.leader(Some(SolverId::new(1))), Some("5"));
        assert_eq!(tally.leader(Some(SolverId::new(2))), Some("4"));
    }

    #[test]
    fn test_tie_break_lexicographic_fallback() {
        let candidates = vec![candidate(1, "5"), candidate(2, "4")];
        let tally = Tally::count(&candidates);
        assert_eq!(tally.leader(None), Some("4"));
        // trusted solver that voted for neither leader also falls back
        assert_eq!(tally.leader(Some(SolverId::new(9))), Some("4"));
    }

    #[test]
    fn test_tie_break_is_deterministic() {
        let candidates = vec![candidate(1, "5"), candidate(2, "4"), candidate(3, "6")];
        let first = {
            let tally = Tally::count(&candidates);
            tally.leader(None).map(str::to_string)
        };
        for _ in 0..10 {
            let tally = Tally::count(&candidates);
            assert_eq!(tally.leader(None).map(str::to_string), first);
        }
    }

    #[test]
    fn test_representative_is_lowest_slot() {
        let candidates = vec![candidate(1, "five"), candidate(2, "5"), candidate(3, "5")];
        let rep = representative(&candidates, "5").unwrap();
        assert_eq!(rep.solver, SolverId::new(1));
        assert_eq!(rep.answer, "five");
    }
}
